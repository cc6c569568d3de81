mod common;
use common::*;

use core_actions::{Position, RecordedUnit, VisualExtent};
use core_events::{InputUnit, parse};
use core_state::Mode;
use pretty_assertions::assert_eq;
use serde_json::json;

fn payload(h: &Harness) -> Vec<RecordedUnit> {
    h.session.repeat().last().expect("repeat record").payload.clone()
}

fn units(notation: &str) -> Vec<RecordedUnit> {
    parse(notation)
        .unwrap()
        .into_iter()
        .map(|k| RecordedUnit::noremap(InputUnit::Key(k)))
        .collect()
}

#[test]
fn dot_repeats_last_change() {
    let mut h = Harness::new();
    h.typed("\"a3dw");
    assert_eq!(payload(&h), units("\"a3dw"));
    h.host.clear();
    h.typed(".");
    assert_eq!(h.host.names(), vec!["delete"]);
    assert_eq!(h.host.last().count(), 3);
    assert_eq!(h.host.last().register(), Some('a'));
}

#[test]
fn fresh_count_replaces_recorded_count() {
    let mut h = Harness::new();
    h.typed("3dw");
    h.typed("2.");
    assert_eq!(h.host.last().count(), 2);
    // The replay becomes the new record.
    assert_eq!(payload(&h), units("2dw"));

    h.typed("d3w");
    h.typed("2.");
    assert_eq!(h.host.last().count(), 6);
}

#[test]
fn motions_do_not_replace_the_record() {
    let mut h = Harness::new();
    h.typed("x");
    h.typed("jw");
    h.typed("yy");
    h.host.clear();
    h.typed(".");
    assert_eq!(h.host.names(), vec!["delete_char"]);
}

#[test]
fn dot_without_record_rings() {
    let mut h = Harness::new();
    h.typed(".");
    assert_eq!(h.host.bells(), 1);
}

#[test]
fn insertion_repeats_as_one_change() {
    let mut h = Harness::new();
    h.typed("ihi<esc>");
    assert_eq!(payload(&h), units("ihi<esc>"));
    h.host.clear();
    h.typed(".");
    assert_eq!(
        h.host.names(),
        vec!["enter_insert", "insert", "insert", "exit_insert"]
    );
    assert_eq!(h.mode(), Mode::Normal);
    assert_eq!(h.host.undo_log.first().map(String::as_str), Some("begin"));
    assert_eq!(h.host.undo_log.last().map(String::as_str), Some("end"));
}

#[test]
fn change_with_motion_repeats_with_its_text() {
    let mut h = Harness::new();
    h.typed("cwok<esc>");
    h.host.clear();
    h.typed("j.");
    assert_eq!(
        h.host.names(),
        vec!["move_down", "change", "insert", "insert", "exit_insert"]
    );
    assert_eq!(h.host.invocations[1].motion().unwrap().0, "word_forward");
}

#[test]
fn visual_change_reselects_its_extent() {
    let extent = VisualExtent {
        anchor: Position { line: 1, column: 0 },
        head: Position { line: 2, column: 4 },
    };
    let mut h = Harness::new();
    h.host.extent = Some(extent);
    h.typed("Vjd");
    let record = h.session.repeat().last().unwrap();
    assert_eq!(record.mode, Mode::VisualLine);
    assert_eq!(record.visual_extent, Some(extent));

    h.host.clear();
    h.typed(".");
    assert_eq!(h.host.restored, vec![extent]);
    assert_eq!(h.host.names(), vec!["delete"]);
    assert_eq!(h.host.last().arg("mode"), Some(&json!("visual_line")));
    assert_eq!(h.host.modes, vec![Mode::VisualLine, Mode::Normal]);
}

#[test]
fn batch_payload_skips_leading_motions() {
    let mut h = Harness::new();
    h.batch("jjdd").unwrap();
    assert_eq!(
        h.host.undo_log,
        vec!["move_down", "move_down", "begin", "delete", "end"]
    );
    assert_eq!(payload(&h), units("dd"));
}
