mod common;
use common::*;

use core_actions::{MacroStep, Notice};
use core_config::InputConfig;
use core_keymap::Keymaps;
use core_state::Mode;
use pretty_assertions::assert_eq;
use serde_json::json;

/// Command names of a macro, merged steps flattened.
fn recorded(h: &Harness, name: char) -> Vec<String> {
    h.session
        .macros()
        .get(name)
        .map(|steps| {
            steps
                .iter()
                .flat_map(MacroStep::commands)
                .map(|c| c.invocation.name.clone())
                .collect()
        })
        .unwrap_or_default()
}

fn step_sizes(h: &Harness, name: char) -> Vec<usize> {
    h.session
        .macros()
        .get(name)
        .map(|steps| steps.iter().map(|s| s.commands().len()).collect())
        .unwrap_or_default()
}

#[test]
fn toggle_is_never_recorded() {
    let mut h = Harness::new();
    h.typed("qaxq");
    assert_eq!(recorded(&h, 'a'), vec!["delete_char"]);
    assert!(!h.session.macros().is_recording());
}

#[test]
fn upper_case_register_appends() {
    let mut h = Harness::new();
    h.typed("qaddq");
    h.typed("qAjq");
    assert_eq!(recorded(&h, 'a'), vec!["delete", "move_down"]);
    assert_eq!(
        h.host.notices.last(),
        Some(&Notice::RecordingStopped {
            register: 'a',
            steps: 2
        })
    );
}

#[test]
fn empty_recording_deletes_the_macro() {
    let mut h = Harness::new();
    h.typed("qaxq");
    h.typed("qaq");
    assert!(h.session.macros().get('a').is_none());
    h.host.clear();
    h.typed("@a");
    assert_eq!(h.host.bells(), 1);
    assert!(h.host.invocations.is_empty());
}

#[test]
fn unwritable_register_does_not_start() {
    let mut h = Harness::new();
    h.typed("q_");
    assert!(!h.session.macros().is_recording());
    assert!(h.host.notices.is_empty());
    h.typed("x");
    assert_eq!(h.host.names(), vec!["delete_char"]);
}

#[test]
fn count_repeats_the_whole_macro() {
    let mut h = Harness::new();
    h.typed("qaxjq");
    h.host.clear();
    let fb = h.typed("3@a");
    assert_eq!(fb.dispatched, 6);
    assert_eq!(
        h.host.names(),
        vec!["delete_char", "move_down", "delete_char", "move_down", "delete_char", "move_down"]
    );
}

#[test]
fn at_sign_replays_the_last_macro() {
    let mut h = Harness::new();
    h.typed("qbxq");
    h.host.clear();
    h.typed("@b@@");
    assert_eq!(h.host.names(), vec!["delete_char", "delete_char"]);

    let mut fresh = Harness::new();
    fresh.typed("@@");
    assert_eq!(fresh.host.bells(), 1);
}

#[test]
fn register_prefix_overrides_recorded_register() {
    let mut h = Harness::new();
    h.typed("qa\"byyjq");
    h.host.clear();
    h.typed("\"c@a");
    assert_eq!(h.host.names(), vec!["yank", "move_down"]);
    assert_eq!(h.host.invocations[0].register(), Some('c'));
    assert_eq!(h.host.invocations[1].arg("register"), None);
}

#[test]
fn replay_restores_entered_modes() {
    let mut h = Harness::new();
    h.typed("qaihi<esc>q");
    assert_eq!(
        recorded(&h, 'a'),
        vec!["enter_insert", "insert", "insert", "exit_insert"]
    );
    h.host.clear();
    h.typed("@a");
    assert_eq!(h.host.modes, vec![Mode::Insert, Mode::Normal]);
    assert_eq!(h.mode(), Mode::Normal);
    assert_eq!(h.host.invocations[1].arg("characters"), Some(&serde_json::json!("h")));
}

#[test]
fn leading_motions_of_a_replay_stay_outside_the_undo_group() {
    let mut h = Harness::new();
    h.typed("qajxq");
    h.host.clear();
    h.typed("@a");
    assert_eq!(h.host.undo_log, vec!["move_down", "begin", "delete_char", "end"]);
}

#[test]
fn replay_matches_typing_by_hand() {
    let mut by_hand = Harness::new();
    by_hand.typed("ddj");

    let mut replayed = Harness::new();
    replayed.typed("qaddjq");
    replayed.host.clear();
    replayed.typed("@a");

    assert_eq!(replayed.host.invocations, by_hand.host.invocations);
    let delete = &replayed.host.invocations[0];
    assert_eq!(delete.arg("linewise"), Some(&json!(true)));
    assert_eq!(delete.arg("mode"), Some(&json!("normal")));
    assert_eq!(delete.count(), 1);
}

#[test]
fn glued_batch_replay_matches_the_batch() {
    let mut by_hand = Harness::new();
    by_hand.batch("2dwj").unwrap();

    let mut replayed = Harness::new();
    replayed.batch("qa2dwjq").unwrap();
    replayed.host.clear();
    replayed.typed("@a");

    assert_eq!(replayed.host.invocations, by_hand.host.invocations);
    assert_eq!(replayed.host.invocations[0].count(), 2);
    assert_eq!(replayed.host.undo_log, vec!["begin", "delete", "move_down", "end"]);
}

#[test]
fn glued_batch_records_one_merged_step() {
    let mut h = Harness::new();
    h.batch("qaddjq").unwrap();
    assert_eq!(recorded(&h, 'a'), vec!["delete", "move_down"]);
    assert_eq!(step_sizes(&h, 'a'), vec![2]);
    assert!(matches!(h.session.macros().get('a'), Some([MacroStep::Batch(_)])));
    assert_eq!(
        h.host.notices.last(),
        Some(&Notice::RecordingStopped {
            register: 'a',
            steps: 1
        })
    );

    // Steps committed before the recording starts are not part of it.
    h.batch("xqbjq").unwrap();
    assert_eq!(recorded(&h, 'b'), vec!["move_down"]);
    assert_eq!(step_sizes(&h, 'b'), vec![1]);
}

#[test]
fn leading_motions_of_a_batch_stay_separate_steps() {
    let mut h = Harness::new();
    h.typed("qa");
    h.batch("jddx").unwrap();
    h.typed("q");
    assert_eq!(recorded(&h, 'a'), vec!["move_down", "delete", "delete_char"]);
    assert_eq!(step_sizes(&h, 'a'), vec![1, 2]);

    h.host.clear();
    h.typed("@a");
    assert_eq!(
        h.host.undo_log,
        vec!["move_down", "begin", "delete", "delete_char", "end"]
    );
}

#[test]
fn typed_commands_record_one_step_each() {
    let mut h = Harness::new();
    h.typed("qaddjq");
    assert_eq!(step_sizes(&h, 'a'), vec![1, 1]);
}

#[test]
fn reload_drops_macros_and_repeat() {
    let mut h = Harness::new();
    h.typed("qaxq");
    h.typed("dw");
    assert!(h.session.repeat().last().is_some());
    h.session.reload(Keymaps::defaults(), InputConfig::default());
    assert!(h.session.macros().get('a').is_none());
    assert!(h.session.repeat().last().is_none());
}
