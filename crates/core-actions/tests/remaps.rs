mod common;
use common::*;

use core_actions::{Notice, PendingStatus};
use core_config::InputConfig;
use core_events::InputUnit;
use core_keymap::{Expansion, KeymapsBuilder, RemapOptions};
use core_state::{Mode, ModeSet};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::Level;
use tracing::subscriber::with_default;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone)]
struct BufferWriter {
    inner: Arc<Mutex<Vec<u8>>>,
}

struct LockedWriter<'a> {
    guard: MutexGuard<'a, Vec<u8>>,
}

impl Write for LockedWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for BufferWriter {
    type Writer = LockedWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LockedWriter {
            guard: self.inner.lock().expect("log buffer poisoned"),
        }
    }
}

fn map(b: &mut KeymapsBuilder, modes: ModeSet, lhs: &str, rhs: &str, options: RemapOptions) {
    b.remap(modes, lhs, Expansion::parse_keys(rhs).unwrap(), options)
        .unwrap();
}

fn small_depth() -> InputConfig {
    InputConfig {
        max_map_depth: 20,
        ..InputConfig::default()
    }
}

#[test]
fn recursive_remap_resolves_builtins() {
    let mut h = Harness::with_keymaps(
        |b| map(b, ModeSet::NORMAL, "x", "dd", RemapOptions::recursive()),
        small_depth(),
    );
    let fb = h.typed("x");
    assert_eq!(fb.dispatched, 1);
    assert_eq!(h.host.names(), vec!["delete"]);
    assert_eq!(h.host.last().arg("linewise"), Some(&json!(true)));
    assert_eq!(fb.status, PendingStatus::Idle);
}

#[test]
fn noremap_stops_at_builtins() {
    let mut h = Harness::with_keymaps(
        |b| {
            map(b, ModeSet::NORMAL, "j", "gj", RemapOptions::noremap());
            map(b, ModeSet::NORMAL, "k", "j", RemapOptions::recursive());
            map(b, ModeSet::NORMAL, "K", "j", RemapOptions::noremap());
        },
        small_depth(),
    );
    h.typed("j");
    assert_eq!(h.host.last().name, "move_display_down");
    // `k` expands to `j`, which is itself remapped.
    h.typed("k");
    assert_eq!(h.host.last().name, "move_display_down");
    h.typed("K");
    assert_eq!(h.host.last().name, "move_down");
}

#[test]
fn runaway_recursion_is_bounded() {
    let mut h = Harness::with_keymaps(
        |b| map(b, ModeSet::NORMAL, "a", "a", RemapOptions::recursive()),
        small_depth(),
    );
    let fb = h.typed("a");
    assert_eq!(fb.status, PendingStatus::Idle);
    assert_eq!(fb.mode, Mode::Normal);
    assert!(h.host.invocations.is_empty());
    assert_eq!(
        h.host.notices,
        vec![Notice::Error {
            message: "remap expansion nested deeper than 20".into()
        }]
    );

    // The controller is usable afterwards.
    h.typed("x");
    assert_eq!(h.host.names(), vec!["delete_char"]);
}

#[test]
fn default_depth_limit_is_recoverable() {
    let mut h = Harness::with_keymaps(
        |b| map(b, ModeSet::NORMAL, "a", "a", RemapOptions::recursive()),
        InputConfig::default(),
    );
    let error = Notice::Error {
        message: "remap expansion nested deeper than 1000".into(),
    };
    let fb = h.typed("a");
    assert_eq!(fb.status, PendingStatus::Idle);
    assert_eq!(h.host.notices, vec![error.clone()]);

    let fb = h.batch("xa").unwrap();
    assert_eq!(fb.mode, Mode::Normal);
    assert_eq!(h.host.names(), vec!["delete_char"]);
    assert_eq!(h.host.notices, vec![error.clone(), error]);
    assert_eq!(h.host.undo_log, vec!["begin", "delete_char", "end"]);
}

#[test]
fn depth_limit_is_logged() {
    let mut h = Harness::with_keymaps(
        |b| map(b, ModeSet::NORMAL, "a", "a", RemapOptions::recursive()),
        small_depth(),
    );
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::WARN)
        .with_target(true)
        .with_ansi(false)
        .without_time()
        .with_writer(BufferWriter {
            inner: buffer.clone(),
        })
        .finish();

    with_default(subscriber, || h.typed("a"));

    let log_output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
    assert!(log_output.contains("WARN input.map:"));
    assert_eq!(log_output.matches("remap_depth_exceeded").count(), 1);
}

#[test]
fn remap_prefix_falls_back_to_builtins() {
    let mut h = Harness::with_keymaps(
        |b| map(b, ModeSet::NORMAL, "dz", "x", RemapOptions::noremap()),
        small_depth(),
    );
    let fb = h.typed("d");
    assert_eq!(fb.status, PendingStatus::AwaitingMore { buffered: 1 });
    h.typed("w");
    assert_eq!(h.host.names(), vec!["delete"]);
    assert_eq!(h.host.last().motion().unwrap().0, "word_forward");

    h.typed("dz");
    assert_eq!(h.host.last().name, "delete_char");
    assert_eq!(h.mode(), Mode::Normal);
}

#[test]
fn file_type_scoped_remap_wins() {
    let mut h = Harness::with_keymaps(
        |b| {
            map(b, ModeSet::NORMAL, "Q", "dd", RemapOptions::noremap());
            map(
                b,
                ModeSet::NORMAL,
                "Q",
                "x",
                RemapOptions::noremap().file_type("rust"),
            );
        },
        small_depth(),
    );
    h.typed("Q");
    assert_eq!(h.host.last().name, "delete");

    h.host.file_type = Some("rust".into());
    h.typed("Q");
    assert_eq!(h.host.last().name, "delete_char");

    h.host.file_type = Some("markdown".into());
    h.typed("Q");
    assert_eq!(h.host.last().name, "delete");
}

#[test]
fn text_remap_expands_to_commands() {
    let mut h = Harness::with_keymaps(
        |b| {
            b.remap_text(
                ModeSet::INSERT,
                "save",
                Expansion::text(["exit_insert"]),
                RemapOptions::noremap(),
            )
            .unwrap();
        },
        small_depth(),
    );
    h.typed("i");
    let fb = h.unit(InputUnit::Text("save".into())).unwrap();
    assert_eq!(fb.mode, Mode::Normal);
    assert_eq!(h.host.names(), vec!["enter_insert", "exit_insert"]);
}

#[test]
fn unmapped_characters_ring_when_disabled() {
    let settings = InputConfig {
        insert_unmapped: false,
        ..small_depth()
    };
    let mut h = Harness::with_keymaps(|_| {}, settings);
    h.typed("ia");
    assert_eq!(h.host.names(), vec!["enter_insert"]);
    assert_eq!(h.host.bells(), 1);
    assert_eq!(h.mode(), Mode::Insert);
}

#[test]
fn remap_in_a_batch_is_one_repeatable_change() {
    let mut h = Harness::with_keymaps(
        |b| map(b, ModeSet::NORMAL, "X", "dw", RemapOptions::noremap()),
        small_depth(),
    );
    h.typed("X");
    h.host.clear();
    h.typed(".");
    assert_eq!(h.host.names(), vec!["delete"]);
    assert_eq!(h.host.undo_log, vec!["begin", "delete", "end"]);
}
