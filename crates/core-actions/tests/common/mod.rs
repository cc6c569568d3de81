// Shared across the integration tests; each test binary uses a subset of helpers.
#![allow(dead_code)]

use core_actions::{
    CommandHost, Feedback, InputController, InputError, Invocation, Notice, Session, VisualExtent,
};
use core_config::InputConfig;
use core_events::{InputUnit, parse};
use core_keymap::{Keymaps, KeymapsBuilder};
use core_state::Mode;

/// Host double recording everything the controller hands it.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub invocations: Vec<Invocation>,
    pub notices: Vec<Notice>,
    pub modes: Vec<Mode>,
    /// `begin`/`end` markers interleaved with executed command names.
    pub undo_log: Vec<String>,
    pub selection: Option<bool>,
    pub file_type: Option<String>,
    pub extent: Option<VisualExtent>,
    pub restored: Vec<VisualExtent>,
}

impl RecordingHost {
    pub fn names(&self) -> Vec<&str> {
        self.invocations.iter().map(|i| i.name.as_str()).collect()
    }

    pub fn last(&self) -> &Invocation {
        self.invocations.last().expect("no invocation dispatched")
    }

    pub fn bells(&self) -> usize {
        self.notices.iter().filter(|n| **n == Notice::Bell).count()
    }

    pub fn clear(&mut self) {
        self.invocations.clear();
        self.notices.clear();
        self.modes.clear();
        self.undo_log.clear();
    }
}

impl CommandHost for RecordingHost {
    fn execute(&mut self, invocation: &Invocation) {
        self.undo_log.push(invocation.name.clone());
        self.invocations.push(invocation.clone());
    }

    fn begin_undo_group(&mut self) {
        self.undo_log.push("begin".into());
    }

    fn end_undo_group(&mut self) {
        self.undo_log.push("end".into());
    }

    fn selection_state(&self) -> Option<bool> {
        self.selection
    }

    fn file_type(&self) -> Option<String> {
        self.file_type.clone()
    }

    fn visual_extent(&self) -> Option<VisualExtent> {
        self.extent
    }

    fn restore_visual_extent(&mut self, extent: &VisualExtent) {
        self.restored.push(*extent);
    }

    fn mode_changed(&mut self, mode: Mode) {
        self.modes.push(mode);
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

/// Session, controller and host for one surface.
pub struct Harness {
    pub session: Session,
    pub controller: InputController,
    pub host: RecordingHost,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_session(Session::default())
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session,
            controller: InputController::new(Mode::Normal),
            host: RecordingHost::default(),
        }
    }

    /// Defaults plus extra registrations (remaps).
    pub fn with_keymaps(extra: impl FnOnce(&mut KeymapsBuilder), settings: InputConfig) -> Self {
        let mut builder = KeymapsBuilder::with_defaults();
        extra(&mut builder);
        Self::with_session(Session::new(builder.build(), settings))
    }

    /// Feed every key of `notation` as a separately typed unit.
    pub fn typed(&mut self, notation: &str) -> Feedback {
        let mut last = None;
        for key in parse(notation).expect("valid notation") {
            last = Some(self.unit(InputUnit::Key(key)).expect("feed failed"));
        }
        last.expect("empty notation")
    }

    pub fn unit(&mut self, unit: InputUnit) -> Result<Feedback, InputError> {
        self.controller.feed(&mut self.session, &mut self.host, unit)
    }

    pub fn text(&mut self, name: &str) -> Feedback {
        self.unit(InputUnit::Text(name.to_string())).expect("feed failed")
    }

    /// Feed `notation` as one batch.
    pub fn batch(&mut self, notation: &str) -> Result<Feedback, InputError> {
        self.controller
            .feed_notation(&mut self.session, &mut self.host, notation)
    }

    pub fn mode(&self) -> Mode {
        self.controller.mode()
    }
}

pub fn keymaps_with(extra: impl FnOnce(&mut KeymapsBuilder)) -> Keymaps {
    let mut builder = KeymapsBuilder::with_defaults();
    extra(&mut builder);
    builder.build()
}
