//! Host dispatch boundary.
//!
//! The engine never interprets command names. Every committed invocation is
//! handed to a [`CommandHost`], which also answers the few questions the
//! controller needs about the surface (selection, file type, visual extent)
//! and receives transient notices.
//!
//! * `undo` - scoped undo-group guard used by multi-unit batches

use crate::invocation::Invocation;
use core_state::Mode;
use serde::{Deserialize, Serialize};
use tracing::trace;

mod undo;

pub use undo::UndoGlue;

/// Buffer position, zero-based.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Selection endpoints captured when a visual-mode change is recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualExtent {
    pub anchor: Position,
    pub head: Position,
}

/// Transient user-visible notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum Notice {
    /// Input was rejected.
    Bell,
    Error { message: String },
    /// A line-input command started collecting; the host may show a prompt.
    Prompt { command: String },
    RecordingStarted { register: char },
    RecordingStopped { register: char, steps: usize },
}

/// Everything the controller needs from its surface.
///
/// Only [`CommandHost::execute`] is required; the remaining hooks default to
/// a surface without selection, file type or undo grouping.
pub trait CommandHost {
    fn execute(&mut self, invocation: &Invocation);

    fn begin_undo_group(&mut self) {}

    fn end_undo_group(&mut self) {}

    /// `Some(true)` when the surface has a non-empty selection, `None` when
    /// the host does not track selections.
    fn selection_state(&self) -> Option<bool> {
        None
    }

    fn file_type(&self) -> Option<String> {
        None
    }

    fn visual_extent(&self) -> Option<VisualExtent> {
        None
    }

    fn restore_visual_extent(&mut self, _extent: &VisualExtent) {}

    fn mode_changed(&mut self, _mode: Mode) {}

    fn notify(&mut self, _notice: Notice) {}
}

/// Hand one invocation to the host.
pub(crate) fn dispatch(host: &mut dyn CommandHost, invocation: &Invocation) {
    trace!(
        target: "actions.dispatch",
        command = %invocation.name,
        count = invocation.count(),
        "dispatch"
    );
    host.execute(invocation);
}
