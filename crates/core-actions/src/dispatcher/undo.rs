//! Undo-group guard for multi-unit batches.
//!
//! `UndoGlue` stands in for the host while a batch runs. The first
//! `begin_undo_group` opens the host group; later begins and every explicit
//! end are absorbed. The group is closed exactly once when the guard drops,
//! on success and error paths alike. Guards nest: an inner guard forwards its
//! single begin/end pair to the outer guard, which absorbs it.

use super::{CommandHost, Notice, VisualExtent};
use crate::invocation::Invocation;
use core_state::Mode;
use tracing::trace;

pub struct UndoGlue<'h> {
    host: &'h mut dyn CommandHost,
    open: bool,
}

impl<'h> UndoGlue<'h> {
    pub fn new(host: &'h mut dyn CommandHost) -> Self {
        Self { host, open: false }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl CommandHost for UndoGlue<'_> {
    fn execute(&mut self, invocation: &Invocation) {
        self.host.execute(invocation);
    }

    fn begin_undo_group(&mut self) {
        if !self.open {
            trace!(target: "actions.dispatch", "undo_group_open");
            self.host.begin_undo_group();
            self.open = true;
        }
    }

    fn end_undo_group(&mut self) {}

    fn selection_state(&self) -> Option<bool> {
        self.host.selection_state()
    }

    fn file_type(&self) -> Option<String> {
        self.host.file_type()
    }

    fn visual_extent(&self) -> Option<VisualExtent> {
        self.host.visual_extent()
    }

    fn restore_visual_extent(&mut self, extent: &VisualExtent) {
        self.host.restore_visual_extent(extent);
    }

    fn mode_changed(&mut self, mode: Mode) {
        self.host.mode_changed(mode);
    }

    fn notify(&mut self, notice: Notice) {
        self.host.notify(notice);
    }
}

impl Drop for UndoGlue<'_> {
    fn drop(&mut self) {
        if self.open {
            trace!(target: "actions.dispatch", "undo_group_close");
            self.host.end_undo_group();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Groups {
        events: Vec<&'static str>,
    }

    impl CommandHost for Groups {
        fn execute(&mut self, _invocation: &Invocation) {
            self.events.push("execute");
        }
        fn begin_undo_group(&mut self) {
            self.events.push("begin");
        }
        fn end_undo_group(&mut self) {
            self.events.push("end");
        }
    }

    #[test]
    fn unopened_guard_never_touches_the_host() {
        let mut host = Groups::default();
        {
            let mut glue = UndoGlue::new(&mut host);
            glue.execute(&Invocation::new("move_down"));
            glue.end_undo_group();
        }
        assert_eq!(host.events, vec!["execute"]);
    }

    #[test]
    fn nested_guards_open_and_close_once() {
        let mut host = Groups::default();
        {
            let mut outer = UndoGlue::new(&mut host);
            outer.begin_undo_group();
            {
                let mut inner = UndoGlue::new(&mut outer);
                inner.begin_undo_group();
                inner.execute(&Invocation::new("delete"));
                inner.begin_undo_group();
            }
            outer.execute(&Invocation::new("delete"));
            assert!(outer.is_open());
        }
        assert_eq!(host.events, vec!["begin", "execute", "execute", "end"]);
    }
}
