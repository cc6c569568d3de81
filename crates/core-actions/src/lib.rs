//! core-actions: turns input units into host command invocations.
//!
//! One [`InputController`] per surface feeds units through the resolver
//! (`core-keymap`) and the operator-pending composer, then hands committed
//! [`Invocation`]s to a [`CommandHost`]. The process-wide [`Session`] holds the
//! shared mapping tables, recorded macros and the dot-repeat record.
//!
//! Modules:
//! * `invocation` - `{name, args}` contract and operator/motion merging
//! * `pending`    - per-surface pending state (buffers, counts, staged commands)
//! * `composer`   - operator-pending state machine
//! * `controller` - per-unit driver, batches, macros and repeat
//! * `recorder`   - macro recorder and repeat store
//! * `dispatcher` - host trait, notices and the undo-group guard
//! * `session`    - shared tables and settings

pub mod composer;
pub mod controller;
pub mod dispatcher;
pub mod invocation;
pub mod pending;
pub mod recorder;
pub mod session;

pub use composer::{Evaluation, Precondition};
pub use controller::{Feedback, InputController, InputError, PendingStatus};
pub use dispatcher::{CommandHost, Notice, Position, UndoGlue, VisualExtent};
pub use invocation::{Invocation, UNNAMED_REGISTER, merge, translate};
pub use pending::{PendingState, RecordedUnit};
pub use recorder::{MacroCommand, MacroRecorder, MacroStep, RepeatRecord, RepeatStore};
pub use session::Session;
