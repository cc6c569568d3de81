//! Operator-pending composition.
//!
//! At most one motion and one operator are staged at a time:
//! `Empty -> {Motion} -> Empty` and
//! `Empty -> {Operator} -> {Operator + Motion} -> Empty`. While an operator
//! that needs a motion is staged outside the visual modes the surface mirrors
//! `OperatorPending`.
//!
//! Runnable once every staged command has its input and one of:
//! * operator and motion,
//! * operator that needs no motion, or any operator in a visual mode,
//! * a motion alone.

use crate::invocation::{Invocation, merge, translate};
use crate::pending::PendingState;
use core_events::KeyToken;
use core_keymap::{CommandDescriptor, CommandKind, Internal};
use core_state::Mode;
use tracing::debug;

/// Violated composition invariants. These indicate inconsistent tables or a
/// corrupted pending state, never ordinary user input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Precondition {
    #[error("a motion is already staged")]
    TooManyMotions,
    #[error("an operator is already staged")]
    TooManyOperators,
    #[error("operator '{0}' staged after a motion")]
    OperatorAfterMotion(String),
    #[error("operator '{operator}' waits for a motion but the mode is {mode}")]
    ModeMismatch { operator: String, mode: Mode },
}

/// Stage a resolved command. `keys` is the key sequence that resolved it.
pub fn stage(
    pending: &mut PendingState,
    cmd: CommandDescriptor,
    keys: &[KeyToken],
) -> Result<(), Precondition> {
    match cmd.kind() {
        CommandKind::Motion => {
            if pending.motion.is_some() {
                return Err(Precondition::TooManyMotions);
            }
            debug!(target: "input.context", motion = %cmd.name(), "motion_staged");
            if pending.operator.is_none() && pending.mode == Mode::OperatorPending {
                pending.mode = Mode::Normal;
            }
            pending.motion = Some(cmd);
        }
        CommandKind::Operator => {
            if pending.operator.is_some() {
                return Err(Precondition::TooManyOperators);
            }
            if pending.motion.is_some() {
                return Err(Precondition::OperatorAfterMotion(cmd.name().to_string()));
            }
            debug!(target: "input.context", operator = %cmd.name(), "operator_staged");
            if cmd.spec().is_motion_required() && !pending.mode.is_visual() {
                pending.mode = Mode::OperatorPending;
            }
            pending.operator = Some(cmd);
            pending.operator_keys = keys.to_vec();
        }
    }
    Ok(())
}

pub fn is_runnable(pending: &PendingState) -> Result<bool, Precondition> {
    if pending.collecting().is_some() {
        return Ok(false);
    }
    match (&pending.operator, &pending.motion) {
        (Some(_), Some(_)) | (None, Some(_)) => Ok(true),
        (Some(op), None) => {
            if !op.spec().is_motion_required() || pending.mode.is_visual() {
                return Ok(true);
            }
            if pending.mode != Mode::OperatorPending {
                return Err(Precondition::ModeMismatch {
                    operator: op.name().to_string(),
                    mode: pending.mode,
                });
            }
            Ok(false)
        }
        (None, None) => Ok(false),
    }
}

/// Outcome of evaluating the staged commands.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub invocation: Invocation,
    /// Mode the evaluation ran in.
    pub origin_mode: Mode,
    pub next_mode: Mode,
    /// A motion ran without an operator.
    pub lone_motion: bool,
    pub repeatable: bool,
    pub internal: Option<Internal>,
    /// Input collected by the evaluated command.
    pub input: String,
    pub count: u32,
    pub count_typed: bool,
    pub register: Option<char>,
}

/// Evaluate and fully reset the pending state (mode excepted). Callers check
/// [`is_runnable`] first; `None` means nothing was staged.
pub fn evaluate(pending: &mut PendingState, max_count: u32) -> Option<Evaluation> {
    let count = pending.count(max_count);
    let count_typed = pending.has_count();
    let register = pending.register;
    let origin_mode = pending.mode;
    // Operator-pending is a view of Normal; commands see the mode they were typed in.
    let args_mode = if origin_mode == Mode::OperatorPending {
        Mode::Normal
    } else {
        origin_mode
    };
    let operator = pending.operator.take();
    let motion = pending.motion.take();
    pending.reset();

    let (invocation, lead) = match (operator, motion) {
        (Some(op), Some(m)) => {
            let inv = merge(
                translate(&op, args_mode, count, register),
                translate(&m, args_mode, count, register),
            );
            (inv, op)
        }
        (Some(op), None) => (translate(&op, args_mode, count, register), op),
        (None, Some(m)) => (translate(&m, args_mode, count, register), m),
        (None, None) => return None,
    };
    let spec = lead.spec();
    let lone_motion = spec.kind == CommandKind::Motion;
    let next_mode = match spec.enters {
        Some(mode) => mode,
        None if origin_mode == Mode::OperatorPending => Mode::Normal,
        None if !lone_motion && origin_mode.is_visual() => Mode::Normal,
        None => origin_mode,
    };
    debug!(
        target: "input.context",
        command = %invocation.name,
        count,
        next_mode = %next_mode,
        "evaluated"
    );
    Some(Evaluation {
        invocation,
        origin_mode,
        next_mode,
        lone_motion,
        repeatable: spec.is_repeatable(),
        internal: spec.internal,
        input: lead.input().to_string(),
        count,
        count_typed,
        register,
    })
}
