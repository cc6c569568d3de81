//! Per-surface pending state.

use core_events::{InputUnit, KeyToken};
use core_keymap::CommandDescriptor;
use core_state::Mode;
use smallvec::SmallVec;

/// An input unit together with whether user remaps applied when it was fed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUnit {
    pub unit: InputUnit,
    pub remaps: bool,
}

impl RecordedUnit {
    pub fn new(unit: InputUnit) -> Self {
        Self { unit, remaps: true }
    }

    pub fn noremap(unit: InputUnit) -> Self {
        Self {
            unit,
            remaps: false,
        }
    }
}

/// Everything a surface accumulates between two commits.
#[derive(Debug, Clone, Default)]
pub struct PendingState {
    pub mode: Mode,
    pub partial_keys: SmallVec<[KeyToken; 4]>,
    pub partial_text: Vec<String>,
    /// The partial key buffer is a strict prefix of a user remap.
    pub awaiting_remap: bool,
    pub action_count: String,
    pub motion_count: String,
    pub register: Option<char>,
    pub capturing_register: bool,
    pub motion: Option<CommandDescriptor>,
    pub operator: Option<CommandDescriptor>,
    /// Units of the command being composed.
    pub sequence: Vec<RecordedUnit>,
    /// Key sequence that staged the current operator.
    pub operator_keys: Vec<KeyToken>,
}

impl PendingState {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Clear everything except the mode.
    pub fn reset(&mut self) {
        *self = Self::new(self.mode);
    }

    pub fn clear_partial(&mut self) {
        self.partial_keys.clear();
        self.partial_text.clear();
        self.awaiting_remap = false;
    }

    /// Nothing staged, buffered or captured.
    pub fn is_idle(&self) -> bool {
        self.partial_keys.is_empty()
            && self.partial_text.is_empty()
            && self.action_count.is_empty()
            && self.motion_count.is_empty()
            && self.register.is_none()
            && !self.capturing_register
            && self.motion.is_none()
            && self.operator.is_none()
    }

    /// Staged command still collecting input.
    pub fn collecting(&self) -> Option<&CommandDescriptor> {
        [self.motion.as_ref(), self.operator.as_ref()]
            .into_iter()
            .flatten()
            .find(|cmd| cmd.needs_input())
    }

    pub fn collecting_mut(&mut self) -> Option<&mut CommandDescriptor> {
        [self.motion.as_mut(), self.operator.as_mut()]
            .into_iter()
            .flatten()
            .find(|cmd| cmd.needs_input())
    }

    /// Whether a digit would extend a count rather than start one (`0` only
    /// counts once a count is accumulating).
    pub fn count_in_progress(&self) -> bool {
        if self.operator.is_some() {
            !self.motion_count.is_empty()
        } else {
            !self.action_count.is_empty()
        }
    }

    /// Extend the motion count once an operator is staged, else the action
    /// count.
    pub fn push_digit(&mut self, digit: char) {
        if self.operator.is_some() {
            self.motion_count.push(digit);
        } else {
            self.action_count.push(digit);
        }
    }

    /// action-count × motion-count, each defaulting to 1, clamped to `max`.
    pub fn count(&self, max: u32) -> u32 {
        let parse = |s: &str| -> u64 {
            if s.is_empty() {
                1
            } else {
                s.parse::<u64>().unwrap_or(u64::MAX)
            }
        };
        let product = parse(&self.action_count).saturating_mul(parse(&self.motion_count));
        product.min(u64::from(max)).max(1) as u32
    }

    /// Whether the user typed a count for the current command.
    pub fn has_count(&self) -> bool {
        !self.action_count.is_empty() || !self.motion_count.is_empty()
    }
}
