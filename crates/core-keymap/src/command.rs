//! Command registry entries and their per-resolution instances.
//!
//! A [`CommandSpec`] is the static registration: name, kind, capability flags,
//! input kind, preset arguments, entered mode. Every successful builtin
//! resolution instantiates a fresh [`CommandDescriptor`] around the shared [`CommandSpec`]
//! which owns the input collected for that one execution.

use core_events::{InputUnit, KeyToken, KeypadKey, NamedKey};
use core_state::Mode;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Motion,
    Operator,
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct CommandFlags: u8 {
        /// Outside visual modes the operator waits for a motion.
        const MOTION_REQUIRED = 1 << 0;
        /// Commits are stored for dot-repeat.
        const REPEATABLE = 1 << 1;
        /// Collects trailing input before it can run.
        const ACCEPTS_INPUT = 1 << 2;
        /// Motion updates the desired column.
        const UPDATES_XPOS = 1 << 3;
        const SCROLL_INTO_VIEW = 1 << 4;
        /// Execution joins the previous undo group.
        const GLUE_UNDO = 1 << 5;
    }
}

/// Shape of the trailing input a command collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputKind {
    #[default]
    None,
    /// Exactly one key (`f`, `t`, `r`, `q`).
    Char,
    /// Keys up to `<cr>` (`/`, `?`).
    Line,
}

/// Behaviors the input controller performs itself instead of dispatching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Internal {
    /// Start recording into the collected register, or stop recording.
    ToggleMacro,
    /// Replay the collected register (`@` replays the last replayed one).
    ReplayMacro,
    /// Re-drive the last repeatable command.
    RepeatLast,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    pub name: String,
    pub kind: CommandKind,
    pub flags: CommandFlags,
    pub input: InputKind,
    /// Argument receiving the collected input.
    pub input_arg: &'static str,
    /// Arguments bound by the registration (`dd` is `delete` + `linewise`).
    pub preset: Map<String, Value>,
    pub enters: Option<Mode>,
    pub internal: Option<Internal>,
}

impl CommandSpec {
    fn new(name: &str, kind: CommandKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            flags: CommandFlags::empty(),
            input: InputKind::None,
            input_arg: "",
            preset: Map::new(),
            enters: None,
            internal: None,
        }
    }

    pub fn motion(name: &str) -> Self {
        Self::new(name, CommandKind::Motion).with_flags(CommandFlags::SCROLL_INTO_VIEW)
    }

    pub fn operator(name: &str) -> Self {
        Self::new(name, CommandKind::Operator)
    }

    pub fn with_flags(mut self, flags: CommandFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn without_flags(mut self, flags: CommandFlags) -> Self {
        self.flags.remove(flags);
        self
    }

    pub fn motion_required(self) -> Self {
        self.with_flags(CommandFlags::MOTION_REQUIRED)
    }

    pub fn repeatable(self) -> Self {
        self.with_flags(CommandFlags::REPEATABLE)
    }

    pub fn char_input(mut self, arg: &'static str) -> Self {
        self.input = InputKind::Char;
        self.input_arg = arg;
        self.with_flags(CommandFlags::ACCEPTS_INPUT)
    }

    pub fn line_input(mut self, arg: &'static str) -> Self {
        self.input = InputKind::Line;
        self.input_arg = arg;
        self.with_flags(CommandFlags::ACCEPTS_INPUT)
    }

    pub fn preset(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.preset.insert(key.to_string(), value.into());
        self
    }

    pub fn enters(mut self, mode: Mode) -> Self {
        self.enters = Some(mode);
        self
    }

    pub fn internal(mut self, behavior: Internal) -> Self {
        self.internal = Some(behavior);
        self
    }

    pub fn is_motion_required(&self) -> bool {
        self.flags.contains(CommandFlags::MOTION_REQUIRED)
    }

    pub fn is_repeatable(&self) -> bool {
        self.flags.contains(CommandFlags::REPEATABLE)
    }
}

/// Result of offering one unit to a collecting command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accept {
    Taken,
    /// Collection was abandoned (backspace past the start, or a unit that
    /// cannot be input).
    Abandoned,
}

/// A resolved builtin, owning the input collected for this execution.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandDescriptor {
    spec: Arc<CommandSpec>,
    input: String,
    committed: bool,
}

impl CommandDescriptor {
    pub fn new(spec: Arc<CommandSpec>) -> Self {
        Self {
            spec,
            input: String::new(),
            committed: false,
        }
    }

    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn kind(&self) -> CommandKind {
        self.spec.kind
    }

    pub fn flags(&self) -> CommandFlags {
        self.spec.flags
    }

    /// Input collected so far.
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_satisfied(&self) -> bool {
        match self.spec.input {
            InputKind::None => true,
            InputKind::Char => !self.input.is_empty(),
            InputKind::Line => self.committed,
        }
    }

    pub fn needs_input(&self) -> bool {
        !self.is_satisfied()
    }

    /// Feed one unit to the collection step.
    pub fn accept(&mut self, unit: &InputUnit) -> Accept {
        let Some(token) = unit.key() else {
            return Accept::Abandoned;
        };
        match self.spec.input {
            InputKind::None => return Accept::Abandoned,
            InputKind::Char => self.input = input_text(token),
            InputKind::Line => match token {
                KeyToken::Named(NamedKey::Enter) => self.committed = true,
                KeyToken::Named(NamedKey::Backspace) => {
                    if self.input.pop().is_none() {
                        return Accept::Abandoned;
                    }
                }
                other => self.input.push_str(&input_text(other)),
            },
        }
        trace!(
            target: "input.context",
            command = %self.spec.name,
            input = %self.input,
            satisfied = self.is_satisfied(),
            "input_collected"
        );
        Accept::Taken
    }
}

/// Text a key contributes to collected input: the character it types, or its
/// notation when it types nothing.
fn input_text(token: &KeyToken) -> String {
    match token {
        KeyToken::Char(c) => c.to_string(),
        KeyToken::Named(NamedKey::Enter) => "\n".into(),
        KeyToken::Named(NamedKey::Tab) => "\t".into(),
        KeyToken::Named(NamedKey::Keypad(KeypadKey::Digit(d))) => d.to_string(),
        other => other.to_string(),
    }
}
