//! core-state: modal state shared by the keymap and action layers.
//!
//! Two types model modes:
//! * [`Mode`] is the live modal state of an editing surface. It is always a
//!   single mode.
//! * [`ModeSet`] is a set of modes used to scope mappings and builtin
//!   registrations, with named unions (`ANY_VISUAL`, `INSERT_LIKE`, `NVO`).
//!
//! Register-name classes live in [`register`].

use std::fmt;

pub mod register;

pub use register::{MacroSlot, is_readable_register, is_writable_register, macro_slot};

/// Modal state of an editing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Normal command/navigation mode.
    #[default]
    Normal,
    /// Insert text mode.
    Insert,
    /// Visual character-wise selection.
    Visual,
    /// Visual line-wise selection.
    VisualLine,
    /// Visual block selection.
    VisualBlock,
    Select,
    /// An operator is staged and waits for its motion.
    OperatorPending,
    Replace,
    /// Command line (`:`) input.
    Command,
    Terminal,
    /// Language-argument input (e.g. the character after `f`).
    LanguageArg,
    /// Internal submode passed to a motion executed on behalf of an operator.
    /// Never a live mode.
    InternalNormal,
    Unknown,
    Empty,
}

impl Mode {
    pub const ALL: [Mode; 14] = [
        Mode::Normal,
        Mode::Insert,
        Mode::Visual,
        Mode::VisualLine,
        Mode::VisualBlock,
        Mode::Select,
        Mode::OperatorPending,
        Mode::Replace,
        Mode::Command,
        Mode::Terminal,
        Mode::LanguageArg,
        Mode::InternalNormal,
        Mode::Unknown,
        Mode::Empty,
    ];

    /// Stable snake_case name, used in invocation args and logs.
    pub fn name(self) -> &'static str {
        match self {
            Mode::Normal => "normal",
            Mode::Insert => "insert",
            Mode::Visual => "visual",
            Mode::VisualLine => "visual_line",
            Mode::VisualBlock => "visual_block",
            Mode::Select => "select",
            Mode::OperatorPending => "operator_pending",
            Mode::Replace => "replace",
            Mode::Command => "command",
            Mode::Terminal => "terminal",
            Mode::LanguageArg => "language_arg",
            Mode::InternalNormal => "internal_normal",
            Mode::Unknown => "unknown",
            Mode::Empty => "empty",
        }
    }

    pub fn from_name(name: &str) -> Option<Mode> {
        Mode::ALL.into_iter().find(|m| m.name() == name)
    }

    /// Whether this mode can be held as the live mode of a surface.
    pub fn is_live(self) -> bool {
        !matches!(self, Mode::InternalNormal | Mode::Unknown | Mode::Empty)
    }

    pub fn is_visual(self) -> bool {
        ModeSet::ANY_VISUAL.contains(self.set())
    }

    pub fn is_insert_like(self) -> bool {
        ModeSet::INSERT_LIKE.contains(self.set())
    }

    /// Modes in which a bare digit extends a count instead of resolving.
    pub fn accepts_counts(self) -> bool {
        matches!(
            self,
            Mode::Normal
                | Mode::OperatorPending
                | Mode::Visual
                | Mode::VisualLine
                | Mode::VisualBlock
        )
    }

    /// Singleton set for this mode.
    pub fn set(self) -> ModeSet {
        match self {
            Mode::Normal => ModeSet::NORMAL,
            Mode::Insert => ModeSet::INSERT,
            Mode::Visual => ModeSet::VISUAL,
            Mode::VisualLine => ModeSet::VISUAL_LINE,
            Mode::VisualBlock => ModeSet::VISUAL_BLOCK,
            Mode::Select => ModeSet::SELECT,
            Mode::OperatorPending => ModeSet::OPERATOR_PENDING,
            Mode::Replace => ModeSet::REPLACE,
            Mode::Command => ModeSet::COMMAND,
            Mode::Terminal => ModeSet::TERMINAL,
            Mode::LanguageArg => ModeSet::LANGUAGE_ARG,
            Mode::InternalNormal => ModeSet::INTERNAL_NORMAL,
            Mode::Unknown => ModeSet::UNKNOWN,
            Mode::Empty => ModeSet::EMPTY,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl serde::Serialize for Mode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

bitflags::bitflags! {
    /// Mode scope of a mapping or registration.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ModeSet: u16 {
        const NORMAL = 1 << 0;
        const INSERT = 1 << 1;
        const VISUAL = 1 << 2;
        const VISUAL_LINE = 1 << 3;
        const VISUAL_BLOCK = 1 << 4;
        const SELECT = 1 << 5;
        const OPERATOR_PENDING = 1 << 6;
        const REPLACE = 1 << 7;
        const COMMAND = 1 << 8;
        const TERMINAL = 1 << 9;
        const LANGUAGE_ARG = 1 << 10;
        const INTERNAL_NORMAL = 1 << 11;
        const UNKNOWN = 1 << 12;
        const EMPTY = 1 << 13;

        const ANY_VISUAL =
            Self::VISUAL.bits() | Self::VISUAL_LINE.bits() | Self::VISUAL_BLOCK.bits();
        const INSERT_LIKE = Self::INSERT.bits() | Self::REPLACE.bits();
        /// Normal, visual, select and operator-pending (`:map`).
        const NVO = Self::NORMAL.bits()
            | Self::ANY_VISUAL.bits()
            | Self::SELECT.bits()
            | Self::OPERATOR_PENDING.bits();
        /// Modes in which motions are available.
        const MOTION =
            Self::NORMAL.bits() | Self::ANY_VISUAL.bits() | Self::OPERATOR_PENDING.bits();
    }
}

impl ModeSet {
    /// Parse a Vim map-command prefix (`n`, `x`, `o`, ...). Several prefixes
    /// may be combined (`"nx"`). The empty prefix is `:map` (n+v+o).
    pub fn from_map_prefix(prefix: &str) -> Option<ModeSet> {
        if prefix.is_empty() {
            return Some(ModeSet::NVO);
        }
        let mut set = ModeSet::empty();
        for c in prefix.chars() {
            set |= match c {
                'n' => ModeSet::NORMAL,
                'v' => ModeSet::ANY_VISUAL | ModeSet::SELECT,
                'x' => ModeSet::ANY_VISUAL,
                's' => ModeSet::SELECT,
                'o' => ModeSet::OPERATOR_PENDING,
                'i' => ModeSet::INSERT,
                'c' => ModeSet::COMMAND,
                't' => ModeSet::TERMINAL,
                'l' => ModeSet::INSERT | ModeSet::COMMAND | ModeSet::LANGUAGE_ARG,
                'r' => ModeSet::REPLACE,
                _ => return None,
            };
        }
        Some(set)
    }

    /// Iterate the single modes contained in this set.
    pub fn modes(self) -> impl Iterator<Item = Mode> {
        Mode::ALL.into_iter().filter(move |m| self.contains(m.set()))
    }

    pub fn contains_mode(self, mode: Mode) -> bool {
        self.contains(mode.set())
    }
}

impl From<Mode> for ModeSet {
    fn from(mode: Mode) -> Self {
        mode.set()
    }
}
