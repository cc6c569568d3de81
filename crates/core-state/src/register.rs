//! Register-name classes.
//!
//! Named registers `a`–`z` (upper-case appends), numbered `0`–`9`, and the
//! unnamed register `"` are writable. The remaining read-only registers can be
//! selected with a `"x` prefix but cannot be recorded into.

const READ_ONLY: &str = "-*+.:%#/_=";

pub fn is_writable_register(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '"'
}

pub fn is_readable_register(c: char) -> bool {
    is_writable_register(c) || READ_ONLY.contains(c)
}

/// Destination of a macro recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacroSlot {
    /// Storage name (upper-case names fold to lower-case).
    pub name: char,
    /// Append to the existing macro instead of replacing it.
    pub append: bool,
}

/// Resolve a register name into a macro slot, or `None` when the register is
/// not writable.
pub fn macro_slot(c: char) -> Option<MacroSlot> {
    if !is_writable_register(c) {
        return None;
    }
    Some(MacroSlot {
        name: c.to_ascii_lowercase(),
        append: c.is_ascii_uppercase(),
    })
}
