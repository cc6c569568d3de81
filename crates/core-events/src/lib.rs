//! Core input unit types for oxmodal.
//!
//! Everything that reaches the resolution engine is an [`InputUnit`]: either a
//! canonical [`KeyToken`] (typed by the user, expanded from a remap, or
//! replayed from a macro) or a named text-command issued by the host. The
//! [`notation`] module turns flat key-notation strings (`"2d<C-w>"`) into
//! tokens and back.

use std::fmt;
use std::str::FromStr;

pub mod notation;

pub use notation::{
    NotationError, Tokens, bare_command_name, join, normalize, parse, tokenize,
};

bitflags::bitflags! {
    /// Modifier set carried by a chord. Bit order is the canonical emission
    /// order: control, command/super, meta, shift.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ModMask: u8 { const CTRL=1; const SUPER=2; const META=4; const SHIFT=8; }
}

impl ModMask {
    /// Notation prefix for every set modifier, in canonical order (`C-M-`).
    pub fn prefix(self) -> String {
        let mut out = String::new();
        for (flag, letter) in [
            (ModMask::CTRL, "C-"),
            (ModMask::SUPER, "D-"),
            (ModMask::META, "M-"),
            (ModMask::SHIFT, "S-"),
        ] {
            if self.contains(flag) {
                out.push_str(letter);
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeypadKey {
    Digit(u8),
    Plus,
    Minus,
    Multiply,
    Divide,
    Enter,
    Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Enter,
    Esc,
    Backspace,
    Tab,
    F(u8),
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
    Keypad(KeypadKey),
}

impl NamedKey {
    /// Canonical (lower-case) long name used inside `<...>`.
    pub fn name(self) -> String {
        match self {
            NamedKey::Enter => "cr".into(),
            NamedKey::Esc => "esc".into(),
            NamedKey::Backspace => "bs".into(),
            NamedKey::Tab => "tab".into(),
            NamedKey::F(n) => format!("f{n}"),
            NamedKey::Up => "up".into(),
            NamedKey::Down => "down".into(),
            NamedKey::Left => "left".into(),
            NamedKey::Right => "right".into(),
            NamedKey::Home => "home".into(),
            NamedKey::End => "end".into(),
            NamedKey::PageUp => "pageup".into(),
            NamedKey::PageDown => "pagedown".into(),
            NamedKey::Insert => "insert".into(),
            NamedKey::Delete => "del".into(),
            NamedKey::Keypad(k) => match k {
                KeypadKey::Digit(d) => format!("k{d}"),
                KeypadKey::Plus => "kplus".into(),
                KeypadKey::Minus => "kminus".into(),
                KeypadKey::Multiply => "kmultiply".into(),
                KeypadKey::Divide => "kdivide".into(),
                KeypadKey::Enter => "kenter".into(),
                KeypadKey::Point => "kpoint".into(),
            },
        }
    }

    /// Look up a named key by its long name. `name` must already be lower-case.
    pub fn from_name(name: &str) -> Option<NamedKey> {
        let key = match name {
            "cr" | "enter" | "return" => NamedKey::Enter,
            "esc" => NamedKey::Esc,
            "bs" | "backspace" => NamedKey::Backspace,
            "tab" => NamedKey::Tab,
            "up" => NamedKey::Up,
            "down" => NamedKey::Down,
            "left" => NamedKey::Left,
            "right" => NamedKey::Right,
            "home" => NamedKey::Home,
            "end" => NamedKey::End,
            "pageup" => NamedKey::PageUp,
            "pagedown" => NamedKey::PageDown,
            "insert" | "ins" => NamedKey::Insert,
            "del" | "delete" => NamedKey::Delete,
            "kplus" => NamedKey::Keypad(KeypadKey::Plus),
            "kminus" => NamedKey::Keypad(KeypadKey::Minus),
            "kmultiply" => NamedKey::Keypad(KeypadKey::Multiply),
            "kdivide" => NamedKey::Keypad(KeypadKey::Divide),
            "kenter" => NamedKey::Keypad(KeypadKey::Enter),
            "kpoint" => NamedKey::Keypad(KeypadKey::Point),
            other => {
                if let Some(n) = other.strip_prefix('f') {
                    let n: u8 = n.parse().ok()?;
                    return (1..=12).contains(&n).then_some(NamedKey::F(n));
                }
                if let Some(d) = other.strip_prefix('k') {
                    let d: u8 = d.parse().ok()?;
                    let digit = NamedKey::Keypad(KeypadKey::Digit(d));
                    return (d <= 9 && other.len() == 2).then_some(digit);
                }
                return None;
            }
        };
        Some(key)
    }
}

/// Canonical logical key tokens.
///
/// `KeyToken::Chord` wraps a base token plus modifier mask. Construct chords
/// through [`KeyToken::chord`] so an empty mask collapses to the base token and
/// a chord never nests another chord; equality then coincides with notation
/// equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyToken {
    Char(char),
    Named(NamedKey),
    Chord { base: Box<KeyToken>, mods: ModMask },
}

impl KeyToken {
    pub fn chord(base: KeyToken, mods: ModMask) -> KeyToken {
        match base {
            _ if mods.is_empty() => base,
            KeyToken::Chord { base, mods: inner } => KeyToken::Chord {
                base,
                mods: inner | mods,
            },
            base => KeyToken::Chord {
                base: Box::new(base),
                mods,
            },
        }
    }

    pub fn ctrl(c: char) -> KeyToken {
        KeyToken::chord(KeyToken::Char(c), ModMask::CTRL)
    }

    /// Unmodified printable character, if this token is one.
    pub fn as_char(&self) -> Option<char> {
        match self {
            KeyToken::Char(c) => Some(*c),
            _ => None,
        }
    }

    /// Decimal value of an unmodified digit key.
    pub fn digit(&self) -> Option<u32> {
        self.as_char().and_then(|c| c.to_digit(10))
    }

    pub fn mods(&self) -> ModMask {
        match self {
            KeyToken::Chord { mods, .. } => *mods,
            _ => ModMask::empty(),
        }
    }

    /// Escape-class keys abort any pending composition: `<esc>`, `<C-[>`, `<C-c>`.
    pub fn is_escape(&self) -> bool {
        match self {
            KeyToken::Named(NamedKey::Esc) => true,
            KeyToken::Chord { base, mods } if *mods == ModMask::CTRL => {
                matches!(**base, KeyToken::Char('[') | KeyToken::Char('c'))
            }
            _ => false,
        }
    }

    fn write_long_name(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyToken::Char('<') => f.write_str("lt"),
            KeyToken::Char(' ') => f.write_str("space"),
            KeyToken::Char(c) => write!(f, "{c}"),
            KeyToken::Named(k) => f.write_str(&k.name()),
            KeyToken::Chord { base, .. } => base.write_long_name(f),
        }
    }
}

impl fmt::Display for KeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyToken::Char('<') => f.write_str("<lt>"),
            KeyToken::Char(' ') => f.write_str("<space>"),
            KeyToken::Char(c) => write!(f, "{c}"),
            KeyToken::Named(_) => {
                f.write_str("<")?;
                self.write_long_name(f)?;
                f.write_str(">")
            }
            KeyToken::Chord { base, mods } => {
                write!(f, "<{}", mods.prefix())?;
                base.write_long_name(f)?;
                f.write_str(">")
            }
        }
    }
}

impl FromStr for KeyToken {
    type Err = NotationError;

    /// Parse exactly one token of notation (`"x"`, `"<C-w>"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = parse(s)?;
        if tokens.len() != 1 {
            return Err(NotationError::NotSingleToken(s.to_string()));
        }
        Ok(tokens.remove(0))
    }
}

impl serde::Serialize for KeyToken {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One discrete unit of input as delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InputUnit {
    /// A key token (the key-sequence track).
    Key(KeyToken),
    /// A named text-command (the text-command track).
    Text(String),
}

impl InputUnit {
    pub fn key(&self) -> Option<&KeyToken> {
        match self {
            InputUnit::Key(k) => Some(k),
            InputUnit::Text(_) => None,
        }
    }

    pub fn is_escape(&self) -> bool {
        self.key().is_some_and(KeyToken::is_escape)
    }
}

impl From<KeyToken> for InputUnit {
    fn from(token: KeyToken) -> Self {
        InputUnit::Key(token)
    }
}

impl fmt::Display for InputUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputUnit::Key(k) => write!(f, "{k}"),
            InputUnit::Text(name) => write!(f, "[{name}]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chord_with_empty_mask_collapses() {
        let t = KeyToken::chord(KeyToken::Char('x'), ModMask::empty());
        assert_eq!(t, KeyToken::Char('x'));
    }

    #[test]
    fn chord_of_chord_merges_masks() {
        let inner = KeyToken::ctrl('w');
        let outer = KeyToken::chord(inner, ModMask::SHIFT);
        assert_eq!(outer.mods(), ModMask::CTRL | ModMask::SHIFT);
        assert_eq!(outer.to_string(), "<C-S-w>");
    }

    #[test]
    fn display_escapes_less_than_and_space() {
        assert_eq!(KeyToken::Char('<').to_string(), "<lt>");
        assert_eq!(KeyToken::Char(' ').to_string(), "<space>");
        assert_eq!(
            KeyToken::chord(KeyToken::Char('<'), ModMask::META).to_string(),
            "<M-lt>"
        );
    }

    #[test]
    fn display_named_keys_lowercase() {
        assert_eq!(KeyToken::Named(NamedKey::Enter).to_string(), "<cr>");
        assert_eq!(KeyToken::Named(NamedKey::F(5)).to_string(), "<f5>");
        assert_eq!(
            KeyToken::Named(NamedKey::Keypad(KeypadKey::Digit(3))).to_string(),
            "<k3>"
        );
    }

    #[test]
    fn escape_class() {
        assert!(KeyToken::Named(NamedKey::Esc).is_escape());
        assert!(KeyToken::ctrl('[').is_escape());
        assert!(KeyToken::ctrl('c').is_escape());
        assert!(!KeyToken::Char('c').is_escape());
        assert!(!InputUnit::Text("esc".into()).is_escape());
    }

    #[test]
    fn named_key_lookup_bounds() {
        assert_eq!(NamedKey::from_name("f12"), Some(NamedKey::F(12)));
        assert_eq!(NamedKey::from_name("f13"), None);
        assert_eq!(NamedKey::from_name("k10"), None);
        assert_eq!(NamedKey::from_name("return"), Some(NamedKey::Enter));
    }

    #[test]
    fn from_str_requires_single_token() {
        assert_eq!("<C-w>".parse::<KeyToken>(), Ok(KeyToken::ctrl('w')));
        assert!(matches!(
            "ab".parse::<KeyToken>(),
            Err(NotationError::NotSingleToken(_))
        ));
    }
}
