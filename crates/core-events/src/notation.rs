//! Key notation tokenizer.
//!
//! Grammar (fixed): a bare character is a token; `<` opens a long name made of
//! zero or more modifier prefixes (`C-`, `D-`, `M-`/`A-`, `S-`, each at most
//! once, any order) followed by a single character or a named key, closed by
//! `>`. Tokens are emitted in canonical form so that `<S-C-x>` and `<C-S-x>`
//! compare equal.
//!
//! Tokenization is lazy and restartable: [`tokenize`] returns a fresh iterator
//! over the source each call. The first error ends the iteration.

use crate::{KeyToken, ModMask, NamedKey};
use std::iter::Peekable;
use std::str::CharIndices;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotationError {
    #[error("expected '>' to close the key name opened at index {index}")]
    Unterminated { index: usize },
    #[error("duplicate modifier '{modifier}-' in <{text}>")]
    DuplicateModifier { modifier: char, text: String },
    #[error("'{0}' is not a known key")]
    UnknownKey(String),
    #[error("<{0}> needs a modifier; write the character bare")]
    UnmodifiedCharacter(char),
    #[error("'{0}' is not exactly one key")]
    NotSingleToken(String),
}

/// Lazy token stream over a notation string.
pub struct Tokens<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    done: bool,
}

/// Tokenize `source` from the start.
pub fn tokenize(source: &str) -> Tokens<'_> {
    Tokens {
        source,
        chars: source.char_indices().peekable(),
        done: false,
    }
}

/// Tokenize eagerly, failing on the first malformed token.
pub fn parse(source: &str) -> Result<Vec<KeyToken>, NotationError> {
    tokenize(source).collect()
}

/// Re-join tokens into canonical notation.
pub fn join(tokens: &[KeyToken]) -> String {
    tokens.iter().map(ToString::to_string).collect()
}

/// Canonical form of a notation string (tokenize + join).
pub fn normalize(source: &str) -> Result<String, NotationError> {
    parse(source).map(|tokens| join(&tokens))
}

/// Strip a leading register selection (`"x`) and a leading count so that
/// `"a3dw` and `dw` look up the same builtin. A run of digits starting with
/// `0` is not a count (`0` is itself a motion) and is kept.
pub fn bare_command_name(seq: &[KeyToken]) -> &[KeyToken] {
    let mut rest = seq;
    if rest.first() == Some(&KeyToken::Char('"')) {
        rest = rest.get(2..).unwrap_or(&[]);
    }
    if rest.first().and_then(KeyToken::digit).is_some_and(|d| d != 0) {
        let digits = rest.iter().take_while(|t| t.digit().is_some()).count();
        rest = &rest[digits..];
    }
    rest
}

fn single_char_alias(c: char) -> Option<KeyToken> {
    match c {
        '\n' | '\r' => Some(KeyToken::Named(NamedKey::Enter)),
        '\t' => Some(KeyToken::Named(NamedKey::Tab)),
        '\u{1b}' => Some(KeyToken::Named(NamedKey::Esc)),
        _ => None,
    }
}

fn modifier_bit(c: char) -> Option<ModMask> {
    match c.to_ascii_lowercase() {
        'c' => Some(ModMask::CTRL),
        'd' => Some(ModMask::SUPER),
        'm' | 'a' => Some(ModMask::META),
        's' => Some(ModMask::SHIFT),
        _ => None,
    }
}

impl Tokens<'_> {
    fn long_name(&mut self, open: usize) -> Result<KeyToken, NotationError> {
        let mut mods = ModMask::empty();
        let mut name = String::new();
        loop {
            let Some((_, c)) = self.chars.next() else {
                return Err(NotationError::Unterminated { index: open });
            };
            if name.is_empty()
                && let Some(bit) = modifier_bit(c)
                && matches!(self.chars.peek(), Some((_, '-')))
            {
                self.chars.next();
                if mods.contains(bit) {
                    let end = self.chars.peek().map_or(self.source.len(), |(i, _)| *i);
                    return Err(NotationError::DuplicateModifier {
                        modifier: c.to_ascii_uppercase(),
                        text: self.source[open + 1..end].to_string(),
                    });
                }
                mods |= bit;
                continue;
            }
            if c == '>' {
                // `<C->>` names the '>' key itself.
                if name.is_empty() && !mods.is_empty() {
                    name.push('>');
                    continue;
                }
                return finish_long_name(&name, mods);
            }
            name.push(c);
        }
    }
}

fn finish_long_name(name: &str, mods: ModMask) -> Result<KeyToken, NotationError> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if mods.is_empty() {
            return Err(NotationError::UnmodifiedCharacter(c));
        }
        return Ok(KeyToken::chord(KeyToken::Char(c), mods));
    }
    let lower = name.to_ascii_lowercase();
    let base = match lower.as_str() {
        "lt" => KeyToken::Char('<'),
        "space" => KeyToken::Char(' '),
        "bar" => KeyToken::Char('|'),
        "bslash" => KeyToken::Char('\\'),
        other => match NamedKey::from_name(other) {
            Some(key) => KeyToken::Named(key),
            None => return Err(NotationError::UnknownKey(name.to_string())),
        },
    };
    Ok(KeyToken::chord(base, mods))
}

impl Iterator for Tokens<'_> {
    type Item = Result<KeyToken, NotationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let (idx, c) = self.chars.next()?;
        let item = if let Some(alias) = single_char_alias(c) {
            Ok(alias)
        } else if c == '<' {
            self.long_name(idx)
        } else {
            Ok(KeyToken::Char(c))
        };
        match &item {
            Ok(token) => trace!(target: "input.notation", index = idx, token = %token, "token"),
            Err(err) => {
                trace!(target: "input.notation", index = idx, error = %err, "token_error");
                self.done = true;
            }
        }
        Some(item)
    }
}
