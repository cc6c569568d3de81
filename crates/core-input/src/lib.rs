//! Terminal input adapter: crossterm events in, input units out.

mod async_service;
mod key_token;

pub use async_service::{AsyncInputShutdown, spawn_async_input};
pub use key_token::{map_key_code, map_key_event};

use core_events::{InputUnit, KeyToken, NamedKey};

/// Bounded capacity of the input channel.
pub const INPUT_CHANNEL_CAP: usize = 256;

/// One event forwarded from the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalInput {
    Key(KeyToken),
    /// Bracketed-paste content, delivered whole.
    Paste(String),
}

impl TerminalInput {
    /// Units for the input controller. A paste becomes one key per character,
    /// with line breaks as `<cr>` (a `\r\n` pair counts once).
    pub fn units(&self) -> Vec<InputUnit> {
        match self {
            TerminalInput::Key(key) => vec![InputUnit::Key(key.clone())],
            TerminalInput::Paste(text) => {
                let mut out = Vec::with_capacity(text.len());
                let mut chars = text.chars().peekable();
                while let Some(c) = chars.next() {
                    let key = match c {
                        '\r' => {
                            chars.next_if_eq(&'\n');
                            KeyToken::Named(NamedKey::Enter)
                        }
                        '\n' => KeyToken::Named(NamedKey::Enter),
                        '\t' => KeyToken::Named(NamedKey::Tab),
                        c => KeyToken::Char(c),
                    };
                    out.push(InputUnit::Key(key));
                }
                out
            }
        }
    }
}

#[inline]
pub(crate) fn log_paste(content: &str) {
    tracing::trace!(target: "input.paste", len = content.len(), "paste_event");
}
