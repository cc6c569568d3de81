use core_events::{KeyToken, KeypadKey, ModMask, NamedKey};
use crossterm::event::{
    KeyCode as CKeyCode, KeyEvent as CKeyEvent, KeyEventKind as CKeyEventKind,
    KeyEventState as CKeyEventState, KeyModifiers as CKeyModifiers,
};

/// Map a crossterm key event into a key token.
///
/// Releases and key codes with no notation (media keys, lock keys) map to
/// `None`. Shift is dropped from printable characters since the terminal has
/// already applied it (`A`, not `<S-a>`).
pub fn map_key_event(event: &CKeyEvent) -> Option<KeyToken> {
    if event.kind == CKeyEventKind::Release {
        return None;
    }
    let keypad = event.state.contains(CKeyEventState::KEYPAD);
    let base = map_key_code(&event.code, keypad)?;
    let mut mods = map_mod_mask(event.modifiers);
    match (&event.code, &base) {
        (CKeyCode::BackTab, _) => mods |= ModMask::SHIFT,
        (_, KeyToken::Char(_)) => mods.remove(ModMask::SHIFT),
        _ => {}
    }
    Some(KeyToken::chord(base, mods))
}

/// Convert a crossterm key code into an unmodified key token.
pub fn map_key_code(code: &CKeyCode, keypad: bool) -> Option<KeyToken> {
    let named = |key| Some(KeyToken::Named(key));
    match code {
        CKeyCode::Char(c) if keypad => keypad_char(*c)
            .map(|k| KeyToken::Named(NamedKey::Keypad(k)))
            .or(Some(KeyToken::Char(*c))),
        CKeyCode::Char(c) => Some(KeyToken::Char(*c)),
        CKeyCode::Enter if keypad => named(NamedKey::Keypad(KeypadKey::Enter)),
        CKeyCode::Enter => named(NamedKey::Enter),
        CKeyCode::Esc => named(NamedKey::Esc),
        CKeyCode::Backspace => named(NamedKey::Backspace),
        CKeyCode::Tab | CKeyCode::BackTab => named(NamedKey::Tab),
        CKeyCode::Up => named(NamedKey::Up),
        CKeyCode::Down => named(NamedKey::Down),
        CKeyCode::Left => named(NamedKey::Left),
        CKeyCode::Right => named(NamedKey::Right),
        CKeyCode::Home => named(NamedKey::Home),
        CKeyCode::End => named(NamedKey::End),
        CKeyCode::PageUp => named(NamedKey::PageUp),
        CKeyCode::PageDown => named(NamedKey::PageDown),
        CKeyCode::Insert => named(NamedKey::Insert),
        CKeyCode::Delete => named(NamedKey::Delete),
        CKeyCode::F(n) => named(NamedKey::F(*n)),
        CKeyCode::Null
        | CKeyCode::CapsLock
        | CKeyCode::ScrollLock
        | CKeyCode::NumLock
        | CKeyCode::PrintScreen
        | CKeyCode::Pause
        | CKeyCode::Menu
        | CKeyCode::KeypadBegin
        | CKeyCode::Media(_)
        | CKeyCode::Modifier(_) => None,
    }
}

fn keypad_char(c: char) -> Option<KeypadKey> {
    let key = match c {
        '0'..='9' => KeypadKey::Digit(c as u8 - b'0'),
        '+' => KeypadKey::Plus,
        '-' => KeypadKey::Minus,
        '*' => KeypadKey::Multiply,
        '/' => KeypadKey::Divide,
        '.' => KeypadKey::Point,
        _ => return None,
    };
    Some(key)
}

/// Convert crossterm modifier flags into a chord mask. Alt and meta both
/// become `M-`.
pub(crate) fn map_mod_mask(mods: CKeyModifiers) -> ModMask {
    let mut out = ModMask::empty();
    if mods.contains(CKeyModifiers::CONTROL) {
        out |= ModMask::CTRL;
    }
    if mods.intersects(CKeyModifiers::ALT | CKeyModifiers::META) {
        out |= ModMask::META;
    }
    if mods.contains(CKeyModifiers::SHIFT) {
        out |= ModMask::SHIFT;
    }
    if mods.contains(CKeyModifiers::SUPER) {
        out |= ModMask::SUPER;
    }
    out
}
