//! Keystroke encoder: logical key plus modifiers to the bytes each emulation
//! expects from its keyboard.
//!
//! The per-emulation tables depend on a little live terminal state (cursor-key
//! and keypad modes, VT52 submode, the active code page); the emulator gathers
//! it into a [`KeyboardState`] before every call.

use bitflags::bitflags;

use crate::charset::Codepage;
use crate::emulation::Emulation;

bitflags! {
    /// Modifier keys held during a key or mouse event.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
    }
}

/// Keys on the numeric keypad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeypadKey {
    Digit(u8),
    Period,
    Comma,
    Slash,
    Star,
    Minus,
    Plus,
    Enter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    /// Function key `F1`..`F20`.
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
    Enter,
    Backspace,
    Tab,
    BackTab,
    Escape,
    Keypad(KeypadKey),
}

/// Terminal state that changes what a key sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardState {
    pub emulation: Emulation,
    /// DECCKM set.
    pub application_cursor: bool,
    /// DECKPAM set.
    pub application_keypad: bool,
    /// DEC parser is in its VT52 submode.
    pub vt52: bool,
    pub hard_backspace: bool,
    /// Newline-sensitive transport, or LNM set.
    pub crlf_on_enter: bool,
    pub codepage: Codepage,
}

impl KeyboardState {
    #[must_use]
    pub fn new(emulation: Emulation) -> Self {
        Self {
            emulation,
            application_cursor: false,
            application_keypad: false,
            vt52: emulation == Emulation::Vt52,
            hard_backspace: false,
            crlf_on_enter: false,
            codepage: emulation.default_codepage(),
        }
    }
}

/// Encode `key` for the emulation in `state`. Keys listed in `doorway` are
/// sent as DOORWAY `NUL <scancode>` pairs when they have a scan code.
#[must_use]
pub fn encode_key(
    key: Key,
    mods: Modifiers,
    state: &KeyboardState,
    doorway: &[Key],
) -> Option<Vec<u8>> {
    if doorway.contains(&key)
        && let Some(scan) = doorway_scancode(key, mods)
    {
        return Some(vec![0x00, scan]);
    }
    // Keys shared by every table.
    match key {
        Key::Char(ch) => return encode_char(ch, mods, state),
        Key::Escape => return Some(vec![0x1b]),
        Key::Enter => return Some(enter(state)),
        _ => {}
    }
    match state.emulation {
        Emulation::Tty | Emulation::Debug => encode_plain(key, state),
        Emulation::Ansi | Emulation::Avatar => encode_ansi(key, state),
        Emulation::Petscii => encode_petscii(key, mods),
        Emulation::Atascii => encode_atascii(key),
        _ if state.vt52 => encode_vt52(key, state),
        Emulation::Vt52 => encode_vt52(key, state),
        Emulation::Vt100 | Emulation::Vt102 => encode_vt100(key, state),
        Emulation::Vt220 => encode_vt220(key, state),
        Emulation::Linux | Emulation::LinuxUtf8 => encode_linux(key, state),
        Emulation::Xterm | Emulation::XtermUtf8 => encode_xterm(key, mods, state),
    }
}

fn enter(state: &KeyboardState) -> Vec<u8> {
    match state.emulation {
        Emulation::Atascii => vec![0x9b],
        Emulation::Petscii => vec![0x0d],
        _ if state.crlf_on_enter => b"\r\n".to_vec(),
        _ => b"\r".to_vec(),
    }
}

fn backspace(state: &KeyboardState) -> Vec<u8> {
    if state.hard_backspace && state.emulation != Emulation::Vt220 {
        vec![0x08]
    } else {
        vec![0x7f]
    }
}

fn ctrl_char_to_byte(ch: char) -> Option<u8> {
    match ch {
        '@' | ' ' => Some(0x00),
        'a'..='z' => Some(ch as u8 - b'a' + 1),
        'A'..='Z' => Some(ch as u8 - b'A' + 1),
        '[' => Some(0x1b),
        '\\' => Some(0x1c),
        ']' => Some(0x1d),
        '^' => Some(0x1e),
        '_' => Some(0x1f),
        _ => None,
    }
}

fn encode_char(ch: char, mods: Modifiers, state: &KeyboardState) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(4);
    if mods.contains(Modifiers::ALT) && state.emulation.is_xterm() {
        out.push(0x1b);
    }
    if mods.contains(Modifiers::CTRL)
        && let Some(ctrl) = ctrl_char_to_byte(ch)
    {
        out.push(ctrl);
        return Some(out);
    }
    if state.codepage == Codepage::Utf8 {
        let mut buf = [0u8; 4];
        out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
    } else {
        out.push(state.codepage.encode(ch)?);
    }
    Some(out)
}

fn keypad_ascii(key: KeypadKey) -> u8 {
    match key {
        KeypadKey::Digit(d) => b'0' + d.min(9),
        KeypadKey::Period => b'.',
        KeypadKey::Comma => b',',
        KeypadKey::Slash => b'/',
        KeypadKey::Star => b'*',
        KeypadKey::Minus => b'-',
        KeypadKey::Plus => b'+',
        KeypadKey::Enter => b'\r',
    }
}

// Final byte of the application-keypad form (`ESC O x` / `ESC ? x`).
fn keypad_application_final(key: KeypadKey) -> u8 {
    match key {
        KeypadKey::Digit(d) => b'p' + d.min(9),
        KeypadKey::Period => b'n',
        KeypadKey::Comma => b'l',
        KeypadKey::Slash => b'o',
        KeypadKey::Star => b'j',
        KeypadKey::Minus => b'm',
        KeypadKey::Plus => b'k',
        KeypadKey::Enter => b'M',
    }
}

fn keypad(key: KeypadKey, state: &KeyboardState, prefix: u8) -> Vec<u8> {
    if state.application_keypad {
        vec![0x1b, prefix, keypad_application_final(key)]
    } else if key == KeypadKey::Enter {
        enter(state)
    } else {
        vec![keypad_ascii(key)]
    }
}

fn arrow_final(key: Key) -> Option<u8> {
    match key {
        Key::Up => Some(b'A'),
        Key::Down => Some(b'B'),
        Key::Right => Some(b'C'),
        Key::Left => Some(b'D'),
        _ => None,
    }
}

// `ESC [ x` normally, `ESC O x` under DECCKM.
fn dec_arrow(final_byte: u8, state: &KeyboardState) -> Vec<u8> {
    let intro = if state.application_cursor { b'O' } else { b'[' };
    vec![0x1b, intro, final_byte]
}

fn pf_key(n: u8) -> Option<Vec<u8>> {
    let pf = match n {
        1 => b'P',
        2 => b'Q',
        3 => b'R',
        4 => b'S',
        _ => return None,
    };
    Some(vec![0x1b, b'O', pf])
}

// VT220 function-key codes for F5-F20.
fn function_tilde_code(n: u8) -> Option<u16> {
    Some(match n {
        5 => 15,
        6 => 17,
        7 => 18,
        8 => 19,
        9 => 20,
        10 => 21,
        11 => 23,
        12 => 24,
        13 => 25,
        14 => 26,
        15 => 28,
        16 => 29,
        17 => 31,
        18 => 32,
        19 => 33,
        20 => 34,
        _ => return None,
    })
}

fn editing_tilde_code(key: Key) -> Option<u16> {
    Some(match key {
        Key::Home => 1,
        Key::Insert => 2,
        Key::Delete => 3,
        Key::End => 4,
        Key::PageUp => 5,
        Key::PageDown => 6,
        _ => return None,
    })
}

fn csi_tilde(code: u16) -> Vec<u8> {
    format!("\x1b[{code}~").into_bytes()
}

fn encode_plain(key: Key, state: &KeyboardState) -> Option<Vec<u8>> {
    match key {
        Key::Backspace => Some(backspace(state)),
        Key::Tab => Some(vec![0x09]),
        Key::Delete => Some(vec![0x7f]),
        Key::Keypad(k) => Some(vec![keypad_ascii(k)]),
        _ => None,
    }
}

fn encode_ansi(key: Key, state: &KeyboardState) -> Option<Vec<u8>> {
    if let Some(final_byte) = arrow_final(key) {
        return Some(vec![0x1b, b'[', final_byte]);
    }
    Some(match key {
        Key::Backspace => backspace(state),
        Key::Tab => vec![0x09],
        Key::BackTab => b"\x1b[Z".to_vec(),
        Key::Home => b"\x1b[H".to_vec(),
        Key::End => b"\x1b[K".to_vec(),
        Key::PageUp => b"\x1b[V".to_vec(),
        Key::PageDown => b"\x1b[U".to_vec(),
        Key::Insert => b"\x1b[@".to_vec(),
        Key::Delete => vec![0x7f],
        Key::F(n @ 1..=4) => pf_key(n)?,
        Key::F(n) => csi_tilde(function_tilde_code(n)?),
        Key::Keypad(k) => keypad(k, state, b'O'),
        _ => return None,
    })
}

fn encode_vt52(key: Key, state: &KeyboardState) -> Option<Vec<u8>> {
    if let Some(final_byte) = arrow_final(key) {
        return Some(vec![0x1b, final_byte]);
    }
    Some(match key {
        Key::Backspace => backspace(state),
        Key::Tab => vec![0x09],
        Key::Delete => vec![0x7f],
        Key::F(n @ 1..=4) => vec![0x1b, b'P' + (n - 1)],
        Key::Keypad(k) => keypad(k, state, b'?'),
        _ => return None,
    })
}

fn encode_vt100(key: Key, state: &KeyboardState) -> Option<Vec<u8>> {
    if let Some(final_byte) = arrow_final(key) {
        return Some(dec_arrow(final_byte, state));
    }
    Some(match key {
        Key::Backspace => backspace(state),
        Key::Tab => vec![0x09],
        Key::Delete => vec![0x7f],
        Key::F(n) => pf_key(n)?,
        Key::Keypad(k) => keypad(k, state, b'O'),
        _ => return None,
    })
}

fn encode_vt220(key: Key, state: &KeyboardState) -> Option<Vec<u8>> {
    if let Some(final_byte) = arrow_final(key) {
        return Some(dec_arrow(final_byte, state));
    }
    if let Some(code) = editing_tilde_code(key) {
        return Some(csi_tilde(code));
    }
    Some(match key {
        Key::Backspace => backspace(state),
        Key::Tab => vec![0x09],
        Key::F(n @ 1..=4) => pf_key(n)?,
        Key::F(n) => csi_tilde(function_tilde_code(n)?),
        Key::Keypad(k) => keypad(k, state, b'O'),
        _ => return None,
    })
}

fn encode_linux(key: Key, state: &KeyboardState) -> Option<Vec<u8>> {
    if let Some(final_byte) = arrow_final(key) {
        return Some(dec_arrow(final_byte, state));
    }
    if let Some(code) = editing_tilde_code(key) {
        return Some(csi_tilde(code));
    }
    Some(match key {
        Key::Backspace => backspace(state),
        Key::Tab => vec![0x09],
        Key::BackTab => b"\x1b[Z".to_vec(),
        // The console sends F1-F5 as `ESC [ [ A`..`E`.
        Key::F(n @ 1..=5) => vec![0x1b, b'[', b'[', b'A' + (n - 1)],
        Key::F(n) => csi_tilde(function_tilde_code(n)?),
        Key::Keypad(k) => keypad(k, state, b'O'),
        _ => return None,
    })
}

fn xterm_modifier_value(mods: Modifiers) -> u8 {
    // xterm encoding is `1 + bits`, with bits matching our bitflag layout.
    1 + mods.bits()
}

fn csi_with_mod_or_plain(final_byte: u8, mods: Modifiers, state: &KeyboardState) -> Vec<u8> {
    if mods.is_empty() {
        dec_arrow(final_byte, state)
    } else {
        let mod_value = xterm_modifier_value(mods);
        format!("\x1b[1;{mod_value}{}", final_byte as char).into_bytes()
    }
}

fn csi_tilde_with_mod(code: u16, mods: Modifiers) -> Vec<u8> {
    if mods.is_empty() {
        csi_tilde(code)
    } else {
        let mod_value = xterm_modifier_value(mods);
        format!("\x1b[{code};{mod_value}~").into_bytes()
    }
}

fn encode_xterm(key: Key, mods: Modifiers, state: &KeyboardState) -> Option<Vec<u8>> {
    if let Some(final_byte) = arrow_final(key) {
        return Some(csi_with_mod_or_plain(final_byte, mods, state));
    }
    Some(match key {
        Key::Home => csi_with_mod_or_plain(b'H', mods, state),
        Key::End => csi_with_mod_or_plain(b'F', mods, state),
        Key::Insert => csi_tilde_with_mod(2, mods),
        Key::Delete => csi_tilde_with_mod(3, mods),
        Key::PageUp => csi_tilde_with_mod(5, mods),
        Key::PageDown => csi_tilde_with_mod(6, mods),
        Key::Backspace => {
            let mut out = Vec::with_capacity(2);
            if mods.contains(Modifiers::ALT) {
                out.push(0x1b);
            }
            out.extend_from_slice(&backspace(state));
            out
        }
        Key::Tab if mods.contains(Modifiers::SHIFT) => b"\x1b[Z".to_vec(),
        Key::Tab => vec![0x09],
        Key::BackTab => b"\x1b[Z".to_vec(),
        Key::F(n @ 1..=4) if mods.is_empty() => pf_key(n)?,
        Key::F(n @ 1..=4) => {
            let mod_value = xterm_modifier_value(mods);
            format!("\x1b[1;{mod_value}{}", (b'P' + (n - 1)) as char).into_bytes()
        }
        Key::F(n) => csi_tilde_with_mod(function_tilde_code(n)?, mods),
        Key::Keypad(k) => keypad(k, state, b'O'),
        _ => return None,
    })
}

fn encode_petscii(key: Key, mods: Modifiers) -> Option<Vec<u8>> {
    let byte = match key {
        Key::Up => 0x91,
        Key::Down => 0x11,
        Key::Left => 0x9d,
        Key::Right => 0x1d,
        Key::Home if mods.contains(Modifiers::SHIFT) => 0x93,
        Key::Home => 0x13,
        Key::Insert => 0x94,
        Key::Delete | Key::Backspace => 0x14,
        Key::Tab => 0x09,
        // F1/F3/F5/F7 unshifted, F2/F4/F6/F8 shifted.
        Key::F(n @ 1..=8) => {
            if n % 2 == 1 {
                0x85 + (n - 1) / 2
            } else {
                0x89 + (n / 2 - 1)
            }
        }
        Key::Keypad(KeypadKey::Enter) => 0x0d,
        Key::Keypad(k) => return Codepage::Petscii.encode(keypad_ascii(k) as char).map(|b| vec![b]),
        _ => return None,
    };
    Some(vec![byte])
}

fn encode_atascii(key: Key) -> Option<Vec<u8>> {
    Some(match key {
        Key::Up => vec![0x1b, 0x1c],
        Key::Down => vec![0x1b, 0x1d],
        Key::Left => vec![0x1b, 0x1e],
        Key::Right => vec![0x1b, 0x1f],
        Key::Backspace => vec![0x7e],
        Key::Delete => vec![0x1b, 0xfe],
        Key::Insert => vec![0x1b, 0xff],
        Key::Tab => vec![0x7f],
        Key::Home => vec![0x1b, 0x7d],
        Key::Keypad(KeypadKey::Enter) => vec![0x9b],
        Key::Keypad(k) => vec![keypad_ascii(k)],
        _ => return None,
    })
}

/// PC keyboard scan code for DOORWAY mode.
#[must_use]
pub fn doorway_scancode(key: Key, mods: Modifiers) -> Option<u8> {
    Some(match key {
        Key::F(n @ 1..=10) => 0x3a + n,
        Key::F(11) => 0x85,
        Key::F(12) => 0x86,
        Key::Home => 0x47,
        Key::Up => 0x48,
        Key::PageUp => 0x49,
        Key::Left => 0x4b,
        Key::Right => 0x4d,
        Key::End => 0x4f,
        Key::Down => 0x50,
        Key::PageDown => 0x51,
        Key::Insert => 0x52,
        Key::Delete => 0x53,
        Key::Char(ch) if mods.contains(Modifiers::ALT) => alt_letter_scancode(ch)?,
        _ => return None,
    })
}

fn alt_letter_scancode(ch: char) -> Option<u8> {
    const ROWS: [(&str, u8); 3] = [("qwertyuiop", 0x10), ("asdfghjkl", 0x1e), ("zxcvbnm", 0x2c)];
    let lower = ch.to_ascii_lowercase();
    ROWS.iter().find_map(|(letters, base)| {
        letters
            .find(lower)
            .and_then(|i| u8::try_from(i).ok())
            .map(|i| base + i)
    })
}
