//! XTerm mouse reporting.
//!
//! Which events are reported ([`MouseProtocol`]) and how they are written on
//! the wire ([`MouseEncoding`]) are set independently by DEC private modes;
//! [`encode_mouse_report`] is the one place that combines them.

use crate::keyboard::Modifiers;

/// Event filter selected by modes 9, 1000, 1002 and 1003.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MouseProtocol {
    #[default]
    Off,
    /// Presses only, no modifiers.
    X10,
    /// Presses, releases and wheel.
    Normal,
    /// Normal plus motion while a button is held.
    ButtonEvent,
    /// Normal plus all motion.
    AnyEvent,
}

/// Report format selected by modes 1005 and 1006.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MouseEncoding {
    /// `ESC [ M` followed by three bytes offset by 32.
    #[default]
    X10,
    /// As X10 but coordinates are UTF-8 encoded, reaching column 2015.
    Utf8,
    /// `ESC [ < b ; x ; y M|m`.
    Sgr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MouseMode {
    pub protocol: MouseProtocol,
    pub encoding: MouseEncoding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

impl MouseButton {
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Left => 0,
            Self::Middle => 1,
            Self::Right => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    Press,
    Release,
    /// Pointer moved; `button` is the button held, if any.
    Motion,
    WheelUp,
    WheelDown,
}

/// A mouse event in 0-indexed cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub button: Option<MouseButton>,
    pub x: u16,
    pub y: u16,
    pub mods: Modifiers,
}

impl MouseEvent {
    #[must_use]
    pub fn press(button: MouseButton, x: u16, y: u16) -> Self {
        Self {
            kind: MouseEventKind::Press,
            button: Some(button),
            x,
            y,
            mods: Modifiers::empty(),
        }
    }

    #[must_use]
    pub fn release(button: MouseButton, x: u16, y: u16) -> Self {
        Self {
            kind: MouseEventKind::Release,
            ..Self::press(button, x, y)
        }
    }
}

fn mouse_mod_bits(mods: Modifiers) -> u16 {
    let mut bits = 0;
    if mods.contains(Modifiers::SHIFT) {
        bits |= 4;
    }
    if mods.contains(Modifiers::ALT) {
        bits |= 8;
    }
    if mods.contains(Modifiers::CTRL) {
        bits |= 16;
    }
    bits
}

fn wanted(protocol: MouseProtocol, event: &MouseEvent) -> bool {
    match (protocol, event.kind) {
        (MouseProtocol::Off, _) => false,
        (MouseProtocol::X10, kind) => kind == MouseEventKind::Press,
        (_, MouseEventKind::Press | MouseEventKind::Release)
        | (_, MouseEventKind::WheelUp | MouseEventKind::WheelDown) => true,
        (MouseProtocol::ButtonEvent, MouseEventKind::Motion) => event.button.is_some(),
        (MouseProtocol::AnyEvent, MouseEventKind::Motion) => true,
        (MouseProtocol::Normal, MouseEventKind::Motion) => false,
    }
}

fn push_legacy_value(out: &mut Vec<u8>, value: u16, utf8: bool) -> Option<()> {
    let value = value.checked_add(32)?;
    if utf8 {
        let ch = char::from_u32(u32::from(value)).filter(|_| value <= 2047)?;
        let mut buf = [0u8; 4];
        out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
    } else {
        out.push(u8::try_from(value).ok()?);
    }
    Some(())
}

/// Build the report for `event`, or `None` when the protocol filters it out
/// or the position cannot be represented in the encoding.
#[must_use]
pub fn encode_mouse_report(mode: MouseMode, event: &MouseEvent) -> Option<Vec<u8>> {
    if !wanted(mode.protocol, event) {
        return None;
    }
    let mods = if mode.protocol == MouseProtocol::X10 {
        0
    } else {
        mouse_mod_bits(event.mods)
    };
    let button = event.button.map_or(3, MouseButton::code);
    let sgr = mode.encoding == MouseEncoding::Sgr;
    let code = match event.kind {
        MouseEventKind::Press => button,
        // Legacy encodings cannot say which button went up.
        MouseEventKind::Release if sgr => button,
        MouseEventKind::Release => 3,
        MouseEventKind::Motion => button + 32,
        MouseEventKind::WheelUp => 64,
        MouseEventKind::WheelDown => 65,
    } | mods;
    let x = event.x.saturating_add(1);
    let y = event.y.saturating_add(1);

    if sgr {
        let final_byte = if event.kind == MouseEventKind::Release {
            'm'
        } else {
            'M'
        };
        return Some(format!("\x1b[<{code};{x};{y}{final_byte}").into_bytes());
    }

    let utf8 = mode.encoding == MouseEncoding::Utf8;
    let mut out = b"\x1b[M".to_vec();
    push_legacy_value(&mut out, code, utf8)?;
    push_legacy_value(&mut out, x, utf8)?;
    push_legacy_value(&mut out, y, utf8)?;
    Some(out)
}
