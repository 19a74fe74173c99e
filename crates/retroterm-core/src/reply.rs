//! Answers to terminal identification and status requests.
//!
//! Byte-exact forms matter here: host software decides which terminal it is
//! talking to from these strings.
//!
//! - DSR status: `CSI 5 n` -> `CSI 0 n`
//! - DSR cursor position: `CSI 6 n` -> `CSI {row};{col} R` (1-indexed)
//! - DSR printer / UDK / keyboard: `CSI ? 15|25|26 n`
//! - DA1: `CSI c`, per emulation
//! - DA2: `CSI > c` -> `CSI > 1;10;0 c`
//! - DECREQTPARM: `CSI 0|1 x` -> `CSI {n+2};1;1;128;128;1;0 x`
//! - VT52 identify: `ESC Z` -> `ESC / Z`

use crate::emulation::Emulation;

/// A request the terminal must answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalQuery {
    DeviceStatus,
    /// Cursor position, 1-indexed and already adjusted for origin mode.
    CursorPosition { row: u16, col: u16 },
    PrinterStatus,
    UserKeysStatus,
    KeyboardStatus,
    PrimaryDeviceAttributes,
    SecondaryDeviceAttributes,
    TerminalParameters { request: u16 },
    Vt52Identify,
}

/// Reply encoder for one emulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyEngine {
    pub emulation: Emulation,
    /// S8C1T: replies start with the C1 CSI byte instead of `ESC [`.
    pub eight_bit: bool,
}

impl ReplyEngine {
    #[must_use]
    pub const fn new(emulation: Emulation, eight_bit: bool) -> Self {
        Self {
            emulation,
            eight_bit,
        }
    }

    fn csi(self) -> &'static str {
        if self.eight_bit { "\u{9b}" } else { "\x1b[" }
    }

    #[must_use]
    pub fn reply(self, query: TerminalQuery) -> Vec<u8> {
        let csi = self.csi();
        let text = match query {
            TerminalQuery::DeviceStatus => format!("{csi}0n"),
            TerminalQuery::CursorPosition { row, col } => format!("{csi}{row};{col}R"),
            TerminalQuery::PrinterStatus => format!("{csi}?13n"),
            TerminalQuery::UserKeysStatus => format!("{csi}?21n"),
            TerminalQuery::KeyboardStatus => format!("{csi}?27;1n"),
            TerminalQuery::PrimaryDeviceAttributes => {
                let attributes = match self.emulation {
                    Emulation::Vt100 => "?1;2",
                    Emulation::Vt220 | Emulation::Xterm | Emulation::XtermUtf8 => "?62;1;6",
                    _ => "?6",
                };
                format!("{csi}{attributes}c")
            }
            TerminalQuery::SecondaryDeviceAttributes => format!("{csi}>1;10;0c"),
            TerminalQuery::TerminalParameters { request } => {
                format!("{csi}{};1;1;128;128;1;0x", request + 2)
            }
            TerminalQuery::Vt52Identify => return b"\x1b/Z".to_vec(),
        };
        encode_c1(&text)
    }
}

// The C1 CSI is a single byte on the wire, not its UTF-8 encoding.
fn encode_c1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| u8::try_from(u32::from(ch)).unwrap_or(b'?'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(emulation: Emulation, query: TerminalQuery) -> Vec<u8> {
        ReplyEngine::new(emulation, false).reply(query)
    }

    #[test]
    fn primary_da_per_emulation() {
        let da = TerminalQuery::PrimaryDeviceAttributes;
        assert_eq!(reply(Emulation::Vt100, da), b"\x1b[?1;2c");
        assert_eq!(reply(Emulation::Vt102, da), b"\x1b[?6c");
        assert_eq!(reply(Emulation::Linux, da), b"\x1b[?6c");
        assert_eq!(reply(Emulation::Vt220, da), b"\x1b[?62;1;6c");
        assert_eq!(reply(Emulation::XtermUtf8, da), b"\x1b[?62;1;6c");
    }

    #[test]
    fn eight_bit_replies_use_single_csi_byte() {
        let engine = ReplyEngine::new(Emulation::Vt220, true);
        assert_eq!(
            engine.reply(TerminalQuery::PrimaryDeviceAttributes),
            b"\x9b?62;1;6c"
        );
        assert_eq!(engine.reply(TerminalQuery::Vt52Identify), b"\x1b/Z");
    }

    #[test]
    fn status_reports() {
        let e = Emulation::Vt220;
        assert_eq!(reply(e, TerminalQuery::DeviceStatus), b"\x1b[0n");
        assert_eq!(reply(e, TerminalQuery::CursorPosition { row: 4, col: 7 }), b"\x1b[4;7R");
        assert_eq!(reply(e, TerminalQuery::PrinterStatus), b"\x1b[?13n");
        assert_eq!(reply(e, TerminalQuery::UserKeysStatus), b"\x1b[?21n");
        assert_eq!(reply(e, TerminalQuery::KeyboardStatus), b"\x1b[?27;1n");
        assert_eq!(reply(e, TerminalQuery::SecondaryDeviceAttributes), b"\x1b[>1;10;0c");
    }

    #[test]
    fn decreqtparm() {
        let e = Emulation::Vt100;
        assert_eq!(
            reply(e, TerminalQuery::TerminalParameters { request: 0 }),
            b"\x1b[2;1;1;128;128;1;0x"
        );
        assert_eq!(
            reply(e, TerminalQuery::TerminalParameters { request: 1 }),
            b"\x1b[3;1;1;128;128;1;0x"
        );
    }
}
