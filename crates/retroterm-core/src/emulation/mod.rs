//! Per-emulation byte parsers.
//!
//! Every emulation family has its own state machine behind the
//! [`EmulationParser`] trait. The DEC parser serves VT52 through X_UTF8; the
//! ANSI parser doubles as the fallback sub-parser of AVATAR and PETSCII.
//! Parsers drive the display through [`Screen`] and report outbound bytes and
//! host notifications through [`HostQueue`].

mod ansi;
mod atascii;
mod avatar;
mod csi;
mod debug;
mod dec;
mod petscii;
mod tty;
mod utf8;

use std::fmt;

use crate::charset::Codepage;
use crate::config::TerminalConfig;
use crate::host::HostQueue;
use crate::screen::Screen;

pub use ansi::AnsiParser;
pub use atascii::AtasciiParser;
pub use avatar::AvatarParser;
pub use debug::DebugParser;
pub use dec::{DecParser, LinuxBeep, ScanState};
pub use petscii::PetsciiParser;
pub use tty::TtyParser;
pub use utf8::{Utf8Decoder, Utf8Step};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Emulation {
    Tty,
    Debug,
    #[default]
    Ansi,
    Avatar,
    Vt52,
    Vt100,
    Vt102,
    Vt220,
    Linux,
    /// LINUX with UTF-8 input.
    LinuxUtf8,
    Xterm,
    /// XTERM with UTF-8 input.
    XtermUtf8,
    Petscii,
    Atascii,
}

impl Emulation {
    pub const ALL: [Emulation; 14] = [
        Self::Tty,
        Self::Debug,
        Self::Ansi,
        Self::Avatar,
        Self::Vt52,
        Self::Vt100,
        Self::Vt102,
        Self::Vt220,
        Self::Linux,
        Self::LinuxUtf8,
        Self::Xterm,
        Self::XtermUtf8,
        Self::Petscii,
        Self::Atascii,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tty => "TTY",
            Self::Debug => "DEBUG",
            Self::Ansi => "ANSI",
            Self::Avatar => "AVATAR",
            Self::Vt52 => "VT52",
            Self::Vt100 => "VT100",
            Self::Vt102 => "VT102",
            Self::Vt220 => "VT220",
            Self::Linux => "LINUX",
            Self::LinuxUtf8 => "L_UTF8",
            Self::Xterm => "XTERM",
            Self::XtermUtf8 => "X_UTF8",
            Self::Petscii => "PETSCII",
            Self::Atascii => "ATASCII",
        }
    }

    /// Handled by the DEC parser.
    #[must_use]
    pub const fn is_dec_family(self) -> bool {
        matches!(
            self,
            Self::Vt52
                | Self::Vt100
                | Self::Vt102
                | Self::Vt220
                | Self::Linux
                | Self::LinuxUtf8
                | Self::Xterm
                | Self::XtermUtf8
        )
    }

    /// LINUX or XTERM, with or without UTF-8. These accept the Linux
    /// console extensions.
    #[must_use]
    pub const fn is_linux_family(self) -> bool {
        matches!(
            self,
            Self::Linux | Self::LinuxUtf8 | Self::Xterm | Self::XtermUtf8
        )
    }

    #[must_use]
    pub const fn is_xterm(self) -> bool {
        matches!(self, Self::Xterm | Self::XtermUtf8)
    }

    #[must_use]
    pub const fn is_utf8(self) -> bool {
        matches!(self, Self::LinuxUtf8 | Self::XtermUtf8)
    }

    /// VT220 and XTERM accept 8-bit C1 introducers and S8C1T.
    #[must_use]
    pub const fn has_eight_bit_controls(self) -> bool {
        matches!(self, Self::Vt220 | Self::Xterm | Self::XtermUtf8)
    }

    #[must_use]
    pub const fn default_codepage(self) -> Codepage {
        match self {
            Self::Tty | Self::Debug | Self::Ansi | Self::Avatar | Self::Linux => Codepage::Cp437,
            Self::Vt52 | Self::Vt100 | Self::Vt102 | Self::Vt220 => Codepage::DecMcs,
            Self::Xterm => Codepage::Iso8859_1,
            Self::LinuxUtf8 | Self::XtermUtf8 => Codepage::Utf8,
            Self::Petscii => Codepage::Petscii,
            Self::Atascii => Codepage::Atascii,
        }
    }

    /// CR and LF are turned into cursor moves before the parser sees them.
    #[must_use]
    pub const fn preprocesses_crlf(self) -> bool {
        matches!(self, Self::Tty | Self::Ansi | Self::Avatar | Self::Vt52)
    }
}

impl fmt::Display for Emulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a parser produced for one byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseResult {
    /// Consumed with no printable output (control, partial sequence).
    NoCharYet,
    /// One printable character.
    OneChar(char),
    /// An unrecognised sequence was buffered; it is drained with
    /// [`EmulationParser::next_buffered`] and printed verbatim.
    ManyChars,
    /// Feed these bytes back through the parser (AVATAR repeats).
    RepeatState(Vec<u8>),
}

/// Everything a parser may touch while handling a byte.
pub struct Context<'a> {
    pub screen: &'a mut Screen,
    pub host: &'a mut HostQueue,
    pub config: &'a TerminalConfig,
}

impl Context<'_> {
    #[must_use]
    pub fn emulation(&self) -> Emulation {
        self.screen.status().emulation
    }

    #[must_use]
    pub fn codepage(&self) -> Codepage {
        self.screen.status().codepage
    }
}

pub trait EmulationParser {
    fn parse(&mut self, byte: u8, ctx: &mut Context<'_>) -> ParseResult;

    /// Next character of a sequence buffered by [`ParseResult::ManyChars`].
    fn next_buffered(&mut self, _ctx: &mut Context<'_>) -> Option<char> {
        None
    }

    /// No sequence is in progress.
    fn in_ground(&self) -> bool {
        true
    }

    /// Return to power-on state for this emulation.
    fn reset(&mut self, ctx: &mut Context<'_>);
}

/// Buffer of unrecognised bytes being replayed to the display.
#[derive(Debug, Default, Clone)]
pub struct Replay {
    bytes: Vec<u8>,
    pos: usize,
}

impl Replay {
    pub fn load(&mut self, bytes: &[u8]) {
        self.bytes.clear();
        self.bytes.extend_from_slice(bytes);
        self.pos = 0;
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
        self.pos = 0;
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    pub fn next_byte(&mut self) -> Option<u8> {
        let byte = *self.bytes.get(self.pos)?;
        self.pos += 1;
        if self.pos >= self.bytes.len() {
            self.clear();
        }
        Some(byte)
    }
}

/// Minimal driver for unit tests: applies every [`ParseResult`] the way the
/// emulator does, without CR/LF preprocessing.
#[cfg(test)]
pub(crate) mod harness {
    use std::collections::VecDeque;

    use super::{Context, Emulation, EmulationParser, ParseResult};
    use crate::config::TerminalConfig;
    use crate::host::HostQueue;
    use crate::row::Row;
    use crate::screen::Screen;

    pub(crate) struct Harness<P> {
        pub parser: P,
        pub screen: Screen,
        pub host: HostQueue,
        pub config: TerminalConfig,
    }

    impl<P: EmulationParser> Harness<P> {
        pub fn new(parser: P, emulation: Emulation, width: u16, height: u16) -> Self {
            Self {
                parser,
                screen: Screen::new(width, height, 100, emulation),
                host: HostQueue::default(),
                config: TerminalConfig::for_emulation(emulation),
            }
        }

        pub fn feed(&mut self, bytes: &[u8]) {
            let mut pending: VecDeque<u8> = bytes.iter().copied().collect();
            while let Some(byte) = pending.pop_front() {
                let mut ctx = Context {
                    screen: &mut self.screen,
                    host: &mut self.host,
                    config: &self.config,
                };
                match self.parser.parse(byte, &mut ctx) {
                    ParseResult::NoCharYet => {}
                    ParseResult::OneChar(ch) => ctx.screen.print_character(ch),
                    ParseResult::ManyChars => {
                        while let Some(ch) = self.parser.next_buffered(&mut ctx) {
                            ctx.screen.print_character(ch);
                        }
                    }
                    ParseResult::RepeatState(repeat) => {
                        for byte in repeat.into_iter().rev() {
                            pending.push_front(byte);
                        }
                    }
                }
            }
        }

        pub fn reset(&mut self) {
            let mut ctx = Context {
                screen: &mut self.screen,
                host: &mut self.host,
                config: &self.config,
            };
            self.parser.reset(&mut ctx);
        }

        pub fn text(&self, row: u16) -> String {
            self.screen.grid().row(row).map(Row::text).unwrap_or_default()
        }

        /// `(row, col)`.
        pub fn cursor(&self) -> (u16, u16) {
            (self.screen.status().cursor_y, self.screen.status().cursor_x)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn families_partition_emulations() {
        for emulation in Emulation::ALL {
            if emulation.is_utf8() {
                assert!(emulation.is_linux_family());
                assert_eq!(emulation.default_codepage(), Codepage::Utf8);
            }
            if emulation.is_linux_family() {
                assert!(emulation.is_dec_family());
            }
        }
        assert!(!Emulation::Ansi.is_dec_family());
        assert!(Emulation::Vt52.preprocesses_crlf());
        assert!(!Emulation::Vt100.preprocesses_crlf());
    }

    #[test]
    fn names() {
        assert_eq!(Emulation::XtermUtf8.to_string(), "X_UTF8");
        assert_eq!(Emulation::LinuxUtf8.name(), "L_UTF8");
    }

    #[test]
    fn replay_drains_once() {
        let mut replay = Replay::default();
        replay.load(b"\x1b[");
        assert!(!replay.is_empty());
        assert_eq!(replay.next_byte(), Some(0x1b));
        assert_eq!(replay.next_byte(), Some(b'['));
        assert_eq!(replay.next_byte(), None);
        assert!(replay.is_empty());
    }
}
