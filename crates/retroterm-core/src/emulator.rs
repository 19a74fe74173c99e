//! The emulator: one screen, one outbound queue and a parser per emulation.
//!
//! Bytes from the host are pushed one at a time with [`Emulator::feed`]. The
//! dispatcher routes each byte to the parser of the selected emulation and
//! applies whatever it returns before handing the result back:
//!
//! - [`ParseResult::OneChar`] is printed.
//! - [`ParseResult::ManyChars`] is drained from the parser and printed.
//! - [`ParseResult::RepeatState`] is fed back through the parser. This runs
//!   as a loop over a work queue, so nested AVATAR repeats cannot grow the
//!   stack.
//!
//! TTY, ANSI, AVATAR and VT52 never see a bare CR or LF outside a sequence;
//! the dispatcher turns them into cursor moves first.
//!
//! Replies to the host (DA, DSR, ENQ) and notifications for the UI (bell,
//! music, title, palette, column changes) are queued and collected with
//! [`Emulator::drain_replies`] and [`Emulator::drain_events`].

use std::collections::VecDeque;
use std::io::Write;

use tracing::{debug, trace};

use crate::capture::{CaptureError, CaptureMode};
use crate::charset::{Charset, Codepage};
use crate::config::{ConfigError, TerminalConfig};
use crate::emulation::{
    AnsiParser, AtasciiParser, AvatarParser, Context, DebugParser, DecParser, Emulation,
    EmulationParser, LinuxBeep, ParseResult, PetsciiParser, TtyParser,
};
use crate::host::{HostEvent, HostQueue};
use crate::keyboard::{Key, KeyboardState, Modifiers, encode_key};
use crate::mouse::{MouseEvent, MouseMode, encode_mouse_report};
use crate::row::Row;
use crate::scrollback::Scrollback;
use crate::screen::Screen;
use crate::status::TerminalStatus;

/// Most bytes a single fed byte may expand to through repeats.
pub const MAX_REPEAT_BYTES: usize = 65_536;

const PASTE_START: &[u8] = b"\x1b[200~";
const PASTE_END: &[u8] = b"\x1b[201~";

/// One parser per emulation family, each keeping its own state.
#[derive(Debug, Clone)]
struct Parsers {
    tty: TtyParser,
    debug: DebugParser,
    ansi: AnsiParser,
    avatar: AvatarParser,
    dec: DecParser,
    petscii: PetsciiParser,
    atascii: AtasciiParser,
}

impl Parsers {
    fn new(emulation: Emulation) -> Self {
        Self {
            tty: TtyParser,
            debug: DebugParser::default(),
            ansi: AnsiParser::default(),
            avatar: AvatarParser::default(),
            dec: DecParser::new(emulation),
            petscii: PetsciiParser::default(),
            atascii: AtasciiParser::default(),
        }
    }

    fn get_mut(&mut self, emulation: Emulation) -> &mut dyn EmulationParser {
        match emulation {
            Emulation::Tty => &mut self.tty,
            Emulation::Debug => &mut self.debug,
            Emulation::Ansi => &mut self.ansi,
            Emulation::Avatar => &mut self.avatar,
            Emulation::Petscii => &mut self.petscii,
            Emulation::Atascii => &mut self.atascii,
            Emulation::Vt52
            | Emulation::Vt100
            | Emulation::Vt102
            | Emulation::Vt220
            | Emulation::Linux
            | Emulation::LinuxUtf8
            | Emulation::Xterm
            | Emulation::XtermUtf8 => &mut self.dec,
        }
    }
}

/// Run one byte through `parser`, with CR/LF handled up front where the
/// emulation asks for it.
fn step(parser: &mut dyn EmulationParser, ctx: &mut Context<'_>, byte: u8) -> ParseResult {
    let emulation = ctx.emulation();
    if emulation.preprocesses_crlf() && parser.in_ground() {
        match byte {
            b'\r' => {
                ctx.screen.cursor_carriage_return();
                return ParseResult::NoCharYet;
            }
            b'\n' => {
                let new_line_mode = ctx.screen.status().new_line_mode;
                ctx.screen.cursor_linefeed(new_line_mode);
                return ParseResult::NoCharYet;
            }
            _ => {}
        }
    }
    parser.parse(byte, ctx)
}

/// Carry out `result` and any repeats it triggers.
fn apply(parser: &mut dyn EmulationParser, ctx: &mut Context<'_>, result: ParseResult) {
    let mut pending: VecDeque<u8> = VecDeque::new();
    let mut budget = MAX_REPEAT_BYTES;
    let mut next = Some(result);
    while let Some(result) = next.take() {
        match result {
            ParseResult::NoCharYet => {}
            ParseResult::OneChar(ch) => ctx.screen.print_character(ch),
            ParseResult::ManyChars => {
                while let Some(ch) = parser.next_buffered(ctx) {
                    ctx.screen.print_character(ch);
                }
            }
            ParseResult::RepeatState(bytes) => {
                let take = bytes.len().min(budget);
                if take < bytes.len() {
                    trace!(requested = bytes.len(), kept = take, "repeat truncated");
                }
                budget -= take;
                for &byte in bytes[..take].iter().rev() {
                    pending.push_front(byte);
                }
            }
        }
        if let Some(byte) = pending.pop_front() {
            next = Some(step(parser, ctx, byte));
        }
    }
}

#[derive(Debug)]
pub struct Emulator {
    config: TerminalConfig,
    screen: Screen,
    host: HostQueue,
    parsers: Parsers,
    bytes_received: u64,
}

impl Default for Emulator {
    fn default() -> Self {
        Self::build(TerminalConfig::default())
    }
}

impl Emulator {
    /// Build an emulator from a validated configuration.
    pub fn new(config: TerminalConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let emulator = Self::build(config);
        debug!(
            emulation = %emulator.emulation(),
            width = emulator.config.width,
            height = emulator.config.height,
            "emulator created"
        );
        Ok(emulator)
    }

    fn build(config: TerminalConfig) -> Self {
        let emulation = config.emulation;
        let screen = Screen::new(
            config.width,
            config.visible_height(),
            config.scrollback_max,
            emulation,
        );
        let mut emulator = Self {
            config,
            screen,
            host: HostQueue::default(),
            parsers: Parsers::new(emulation),
            bytes_received: 0,
        };
        emulator.reset_emulation();
        emulator
    }

    // ── Inbound bytes ───────────────────────────────────────────────

    /// Push one byte from the host. The result has already been applied to
    /// the screen; it tells the caller what the byte produced.
    pub fn feed(&mut self, byte: u8) -> ParseResult {
        self.bytes_received = self.bytes_received.saturating_add(1);
        self.screen.capture.on_raw(byte);
        self.process(byte)
    }

    pub fn feed_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.feed(byte);
        }
    }

    fn process(&mut self, byte: u8) -> ParseResult {
        let emulation = self.emulation();
        let parser = self.parsers.get_mut(emulation);
        let mut ctx = Context {
            screen: &mut self.screen,
            host: &mut self.host,
            config: &self.config,
        };
        let result = step(parser, &mut ctx, byte);
        apply(parser, &mut ctx, result.clone());
        result
    }

    /// Bytes fed since construction.
    #[must_use]
    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    /// Show bytes the user typed. DEBUG dumps them in the local-echo color;
    /// other emulations display them as if the host had sent them.
    pub fn echo_local(&mut self, bytes: &[u8]) {
        if self.emulation() == Emulation::Debug {
            for &byte in bytes {
                self.parsers.debug.record(byte, true, &mut self.screen);
            }
            return;
        }
        for &byte in bytes {
            self.process(byte);
        }
    }

    // ── Host queue ──────────────────────────────────────────────────

    /// Bytes to send back to the host, in the order they were triggered.
    pub fn drain_replies(&mut self) -> Vec<Vec<u8>> {
        self.host.drain_replies()
    }

    pub fn drain_events(&mut self) -> Vec<HostEvent> {
        self.host.drain_events()
    }

    // ── Renderer view ───────────────────────────────────────────────

    pub fn visible_rows(&self) -> impl Iterator<Item = &Row> {
        self.screen.grid().rows()
    }

    /// `(row, col, visible)`.
    #[must_use]
    pub fn cursor(&self) -> (u16, u16, bool) {
        let status = self.screen.status();
        (status.cursor_y, status.cursor_x, status.visible_cursor)
    }

    #[must_use]
    pub fn scrollback(&self) -> &Scrollback {
        self.screen.scrollback()
    }

    #[must_use]
    pub fn status(&self) -> &TerminalStatus {
        self.screen.status()
    }

    #[must_use]
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    #[must_use]
    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    #[must_use]
    pub fn emulation(&self) -> Emulation {
        self.screen.status().emulation
    }

    // ── Control ─────────────────────────────────────────────────────

    /// Switch to `emulation` and reset it.
    pub fn set_emulation(&mut self, emulation: Emulation) {
        let previous = self.emulation();
        if previous == Emulation::Debug {
            self.parsers.debug.flush(&mut self.screen);
        }
        if previous == Emulation::Petscii
            && emulation != Emulation::Petscii
            && !self.config.petscii_wide_font
        {
            self.host.event(HostEvent::DoubleWidthFont(false));
        }
        if previous.is_dec_family() && !emulation.is_dec_family() {
            // Turns mouse reporting off if the host had enabled it.
            self.reset_parser(previous);
        }
        debug!(from = %previous, to = %emulation, "emulation switched");
        let status = self.screen.status_mut();
        status.emulation = emulation;
        status.codepage = emulation.default_codepage();
        self.reset_emulation();
    }

    fn reset_parser(&mut self, emulation: Emulation) {
        let parser = self.parsers.get_mut(emulation);
        let mut ctx = Context {
            screen: &mut self.screen,
            host: &mut self.host,
            config: &self.config,
        };
        parser.reset(&mut ctx);
    }

    /// Return the current emulation to its power-on state: parser, modes,
    /// colors, scroll region, tab stops and width. Screen contents and
    /// scrollback are kept.
    pub fn reset_emulation(&mut self) {
        let emulation = self.emulation();
        debug!(%emulation, "emulation reset");
        let width = self.config.width;
        if self.screen.width() != width {
            self.screen.set_columns(width);
            self.host.event(HostEvent::ColumnsChanged(width));
        }
        self.screen.reset_modes();
        self.screen.status_mut().hard_backspace = self.config.hard_backspace;
        self.reset_parser(emulation);
    }

    /// Reset every emulation's parser, then the current emulation.
    pub fn reset_all(&mut self) {
        let emulation = self.emulation();
        debug!(%emulation, "all emulations reset");
        // The DEC reset also drops any partial UTF-8 sequence.
        self.reset_parser(Emulation::Xterm);
        let dec = self.parsers.dec.clone();
        self.parsers = Parsers {
            dec,
            ..Parsers::new(emulation)
        };
        self.reset_emulation();
    }

    pub fn set_codepage(&mut self, codepage: Codepage) {
        debug!(?codepage, "codepage selected");
        self.screen.status_mut().codepage = codepage;
    }

    pub fn toggle_reverse_video(&mut self) {
        if self.screen.status().reverse_video {
            self.screen.deinvert_scrollback_colors();
        } else {
            self.screen.invert_scrollback_colors();
        }
    }

    pub fn toggle_visible_cursor(&mut self) {
        let status = self.screen.status_mut();
        status.visible_cursor = !status.visible_cursor;
    }

    /// Copy output into `sink`. Enabling again replaces the previous sink;
    /// its close error, if any, is returned.
    pub fn enable_capture(
        &mut self,
        sink: Box<dyn Write + Send>,
        mode: CaptureMode,
    ) -> Result<(), CaptureError> {
        self.screen.capture.enable(sink, mode)
    }

    /// Stop capturing and flush the sink. A no-op when capture is off.
    pub fn disable_capture(&mut self) -> Result<(), CaptureError> {
        self.screen.capture.finish()
    }

    #[must_use]
    pub fn capture_enabled(&self) -> bool {
        self.screen.capture.is_enabled()
    }

    // ── Input encoding ──────────────────────────────────────────────

    fn keyboard_state(&self) -> KeyboardState {
        let status = self.screen.status();
        let dec = self.emulation().is_dec_family().then_some(&self.parsers.dec);
        KeyboardState {
            emulation: status.emulation,
            application_cursor: dec.is_some_and(DecParser::application_cursor),
            application_keypad: dec.is_some_and(DecParser::application_keypad),
            vt52: dec.is_some_and(DecParser::vt52),
            hard_backspace: status.hard_backspace,
            crlf_on_enter: self.config.crlf_on_enter || status.new_line_mode,
            codepage: status.codepage,
        }
    }

    /// Bytes to send for a keystroke, or `None` when the key has no
    /// meaning in the current emulation.
    #[must_use]
    pub fn encode_key(&self, key: Key, mods: Modifiers) -> Option<Vec<u8>> {
        encode_key(key, mods, &self.keyboard_state(), &self.config.doorway_keys)
    }

    /// Mouse reporting the host asked for; off outside the DEC family.
    #[must_use]
    pub fn mouse_mode(&self) -> MouseMode {
        if self.emulation().is_dec_family() {
            self.parsers.dec.mouse_mode()
        } else {
            MouseMode::default()
        }
    }

    #[must_use]
    pub fn encode_mouse(&self, event: &MouseEvent) -> Option<Vec<u8>> {
        encode_mouse_report(self.mouse_mode(), event)
    }

    #[must_use]
    pub fn bracketed_paste(&self) -> bool {
        self.emulation().is_dec_family() && self.parsers.dec.bracketed_paste()
    }

    /// Frame pasted text for the host when bracketed paste is on.
    #[must_use]
    pub fn wrap_paste(&self, text: &[u8]) -> Vec<u8> {
        if !self.bracketed_paste() {
            return text.to_vec();
        }
        let mut out = Vec::with_capacity(text.len() + PASTE_START.len() + PASTE_END.len());
        out.extend_from_slice(PASTE_START);
        out.extend_from_slice(text);
        out.extend_from_slice(PASTE_END);
        out
    }

    #[must_use]
    pub fn linux_beep(&self) -> LinuxBeep {
        self.parsers.dec.linux_beep()
    }

    /// G0..G3 of the DEC parser and the slots invoked into GL and GR.
    #[must_use]
    pub fn dec_charsets(&self) -> ([Charset; 4], (usize, usize)) {
        (self.parsers.dec.charsets(), self.parsers.dec.shifts())
    }

    /// Bytes recorded in the unfinished DEBUG row.
    #[must_use]
    pub fn debug_pending(&self) -> usize {
        self.parsers.debug.pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::AttrFlags;
    use crate::mouse::{MouseButton, MouseEncoding, MouseProtocol};

    fn emulator(emulation: Emulation) -> Emulator {
        Emulator::new(TerminalConfig::for_emulation(emulation)).unwrap_or_default()
    }

    fn text(emu: &Emulator, row: u16) -> String {
        emu.screen().grid().row(row).map(Row::text).unwrap_or_default()
    }

    #[test]
    fn rejects_bad_config() {
        let config = TerminalConfig {
            width: 0,
            ..TerminalConfig::default()
        };
        assert_eq!(Emulator::new(config).err(), Some(ConfigError::ZeroWidth));
    }

    #[test]
    fn feed_counts_and_prints() {
        let mut emu = emulator(Emulation::Ansi);
        assert_eq!(emu.feed(b'A'), ParseResult::OneChar('A'));
        emu.feed_bytes(b"\r\nB");
        assert_eq!(emu.bytes_received(), 4);
        assert_eq!(text(&emu, 0), "A");
        assert_eq!(text(&emu, 1), "B");
        assert_eq!(emu.cursor(), (1, 1, true));
    }

    #[test]
    fn crlf_preprocessing_skips_open_sequences() {
        let mut emu = emulator(Emulation::Vt52);
        emu.feed_bytes(b"ab\r\n");
        assert_eq!(emu.cursor(), (1, 0, true));
        // Inside ESC Y the parser executes LF itself.
        emu.feed_bytes(b"\x1bY\n");
        assert_eq!(emu.cursor(), (2, 0, true));
        emu.feed_bytes(b"$%");
        assert_eq!(emu.cursor(), (4, 5, true));
    }

    #[test]
    fn avatar_repeat_is_bounded() {
        let mut emu = emulator(Emulation::Avatar);
        // A pattern repeat whose copies are themselves 255-byte RLE runs.
        let mut pattern = Vec::new();
        for _ in 0..85 {
            pattern.extend_from_slice(&[0x19, 0xff, b'x']);
        }
        let mut bytes = vec![0x16, 0x19, 255];
        bytes.extend_from_slice(&pattern);
        bytes.push(255);
        emu.feed_bytes(&bytes);
        emu.feed(b'!');
        assert!(emu.status().cursor_y < emu.screen().height());
    }

    #[test]
    fn unknown_ansi_sequence_is_printed() {
        let mut emu = emulator(Emulation::Ansi);
        emu.feed_bytes(b"\x1b[5y");
        assert_eq!(text(&emu, 0), "←[5y");
    }

    #[test]
    fn replies_keep_input_order() {
        let mut emu = emulator(Emulation::Vt100);
        emu.feed_bytes(b"\x1b[5n\x1b[c\x1b[2;3H\x1b[6n");
        assert_eq!(
            emu.drain_replies(),
            vec![b"\x1b[0n".to_vec(), b"\x1b[?1;2c".to_vec(), b"\x1b[2;3R".to_vec()]
        );
        assert!(emu.drain_replies().is_empty());
    }

    #[test]
    fn switching_from_debug_flushes_row() {
        let mut emu = emulator(Emulation::Debug);
        emu.feed_bytes(b"hi");
        assert_eq!(emu.debug_pending(), 2);
        emu.set_emulation(Emulation::Ansi);
        assert_eq!(emu.debug_pending(), 0);
        assert!(text(&emu, 0).ends_with("| hi"));
        assert_eq!(emu.status().codepage, Codepage::Cp437);
    }

    #[test]
    fn debug_local_echo_is_colored() {
        let mut emu = emulator(Emulation::Debug);
        emu.echo_local(b"k");
        assert_eq!(emu.bytes_received(), 0);
        let cell = emu.screen().grid().cell(0, 12).copied().unwrap_or_default();
        assert_eq!(cell.ch, '6');
        assert!(cell.attrs.flags.contains(AttrFlags::BOLD));
    }

    #[test]
    fn petscii_font_requests() {
        let mut emu = emulator(Emulation::Ansi);
        emu.set_emulation(Emulation::Petscii);
        assert_eq!(emu.drain_events(), vec![HostEvent::DoubleWidthFont(true)]);
        emu.set_emulation(Emulation::Ansi);
        assert_eq!(emu.drain_events(), vec![HostEvent::DoubleWidthFont(false)]);
    }

    #[test]
    fn reset_restores_width_and_modes() {
        let mut emu = emulator(Emulation::Vt220);
        emu.feed_bytes(b"\x1b[?3h\x1b[4h\x1b[3;10r\x1b[?25l");
        emu.drain_events();
        emu.reset_emulation();
        assert_eq!(emu.screen().width(), 80);
        assert_eq!(emu.drain_events(), vec![HostEvent::ColumnsChanged(80)]);
        let status = emu.status();
        assert!(!status.insert_mode);
        assert!(status.visible_cursor);
        assert_eq!((status.scroll_region_top, status.scroll_region_bottom), (0, 23));
    }

    #[test]
    fn leaving_xterm_turns_mouse_off() {
        let mut emu = emulator(Emulation::Xterm);
        emu.feed_bytes(b"\x1b[?1000h\x1b[?1006h");
        assert_eq!(emu.mouse_mode().encoding, MouseEncoding::Sgr);
        let report = emu.encode_mouse(&MouseEvent::press(MouseButton::Left, 4, 2));
        assert_eq!(report, Some(b"\x1b[<0;5;3M".to_vec()));
        emu.drain_events();
        emu.set_emulation(Emulation::Ansi);
        assert_eq!(emu.mouse_mode().protocol, MouseProtocol::Off);
        assert_eq!(
            emu.drain_events(),
            vec![HostEvent::MouseReportingChanged {
                protocol: MouseProtocol::Off,
                encoding: MouseEncoding::X10
            }]
        );
    }

    #[test]
    fn keys_follow_cursor_mode() {
        let mut emu = emulator(Emulation::Vt100);
        assert_eq!(emu.encode_key(Key::Up, Modifiers::empty()), Some(b"\x1b[A".to_vec()));
        emu.feed_bytes(b"\x1b[?1h");
        assert_eq!(emu.encode_key(Key::Up, Modifiers::empty()), Some(b"\x1bOA".to_vec()));
        emu.feed_bytes(b"\x1b[?2l");
        assert_eq!(emu.encode_key(Key::Up, Modifiers::empty()), Some(b"\x1bA".to_vec()));
    }

    #[test]
    fn enter_honors_newline_mode() {
        let mut emu = emulator(Emulation::Vt100);
        assert_eq!(emu.encode_key(Key::Enter, Modifiers::empty()), Some(b"\r".to_vec()));
        emu.feed_bytes(b"\x1b[20h");
        assert_eq!(emu.encode_key(Key::Enter, Modifiers::empty()), Some(b"\r\n".to_vec()));
    }

    #[test]
    fn bracketed_paste_frames_text() {
        let mut emu = emulator(Emulation::XtermUtf8);
        assert_eq!(emu.wrap_paste(b"ls"), b"ls".to_vec());
        emu.feed_bytes(b"\x1b[?2004h");
        assert_eq!(emu.wrap_paste(b"ls"), b"\x1b[200~ls\x1b[201~".to_vec());
    }

    #[test]
    fn toggles() {
        let mut emu = emulator(Emulation::Ansi);
        emu.toggle_visible_cursor();
        assert!(!emu.cursor().2);
        emu.toggle_reverse_video();
        assert!(emu.status().reverse_video);
        emu.toggle_reverse_video();
        assert!(!emu.status().reverse_video);
        emu.set_codepage(Codepage::Cp1252);
        emu.feed(0x80);
        assert_eq!(text(&emu, 0), "€");
    }

    #[test]
    fn reset_all_clears_parser_state() {
        let mut emu = emulator(Emulation::XtermUtf8);
        emu.feed_bytes(&[0xe2, 0x94]);
        emu.reset_all();
        emu.feed(0x80);
        assert_eq!(text(&emu, 0), "");
        emu.feed_bytes("─".as_bytes());
        assert_eq!(text(&emu, 0), "─");
    }
}
