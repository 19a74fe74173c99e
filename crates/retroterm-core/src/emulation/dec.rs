//! DEC-family parser: VT52, VT100, VT102, VT220, LINUX and XTERM.
//!
//! The scanner is Paul Williams' DEC ANSI state machine. For each byte the
//! "anywhere" transitions run first (CAN/SUB, ESC, DEL and, where the
//! emulation has them, 8-bit C1 introducers), then the transition for the
//! current [`ScanState`]. C0 controls execute in every non-string state
//! without leaving it.
//!
//! The UTF-8 variants run each byte ≥ 0x80 through [`Utf8Decoder`] first and
//! hand complete scalars to the print path; decoded U+0080..U+009F act as C1
//! controls. ASCII bytes skip the decoder so controls and sequences behave
//! the same with and without UTF-8.
//!
//! VT52 is a submode: it is entered with `CSI ? 2 l` (or by selecting the
//! VT52 emulation) and changes what the ESCAPE state dispatches.
//!
//! An ESC, CSI or VT52 sequence whose final byte is not recognised comes back
//! as [`ParseResult::ManyChars`]: its raw bytes are drained through
//! [`EmulationParser::next_buffered`] and printed. Malformed parameter
//! strings (`CSI IGNORE`) and unknown modes of a known final are dropped.

use tracing::trace;

use crate::cell::{AttrFlags, CellAttrs};
use crate::charset::{Charset, Codepage};
use crate::host::HostEvent;
use crate::mouse::{MouseEncoding, MouseMode, MouseProtocol};
use crate::reply::{ReplyEngine, TerminalQuery};
use crate::row::DoubleHeight;
use crate::screen::Screen;

use super::csi::{Params, apply_sgr};
use super::utf8::{Utf8Decoder, Utf8Step};
use super::{Context, Emulation, EmulationParser, ParseResult, Replay};

/// Intermediate bytes kept per sequence.
const MAX_COLLECT: usize = 32;

/// Raw bytes kept per sequence for replay.
const MAX_SEQUENCE_LEN: usize = 64;

/// Longest OSC string kept; the rest is dropped.
const MAX_OSC_LEN: usize = 1024;

/// Width selected by `CSI ? 3 h`.
pub const WIDE_COLUMNS: u16 = 132;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScanState {
    #[default]
    Ground,
    Escape,
    EscapeIntermediate,
    CsiEntry,
    CsiParam,
    CsiIntermediate,
    CsiIgnore,
    DcsEntry,
    DcsParam,
    DcsIntermediate,
    DcsPassthrough,
    DcsIgnore,
    SosPmApcString,
    OscString,
    /// VT52 `ESC Y`: waiting for the row and column bytes.
    Vt52DirectCursor,
}

impl ScanState {
    /// States that swallow everything up to a string terminator.
    const fn is_dcs_family(self) -> bool {
        matches!(
            self,
            Self::DcsEntry
                | Self::DcsParam
                | Self::DcsIntermediate
                | Self::DcsPassthrough
                | Self::DcsIgnore
                | Self::SosPmApcString
        )
    }

    /// ESC and CSI states whose bytes are kept for replay.
    const fn is_sequence(self) -> bool {
        matches!(
            self,
            Self::Escape
                | Self::EscapeIntermediate
                | Self::CsiEntry
                | Self::CsiParam
                | Self::CsiIntermediate
                | Self::CsiIgnore
        )
    }
}

/// Linux console bell parameters (`CSI 10;n ]`, `CSI 11;n ]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinuxBeep {
    /// Hz.
    pub frequency: u16,
    /// Milliseconds.
    pub duration: u16,
}

impl Default for LinuxBeep {
    fn default() -> Self {
        Self {
            frequency: 750,
            duration: 125,
        }
    }
}

const DEFAULT_CHARSETS: [Charset; 4] = [
    Charset::Us,
    Charset::Drawing,
    Charset::DecSupplemental,
    Charset::DecSupplemental,
];

/// State bundled by DECSC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SavedCursor {
    row: u16,
    col: u16,
    attrs: CellAttrs,
    origin_mode: bool,
    line_wrap: bool,
    charsets: [Charset; 4],
    gl: usize,
    gr: usize,
}

impl Default for SavedCursor {
    fn default() -> Self {
        Self {
            row: 0,
            col: 0,
            attrs: CellAttrs::default(),
            origin_mode: false,
            line_wrap: true,
            charsets: DEFAULT_CHARSETS,
            gl: 0,
            gr: 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DecParser {
    state: ScanState,
    params: Params,
    /// Private marker (`<`, `=`, `>` or `?`) at the start of the parameters.
    private: Option<u8>,
    collect: Vec<u8>,
    /// Raw bytes of the ESC/CSI sequence in progress, C1 CSI spelled `ESC [`.
    sequence: Vec<u8>,
    replay: Replay,
    charsets: [Charset; 4],
    gl: usize,
    gr: usize,
    single_shift: Option<usize>,
    vt52: bool,
    vt52_row: Option<u8>,
    /// S8C1T: replies use 8-bit C1 introducers.
    s8c1t: bool,
    saved: SavedCursor,
    /// `CSI s` / `CSI u` position.
    ansi_saved: (u16, u16),
    linux_beep: LinuxBeep,
    utf8: Utf8Decoder,
    last_char: Option<char>,
    application_cursor: bool,
    application_keypad: bool,
    mouse: MouseMode,
    bracketed_paste: bool,
    osc: Vec<u8>,
    /// ESC seen inside a DCS-family string.
    string_escape: bool,
}

impl Default for DecParser {
    fn default() -> Self {
        Self {
            state: ScanState::Ground,
            params: Params::default(),
            private: None,
            collect: Vec::new(),
            sequence: Vec::new(),
            replay: Replay::default(),
            charsets: DEFAULT_CHARSETS,
            gl: 0,
            gr: 2,
            single_shift: None,
            vt52: false,
            vt52_row: None,
            s8c1t: false,
            saved: SavedCursor::default(),
            ansi_saved: (0, 0),
            linux_beep: LinuxBeep::default(),
            utf8: Utf8Decoder::default(),
            last_char: None,
            application_cursor: false,
            application_keypad: false,
            mouse: MouseMode::default(),
            bracketed_paste: false,
            osc: Vec::new(),
            string_escape: false,
        }
    }
}

impl DecParser {
    /// A parser in power-on state for `emulation`.
    #[must_use]
    pub fn new(emulation: Emulation) -> Self {
        Self {
            vt52: emulation == Emulation::Vt52,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn state(&self) -> ScanState {
        self.state
    }

    #[must_use]
    pub fn mouse_mode(&self) -> MouseMode {
        self.mouse
    }

    #[must_use]
    pub fn linux_beep(&self) -> LinuxBeep {
        self.linux_beep
    }

    #[must_use]
    pub fn bracketed_paste(&self) -> bool {
        self.bracketed_paste
    }

    #[must_use]
    pub fn application_cursor(&self) -> bool {
        self.application_cursor
    }

    #[must_use]
    pub fn application_keypad(&self) -> bool {
        self.application_keypad
    }

    /// In the VT52 submode.
    #[must_use]
    pub fn vt52(&self) -> bool {
        self.vt52
    }

    /// G0..G3.
    #[must_use]
    pub fn charsets(&self) -> [Charset; 4] {
        self.charsets
    }

    /// Slots invoked into GL and GR.
    #[must_use]
    pub fn shifts(&self) -> (usize, usize) {
        (self.gl, self.gr)
    }

    fn engine(&self, emulation: Emulation) -> ReplyEngine {
        ReplyEngine::new(emulation, self.s8c1t)
    }

    fn clear_sequence(&mut self) {
        self.params.clear();
        self.private = None;
        self.collect.clear();
    }

    fn enter(&mut self, state: ScanState) {
        self.state = state;
        match state {
            ScanState::Escape => {
                self.clear_sequence();
                self.sequence.clear();
            }
            ScanState::CsiEntry | ScanState::DcsEntry => self.clear_sequence(),
            ScanState::OscString => self.osc.clear(),
            _ => {}
        }
        self.string_escape = false;
    }

    fn to_ground(&mut self) {
        self.state = ScanState::Ground;
        self.string_escape = false;
    }

    fn collect_byte(&mut self, byte: u8) {
        if self.collect.len() < MAX_COLLECT {
            self.collect.push(byte);
        }
    }

    fn record(&mut self, byte: u8) {
        if self.sequence.len() < MAX_SEQUENCE_LEN {
            self.sequence.push(byte);
        }
    }

    /// Hand the sequence in progress back for printing.
    fn unknown(&mut self) -> ParseResult {
        trace!(sequence = ?self.sequence, "unknown sequence replayed");
        self.replay.load(&self.sequence);
        self.sequence.clear();
        ParseResult::ManyChars
    }

    // ── Scanner ─────────────────────────────────────────────────────

    fn scan(&mut self, byte: u8, ctx: &mut Context<'_>) -> ParseResult {
        let emulation = ctx.emulation();
        match byte {
            0x18 | 0x1a => {
                self.cancel();
                if emulation.is_linux_family() {
                    return ParseResult::OneChar(if byte == 0x18 { '↑' } else { '↓' });
                }
                return ParseResult::NoCharYet;
            }
            0x1b if self.state.is_dcs_family() => {
                self.string_escape = true;
                return ParseResult::NoCharYet;
            }
            0x1b => {
                if self.state == ScanState::OscString {
                    self.osc_dispatch(ctx);
                }
                self.enter(ScanState::Escape);
                self.record(0x1b);
                return ParseResult::NoCharYet;
            }
            0x7f => return ParseResult::NoCharYet,
            0x80..=0x9f if !emulation.is_linux_family() || emulation.is_xterm() => {
                return self.c1(byte, ctx);
            }
            0x80..=0xff if self.state == ScanState::Ground => return self.print_high(byte, ctx),
            _ => {}
        }

        if self.state.is_dcs_family() {
            if !std::mem::take(&mut self.string_escape) {
                self.dcs_byte(byte);
                return ParseResult::NoCharYet;
            }
            // ESC inside the string: ST ends it, anything else starts a new
            // escape sequence.
            if byte == b'\\' {
                self.to_ground();
                return ParseResult::NoCharYet;
            }
            self.enter(ScanState::Escape);
            self.record(0x1b);
        }
        if self.state == ScanState::OscString {
            return self.osc_byte(byte, ctx);
        }
        if byte < 0x20 {
            self.execute(byte, ctx);
            return ParseResult::NoCharYet;
        }
        // Outside GROUND the high half reads as its GL equivalent.
        let byte = byte & 0x7f;
        if self.state.is_sequence() {
            self.record(byte);
        }
        match self.state {
            ScanState::Ground => self.print_low(byte),
            ScanState::Escape => self.escape_byte(byte, ctx),
            ScanState::EscapeIntermediate => {
                match byte {
                    0x20..=0x2f => self.collect_byte(byte),
                    _ => {
                        self.to_ground();
                        return self.esc_dispatch(byte, ctx);
                    }
                }
                ParseResult::NoCharYet
            }
            ScanState::CsiEntry | ScanState::CsiParam => {
                match byte {
                    b'0'..=b'9' => {
                        self.params.push_digit(byte);
                        self.state = ScanState::CsiParam;
                    }
                    b';' => {
                        self.params.separator();
                        self.state = ScanState::CsiParam;
                    }
                    0x3c..=0x3f if self.state == ScanState::CsiEntry => {
                        self.private = Some(byte);
                        self.state = ScanState::CsiParam;
                    }
                    0x3a..=0x3f => self.state = ScanState::CsiIgnore,
                    0x20..=0x2f => {
                        self.collect_byte(byte);
                        self.state = ScanState::CsiIntermediate;
                    }
                    _ => {
                        self.to_ground();
                        return self.csi_dispatch(byte, ctx);
                    }
                }
                ParseResult::NoCharYet
            }
            ScanState::CsiIntermediate => {
                match byte {
                    0x20..=0x2f => self.collect_byte(byte),
                    0x30..=0x3f => self.state = ScanState::CsiIgnore,
                    _ => {
                        self.to_ground();
                        return self.csi_dispatch(byte, ctx);
                    }
                }
                ParseResult::NoCharYet
            }
            ScanState::CsiIgnore => {
                if byte >= 0x40 {
                    trace!(final_byte = byte, "malformed control sequence ignored");
                    self.to_ground();
                }
                ParseResult::NoCharYet
            }
            ScanState::Vt52DirectCursor => {
                match self.vt52_row.take() {
                    None => self.vt52_row = Some(byte),
                    Some(row) => {
                        let row = u16::from(row.saturating_sub(0x20));
                        let col = u16::from(byte.saturating_sub(0x20));
                        ctx.screen.cursor_position(row, col);
                        self.to_ground();
                    }
                }
                ParseResult::NoCharYet
            }
            ScanState::OscString
            | ScanState::DcsEntry
            | ScanState::DcsParam
            | ScanState::DcsIntermediate
            | ScanState::DcsPassthrough
            | ScanState::DcsIgnore
            | ScanState::SosPmApcString => ParseResult::NoCharYet,
        }
    }

    /// A decoded scalar from the UTF-8 variants.
    fn scan_char(&mut self, ch: char, ctx: &mut Context<'_>) -> ParseResult {
        let code = u32::from(ch);
        if (0x80..=0x9f).contains(&code) {
            return self.c1(code as u8, ctx);
        }
        if self.state != ScanState::Ground {
            trace!(?ch, state = ?self.state, "non-ASCII character inside a sequence dropped");
            return ParseResult::NoCharYet;
        }
        self.single_shift = None;
        self.last_char = Some(ch);
        ParseResult::OneChar(ch)
    }

    fn parse_utf8(&mut self, byte: u8, ctx: &mut Context<'_>) -> ParseResult {
        if byte < 0x80 {
            if !self.utf8.is_idle() {
                trace!(byte, "UTF-8 sequence interrupted");
                self.utf8.reset();
            }
            return self.scan(byte, ctx);
        }
        if self.state == ScanState::OscString {
            // Titles keep their UTF-8 bytes.
            self.osc_push(byte);
            return ParseResult::NoCharYet;
        }
        match self.utf8.push(byte) {
            Utf8Step::Pending => ParseResult::NoCharYet,
            Utf8Step::Invalid => {
                trace!(byte, "invalid UTF-8 byte discarded");
                ParseResult::NoCharYet
            }
            Utf8Step::Char(ch) => self.scan_char(ch, ctx),
        }
    }

    fn cancel(&mut self) {
        self.clear_sequence();
        self.sequence.clear();
        self.osc.clear();
        self.vt52_row = None;
        self.to_ground();
    }

    // ── Print path ──────────────────────────────────────────────────

    fn print_low(&mut self, byte: u8) -> ParseResult {
        let slot = self.single_shift.take().unwrap_or(self.gl);
        let mut ch = self.charsets[slot].map(byte);
        if ch == '\0' {
            ch = byte as char;
        }
        self.last_char = Some(ch);
        ParseResult::OneChar(ch)
    }

    fn print_high(&mut self, byte: u8, ctx: &Context<'_>) -> ParseResult {
        let emulation = ctx.emulation();
        let ch = if emulation.is_linux_family() {
            self.single_shift = None;
            ctx.codepage().decode(byte)
        } else {
            let slot = self.single_shift.take().unwrap_or(self.gr);
            match self.charsets[slot].map(byte) {
                '\0' => ctx.codepage().decode(byte),
                ch => ch,
            }
        };
        self.last_char = Some(ch);
        ParseResult::OneChar(ch)
    }

    // ── Controls ────────────────────────────────────────────────────

    fn execute(&mut self, byte: u8, ctx: &mut Context<'_>) {
        let screen = &mut *ctx.screen;
        match byte {
            0x05 => ctx.host.reply(ctx.config.answerback.as_bytes()),
            0x07 => ctx.host.event(HostEvent::Bell),
            0x08 => screen.cursor_left(1, false),
            0x09 => {
                let stop = screen.next_tab_stop();
                screen.cursor_column(stop);
            }
            0x0a..=0x0c => {
                let new_line_mode = screen.status().new_line_mode;
                screen.cursor_linefeed(new_line_mode);
            }
            0x0d => screen.cursor_carriage_return(),
            0x0e => self.gl = 1,
            0x0f => self.gl = 0,
            _ => {}
        }
    }

    /// An 8-bit C1 control, raw or decoded from UTF-8.
    fn c1(&mut self, code: u8, ctx: &mut Context<'_>) -> ParseResult {
        let eight_bit = ctx.emulation().has_eight_bit_controls();
        match code {
            0x90 if eight_bit => self.enter(ScanState::DcsEntry),
            0x98 | 0x9e | 0x9f if eight_bit => self.enter(ScanState::SosPmApcString),
            0x9b if eight_bit => {
                self.enter(ScanState::CsiEntry);
                self.sequence.clear();
                self.sequence.extend_from_slice(b"\x1b[");
            }
            0x9d if eight_bit => self.enter(ScanState::OscString),
            0x9c if eight_bit => {
                if self.state == ScanState::OscString {
                    self.osc_dispatch(ctx);
                }
                self.to_ground();
            }
            _ => {
                self.cancel();
                let screen = &mut *ctx.screen;
                match code {
                    0x84 => screen.cursor_linefeed(false),
                    0x85 => {
                        screen.cursor_carriage_return();
                        screen.cursor_linefeed(false);
                    }
                    0x88 => screen.set_tab_stop(),
                    0x8d => screen.cursor_reverse_linefeed(),
                    0x8e => self.single_shift = Some(2),
                    0x8f => self.single_shift = Some(3),
                    _ => trace!(code, "C1 control ignored"),
                }
            }
        }
        ParseResult::NoCharYet
    }

    // ── ESC ─────────────────────────────────────────────────────────

    fn escape_byte(&mut self, byte: u8, ctx: &mut Context<'_>) -> ParseResult {
        if self.vt52 {
            self.to_ground();
            return self.vt52_dispatch(byte, ctx);
        }
        match byte {
            0x20..=0x2f => {
                self.collect_byte(byte);
                self.state = ScanState::EscapeIntermediate;
            }
            b'[' => self.enter(ScanState::CsiEntry),
            b']' => self.enter(ScanState::OscString),
            b'P' => self.enter(ScanState::DcsEntry),
            b'X' | b'^' | b'_' => self.enter(ScanState::SosPmApcString),
            _ => {
                self.to_ground();
                return self.esc_dispatch(byte, ctx);
            }
        }
        ParseResult::NoCharYet
    }

    fn esc_dispatch(&mut self, final_byte: u8, ctx: &mut Context<'_>) -> ParseResult {
        let emulation = ctx.emulation();
        if let Some(&first) = self.collect.first() {
            return self.esc_intermediate(first, final_byte, ctx);
        }
        let screen = &mut *ctx.screen;
        match final_byte {
            b'7' => self.save_cursor(screen),
            b'8' => self.restore_cursor(screen),
            b'D' => screen.cursor_linefeed(false),
            b'E' => {
                screen.cursor_carriage_return();
                screen.cursor_linefeed(false);
            }
            b'H' => screen.set_tab_stop(),
            b'M' => screen.cursor_reverse_linefeed(),
            b'N' => self.single_shift = Some(2),
            b'O' => self.single_shift = Some(3),
            b'Z' => {
                let reply = self.engine(emulation).reply(TerminalQuery::PrimaryDeviceAttributes);
                ctx.host.reply(reply);
            }
            b'c' => self.full_reset(ctx),
            b'=' => self.application_keypad = true,
            b'>' => self.application_keypad = false,
            b'n' => self.gl = 2,
            b'o' => self.gl = 3,
            b'~' => self.gr = 1,
            b'}' => self.gr = 2,
            b'|' => self.gr = 3,
            b'\\' | b'<' => {}
            _ => return self.unknown(),
        }
        ParseResult::NoCharYet
    }

    fn esc_intermediate(
        &mut self,
        intermediate: u8,
        final_byte: u8,
        ctx: &mut Context<'_>,
    ) -> ParseResult {
        let eight_bit = ctx.emulation().has_eight_bit_controls();
        let screen = &mut *ctx.screen;
        match (intermediate, final_byte) {
            (b'(' | b')' | b'*' | b'+', _) => {
                let slot = usize::from(intermediate - b'(');
                if let Some(set) = Charset::from_designator(final_byte, false) {
                    self.charsets[slot] = set;
                }
            }
            (b'-' | b'.' | b'/', _) => {
                let slot = usize::from(intermediate - b',');
                if let Some(set) = Charset::from_designator(final_byte, true) {
                    self.charsets[slot] = set;
                }
            }
            (b'#', b'3') => screen.set_double_height(DoubleHeight::Top),
            (b'#', b'4') => screen.set_double_height(DoubleHeight::Bottom),
            (b'#', b'5') => screen.set_double_height(DoubleHeight::None),
            (b'#', b'6') => screen.set_double_width(true),
            (b'#', b'8') => screen.fill_alignment(),
            (b' ', b'F') => self.s8c1t = false,
            (b' ', b'G') if eight_bit => self.s8c1t = true,
            // Linux character set selection; UTF-8 is chosen by the emulation.
            (b'%', b'@' | b'G' | b'8') => {}
            _ => return self.unknown(),
        }
        ParseResult::NoCharYet
    }

    fn vt52_dispatch(&mut self, byte: u8, ctx: &mut Context<'_>) -> ParseResult {
        let emulation = ctx.emulation();
        let screen = &mut *ctx.screen;
        match byte {
            b'A' => screen.cursor_up(1, false),
            b'B' => screen.cursor_down(1, false),
            b'C' => screen.cursor_right(1, false),
            b'D' => screen.cursor_left(1, false),
            b'F' => self.charsets[0] = Charset::Drawing,
            b'G' => self.charsets[0] = Charset::Us,
            b'H' => screen.home_cursor(),
            b'I' => screen.cursor_reverse_linefeed(),
            b'J' => screen.erase_below(false),
            b'K' => {
                let (x, right) = (screen.status().cursor_x, screen.right_margin());
                screen.erase_line(x, right, false);
            }
            b'Y' => {
                self.vt52_row = None;
                self.state = ScanState::Vt52DirectCursor;
            }
            b'Z' => ctx.host.reply(self.engine(emulation).reply(TerminalQuery::Vt52Identify)),
            b'<' => {
                if emulation != Emulation::Vt52 {
                    self.vt52 = false;
                }
            }
            b'=' => self.application_keypad = true,
            b'>' => self.application_keypad = false,
            _ => return self.unknown(),
        }
        ParseResult::NoCharYet
    }

    fn save_cursor(&mut self, screen: &Screen) {
        let status = screen.status();
        self.saved = SavedCursor {
            row: status.cursor_y,
            col: status.cursor_x,
            attrs: status.current_color,
            origin_mode: status.origin_mode,
            line_wrap: status.line_wrap,
            charsets: self.charsets,
            gl: self.gl,
            gr: self.gr,
        };
    }

    fn restore_cursor(&mut self, screen: &mut Screen) {
        let saved = self.saved;
        let status = screen.status_mut();
        status.current_color = saved.attrs;
        status.origin_mode = saved.origin_mode;
        status.line_wrap = saved.line_wrap;
        restore_position(screen, saved.row, saved.col);
        self.charsets = saved.charsets;
        self.gl = saved.gl;
        self.gr = saved.gr;
        self.single_shift = None;
    }

    /// RIS.
    fn full_reset(&mut self, ctx: &mut Context<'_>) {
        self.reset(ctx);
        restore_width(ctx);
        ctx.screen.reset_modes();
        ctx.screen.clear_screen();
    }

    /// DECSTR: modes back to defaults, screen and cursor position kept.
    fn soft_reset(&mut self, screen: &mut Screen) {
        let status = screen.status_mut();
        status.visible_cursor = true;
        status.insert_mode = false;
        status.origin_mode = false;
        status.current_color = CellAttrs::default();
        screen.reset_scroll_region();
        self.charsets = DEFAULT_CHARSETS;
        self.gl = 0;
        self.gr = 2;
        self.single_shift = None;
        self.application_cursor = false;
        self.application_keypad = false;
        self.saved = SavedCursor::default();
    }

    // ── CSI ─────────────────────────────────────────────────────────

    fn csi_dispatch(&mut self, final_byte: u8, ctx: &mut Context<'_>) -> ParseResult {
        let emulation = ctx.emulation();
        let p = &self.params;
        match (self.private, self.collect.first().copied(), final_byte) {
            (None, None, _) => return self.csi_plain(final_byte, ctx),
            (Some(b'?'), None, b'h' | b'l') => {
                let modes: Vec<u16> = p.iter().collect();
                for mode in modes {
                    self.set_dec_mode(mode, final_byte == b'h', ctx);
                }
            }
            (Some(b'?'), None, b'J') => {
                let screen = &mut *ctx.screen;
                match p.raw(0) {
                    0 => screen.erase_below(true),
                    1 => screen.erase_above(true),
                    _ => screen.erase_all(true),
                }
            }
            (Some(b'?'), None, b'K') => erase_in_line(ctx.screen, p.raw(0), true),
            (Some(b'?'), None, b'n') => {
                let query = match p.raw(0) {
                    6 => Some(cursor_report(ctx.screen)),
                    15 => Some(TerminalQuery::PrinterStatus),
                    25 => Some(TerminalQuery::UserKeysStatus),
                    26 => Some(TerminalQuery::KeyboardStatus),
                    _ => None,
                };
                if let Some(query) = query {
                    ctx.host.reply(self.engine(emulation).reply(query));
                }
            }
            (Some(b'>'), None, b'c') if emulation.has_eight_bit_controls() && p.raw(0) == 0 => {
                ctx.host.reply(self.engine(emulation).reply(TerminalQuery::SecondaryDeviceAttributes));
            }
            (None, Some(b'"'), b'q') => {
                let flags = &mut ctx.screen.status_mut().current_color.flags;
                flags.set(AttrFlags::PROTECTED, p.raw(0) == 1);
            }
            (None, Some(b'!'), b'p') => self.soft_reset(ctx.screen),
            _ => return self.unknown(),
        }
        ParseResult::NoCharYet
    }

    fn csi_plain(&mut self, final_byte: u8, ctx: &mut Context<'_>) -> ParseResult {
        let emulation = ctx.emulation();
        let linux = emulation.is_linux_family();
        let xterm = emulation.is_xterm();
        let p = &self.params;
        let n = p.get(0, 1);
        let screen = &mut *ctx.screen;
        match final_byte {
            b'@' => screen.insert_blanks(n),
            b'A' => screen.cursor_up(n, true),
            b'B' => screen.cursor_down(n, true),
            b'C' => screen.cursor_right(n, false),
            b'D' => screen.cursor_left(n, false),
            b'E' if linux => {
                screen.cursor_down(n, true);
                screen.cursor_carriage_return();
            }
            b'F' if linux => {
                screen.cursor_up(n, true);
                screen.cursor_carriage_return();
            }
            b'G' | b'`' => screen.cursor_column(n - 1),
            b'H' | b'f' => screen.cursor_position(n - 1, p.get(1, 1) - 1),
            b'I' if xterm => {
                for _ in 0..n {
                    let stop = screen.next_tab_stop();
                    screen.cursor_column(stop);
                }
            }
            b'J' => match p.raw(0) {
                0 => screen.erase_below(false),
                1 => screen.erase_above(false),
                2 => screen.erase_all(false),
                3 if xterm => screen.clear_scrollback(),
                _ => {}
            },
            b'K' => erase_in_line(screen, p.raw(0), false),
            b'L' => screen.insert_lines(n),
            b'M' => screen.delete_lines(n),
            b'P' => screen.delete_character(n),
            b'S' if xterm => {
                let (top, bottom) = (screen.status().scroll_region_top, screen.status().scroll_region_bottom);
                screen.scrolling_region_scroll_up(top, bottom, n);
            }
            b'T' if xterm => {
                let (top, bottom) = (screen.status().scroll_region_top, screen.status().scroll_region_bottom);
                screen.scrolling_region_scroll_down(top, bottom, n);
            }
            b'X' => {
                let x = screen.status().cursor_x;
                let to = x.saturating_add(n - 1).min(screen.right_margin());
                screen.erase_line(x, to, false);
            }
            b'Z' => {
                for _ in 0..n {
                    let stop = screen.prev_tab_stop();
                    screen.cursor_column(stop);
                }
            }
            b']' if linux => {
                let mut beep = self.linux_beep;
                let defaults = LinuxBeep::default();
                match p.raw(0) {
                    10 => beep.frequency = p.get(1, defaults.frequency),
                    11 => beep.duration = p.get(1, defaults.duration),
                    _ => return ParseResult::NoCharYet,
                }
                self.linux_beep = beep;
                ctx.host.event(HostEvent::LinuxBeep {
                    frequency: beep.frequency,
                    duration: beep.duration,
                });
            }
            b'a' => screen.cursor_right(n, false),
            b'b' => {
                if let Some(ch) = self.last_char {
                    for _ in 0..n {
                        screen.print_character(ch);
                    }
                }
            }
            b'c' if p.raw(0) == 0 => {
                ctx.host.reply(self.engine(emulation).reply(TerminalQuery::PrimaryDeviceAttributes));
            }
            b'd' => screen.cursor_row(n - 1),
            b'e' => screen.cursor_down(n, false),
            b'g' => match p.raw(0) {
                0 => screen.clear_tab_stop(),
                3 => screen.clear_all_tab_stops(),
                _ => {}
            },
            b'h' | b'l' => {
                let on = final_byte == b'h';
                for mode in p.iter() {
                    let status = screen.status_mut();
                    match mode {
                        4 => status.insert_mode = on,
                        12 => status.full_duplex = on,
                        20 => status.new_line_mode = on,
                        _ => trace!(mode, "ANSI mode ignored"),
                    }
                }
            }
            b'm' => {
                let colors = !matches!(
                    emulation,
                    Emulation::Vt52 | Emulation::Vt100 | Emulation::Vt102 | Emulation::Vt220
                ) || ctx.config.vt100_color;
                let mut attrs = screen.status().current_color;
                apply_sgr(&mut attrs, p, colors);
                screen.status_mut().current_color = attrs;
            }
            b'n' => {
                let query = match p.raw(0) {
                    5 => Some(TerminalQuery::DeviceStatus),
                    6 => Some(cursor_report(screen)),
                    _ => None,
                };
                if let Some(query) = query {
                    ctx.host.reply(self.engine(emulation).reply(query));
                }
            }
            // DECLL: no LEDs to drive.
            b'q' => {}
            b'r' => {
                let top = p.get(0, 1) - 1;
                let bottom = p.get(1, screen.height()) - 1;
                if screen.set_scroll_region(top, bottom) {
                    screen.home_cursor();
                }
            }
            b's' => self.ansi_saved = (screen.status().cursor_y, screen.status().cursor_x),
            b'u' => {
                let (row, col) = self.ansi_saved;
                restore_position(screen, row, col);
            }
            b'x' if p.raw(0) <= 1 => {
                let request = p.raw(0);
                ctx.host.reply(self.engine(emulation).reply(TerminalQuery::TerminalParameters { request }));
            }
            _ => return self.unknown(),
        }
        ParseResult::NoCharYet
    }

    fn set_dec_mode(&mut self, mode: u16, on: bool, ctx: &mut Context<'_>) {
        let screen = &mut *ctx.screen;
        match mode {
            1 => self.application_cursor = on,
            2 => {
                if !on {
                    self.vt52 = true;
                }
            }
            3 => {
                let width = if on { WIDE_COLUMNS } else { ctx.config.width };
                let changed = width != screen.width();
                screen.set_columns(width);
                if changed {
                    ctx.host.event(HostEvent::ColumnsChanged(width));
                }
            }
            5 => {
                if on {
                    screen.invert_scrollback_colors();
                } else {
                    screen.deinvert_scrollback_colors();
                }
            }
            6 => {
                screen.status_mut().origin_mode = on;
                screen.home_cursor();
            }
            7 => screen.status_mut().line_wrap = on,
            25 => screen.status_mut().visible_cursor = on,
            // Smooth scroll, autorepeat, blink, NRC: nothing to do.
            4 | 8 | 12 | 42 => {}
            9 | 1000 | 1002 | 1003 => {
                let protocol = match mode {
                    9 => MouseProtocol::X10,
                    1000 => MouseProtocol::Normal,
                    1002 => MouseProtocol::ButtonEvent,
                    _ => MouseProtocol::AnyEvent,
                };
                self.mouse.protocol = if on { protocol } else { MouseProtocol::Off };
                self.mouse_changed(ctx);
            }
            1005 | 1006 => {
                let encoding = if mode == 1005 { MouseEncoding::Utf8 } else { MouseEncoding::Sgr };
                self.mouse.encoding = if on { encoding } else { MouseEncoding::X10 };
                self.mouse_changed(ctx);
            }
            1047 => screen.erase_all(false),
            1048 => {
                if on {
                    self.save_cursor(screen);
                } else {
                    self.restore_cursor(screen);
                }
            }
            1049 => {
                if on {
                    self.save_cursor(screen);
                    screen.erase_all(false);
                } else {
                    screen.erase_all(false);
                    self.restore_cursor(screen);
                }
            }
            2004 => self.bracketed_paste = on,
            _ => trace!(mode, "DEC private mode ignored"),
        }
    }

    fn mouse_changed(&self, ctx: &mut Context<'_>) {
        ctx.host.event(HostEvent::MouseReportingChanged {
            protocol: self.mouse.protocol,
            encoding: self.mouse.encoding,
        });
    }

    // ── Strings ─────────────────────────────────────────────────────

    fn dcs_byte(&mut self, byte: u8) {
        let byte = byte & 0x7f;
        self.state = match (self.state, byte) {
            (ScanState::DcsEntry, 0x20..=0x2f) | (ScanState::DcsParam, 0x20..=0x2f) => {
                ScanState::DcsIntermediate
            }
            (ScanState::DcsEntry, 0x30..=0x39 | 0x3b | 0x3c..=0x3f) => ScanState::DcsParam,
            (ScanState::DcsEntry, 0x3a) | (ScanState::DcsParam, 0x3a | 0x3c..=0x3f) => {
                ScanState::DcsIgnore
            }
            (ScanState::DcsIntermediate, 0x30..=0x3f) => ScanState::DcsIgnore,
            (ScanState::DcsEntry | ScanState::DcsParam | ScanState::DcsIntermediate, 0x40..=0x7e) => {
                trace!(final_byte = byte, "DCS string discarded");
                ScanState::DcsPassthrough
            }
            (state, _) => state,
        };
    }

    fn osc_push(&mut self, byte: u8) {
        if self.osc.len() < MAX_OSC_LEN {
            self.osc.push(byte);
        }
    }

    fn osc_byte(&mut self, byte: u8, ctx: &mut Context<'_>) -> ParseResult {
        if byte == 0x07 {
            self.osc_dispatch(ctx);
            self.to_ground();
            return ParseResult::NoCharYet;
        }
        if byte < 0x20 {
            return ParseResult::NoCharYet;
        }
        // Linux console palette commands have no terminator.
        if ctx.emulation().is_linux_family() {
            match (self.osc.first(), byte) {
                (None, b'R') => {
                    ctx.host.event(HostEvent::ResetPalette);
                    self.to_ground();
                    return ParseResult::NoCharYet;
                }
                (Some(b'P'), _) => {
                    self.osc_push(byte);
                    if self.osc.len() == 8 {
                        if let Some((index, rgb)) = linux_palette(&self.osc[1..]) {
                            ctx.host.event(HostEvent::SetPalette { index, rgb });
                        }
                        self.osc.clear();
                        self.to_ground();
                    }
                    return ParseResult::NoCharYet;
                }
                _ => {}
            }
        }
        self.osc_push(byte);
        ParseResult::NoCharYet
    }

    fn osc_dispatch(&mut self, ctx: &mut Context<'_>) {
        let osc = std::mem::take(&mut self.osc);
        let text: String = if ctx.emulation().is_utf8() {
            String::from_utf8_lossy(&osc).into_owned()
        } else {
            osc.iter().copied().map(char::from).collect()
        };
        let (command, rest) = text.split_once(';').unwrap_or((text.as_str(), ""));
        match command {
            "0" | "2" => ctx.host.event(HostEvent::SetTitle(rest.to_string())),
            // Icon name.
            "1" => {}
            "4" => {
                let mut fields = rest.split(';');
                while let (Some(index), Some(spec)) = (fields.next(), fields.next()) {
                    if let (Ok(index), Some(rgb)) = (index.parse::<u8>(), parse_color_spec(spec)) {
                        ctx.host.event(HostEvent::SetPalette { index, rgb });
                    }
                }
            }
            "104" => ctx.host.event(HostEvent::ResetPalette),
            _ => trace!(command, "OSC command ignored"),
        }
    }
}

fn erase_in_line(screen: &mut Screen, kind: u16, honor_protected: bool) {
    let (x, right) = (screen.status().cursor_x, screen.right_margin());
    match kind {
        0 => screen.erase_line(x, right, honor_protected),
        1 => screen.erase_line(0, x, honor_protected),
        2 => screen.erase_line(0, right, honor_protected),
        _ => {}
    }
}

/// Put the cursor back at a saved absolute position. Under origin mode the
/// row stays inside the scroll region.
fn restore_position(screen: &mut Screen, row: u16, col: u16) {
    let (bottom, right) = (screen.height().saturating_sub(1), screen.right_margin());
    let status = screen.status_mut();
    status.cursor_y = if status.origin_mode {
        row.clamp(status.scroll_region_top, status.scroll_region_bottom)
    } else {
        row.min(bottom)
    };
    status.cursor_x = col.min(right);
    status.pending_wrap = false;
}

/// CPR, with the row relative to the scroll region under origin mode.
fn cursor_report(screen: &Screen) -> TerminalQuery {
    let status = screen.status();
    let top = if status.origin_mode { status.scroll_region_top } else { 0 };
    TerminalQuery::CursorPosition {
        row: status.cursor_y.saturating_sub(top) + 1,
        col: status.cursor_x + 1,
    }
}

fn restore_width(ctx: &mut Context<'_>) {
    let width = ctx.config.width;
    if ctx.screen.width() != width {
        ctx.screen.set_columns(width);
        ctx.host.event(HostEvent::ColumnsChanged(width));
    }
}

/// `n rr gg bb` as seven hex digits.
fn linux_palette(digits: &[u8]) -> Option<(u8, (u8, u8, u8))> {
    let text = std::str::from_utf8(digits).ok()?;
    let index = u8::from_str_radix(text.get(0..1)?, 16).ok()?;
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(text.get(range)?, 16).ok();
    Some((index, (channel(1..3)?, channel(3..5)?, channel(5..7)?)))
}

/// `rgb:r/g/b` with 1-4 hex digits per channel, or `#rrggbb`.
fn parse_color_spec(spec: &str) -> Option<(u8, u8, u8)> {
    if let Some(hex) = spec.strip_prefix('#') {
        if hex.len() != 6 {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
        return Some((channel(0..2)?, channel(2..4)?, channel(4..6)?));
    }
    let mut channels = spec.strip_prefix("rgb:")?.split('/').map(scale_channel);
    let rgb = (channels.next()??, channels.next()??, channels.next()??);
    channels.next().is_none().then_some(rgb)
}

fn scale_channel(hex: &str) -> Option<u8> {
    let value = u32::from_str_radix(hex, 16).ok()?;
    let scaled = match hex.len() {
        1 => value * 0x11,
        2 => value,
        3 => value >> 4,
        4 => value >> 8,
        _ => return None,
    };
    u8::try_from(scaled).ok()
}

impl EmulationParser for DecParser {
    fn parse(&mut self, byte: u8, ctx: &mut Context<'_>) -> ParseResult {
        if ctx.emulation().is_utf8() {
            self.parse_utf8(byte, ctx)
        } else {
            self.scan(byte, ctx)
        }
    }

    fn next_buffered(&mut self, _ctx: &mut Context<'_>) -> Option<char> {
        let byte = self.replay.next_byte()?;
        // ESC shows as its CP437 glyph.
        Some(if byte < 0x20 { Codepage::Cp437.decode(byte) } else { char::from(byte) })
    }

    fn in_ground(&self) -> bool {
        self.state == ScanState::Ground
    }

    fn reset(&mut self, ctx: &mut Context<'_>) {
        let mouse_was_on = self.mouse.protocol != MouseProtocol::Off;
        *self = Self::new(ctx.emulation());
        self.bracketed_paste = ctx.config.bracketed_paste_default;
        if mouse_was_on {
            self.mouse_changed(ctx);
        }
    }
}
