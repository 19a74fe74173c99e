//! ANSI: DOS ANSI.SYS with the X3.64 editing extensions and ANSI music.
//!
//! Only `ESC [` sequences are understood. Anything else that starts with ESC,
//! and any control sequence with an unknown final byte, is handed back as
//! [`ParseResult::ManyChars`] so the raw bytes land on screen where the user
//! can see them.

use tracing::trace;

use crate::host::HostEvent;
use crate::music::MusicParser;
use crate::reply::{ReplyEngine, TerminalQuery};

use super::csi::{Params, apply_sgr};
use super::{Context, Emulation, EmulationParser, ParseResult, Replay};

// Longest PLAY string kept; the rest is dropped.
const MAX_MUSIC_LEN: usize = 4096;

// Longest sequence kept for replay before it is abandoned.
const MAX_SEQUENCE_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    #[default]
    Ground,
    Escape,
    Csi,
    Music,
}

#[derive(Debug, Default, Clone)]
pub struct AnsiParser {
    state: State,
    params: Params,
    /// `=` or `?` after the introducer.
    private: Option<u8>,
    /// Raw bytes of the sequence in progress.
    sequence: Vec<u8>,
    replay: Replay,
    saved_cursor: (u16, u16),
    music: MusicParser,
    play: Vec<u8>,
    /// The PLAY string will be played (music was enabled when it began).
    play_enabled: bool,
    last_char: Option<char>,
}

impl AnsiParser {
    /// Pending replay bytes.
    #[must_use]
    pub fn has_buffered(&self) -> bool {
        !self.replay.is_empty()
    }

    fn unknown(&mut self) -> ParseResult {
        trace!(sequence = ?self.sequence, "unknown ANSI sequence");
        self.replay.load(&self.sequence);
        self.to_ground();
        ParseResult::ManyChars
    }

    fn to_ground(&mut self) {
        self.state = State::Ground;
        self.params.clear();
        self.private = None;
        self.sequence.clear();
    }

    fn ground(&mut self, byte: u8, ctx: &mut Context<'_>) -> ParseResult {
        let screen = &mut *ctx.screen;
        match byte {
            0x1b => {
                self.state = State::Escape;
                self.sequence.push(byte);
                return ParseResult::NoCharYet;
            }
            0x00 if !screen.status().display_null => {}
            0x07 => ctx.host.event(HostEvent::Bell),
            0x08 => screen.cursor_left(1, false),
            0x09 => {
                let stop = screen.next_tab_stop();
                screen.cursor_column(stop);
            }
            0x0a => {
                let new_line_mode = screen.status().new_line_mode;
                screen.cursor_linefeed(new_line_mode);
            }
            0x0c => screen.clear_screen(),
            0x0d => screen.cursor_carriage_return(),
            _ => {
                let ch = screen.status().codepage.decode(byte);
                self.last_char = Some(ch);
                return ParseResult::OneChar(ch);
            }
        }
        ParseResult::NoCharYet
    }

    fn music_byte(&mut self, byte: u8, ctx: &mut Context<'_>) -> ParseResult {
        if byte == 0x0e {
            if self.play_enabled {
                let tones = self.music.parse(&self.play);
                if !tones.is_empty() {
                    ctx.host.event(HostEvent::PlayMusic(tones));
                }
            }
            self.play.clear();
            self.to_ground();
        } else if self.play.len() < MAX_MUSIC_LEN {
            self.play.push(byte);
        }
        ParseResult::NoCharYet
    }

    fn start_music(&mut self, ctx: &Context<'_>) -> ParseResult {
        self.to_ground();
        self.state = State::Music;
        self.play.clear();
        self.play_enabled = ctx.config.ansi_music;
        ParseResult::NoCharYet
    }

    fn dispatch(&mut self, final_byte: u8, ctx: &mut Context<'_>) -> ParseResult {
        let p = &self.params;
        let screen = &mut *ctx.screen;
        let n = p.get(0, 1);
        match (self.private, final_byte) {
            (None, b'@') => screen.insert_blanks(n),
            (None, b'A') => screen.cursor_up(n, false),
            (None, b'B') => screen.cursor_down(n, false),
            (None, b'C') => screen.cursor_right(n, false),
            (None, b'D') => screen.cursor_left(n, false),
            (None, b'E') => {
                screen.cursor_down(n, false);
                screen.cursor_carriage_return();
            }
            (None, b'F') => {
                screen.cursor_up(n, false);
                screen.cursor_carriage_return();
            }
            (None, b'G' | b'`') => screen.cursor_column(n - 1),
            (None, b'H' | b'f') => screen.cursor_position(n - 1, p.get(1, 1) - 1),
            (None, b'I') => {
                for _ in 0..n {
                    let stop = screen.next_tab_stop();
                    screen.cursor_column(stop);
                }
            }
            (None, b'J') => match p.raw(0) {
                0 => screen.erase_below(false),
                1 => screen.erase_above(false),
                // ANSI.SYS homes the cursor on a full clear.
                _ => screen.clear_screen(),
            },
            (None, b'K') => {
                let (x, right) = (screen.status().cursor_x, screen.right_margin());
                match p.raw(0) {
                    0 => screen.erase_line(x, right, false),
                    1 => screen.erase_line(0, x, false),
                    _ => screen.erase_line(0, right, false),
                }
            }
            (None, b'L') => screen.insert_lines(n),
            (None, b'M') if p.is_empty() && ctx.config.ansi_music => return self.start_music(ctx),
            (None, b'M') => screen.delete_lines(n),
            (None, b'N' | b'|') => return self.start_music(ctx),
            (None, b'P') => screen.delete_character(n),
            (None, b'S') => {
                let (top, bottom) = (screen.status().scroll_region_top, screen.status().scroll_region_bottom);
                screen.scrolling_region_scroll_up(top, bottom, n);
            }
            (None, b'T') => {
                let (top, bottom) = (screen.status().scroll_region_top, screen.status().scroll_region_bottom);
                screen.scrolling_region_scroll_down(top, bottom, n);
            }
            (None, b'X') => {
                let x = screen.status().cursor_x;
                let to = x.saturating_add(n - 1).min(screen.right_margin());
                screen.erase_line(x, to, false);
            }
            (None, b'Z') => {
                for _ in 0..n {
                    let stop = screen.prev_tab_stop();
                    screen.cursor_column(stop);
                }
            }
            (None, b'a') => screen.cursor_right(n, false),
            (None, b'b') => {
                if let Some(ch) = self.last_char {
                    for _ in 0..n {
                        screen.print_character(ch);
                    }
                }
            }
            (None, b'd') => screen.cursor_row(n - 1),
            (None, b'e') => screen.cursor_down(n, false),
            (None, b'm') => {
                let mut attrs = screen.status().current_color;
                apply_sgr(&mut attrs, p, true);
                screen.status_mut().current_color = attrs;
            }
            (None, b'n') => {
                let engine = ReplyEngine::new(Emulation::Ansi, false);
                match p.raw(0) {
                    5 => ctx.host.reply(engine.reply(TerminalQuery::DeviceStatus)),
                    6 => {
                        let status = screen.status();
                        ctx.host.reply(engine.reply(TerminalQuery::CursorPosition {
                            row: status.cursor_y + 1,
                            col: status.cursor_x + 1,
                        }));
                    }
                    _ => {}
                }
            }
            (None, b's') => {
                self.saved_cursor = (screen.status().cursor_y, screen.status().cursor_x);
            }
            (None, b'u') => {
                let (row, col) = self.saved_cursor;
                screen.cursor_position(row, col);
            }
            (Some(b'=' | b'?'), b'h' | b'l') => {
                let on = final_byte == b'h';
                for mode in p.iter() {
                    match mode {
                        7 => screen.status_mut().line_wrap = on,
                        25 => screen.status_mut().visible_cursor = on,
                        // Video modes: nothing to switch.
                        _ => {}
                    }
                }
            }
            (None, b'h' | b'l') => {
                let on = final_byte == b'h';
                for mode in p.iter() {
                    if mode == 4 {
                        screen.status_mut().insert_mode = on;
                    }
                }
            }
            _ => return self.unknown(),
        }
        self.to_ground();
        ParseResult::NoCharYet
    }
}

impl EmulationParser for AnsiParser {
    fn parse(&mut self, byte: u8, ctx: &mut Context<'_>) -> ParseResult {
        match self.state {
            State::Ground => self.ground(byte, ctx),
            State::Music => self.music_byte(byte, ctx),
            State::Escape => {
                self.sequence.push(byte);
                if byte == b'[' {
                    self.state = State::Csi;
                    ParseResult::NoCharYet
                } else {
                    self.unknown()
                }
            }
            State::Csi => {
                self.sequence.push(byte);
                match byte {
                    b'0'..=b'9' => self.params.push_digit(byte),
                    b';' => self.params.separator(),
                    b'=' | b'?' if self.private.is_none() && self.params.is_empty() && self.sequence.len() == 3 => {
                        self.private = Some(byte);
                    }
                    0x40..=0x7e => return self.dispatch(byte, ctx),
                    _ => return self.unknown(),
                }
                if self.sequence.len() > MAX_SEQUENCE_LEN {
                    return self.unknown();
                }
                ParseResult::NoCharYet
            }
        }
    }

    fn next_buffered(&mut self, ctx: &mut Context<'_>) -> Option<char> {
        let byte = self.replay.next_byte()?;
        Some(ctx.codepage().decode(byte))
    }

    fn in_ground(&self) -> bool {
        self.state == State::Ground
    }

    fn reset(&mut self, _ctx: &mut Context<'_>) {
        self.to_ground();
        self.replay.clear();
        self.saved_cursor = (0, 0);
        self.music.reset();
        self.play.clear();
        self.last_char = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{AttrFlags, Color};
    use crate::config::TerminalConfig;
    use crate::host::HostQueue;
    use crate::row::Row;
    use crate::screen::Screen;

    struct Harness {
        parser: AnsiParser,
        screen: Screen,
        host: HostQueue,
        config: TerminalConfig,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                parser: AnsiParser::default(),
                screen: Screen::new(20, 6, 10, Emulation::Ansi),
                host: HostQueue::default(),
                config: TerminalConfig::default(),
            }
        }

        fn feed(&mut self, bytes: &[u8]) {
            for &byte in bytes {
                let mut ctx = Context {
                    screen: &mut self.screen,
                    host: &mut self.host,
                    config: &self.config,
                };
                match self.parser.parse(byte, &mut ctx) {
                    ParseResult::OneChar(ch) => self.screen.print_character(ch),
                    ParseResult::ManyChars => loop {
                        let mut ctx = Context {
                            screen: &mut self.screen,
                            host: &mut self.host,
                            config: &self.config,
                        };
                        let Some(ch) = self.parser.next_buffered(&mut ctx) else {
                            break;
                        };
                        self.screen.print_character(ch);
                    },
                    _ => {}
                }
            }
        }

        fn text(&self, row: u16) -> String {
            self.screen.grid().row(row).map(Row::text).unwrap_or_default()
        }
    }

    #[test]
    fn cursor_position_and_sgr() {
        let mut h = Harness::new();
        h.feed(b"\x1b[3;5H\x1b[1;34mX");
        assert_eq!(h.text(2), "    X");
        let cell = h.screen.grid().cell(2, 4).copied().unwrap_or_default();
        assert_eq!(cell.attrs.fg, Color::Blue);
        assert!(cell.attrs.flags.contains(AttrFlags::BOLD));
    }

    #[test]
    fn clear_screen_homes_cursor() {
        let mut h = Harness::new();
        h.feed(b"abc\x1b[4;4H\x1b[2J");
        assert_eq!(h.text(0), "");
        assert_eq!((h.screen.status().cursor_y, h.screen.status().cursor_x), (0, 0));
    }

    #[test]
    fn save_restore_and_report() {
        let mut h = Harness::new();
        h.feed(b"\x1b[2;3H\x1b[s\x1b[5;5H\x1b[u\x1b[6n");
        assert_eq!((h.screen.status().cursor_y, h.screen.status().cursor_x), (1, 2));
        assert_eq!(h.host.drain_replies(), vec![b"\x1b[2;3R".to_vec()]);
    }

    #[test]
    fn unknown_sequence_is_replayed() {
        let mut h = Harness::new();
        h.feed(b"\x1b[5y");
        assert_eq!(h.text(0), "←[5y");
        h.feed(b"\x1bQ");
        assert_eq!(h.text(0), "←[5y←Q");
    }

    #[test]
    fn music_is_played_and_not_printed() {
        let mut h = Harness::new();
        h.feed(b"\x1b[MT120L4A\x0eok");
        assert_eq!(h.text(0), "ok");
        let events = h.host.drain_events();
        assert!(matches!(&events[..], [HostEvent::PlayMusic(tones)] if tones[0].frequency_hz == 440));
    }

    #[test]
    fn music_disabled_makes_csi_m_delete_line() {
        let mut h = Harness::new();
        h.config.ansi_music = false;
        h.feed(b"top\r\n\x1b[A\x1b[M");
        assert_eq!(h.text(0), "");
        assert!(h.host.drain_events().is_empty());
        h.feed(b"\x1b[NCDE\x0e!");
        assert!(h.host.drain_events().is_empty());
        assert_eq!(h.text(0), "!");
    }

    #[test]
    fn wrap_mode_and_rep() {
        let mut h = Harness::new();
        h.feed(b"\x1b[=7l");
        assert!(!h.screen.status().line_wrap);
        h.feed(b"x\x1b[3b");
        assert_eq!(h.text(0), "xxxx");
    }

    #[test]
    fn erase_character_at_margin_erases_one_cell() {
        let mut h = Harness::new();
        h.feed(b"\x1b[1;20HZ\x1b[1;20H\x1b[5X");
        assert_eq!(h.text(0).trim_end(), "");
        assert_eq!(h.screen.status().cursor_x, 19);
    }
}
