//! AVATAR (AVT/0 with the AVT/0+ additions).
//!
//! Commands are introduced by `^V` (0x16) and take a fixed number of raw
//! argument bytes. `^Y` (0x19) is run-length encoding: `0x19 <count> <byte>`.
//! Anything else goes to an embedded ANSI parser, so `ESC [` sequences keep
//! working when the fallback is enabled.
//!
//! Repeats are returned as [`ParseResult::RepeatState`]; the dispatcher feeds
//! the expanded bytes back through this parser.

use tracing::trace;

use crate::cell::{AttrFlags, CellAttrs};

use super::ansi::AnsiParser;
use super::{Context, EmulationParser, ParseResult, Replay};

/// Attribute after `^L`: cyan on black.
const CLEAR_ATTRIBUTE: u8 = 0x03;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    #[default]
    Ground,
    /// Saw `^V`, waiting for the command byte.
    Command,
    /// Collecting the arguments of `command`.
    Args,
    /// `^Y`: waiting for the count, then the byte.
    Repeat,
}

#[derive(Debug, Default, Clone)]
pub struct AvatarParser {
    state: State,
    command: u8,
    args: Vec<u8>,
    replay: Replay,
    ansi: AnsiParser,
}

/// Argument bytes a `^V` command takes, or `None` for an unknown command.
/// The pattern repeat (`^V ^Y`) is sized from its first argument.
fn arg_count(command: u8, args: &[u8]) -> Option<usize> {
    let count = match command {
        0x02 | 0x04..=0x07 | 0x09 | 0x0e => 0,
        0x01 => 1,
        0x03 => 2,
        0x0c => 3,
        0x0d => 4,
        0x0a | 0x0b => 5,
        0x08 => 6,
        0x19 => match args.first() {
            Some(&len) => usize::from(len) + 2,
            None => 1,
        },
        _ => return None,
    };
    Some(count)
}

// 1-based screen coordinate to 0-based.
fn coord(value: u8) -> u16 {
    u16::from(value).saturating_sub(1)
}

impl AvatarParser {
    fn to_ground(&mut self) {
        self.state = State::Ground;
        self.command = 0;
        self.args.clear();
    }

    fn ground(&mut self, byte: u8, ctx: &mut Context<'_>) -> ParseResult {
        match byte {
            0x16 => {
                self.state = State::Command;
                ParseResult::NoCharYet
            }
            0x19 => {
                self.state = State::Repeat;
                self.args.clear();
                ParseResult::NoCharYet
            }
            0x0c => {
                ctx.screen.status_mut().current_color = CellAttrs::from_pc_attribute(CLEAR_ATTRIBUTE);
                ctx.screen.clear_screen();
                ParseResult::NoCharYet
            }
            0x1b if !ctx.config.avatar_ansi_fallback => ParseResult::OneChar(ctx.codepage().decode(byte)),
            _ => self.ansi.parse(byte, ctx),
        }
    }

    fn execute(&mut self, ctx: &mut Context<'_>) -> ParseResult {
        let command = self.command;
        let args = std::mem::take(&mut self.args);
        self.to_ground();
        let screen = &mut *ctx.screen;
        screen.status_mut().insert_mode = command == 0x09;
        match (command, args.as_slice()) {
            (0x01, &[attr]) => {
                screen.status_mut().current_color = CellAttrs::from_pc_attribute(attr & 0x7f);
            }
            (0x02, _) => screen.status_mut().current_color.flags.insert(AttrFlags::BLINK),
            (0x03, &[row, col]) => screen.cursor_position(coord(row), coord(col)),
            (0x04, _) => screen.cursor_up(1, false),
            (0x05, _) => screen.cursor_down(1, false),
            (0x06, _) => screen.cursor_left(1, false),
            (0x07, _) => screen.cursor_right(1, false),
            (0x08, &[lines, cols, top, left, bottom, right]) => {
                let (rows, cols) = (i32::from(lines as i8), i32::from(cols as i8));
                screen.scroll_window(coord(top), coord(left), coord(bottom), coord(right), rows, cols);
            }
            (0x09, _) => {}
            (0x0a | 0x0b, &[lines, top, left, bottom, right]) => {
                let (top, left, bottom, right) = (coord(top), coord(left), coord(bottom), coord(right));
                if lines == 0 {
                    let attrs = screen.write_attrs();
                    screen.fill_window(top, left, bottom, right, ' ', attrs);
                } else {
                    let rows = if command == 0x0a { i32::from(lines) } else { -i32::from(lines) };
                    screen.scroll_window(top, left, bottom, right, rows, 0);
                }
            }
            (0x0c, &[attr, lines, cols]) => {
                let attrs = CellAttrs::from_pc_attribute(attr & 0x7f);
                screen.status_mut().current_color = attrs;
                fill_from_cursor(ctx, ' ', attrs, lines, cols);
            }
            (0x0d, &[attr, ch, lines, cols]) => {
                let attrs = CellAttrs::from_pc_attribute(attr & 0x7f);
                screen.status_mut().current_color = attrs;
                let ch = screen.status().codepage.decode(ch);
                fill_from_cursor(ctx, ch, attrs, lines, cols);
            }
            (0x0e, _) => screen.delete_character(1),
            (0x19, [_, rest @ ..]) => {
                if let Some((&count, pattern)) = rest.split_last() {
                    return ParseResult::RepeatState(pattern.repeat(usize::from(count)));
                }
            }
            _ => {}
        }
        ParseResult::NoCharYet
    }

    fn unknown(&mut self, byte: u8) -> ParseResult {
        trace!(command = byte, "unknown AVATAR command");
        self.replay.load(&[0x16, byte]);
        self.to_ground();
        ParseResult::ManyChars
    }
}

fn fill_from_cursor(ctx: &mut Context<'_>, ch: char, attrs: CellAttrs, lines: u8, cols: u8) {
    if lines == 0 || cols == 0 {
        return;
    }
    let screen = &mut *ctx.screen;
    let (y, x) = (screen.status().cursor_y, screen.status().cursor_x);
    let bottom = y.saturating_add(u16::from(lines) - 1);
    let right = x.saturating_add(u16::from(cols) - 1);
    screen.fill_window(y, x, bottom, right, ch, attrs);
}

impl EmulationParser for AvatarParser {
    fn parse(&mut self, byte: u8, ctx: &mut Context<'_>) -> ParseResult {
        // A sequence already handed to ANSI finishes there.
        if !self.ansi.in_ground() {
            return self.ansi.parse(byte, ctx);
        }
        match self.state {
            State::Ground => self.ground(byte, ctx),
            State::Command => {
                self.command = byte;
                self.args.clear();
                match arg_count(byte, &self.args) {
                    None => {
                        ctx.screen.status_mut().insert_mode = false;
                        self.unknown(byte)
                    }
                    Some(0) => self.execute(ctx),
                    Some(_) => {
                        self.state = State::Args;
                        ParseResult::NoCharYet
                    }
                }
            }
            State::Args => {
                self.args.push(byte);
                match arg_count(self.command, &self.args) {
                    Some(needed) if self.args.len() >= needed => self.execute(ctx),
                    _ => ParseResult::NoCharYet,
                }
            }
            State::Repeat => {
                let Some(&count) = self.args.first() else {
                    self.args.push(byte);
                    return ParseResult::NoCharYet;
                };
                self.to_ground();
                ParseResult::RepeatState(vec![byte; usize::from(count)])
            }
        }
    }

    fn next_buffered(&mut self, ctx: &mut Context<'_>) -> Option<char> {
        if let Some(byte) = self.replay.next_byte() {
            return Some(ctx.codepage().decode(byte));
        }
        self.ansi.next_buffered(ctx)
    }

    fn in_ground(&self) -> bool {
        self.state == State::Ground && self.ansi.in_ground()
    }

    fn reset(&mut self, ctx: &mut Context<'_>) {
        self.to_ground();
        self.replay.clear();
        self.ansi.reset(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Color;
    use crate::emulation::Emulation;
    use crate::emulation::harness::Harness;

    fn harness() -> Harness<AvatarParser> {
        Harness::new(AvatarParser::default(), Emulation::Avatar, 20, 6)
    }

    #[test]
    fn set_attribute_and_position() {
        let mut h = harness();
        h.feed(b"\x16\x01\x1e\x16\x03\x02\x05X");
        assert_eq!(h.text(1), "    X");
        let cell = h.screen.grid().cell(1, 4).copied().unwrap_or_default();
        assert_eq!(cell.attrs.fg, Color::Yellow);
        assert!(cell.attrs.flags.contains(AttrFlags::BOLD));
        assert_eq!(cell.attrs.bg, Color::Blue);
    }

    #[test]
    fn cursor_moves() {
        let mut h = harness();
        h.feed(b"\x16\x03\x03\x03\x16\x04\x16\x07\x16\x07\x16\x06");
        assert_eq!(h.cursor(), (1, 3));
        h.feed(b"\x16\x05");
        assert_eq!(h.cursor(), (2, 3));
    }

    #[test]
    fn run_length_repeat() {
        let mut h = harness();
        h.feed(b"\x19\x05*ok");
        assert_eq!(h.text(0), "*****ok");
    }

    #[test]
    fn repeated_controls_still_act() {
        let mut h = harness();
        h.feed(b"abc\x19\x02\x08Z");
        assert_eq!(h.text(0), "aZc");
    }

    #[test]
    fn pattern_repeat() {
        let mut h = harness();
        h.feed(b"\x16\x19\x02ab\x03");
        assert_eq!(h.text(0), "ababab");
    }

    #[test]
    fn form_feed_clears_to_cyan() {
        let mut h = harness();
        h.feed(b"junk\x0cA");
        assert_eq!(h.text(0), "A");
        let cell = h.screen.grid().cell(0, 0).copied().unwrap_or_default();
        assert_eq!(cell.attrs.fg, Color::Cyan);
    }

    #[test]
    fn insert_mode_until_next_command() {
        let mut h = harness();
        h.feed(b"ac\x16\x06\x16\x09b");
        assert_eq!(h.text(0), "abc");
        assert!(h.screen.status().insert_mode);
        h.feed(b"\x16\x06");
        assert!(!h.screen.status().insert_mode);
    }

    #[test]
    fn window_scroll_moves_content_up() {
        let mut h = harness();
        h.feed(b"\x16\x03\x02\x01line2\x16\x03\x03\x01line3");
        // Scroll rows 1-3, cols 1-20 up one line.
        h.feed(b"\x16\x08\x01\x00\x01\x01\x03\x14");
        assert_eq!(h.text(0), "line2");
        assert_eq!(h.text(1), "line3");
        assert_eq!(h.text(2), "");
    }

    #[test]
    fn area_fill_and_delete_char() {
        let mut h = harness();
        h.feed(b"\x16\x03\x01\x01\x16\x0d\x07#\x02\x03");
        assert_eq!(h.text(0), "###");
        assert_eq!(h.text(1), "###");
        h.feed(b"\x16\x0e");
        assert_eq!(h.text(0), "##");
    }

    #[test]
    fn ansi_fallback_and_unknown_command() {
        let mut h = harness();
        h.feed(b"\x1b[2;2Hx");
        assert_eq!(h.text(1), " x");
        h.feed(b"\x16\x7f");
        assert!(h.text(1).starts_with(" x▬"));
    }

    #[test]
    fn escape_prints_without_fallback() {
        let mut h = harness();
        h.config.avatar_ansi_fallback = false;
        h.feed(b"\x1b[1m");
        assert_eq!(h.text(0), "←[1m");
    }
}
