//! ATASCII (Atari 8-bit).
//!
//! Most of the control range is graphics; only the screen editor codes below
//! act. Bytes with the high bit set print their low seven bits in reverse
//! video. `ESC` makes the following byte print literally.

use crate::cell::AttrFlags;
use crate::charset::atascii_glyph;
use crate::host::HostEvent;
use crate::screen::Screen;

use super::{Context, EmulationParser, ParseResult};

#[derive(Debug, Default, Clone)]
pub struct AtasciiParser {
    /// The previous byte was `ESC`.
    literal: bool,
}

fn print_reversed(screen: &mut Screen, ch: char) {
    let saved = screen.status().current_color;
    screen.status_mut().current_color.flags.insert(AttrFlags::REVERSE);
    screen.print_character(ch);
    screen.status_mut().current_color = saved;
}

fn print_byte(screen: &mut Screen, byte: u8) -> ParseResult {
    let ch = atascii_glyph(byte);
    if byte & 0x80 == 0 {
        return ParseResult::OneChar(ch);
    }
    print_reversed(screen, ch);
    ParseResult::NoCharYet
}

impl EmulationParser for AtasciiParser {
    fn parse(&mut self, byte: u8, ctx: &mut Context<'_>) -> ParseResult {
        let screen = &mut *ctx.screen;
        if self.literal {
            self.literal = false;
            return print_byte(screen, byte);
        }
        match byte {
            0x1b => self.literal = true,
            0x9b => {
                screen.cursor_carriage_return();
                screen.cursor_linefeed(false);
            }
            0x1c => screen.cursor_up(1, false),
            0x1d => screen.cursor_down(1, false),
            0x1e => screen.cursor_left(1, false),
            0x1f => screen.cursor_right(1, false),
            0x7d => screen.clear_screen(),
            0x7e => {
                screen.cursor_left(1, false);
                let x = screen.status().cursor_x;
                screen.erase_line(x, x, false);
            }
            0x7f => {
                let stop = screen.next_tab_stop();
                screen.cursor_column(stop);
            }
            0x9c => screen.delete_lines(1),
            0x9d => screen.insert_lines(1),
            0x9e => screen.clear_tab_stop(),
            0x9f => screen.set_tab_stop(),
            0xfd => ctx.host.event(HostEvent::Bell),
            0xfe => screen.delete_character(1),
            0xff => screen.insert_blanks(1),
            _ => return print_byte(screen, byte),
        }
        ParseResult::NoCharYet
    }

    fn in_ground(&self) -> bool {
        !self.literal
    }

    fn reset(&mut self, _ctx: &mut Context<'_>) {
        self.literal = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulation::Emulation;
    use crate::emulation::harness::Harness;

    fn harness() -> Harness<AtasciiParser> {
        Harness::new(AtasciiParser::default(), Emulation::Atascii, 40, 5)
    }

    #[test]
    fn end_of_line_and_graphics() {
        let mut h = harness();
        h.feed(b"HI\x9b\x00\x7b");
        assert_eq!(h.text(0), "HI");
        assert_eq!(h.text(1), "♥♠");
    }

    #[test]
    fn high_bit_prints_reversed() {
        let mut h = harness();
        h.feed(&[0xc1, b'A']);
        let first = h.screen.grid().cell(0, 0).copied().unwrap_or_default();
        let second = h.screen.grid().cell(0, 1).copied().unwrap_or_default();
        assert_eq!((first.ch, second.ch), ('A', 'A'));
        assert!(first.attrs.flags.contains(AttrFlags::REVERSE));
        assert!(!second.attrs.flags.contains(AttrFlags::REVERSE));
    }

    #[test]
    fn escape_prints_next_control() {
        let mut h = harness();
        h.feed(&[0x1b, 0x1c, 0x1b, 0x7d]);
        assert_eq!(h.text(0), "↑↰");
        assert!(h.parser.in_ground());
    }

    #[test]
    fn cursor_codes_and_backspace() {
        let mut h = harness();
        h.feed(b"abc\x1e\x1e\x7e");
        assert_eq!(h.text(0), " bc");
        assert_eq!(h.cursor(), (0, 0));
        h.feed(&[0x1d, 0x1f, 0x1f, 0x1c]);
        assert_eq!(h.cursor(), (0, 2));
    }

    #[test]
    fn tabs_and_clear() {
        let mut h = harness();
        h.feed(&[0x7f]);
        assert_eq!(h.cursor(), (0, 8));
        h.feed(&[0x1e, 0x1e, 0x9f, 0x9b, 0x7f]);
        assert_eq!(h.cursor(), (1, 6));
        h.feed(b"x\x7d");
        assert_eq!(h.text(1), "");
        assert_eq!(h.cursor(), (0, 0));
    }

    #[test]
    fn line_and_char_editing() {
        let mut h = harness();
        h.feed(b"one\x9btwo\x1c\x9d");
        assert_eq!(h.text(0), "");
        assert_eq!(h.text(1), "one");
        assert_eq!(h.text(2), "two");
        h.feed(b"\x1d\x9c");
        assert_eq!(h.text(1), "two");
        h.feed(&[0x1e, 0x1e, 0x1e, 0xff, 0xfe, 0xfe]);
        assert_eq!(h.text(1), "wo");
        h.feed(&[0xfd]);
        assert_eq!(h.host.drain_events(), vec![HostEvent::Bell]);
    }
}
