//! DEBUG: every byte becomes part of a hex dump.
//!
//! ```text
//!  00000000 | 48 65 6C 6C-6F 0D 0A 1B 5B 32 4A 1B-5B 31 3B 31 | Hello...[2J.[1;1
//! ```
//!
//! The character column is written once a row holds sixteen bytes, and the
//! offset prefix of the following row goes out right after it, leaving the
//! cursor where the next byte's hex lands. A partial row is completed when the
//! emulation is switched away. Bytes echoed locally are drawn in a different
//! color.

use crate::cell::{AttrFlags, CellAttrs, Color};
use crate::screen::Screen;

use super::{Context, EmulationParser, ParseResult};

pub const BYTES_PER_ROW: usize = 16;

/// Width of `" 00000000 | "`.
pub const PREFIX_WIDTH: u16 = 12;

const REMOTE_COLOR: CellAttrs = CellAttrs {
    fg: Color::White,
    bg: Color::Black,
    flags: AttrFlags::empty(),
};

const LOCAL_COLOR: CellAttrs = CellAttrs {
    fg: Color::Yellow,
    bg: Color::Black,
    flags: AttrFlags::BOLD,
};

#[derive(Debug, Default, Clone)]
pub struct DebugParser {
    /// Offset of the first byte of the current row.
    offset: u64,
    /// Bytes of the current row with their local-echo flag.
    row: Vec<(u8, bool)>,
    prefix_written: bool,
}

fn write_str(screen: &mut Screen, text: &str, attrs: CellAttrs) {
    screen.status_mut().current_color = attrs;
    for ch in text.chars() {
        screen.print_character(ch);
    }
}

fn printable(byte: u8) -> char {
    if (0x20..0x7f).contains(&byte) {
        byte as char
    } else {
        '.'
    }
}

fn separator(index: usize) -> char {
    if index == 3 || index == 11 { '-' } else { ' ' }
}

impl DebugParser {
    /// Bytes recorded in the unfinished row.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.row.len()
    }

    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Add one byte to the dump.
    pub fn record(&mut self, byte: u8, local: bool, screen: &mut Screen) {
        if !self.prefix_written {
            self.write_prefix(screen);
        }
        let color = if local { LOCAL_COLOR } else { REMOTE_COLOR };
        let index = self.row.len();
        let hex = format!("{byte:02X}{}", separator(index));
        write_str(screen, &hex, color);
        self.row.push((byte, local));
        if self.row.len() == BYTES_PER_ROW {
            self.finish_row(screen);
            self.write_prefix(screen);
        }
    }

    fn write_prefix(&mut self, screen: &mut Screen) {
        write_str(screen, &format!(" {:08x} | ", self.offset), REMOTE_COLOR);
        self.prefix_written = true;
    }

    /// Write the character column of a partial row, padding the hex area.
    pub fn flush(&mut self, screen: &mut Screen) {
        if self.row.is_empty() {
            return;
        }
        let missing = BYTES_PER_ROW - self.row.len();
        write_str(screen, &"   ".repeat(missing), REMOTE_COLOR);
        self.finish_row(screen);
    }

    fn finish_row(&mut self, screen: &mut Screen) {
        write_str(screen, "| ", REMOTE_COLOR);
        for (byte, local) in std::mem::take(&mut self.row) {
            let color = if local { LOCAL_COLOR } else { REMOTE_COLOR };
            write_str(screen, &printable(byte).to_string(), color);
            self.offset += 1;
        }
        screen.cursor_carriage_return();
        screen.cursor_linefeed(false);
        screen.status_mut().current_color = REMOTE_COLOR;
        self.prefix_written = false;
    }
}

impl EmulationParser for DebugParser {
    fn parse(&mut self, byte: u8, ctx: &mut Context<'_>) -> ParseResult {
        self.record(byte, false, ctx.screen);
        ParseResult::NoCharYet
    }

    fn reset(&mut self, _ctx: &mut Context<'_>) {
        self.offset = 0;
        self.row.clear();
        self.prefix_written = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulation::Emulation;
    use crate::row::Row;

    fn screen() -> Screen {
        Screen::new(80, 5, 10, Emulation::Debug)
    }

    fn text(screen: &Screen, row: u16) -> String {
        screen.grid().row(row).map(Row::text).unwrap_or_default()
    }

    #[test]
    fn full_row_layout() {
        let mut s = screen();
        let mut parser = DebugParser::default();
        for byte in b"Hello\r\n\x1b[2J\x1b[1;1" {
            parser.record(*byte, false, &mut s);
        }
        assert_eq!(
            text(&s, 0),
            " 00000000 | 48 65 6C 6C-6F 0D 0A 1B 5B 32 4A 1B-5B 31 3B 31 | Hello...[2J.[1;1"
        );
        assert_eq!(parser.pending(), 0);
        assert_eq!(parser.offset(), 16);
        assert_eq!(text(&s, 1), " 00000010 | ");
        assert_eq!((s.status().cursor_y, s.status().cursor_x), (1, PREFIX_WIDTH));
    }

    #[test]
    fn next_row_starts_with_offset() {
        let mut s = screen();
        let mut parser = DebugParser::default();
        for byte in 0..17u8 {
            parser.record(byte, false, &mut s);
        }
        assert_eq!(text(&s, 1), " 00000010 | 10 ");
        assert_eq!(s.status().cursor_x, PREFIX_WIDTH + 3);
    }

    #[test]
    fn flush_pads_partial_row() {
        let mut s = screen();
        let mut parser = DebugParser::default();
        parser.record(b'A', false, &mut s);
        parser.record(b'b', true, &mut s);
        parser.flush(&mut s);
        let row = text(&s, 0);
        assert!(row.starts_with(" 00000000 | 41 62 "));
        assert!(row.ends_with("| Ab"));
        assert_eq!(row.chars().count(), 12 + 48 + 2 + 2);
        let local = s.grid().cell(0, 15).copied().unwrap_or_default();
        assert_eq!(local.attrs.fg, Color::Yellow);
        parser.flush(&mut s);
        assert_eq!(s.status().cursor_y, 1);
    }
}
