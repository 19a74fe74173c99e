//! TTY: a dumb terminal that knows a handful of control characters.
//!
//! Printing `_` over a non-blank cell underlines it instead of replacing it,
//! so `a BS _` renders as an underlined `a`.

use crate::cell::AttrFlags;
use crate::host::HostEvent;

use super::{Context, EmulationParser, ParseResult};

/// TTY keeps no state of its own.
#[derive(Debug, Default, Clone)]
pub struct TtyParser;

impl EmulationParser for TtyParser {
    fn parse(&mut self, byte: u8, ctx: &mut Context<'_>) -> ParseResult {
        let screen = &mut *ctx.screen;
        match byte {
            0x00 if !screen.status().display_null => {}
            0x07 => ctx.host.event(HostEvent::Bell),
            0x08 => screen.cursor_left(1, false),
            0x09 => {
                let x = screen.status().cursor_x;
                screen.cursor_column((x / 8 + 1) * 8);
            }
            0x0a | 0x0b => {
                let new_line_mode = screen.status().new_line_mode;
                screen.cursor_linefeed(new_line_mode);
            }
            0x0c => screen.cursor_formfeed(),
            0x0d => screen.cursor_carriage_return(),
            b'_' => {
                if screen.status().pending_wrap || !screen.decorate_cell(AttrFlags::UNDERLINE) {
                    return ParseResult::OneChar('_');
                }
                screen.cursor_right(1, false);
            }
            _ => return ParseResult::OneChar(screen.status().codepage.decode(byte)),
        }
        ParseResult::NoCharYet
    }

    fn reset(&mut self, _ctx: &mut Context<'_>) {}
}
