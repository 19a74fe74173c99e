//! PETSCII (Commodore 64).
//!
//! Printable bytes are mapped into one of four Private Use Area banks chosen
//! by the current case set and reverse state, see
//! [`petscii_to_pua`](crate::charset::petscii_to_pua). Control bytes move the
//! cursor, switch case and reverse, and select colors. `ESC` starts an ANSI
//! sequence when the fallback is enabled.

use crate::cell::{AttrFlags, Color};
use crate::charset::petscii_to_pua;
use crate::host::HostEvent;

use super::ansi::AnsiParser;
use super::{Context, EmulationParser, ParseResult};

/// C64 palette byte to the nearest PC color, with the bright half as bold.
fn palette(byte: u8) -> Option<(Color, bool)> {
    let color = match byte {
        0x05 => (Color::White, true),
        0x1c => (Color::Red, false),
        0x1e => (Color::Green, false),
        0x1f => (Color::Blue, false),
        0x81 => (Color::Red, false),
        0x90 => (Color::Black, false),
        0x95 => (Color::Yellow, false),
        0x96 => (Color::Red, true),
        0x97 => (Color::Black, true),
        0x98 => (Color::White, false),
        0x99 => (Color::Green, true),
        0x9a => (Color::Blue, true),
        0x9b => (Color::White, false),
        0x9c => (Color::Magenta, false),
        0x9e => (Color::Yellow, true),
        0x9f => (Color::Cyan, false),
        _ => return None,
    };
    Some(color)
}

#[derive(Debug, Default, Clone)]
pub struct PetsciiParser {
    lowercase: bool,
    reverse: bool,
    /// `0x08` locks out case switching until `0x09`.
    case_locked: bool,
    ansi: AnsiParser,
}

impl PetsciiParser {
    #[must_use]
    pub fn lowercase(&self) -> bool {
        self.lowercase
    }

    #[must_use]
    pub fn reverse(&self) -> bool {
        self.reverse
    }
}

impl EmulationParser for PetsciiParser {
    fn parse(&mut self, byte: u8, ctx: &mut Context<'_>) -> ParseResult {
        if !self.ansi.in_ground() {
            return self.ansi.parse(byte, ctx);
        }
        if let Some((color, bright)) = palette(byte) {
            if ctx.config.petscii_color_sgr {
                let attrs = &mut ctx.screen.status_mut().current_color;
                // Reverse glyphs draw their ink in the background color.
                if self.reverse {
                    attrs.bg = color;
                } else {
                    attrs.fg = color;
                    attrs.flags.set(AttrFlags::BOLD, bright);
                }
            }
            return ParseResult::NoCharYet;
        }
        let screen = &mut *ctx.screen;
        match byte {
            0x1b if ctx.config.petscii_ansi_fallback => return self.ansi.parse(byte, ctx),
            0x07 => ctx.host.event(HostEvent::Bell),
            0x08 => self.case_locked = true,
            0x09 => self.case_locked = false,
            0x0d | 0x8d => {
                screen.cursor_carriage_return();
                screen.cursor_linefeed(false);
                self.reverse = false;
            }
            0x0e if !self.case_locked => self.lowercase = true,
            0x8e if !self.case_locked => self.lowercase = false,
            0x11 => screen.cursor_linefeed(false),
            0x91 => screen.cursor_up(1, false),
            0x1d => screen.cursor_right(1, false),
            0x9d => screen.cursor_left(1, false),
            0x12 => self.reverse = true,
            0x92 => self.reverse = false,
            0x13 => screen.home_cursor(),
            0x93 => screen.clear_screen(),
            0x14 => {
                if screen.status().cursor_x > 0 {
                    screen.cursor_left(1, false);
                    screen.delete_character(1);
                }
            }
            0x94 => screen.insert_blanks(1),
            _ => {
                if let Some(ch) = petscii_to_pua(byte, self.lowercase, self.reverse) {
                    return ParseResult::OneChar(ch);
                }
            }
        }
        ParseResult::NoCharYet
    }

    fn next_buffered(&mut self, ctx: &mut Context<'_>) -> Option<char> {
        self.ansi.next_buffered(ctx)
    }

    fn in_ground(&self) -> bool {
        self.ansi.in_ground()
    }

    fn reset(&mut self, ctx: &mut Context<'_>) {
        self.lowercase = false;
        self.reverse = false;
        self.case_locked = false;
        self.ansi.reset(ctx);
        if !ctx.config.petscii_wide_font {
            ctx.host.event(HostEvent::DoubleWidthFont(true));
        }
    }
}
