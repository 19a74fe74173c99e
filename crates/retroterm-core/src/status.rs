//! Cursor position, scroll region and the display flags shared by every
//! emulation.

use crate::cell::CellAttrs;
use crate::charset::Codepage;
use crate::emulation::Emulation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalStatus {
    pub cursor_x: u16,
    pub cursor_y: u16,
    /// First row of the scroll region.
    pub scroll_region_top: u16,
    /// Last row of the scroll region (inclusive).
    pub scroll_region_bottom: u16,
    pub current_color: CellAttrs,
    /// IRM: printed characters shift the rest of the line right.
    pub insert_mode: bool,
    /// DECAWM.
    pub line_wrap: bool,
    /// DECOM.
    pub origin_mode: bool,
    /// DECSCNM.
    pub reverse_video: bool,
    pub visible_cursor: bool,
    pub hard_backspace: bool,
    /// Print NUL bytes as blanks instead of dropping them.
    pub display_null: bool,
    /// False when SRM requests local echo.
    pub full_duplex: bool,
    /// LNM: linefeed also returns the carriage.
    pub new_line_mode: bool,
    /// The last print landed in the right margin; the next one wraps first.
    pub pending_wrap: bool,
    pub emulation: Emulation,
    pub codepage: Codepage,
}

impl TerminalStatus {
    #[must_use]
    pub fn new(emulation: Emulation, visible_height: u16) -> Self {
        Self {
            cursor_x: 0,
            cursor_y: 0,
            scroll_region_top: 0,
            scroll_region_bottom: visible_height.saturating_sub(1),
            current_color: CellAttrs::default(),
            insert_mode: false,
            line_wrap: true,
            origin_mode: false,
            reverse_video: false,
            visible_cursor: true,
            hard_backspace: false,
            display_null: false,
            full_duplex: true,
            new_line_mode: false,
            pending_wrap: false,
            emulation,
            codepage: emulation.default_codepage(),
        }
    }
}
