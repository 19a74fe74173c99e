//! Screen primitives.
//!
//! [`Screen`] owns the visible [`Grid`], the [`Scrollback`], the shared
//! [`TerminalStatus`] and the tab-stop list. Every parser drives the display
//! exclusively through the operations here, which keep the cursor inside the
//! screen and, under origin mode, inside the scroll region.

use crate::capture::Capture;
use crate::cell::{AttrFlags, CellAttrs};
use crate::emulation::Emulation;
use crate::grid::Grid;
use crate::row::{DoubleHeight, Row};
use crate::scrollback::Scrollback;
use crate::status::TerminalStatus;

/// Default distance between tab stops.
pub const DEFAULT_TAB_INTERVAL: u16 = 8;

#[derive(Debug)]
pub struct Screen {
    grid: Grid,
    scrollback: Scrollback,
    status: TerminalStatus,
    tab_stops: Vec<u16>,
    pub(crate) capture: Capture,
}

impl Screen {
    #[must_use]
    pub fn new(width: u16, height: u16, scrollback_max: usize, emulation: Emulation) -> Self {
        Self {
            grid: Grid::new(width, height),
            scrollback: Scrollback::new(scrollback_max),
            status: TerminalStatus::new(emulation, height),
            tab_stops: default_tab_stops(width),
            capture: Capture::default(),
        }
    }

    #[must_use]
    pub fn width(&self) -> u16 {
        self.grid.width()
    }

    #[must_use]
    pub fn height(&self) -> u16 {
        self.grid.height()
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub fn scrollback(&self) -> &Scrollback {
        &self.scrollback
    }

    #[must_use]
    pub fn status(&self) -> &TerminalStatus {
        &self.status
    }

    pub(crate) fn status_mut(&mut self) -> &mut TerminalStatus {
        &mut self.status
    }

    #[must_use]
    pub fn right_margin(&self) -> u16 {
        self.width().saturating_sub(1)
    }

    /// Last printable column of the cursor row; a double-width row holds
    /// half as many characters.
    fn print_margin(&self) -> u16 {
        match self.current_row() {
            Some(row) if row.double_width() => (self.width() / 2).saturating_sub(1),
            _ => self.right_margin(),
        }
    }

    fn bottom_row(&self) -> u16 {
        self.height().saturating_sub(1)
    }

    fn current_row_mut(&mut self) -> Option<&mut Row> {
        self.grid.row_mut(self.status.cursor_y)
    }

    #[must_use]
    pub fn current_row(&self) -> Option<&Row> {
        self.grid.row(self.status.cursor_y)
    }

    /// Attributes for newly written cells, with screen-wide reverse applied.
    #[must_use]
    pub fn write_attrs(&self) -> CellAttrs {
        let mut attrs = self.status.current_color;
        if self.status.reverse_video {
            attrs.flags.toggle(AttrFlags::REVERSE);
        }
        attrs
    }

    /// Attributes for erased cells: current colors without text decorations.
    fn blank_attrs(&self) -> CellAttrs {
        let mut attrs = self.write_attrs();
        attrs.flags &= AttrFlags::REVERSE | AttrFlags::BOLD;
        attrs
    }

    // ── Printing ────────────────────────────────────────────────────

    /// Write `ch` at the cursor and advance.
    ///
    /// A character landing in the right margin with autowrap on leaves the
    /// cursor there with a pending wrap; the next printed character starts
    /// the following line.
    pub fn print_character(&mut self, ch: char) {
        if self.status.pending_wrap {
            self.status.pending_wrap = false;
            if self.status.line_wrap {
                self.status.cursor_x = 0;
                self.cursor_linefeed(false);
            }
        }
        let attrs = self.write_attrs();
        let blank = self.blank_attrs();
        let margin = self.print_margin();
        let x = self.status.cursor_x.min(margin);
        let insert = self.status.insert_mode;
        if let Some(row) = self.current_row_mut() {
            if insert {
                row.insert_blanks(x, 1, blank);
            }
            row.put(x, ch, attrs);
        }
        self.capture.on_print(ch, attrs);
        if x >= margin {
            self.status.cursor_x = margin;
            if self.status.line_wrap {
                self.status.pending_wrap = true;
            }
        } else {
            self.status.cursor_x = x + 1;
        }
    }

    /// Apply a cell-level attribute change to the cell under the cursor
    /// without moving it (TTY overstrike).
    pub fn decorate_cell(&mut self, flags: AttrFlags) -> bool {
        let x = self.status.cursor_x;
        let Some(cell) = self.current_row_mut().and_then(|row| row.cell_mut(x)) else {
            return false;
        };
        if cell.is_blank() {
            return false;
        }
        cell.attrs.flags |= flags;
        true
    }

    // ── Cursor motion ───────────────────────────────────────────────

    pub fn cursor_up(&mut self, n: u16, honor_scroll_region: bool) {
        self.status.pending_wrap = false;
        let honor = honor_scroll_region || self.status.origin_mode;
        let top = if honor && self.status.cursor_y >= self.status.scroll_region_top {
            self.status.scroll_region_top
        } else {
            0
        };
        self.status.cursor_y = self.status.cursor_y.saturating_sub(n).max(top);
    }

    pub fn cursor_down(&mut self, n: u16, honor_scroll_region: bool) {
        self.status.pending_wrap = false;
        let honor = honor_scroll_region || self.status.origin_mode;
        let bottom = if honor && self.status.cursor_y <= self.status.scroll_region_bottom {
            self.status.scroll_region_bottom
        } else {
            self.bottom_row()
        };
        self.status.cursor_y = self.status.cursor_y.saturating_add(n).min(bottom);
    }

    pub fn cursor_left(&mut self, n: u16, _honor_scroll_region: bool) {
        self.status.pending_wrap = false;
        self.status.cursor_x = self.status.cursor_x.saturating_sub(n);
    }

    pub fn cursor_right(&mut self, n: u16, _honor_scroll_region: bool) {
        self.status.pending_wrap = false;
        self.status.cursor_x = self.status.cursor_x.saturating_add(n).min(self.right_margin());
    }

    /// Move to `(row, col)`, 0-indexed. Under origin mode the row is relative
    /// to the scroll region and clamped inside it.
    pub fn cursor_position(&mut self, row: u16, col: u16) {
        self.status.pending_wrap = false;
        self.status.cursor_y = if self.status.origin_mode {
            row.saturating_add(self.status.scroll_region_top)
                .min(self.status.scroll_region_bottom)
        } else {
            row.min(self.bottom_row())
        };
        self.status.cursor_x = col.min(self.right_margin());
    }

    /// Column-only move (CHA/HPA).
    pub fn cursor_column(&mut self, col: u16) {
        self.status.pending_wrap = false;
        self.status.cursor_x = col.min(self.right_margin());
    }

    /// Row-only move (VPA), honoring origin mode.
    pub fn cursor_row(&mut self, row: u16) {
        let col = self.status.cursor_x;
        self.cursor_position(row, col);
    }

    pub fn home_cursor(&mut self) {
        self.cursor_position(0, 0);
    }

    /// Move down one line, scrolling the region when at its bottom.
    pub fn cursor_linefeed(&mut self, new_line_mode: bool) {
        self.status.pending_wrap = false;
        if self.status.cursor_y == self.status.scroll_region_bottom {
            let top = self.status.scroll_region_top;
            let bottom = self.status.scroll_region_bottom;
            self.scrolling_region_scroll_up(top, bottom, 1);
        } else if self.status.cursor_y < self.bottom_row() {
            self.status.cursor_y += 1;
        }
        if new_line_mode {
            self.status.cursor_x = 0;
        }
        self.capture.on_newline();
    }

    /// RI: move up one line, scrolling the region down when at its top.
    pub fn cursor_reverse_linefeed(&mut self) {
        self.status.pending_wrap = false;
        if self.status.cursor_y == self.status.scroll_region_top {
            let top = self.status.scroll_region_top;
            let bottom = self.status.scroll_region_bottom;
            self.scrolling_region_scroll_down(top, bottom, 1);
        } else {
            self.status.cursor_y = self.status.cursor_y.saturating_sub(1);
        }
    }

    pub fn cursor_carriage_return(&mut self) {
        self.status.pending_wrap = false;
        self.status.cursor_x = 0;
    }

    /// Clear the visible screen, rolling it into scrollback, and home.
    pub fn cursor_formfeed(&mut self) {
        let attrs = self.blank_attrs();
        let height = self.height();
        self.grid
            .scroll_up_into(0, height, height, &mut self.scrollback, attrs);
        self.status.pending_wrap = false;
        self.status.cursor_x = 0;
        self.status.cursor_y = 0;
    }

    // ── Erase ───────────────────────────────────────────────────────

    /// Erase columns `from_col..=to_col` of the cursor row.
    pub fn erase_line(&mut self, from_col: u16, to_col: u16, honor_protected: bool) {
        let attrs = self.blank_attrs();
        if let Some(row) = self.current_row_mut() {
            row.erase(from_col, to_col, attrs, honor_protected);
        }
    }

    /// Erase the rectangle `(from_row, from_col)..=(to_row, to_col)`.
    pub fn erase_screen(
        &mut self,
        from_row: u16,
        from_col: u16,
        to_row: u16,
        to_col: u16,
        honor_protected: bool,
    ) {
        let attrs = self.blank_attrs();
        self.grid
            .erase_rect(from_row, from_col, to_row, to_col, attrs, honor_protected);
    }

    /// ED 0: cursor to end of screen.
    pub fn erase_below(&mut self, honor_protected: bool) {
        let right = self.right_margin();
        let bottom = self.bottom_row();
        let (x, y) = (self.status.cursor_x, self.status.cursor_y);
        self.erase_line(x, right, honor_protected);
        if y < bottom {
            self.erase_screen(y + 1, 0, bottom, right, honor_protected);
        }
    }

    /// ED 1: start of screen to cursor.
    pub fn erase_above(&mut self, honor_protected: bool) {
        let right = self.right_margin();
        let (x, y) = (self.status.cursor_x, self.status.cursor_y);
        if y > 0 {
            self.erase_screen(0, 0, y - 1, right, honor_protected);
        }
        self.erase_line(0, x, honor_protected);
    }

    /// ED 2.
    pub fn erase_all(&mut self, honor_protected: bool) {
        let right = self.right_margin();
        let bottom = self.bottom_row();
        self.erase_screen(0, 0, bottom, right, honor_protected);
    }

    /// Erase everything, drop line-size marks and home the cursor.
    pub fn clear_screen(&mut self) {
        let attrs = self.blank_attrs();
        self.grid.clear(attrs);
        self.home_cursor();
    }

    // ── Character insert/delete ─────────────────────────────────────

    pub fn insert_blanks(&mut self, n: u16) {
        let attrs = self.blank_attrs();
        let x = self.status.cursor_x;
        if let Some(row) = self.current_row_mut() {
            row.insert_blanks(x, n, attrs);
        }
    }

    pub fn delete_character(&mut self, n: u16) {
        let attrs = self.blank_attrs();
        let x = self.status.cursor_x;
        if let Some(row) = self.current_row_mut() {
            row.delete_chars(x, n, attrs);
        }
    }

    // ── Scrolling ───────────────────────────────────────────────────

    /// Scroll rows `top..=bottom` up by `n`. Rows leaving the top of the
    /// screen are appended to scrollback.
    pub fn scrolling_region_scroll_up(&mut self, top: u16, bottom: u16, n: u16) {
        if top >= bottom || bottom > self.bottom_row() {
            return;
        }
        let attrs = self.blank_attrs();
        if top == 0 {
            self.grid
                .scroll_up_into(top, bottom + 1, n, &mut self.scrollback, attrs);
        } else {
            self.grid.scroll_up(top, bottom + 1, n, attrs);
        }
    }

    /// Scroll rows `top..=bottom` down by `n`.
    pub fn scrolling_region_scroll_down(&mut self, top: u16, bottom: u16, n: u16) {
        if top >= bottom || bottom > self.bottom_row() {
            return;
        }
        let attrs = self.blank_attrs();
        self.grid.scroll_down(top, bottom + 1, n, attrs);
    }

    /// IL at the cursor row; ignored outside the scroll region.
    pub fn insert_lines(&mut self, n: u16) {
        let attrs = self.blank_attrs();
        let (top, bottom) = (self.status.scroll_region_top, self.status.scroll_region_bottom);
        self.grid
            .insert_lines(self.status.cursor_y, n, top, bottom + 1, attrs);
    }

    /// DL at the cursor row; ignored outside the scroll region.
    pub fn delete_lines(&mut self, n: u16) {
        let attrs = self.blank_attrs();
        let (top, bottom) = (self.status.scroll_region_top, self.status.scroll_region_bottom);
        self.grid
            .delete_lines(self.status.cursor_y, n, top, bottom + 1, attrs);
    }

    /// Shift a rectangular window (AVATAR area scroll).
    pub fn scroll_window(&mut self, top: u16, left: u16, bottom: u16, right: u16, rows: i32, cols: i32) {
        let attrs = self.blank_attrs();
        self.grid
            .shift_rect(top, left, bottom, right, rows, cols, attrs);
    }

    /// Fill a rectangle with `ch` in `attrs` (AVATAR area fill).
    pub fn fill_window(&mut self, top: u16, left: u16, bottom: u16, right: u16, ch: char, attrs: CellAttrs) {
        let right = right.min(self.right_margin());
        let bottom = bottom.min(self.bottom_row());
        for r in top..=bottom {
            if let Some(row) = self.grid.row_mut(r) {
                if ch == ' ' {
                    row.erase(left, right, attrs, false);
                } else {
                    for c in left..=right {
                        row.put(c, ch, attrs);
                    }
                }
            }
        }
    }

    /// DECSTBM with 0-indexed inclusive rows. Invalid regions are ignored.
    pub fn set_scroll_region(&mut self, top: u16, bottom: u16) -> bool {
        let bottom = bottom.min(self.bottom_row());
        if top >= bottom {
            return false;
        }
        self.status.scroll_region_top = top;
        self.status.scroll_region_bottom = bottom;
        true
    }

    pub fn reset_scroll_region(&mut self) {
        self.status.scroll_region_top = 0;
        self.status.scroll_region_bottom = self.bottom_row();
    }

    // ── Line attributes ─────────────────────────────────────────────

    pub fn set_double_width(&mut self, on: bool) {
        if let Some(row) = self.current_row_mut() {
            row.set_double_width(on);
        }
    }

    pub fn set_double_height(&mut self, half: DoubleHeight) {
        if let Some(row) = self.current_row_mut() {
            row.set_double_width(half != DoubleHeight::None);
            row.set_double_height(half);
        }
    }

    /// DECALN.
    pub fn fill_alignment(&mut self) {
        let attrs = CellAttrs::default();
        self.grid.fill_all('E', attrs);
    }

    // ── Screen-wide reverse ─────────────────────────────────────────

    /// Enter DECSCNM: flip every cell on screen and in scrollback.
    pub fn invert_scrollback_colors(&mut self) {
        if self.status.reverse_video {
            return;
        }
        self.status.reverse_video = true;
        self.flip_all();
    }

    /// Leave DECSCNM.
    pub fn deinvert_scrollback_colors(&mut self) {
        if !self.status.reverse_video {
            return;
        }
        self.status.reverse_video = false;
        self.flip_all();
    }

    fn flip_all(&mut self) {
        for row in self.grid.rows_mut() {
            row.invert();
        }
        for row in self.scrollback.iter_mut() {
            row.invert();
        }
    }

    // ── Tab stops ───────────────────────────────────────────────────

    #[must_use]
    pub fn tab_stops(&self) -> &[u16] {
        &self.tab_stops
    }

    /// Column of the next tab stop right of the cursor, or the right margin.
    #[must_use]
    pub fn next_tab_stop(&self) -> u16 {
        let x = self.status.cursor_x;
        self.tab_stops
            .iter()
            .copied()
            .find(|&stop| stop > x)
            .unwrap_or(self.right_margin())
            .min(self.right_margin())
    }

    /// Column of the previous tab stop left of the cursor, or 0.
    #[must_use]
    pub fn prev_tab_stop(&self) -> u16 {
        let x = self.status.cursor_x;
        self.tab_stops
            .iter()
            .rev()
            .copied()
            .find(|&stop| stop < x)
            .unwrap_or(0)
    }

    pub fn set_tab_stop(&mut self) {
        let x = self.status.cursor_x;
        if let Err(pos) = self.tab_stops.binary_search(&x) {
            self.tab_stops.insert(pos, x);
        }
    }

    pub fn clear_tab_stop(&mut self) {
        let x = self.status.cursor_x;
        self.tab_stops.retain(|&stop| stop != x);
    }

    pub fn clear_all_tab_stops(&mut self) {
        self.tab_stops.clear();
    }

    pub fn reset_tab_stops(&mut self) {
        self.tab_stops = default_tab_stops(self.width());
    }

    // ── Reset / geometry ────────────────────────────────────────────

    /// DECCOLM: change the logical width, clear, reset the region and home.
    pub fn set_columns(&mut self, width: u16) {
        let attrs = self.blank_attrs();
        self.grid.resize_width(width, attrs);
        self.grid.clear(attrs);
        self.reset_scroll_region();
        self.reset_tab_stops();
        self.home_cursor();
    }

    /// Restore default colors, region, modes and tab stops. Screen contents
    /// and scrollback are kept.
    pub fn reset_modes(&mut self) {
        let emulation = self.status.emulation;
        let codepage = self.status.codepage;
        let hard_backspace = self.status.hard_backspace;
        let was_reversed = self.status.reverse_video;
        let height = self.height();
        self.status = TerminalStatus::new(emulation, height);
        self.status.codepage = codepage;
        self.status.hard_backspace = hard_backspace;
        self.status.reverse_video = was_reversed;
        self.deinvert_scrollback_colors();
        self.reset_tab_stops();
    }

    pub fn clear_scrollback(&mut self) {
        self.scrollback.clear();
    }
}

fn default_tab_stops(width: u16) -> Vec<u16> {
    (DEFAULT_TAB_INTERVAL..width)
        .step_by(DEFAULT_TAB_INTERVAL as usize)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Color;

    fn screen() -> Screen {
        Screen::new(10, 5, 100, Emulation::Vt102)
    }

    fn print(screen: &mut Screen, text: &str) {
        for ch in text.chars() {
            screen.print_character(ch);
        }
    }

    fn row_text(screen: &Screen, row: u16) -> String {
        screen.grid().row(row).map(Row::text).unwrap_or_default()
    }

    #[test]
    fn print_advances_and_defers_wrap() {
        let mut s = screen();
        print(&mut s, "0123456789");
        assert_eq!(s.status().cursor_x, 9);
        assert!(s.status().pending_wrap);
        print(&mut s, "A");
        assert_eq!(row_text(&s, 0), "0123456789");
        assert_eq!(row_text(&s, 1), "A");
        assert_eq!((s.status().cursor_y, s.status().cursor_x), (1, 1));
    }

    #[test]
    fn no_wrap_overwrites_last_column() {
        let mut s = screen();
        s.status_mut().line_wrap = false;
        print(&mut s, "0123456789XY");
        assert_eq!(row_text(&s, 0), "012345678Y");
        assert_eq!(s.status().cursor_x, 9);
    }

    #[test]
    fn insert_mode_shifts_right() {
        let mut s = screen();
        print(&mut s, "abc");
        s.cursor_column(1);
        s.status_mut().insert_mode = true;
        print(&mut s, "X");
        assert_eq!(row_text(&s, 0), "aXbc");
    }

    #[test]
    fn cursor_up_honors_region_only_inside_it() {
        let mut s = screen();
        s.set_scroll_region(1, 3);
        s.cursor_position(2, 0);
        s.cursor_up(5, true);
        assert_eq!(s.status().cursor_y, 1);
        s.cursor_position(2, 0);
        s.cursor_up(5, false);
        assert_eq!(s.status().cursor_y, 0);
        s.cursor_position(4, 0);
        s.cursor_up(1, true);
        assert_eq!(s.status().cursor_y, 3);
    }

    #[test]
    fn cursor_down_clamps_to_region_bottom() {
        let mut s = screen();
        s.set_scroll_region(0, 2);
        s.cursor_down(9, true);
        assert_eq!(s.status().cursor_y, 2);
        s.cursor_down(9, false);
        assert_eq!(s.status().cursor_y, 4);
    }

    #[test]
    fn origin_mode_positions_relative_to_region() {
        let mut s = screen();
        s.set_scroll_region(1, 3);
        s.status_mut().origin_mode = true;
        s.cursor_position(0, 0);
        assert_eq!(s.status().cursor_y, 1);
        s.cursor_position(10, 20);
        assert_eq!((s.status().cursor_y, s.status().cursor_x), (3, 9));
    }

    #[test]
    fn linefeed_at_bottom_scrolls_into_scrollback() {
        let mut s = screen();
        print(&mut s, "top");
        s.cursor_position(4, 0);
        s.cursor_linefeed(false);
        assert_eq!(s.status().cursor_y, 4);
        assert_eq!(s.scrollback().len(), 1);
        assert_eq!(s.scrollback().get(0).map(Row::text).as_deref(), Some("top"));
        assert_eq!(row_text(&s, 0), "");
    }

    #[test]
    fn linefeed_in_region_does_not_feed_scrollback() {
        let mut s = screen();
        s.set_scroll_region(1, 3);
        s.cursor_position(1, 0);
        print(&mut s, "mid");
        s.cursor_position(3, 0);
        s.cursor_linefeed(true);
        assert_eq!(s.scrollback().len(), 0);
        assert_eq!(row_text(&s, 1), "");
        assert_eq!(s.status().cursor_x, 0);
    }

    #[test]
    fn reverse_linefeed_scrolls_down_at_top() {
        let mut s = screen();
        print(&mut s, "first");
        s.cursor_reverse_linefeed();
        assert_eq!(row_text(&s, 0), "");
        assert_eq!(row_text(&s, 1), "first");
    }

    #[test]
    fn formfeed_rolls_screen_into_scrollback() {
        let mut s = screen();
        print(&mut s, "x");
        s.cursor_position(2, 3);
        s.cursor_formfeed();
        assert_eq!(s.scrollback().len(), 5);
        assert_eq!((s.status().cursor_y, s.status().cursor_x), (0, 0));
        assert!(s.grid().rows().all(|r| r.length() == 0));
    }

    #[test]
    fn erase_below_and_above() {
        let mut s = screen();
        for r in 0..5 {
            s.cursor_position(r, 0);
            print(&mut s, "abcdefghij");
        }
        s.cursor_position(2, 4);
        s.erase_below(false);
        assert_eq!(row_text(&s, 2), "abcd");
        assert_eq!(row_text(&s, 3), "");
        s.erase_above(false);
        assert_eq!(row_text(&s, 0), "");
        assert_eq!(row_text(&s, 2), "");
    }

    #[test]
    fn erase_uses_current_background() {
        let mut s = screen();
        s.status_mut().current_color.bg = Color::Blue;
        s.erase_all(false);
        assert!(s
            .grid()
            .rows()
            .all(|r| r.cells().iter().all(|c| c.attrs.bg == Color::Blue)));
    }

    #[test]
    fn invert_is_idempotent() {
        let mut s = screen();
        print(&mut s, "a");
        s.invert_scrollback_colors();
        s.invert_scrollback_colors();
        let cell = s.grid().cell(0, 0).copied().unwrap_or_default();
        assert!(cell.attrs.flags.contains(AttrFlags::REVERSE));
        s.deinvert_scrollback_colors();
        let cell = s.grid().cell(0, 0).copied().unwrap_or_default();
        assert!(!cell.attrs.flags.contains(AttrFlags::REVERSE));
    }

    #[test]
    fn tab_stops_default_every_eight() {
        let mut s = Screen::new(20, 5, 0, Emulation::Vt100);
        assert_eq!(s.tab_stops(), &[8, 16]);
        assert_eq!(s.next_tab_stop(), 8);
        s.cursor_column(16);
        assert_eq!(s.next_tab_stop(), 19);
        assert_eq!(s.prev_tab_stop(), 8);
        s.cursor_column(3);
        s.set_tab_stop();
        assert_eq!(s.tab_stops(), &[3, 8, 16]);
        s.clear_all_tab_stops();
        assert_eq!(s.next_tab_stop(), 19);
    }

    #[test]
    fn set_columns_clears_and_homes() {
        let mut s = screen();
        print(&mut s, "hello");
        s.set_scroll_region(1, 2);
        s.set_columns(132);
        assert_eq!(s.width(), 132);
        assert_eq!((s.status().cursor_y, s.status().cursor_x), (0, 0));
        assert_eq!(s.status().scroll_region_bottom, 4);
        assert_eq!(row_text(&s, 0), "");
    }

    #[test]
    fn invalid_scroll_region_is_ignored() {
        let mut s = screen();
        assert!(!s.set_scroll_region(3, 3));
        assert!(!s.set_scroll_region(4, 1));
        assert_eq!(s.status().scroll_region_bottom, 4);
        // A zero-height scroll is a no-op.
        s.scrolling_region_scroll_up(2, 2, 1);
    }

    #[test]
    fn double_height_marks_row() {
        let mut s = screen();
        s.set_double_height(DoubleHeight::Bottom);
        let row = s.current_row().expect("cursor row");
        assert!(row.double_width());
        assert_eq!(row.double_height(), DoubleHeight::Bottom);
    }

    #[test]
    fn double_width_row_wraps_at_half_width() {
        let mut s = screen();
        s.set_double_width(true);
        print(&mut s, "abcdefg");
        assert_eq!(row_text(&s, 0), "abcde");
        assert_eq!(row_text(&s, 1), "fg");
        assert_eq!(s.grid().row(0).map(Row::width), Some(10));

        s.cursor_position(2, 8);
        s.set_double_width(true);
        print(&mut s, "x");
        assert_eq!(row_text(&s, 2), "    x");
    }
}
