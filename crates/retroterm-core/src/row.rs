//! A single screen line.
//!
//! A row owns exactly `width` cells plus the bookkeeping the renderer needs:
//! how far the line has been written (`length`) and the DEC line-size marks
//! (DECDWL / DECDHL).

use crate::cell::{AttrFlags, Cell, CellAttrs, CellFlags};

/// DECDHL half carried by a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DoubleHeight {
    #[default]
    None,
    Top,
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    cells: Vec<Cell>,
    length: usize,
    double_width: bool,
    double_height: DoubleHeight,
}

impl Row {
    /// A row of `width` blanks with `attrs`.
    #[must_use]
    pub fn new(width: u16, attrs: CellAttrs) -> Self {
        Self {
            cells: vec![Cell::blank(attrs); width as usize],
            length: 0,
            double_width: false,
            double_height: DoubleHeight::None,
        }
    }

    #[must_use]
    pub fn width(&self) -> u16 {
        self.cells.len() as u16
    }

    /// Rightmost written column + 1, or 0 for an untouched row.
    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }

    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[must_use]
    pub fn cell(&self, col: u16) -> Option<&Cell> {
        self.cells.get(col as usize)
    }

    pub fn cell_mut(&mut self, col: u16) -> Option<&mut Cell> {
        self.cells.get_mut(col as usize)
    }

    #[must_use]
    pub fn double_width(&self) -> bool {
        self.double_width
    }

    #[must_use]
    pub fn double_height(&self) -> DoubleHeight {
        self.double_height
    }

    /// Text of the written part of the row.
    #[must_use]
    pub fn text(&self) -> String {
        self.cells[..self.length].iter().map(|c| c.ch).collect()
    }

    fn line_flags(&self) -> CellFlags {
        let mut flags = CellFlags::empty();
        if self.double_width {
            flags |= CellFlags::DOUBLE_WIDTH;
        }
        match self.double_height {
            DoubleHeight::None => {}
            DoubleHeight::Top => flags |= CellFlags::DOUBLE_HEIGHT_TOP,
            DoubleHeight::Bottom => flags |= CellFlags::DOUBLE_HEIGHT_BOTTOM,
        }
        flags
    }

    fn sync_flags(&mut self) {
        let flags = self.line_flags();
        for cell in &mut self.cells {
            cell.flags = flags;
        }
    }

    /// Write `ch` at `col`. Out-of-range columns are ignored.
    pub fn put(&mut self, col: u16, ch: char, attrs: CellAttrs) {
        let flags = self.line_flags();
        let c = col as usize;
        let Some(cell) = self.cells.get_mut(c) else {
            return;
        };
        *cell = Cell { ch, attrs, flags };
        self.length = self.length.max(c + 1);
    }

    /// Erase columns `from..=to` to blanks with `attrs`.
    ///
    /// With `honor_protected`, cells carrying the protected attribute are
    /// left untouched. Erasing the tail of the row shrinks `length`.
    pub fn erase(&mut self, from: u16, to: u16, attrs: CellAttrs, honor_protected: bool) {
        let width = self.cells.len();
        if width == 0 {
            return;
        }
        let from = from as usize;
        let to = (to as usize).min(width - 1);
        if from > to {
            return;
        }
        let mut last_kept = None;
        for (i, cell) in self.cells[from..=to].iter_mut().enumerate() {
            if honor_protected && cell.is_protected() {
                last_kept = Some(from + i);
                continue;
            }
            cell.erase(attrs);
        }
        if to + 1 >= self.length && from < self.length {
            self.length = last_kept.map_or(from, |col| col + 1);
        }
    }

    /// Erase the whole row and drop its line-size marks.
    pub fn clear(&mut self, attrs: CellAttrs) {
        for cell in &mut self.cells {
            *cell = Cell::blank(attrs);
        }
        self.length = 0;
        self.double_width = false;
        self.double_height = DoubleHeight::None;
    }

    /// ICH: insert `count` blanks at `col`, discarding cells pushed past the
    /// right edge.
    pub fn insert_blanks(&mut self, col: u16, count: u16, attrs: CellAttrs) {
        let width = self.cells.len();
        let c = col as usize;
        if c >= width || count == 0 {
            return;
        }
        let n = (count as usize).min(width - c);
        self.cells[c..].rotate_right(n);
        for cell in &mut self.cells[c..c + n] {
            cell.erase(attrs);
        }
        if c < self.length {
            self.length = (self.length + n).min(width);
        }
    }

    /// DCH: delete `count` cells at `col`; blanks enter from the right.
    pub fn delete_chars(&mut self, col: u16, count: u16, attrs: CellAttrs) {
        let width = self.cells.len();
        let c = col as usize;
        if c >= width || count == 0 {
            return;
        }
        let n = (count as usize).min(width - c);
        self.cells[c..].rotate_left(n);
        for cell in &mut self.cells[width - n..] {
            cell.erase(attrs);
        }
        if c < self.length {
            self.length = self.length.saturating_sub(n).max(c);
        }
    }

    pub fn set_double_width(&mut self, on: bool) {
        self.double_width = on;
        self.sync_flags();
    }

    pub fn set_double_height(&mut self, half: DoubleHeight) {
        self.double_height = half;
        self.sync_flags();
    }

    /// Toggle reverse video on every cell (DECSCNM).
    pub fn invert(&mut self) {
        for cell in &mut self.cells {
            cell.attrs.flags.toggle(AttrFlags::REVERSE);
        }
    }

    /// Change the width, truncating or padding with blanks.
    pub fn resize(&mut self, width: u16, attrs: CellAttrs) {
        let width = width as usize;
        let flags = self.line_flags();
        self.cells.resize(
            width,
            Cell {
                flags,
                ..Cell::blank(attrs)
            },
        );
        self.length = self.length.min(width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_with(text: &str, width: u16) -> Row {
        let mut row = Row::new(width, CellAttrs::default());
        for (i, ch) in text.chars().enumerate() {
            row.put(i as u16, ch, CellAttrs::default());
        }
        row
    }

    #[test]
    fn put_tracks_length() {
        let mut row = Row::new(10, CellAttrs::default());
        assert_eq!(row.length(), 0);
        row.put(4, 'x', CellAttrs::default());
        assert_eq!(row.length(), 5);
        row.put(1, 'y', CellAttrs::default());
        assert_eq!(row.length(), 5);
        row.put(10, 'z', CellAttrs::default());
        assert_eq!(row.length(), 5);
    }

    #[test]
    fn erase_tail_shrinks_length() {
        let mut row = row_with("abcdef", 10);
        row.erase(3, 9, CellAttrs::default(), false);
        assert_eq!(row.text(), "abc");
        assert_eq!(row.length(), 3);
    }

    #[test]
    fn erase_middle_keeps_length() {
        let mut row = row_with("abcdef", 10);
        row.erase(1, 2, CellAttrs::default(), false);
        assert_eq!(row.text(), "a  def");
        assert_eq!(row.length(), 6);
    }

    #[test]
    fn erase_honors_protected_cells() {
        let mut row = row_with("abcdef", 10);
        let mut protected = CellAttrs::default();
        protected.flags |= AttrFlags::PROTECTED;
        row.put(4, 'P', protected);
        row.erase(0, 9, CellAttrs::default(), true);
        assert_eq!(row.cell(4).map(|c| c.ch), Some('P'));
        assert_eq!(row.length(), 5);

        row.erase(0, 9, CellAttrs::default(), false);
        assert_eq!(row.length(), 0);
    }

    #[test]
    fn insert_blanks_shifts_right_and_drops_overflow() {
        let mut row = row_with("abcde", 5);
        row.insert_blanks(1, 2, CellAttrs::default());
        assert_eq!(row.text(), "a  bc");
        assert_eq!(row.length(), 5);
    }

    #[test]
    fn delete_chars_shifts_left() {
        let mut row = row_with("abcdef", 8);
        row.delete_chars(1, 2, CellAttrs::default());
        assert_eq!(row.text(), "adef");
        assert_eq!(row.cell(7).map(|c| c.ch), Some(' '));
    }

    #[test]
    fn line_size_marks_propagate_to_cells() {
        let mut row = row_with("ab", 4);
        row.set_double_width(true);
        row.set_double_height(DoubleHeight::Top);
        assert!(row.cells().iter().all(|c| c.flags
            == CellFlags::DOUBLE_WIDTH | CellFlags::DOUBLE_HEIGHT_TOP));
        row.put(3, 'z', CellAttrs::default());
        assert!(row.cell(3).is_some_and(|c| c.flags.contains(CellFlags::DOUBLE_WIDTH)));
        row.clear(CellAttrs::default());
        assert!(!row.double_width());
        assert_eq!(row.double_height(), DoubleHeight::None);
    }

    #[test]
    fn resize_truncates_length() {
        let mut row = row_with("abcdef", 8);
        row.resize(4, CellAttrs::default());
        assert_eq!(row.width(), 4);
        assert_eq!(row.length(), 4);
        row.resize(6, CellAttrs::default());
        assert_eq!(row.cell(5).map(|c| c.ch), Some(' '));
    }
}
