//! Visible screen: a stack of [`Row`]s.
//!
//! All coordinates are 0-indexed. Vertical ranges passed to the scroll
//! operations use an exclusive bottom, rectangles use inclusive corners.

use crate::cell::{Cell, CellAttrs};
use crate::row::Row;
use crate::scrollback::Scrollback;

#[derive(Debug, Clone)]
pub struct Grid {
    rows: Vec<Row>,
    width: u16,
    height: u16,
}

impl Grid {
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            rows: (0..height)
                .map(|_| Row::new(width, CellAttrs::default()))
                .collect(),
            width,
            height,
        }
    }

    #[must_use]
    pub fn width(&self) -> u16 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u16 {
        self.height
    }

    #[must_use]
    pub fn row(&self, row: u16) -> Option<&Row> {
        self.rows.get(row as usize)
    }

    pub fn row_mut(&mut self, row: u16) -> Option<&mut Row> {
        self.rows.get_mut(row as usize)
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    pub(crate) fn rows_mut(&mut self) -> impl Iterator<Item = &mut Row> {
        self.rows.iter_mut()
    }

    #[must_use]
    pub fn cell(&self, row: u16, col: u16) -> Option<&Cell> {
        self.row(row)?.cell(col)
    }

    // ── Erase ───────────────────────────────────────────────────────

    /// Erase the rectangle `(top, left)..=(bottom, right)`.
    pub fn erase_rect(
        &mut self,
        top: u16,
        left: u16,
        bottom: u16,
        right: u16,
        attrs: CellAttrs,
        honor_protected: bool,
    ) {
        let bottom = bottom.min(self.height.saturating_sub(1));
        if top > bottom {
            return;
        }
        for row in &mut self.rows[top as usize..=bottom as usize] {
            row.erase(left, right, attrs, honor_protected);
        }
    }

    /// Blank every row and drop line-size marks.
    pub fn clear(&mut self, attrs: CellAttrs) {
        for row in &mut self.rows {
            row.clear(attrs);
        }
    }

    /// DECALN: fill the screen with `ch`.
    pub fn fill_all(&mut self, ch: char, attrs: CellAttrs) {
        for row in &mut self.rows {
            row.clear(attrs);
            for col in 0..self.width {
                row.put(col, ch, attrs);
            }
        }
    }

    // ── Scroll operations ───────────────────────────────────────────

    /// Scroll `[top, bottom)` up by `count`, filling the bottom with blanks.
    pub fn scroll_up(&mut self, top: u16, bottom: u16, count: u16, attrs: CellAttrs) {
        let _ = self.scroll_up_take(top, bottom, count, attrs);
    }

    /// Scroll up, pushing the rows that leave the top into `scrollback`.
    pub fn scroll_up_into(
        &mut self,
        top: u16,
        bottom: u16,
        count: u16,
        scrollback: &mut Scrollback,
        attrs: CellAttrs,
    ) {
        for row in self.scroll_up_take(top, bottom, count, attrs) {
            let _ = scrollback.push_row(row);
        }
    }

    fn scroll_up_take(&mut self, top: u16, bottom: u16, count: u16, attrs: CellAttrs) -> Vec<Row> {
        let top = top.min(self.height) as usize;
        let bottom = bottom.min(self.height) as usize;
        if top >= bottom || count == 0 {
            return Vec::new();
        }
        let count = (count as usize).min(bottom - top);
        let width = self.width;
        let blanks = (0..count).map(|_| Row::new(width, attrs));
        let evicted: Vec<Row> = self.rows.splice(top..top + count, std::iter::empty()).collect();
        let insert_at = bottom - count;
        self.rows.splice(insert_at..insert_at, blanks);
        evicted
    }

    /// Scroll `[top, bottom)` down by `count`, filling the top with blanks.
    pub fn scroll_down(&mut self, top: u16, bottom: u16, count: u16, attrs: CellAttrs) {
        let top = top.min(self.height) as usize;
        let bottom = bottom.min(self.height) as usize;
        if top >= bottom || count == 0 {
            return;
        }
        let count = (count as usize).min(bottom - top);
        let width = self.width;
        self.rows.drain(bottom - count..bottom);
        self.rows
            .splice(top..top, (0..count).map(|_| Row::new(width, attrs)));
    }

    /// IL: insert `count` blank lines at `row` within `[top, bottom)`.
    pub fn insert_lines(&mut self, row: u16, count: u16, top: u16, bottom: u16, attrs: CellAttrs) {
        if row < top || row >= bottom {
            return;
        }
        self.scroll_down(row, bottom, count, attrs);
    }

    /// DL: delete `count` lines at `row` within `[top, bottom)`.
    pub fn delete_lines(&mut self, row: u16, count: u16, top: u16, bottom: u16, attrs: CellAttrs) {
        if row < top || row >= bottom {
            return;
        }
        self.scroll_up(row, bottom, count, attrs);
    }

    /// Shift the contents of the rectangle `(top, left)..=(bottom, right)`.
    ///
    /// Positive `rows` moves content up, negative moves it down; positive
    /// `cols` moves content left, negative moves it right. Vacated cells are
    /// blanked with `attrs`. Cells outside the rectangle are untouched.
    pub fn shift_rect(
        &mut self,
        top: u16,
        left: u16,
        bottom: u16,
        right: u16,
        rows: i32,
        cols: i32,
        attrs: CellAttrs,
    ) {
        let bottom = bottom.min(self.height.saturating_sub(1));
        let right = right.min(self.width.saturating_sub(1));
        if top > bottom || left > right {
            return;
        }
        let snapshot: Vec<Vec<(char, CellAttrs)>> = (top..=bottom)
            .map(|r| {
                (left..=right)
                    .map(|c| {
                        self.cell(r, c)
                            .map_or((' ', attrs), |cell| (cell.ch, cell.attrs))
                    })
                    .collect()
            })
            .collect();
        for r in top..=bottom {
            for c in left..=right {
                let src_r = i32::from(r) + rows;
                let src_c = i32::from(c) + cols;
                let inside = src_r >= i32::from(top)
                    && src_r <= i32::from(bottom)
                    && src_c >= i32::from(left)
                    && src_c <= i32::from(right);
                let (ch, cell_attrs) = if inside {
                    snapshot[(src_r - i32::from(top)) as usize][(src_c - i32::from(left)) as usize]
                } else {
                    (' ', attrs)
                };
                if let Some(row) = self.row_mut(r) {
                    if inside && ch != ' ' {
                        row.put(c, ch, cell_attrs);
                    } else {
                        row.erase(c, c, cell_attrs, false);
                    }
                }
            }
        }
    }

    /// Change the width of every row (DECCOLM).
    pub fn resize_width(&mut self, width: u16, attrs: CellAttrs) {
        for row in &mut self.rows {
            row.resize(width, attrs);
        }
        self.width = width;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put_str(grid: &mut Grid, row: u16, text: &str) {
        let r = grid.row_mut(row).expect("row in range");
        for (i, ch) in text.chars().enumerate() {
            r.put(i as u16, ch, CellAttrs::default());
        }
    }

    fn texts(grid: &Grid) -> Vec<String> {
        grid.rows().map(Row::text).collect()
    }

    #[test]
    fn new_grid_has_correct_dimensions() {
        let grid = Grid::new(80, 24);
        assert_eq!(grid.width(), 80);
        assert_eq!(grid.height(), 24);
        assert_eq!(grid.rows().count(), 24);
        assert!(grid.rows().all(|r| r.width() == 80 && r.length() == 0));
    }

    #[test]
    fn scroll_up_shifts_and_blanks() {
        let mut grid = Grid::new(4, 4);
        for (i, t) in ["a", "b", "c", "d"].iter().enumerate() {
            put_str(&mut grid, i as u16, t);
        }
        grid.scroll_up(1, 4, 1, CellAttrs::default());
        assert_eq!(texts(&grid), vec!["a", "c", "d", ""]);
        assert_eq!(grid.height(), 4);
        assert_eq!(grid.rows().count(), 4);
    }

    #[test]
    fn scroll_up_into_feeds_scrollback() {
        let mut grid = Grid::new(4, 3);
        for (i, t) in ["a", "b", "c"].iter().enumerate() {
            put_str(&mut grid, i as u16, t);
        }
        let mut sb = Scrollback::new(10);
        grid.scroll_up_into(0, 3, 2, &mut sb, CellAttrs::default());
        assert_eq!(texts(&grid), vec!["c", "", ""]);
        let history: Vec<String> = sb.iter().map(Row::text).collect();
        assert_eq!(history, vec!["a", "b"]);
    }

    #[test]
    fn scroll_down_shifts_and_blanks() {
        let mut grid = Grid::new(4, 4);
        for (i, t) in ["a", "b", "c", "d"].iter().enumerate() {
            put_str(&mut grid, i as u16, t);
        }
        grid.scroll_down(0, 3, 2, CellAttrs::default());
        assert_eq!(texts(&grid), vec!["", "", "a", "d"]);
    }

    #[test]
    fn empty_region_is_noop() {
        let mut grid = Grid::new(4, 2);
        put_str(&mut grid, 0, "x");
        grid.scroll_up(1, 1, 3, CellAttrs::default());
        grid.scroll_down(2, 1, 3, CellAttrs::default());
        assert_eq!(texts(&grid), vec!["x", ""]);
    }

    #[test]
    fn insert_and_delete_lines_respect_region() {
        let mut grid = Grid::new(4, 5);
        for (i, t) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            put_str(&mut grid, i as u16, t);
        }
        grid.insert_lines(1, 1, 1, 4, CellAttrs::default());
        assert_eq!(texts(&grid), vec!["a", "", "b", "c", "e"]);
        grid.delete_lines(1, 2, 1, 4, CellAttrs::default());
        assert_eq!(texts(&grid), vec!["a", "c", "", "", "e"]);
        // Outside the region: ignored.
        grid.insert_lines(4, 1, 1, 4, CellAttrs::default());
        assert_eq!(texts(&grid), vec!["a", "c", "", "", "e"]);
    }

    #[test]
    fn erase_rect_clears_columns_on_each_row() {
        let mut grid = Grid::new(4, 3);
        for r in 0..3 {
            put_str(&mut grid, r, "abcd");
        }
        grid.erase_rect(0, 1, 1, 2, CellAttrs::default(), false);
        assert_eq!(texts(&grid), vec!["a  d", "a  d", "abcd"]);
    }

    #[test]
    fn shift_rect_moves_window_contents_up() {
        let mut grid = Grid::new(4, 3);
        put_str(&mut grid, 0, "abcd");
        put_str(&mut grid, 1, "efgh");
        put_str(&mut grid, 2, "ijkl");
        grid.shift_rect(0, 1, 2, 2, 1, 0, CellAttrs::default());
        assert_eq!(texts(&grid), vec!["afgd", "ejkh", "i  l"]);
    }

    #[test]
    fn fill_all_and_clear() {
        let mut grid = Grid::new(3, 2);
        grid.fill_all('E', CellAttrs::default());
        assert_eq!(texts(&grid), vec!["EEE", "EEE"]);
        grid.clear(CellAttrs::default());
        assert_eq!(texts(&grid), vec!["", ""]);
    }

    #[test]
    fn resize_width_applies_to_all_rows() {
        let mut grid = Grid::new(80, 2);
        grid.resize_width(132, CellAttrs::default());
        assert_eq!(grid.width(), 132);
        assert!(grid.rows().all(|r| r.width() == 132));
    }
}
