//! Terminal cursor: position, visibility, write attributes, and saved state.
//!
//! The cursor tracks the current writing position in the grid, the SGR
//! attributes applied to newly written cells, the active scroll region, and
//! the tab stop table. `SavedCursor` is the single DECSC/DECRC slot; a later
//! save overwrites an earlier one.

use crate::cell::SgrAttrs;

/// Default tab stop interval.
const TAB_INTERVAL: u16 = 8;

/// Terminal cursor state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    /// Current row (0-indexed from the top of the viewport).
    pub row: u16,
    /// Current column (0-indexed from the left).
    pub col: u16,
    /// Whether the cursor is visible (DECTCEM).
    pub visible: bool,
    /// Pending wrap: the cursor sits on the right margin and the next
    /// printable character should trigger a line wrap. This avoids the xterm
    /// off-by-one where the cursor would rest *past* the last column.
    pub pending_wrap: bool,
    /// Current SGR attributes applied to newly written characters.
    pub attrs: SgrAttrs,
    /// Scroll region top (0-indexed, inclusive).
    scroll_top: u16,
    /// Scroll region bottom (0-indexed, exclusive).
    scroll_bottom: u16,
    /// Tab stop table, one entry per column.
    tab_stops: Vec<bool>,
}

impl Cursor {
    /// Create a cursor at the origin for a grid of the given size.
    ///
    /// The scroll region covers the full height and tab stops sit at every
    /// eighth column, per the usual power-on defaults.
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            row: 0,
            col: 0,
            visible: true,
            pending_wrap: false,
            attrs: SgrAttrs::default(),
            scroll_top: 0,
            scroll_bottom: rows,
            tab_stops: default_tab_stops(cols),
        }
    }

    /// Adjust cursor bookkeeping for new grid dimensions.
    ///
    /// Resets the scroll region to full height, rebuilds default tab stops,
    /// and clamps the position.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.scroll_top = 0;
        self.scroll_bottom = rows;
        self.tab_stops = default_tab_stops(cols);
        self.row = self.row.min(rows.saturating_sub(1));
        self.col = self.col.min(cols.saturating_sub(1));
        self.pending_wrap = false;
    }

    // ── Movement ────────────────────────────────────────────────────

    /// Move to an absolute position, clamped to the grid bounds.
    pub fn move_to(&mut self, row: u16, col: u16, rows: u16, cols: u16) {
        self.row = row.min(rows.saturating_sub(1));
        self.col = col.min(cols.saturating_sub(1));
        self.pending_wrap = false;
    }

    /// Move up by `count` rows, stopping at the top.
    pub fn move_up(&mut self, count: u16) {
        self.row = self.row.saturating_sub(count.max(1));
        self.pending_wrap = false;
    }

    /// Move down by `count` rows, stopping at the bottom row.
    pub fn move_down(&mut self, count: u16, rows: u16) {
        self.row = self
            .row
            .saturating_add(count.max(1))
            .min(rows.saturating_sub(1));
        self.pending_wrap = false;
    }

    /// Move right by `count` columns, stopping at the right margin.
    pub fn move_right(&mut self, count: u16, cols: u16) {
        self.col = self
            .col
            .saturating_add(count.max(1))
            .min(cols.saturating_sub(1));
        self.pending_wrap = false;
    }

    /// Move left by `count` columns, stopping at column 0.
    pub fn move_left(&mut self, count: u16) {
        self.col = self.col.saturating_sub(count.max(1));
        self.pending_wrap = false;
    }

    /// Carriage return: move to column 0.
    pub fn carriage_return(&mut self) {
        self.col = 0;
        self.pending_wrap = false;
    }

    // ── Scroll region ───────────────────────────────────────────────

    /// Set the scroll region. `top` is inclusive, `bottom` exclusive.
    ///
    /// An inverted or out-of-range request resets the region to full height,
    /// mirroring how real terminals treat a bad DECSTBM.
    pub fn set_scroll_region(&mut self, top: u16, bottom: u16, rows: u16) {
        let bottom = bottom.min(rows);
        if top < bottom {
            self.scroll_top = top;
            self.scroll_bottom = bottom;
        } else {
            self.scroll_top = 0;
            self.scroll_bottom = rows;
        }
    }

    /// Scroll region top (inclusive).
    pub fn scroll_top(&self) -> u16 {
        self.scroll_top
    }

    /// Scroll region bottom (exclusive).
    pub fn scroll_bottom(&self) -> u16 {
        self.scroll_bottom
    }

    // ── Tab stops ───────────────────────────────────────────────────

    /// Column of the next tab stop to the right, or the last column.
    pub fn next_tab_stop(&self, cols: u16) -> u16 {
        let last = cols.saturating_sub(1);
        let mut col = self.col.saturating_add(1);
        while col < last {
            if self.tab_stops.get(col as usize).copied().unwrap_or(false) {
                return col;
            }
            col += 1;
        }
        last
    }

    /// Column of the previous tab stop to the left, or column 0.
    pub fn prev_tab_stop(&self) -> u16 {
        let mut col = self.col;
        while col > 0 {
            col -= 1;
            if self.tab_stops.get(col as usize).copied().unwrap_or(false) {
                return col;
            }
        }
        0
    }

    /// Set a tab stop at the current column (HTS).
    pub fn set_tab_stop(&mut self) {
        if let Some(stop) = self.tab_stops.get_mut(self.col as usize) {
            *stop = true;
        }
    }

    /// Clear the tab stop at the current column (TBC 0).
    pub fn clear_tab_stop(&mut self) {
        if let Some(stop) = self.tab_stops.get_mut(self.col as usize) {
            *stop = false;
        }
    }

    /// Clear all tab stops (TBC 3).
    pub fn clear_all_tab_stops(&mut self) {
        self.tab_stops.fill(false);
    }
}

fn default_tab_stops(cols: u16) -> Vec<bool> {
    (0..cols).map(|c| c % TAB_INTERVAL == 0 && c != 0).collect()
}

/// Saved cursor state for DECSC / DECRC.
///
/// Captures the full pen state so a restore reproduces it exactly. A single
/// slot: saving twice keeps only the second snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SavedCursor {
    pub row: u16,
    pub col: u16,
    pub attrs: SgrAttrs,
    pub origin_mode: bool,
    pub pending_wrap: bool,
}

impl SavedCursor {
    /// Capture the current cursor state.
    pub fn save(cursor: &Cursor, origin_mode: bool) -> Self {
        Self {
            row: cursor.row,
            col: cursor.col,
            attrs: cursor.attrs,
            origin_mode,
            pending_wrap: cursor.pending_wrap,
        }
    }

    /// Restore the saved state into the cursor.
    pub fn restore(&self, cursor: &mut Cursor) {
        cursor.row = self.row;
        cursor.col = self.col;
        cursor.attrs = self.attrs;
        cursor.pending_wrap = self.pending_wrap;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::SgrFlags;

    #[test]
    fn new_cursor_at_origin_with_full_region() {
        let c = Cursor::new(80, 24);
        assert_eq!((c.row, c.col), (0, 0));
        assert!(c.visible);
        assert!(!c.pending_wrap);
        assert_eq!(c.scroll_top(), 0);
        assert_eq!(c.scroll_bottom(), 24);
    }

    #[test]
    fn moves_clamp_to_bounds() {
        let mut c = Cursor::new(10, 5);
        c.move_to(100, 100, 5, 10);
        assert_eq!((c.row, c.col), (4, 9));
        c.move_up(50);
        assert_eq!(c.row, 0);
        c.move_down(50, 5);
        assert_eq!(c.row, 4);
        c.move_left(50);
        assert_eq!(c.col, 0);
        c.move_right(50, 10);
        assert_eq!(c.col, 9);
    }

    #[test]
    fn zero_count_moves_act_as_one() {
        let mut c = Cursor::new(10, 5);
        c.move_to(2, 2, 5, 10);
        c.move_up(0);
        assert_eq!(c.row, 1);
        c.move_right(0, 10);
        assert_eq!(c.col, 3);
    }

    #[test]
    fn movement_clears_pending_wrap() {
        let mut c = Cursor::new(10, 5);
        c.pending_wrap = true;
        c.move_left(1);
        assert!(!c.pending_wrap);
    }

    #[test]
    fn inverted_scroll_region_resets_to_full() {
        let mut c = Cursor::new(10, 10);
        c.set_scroll_region(7, 3, 10);
        assert_eq!(c.scroll_top(), 0);
        assert_eq!(c.scroll_bottom(), 10);
    }

    #[test]
    fn scroll_region_clamps_bottom() {
        let mut c = Cursor::new(10, 10);
        c.set_scroll_region(2, 99, 10);
        assert_eq!(c.scroll_top(), 2);
        assert_eq!(c.scroll_bottom(), 10);
    }

    #[test]
    fn default_tab_stops_every_eight_columns() {
        let c = Cursor::new(40, 5);
        assert_eq!(c.next_tab_stop(40), 8);
        let mut c = Cursor::new(40, 5);
        c.col = 8;
        assert_eq!(c.next_tab_stop(40), 16);
    }

    #[test]
    fn tab_past_last_stop_goes_to_last_column() {
        let mut c = Cursor::new(10, 5);
        c.col = 8;
        assert_eq!(c.next_tab_stop(10), 9);
    }

    #[test]
    fn custom_tab_stop_set_and_clear() {
        let mut c = Cursor::new(20, 5);
        c.col = 3;
        c.set_tab_stop();
        c.col = 0;
        assert_eq!(c.next_tab_stop(20), 3);
        c.col = 3;
        c.clear_tab_stop();
        c.col = 0;
        assert_eq!(c.next_tab_stop(20), 8);
    }

    #[test]
    fn clear_all_tab_stops_leaves_only_margin() {
        let mut c = Cursor::new(20, 5);
        c.clear_all_tab_stops();
        assert_eq!(c.next_tab_stop(20), 19);
        assert_eq!(c.prev_tab_stop(), 0);
    }

    #[test]
    fn prev_tab_stop_walks_left() {
        let mut c = Cursor::new(40, 5);
        c.col = 20;
        assert_eq!(c.prev_tab_stop(), 16);
        c.col = 16;
        assert_eq!(c.prev_tab_stop(), 8);
    }

    #[test]
    fn save_restore_roundtrip() {
        let mut cursor = Cursor::new(20, 10);
        cursor.move_to(5, 10, 10, 20);
        cursor.attrs.flags = SgrFlags::BOLD;
        cursor.pending_wrap = true;

        let saved = SavedCursor::save(&cursor, true);
        assert!(saved.origin_mode);

        let mut fresh = Cursor::new(20, 10);
        saved.restore(&mut fresh);
        assert_eq!((fresh.row, fresh.col), (5, 10));
        assert!(fresh.pending_wrap);
        assert_eq!(fresh.attrs.flags, SgrFlags::BOLD);
    }

    #[test]
    fn second_save_overwrites_first() {
        let mut cursor = Cursor::new(20, 10);
        cursor.move_to(1, 1, 10, 20);
        let _first = SavedCursor::save(&cursor, false);
        cursor.move_to(7, 3, 10, 20);
        let second = SavedCursor::save(&cursor, false);
        assert_eq!((second.row, second.col), (7, 3));
    }

    #[test]
    fn resize_resets_region_and_clamps() {
        let mut c = Cursor::new(20, 10);
        c.set_scroll_region(2, 8, 10);
        c.move_to(9, 19, 10, 20);
        c.resize(5, 4);
        assert_eq!(c.scroll_top(), 0);
        assert_eq!(c.scroll_bottom(), 4);
        assert_eq!((c.row, c.col), (3, 4));
    }
}
