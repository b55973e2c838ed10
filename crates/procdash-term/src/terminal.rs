//! The terminal emulator: parser + grid + cursor + scrollback + viewport.
//!
//! One [`Terminal`] is created per monitored output stream, sized to the
//! panel that renders it. All state mutation happens synchronously inside
//! [`Terminal::feed`]; there are no internal locks or suspension points. A
//! host that feeds and renders from different execution contexts must
//! serialize access itself (one writer lock per instance).

use unicode_width::UnicodeWidthChar;

use crate::cell::Cell;
use crate::cursor::{Cursor, SavedCursor};
use crate::grid::Grid;
use crate::modes::Modes;
use crate::parser::{Action, Parser};
use crate::scrollback::Scrollback;
use crate::viewport::{RowSource, Viewport};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default number of scrollback lines retained.
pub const DEFAULT_SCROLLBACK_CAPACITY: usize = 1000;

/// Construction-time configuration errors.
///
/// The only place the core reports an error to its caller: everything fed
/// through [`Terminal::feed`] is absorbed, per the malformed-input policy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Rows and columns must both be at least 1.
    #[error("terminal dimensions must be non-zero (got {cols}x{rows})")]
    ZeroDimension { cols: u16, rows: u16 },
}

/// Configuration for a [`Terminal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalConfig {
    /// Maximum number of scrollback lines retained. 0 disables scrollback.
    pub scrollback_capacity: usize,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            scrollback_capacity: DEFAULT_SCROLLBACK_CAPACITY,
        }
    }
}

/// A read-only copy of the visible window for a renderer.
///
/// Rows are resolved through the viewport, so a scrolled-back terminal
/// snapshots history rows on top. Cells are copies; holding a snapshot never
/// aliases live state.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScreenSnapshot {
    pub cols: u16,
    pub rows: u16,
    /// Row-major cells of the visible window.
    pub cells: Vec<Cell>,
    pub cursor_row: u16,
    pub cursor_col: u16,
    /// False while scrolled back: the cursor belongs to the live grid.
    pub cursor_visible: bool,
    pub view_offset: usize,
}

/// Terminal emulator for one process output stream.
#[derive(Debug, Clone)]
pub struct Terminal {
    parser: Parser,
    grid: Grid,
    cursor: Cursor,
    saved_cursor: SavedCursor,
    scrollback: Scrollback,
    viewport: Viewport,
    modes: Modes,
    title: String,
    cols: u16,
    rows: u16,
    scrollback_capacity: usize,
}

impl Terminal {
    /// Create a terminal with the default scrollback capacity.
    pub fn new(cols: u16, rows: u16) -> Result<Self, ConfigError> {
        Self::with_config(cols, rows, TerminalConfig::default())
    }

    /// Create a terminal with explicit configuration.
    pub fn with_config(cols: u16, rows: u16, config: TerminalConfig) -> Result<Self, ConfigError> {
        if cols == 0 || rows == 0 {
            return Err(ConfigError::ZeroDimension { cols, rows });
        }
        Ok(Self {
            parser: Parser::new(),
            grid: Grid::new(cols, rows),
            cursor: Cursor::new(cols, rows),
            saved_cursor: SavedCursor::default(),
            scrollback: Scrollback::new(config.scrollback_capacity),
            viewport: Viewport::new(),
            modes: Modes::new(),
            title: String::new(),
            cols,
            rows,
            scrollback_capacity: config.scrollback_capacity,
        })
    }

    // ── Byte input ──────────────────────────────────────────────────

    /// Feed raw output bytes into the emulator.
    ///
    /// Binary safe; a sequence split across calls resumes where it left off.
    /// Runs synchronously to completion and never fails: malformed input
    /// degrades to no-ops. Returns the number of interpreter actions applied.
    pub fn feed(&mut self, bytes: &[u8]) -> usize {
        let actions = self.parser.feed(bytes);
        let count = actions.len();
        for action in actions {
            self.apply_action(action);
        }
        count
    }

    // ── Read access ─────────────────────────────────────────────────

    /// Grid width in columns.
    pub fn cols(&self) -> u16 {
        self.cols
    }

    /// Grid height in rows.
    pub fn rows(&self) -> u16 {
        self.rows
    }

    /// `(cols, rows)`.
    pub fn size(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }

    /// The live grid. Scrolled-back rows are not visible here; use
    /// [`Terminal::cell_at`] for viewport-resolved reads.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Current cursor state.
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// Current terminal modes (read-only to consumers).
    pub fn modes(&self) -> &Modes {
        &self.modes
    }

    /// Scrollback history.
    pub fn scrollback(&self) -> &Scrollback {
        &self.scrollback
    }

    /// Window title, from OSC 0/2. Empty until a title arrives.
    pub fn title(&self) -> &str {
        &self.title
    }

    // ── Viewport control ────────────────────────────────────────────

    /// Current scroll-back offset (0 = live grid).
    pub fn view_offset(&self) -> usize {
        self.viewport.offset()
    }

    /// Scroll the viewport: positive `delta` goes further into the past,
    /// negative toward the live grid. Clamped to `[0, history len]`.
    ///
    /// New output does not reset this offset; a review position holds until
    /// [`Terminal::reset_viewport`] is called.
    pub fn scroll_viewport(&mut self, delta: isize) {
        self.viewport.scroll(delta, self.scrollback.len());
    }

    /// Snap the viewport back to the live grid.
    pub fn reset_viewport(&mut self) {
        self.viewport.reset();
    }

    /// Resolve a cell in the merged coordinate space of the visible window.
    ///
    /// Logical row 0 is the top of the visible window: history rows while
    /// scrolled back, grid rows otherwise. Out-of-bounds coordinates return
    /// `None`. This is a pure read.
    pub fn cell_at(&self, col: u16, logical_row: u16) -> Option<Cell> {
        if col >= self.cols {
            return None;
        }
        match self
            .viewport
            .resolve(logical_row, self.rows, self.scrollback.len())?
        {
            RowSource::History(idx) => {
                let line = self.scrollback.get(idx)?;
                Some(line.cells.get(col as usize).copied().unwrap_or_default())
            }
            RowSource::Grid(row) => self.grid.cell(row, col).copied(),
        }
    }

    /// Take a read-only snapshot of the visible window for rendering.
    pub fn snapshot(&self) -> ScreenSnapshot {
        let mut cells = Vec::with_capacity(self.cols as usize * self.rows as usize);
        for row in 0..self.rows {
            for col in 0..self.cols {
                cells.push(self.cell_at(col, row).unwrap_or_default());
            }
        }
        ScreenSnapshot {
            cols: self.cols,
            rows: self.rows,
            cells,
            cursor_row: self.cursor.row,
            cursor_col: self.cursor.col,
            cursor_visible: self.cursor.visible && self.viewport.is_live(),
            view_offset: self.viewport.offset(),
        }
    }

    // ── Resize ──────────────────────────────────────────────────────

    /// Resize to new panel dimensions, preserving content that fits.
    pub fn resize(&mut self, cols: u16, rows: u16) -> Result<(), ConfigError> {
        if cols == 0 || rows == 0 {
            return Err(ConfigError::ZeroDimension { cols, rows });
        }
        if (cols, rows) == (self.cols, self.rows) {
            return Ok(());
        }
        self.grid.resize(cols, rows);
        self.cursor.resize(cols, rows);
        self.cols = cols;
        self.rows = rows;
        self.viewport.clamp(self.scrollback.len());
        Ok(())
    }

    // ── Action dispatch ─────────────────────────────────────────────

    fn apply_action(&mut self, action: Action) {
        match action {
            Action::Print(ch) => self.apply_print(ch),
            Action::Newline => self.apply_newline(),
            Action::CarriageReturn => self.cursor.carriage_return(),
            Action::Tab => {
                self.cursor.col = self.cursor.next_tab_stop(self.cols);
                self.cursor.pending_wrap = false;
            }
            Action::Backspace => self.cursor.move_left(1),
            Action::Bell => {}
            Action::CursorUp(count) => self.cursor.move_up(count),
            Action::CursorDown(count) => self.cursor.move_down(count, self.rows),
            Action::CursorRight(count) => self.cursor.move_right(count, self.cols),
            Action::CursorLeft(count) => self.cursor.move_left(count),
            Action::CursorNextLine(count) => {
                self.cursor.move_down(count, self.rows);
                self.cursor.carriage_return();
            }
            Action::CursorPrevLine(count) => {
                self.cursor.move_up(count);
                self.cursor.carriage_return();
            }
            Action::CursorColumn(col) => {
                self.cursor
                    .move_to(self.cursor.row, col, self.rows, self.cols);
            }
            Action::CursorRow(row) => self.move_cursor_row_col(row, self.cursor.col),
            Action::CursorPosition { row, col } => self.move_cursor_row_col(row, col),
            Action::SetScrollRegion { top, bottom } => {
                let bottom = if bottom == 0 {
                    self.rows
                } else {
                    bottom.min(self.rows)
                };
                self.cursor.set_scroll_region(top, bottom, self.rows);
                // DECSTBM homes the cursor (to the region origin under DECOM).
                if self.modes.origin_mode() {
                    self.cursor.row = self.cursor.scroll_top();
                    self.cursor.col = 0;
                    self.cursor.pending_wrap = false;
                } else {
                    self.cursor.move_to(0, 0, self.rows, self.cols);
                }
            }
            Action::ScrollUp(count) => self.scroll_region_up(count),
            Action::ScrollDown(count) => self.grid.scroll_down(
                self.cursor.scroll_top(),
                self.cursor.scroll_bottom(),
                count,
                self.cursor.attrs.bg,
            ),
            Action::InsertLines(count) => {
                self.grid.insert_lines(
                    self.cursor.row,
                    count,
                    self.cursor.scroll_top(),
                    self.cursor.scroll_bottom(),
                    self.cursor.attrs.bg,
                );
                self.cursor.pending_wrap = false;
            }
            Action::DeleteLines(count) => {
                self.grid.delete_lines(
                    self.cursor.row,
                    count,
                    self.cursor.scroll_top(),
                    self.cursor.scroll_bottom(),
                    self.cursor.attrs.bg,
                );
                self.cursor.pending_wrap = false;
            }
            Action::InsertChars(count) => {
                self.grid.insert_chars(
                    self.cursor.row,
                    self.cursor.col,
                    count,
                    self.cursor.attrs.bg,
                );
                self.cursor.pending_wrap = false;
            }
            Action::DeleteChars(count) => {
                self.grid.delete_chars(
                    self.cursor.row,
                    self.cursor.col,
                    count,
                    self.cursor.attrs.bg,
                );
                self.cursor.pending_wrap = false;
            }
            Action::EraseChars(count) => self.grid.erase_chars(
                self.cursor.row,
                self.cursor.col,
                count,
                self.cursor.attrs.bg,
            ),
            Action::EraseInDisplay(mode) => {
                let bg = self.cursor.attrs.bg;
                match mode {
                    0 => self.grid.erase_below(self.cursor.row, self.cursor.col, bg),
                    1 => self.grid.erase_above(self.cursor.row, self.cursor.col, bg),
                    2 => self.grid.erase_all(bg),
                    _ => {}
                }
            }
            Action::EraseScrollback => {
                self.scrollback.clear();
                self.viewport.clamp(0);
            }
            Action::EraseInLine(mode) => {
                let bg = self.cursor.attrs.bg;
                match mode {
                    0 => self
                        .grid
                        .erase_line_right(self.cursor.row, self.cursor.col, bg),
                    1 => self
                        .grid
                        .erase_line_left(self.cursor.row, self.cursor.col, bg),
                    2 => self.grid.erase_line(self.cursor.row, bg),
                    _ => {}
                }
            }
            Action::Sgr(params) => self.cursor.attrs.apply_sgr(&params),
            Action::DecSet(params) => {
                for &mode in &params {
                    self.set_dec_mode(mode, true);
                }
            }
            Action::DecRst(params) => {
                for &mode in &params {
                    self.set_dec_mode(mode, false);
                }
            }
            Action::AnsiSet(params) => {
                for &mode in &params {
                    self.modes.set_ansi_mode(mode, true);
                }
            }
            Action::AnsiRst(params) => {
                for &mode in &params {
                    self.modes.set_ansi_mode(mode, false);
                }
            }
            Action::SaveCursor => {
                self.saved_cursor = SavedCursor::save(&self.cursor, self.modes.origin_mode());
            }
            Action::RestoreCursor => {
                self.saved_cursor.restore(&mut self.cursor);
                self.cursor.row = self.cursor.row.min(self.rows.saturating_sub(1));
                self.cursor.col = self.cursor.col.min(self.cols.saturating_sub(1));
            }
            Action::SetTabStop => self.cursor.set_tab_stop(),
            Action::ClearTabStop(mode) => match mode {
                0 => self.cursor.clear_tab_stop(),
                3 => self.cursor.clear_all_tab_stops(),
                _ => {}
            },
            Action::BackTab(count) => {
                for _ in 0..count {
                    self.cursor.col = self.cursor.prev_tab_stop();
                }
                self.cursor.pending_wrap = false;
            }
            Action::Index => self.apply_index(),
            Action::ReverseIndex => {
                if self.cursor.row == self.cursor.scroll_top() {
                    self.grid.scroll_down(
                        self.cursor.scroll_top(),
                        self.cursor.scroll_bottom(),
                        1,
                        self.cursor.attrs.bg,
                    );
                    self.cursor.pending_wrap = false;
                } else {
                    self.cursor.move_up(1);
                }
            }
            Action::NextLine => {
                self.cursor.col = 0;
                self.apply_index();
            }
            Action::FullReset => {
                self.grid = Grid::new(self.cols, self.rows);
                self.cursor = Cursor::new(self.cols, self.rows);
                self.saved_cursor = SavedCursor::default();
                self.scrollback = Scrollback::new(self.scrollback_capacity);
                self.viewport.reset();
                self.modes.reset();
                self.title.clear();
            }
            Action::SoftReset => {
                self.modes.reset();
                self.cursor.attrs.reset();
                self.cursor.visible = self.modes.cursor_visible();
                self.cursor.set_scroll_region(0, self.rows, self.rows);
                self.cursor.pending_wrap = false;
            }
            Action::ScreenAlignment => {
                self.grid.fill_all('E');
                self.cursor.move_to(0, 0, self.rows, self.cols);
            }
            Action::SetTitle(title) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(%title, "terminal title changed");
                self.title = title;
            }
            Action::Unsupported(_seq) => {
                #[cfg(feature = "tracing")]
                tracing::trace!(seq = ?_seq, "unsupported escape sequence ignored");
            }
        }
    }

    fn set_dec_mode(&mut self, mode: u16, enabled: bool) {
        if !self.modes.set_dec_mode(mode, enabled) {
            #[cfg(feature = "tracing")]
            tracing::trace!(mode, enabled, "unrecognized DEC private mode ignored");
            return;
        }
        match mode {
            6 => {
                // DECOM transitions home the cursor.
                self.cursor.row = if enabled { self.cursor.scroll_top() } else { 0 };
                self.cursor.col = 0;
                self.cursor.pending_wrap = false;
            }
            25 => self.cursor.visible = enabled,
            _ => {}
        }
    }

    /// Absolute row/col addressing, honoring origin mode.
    fn move_cursor_row_col(&mut self, row: u16, col: u16) {
        if self.modes.origin_mode() {
            let abs_row = row.saturating_add(self.cursor.scroll_top());
            self.cursor.row = abs_row.min(self.cursor.scroll_bottom().saturating_sub(1));
            self.cursor.col = col.min(self.cols.saturating_sub(1));
            self.cursor.pending_wrap = false;
        } else {
            self.cursor.move_to(row, col, self.rows, self.cols);
        }
    }

    fn scroll_region_up(&mut self, count: u16) {
        self.grid.scroll_up_into(
            self.cursor.scroll_top(),
            self.cursor.scroll_bottom(),
            count,
            &mut self.scrollback,
            self.cursor.attrs.bg,
        );
    }

    /// IND: move down one row, scrolling when at the region bottom.
    fn apply_index(&mut self) {
        if self.cursor.row + 1 >= self.cursor.scroll_bottom() {
            self.scroll_region_up(1);
        } else if self.cursor.row + 1 < self.rows {
            self.cursor.row += 1;
        }
        self.cursor.pending_wrap = false;
    }

    /// LF: column 0 of the next row, scrolling if needed. The rest of the
    /// current row is left untouched.
    fn apply_newline(&mut self) {
        self.cursor.col = 0;
        self.apply_index();
    }

    fn wrap_to_next_line(&mut self) {
        self.grid.set_row_wrapped(self.cursor.row, true);
        self.cursor.col = 0;
        self.apply_index();
    }

    fn apply_print(&mut self, ch: char) {
        let width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if width == 0 {
            // Zero-width characters (combining marks, ZWJ) are dropped.
            return;
        }

        if self.cursor.pending_wrap {
            if self.modes.autowrap() {
                self.wrap_to_next_line();
            } else {
                self.cursor.pending_wrap = false;
            }
        }

        if width == 2 && self.cursor.col + 1 >= self.cols {
            // A wide character with one column left wraps early.
            if self.modes.autowrap() {
                self.wrap_to_next_line();
            } else {
                self.cursor.pending_wrap = false;
                return;
            }
        }

        if self.modes.insert_mode() {
            self.grid.insert_chars(
                self.cursor.row,
                self.cursor.col,
                width as u16,
                self.cursor.attrs.bg,
            );
        }

        let written = self.grid.write_printable_with_width(
            self.cursor.row,
            self.cursor.col,
            ch,
            self.cursor.attrs,
            width as u8,
        );
        if written == 0 {
            return;
        }

        if self.cursor.col + u16::from(written) >= self.cols {
            self.cursor.pending_wrap = true;
        } else {
            self.cursor.col += u16::from(written);
            self.cursor.pending_wrap = false;
        }
    }
}
