//! Property tests: the emulator must hold its structural invariants under
//! arbitrary (including hostile) input.

use proptest::prelude::*;
use procdash_term::{Terminal, TerminalConfig};

fn screen_chars(term: &Terminal) -> Vec<char> {
    let mut out = Vec::with_capacity(usize::from(term.cols()) * usize::from(term.rows()));
    for row in 0..term.rows() {
        for col in 0..term.cols() {
            out.push(term.cell_at(col, row).expect("in-bounds cell").content());
        }
    }
    out
}

proptest! {
    /// Feeding any byte stream never panics and never bends the grid shape:
    /// every in-bounds cell stays readable and the cursor stays in bounds.
    #[test]
    fn arbitrary_bytes_keep_grid_shape(
        bytes in proptest::collection::vec(any::<u8>(), 0..2048),
        cols in 1u16..40,
        rows in 1u16..20,
    ) {
        let mut term = Terminal::new(cols, rows).expect("non-zero dimensions");
        term.feed(&bytes);

        prop_assert!(term.cursor().row < rows);
        prop_assert!(term.cursor().col < cols);
        for row in 0..rows {
            for col in 0..cols {
                prop_assert!(term.cell_at(col, row).is_some());
            }
        }
        prop_assert!(term.cell_at(cols, 0).is_none());
        prop_assert!(term.cell_at(0, rows).is_none());
    }

    /// Chunk boundaries are invisible: splitting a stream at any point yields
    /// exactly the same screen, cursor, and modes as one whole feed.
    #[test]
    fn chunked_feed_matches_single_feed(
        bytes in proptest::collection::vec(any::<u8>(), 0..1024),
        split in 0usize..1024,
    ) {
        let mut whole = Terminal::new(16, 6).expect("non-zero dimensions");
        whole.feed(&bytes);

        let mut chunked = Terminal::new(16, 6).expect("non-zero dimensions");
        let mid = split.min(bytes.len());
        chunked.feed(&bytes[..mid]);
        chunked.feed(&bytes[mid..]);

        prop_assert_eq!(screen_chars(&whole), screen_chars(&chunked));
        prop_assert_eq!(whole.cursor().row, chunked.cursor().row);
        prop_assert_eq!(whole.cursor().col, chunked.cursor().col);
        prop_assert_eq!(whole.modes(), chunked.modes());
        prop_assert_eq!(whole.title(), chunked.title());
    }

    /// The scrollback bound holds under any amount of output, and history
    /// growth tracks the number of rows scrolled out.
    #[test]
    fn history_never_exceeds_capacity(
        lines in proptest::collection::vec("[a-z]{0,8}", 0..64),
        capacity in 0usize..32,
    ) {
        let rows = 4u16;
        let config = TerminalConfig { scrollback_capacity: capacity };
        let mut term = Terminal::with_config(12, rows, config).expect("non-zero dimensions");

        for line in &lines {
            term.feed(line.as_bytes());
            term.feed(b"\n");
        }

        prop_assert!(term.scrollback().len() <= capacity);
        let scrolled_out = (lines.len() + 1).saturating_sub(rows as usize);
        prop_assert_eq!(term.scrollback().len(), scrolled_out.min(capacity));
    }

    /// Viewport offset stays inside `[0, history len]` for any scroll
    /// sequence, and reset always returns to the live grid.
    #[test]
    fn viewport_offset_always_clamped(
        deltas in proptest::collection::vec(-40isize..40, 0..32),
        lines in 0usize..24,
    ) {
        let mut term = Terminal::new(10, 3).expect("non-zero dimensions");
        for i in 0..lines {
            term.feed(format!("{i}\n").as_bytes());
        }
        let history = term.scrollback().len();

        for delta in deltas {
            term.scroll_viewport(delta);
            prop_assert!(term.view_offset() <= history);
        }
        term.reset_viewport();
        prop_assert_eq!(term.view_offset(), 0);
    }

    /// Printable-only streams always land every character on the screen or
    /// in history; nothing is lost short of eviction.
    #[test]
    fn plain_text_round_trips_onto_the_surface(
        text in "[ -~]{0,40}",
    ) {
        let mut term = Terminal::new(64, 4).expect("non-zero dimensions");
        term.feed(text.as_bytes());
        let row0: String = (0..term.cols())
            .map(|c| term.cell_at(c, 0).unwrap().content())
            .collect();
        prop_assert_eq!(row0.trim_end(), text.trim_end());
    }
}
