#![forbid(unsafe_code)]

//! Host-agnostic VT/ANSI terminal engine for the procdash dashboard.
//!
//! One [`Terminal`] instance interprets the raw output byte stream of one
//! monitored process and maintains everything a renderer needs to draw a
//! faithful terminal surface: a grid of styled [`Cell`]s, the cursor,
//! terminal [`Modes`] (including mouse tracking), a bounded [`Scrollback`]
//! history, and a navigable [`Viewport`] over the merged history+grid space.
//!
//! The engine performs no I/O and contains no locking. Feed it bytes that
//! were already read from a process, query it for cells and modes, done:
//!
//! ```
//! use procdash_term::Terminal;
//!
//! let mut term = Terminal::new(80, 24)?;
//! term.feed(b"\x1b[1;32mready\x1b[0m\r\n");
//! assert_eq!(term.cell_at(0, 0).unwrap().content(), 'r');
//! assert!(!term.modes().mouse_reporting_enabled());
//! # Ok::<(), procdash_term::ConfigError>(())
//! ```
//!
//! Malformed escape sequences never fail: the interpreter absorbs them and
//! keeps going, because real process output is not guaranteed to be
//! well-formed. The only fallible call in the crate is construction with
//! zero dimensions.

pub mod cell;
pub mod cursor;
pub mod grid;
pub mod modes;
pub mod parser;
pub mod scrollback;
pub mod terminal;
pub mod viewport;

pub use cell::{Cell, CellFlags, Color, SgrAttrs, SgrFlags};
pub use cursor::{Cursor, SavedCursor};
pub use grid::Grid;
pub use modes::{AnsiModes, DecModes, Modes, MouseTracking};
pub use parser::{Action, Params, Parser};
pub use scrollback::{Scrollback, ScrollbackLine};
pub use terminal::{
    ConfigError, DEFAULT_SCROLLBACK_CAPACITY, ScreenSnapshot, Terminal, TerminalConfig,
};
pub use viewport::{RowSource, Viewport};
