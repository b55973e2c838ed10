#![forbid(unsafe_code)]

//! PTY-backed process I/O for procdash.
//!
//! This crate is the boundary between the supervisor and the terminal
//! emulation core: it spawns a monitored command inside a PTY sized to its
//! dashboard panel, reads the raw output bytes on a background thread, and
//! pumps them into the panel's [`procdash_term::Terminal`].
//!
//! The emulator itself performs no I/O and no locking; each
//! [`MonitoredProcess`] serializes access to its terminal with one mutex per
//! instance. Separate panels share nothing.

pub mod monitor;
pub mod process;

pub use monitor::{MonitoredProcess, SharedTerminal};
pub use process::{ProcessConfig, ProcessState, PtyProcess};
