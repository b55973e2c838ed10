//! Binding between a PTY-backed process and its terminal emulator.
//!
//! The emulator assumes single-writer, single-reader-at-a-time access; in a
//! dashboard the render loop and the output pump usually live on different
//! threads. [`MonitoredProcess`] therefore holds the panel's [`Terminal`]
//! behind one mutex per instance: the pump locks it to feed bytes, the
//! renderer locks it to read cells, and nothing is shared across panels.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use procdash_term::{Terminal, TerminalConfig};

use crate::process::{ProcessConfig, ProcessState, PtyProcess};

/// One terminal emulator shared between an output pump and a renderer.
pub type SharedTerminal = Arc<Mutex<Terminal>>;

/// A monitored process wired to the terminal that displays it.
///
/// Spawns the process in a PTY sized to the panel, owns the byte pump from
/// the process into the emulator, and keeps PTY size and emulator size in
/// lockstep on resize. Restarting the process keeps the emulator, so output
/// from the previous run stays reviewable in scrollback.
#[derive(Debug)]
pub struct MonitoredProcess {
    name: String,
    config: ProcessConfig,
    process: PtyProcess,
    terminal: SharedTerminal,
}

impl MonitoredProcess {
    /// Spawn `config` and attach a fresh terminal of the same size.
    pub fn spawn(name: impl Into<String>, config: ProcessConfig) -> io::Result<Self> {
        Self::spawn_with_terminal_config(name, config, TerminalConfig::default())
    }

    /// Spawn with explicit terminal configuration (scrollback capacity).
    pub fn spawn_with_terminal_config(
        name: impl Into<String>,
        config: ProcessConfig,
        terminal_config: TerminalConfig,
    ) -> io::Result<Self> {
        let terminal = Terminal::with_config(config.cols, config.rows, terminal_config)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        let process = PtyProcess::spawn(&config)?;
        let name = name.into();
        tracing::info!(name = %name, "monitored process attached to terminal");
        Ok(Self {
            name,
            config,
            process,
            terminal: Arc::new(Mutex::new(terminal)),
        })
    }

    /// Panel name for this process.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle to the shared terminal, for renderers and input routers.
    #[must_use]
    pub fn terminal(&self) -> SharedTerminal {
        Arc::clone(&self.terminal)
    }

    /// Drain output that has already arrived into the terminal.
    ///
    /// Non-blocking; returns the number of bytes fed. Call this from the
    /// dashboard's tick loop.
    pub fn pump(&mut self) -> io::Result<usize> {
        self.pump_for(Duration::ZERO)
    }

    /// Drain output into the terminal, waiting up to `timeout` for the
    /// first chunk.
    pub fn pump_for(&mut self, timeout: Duration) -> io::Result<usize> {
        let bytes = self.process.read_for(timeout)?;
        if bytes.is_empty() {
            return Ok(0);
        }
        // A poisoned lock means a renderer panicked; the emulator itself
        // never unwinds mid-feed, so the state is still usable.
        let mut term = self.terminal.lock().unwrap_or_else(|e| e.into_inner());
        term.feed(&bytes);
        Ok(bytes.len())
    }

    /// Forward input bytes (keystrokes, mouse reports) to the child.
    pub fn send_input(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.process.write_all(bytes)
    }

    /// Resize both the PTY and the terminal to new panel dimensions.
    pub fn resize(&mut self, cols: u16, rows: u16) -> io::Result<()> {
        self.process.resize(cols, rows)?;
        let mut term = self.terminal.lock().unwrap_or_else(|e| e.into_inner());
        term.resize(cols, rows)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        self.config.cols = cols;
        self.config.rows = rows;
        Ok(())
    }

    /// Whether the child is still running.
    #[must_use]
    pub fn is_alive(&mut self) -> bool {
        self.process.is_alive()
    }

    /// Child process ID, if the platform reports one.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.process.pid()
    }

    /// Last observed process state.
    #[must_use]
    pub fn state(&mut self) -> ProcessState {
        self.process.state()
    }

    /// Stop the child process. Idempotent.
    pub fn stop(&mut self) -> io::Result<()> {
        self.process.kill()
    }

    /// Stop the child and spawn it again with the same configuration.
    ///
    /// The terminal is kept: output from the previous run remains in
    /// scrollback, and the new run continues below it.
    pub fn restart(&mut self) -> io::Result<()> {
        // Pull in whatever the old process managed to write before dying.
        let _ = self.pump();
        self.process.kill()?;
        tracing::info!(name = %self.name, "restarting monitored process");
        self.process = PtyProcess::spawn(&self.config)?;
        Ok(())
    }
}
