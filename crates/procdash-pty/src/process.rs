//! PTY process management: spawn a monitored command and collect its output.
//!
//! `PtyProcess` owns exactly one child process running inside a PTY. A reader
//! thread drains the PTY master into an mpsc channel; the dashboard thread
//! pulls the buffered bytes out with [`PtyProcess::read_available`] at its own
//! cadence. Termination is idempotent: killing an already-dead process
//! succeeds, and `Drop` reaps the child and the reader thread.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use portable_pty::{CommandBuilder, ExitStatus, MasterPty, PtySize};

/// Configuration for spawning a monitored process.
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    /// Program to run.
    pub program: PathBuf,
    /// Arguments to pass to the program.
    pub args: Vec<String>,
    /// Environment variables to set in the child.
    pub env: HashMap<String, String>,
    /// Working directory for the child.
    pub cwd: Option<PathBuf>,
    /// PTY width in columns (the panel width).
    pub cols: u16,
    /// PTY height in rows (the panel height).
    pub rows: u16,
    /// TERM seen by the child.
    pub term: String,
}

impl ProcessConfig {
    /// Create a configuration for the given program with an 80x24 PTY.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: HashMap::new(),
            cwd: None,
            cols: 80,
            rows: 24,
            term: "xterm-256color".to_string(),
        }
    }

    /// Set the PTY dimensions.
    #[must_use]
    pub fn size(mut self, cols: u16, rows: u16) -> Self {
        self.cols = cols;
        self.rows = rows;
        self
    }

    /// Append a program argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set an environment variable in the child.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the working directory.
    #[must_use]
    pub fn cwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.cwd = Some(path.into());
        self
    }

    /// Override TERM in the child.
    #[must_use]
    pub fn term(mut self, term: impl Into<String>) -> Self {
        self.term = term.into();
        self
    }
}

/// Process liveness as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Process is running.
    Running,
    /// Process has exited with the given code.
    Exited(i32),
    /// Process state could not be determined (e.g. right after a kill).
    Unknown,
}

impl ProcessState {
    /// Whether the process is still running.
    #[must_use]
    pub const fn is_alive(self) -> bool {
        matches!(self, ProcessState::Running)
    }

    /// Exit code, when the process exited normally.
    #[must_use]
    pub const fn exit_code(self) -> Option<i32> {
        match self {
            ProcessState::Exited(code) => Some(code),
            _ => None,
        }
    }
}

/// Internal message from the reader thread.
enum ReaderMsg {
    Data(Vec<u8>),
    Eof,
    Err(io::Error),
}

/// A child process running inside a PTY.
pub struct PtyProcess {
    child: Box<dyn portable_pty::Child + Send + Sync>,
    master: Box<dyn MasterPty + Send>,
    writer: Box<dyn Write + Send>,
    rx: mpsc::Receiver<ReaderMsg>,
    reader_thread: Option<thread::JoinHandle<()>>,
    eof: bool,
    state: ProcessState,
}

impl fmt::Debug for PtyProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PtyProcess")
            .field("pid", &self.child.process_id())
            .field("state", &self.state)
            .field("eof", &self.eof)
            .finish()
    }
}

impl PtyProcess {
    /// Spawn the configured program inside a fresh PTY.
    ///
    /// # Errors
    ///
    /// Returns an error when the PTY cannot be opened or the program cannot
    /// be started.
    pub fn spawn(config: &ProcessConfig) -> io::Result<Self> {
        tracing::debug!(program = %config.program.display(), cols = config.cols, rows = config.rows, "spawning monitored process");

        let mut cmd = CommandBuilder::new(&config.program);
        for arg in &config.args {
            cmd.arg(arg);
        }
        cmd.env("TERM", &config.term);
        for (key, value) in &config.env {
            cmd.env(key, value);
        }
        if let Some(ref cwd) = config.cwd {
            cmd.cwd(cwd);
        }

        let pty_system = portable_pty::native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows: config.rows,
                cols: config.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| io::Error::other(e.to_string()))?;

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| io::Error::other(e.to_string()))?;

        let mut reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| io::Error::other(e.to_string()))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| io::Error::other(e.to_string()))?;

        let (tx, rx) = mpsc::channel::<ReaderMsg>();
        let reader_thread = thread::spawn(move || {
            let mut buf = [0u8; 8192];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => {
                        let _ = tx.send(ReaderMsg::Eof);
                        break;
                    }
                    Ok(n) => {
                        if tx.send(ReaderMsg::Data(buf[..n].to_vec())).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        let _ = tx.send(ReaderMsg::Err(err));
                        break;
                    }
                }
            }
        });

        tracing::info!(pid = ?child.process_id(), program = %config.program.display(), "monitored process started");

        Ok(Self {
            child,
            master: pair.master,
            writer,
            rx,
            reader_thread: Some(reader_thread),
            eof: false,
            state: ProcessState::Running,
        })
    }

    /// Whether the process is still alive. Polls and caches the state.
    #[must_use]
    pub fn is_alive(&mut self) -> bool {
        self.poll_state();
        self.state.is_alive()
    }

    /// Last observed process state.
    #[must_use]
    pub fn state(&mut self) -> ProcessState {
        self.poll_state();
        self.state
    }

    /// Process ID, if the platform reports one.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.child.process_id()
    }

    /// Whether the output stream has reached end of file.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Collect output that has already arrived, without blocking.
    ///
    /// Returns an empty vector when nothing is pending. After EOF this
    /// always returns empty.
    pub fn read_available(&mut self) -> io::Result<Vec<u8>> {
        self.read_for(Duration::ZERO)
    }

    /// Collect output, waiting up to `timeout` for the first chunk.
    pub fn read_for(&mut self, timeout: Duration) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        if self.eof {
            return Ok(out);
        }

        let first = if timeout.is_zero() {
            match self.rx.try_recv() {
                Ok(msg) => msg,
                Err(mpsc::TryRecvError::Empty) => return Ok(out),
                Err(mpsc::TryRecvError::Disconnected) => {
                    self.eof = true;
                    return Ok(out);
                }
            }
        } else {
            match self.rx.recv_timeout(timeout) {
                Ok(msg) => msg,
                Err(mpsc::RecvTimeoutError::Timeout) => return Ok(out),
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    self.eof = true;
                    return Ok(out);
                }
            }
        };

        let mut msg = first;
        loop {
            match msg {
                ReaderMsg::Data(bytes) => out.extend_from_slice(&bytes),
                ReaderMsg::Eof => {
                    self.eof = true;
                    break;
                }
                ReaderMsg::Err(err) => return Err(err),
            }
            match self.rx.try_recv() {
                Ok(next) => msg = next,
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    self.eof = true;
                    break;
                }
            }
        }
        Ok(out)
    }

    /// Send input bytes to the child (keystrokes, forwarded mouse reports).
    pub fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.writer.write_all(data)?;
        self.writer.flush()
    }

    /// Resize the PTY; the child sees SIGWINCH and the new dimensions.
    pub fn resize(&mut self, cols: u16, rows: u16) -> io::Result<()> {
        tracing::debug!(cols, rows, "resizing pty");
        self.master
            .resize(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| io::Error::other(e.to_string()))
    }

    /// Kill the process. Idempotent: killing a dead process succeeds.
    pub fn kill(&mut self) -> io::Result<()> {
        if !self.state.is_alive() {
            return Ok(());
        }
        tracing::info!(pid = ?self.child.process_id(), "killing monitored process");
        self.child.kill()?;
        self.state = ProcessState::Unknown;
        match self.wait_timeout(Duration::from_millis(100)) {
            Ok(status) => self.update_state_from_exit(&status),
            Err(_) => self.state = ProcessState::Unknown,
        }
        Ok(())
    }

    /// Block until the process exits.
    pub fn wait(&mut self) -> io::Result<ExitStatus> {
        let status = self.child.wait()?;
        self.update_state_from_exit(&status);
        Ok(status)
    }

    /// Wait for exit, giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `TimedOut` when the process is still running at the deadline.
    pub fn wait_timeout(&mut self, timeout: Duration) -> io::Result<ExitStatus> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.child.try_wait()? {
                Some(status) => {
                    self.update_state_from_exit(&status);
                    return Ok(status);
                }
                None => {
                    if Instant::now() >= deadline {
                        return Err(io::Error::new(
                            io::ErrorKind::TimedOut,
                            "process did not exit in time",
                        ));
                    }
                    thread::sleep(Duration::from_millis(10));
                }
            }
        }
    }

    fn poll_state(&mut self) {
        if !self.state.is_alive() {
            return;
        }
        match self.child.try_wait() {
            Ok(Some(status)) => self.update_state_from_exit(&status),
            Ok(None) => {}
            Err(_) => self.state = ProcessState::Unknown,
        }
    }

    fn update_state_from_exit(&mut self, status: &ExitStatus) {
        self.state = if status.success() {
            ProcessState::Exited(0)
        } else {
            ProcessState::Exited(1)
        };
    }
}

impl Drop for PtyProcess {
    fn drop(&mut self) {
        let _ = self.writer.flush();
        let _ = self.child.kill();
        if let Some(handle) = self.reader_thread.take() {
            let _ = handle.join();
        }
        tracing::debug!(pid = ?self.child.process_id(), "pty process dropped");
    }
}
