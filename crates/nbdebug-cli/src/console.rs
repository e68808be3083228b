//! Operator-facing output streams.
//!
//! The console is cloneable so the progress reporter spawned by the duration
//! waiter can write carriage-return updates while the session task is parked.
//! Every write is flushed immediately; the streams are line-oriented and an
//! operator watching a long capture expects to see each transition as it
//! happens.

use std::fmt::Display;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// A writer shared between the session and its progress reporter.
pub type SharedWriter = Arc<Mutex<dyn Write + Send>>;

/// Stdout and stderr handles used for operator-facing messages.
#[derive(Clone)]
pub struct Console {
    stdout: SharedWriter,
    stderr: SharedWriter,
}

impl Console {
    /// Wraps owned writers.
    pub fn new<W, E>(stdout: W, stderr: E) -> Self
    where
        W: Write + Send + 'static,
        E: Write + Send + 'static,
    {
        Self {
            stdout: Arc::new(Mutex::new(stdout)),
            stderr: Arc::new(Mutex::new(stderr)),
        }
    }

    /// Wraps writers that the caller keeps a handle to, e.g. capture buffers.
    #[must_use]
    pub fn from_shared(stdout: SharedWriter, stderr: SharedWriter) -> Self {
        Self { stdout, stderr }
    }

    /// Console bound to the process streams.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }

    /// Writes text to stdout without a trailing newline.
    pub(crate) fn print(&self, text: &str) -> io::Result<()> {
        write_flushed(&self.stdout, text.as_bytes())
    }

    /// Writes a line to stdout.
    pub(crate) fn println(&self, line: impl Display) -> io::Result<()> {
        write_flushed(&self.stdout, format!("{line}\n").as_bytes())
    }

    /// Writes a line to stderr.
    pub(crate) fn eprintln(&self, line: impl Display) -> io::Result<()> {
        write_flushed(&self.stderr, format!("{line}\n").as_bytes())
    }
}

fn write_flushed(writer: &SharedWriter, bytes: &[u8]) -> io::Result<()> {
    let mut guard = writer
        .lock()
        .map_err(|_| io::Error::other("console writer lock poisoned"))?;
    guard.write_all(bytes)?;
    guard.flush()
}
