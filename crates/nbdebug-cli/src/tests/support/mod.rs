//! Test support for the console: fake daemons, a steerable clock, captured
//! output and a fixed configuration loader.

mod fake_daemon;
mod memory_daemon;

use std::cell::RefCell;
use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, ensure};
use nbdebug_config::{Config, SocketEndpoint};
use nbdebug_daemon_types::DaemonRequest;
use rstest::fixture;
use time::OffsetDateTime;
use time::macros::datetime;
use tokio::time::Instant;

use crate::session::Clock;
use crate::{AppError, ConfigLoader, Console, run_with_loader};

pub(super) use fake_daemon::{BUNDLE_PATH, FakeDaemon, Responder, cooperative, rejecting};
pub(super) use memory_daemon::MemoryDaemon;

/// A config loader that returns a fixed configuration.
pub(super) struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    pub(super) fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.config.clone())
    }
}

/// Wall clock pinned to 2026-10-17T10:00:00Z that advances with Tokio time,
/// so paused-clock tests get deterministic timestamps.
pub(super) struct TestClock {
    base: OffsetDateTime,
    origin: Instant,
}

impl TestClock {
    pub(super) fn new() -> Self {
        Self {
            base: datetime!(2026-10-17 10:00:00 UTC),
            origin: Instant::now(),
        }
    }
}

impl Clock for TestClock {
    fn now(&self) -> OffsetDateTime {
        self.base + self.origin.elapsed()
    }
}

/// Console whose streams are kept for inspection.
#[derive(Clone)]
pub(super) struct CapturedConsole {
    stdout: Arc<Mutex<Vec<u8>>>,
    stderr: Arc<Mutex<Vec<u8>>>,
}

impl CapturedConsole {
    pub(super) fn new() -> Self {
        Self {
            stdout: Arc::new(Mutex::new(Vec::new())),
            stderr: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(super) fn console(&self) -> Console {
        Console::from_shared(self.stdout.clone(), self.stderr.clone())
    }

    /// Console whose stdout behaves like a pipe closed by its reader right
    /// after a line containing `marker` was written.
    pub(super) fn console_closing_after(&self, marker: &'static str) -> Console {
        let stdout = ClosingWriter {
            inner: Arc::clone(&self.stdout),
            marker,
            closed: false,
        };
        Console::from_shared(Arc::new(Mutex::new(stdout)), self.stderr.clone())
    }

    pub(super) fn stdout(&self) -> String {
        Self::text(&self.stdout)
    }

    pub(super) fn stderr(&self) -> String {
        Self::text(&self.stderr)
    }

    fn text(buffer: &Mutex<Vec<u8>>) -> String {
        let bytes = buffer.lock().expect("output lock").clone();
        String::from_utf8(bytes).expect("output utf8")
    }
}

struct ClosingWriter {
    inner: Arc<Mutex<Vec<u8>>>,
    marker: &'static str,
    closed: bool,
}

impl Write for ClosingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe));
        }
        if String::from_utf8_lossy(buf).contains(self.marker) {
            self.closed = true;
        }
        self.inner
            .lock()
            .map_err(|_| io::Error::other("capture lock poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Test world holding CLI state, the daemon and captured output.
pub(super) struct TestWorld {
    pub config: Config,
    pub daemon: Option<FakeDaemon>,
    pub output: CapturedConsole,
    pub exit_code: Option<ExitCode>,
    pub requests: Vec<DaemonRequest>,
}

impl Default for TestWorld {
    fn default() -> Self {
        Self {
            config: Config::default(),
            daemon: None,
            output: CapturedConsole::new(),
            exit_code: None,
            requests: Vec::new(),
        }
    }
}

impl TestWorld {
    pub fn start_daemon(&mut self, responder: Responder) -> Result<()> {
        let daemon = FakeDaemon::spawn(responder)?;
        self.config.daemon_socket = SocketEndpoint::tcp("127.0.0.1", daemon.port());
        self.daemon = Some(daemon);
        Ok(())
    }

    /// Points the console at a port nothing listens on.
    pub fn use_unreachable_daemon(&mut self) -> Result<()> {
        let listener = std::net::TcpListener::bind(("127.0.0.1", 0))?;
        let port = listener.local_addr()?.port();
        drop(listener);
        self.config.daemon_socket = SocketEndpoint::tcp("127.0.0.1", port);
        Ok(())
    }

    pub fn run(&mut self, command: &str) -> Result<()> {
        self.output = CapturedConsole::new();
        let args = build_args(command);
        let loader = StaticConfigLoader::new(self.config.clone());
        let exit = run_with_loader(args, self.output.console(), &loader);
        self.exit_code = Some(exit);
        if let Some(daemon) = self.daemon.as_mut() {
            self.requests = daemon.take_requests()?;
        }
        Ok(())
    }

    pub fn stdout_text(&self) -> String {
        self.output.stdout()
    }

    pub fn stderr_text(&self) -> String {
        self.output.stderr()
    }

    pub fn daemon_saw_close(&self) -> bool {
        self.daemon.as_ref().is_some_and(FakeDaemon::saw_close)
    }

    pub fn assert_exit_code(&self, expected: u8) -> Result<()> {
        let exit = self.exit_code.context("exit code recorded")?;
        ensure!(
            exit == ExitCode::from(expected),
            "expected exit code {expected}, got {exit:?}"
        );
        Ok(())
    }

    /// Request names in the order the daemon received them.
    pub fn request_names(&self) -> Vec<&'static str> {
        self.requests.iter().map(DaemonRequest::name).collect()
    }
}

#[fixture]
pub(super) fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::default())
}

pub(super) fn build_args(command: &str) -> Vec<OsString> {
    let mut args = vec![OsString::from("nbdebug")];
    args.extend(
        command
            .trim()
            .trim_matches('"')
            .split_whitespace()
            .map(OsString::from),
    );
    args
}
