//! Threaded TCP daemon speaking the JSON-lines protocol.
//!
//! Used by runner tests that go through the real transport. The daemon
//! accepts one connection, answers each request through a responder and
//! notes whether the client closed the connection.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use nbdebug_daemon_types::{
    BundleResult, DaemonRequest, DaemonResponse, DaemonStatus, LogLevel, StatusSummary,
};

/// Produces the reply for one request.
pub(in crate::tests) type Responder = Box<dyn FnMut(&DaemonRequest) -> DaemonResponse + Send>;

/// Path reported for bundles produced by the fake daemons.
pub(in crate::tests) const BUNDLE_PATH: &str = "/tmp/netbird.debug.2026-10-17.zip";

/// Answers every operation successfully with a connected daemon at `info`.
pub(in crate::tests) fn cooperative() -> Responder {
    Box::new(|request| match request {
        DaemonRequest::GetStatus => DaemonResponse::Status {
            summary: StatusSummary {
                status: DaemonStatus::Connected,
                daemon_version: String::from("0.30.2"),
                ..StatusSummary::default()
            },
        },
        DaemonRequest::GetLogLevel => DaemonResponse::LogLevel {
            level: LogLevel::Info,
        },
        DaemonRequest::DebugBundle(_) => DaemonResponse::Bundle {
            result: BundleResult {
                path: String::from(BUNDLE_PATH),
                ..BundleResult::default()
            },
        },
        DaemonRequest::SetLogLevel { .. }
        | DaemonRequest::Up
        | DaemonRequest::Down
        | DaemonRequest::SetNetworkMapPersistence { .. } => DaemonResponse::Ack,
    })
}

/// Like [`cooperative`], but rejects operation `op` with `message`.
pub(in crate::tests) fn rejecting(op: &str, message: &str) -> Responder {
    let op = op.to_owned();
    let message = message.to_owned();
    let mut fallback = cooperative();
    Box::new(move |request| {
        if request.name() == op {
            DaemonResponse::Error {
                message: message.clone(),
            }
        } else {
            fallback(request)
        }
    })
}

pub(in crate::tests) struct FakeDaemon {
    port: u16,
    requests: Arc<Mutex<Vec<DaemonRequest>>>,
    closed: Arc<AtomicBool>,
    result: Arc<Mutex<Option<Result<()>>>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FakeDaemon {
    /// Spawns a daemon on an ephemeral port that serves one client.
    pub fn spawn(responder: Responder) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).context("bind fake daemon")?;
        listener
            .set_nonblocking(true)
            .context("fake daemon nonblocking")?;
        let port = listener.local_addr().context("local addr")?.port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let result: Arc<Mutex<Option<Result<()>>>> = Arc::new(Mutex::new(None));

        let handle = thread::spawn({
            let requests = Arc::clone(&requests);
            let closed = Arc::clone(&closed);
            let result = Arc::clone(&result);
            move || {
                let outcome = Self::serve_client(&listener, responder, &requests, &closed);
                if let Ok(mut guard) = result.lock() {
                    *guard = Some(outcome);
                }
            }
        });

        Ok(Self {
            port,
            requests,
            closed,
            result,
            handle: Some(handle),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Waits for the client to finish and returns the requests it sent.
    pub fn take_requests(&mut self) -> Result<Vec<DaemonRequest>> {
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| anyhow!("fake daemon thread panicked"))?;
        }
        if let Some(outcome) = self
            .result
            .lock()
            .map_err(|error| anyhow!("lock fake daemon result: {error}"))?
            .take()
        {
            outcome.context("fake daemon failed")?;
        }
        let requests = self
            .requests
            .lock()
            .map_err(|error| anyhow!("lock requests: {error}"))?;
        Ok(requests.clone())
    }

    /// True once the client closed its side of the connection.
    pub fn saw_close(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn serve_client(
        listener: &TcpListener,
        responder: Responder,
        requests: &Mutex<Vec<DaemonRequest>>,
        closed: &AtomicBool,
    ) -> Result<()> {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            match listener.accept() {
                Ok((stream, _)) => return Self::converse(stream, responder, requests, closed),
                Err(ref error)
                    if error.kind() == io::ErrorKind::WouldBlock && Instant::now() < deadline =>
                {
                    thread::sleep(Duration::from_millis(10));
                }
                // Nobody connected, e.g. the command failed validation.
                Err(ref error) if error.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(error) => return Err(error).context("accept connection"),
            }
        }
    }

    fn converse(
        stream: TcpStream,
        mut responder: Responder,
        requests: &Mutex<Vec<DaemonRequest>>,
        closed: &AtomicBool,
    ) -> Result<()> {
        stream
            .set_nonblocking(false)
            .context("blocking client stream")?;
        stream
            .set_read_timeout(Some(Duration::from_secs(30)))
            .context("client read timeout")?;
        let mut writer = stream.try_clone().context("clone stream")?;
        let mut reader = BufReader::new(stream);

        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).context("read request")? == 0 {
                closed.store(true, Ordering::SeqCst);
                return Ok(());
            }
            let request: DaemonRequest =
                serde_json::from_str(line.trim()).context("parse request")?;
            let response = responder(&request);
            requests
                .lock()
                .map_err(|error| anyhow!("lock requests: {error}"))?
                .push(request);

            let mut payload = serde_json::to_string(&response).context("serialise response")?;
            payload.push('\n');
            writer
                .write_all(payload.as_bytes())
                .and_then(|()| writer.flush())
                .context("write response")?;
        }
    }
}

impl Drop for FakeDaemon {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            drop(handle.join());
        }
    }
}
