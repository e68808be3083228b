//! JSON-lines client for the daemon's control socket.
//!
//! Every operation writes one request object terminated by a newline and
//! reads exactly one response line back. The [`DaemonClient`] trait is the
//! seam the debug session is written against, so tests can drive the
//! orchestration with an in-memory daemon.

use std::io;

use nbdebug_daemon_types::{
    BundleRequest, BundleResult, DaemonRequest, DaemonResponse, LogLevel, StatusSummary,
};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::debug;

use crate::EMPTY_LINE_LIMIT;

/// Failures raised while talking to the daemon.
#[derive(Debug, Error)]
pub(crate) enum DaemonError {
    #[error("failed to send request: {0}")]
    Send(#[source] io::Error),
    #[error("failed to read response: {0}")]
    Receive(#[source] io::Error),
    #[error("daemon closed the connection before responding")]
    Closed,
    #[error("daemon sent {EMPTY_LINE_LIMIT} consecutive empty lines")]
    TooManyEmptyLines,
    #[error("failed to serialise request: {0}")]
    Serialise(#[source] serde_json::Error),
    #[error("failed to parse response: {0}")]
    Parse(#[source] serde_json::Error),
    /// The daemon refused the operation; the message is shown as reported.
    #[error("{message}")]
    Rejected { message: String },
    #[error("unexpected '{actual}' response to '{request}'")]
    UnexpectedResponse {
        request: &'static str,
        actual: &'static str,
    },
}

/// Operations the debug console consumes from the daemon.
pub(crate) trait DaemonClient {
    async fn status(&mut self) -> Result<StatusSummary, DaemonError>;

    async fn log_level(&mut self) -> Result<LogLevel, DaemonError>;

    async fn set_log_level(&mut self, level: LogLevel) -> Result<(), DaemonError>;

    async fn up(&mut self) -> Result<(), DaemonError>;

    async fn down(&mut self) -> Result<(), DaemonError>;

    async fn set_network_map_persistence(&mut self, enabled: bool) -> Result<(), DaemonError>;

    async fn debug_bundle(&mut self, request: BundleRequest) -> Result<BundleResult, DaemonError>;
}

/// [`DaemonClient`] speaking JSON lines over any bidirectional stream.
pub(crate) struct SocketDaemonClient<S> {
    stream: BufReader<S>,
}

impl<S> SocketDaemonClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub(crate) fn new(stream: S) -> Self {
        Self {
            stream: BufReader::new(stream),
        }
    }

    /// Shuts down the write half, signalling the daemon that no more
    /// requests follow.
    pub(crate) async fn close(mut self) -> io::Result<()> {
        self.stream.get_mut().shutdown().await
    }

    async fn call(&mut self, request: DaemonRequest) -> Result<DaemonResponse, DaemonError> {
        let op = request.name();
        debug!(op, "sending daemon request");

        let mut payload = serde_json::to_vec(&request).map_err(DaemonError::Serialise)?;
        payload.push(b'\n');
        let writer = self.stream.get_mut();
        writer.write_all(&payload).await.map_err(DaemonError::Send)?;
        writer.flush().await.map_err(DaemonError::Send)?;

        let response = self.read_response().await?;
        debug!(op, kind = response.kind(), "received daemon response");
        match response {
            DaemonResponse::Error { message } => Err(DaemonError::Rejected { message }),
            other => Ok(other),
        }
    }

    async fn read_response(&mut self) -> Result<DaemonResponse, DaemonError> {
        let mut empty_lines = 0usize;
        let mut line = String::new();
        loop {
            line.clear();
            let read = self
                .stream
                .read_line(&mut line)
                .await
                .map_err(DaemonError::Receive)?;
            if read == 0 {
                return Err(DaemonError::Closed);
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                empty_lines += 1;
                if empty_lines >= EMPTY_LINE_LIMIT {
                    return Err(DaemonError::TooManyEmptyLines);
                }
                continue;
            }

            return serde_json::from_str(trimmed).map_err(DaemonError::Parse);
        }
    }

    async fn acknowledge(&mut self, request: DaemonRequest) -> Result<(), DaemonError> {
        let name = request.name();
        match self.call(request).await? {
            DaemonResponse::Ack => Ok(()),
            other => Err(unexpected(name, &other)),
        }
    }
}

fn unexpected(request: &'static str, response: &DaemonResponse) -> DaemonError {
    DaemonError::UnexpectedResponse {
        request,
        actual: response.kind(),
    }
}

impl<S> DaemonClient for SocketDaemonClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    async fn status(&mut self) -> Result<StatusSummary, DaemonError> {
        let request = DaemonRequest::GetStatus;
        let name = request.name();
        match self.call(request).await? {
            DaemonResponse::Status { summary } => Ok(summary),
            other => Err(unexpected(name, &other)),
        }
    }

    async fn log_level(&mut self) -> Result<LogLevel, DaemonError> {
        let request = DaemonRequest::GetLogLevel;
        let name = request.name();
        match self.call(request).await? {
            DaemonResponse::LogLevel { level } => Ok(level),
            other => Err(unexpected(name, &other)),
        }
    }

    async fn set_log_level(&mut self, level: LogLevel) -> Result<(), DaemonError> {
        self.acknowledge(DaemonRequest::SetLogLevel { level }).await
    }

    async fn up(&mut self) -> Result<(), DaemonError> {
        self.acknowledge(DaemonRequest::Up).await
    }

    async fn down(&mut self) -> Result<(), DaemonError> {
        self.acknowledge(DaemonRequest::Down).await
    }

    async fn set_network_map_persistence(&mut self, enabled: bool) -> Result<(), DaemonError> {
        self.acknowledge(DaemonRequest::SetNetworkMapPersistence { enabled })
            .await
    }

    async fn debug_bundle(&mut self, request: BundleRequest) -> Result<BundleResult, DaemonError> {
        let request = DaemonRequest::DebugBundle(request);
        let name = request.name();
        match self.call(request).await? {
            DaemonResponse::Bundle { result } => Ok(result),
            other => Err(unexpected(name, &other)),
        }
    }
}
