//! Error types and diagnostics helpers for the CLI runtime.

use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::client::DaemonError;
use crate::session::SessionError;
use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("invalid duration format: '{input}': {source}")]
    InvalidDuration {
        input: String,
        #[source]
        source: humantime::DurationError,
    },
    #[error("unknown log level: {level}. Available levels are: {available}")]
    UnknownLogLevel { level: String, available: String },
    #[error("invalid persistence value: {value}. Use 'on' or 'off'")]
    InvalidPersistence { value: String },
    #[error("bundle upload requested but --upload-bundle-url is empty")]
    MissingUploadUrl,
    #[error("invalid upload bundle URL '{url}': {source}")]
    InvalidUploadUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to connect to daemon at {endpoint}: {source}")]
    Connect { endpoint: String, source: io::Error },
    #[error("failed to set log level: {0}")]
    SetLogLevel(#[source] DaemonError),
    #[error("failed to set network map persistence: {0}")]
    SetPersistence(#[source] DaemonError),
    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] io::Error),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl AppError {
    /// Returns true when clap produced help or version text rather than a
    /// usage error, so the runner can print it to stdout and succeed.
    pub(crate) fn is_informational(&self) -> bool {
        matches!(self, Self::CliUsage(error) if !error.use_stderr())
    }
}
