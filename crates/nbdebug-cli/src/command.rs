//! Validated commands and their execution against the daemon.
//!
//! Everything that can be checked without the daemon (durations, level
//! names, persistence values, upload settings) is checked while converting
//! from the parsed CLI, so bad input fails before a connection is opened.

use std::time::Duration;

use nbdebug_daemon_types::LogLevel;
use tokio_util::sync::CancellationToken;
use tracing::info;
use url::Url;

use crate::cli::{BundleArgs, DebugCommand, LogCommand};
use crate::client::DaemonClient;
use crate::session::bundle::create_bundle;
use crate::session::waiter::or_cancel;
use crate::session::{Clock, DebugOptions, DebugSession, SessionError};
use crate::{AppError, Console};

/// A command ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DebugInvocation {
    Bundle(DebugOptions),
    SetLogLevel(LogLevel),
    SetPersistence(bool),
    RunFor {
        duration: Duration,
        options: DebugOptions,
    },
}

impl TryFrom<DebugCommand> for DebugInvocation {
    type Error = AppError;

    fn try_from(command: DebugCommand) -> Result<Self, Self::Error> {
        match command {
            DebugCommand::Bundle(args) => Ok(Self::Bundle(DebugOptions::try_from(args)?)),
            DebugCommand::Log {
                action: LogCommand::Level { level },
            } => parse_level(&level).map(Self::SetLogLevel),
            DebugCommand::For { duration, bundle } => {
                let duration = parse_duration(&duration)?;
                let options = DebugOptions::try_from(bundle)?;
                Ok(Self::RunFor { duration, options })
            }
            DebugCommand::Persistence { state } => {
                parse_persistence(&state).map(Self::SetPersistence)
            }
        }
    }
}

impl TryFrom<BundleArgs> for DebugOptions {
    type Error = AppError;

    fn try_from(args: BundleArgs) -> Result<Self, Self::Error> {
        if args.upload_bundle {
            let url = args.upload_bundle_url.trim();
            if url.is_empty() {
                return Err(AppError::MissingUploadUrl);
            }
            Url::parse(url).map_err(|source| AppError::InvalidUploadUrl {
                url: url.to_owned(),
                source,
            })?;
        }
        Ok(Self {
            log_file_count: args.log_file_count,
            system_info: args.system_info,
            upload_bundle: args.upload_bundle,
            upload_url: args.upload_bundle_url,
            anonymize: args.anonymize,
        })
    }
}

fn parse_duration(input: &str) -> Result<Duration, AppError> {
    humantime::parse_duration(input.trim()).map_err(|source| AppError::InvalidDuration {
        input: input.to_owned(),
        source,
    })
}

fn parse_level(input: &str) -> Result<LogLevel, AppError> {
    input
        .trim()
        .parse()
        .map_err(|_| AppError::UnknownLogLevel {
            level: input.to_owned(),
            available: LogLevel::available_names(),
        })
}

fn parse_persistence(input: &str) -> Result<bool, AppError> {
    match input.trim().to_ascii_lowercase().as_str() {
        "on" => Ok(true),
        "off" => Ok(false),
        _ => Err(AppError::InvalidPersistence {
            value: input.to_owned(),
        }),
    }
}

impl DebugInvocation {
    /// Runs the command over an open daemon connection. Cancelling `cancel`
    /// abandons any daemon call still waiting for a reply.
    pub(crate) async fn execute<C: DaemonClient>(
        self,
        client: &mut C,
        console: &Console,
        clock: &dyn Clock,
        cancel: &CancellationToken,
    ) -> Result<(), AppError> {
        match self {
            Self::Bundle(options) => {
                or_cancel(create_bundle(client, &options, console), cancel)
                    .await
                    .ok_or(SessionError::Cancelled)??;
            }
            Self::SetLogLevel(level) => {
                or_cancel(client.set_log_level(level), cancel)
                    .await
                    .ok_or(SessionError::Cancelled)?
                    .map_err(AppError::SetLogLevel)?;
                info!(%level, "daemon log level changed");
                console
                    .println(format_args!("Log level set successfully to {level}"))
                    .map_err(AppError::Output)?;
            }
            Self::SetPersistence(enabled) => {
                or_cancel(client.set_network_map_persistence(enabled), cancel)
                    .await
                    .ok_or(SessionError::Cancelled)?
                    .map_err(AppError::SetPersistence)?;
                let state = if enabled { "on" } else { "off" };
                console
                    .println(format_args!("Network map persistence set to: {state}"))
                    .map_err(AppError::Output)?;
            }
            Self::RunFor { duration, options } => {
                DebugSession::new(client, &options, duration, console, clock, cancel)
                    .run()
                    .await?;
            }
        }
        Ok(())
    }
}
