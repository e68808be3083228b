//! Command-line runtime for the Netbird debugging console.
//!
//! The runtime splits configuration flags from command tokens, validates the
//! command before touching the daemon, then opens one connection, runs the
//! command on a current-thread Tokio runtime and closes the connection on
//! every path. Output streams and configuration loading are injectable so the
//! whole flow can be exercised in-process by tests.

use std::ffi::OsString;
use std::process::ExitCode;

use clap::Parser;
use nbdebug_config::Config;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

mod cli;
mod client;
mod command;
mod config;
mod console;
mod errors;
mod session;
mod status;
mod telemetry;
mod transport;

pub(crate) use cli::Cli;
use client::SocketDaemonClient;
pub(crate) use command::DebugInvocation;
use config::split_config_arguments;
pub(crate) use config::{ConfigLoader, OrthoConfigLoader};
pub use console::{Console, SharedWriter};
pub(crate) use errors::AppError;
use session::{Clock, SystemClock};

/// Consecutive blank lines tolerated while waiting for a daemon response.
pub(crate) const EMPTY_LINE_LIMIT: usize = 10;

struct CliRunner<'a, L: ConfigLoader> {
    console: Console,
    loader: &'a L,
    clock: &'a dyn Clock,
}

impl<'a, L: ConfigLoader> CliRunner<'a, L> {
    fn new(console: Console, loader: &'a L, clock: &'a dyn Clock) -> Self {
        Self {
            console,
            loader,
            clock,
        }
    }

    fn run<I>(&self, args: I) -> ExitCode
    where
        I: IntoIterator<Item = OsString>,
    {
        let args: Vec<OsString> = args.into_iter().collect();
        let split = split_config_arguments(&args);

        let result = Cli::try_parse_from(&split.command_arguments)
            .map_err(AppError::CliUsage)
            .and_then(|cli| DebugInvocation::try_from(cli.command))
            .and_then(|invocation| {
                self.loader
                    .load(&split.config_arguments)
                    .map(|config| (invocation, config))
            })
            .and_then(|(invocation, config)| {
                telemetry::initialise(&config)?;
                self.dispatch(invocation, &config)
            });

        match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => self.report(&error),
        }
    }

    fn report(&self, error: &AppError) -> ExitCode {
        let written = match error {
            AppError::CliUsage(usage) if error.is_informational() => {
                return match self.console.print(&usage.to_string()) {
                    Ok(()) => ExitCode::SUCCESS,
                    Err(_) => ExitCode::FAILURE,
                };
            }
            AppError::CliUsage(usage) => self.console.eprintln(usage.to_string().trim_end()),
            other => self.console.eprintln(format_args!("Error: {other}")),
        };
        if let Err(write_error) = written {
            error!(%write_error, %error, "failed to report error");
        }
        ExitCode::FAILURE
    }

    fn dispatch(&self, invocation: DebugInvocation, config: &Config) -> Result<(), AppError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(AppError::Runtime)?;
        runtime.block_on(self.execute(invocation, config))
    }

    async fn execute(&self, invocation: DebugInvocation, config: &Config) -> Result<(), AppError> {
        let cancel = CancellationToken::new();
        let interrupt = tokio::spawn(cancel_on_interrupt(cancel.clone()));

        let result = async {
            let connection = transport::connect(config.daemon_socket()).await?;
            let mut client = SocketDaemonClient::new(connection);
            let outcome = invocation
                .execute(&mut client, &self.console, self.clock, &cancel)
                .await;
            if let Err(close_error) = client.close().await {
                error!("Failed to close connection: {close_error}");
            }
            outcome
        }
        .await;

        interrupt.abort();
        result
    }
}

async fn cancel_on_interrupt(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("interrupt received, cancelling");
            cancel.cancel();
        }
        Err(listen_error) => warn!(%listen_error, "cannot listen for interrupts"),
    }
}

/// Runs the console with the process configuration sources.
#[must_use]
pub fn run<I>(args: I, console: Console) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
{
    run_with_loader(args, console, &OrthoConfigLoader)
}

/// Runs the console with a custom configuration loader.
pub(crate) fn run_with_loader<I, L>(args: I, console: Console, loader: &L) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    L: ConfigLoader,
{
    CliRunner::new(console, loader, &SystemClock).run(args)
}

#[cfg(test)]
mod tests;
