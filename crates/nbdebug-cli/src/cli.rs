//! CLI argument definitions for the debug console.

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::session::DEFAULT_UPLOAD_URL;

/// Debugging and logging control for the Netbird daemon.
#[derive(Parser, Debug)]
#[command(
    name = "nbdebug",
    version,
    about = "Debugging commands for the Netbird daemon",
    disable_help_subcommand = true
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: DebugCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum DebugCommand {
    /// Creates a debug bundle of the daemon's logs and status.
    Bundle(BundleArgs),
    /// Manages logging for the daemon.
    Log {
        #[command(subcommand)]
        action: LogCommand,
    },
    /// Runs trace logging for a duration, then creates a debug bundle.
    #[command(after_help = "Example:\n  nbdebug for 5m")]
    For {
        /// How long to collect trace logs (for example `90s`, `5m`, `1h30m`).
        #[arg(value_name = "TIME")]
        duration: String,
        #[command(flatten)]
        bundle: BundleArgs,
    },
    /// Sets in-memory persistence of the latest network map.
    Persistence {
        /// `on` or `off`.
        #[arg(value_name = "on|off")]
        state: String,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum LogCommand {
    /// Sets the daemon log level until it restarts.
    #[command(
        long_about = "Sets the logging level for the current session. The setting reverts \
                      to the default on daemon restart.\n\nAvailable log levels are: panic, \
                      fatal, error, warn, info, debug, trace"
    )]
    Level {
        #[arg(value_name = "LEVEL")]
        level: String,
    },
}

/// Flags shared by commands that produce a bundle.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub(crate) struct BundleArgs {
    /// Anonymises IP addresses and domains in the bundle and status output.
    #[arg(short = 'A', long)]
    pub(crate) anonymize: bool,
    /// Number of rotated log files to include.
    #[arg(short = 'C', long, default_value_t = 1)]
    pub(crate) log_file_count: u32,
    /// Adds system information to the bundle (`--system-info=false` to skip).
    #[arg(
        short = 'S',
        long,
        action = ArgAction::Set,
        default_value_t = true,
        num_args = 0..=1,
        default_missing_value = "true",
        require_equals = true
    )]
    pub(crate) system_info: bool,
    /// Uploads the bundle after creating it.
    #[arg(short = 'U', long)]
    pub(crate) upload_bundle: bool,
    /// Service URL used to obtain an upload target.
    #[arg(long, default_value = DEFAULT_UPLOAD_URL)]
    pub(crate) upload_bundle_url: String,
}
