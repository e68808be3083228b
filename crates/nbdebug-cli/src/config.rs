//! Configuration loading for the console.
//!
//! Leading configuration flags are peeled off the argument list and handed to
//! `ortho-config`; everything from the first other token onward belongs to
//! the `clap` command parser.

use std::ffi::{OsStr, OsString};

use nbdebug_config::Config;
use ortho_config::OrthoConfig;

use crate::AppError;

/// Flags consumed by the configuration layer.
pub(crate) const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--daemon-socket",
    "--log-filter",
    "--log-format",
];

pub(crate) trait ConfigLoader {
    /// Loads configuration from the filtered configuration arguments.
    ///
    /// Configuration flags must precede the `debug` command; once a command
    /// token is seen the remaining arguments are left to `clap`.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Stop,
}

fn classify(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    if !text.starts_with("--") {
        return FlagAction::Stop;
    }

    let (flag, inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (text.as_ref(), false),
    };

    if CONFIG_CLI_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !inline_value,
        }
    } else {
        FlagAction::Stop
    }
}

/// Arguments split between the configuration loader and the command parser.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ConfigArgumentSplit {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) command_arguments: Vec<OsString>,
}

/// Splits leading configuration flags from the command tokens.
///
/// Both halves keep the binary name as their first element so each parser
/// sees a conventional argv.
pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let Some((binary, rest)) = args.split_first() else {
        return ConfigArgumentSplit {
            config_arguments: Vec::new(),
            command_arguments: Vec::new(),
        };
    };

    let mut config_arguments = vec![binary.clone()];
    let mut index = 0usize;
    while let Some(argument) = rest.get(index) {
        match classify(argument) {
            FlagAction::Include { needs_value } => {
                config_arguments.push(argument.clone());
                index += 1;
                if needs_value && let Some(value) = rest.get(index) {
                    config_arguments.push(value.clone());
                    index += 1;
                }
            }
            FlagAction::Stop => break,
        }
    }

    let mut command_arguments = vec![binary.clone()];
    command_arguments.extend(rest.iter().skip(index).cloned());

    ConfigArgumentSplit {
        config_arguments,
        command_arguments,
    }
}
