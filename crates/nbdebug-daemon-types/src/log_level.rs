use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantNames};

/// Daemon log levels ordered from least to most verbose.
///
/// The derived ordering follows declaration order, so `level < LogLevel::Trace`
/// reads as "not yet at maximum verbosity".
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Deserialize,
    Serialize,
    EnumString,
    Display,
    VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogLevel {
    /// Panic conditions only.
    Panic,
    /// Fatal errors that terminate the daemon.
    Fatal,
    /// Error conditions.
    Error,
    /// Warning conditions.
    Warn,
    /// Informational messages.
    Info,
    /// Debug-level messages.
    Debug,
    /// Fine-grained trace messages.
    Trace,
}

impl LogLevel {
    /// Most verbose level the daemon supports.
    pub const MAX_VERBOSITY: Self = Self::Trace;

    /// Returns true when the level already emits everything the daemon can log.
    #[must_use]
    pub const fn is_max_verbosity(self) -> bool {
        matches!(self, Self::Trace)
    }

    /// Comma-separated list of accepted level names, least verbose first.
    #[must_use]
    pub fn available_names() -> String {
        Self::VARIANTS.join(", ")
    }
}

/// Error returned when a log level name is not recognised.
pub type LogLevelParseError = strum::ParseError;
