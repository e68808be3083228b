use std::fmt;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Address of the daemon's control socket.
///
/// Serialises as a tagged table (`{ transport = "unix", path = "..." }`) and
/// deserialises from either that table or the URL form accepted by
/// [`FromStr`], so environment variables and flags can use
/// `unix:///var/run/netbird.sock` or `tcp://127.0.0.1:41731` directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(
    tag = "transport",
    rename_all = "snake_case",
    try_from = "EndpointRepr"
)]
pub enum SocketEndpoint {
    /// Unix domain socket endpoint.
    Unix {
        /// Filesystem path of the socket.
        path: Utf8PathBuf,
    },
    /// TCP socket endpoint.
    Tcp {
        /// Host name or address.
        host: String,
        /// TCP port.
        port: u16,
    },
}

impl SocketEndpoint {
    /// Builds a Unix domain socket endpoint.
    #[must_use]
    pub fn unix(path: impl Into<Utf8PathBuf>) -> Self {
        Self::Unix { path: path.into() }
    }

    /// Builds a TCP socket endpoint.
    #[must_use]
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }

    /// Returns the Unix socket path when the endpoint uses the Unix transport.
    #[must_use]
    pub fn unix_path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Unix { path } => Some(path.as_ref()),
            Self::Tcp { .. } => None,
        }
    }
}

impl fmt::Display for SocketEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix { path } => write!(formatter, "unix://{path}"),
            Self::Tcp { host, port } => write!(formatter, "tcp://{host}:{port}"),
        }
    }
}

impl FromStr for SocketEndpoint {
    type Err = SocketParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(input)?;
        match url.scheme() {
            "unix" => {
                let path = url.path();
                if path.is_empty() {
                    return Err(SocketParseError::MissingUnixPath(input.to_owned()));
                }
                Ok(Self::unix(path))
            }
            "tcp" => {
                let host = url
                    .host_str()
                    .ok_or_else(|| SocketParseError::MissingHost(input.to_owned()))?;
                let port = url
                    .port()
                    .ok_or_else(|| SocketParseError::MissingPort(input.to_owned()))?;
                Ok(Self::tcp(host, port))
            }
            other => Err(SocketParseError::UnsupportedScheme(other.to_owned())),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EndpointRepr {
    Url(String),
    Table(TaggedEndpoint),
}

#[derive(Deserialize)]
#[serde(tag = "transport", rename_all = "snake_case")]
enum TaggedEndpoint {
    Unix { path: Utf8PathBuf },
    Tcp { host: String, port: u16 },
}

impl TryFrom<EndpointRepr> for SocketEndpoint {
    type Error = SocketParseError;

    fn try_from(repr: EndpointRepr) -> Result<Self, Self::Error> {
        match repr {
            EndpointRepr::Url(text) => text.parse(),
            EndpointRepr::Table(TaggedEndpoint::Unix { path }) => Ok(Self::Unix { path }),
            EndpointRepr::Table(TaggedEndpoint::Tcp { host, port }) => Ok(Self::Tcp { host, port }),
        }
    }
}

/// Errors encountered while parsing a [`SocketEndpoint`] from text.
#[derive(Debug, Error)]
pub enum SocketParseError {
    /// Scheme was not recognised.
    #[error("unsupported socket scheme '{0}'")]
    UnsupportedScheme(String),
    /// TCP host name was missing.
    #[error("missing TCP host in '{0}'")]
    MissingHost(String),
    /// TCP port was missing from the address.
    #[error("missing TCP port in '{0}'")]
    MissingPort(String),
    /// Unix socket path was absent.
    #[error("missing Unix socket path in '{0}'")]
    MissingUnixPath(String),
    /// URL failed to parse.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}
