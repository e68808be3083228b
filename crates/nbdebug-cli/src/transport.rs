//! Socket transport for reaching the daemon.
//!
//! [`Connection`] hides whether the daemon was reached over TCP or a Unix
//! domain socket so the client can treat both as one byte stream.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use nbdebug_config::SocketEndpoint;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
#[cfg(unix)]
use tokio::net::UnixStream;

use crate::AppError;

pub(crate) const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub(crate) enum Connection {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl AsyncRead for Connection {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_read(cx, buf),
            #[cfg(unix)]
            Self::Unix(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Connection {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_write(cx, buf),
            #[cfg(unix)]
            Self::Unix(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_flush(cx),
            #[cfg(unix)]
            Self::Unix(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_shutdown(cx),
            #[cfg(unix)]
            Self::Unix(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}

/// Opens a connection to the daemon, giving up after [`CONNECTION_TIMEOUT`].
pub(crate) async fn connect(endpoint: &SocketEndpoint) -> Result<Connection, AppError> {
    let attempt = async {
        match endpoint {
            SocketEndpoint::Tcp { host, port } => TcpStream::connect((host.as_str(), *port))
                .await
                .map(Connection::Tcp),
            SocketEndpoint::Unix { path } => connect_unix(path.as_str()).await,
        }
    };

    let result = match tokio::time::timeout(CONNECTION_TIMEOUT, attempt).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            "timed out connecting to daemon",
        )),
    };

    result.map_err(|source| AppError::Connect {
        endpoint: endpoint.to_string(),
        source,
    })
}

#[cfg(unix)]
async fn connect_unix(path: &str) -> io::Result<Connection> {
    UnixStream::connect(path).await.map(Connection::Unix)
}

#[cfg(not(unix))]
async fn connect_unix(path: &str) -> io::Result<Connection> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("Unix sockets are unavailable on this platform: {path}"),
    ))
}
