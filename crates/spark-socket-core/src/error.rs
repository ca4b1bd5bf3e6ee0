use std::fmt;
use std::io;
use std::net::SocketAddr;

/// The closed set of failures a socket, a server socket or the TLS overlay
/// can surface. Every suspending operation in this workspace ends in exactly
/// one of these variants; there is no second error type hiding behind it.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SocketError {
    /// DNS resolution produced no usable address for the given hostname.
    #[error("unknown host: {host}")]
    UnknownHost { host: String },

    /// Peer actively refused the connection (ECONNREFUSED or equivalent).
    #[error("connection refused")]
    ConnectionRefused,

    /// Peer closed, local close, EOF on read, broken pipe on write.
    #[error("connection closed")]
    ConnectionClosed,

    /// A reactor timeout fired before the operation completed.
    #[error("operation timed out")]
    Timeout,

    /// The caller's cancellation token fired before the operation completed.
    #[error("operation cancelled")]
    Cancelled,

    /// Routing failure: EHOSTUNREACH, ENETUNREACH or equivalent.
    #[error("network unreachable")]
    NetworkUnreachable,

    /// The TLS provider rejected the handshake (certificate, version,
    /// cipher suite, alert). Carries the provider's own message.
    #[error("TLS handshake failed: {message}")]
    TlsHandshakeFailed { message: String },

    /// A post-handshake TLS record-layer error.
    #[error("TLS protocol error: {message}")]
    TlsProtocolError { message: String },

    /// The reactor's submission queue (or the buffer pool) stayed exhausted
    /// past its retry budget.
    #[error("resource exhausted: {what}")]
    ResourceExhausted { what: &'static str },

    /// The platform or build configuration cannot offer the requested
    /// capability.
    #[error("unsupported operation: {what}")]
    Unsupported { what: &'static str },

    /// Any other platform error, with the original message attached.
    #[error("socket error: {source}")]
    Other {
        #[source]
        source: io::Error,
    },
}

impl SocketError {
    /// Attaches the peer address a failure occurred against, for call sites
    /// that want it in logs without re-deriving it from the socket.
    pub fn with_peer(self, peer: SocketAddr) -> SocketErrorWithPeer {
        SocketErrorWithPeer { error: self, peer }
    }

    pub fn unsupported(what: &'static str) -> Self {
        Self::Unsupported { what }
    }

    pub fn resource_exhausted(what: &'static str) -> Self {
        Self::ResourceExhausted { what }
    }

    pub fn tls_handshake_failed(message: impl Into<String>) -> Self {
        Self::TlsHandshakeFailed {
            message: message.into(),
        }
    }

    pub fn tls_protocol_error(message: impl Into<String>) -> Self {
        Self::TlsProtocolError {
            message: message.into(),
        }
    }
}

/// A [`SocketError`] annotated with the remote address it happened against.
#[derive(Debug)]
pub struct SocketErrorWithPeer {
    pub error: SocketError,
    pub peer: SocketAddr,
}

impl fmt::Display for SocketErrorWithPeer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (peer {})", self.error, self.peer)
    }
}

impl std::error::Error for SocketErrorWithPeer {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<io::Error> for SocketError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => SocketError::ConnectionRefused,
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::NotConnected => SocketError::ConnectionClosed,
            io::ErrorKind::TimedOut => SocketError::Timeout,
            io::ErrorKind::HostUnreachable | io::ErrorKind::NetworkUnreachable => {
                SocketError::NetworkUnreachable
            }
            _ => match err.raw_os_error() {
                // EHOSTUNREACH / ENETUNREACH on platforms where std hasn't
                // classified them into a dedicated ErrorKind yet.
                Some(113) | Some(101) => SocketError::NetworkUnreachable,
                // EMFILE / ENFILE / ENOBUFS / ENOMEM: the kernel's own
                // per-process or system-wide resource limits are momentarily
                // exhausted, not a condition tied to this one socket.
                Some(24) | Some(23) | Some(105) | Some(12) => {
                    SocketError::resource_exhausted("kernel socket resources")
                }
                _ => SocketError::Other { source: err },
            },
        }
    }
}

/// The workspace-wide result alias; every public, fallible operation in
/// `spark-socket-*` returns this instead of spelling out `SocketError` at
/// each call site.
pub type Result<T> = core::result::Result<T, SocketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_connection_refused() {
        let io_err = io::Error::from(io::ErrorKind::ConnectionRefused);
        assert!(matches!(
            SocketError::from(io_err),
            SocketError::ConnectionRefused
        ));
    }

    #[test]
    fn maps_eof_to_connection_closed() {
        let io_err = io::Error::from(io::ErrorKind::UnexpectedEof);
        assert!(matches!(
            SocketError::from(io_err),
            SocketError::ConnectionClosed
        ));
    }

    #[test]
    fn other_retains_source() {
        let io_err = io::Error::new(io::ErrorKind::Other, "weird platform failure");
        let mapped = SocketError::from(io_err);
        assert!(matches!(mapped, SocketError::Other { .. }));
        assert!(mapped.to_string().contains("weird platform failure"));
    }

    #[test]
    fn maps_emfile_to_resource_exhausted() {
        let io_err = io::Error::from_raw_os_error(24);
        assert!(matches!(
            SocketError::from(io_err),
            SocketError::ResourceExhausted { .. }
        ));
    }
}
