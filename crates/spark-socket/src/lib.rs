//! Portable async TCP + TLS sockets with buffer pooling, backpressure and
//! streaming helpers, built for protocol implementers that want one socket
//! API regardless of whether a given connection ends up plain or
//! TLS-wrapped.
//!
//! Server-side TLS termination is not implemented; `ServerSocket` only
//! accepts plain TCP. Every `Socket` this crate hands out for an outbound
//! connection may still be TLS, since TLS here is always a client
//! handshake layered on top of a connect.

pub mod accumulator;
pub mod connection;
pub mod flows;
pub mod socket;

pub use accumulator::StreamAccumulator;
pub use connection::Connection;
pub use socket::Socket;
pub use spark_socket_tcp::{ShutdownDirection, TcpServerSocket as ServerSocket};

pub use spark_socket_core::context::{CallContext, Deadline};
pub use spark_socket_core::error::{Result, SocketError, SocketErrorWithPeer};
pub use spark_socket_core::options::{ConnectionOptions, SocketOptions, ThreadingMode, TlsConfig, Toggle};
