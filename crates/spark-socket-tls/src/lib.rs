//! Client-side TLS overlay on top of `spark-socket-tcp`. Establishes the
//! underlying TCP connection, then layers a `rustls` client handshake with
//! SNI derived from the connect hostname.

pub mod channel;
pub mod client_config;
pub mod trust_store;
pub mod verify;

pub use channel::TlsSocket;

use spark_socket_core::context::CallContext;
use spark_socket_core::error::{Result, SocketError};
use spark_socket_core::options::SocketOptions;
use tokio::net::TcpStream;

use spark_socket_reactor::{retry_on_exhaustion, run_with_context};
use spark_socket_tcp::config as tcp_config;
use spark_socket_tcp::resolve::resolve;

/// Connects a bare `TcpStream` the same way `spark_socket_tcp::TcpSocket`
/// does internally, but returns the raw stream rather than wrapping it —
/// the TLS connector needs ownership of the stream to layer the handshake
/// on top of it. Retries on a momentary kernel resource shortage per
/// `options.io_queue_retries`, same as the plain TCP path.
pub(crate) async fn connect_tcp(
    host: &str,
    port: u16,
    options: &SocketOptions,
    ctx: &CallContext,
) -> Result<TcpStream> {
    let addr = resolve(Some(host), port).await?;
    let stream = retry_on_exhaustion(options.io_queue_retries, || {
        run_with_context(ctx, async {
            TcpStream::connect(addr).await.map_err(SocketError::from)
        })
    })
    .await?;
    tcp_config::apply(&stream, options).map_err(SocketError::from)?;
    Ok(stream)
}
