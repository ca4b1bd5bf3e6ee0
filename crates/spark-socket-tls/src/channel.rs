use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rustls_pki_types::ServerName;
use spark_socket_core::context::CallContext;
use spark_socket_core::error::{Result, SocketError};
use spark_socket_core::options::{SocketOptions, TlsConfig};
use spark_socket_reactor::{retry_on_exhaustion, run_with_context};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex as AsyncMutex;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;

use crate::client_config::build;

struct Inner {
    stream: AsyncMutex<TlsStream<TcpStream>>,
    closed: AtomicBool,
    io_queue_retries: u32,
}

/// A TLS-wrapped TCP connection, established client-side. Server-side TLS
/// (accepting a handshake) is not implemented — every consumer of this
/// workspace connects outward, never terminates inbound TLS.
#[derive(Clone)]
pub struct TlsSocket {
    inner: Arc<Inner>,
}

impl TlsSocket {
    /// Connects a plain TCP socket to `host`/`port`, then layers a TLS
    /// client handshake on top using `tls_config`, with SNI always set from
    /// `host` unless `server_name_override` is present. The whole sequence
    /// — TCP connect plus TLS handshake — shares `ctx`'s single deadline,
    /// matching spec's connect-timeout covering the full round trip.
    pub async fn connect(
        host: &str,
        port: u16,
        socket_options: &SocketOptions,
        tls_config: &TlsConfig,
        ctx: &CallContext,
    ) -> Result<Self> {
        let tcp = super::connect_tcp(host, port, socket_options, ctx).await?;

        let server_name_str = tls_config
            .server_name_override
            .clone()
            .unwrap_or_else(|| host.to_string());
        let server_name: ServerName<'static> = ServerName::try_from(server_name_str.clone())
            .map_err(|_| SocketError::tls_handshake_failed(format!("invalid server name: {server_name_str}")))?;

        let client_config = build(tls_config);
        let connector = TlsConnector::from(Arc::new(client_config));

        // The handshake runs on an already-established TCP stream — it does
        // CPU-bound crypto and framing, not fd/socket-buffer allocation, so
        // it never raises `ResourceExhausted` and isn't wrapped in a retry.
        let stream = run_with_context(ctx, async {
            connector
                .connect(server_name, tcp)
                .await
                .map_err(|err| SocketError::tls_handshake_failed(err.to_string()))
        })
        .await?;

        Ok(Self {
            inner: Arc::new(Inner {
                stream: AsyncMutex::new(stream),
                closed: AtomicBool::new(false),
                io_queue_retries: socket_options.io_queue_retries,
            }),
        })
    }

    pub fn is_open(&self) -> bool {
        !self.inner.closed.load(Ordering::Acquire)
    }

    /// Reads up to `buf.len()` bytes. As with the plain TCP engine, a
    /// graceful close (record-layer `close_notify` or a zero-length read on
    /// the underlying stream) raises `ConnectionClosed` rather than
    /// returning `Ok(0)`, and marks the socket closed.
    pub async fn read(&self, buf: &mut [u8], ctx: &CallContext) -> Result<usize> {
        if !self.is_open() {
            return Err(SocketError::ConnectionClosed);
        }
        let n = retry_on_exhaustion(self.inner.io_queue_retries, || {
            run_with_context(ctx, async {
                let mut stream = self.inner.stream.lock().await;
                stream.read(buf).await.map_err(SocketError::from)
            })
        })
        .await?;
        if n == 0 {
            self.inner.closed.store(true, Ordering::Release);
            return Err(SocketError::ConnectionClosed);
        }
        Ok(n)
    }

    pub async fn write(&self, buf: &[u8], ctx: &CallContext) -> Result<()> {
        if !self.is_open() {
            return Err(SocketError::ConnectionClosed);
        }
        retry_on_exhaustion(self.inner.io_queue_retries, || {
            run_with_context(ctx, async {
                let mut stream = self.inner.stream.lock().await;
                stream.write_all(buf).await.map_err(SocketError::from)
            })
        })
        .await
    }

    /// Idempotent. Attempts a `close_notify` alert before dropping the
    /// underlying TCP stream; failure to send it is not surfaced, since the
    /// peer will observe an abrupt close either way.
    pub async fn close(&self) -> Result<()> {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let mut stream = self.inner.stream.lock().await;
        let _ = stream.shutdown().await;
        Ok(())
    }
}
