use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use spark_socket_core::context::CallContext;
use spark_socket_core::error::{Result, SocketError};
use spark_socket_core::options::SocketOptions;
use spark_socket_reactor::{retry_on_exhaustion, run_with_context};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex as AsyncMutex;

use crate::config;
use crate::resolve::resolve;

struct Inner {
    stream: AsyncMutex<TcpStream>,
    peer_addr: SocketAddr,
    local_addr: SocketAddr,
    closed: AtomicBool,
    io_queue_retries: u32,
}

/// A single established TCP connection. Cheap to clone — every clone shares
/// the same underlying stream through the inner `Arc`, matching the donor
/// channel's shape: one socket, many handles, serialized access through an
/// async mutex rather than splitting into owned read/write halves.
#[derive(Clone)]
pub struct TcpSocket {
    inner: Arc<Inner>,
}

/// Which side of a full-duplex connection to shut down. Used by
/// `close_graceful`, which shuts down writes and then drains reads to EOF
/// rather than tearing the connection down immediately.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutdownDirection {
    Write,
    Both,
}

impl TcpSocket {
    /// Resolves `host`/`port` (loopback if `host` is `None`) and connects,
    /// honoring `ctx`'s deadline and cancellation. `options` is applied to
    /// the stream immediately after the connect completes. A connect that
    /// fails on a momentary kernel resource shortage (e.g. the process's fd
    /// table is briefly full) retries with backoff per
    /// `options.io_queue_retries` before giving up.
    pub async fn connect(
        host: Option<&str>,
        port: u16,
        options: &SocketOptions,
        ctx: &CallContext,
    ) -> Result<Self> {
        let addr = resolve(host, port).await?;
        let stream = retry_on_exhaustion(options.io_queue_retries, || {
            run_with_context(ctx, async {
                TcpStream::connect(addr).await.map_err(SocketError::from)
            })
        })
        .await?;
        Self::from_stream(stream, options)
    }

    pub(crate) fn from_stream(stream: TcpStream, options: &SocketOptions) -> Result<Self> {
        config::apply(&stream, options).map_err(SocketError::from)?;
        let peer_addr = stream.peer_addr().map_err(SocketError::from)?;
        let local_addr = stream.local_addr().map_err(SocketError::from)?;
        Ok(Self {
            inner: Arc::new(Inner {
                stream: AsyncMutex::new(stream),
                peer_addr,
                local_addr,
                closed: AtomicBool::new(false),
                io_queue_retries: options.io_queue_retries,
            }),
        })
    }

    pub fn is_open(&self) -> bool {
        !self.inner.closed.load(Ordering::Acquire)
    }

    pub fn local_port(&self) -> u16 {
        self.inner.local_addr.port()
    }

    pub fn remote_port(&self) -> u16 {
        self.inner.peer_addr.port()
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.inner.peer_addr
    }

    /// Reads up to `buf.len()` bytes. A graceful close on the peer's side
    /// surfaces as exactly one `ConnectionClosed` error rather than an
    /// `Ok(0)` — per spec, zero bytes on a graceful close raises closed,
    /// and the socket is marked closed so every call after that one also
    /// fails instead of silently spinning on repeated EOF reads.
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

    /// Writes the entirety of `buf`. On success exactly `buf.len()` bytes
    /// were written; any short write due to a closed peer surfaces as
    /// `ConnectionClosed` rather than returning a partial count, so callers
    /// never need to loop over a returned byte count themselves.
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

    pub async fn flush(&self, ctx: &CallContext) -> Result<()> {
        run_with_context(ctx, async {
            let mut stream = self.inner.stream.lock().await;
            stream.flush().await.map_err(SocketError::from)
        })
        .await
    }

    /// Idempotent: a second `close` on an already-closed socket is a no-op,
    /// not an error.
    pub async fn close(&self) -> Result<()> {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let mut stream = self.inner.stream.lock().await;
        let _ = stream.shutdown().await;
        Ok(())
    }

    /// Shuts down the requested direction, then for `ShutdownDirection::Write`
    /// drains incoming data until the peer's own EOF before marking the
    /// socket closed — a clean teardown that doesn't discard data the peer
    /// was still sending when we stopped writing.
    pub async fn close_graceful(&self, direction: ShutdownDirection, ctx: &CallContext) -> Result<()> {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let mut stream = self.inner.stream.lock().await;
        stream
            .shutdown()
            .await
            .map_err(SocketError::from)?;
        if direction == ShutdownDirection::Write {
            let mut sink = [0u8; 4096];
            loop {
                match run_with_context(ctx, async { stream.read(&mut sink).await.map_err(SocketError::from) }).await {
                    Ok(0) => break,
                    Ok(_) => continue,
                    Err(SocketError::ConnectionClosed) => break,
                    Err(err) => return Err(err),
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn loopback_pair() -> (TcpSocket, TcpSocket) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let options = SocketOptions::default();
        let ctx = CallContext::new(None);
        let (client, (server_stream, _)) = tokio::join!(
            TcpSocket::connect(Some("127.0.0.1"), addr.port(), &options, &ctx),
            async { listener.accept().await.unwrap() }
        );
        let server = TcpSocket::from_stream(server_stream, &options).unwrap();
        (client.unwrap(), server)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn round_trips_a_payload() {
        let (client, server) = loopback_pair().await;
        let ctx = CallContext::new(None);
        client.write(b"hello", &ctx).await.unwrap();
        let mut buf = [0u8; 5];
        let mut total = 0;
        while total < buf.len() {
            let n = server.read(&mut buf[total..], &ctx).await.unwrap();
            assert!(n > 0);
            total += n;
        }
        assert_eq!(&buf, b"hello");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn close_is_idempotent() {
        let (client, _server) = loopback_pair().await;
        client.close().await.unwrap();
        assert!(!client.is_open());
        client.close().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn read_after_peer_close_returns_connection_closed() {
        let (client, server) = loopback_pair().await;
        client.close().await.unwrap();
        let ctx = CallContext::new(None);
        let mut buf = [0u8; 16];
        let result = server.read(&mut buf, &ctx).await;
        assert!(matches!(result, Err(SocketError::ConnectionClosed)));
        assert!(!server.is_open());
        let result = server.read(&mut buf, &ctx).await;
        assert!(matches!(result, Err(SocketError::ConnectionClosed)));
    }
}
