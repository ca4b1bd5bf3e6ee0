use std::sync::Arc;

use bytes::Bytes;
use spark_socket_core::context::CallContext;
use spark_socket_core::error::{Result, SocketError};
use spark_socket_core::options::ConnectionOptions;
use spark_socket_buffer::{BufferPool, PooledBuffer};
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;

use crate::accumulator::StreamAccumulator;
use crate::socket::Socket;

/// A socket bound to a buffer pool and a stream accumulator — the unit
/// protocol implementers are expected to hold onto, rather than the bare
/// `Socket`. Every read goes through the pool so repeated small reads don't
/// each allocate a fresh buffer; every read's result lands in the
/// accumulator so streaming helpers can consume it as a byte flow instead
/// of a raw socket.
pub struct Connection {
    socket: Socket,
    pool: BufferPool,
    accumulator: AsyncMutex<StreamAccumulator>,
    options: ConnectionOptions,
    read_ahead: AsyncMutex<Option<CancellationToken>>,
}

impl Connection {
    pub fn new(socket: Socket, options: ConnectionOptions) -> Self {
        let pool = BufferPool::new(options.max_pool_size);
        Self {
            socket,
            pool,
            accumulator: AsyncMutex::new(StreamAccumulator::new()),
            options,
            read_ahead: AsyncMutex::new(None),
        }
    }

    pub async fn connect(
        host: Option<&str>,
        port: u16,
        options: ConnectionOptions,
        ctx: &CallContext,
    ) -> Result<Self> {
        let socket = Socket::connect(host, port, &options, ctx).await?;
        Ok(Self::new(socket, options))
    }

    pub fn is_open(&self) -> bool {
        self.socket.is_open()
    }

    pub fn pool_stats(&self) -> spark_socket_buffer::PoolStats {
        self.pool.stats()
    }

    /// Runs `body` with a freshly acquired pooled buffer sized to at least
    /// `min_capacity`; the buffer returns to the pool once `body` finishes,
    /// success or failure.
    pub async fn with_buffer<T, F>(&self, min_capacity: usize, body: F) -> T
    where
        F: FnOnce(&mut PooledBuffer) -> T,
    {
        let mut buf = self.pool.acquire(min_capacity);
        body(&mut buf)
    }

    /// Performs one socket read into a pooled buffer sized to this
    /// connection's default buffer size, and appends whatever was read to
    /// the stream accumulator. Returns the number of bytes read (`0` at
    /// EOF). The socket raises `ConnectionClosed` rather than `Ok(0)` on a
    /// graceful close; that's the one error this layer swallows, translating
    /// it into the accumulator's own EOF marker instead of propagating it as
    /// a read failure.
    async fn pump_one_read(&self, ctx: &CallContext) -> Result<usize> {
        let ctx = ctx.bounded_by(self.options.read_timeout);
        let mut buf = self.pool.acquire(self.options.default_buffer_size);
        buf.get_mut().resize(self.options.default_buffer_size, 0);
        let n = match self.socket.read(buf.get_mut(), &ctx).await {
            Ok(n) => n,
            Err(SocketError::ConnectionClosed) => 0,
            Err(err) => return Err(err),
        };
        let mut accumulator = self.accumulator.lock().await;
        if n == 0 {
            accumulator.mark_eof();
        } else {
            accumulator.push(Bytes::copy_from_slice(&buf.get()[..n]));
        }
        Ok(n)
    }

    /// Ensures at least `n` bytes are buffered (or EOF), pumping reads from
    /// the socket as needed.
    async fn ensure(&self, n: usize, ctx: &CallContext) -> Result<()> {
        loop {
            {
                let accumulator = self.accumulator.lock().await;
                if accumulator.is_ready(n) {
                    return Ok(());
                }
            }
            self.pump_one_read(ctx).await?;
        }
    }

    /// Reads up to `buf.len()` bytes, pumping the socket as needed. Returns
    /// fewer than `buf.len()` bytes only at EOF.
    pub async fn read(&self, buf: &mut [u8], ctx: &CallContext) -> Result<usize> {
        self.ensure(buf.len(), ctx).await?;
        let mut accumulator = self.accumulator.lock().await;
        let chunk = accumulator.take_contiguous(buf.len());
        buf[..chunk.len()].copy_from_slice(&chunk);
        Ok(chunk.len())
    }

    pub async fn write(&self, buf: &[u8], ctx: &CallContext) -> Result<()> {
        let ctx = ctx.bounded_by(self.options.write_timeout);
        self.socket.write(buf, &ctx).await
    }

    /// Returns the next available chunk of data, pumping exactly one socket
    /// read if nothing is buffered. `None` means the source reached EOF
    /// with nothing left to hand out — the natural end of a [`read_flow`]
    /// stream.
    ///
    /// [`read_flow`]: crate::flows::read_flow
    pub async fn next_chunk(&self, ctx: &CallContext) -> Result<Option<Bytes>> {
        loop {
            {
                let mut accumulator = self.accumulator.lock().await;
                let buffered = accumulator.buffered_len();
                if buffered > 0 {
                    return Ok(Some(accumulator.take_contiguous(buffered)));
                }
                if accumulator.is_eof() {
                    return Ok(None);
                }
            }
            if self.pump_one_read(ctx).await? == 0 {
                return Ok(None);
            }
        }
    }

    /// Starts a background task that keeps pumping reads into the
    /// accumulator ahead of demand, whenever less than `low_watermark`
    /// bytes are buffered. Replaces any previously running read-ahead task.
    /// The task is cooperative: it stops as soon as `close` cancels it or
    /// the socket reaches EOF/errors.
    pub async fn start_read_ahead(self: &Arc<Self>, low_watermark: usize) {
        let token = CancellationToken::new();
        *self.read_ahead.lock().await = Some(token.clone());
        let connection = self.clone();
        tokio::spawn(async move {
            loop {
                if token.is_cancelled() {
                    break;
                }
                let buffered = connection.accumulator.lock().await.buffered_len();
                if buffered >= low_watermark {
                    tokio::task::yield_now().await;
                    continue;
                }
                let ctx = CallContext::with_cancellation(None, token.clone());
                match connection.pump_one_read(&ctx).await {
                    Ok(0) => break,
                    Ok(_) => continue,
                    Err(_) => break,
                }
            }
        });
    }

    /// Closes the socket and cancels any running read-ahead task. Idempotent.
    pub async fn close(&self) -> Result<()> {
        if let Some(token) = self.read_ahead.lock().await.take() {
            token.cancel();
        }
        self.socket.close().await
    }
}
