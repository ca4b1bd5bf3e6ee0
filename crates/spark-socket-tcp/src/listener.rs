use std::net::{IpAddr, Ipv6Addr, SocketAddr};

use async_stream::try_stream;
use futures_core::stream::Stream;
use socket2::{Domain, Protocol, Socket, Type};
use spark_socket_core::context::CallContext;
use spark_socket_core::error::{Result, SocketError};
use spark_socket_core::options::SocketOptions;
use tokio::net::TcpListener as TokioTcpListener;

use crate::channel::TcpSocket;

/// Backlog handed to `listen(2)` when the caller doesn't override it —
/// the same `SOMAXCONN`-sized default most platforms' own listen backlog
/// uses.
const DEFAULT_BACKLOG: i32 = 1024;

/// A bound, listening TCP server socket. Binding a port of `0` asks the
/// platform to assign an ephemeral one, retrievable afterward through
/// [`TcpServerSocket::local_port`].
pub struct TcpServerSocket {
    listener: TokioTcpListener,
    io_queue_retries: u32,
}

impl TcpServerSocket {
    /// Binds `host`/`port`. A `None` host binds the IPv6 wildcard with
    /// `IPV6_V6ONLY` cleared, so IPv4 clients connect to the same listener
    /// through the dual-stack mapped-address path, matching the dual-stack
    /// default most server sockets in this ecosystem ship with. `backlog`
    /// overrides the kernel's pending-connection queue size; `None` falls
    /// back to [`DEFAULT_BACKLOG`].
    pub async fn bind(
        host: Option<&str>,
        port: u16,
        backlog: Option<i32>,
        options: &SocketOptions,
    ) -> Result<Self> {
        let addr = match host {
            Some(host) => {
                let ip: IpAddr = host
                    .parse()
                    .map_err(|_| SocketError::unsupported("bind host must be a literal IP"))?;
                SocketAddr::new(ip, port)
            }
            None => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), port),
        };

        let domain = if addr.is_ipv6() { Domain::IPV6 } else { Domain::IPV4 };
        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP)).map_err(SocketError::from)?;

        if addr.is_ipv6() {
            socket.set_only_v6(false).map_err(SocketError::from)?;
        }
        if options.reuse_address.resolve(true) {
            socket.set_reuse_address(true).map_err(SocketError::from)?;
        }
        socket.set_nonblocking(true).map_err(SocketError::from)?;
        socket.bind(&addr.into()).map_err(SocketError::from)?;
        socket
            .listen(backlog.unwrap_or(DEFAULT_BACKLOG))
            .map_err(SocketError::from)?;

        let std_listener: std::net::TcpListener = socket.into();
        let listener = TokioTcpListener::from_std(std_listener).map_err(SocketError::from)?;
        Ok(Self {
            listener,
            io_queue_retries: options.io_queue_retries,
        })
    }

    pub fn local_port(&self) -> u16 {
        self.listener
            .local_addr()
            .map(|addr| addr.port())
            .unwrap_or(0)
    }

    /// Accepts a single connection, honoring `ctx`'s deadline/cancellation.
    /// An `accept(2)` that fails on a momentary kernel resource shortage
    /// retries with backoff per this listener's `io_queue_retries` before
    /// giving up with `ResourceExhausted`.
    pub async fn accept(&self, options: &SocketOptions, ctx: &CallContext) -> Result<TcpSocket> {
        if ctx.is_cancelled() {
            return Err(SocketError::Cancelled);
        }
        if ctx.deadline().is_expired() {
            return Err(SocketError::Timeout);
        }
        let (stream, _peer) = spark_socket_reactor::retry_on_exhaustion(self.io_queue_retries, || {
            spark_socket_reactor::run_with_context(ctx, async {
                self.listener.accept().await.map_err(SocketError::from)
            })
        })
        .await?;
        TcpSocket::from_stream(stream, options)
    }

    /// A lazily polled, cancellable stream of accepted connections —
    /// `accept` called in a loop until `ctx` is cancelled or yields an
    /// error. Mirrors the donor's preference for `async-stream`-backed
    /// lazy flows over a hand-rolled `Stream` impl.
    pub fn incoming<'a>(
        &'a self,
        options: &'a SocketOptions,
        ctx: &'a CallContext,
    ) -> impl Stream<Item = Result<TcpSocket>> + 'a {
        try_stream! {
            loop {
                match self.accept(options, ctx).await {
                    Ok(socket) => yield socket,
                    Err(SocketError::Cancelled) => break,
                    Err(err) => Err(err)?,
                }
            }
        }
    }
}
