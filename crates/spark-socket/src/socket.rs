use spark_socket_core::context::CallContext;
use spark_socket_core::error::Result;
use spark_socket_core::options::ConnectionOptions;
use spark_socket_tcp::TcpSocket;
use spark_socket_tls::TlsSocket;

/// A connected socket, plain or TLS-wrapped behind one handle. Which
/// variant you get back from [`Socket::connect`] follows directly from
/// whether `options.tls` was set — callers that don't care which it is just
/// use the common `read`/`write`/`close` surface below.
#[derive(Clone)]
pub enum Socket {
    Plain(TcpSocket),
    Tls(TlsSocket),
}

impl Socket {
    /// Connects to `host`/`port`. Whether `options.tls` is set decides
    /// whether the result wraps a TLS handshake around the TCP connect.
    /// `None` for `host` connects to loopback. The whole sequence — TCP
    /// connect plus, for TLS, the handshake on top of it — is bounded by
    /// `options.connect_timeout`, tightened against whatever deadline `ctx`
    /// already carries rather than replacing it.
    pub async fn connect(
        host: Option<&str>,
        port: u16,
        options: &ConnectionOptions,
        ctx: &CallContext,
    ) -> Result<Self> {
        let ctx = ctx.bounded_by(options.connect_timeout);
        match &options.tls {
            Some(tls_config) => {
                let host = host.unwrap_or("localhost");
                let tls =
                    TlsSocket::connect(host, port, &options.socket, tls_config, &ctx).await?;
                Ok(Socket::Tls(tls))
            }
            None => {
                let plain = TcpSocket::connect(host, port, &options.socket, &ctx).await?;
                Ok(Socket::Plain(plain))
            }
        }
    }

    pub fn is_open(&self) -> bool {
        match self {
            Socket::Plain(socket) => socket.is_open(),
            Socket::Tls(socket) => socket.is_open(),
        }
    }

    pub async fn read(&self, buf: &mut [u8], ctx: &CallContext) -> Result<usize> {
        match self {
            Socket::Plain(socket) => socket.read(buf, ctx).await,
            Socket::Tls(socket) => socket.read(buf, ctx).await,
        }
    }

    pub async fn write(&self, buf: &[u8], ctx: &CallContext) -> Result<()> {
        match self {
            Socket::Plain(socket) => socket.write(buf, ctx).await,
            Socket::Tls(socket) => socket.write(buf, ctx).await,
        }
    }

    pub async fn close(&self) -> Result<()> {
        match self {
            Socket::Plain(socket) => socket.close().await,
            Socket::Tls(socket) => socket.close().await,
        }
    }
}
