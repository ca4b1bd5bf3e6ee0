use std::time::Duration;

use spark_socket_core::options::SocketOptions;
use tokio::net::TcpStream;

/// Applies [`SocketOptions`] to a freshly connected or accepted
/// `TcpStream`. `SO_LINGER` goes through `socket2`'s `SockRef`, the same
/// path the donor's TCP channel uses, since `tokio::net::TcpStream` doesn't
/// expose it directly.
pub fn apply(stream: &TcpStream, options: &SocketOptions) -> std::io::Result<()> {
    if options.tcp_no_delay.resolve(true) {
        stream.set_nodelay(true)?;
    } else {
        stream.set_nodelay(false)?;
    }

    if let Some(linger) = options.linger {
        set_linger(stream, Some(linger))?;
    }

    let sock_ref = socket2::SockRef::from(stream);
    if let Some(size) = options.receive_buffer_size {
        sock_ref.set_recv_buffer_size(size)?;
    }
    if let Some(size) = options.send_buffer_size {
        sock_ref.set_send_buffer_size(size)?;
    }
    if options.keep_alive.resolve(false) {
        sock_ref.set_keepalive(true)?;
    }

    Ok(())
}

fn set_linger(stream: &TcpStream, linger: Option<Duration>) -> std::io::Result<()> {
    let sock_ref = socket2::SockRef::from(stream);
    sock_ref.set_linger(linger)
}
