use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use spark_socket_core::error::{Result, SocketError};

/// Resolves `host` and `port` to a concrete [`SocketAddr`]. A missing host
/// (`None`) means "loopback" — the same convention the donor's listener
/// uses for an unspecified bind address, applied here to connect targets
/// that are local by construction (e.g. test fixtures). Resolution prefers
/// whatever address family the platform resolver returns first; callers
/// wanting a specific family should pass a literal IP as `host`.
pub async fn resolve(host: Option<&str>, port: u16) -> Result<SocketAddr> {
    let host = host.unwrap_or("localhost");
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }
    if host.eq_ignore_ascii_case("localhost") {
        return Ok(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port));
    }
    let mut addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|_| SocketError::UnknownHost {
            host: host.to_string(),
        })?;
    addrs.next().ok_or_else(|| SocketError::UnknownHost {
        host: host.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_host_resolves_to_loopback() {
        let addr = resolve(None, 8080).await.unwrap();
        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), 8080);
    }

    #[tokio::test]
    async fn literal_ip_is_used_directly() {
        let addr = resolve(Some("127.0.0.1"), 9001).await.unwrap();
        assert_eq!(addr, "127.0.0.1:9001".parse().unwrap());
    }

    #[tokio::test]
    async fn unresolvable_host_is_unknown_host_error() {
        let result = resolve(Some("this-host-does-not-exist.invalid"), 80).await;
        assert!(matches!(result, Err(SocketError::UnknownHost { .. })));
    }
}
