//! Scenarios that need a live internet connection. Run explicitly with
//! `cargo test -- --ignored` rather than as part of the default suite.

use spark_socket::{CallContext, ConnectionOptions, Socket, TlsConfig};

#[tokio::test]
#[ignore]
async fn https_round_trip_against_a_real_host() {
    let mut options = ConnectionOptions::default();
    options.tls = Some(TlsConfig::default());
    let ctx = CallContext::new(Some(std::time::Duration::from_secs(10)));

    let socket = Socket::connect(Some("example.com"), 443, &options, &ctx)
        .await
        .unwrap();
    socket
        .write(
            b"GET / HTTP/1.1\r\nHost: example.com\r\nConnection: close\r\n\r\n",
            &ctx,
        )
        .await
        .unwrap();

    let mut buf = [0u8; 64];
    let n = socket.read(&mut buf, &ctx).await.unwrap();
    assert!(n > 0);
    assert!(buf[..n].starts_with(b"HTTP/1.1"));
}

#[tokio::test]
#[ignore]
async fn self_signed_host_is_rejected_without_the_insecure_escape_hatch() {
    let mut options = ConnectionOptions::default();
    options.tls = Some(TlsConfig::default());
    let ctx = CallContext::new(Some(std::time::Duration::from_secs(10)));

    let result = Socket::connect(Some("self-signed.badssl.com"), 443, &options, &ctx).await;
    assert!(result.is_err());
}

#[tokio::test]
#[ignore]
async fn self_signed_host_is_accepted_with_allow_self_signed() {
    let mut tls = TlsConfig::default();
    tls.allow_self_signed = true;
    tls.verify_hostname = false;
    let mut options = ConnectionOptions::default();
    options.tls = Some(tls);
    let ctx = CallContext::new(Some(std::time::Duration::from_secs(10)));

    let socket = Socket::connect(Some("self-signed.badssl.com"), 443, &options, &ctx)
        .await
        .unwrap();
    assert!(socket.is_open());
}

#[tokio::test]
#[ignore]
async fn expired_host_is_rejected_without_allow_expired_certificates() {
    let mut options = ConnectionOptions::default();
    options.tls = Some(TlsConfig::default());
    let ctx = CallContext::new(Some(std::time::Duration::from_secs(10)));

    let result = Socket::connect(Some("expired.badssl.com"), 443, &options, &ctx).await;
    assert!(result.is_err());
}

#[tokio::test]
#[ignore]
async fn expired_host_is_accepted_with_allow_expired_certificates() {
    let mut tls = TlsConfig::default();
    tls.allow_expired_certificates = true;
    let mut options = ConnectionOptions::default();
    options.tls = Some(tls);
    let ctx = CallContext::new(Some(std::time::Duration::from_secs(10)));

    let socket = Socket::connect(Some("expired.badssl.com"), 443, &options, &ctx)
        .await
        .unwrap();
    assert!(socket.is_open());
}
