use std::sync::Arc;

use rustls::ClientConfig;
use spark_socket_core::options::TlsConfig;

use crate::trust_store::load_root_store;
use crate::verify::ConfigurableVerifier;

/// Builds the `rustls::ClientConfig` for one connection's [`TlsConfig`].
/// Fully-verifying configurations get the standard WebPKI verifier path
/// through `with_root_certificates`; any configuration that relaxes
/// verification routes through [`ConfigurableVerifier`] instead, so the
/// escape hatches stay opt-in and explicit rather than silently weakening
/// the default builder.
pub fn build(config: &TlsConfig) -> ClientConfig {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let roots = load_root_store();

    if config.is_insecure() {
        rustls::ClientConfig::builder_with_provider(provider.clone())
            .with_safe_default_protocol_versions()
            .expect("default protocol versions are always valid")
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(ConfigurableVerifier::new(
                roots, provider, config,
            )))
            .with_no_client_auth()
    } else {
        ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .expect("default protocol versions are always valid")
            .with_root_certificates(roots)
            .with_no_client_auth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fully_verifying_config_builds() {
        let config = TlsConfig::default();
        let _ = build(&config);
    }

    #[test]
    fn insecure_config_builds_via_custom_verifier() {
        let mut config = TlsConfig::default();
        config.allow_self_signed = true;
        config.verify_hostname = false;
        let _ = build(&config);
    }
}
