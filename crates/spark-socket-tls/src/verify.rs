use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::{
    CertificateError, DigitallySignedStruct, Error as RustlsError, RootCertStore, SignatureScheme,
};
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use spark_socket_core::options::TlsConfig;

/// True for the two `CertificateError` variants that `allow_expired_certificates`
/// is meant to suppress — a cert whose validity window doesn't cover `now`.
/// Every other `InvalidCertificate` reason (wrong issuer, bad signature,
/// name constraints, revocation) still fails verification.
fn is_validity_window_error(err: &CertificateError) -> bool {
    matches!(
        err,
        CertificateError::Expired | CertificateError::NotValidYet
    )
}

/// A `ServerCertVerifier` that honors the relaxed postures `TlsConfig`
/// exposes. Fully-verifying configurations should prefer
/// `rustls::client::WebPkiServerVerifier` directly instead of routing
/// through here — this verifier exists specifically to express the escape
/// hatches, not to replace the standard path for the common case.
#[derive(Debug)]
pub struct ConfigurableVerifier {
    roots: RootCertStore,
    provider: Arc<CryptoProvider>,
    verify_certificates: bool,
    verify_hostname: bool,
    allow_expired_certificates: bool,
}

impl ConfigurableVerifier {
    pub fn new(roots: RootCertStore, provider: Arc<CryptoProvider>, config: &TlsConfig) -> Self {
        Self {
            roots,
            provider,
            verify_certificates: config.verify_certificates && !config.allow_self_signed,
            verify_hostname: config.verify_hostname,
            allow_expired_certificates: config.allow_expired_certificates,
        }
    }
}

impl ServerCertVerifier for ConfigurableVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, RustlsError> {
        if !self.verify_certificates {
            return Ok(ServerCertVerified::assertion());
        }

        let verifier = rustls::client::WebPkiServerVerifier::builder_with_provider(
            Arc::new(self.roots.clone()),
            self.provider.clone(),
        )
        .build()
        .map_err(|err| RustlsError::General(err.to_string()))?;

        let verified = match verifier.verify_server_cert(
            end_entity,
            intermediates,
            server_name,
            ocsp_response,
            now,
        ) {
            Ok(verified) => verified,
            Err(RustlsError::InvalidCertificate(cert_err))
                if self.allow_expired_certificates && is_validity_window_error(&cert_err) =>
            {
                ServerCertVerified::assertion()
            }
            Err(err) => return Err(err),
        };

        if self.verify_hostname {
            Ok(verified)
        } else {
            Ok(ServerCertVerified::assertion())
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, RustlsError> {
        if !self.verify_certificates {
            return Ok(HandshakeSignatureValid::assertion());
        }
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, RustlsError> {
        if !self.verify_certificates {
            return Ok(HandshakeSignatureValid::assertion());
        }
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
