use std::path::Path;

use rustls::RootCertStore;
use rustls_pki_types::CertificateDer;

/// Well-known system CA bundle paths, tried in this order before falling
/// back to the platform's native certificate store. Each entry is the
/// bundle shipped by the distribution family named in the comment; the
/// order runs from the most to least commonly encountered base image in
/// server deployments.
const WELL_KNOWN_BUNDLES: &[&str] = &[
    "/etc/ssl/certs/ca-certificates.crt", // Debian, Ubuntu
    "/etc/pki/tls/certs/ca-bundle.crt",   // RHEL, Fedora, CentOS
    "/etc/ssl/ca-bundle.pem",             // SUSE
    "/etc/ssl/cert.pem",                  // Alpine
];

/// Builds a root store by trying each well-known bundle path in order,
/// falling back to `rustls-native-certs` (the provider default) if none of
/// them exist or none contain usable certificates.
pub fn load_root_store() -> RootCertStore {
    let mut store = RootCertStore::empty();

    for path in WELL_KNOWN_BUNDLES {
        if let Some(certs) = read_bundle(path) {
            let (added, _) = store.add_parsable_certificates(certs);
            if added > 0 {
                tracing::debug!(path, added, "loaded CA bundle");
                return store;
            }
        }
    }

    match rustls_native_certs::load_native_certs().certs.into_iter().collect::<Vec<_>>() {
        certs if !certs.is_empty() => {
            let (added, _) = store.add_parsable_certificates(certs);
            tracing::debug!(added, "loaded native certificate store");
        }
        _ => {
            tracing::warn!("no system CA bundle found, falling back to bundled Mozilla roots");
            store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        }
    }

    store
}

fn read_bundle(path: &str) -> Option<Vec<CertificateDer<'static>>> {
    if !Path::new(path).exists() {
        return None;
    }
    let bytes = std::fs::read(path).ok()?;
    let certs: Vec<_> = rustls_pemfile::certs(&mut bytes.as_slice())
        .filter_map(|result| result.ok())
        .collect();
    if certs.is_empty() {
        None
    } else {
        Some(certs)
    }
}
