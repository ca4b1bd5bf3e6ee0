use std::time::Duration;

/// A tri-valued socket option: respect the platform default, or force it on
/// or off. Distinct from `Option<bool>` only in name — spelled out because
/// `SocketOptions` reads as self-documenting config rather than a grid of
/// `Option<bool>` fields whose `None` meaning isn't obvious at a call site.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Toggle {
    #[default]
    PlatformDefault,
    On,
    Off,
}

impl Toggle {
    pub fn resolve(self, platform_default: bool) -> bool {
        match self {
            Toggle::PlatformDefault => platform_default,
            Toggle::On => true,
            Toggle::Off => false,
        }
    }
}

/// Low-level TCP options applied at socket construction time. New fields may
/// be added here without breaking existing callers — every field defaults to
/// "leave the platform's choice alone".
#[derive(Clone, Debug)]
pub struct SocketOptions {
    pub tcp_no_delay: Toggle,
    pub reuse_address: Toggle,
    pub keep_alive: Toggle,
    pub receive_buffer_size: Option<usize>,
    pub send_buffer_size: Option<usize>,
    /// `SO_LINGER`, applied via `socket2` at construction. `None` leaves the
    /// platform default in place; `Some(Duration::ZERO)` requests an abortive
    /// close on drop instead of a graceful one.
    pub linger: Option<Duration>,
    /// Bounded retries when `connect`/`read`/`write`/`accept` hits a
    /// momentary kernel resource shortage (`SocketError::ResourceExhausted`),
    /// before giving up with that error. Lives here rather than on
    /// `ConnectionOptions` because `accept` only ever sees `SocketOptions`.
    pub io_queue_retries: u32,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            tcp_no_delay: Toggle::default(),
            reuse_address: Toggle::default(),
            keep_alive: Toggle::default(),
            receive_buffer_size: None,
            send_buffer_size: None,
            linger: None,
            io_queue_retries: 3,
        }
    }
}

/// Client-side TLS posture. The four `allow_*`/`verify_*` toggles exist so a
/// caller can deliberately weaken verification for local development or
/// test fixtures against self-signed peers — `is_insecure` makes that choice
/// visible to logging instead of silently falling through.
#[derive(Clone, Debug)]
pub struct TlsConfig {
    pub verify_certificates: bool,
    pub verify_hostname: bool,
    pub allow_expired_certificates: bool,
    pub allow_self_signed: bool,
    /// Overrides SNI/hostname verification target; defaults to the host
    /// passed to `connect`.
    pub server_name_override: Option<String>,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            verify_certificates: true,
            verify_hostname: true,
            allow_expired_certificates: false,
            allow_self_signed: false,
            server_name_override: None,
        }
    }
}

impl TlsConfig {
    /// True once any toggle has moved away from a fully verifying posture.
    /// Callers doing connection logging should surface this rather than
    /// re-deriving it from individual fields.
    pub fn is_insecure(&self) -> bool {
        !self.verify_certificates
            || !self.verify_hostname
            || self.allow_expired_certificates
            || self.allow_self_signed
    }
}

/// The threading/scheduling mode a `Connection` runs its suspending
/// operations under. `CurrentRuntime` is the only mode this workspace
/// implements; the others are named so callers coming from a multi-runtime
/// host aren't surprised by an unfamiliar default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ThreadingMode {
    #[default]
    CurrentRuntime,
    DedicatedWorker,
}

/// Bundles `SocketOptions` with the connection-level knobs spec.md's data
/// model names: per-call timeouts and the buffer pool's sizing.
#[derive(Clone, Debug)]
pub struct ConnectionOptions {
    pub socket: SocketOptions,
    pub tls: Option<TlsConfig>,
    pub connect_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
    pub max_pool_size: usize,
    pub default_buffer_size: usize,
    pub threading: ThreadingMode,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            socket: SocketOptions::default(),
            tls: None,
            connect_timeout: Some(Duration::from_secs(10)),
            read_timeout: None,
            write_timeout: None,
            max_pool_size: 64,
            default_buffer_size: 64 * 1024,
            threading: ThreadingMode::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_resolves_against_platform_default() {
        assert!(Toggle::PlatformDefault.resolve(true));
        assert!(!Toggle::PlatformDefault.resolve(false));
        assert!(Toggle::On.resolve(false));
        assert!(!Toggle::Off.resolve(true));
    }

    #[test]
    fn tls_config_defaults_are_fully_verifying() {
        let tls = TlsConfig::default();
        assert!(!tls.is_insecure());
    }

    #[test]
    fn tls_config_reports_insecure_when_any_toggle_relaxed() {
        let mut tls = TlsConfig::default();
        tls.allow_self_signed = true;
        assert!(tls.is_insecure());
    }

    #[test]
    fn socket_options_default_carries_a_nonzero_retry_budget() {
        assert_eq!(SocketOptions::default().io_queue_retries, 3);
    }
}
