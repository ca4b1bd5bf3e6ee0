use std::env;
use std::time::Duration;

use crate::options::ConnectionOptions;

/// Overlay parsed from `SPARK_SOCKET_*` environment variables. Every field is
/// optional; values present here win over whatever the caller constructed
/// `ConnectionOptions` with, mirroring the env-overlay pattern used
/// throughout the donor workspace's configuration layer, minus its
/// audit/event plumbing (not needed at this crate's scope).
#[derive(Clone, Debug, Default)]
pub struct SocketEnvOverrides {
    pub connect_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
    pub tcp_no_delay: Option<bool>,
    pub max_pool_size: Option<usize>,
}

impl SocketEnvOverrides {
    /// Reads the overlay from `std::env`. Malformed values are ignored
    /// rather than treated as fatal — a misconfigured environment variable
    /// should fall back to the caller's default, not crash socket setup.
    pub fn from_env() -> Self {
        Self {
            connect_timeout: read_millis("SPARK_SOCKET_CONNECT_TIMEOUT_MS"),
            read_timeout: read_millis("SPARK_SOCKET_READ_TIMEOUT_MS"),
            write_timeout: read_millis("SPARK_SOCKET_WRITE_TIMEOUT_MS"),
            tcp_no_delay: read_bool("SPARK_SOCKET_TCP_NODELAY"),
            max_pool_size: read_usize("SPARK_SOCKET_MAX_POOL_SIZE"),
        }
    }

    /// Applies this overlay onto `options`, mutating in place. Only fields
    /// that were actually present in the environment are touched.
    pub fn apply(&self, options: &mut ConnectionOptions) {
        if let Some(timeout) = self.connect_timeout {
            options.connect_timeout = Some(timeout);
        }
        if let Some(timeout) = self.read_timeout {
            options.read_timeout = Some(timeout);
        }
        if let Some(timeout) = self.write_timeout {
            options.write_timeout = Some(timeout);
        }
        if let Some(no_delay) = self.tcp_no_delay {
            options.socket.tcp_no_delay = if no_delay {
                crate::options::Toggle::On
            } else {
                crate::options::Toggle::Off
            };
        }
        if let Some(max_pool_size) = self.max_pool_size {
            options.max_pool_size = max_pool_size;
        }
    }
}

fn read_millis(name: &str) -> Option<Duration> {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_millis)
}

fn read_bool(name: &str) -> Option<bool> {
    env::var(name).ok().and_then(|value| match value.as_str() {
        "1" | "true" | "TRUE" | "on" => Some(true),
        "0" | "false" | "FALSE" | "off" => Some(false),
        _ => None,
    })
}

fn read_usize(name: &str) -> Option<usize> {
    env::var(name).ok().and_then(|value| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_only_touches_present_fields() {
        let overrides = SocketEnvOverrides {
            max_pool_size: Some(128),
            ..Default::default()
        };
        let mut options = ConnectionOptions::default();
        let original_connect_timeout = options.connect_timeout;
        overrides.apply(&mut options);
        assert_eq!(options.max_pool_size, 128);
        assert_eq!(options.connect_timeout, original_connect_timeout);
    }

    #[test]
    fn read_bool_rejects_unrecognized_values() {
        env::set_var("SPARK_SOCKET_TEST_BOOL_REJECT", "maybe");
        assert_eq!(read_bool("SPARK_SOCKET_TEST_BOOL_REJECT"), None);
        env::remove_var("SPARK_SOCKET_TEST_BOOL_REJECT");
    }
}
