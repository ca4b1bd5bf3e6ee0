use std::sync::OnceLock;
use std::time::Instant;

static MONOTONIC_BASE: OnceLock<Instant> = OnceLock::new();

/// A fixed point established on first use; every duration this module hands
/// out is measured relative to it rather than `Instant::now()` at the call
/// site, so elapsed-time logging stays comparable across threads.
fn monotonic_base() -> Instant {
    *MONOTONIC_BASE.get_or_init(Instant::now)
}

/// Milliseconds elapsed since this process first asked for the time. Used
/// for log fields where an absolute `Instant` isn't serializable but a
/// comparable number is.
pub fn monotonic_now_ms() -> u64 {
    monotonic_base().elapsed().as_millis() as u64
}
