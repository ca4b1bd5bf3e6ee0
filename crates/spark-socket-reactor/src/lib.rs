//! A thin submission/cancellation layer over the host async runtime's own
//! I/O driver. The driver already multiplexes readiness; this crate adds
//! the deadline, cancellation and backpressure-retry contract every socket
//! operation in this workspace needs on top of it.

pub mod backoff;
pub mod submit;

pub use backoff::retry_on_exhaustion;
pub use submit::run_with_context;
