use std::time::Duration;

use spark_socket_core::error::{Result, SocketError};

const INITIAL_BACKOFF: Duration = Duration::from_millis(5);
const MAX_BACKOFF: Duration = Duration::from_millis(200);

/// Retries `attempt` up to `max_retries` times with bounded exponential
/// backoff whenever it reports the submission path is momentarily
/// saturated (`Err(SocketError::ResourceExhausted { .. })`). Any other
/// error, or success, returns immediately. After the budget is spent the
/// last `ResourceExhausted` is returned to the caller unchanged.
pub async fn retry_on_exhaustion<T, F, Fut>(max_retries: u32, mut attempt: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut backoff = INITIAL_BACKOFF;
    let mut tries = 0;
    loop {
        match attempt().await {
            Err(SocketError::ResourceExhausted { what }) if tries < max_retries => {
                tries += 1;
                tracing::debug!(what, tries, ?backoff, "retrying after resource exhaustion");
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
            other => return other,
        }
    }
}
