use std::future::Future;

use spark_socket_core::context::CallContext;
use spark_socket_core::error::{Result, SocketError};

/// Races `future` against the context's deadline and cancellation token,
/// biased toward cancellation so a cancelled operation never returns a
/// "successful" result that raced past the check. This is the reactor's
/// entire contribution on top of the host runtime's own I/O driver: the
/// driver already multiplexes readiness, so the only thing left to add is
/// "stop waiting" semantics uniform across every suspending call site.
pub async fn run_with_context<T, F>(ctx: &CallContext, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let cancellation = ctx.cancellation();
    tokio::select! {
        biased;
        _ = cancellation.cancelled() => Err(SocketError::Cancelled),
        result = run_with_deadline(ctx, future) => result,
    }
}

async fn run_with_deadline<T, F>(ctx: &CallContext, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match ctx.deadline().instant() {
        Some(deadline) => tokio::select! {
            biased;
            _ = tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)) => Err(SocketError::Timeout),
            result = future => result,
        },
        None => future.await,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn cancellation_wins_over_a_pending_future() {
        let ctx = CallContext::new(None);
        ctx.cancel();
        let result: Result<()> = run_with_context(&ctx, std::future::pending()).await;
        assert!(matches!(result, Err(SocketError::Cancelled)));
    }

    #[tokio::test]
    async fn deadline_fires_before_a_slow_future_resolves() {
        let ctx = CallContext::new(Some(Duration::from_millis(10)));
        let result: Result<()> = run_with_context(&ctx, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(SocketError::Timeout)));
    }

    #[tokio::test]
    async fn ready_future_resolves_normally() {
        let ctx = CallContext::new(None);
        let result = run_with_context(&ctx, async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }
}
