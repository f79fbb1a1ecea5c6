//! Bounded-time receive.
//!
//! The host side of the link must never hang waiting for a peer that does
//! not respond, so every host receive races the blocking poll against a
//! deadline on the same scheduler. Expiry is not an error: the caller
//! treats "empty" and "no data yet" identically, and the abandoned poll
//! future simply drops -- the endpoint's cancel-safe reads guarantee no
//! partial frame is retained (see
//! [`FrameSource::poll_frame`](halflink_core::FrameSource::poll_frame)).
//!
//! The remote unit calls the unguarded receive instead: it can always
//! expect another command from the host eventually.

use std::future::Future;
use std::time::Duration;

use halflink_core::error::Result;

/// Default deadline for a byte-level guarded receive.
pub const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_secs(10);

/// Default deadline for a text-level guarded receive.
pub const DEFAULT_TEXT_TIMEOUT: Duration = Duration::from_secs(2);

/// Run a blocking receive with a deadline.
///
/// Returns the receive's result if it completes in time, `Ok(vec![])` if
/// the deadline elapses first. Transport errors from the underlying
/// receive propagate unchanged.
pub async fn recv_guarded<F>(recv: F, limit: Duration) -> Result<Vec<u8>>
where
    F: Future<Output = Result<Vec<u8>>>,
{
    match tokio::time::timeout(limit, recv).await {
        Ok(result) => result,
        Err(_) => {
            tracing::trace!(
                timeout_ms = limit.as_millis(),
                "receive deadline elapsed, returning empty"
            );
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use halflink_core::error::Error;

    #[tokio::test(start_paused = true)]
    async fn completed_receive_passes_through() {
        let result = recv_guarded(async { Ok(vec![1, 2, 3]) }, Duration::from_secs(10)).await;
        assert_eq!(result.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn never_completing_receive_returns_empty_at_deadline() {
        let started = tokio::time::Instant::now();
        let result = recv_guarded(
            async {
                std::future::pending::<()>().await;
                unreachable!()
            },
            Duration::from_secs(10),
        )
        .await;

        assert_eq!(result.unwrap(), Vec::<u8>::new());
        assert_eq!(started.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn transport_error_propagates() {
        let result = recv_guarded(
            async { Err(Error::ConnectionLost) },
            Duration::from_secs(10),
        )
        .await;
        assert!(matches!(result, Err(Error::ConnectionLost)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_receive_still_beats_deadline() {
        let result = recv_guarded(
            async {
                tokio::time::sleep(Duration::from_secs(9)).await;
                Ok(vec![42])
            },
            Duration::from_secs(10),
        )
        .await;
        assert_eq!(result.unwrap(), vec![42]);
    }
}
