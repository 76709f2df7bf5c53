//! # Bounded Decode Attempts
//!
//! A full-image bit-stream decode is `O(height x width x channels)` per plane
//! and can easily exceed a camera frame interval, so every attempt runs under
//! a hard wall-clock budget. The caller observes a result, a propagated
//! decode failure, or [`ScanError::DecodeTimeout`], whichever comes first; it
//! is never blocked past the budget plus scheduling epsilon.
//!
//! On timeout the blocking task is *detached*, not killed: there is no
//! cooperative cancellation point inside a bit read, so the attempt is left
//! to finish (or fail) in the background and its result is discarded. That
//! is an accepted, bounded resource leak.

use std::time::Duration;

use crate::scan::ScanError;
use crate::stego::StegoError;

/// Run a CPU-bound decode closure with a wall-clock budget.
///
/// The closure runs on the blocking thread pool; the await side is released
/// by whichever finishes first, the closure or the timer.
pub async fn run_bounded<T, F>(decode: F, limit: Duration) -> Result<T, ScanError>
where
    F: FnOnce() -> Result<T, StegoError> + Send + 'static,
    T: Send + 'static,
{
    let attempt = tokio::task::spawn_blocking(decode);
    match tokio::time::timeout(limit, attempt).await {
        Ok(Ok(outcome)) => outcome.map_err(ScanError::from),
        Ok(Err(join_error)) => Err(ScanError::DecodeWorker(join_error.to_string())),
        // Dropping the join handle detaches the still-running attempt.
        Err(_elapsed) => Err(ScanError::DecodeTimeout { limit }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn reports_timeout_without_blocking_the_caller() {
        let started = Instant::now();
        let outcome = run_bounded(
            || {
                std::thread::sleep(Duration::from_secs(10));
                Ok(())
            },
            Duration::from_millis(100),
        )
        .await;
        assert!(matches!(outcome, Err(ScanError::DecodeTimeout { .. })));
        assert!(
            started.elapsed() < Duration::from_secs(1),
            "caller must be released at the budget, not at decode completion"
        );
    }

    #[tokio::test]
    async fn passes_results_through_inside_the_budget() {
        let outcome = run_bounded(|| Ok(42u32), Duration::from_secs(1)).await;
        assert_eq!(outcome.unwrap(), 42);
    }

    #[tokio::test]
    async fn propagates_decode_failures() {
        let outcome: Result<(), _> = run_bounded(
            || {
                Err(StegoError::ReaderExhausted {
                    plane: 0,
                    bits_read: 12,
                })
            },
            Duration::from_secs(1),
        )
        .await;
        assert!(matches!(
            outcome,
            Err(ScanError::Stego(StegoError::ReaderExhausted { .. }))
        ));
    }
}
