//! Bounded status polling.
//!
//! Every poll started by a session has a ceiling, and the session aborts
//! outstanding polls on teardown.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Ready,
    TimedOut,
}

/// Run `check` every `interval` until it reports `true` or `ceiling` elapses.
/// The first check happens after one interval.
pub async fn poll_until<F, Fut>(interval: Duration, ceiling: Duration, mut check: F) -> PollOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let polling = async {
        let mut checks: u64 = 0;
        loop {
            tokio::time::sleep(interval).await;
            checks += 1;
            if check().await {
                debug!(
                    component = "poll",
                    event = "poll.ready",
                    checks,
                    "Poll condition met"
                );
                return;
            }
        }
    };

    match tokio::time::timeout(ceiling, polling).await {
        Ok(()) => PollOutcome::Ready,
        Err(_) => PollOutcome::TimedOut,
    }
}
