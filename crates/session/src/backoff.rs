//! Reconnect delay schedule.

use std::time::Duration;

pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(3_000);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(30_000);

/// Exponential backoff: `min(base * 2^attempt, max)`.
///
/// Only the resulting delay is capped; the attempt counter itself may grow
/// without bound and large values saturate at `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    pub fn delay(&self, attempt: u64) -> Duration {
        let base_ms = self.base.as_millis().min(u64::MAX as u128) as u64;
        let factor = u32::try_from(attempt)
            .ok()
            .and_then(|exp| 2u64.checked_pow(exp));
        let delay_ms = factor
            .and_then(|f| base_ms.checked_mul(f))
            .unwrap_or(u64::MAX);
        Duration::from_millis(delay_ms).min(self.max)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_from_three_seconds_and_caps_at_thirty() {
        let backoff = Backoff::default();
        let delays: Vec<u128> = (0..6).map(|n| backoff.delay(n).as_millis()).collect();
        assert_eq!(delays, vec![3_000, 6_000, 12_000, 24_000, 30_000, 30_000]);
    }

    #[test]
    fn matches_closed_form_and_is_monotone() {
        let backoff = Backoff::default();
        let mut previous = Duration::ZERO;
        for n in 0..200u64 {
            let delay = backoff.delay(n);
            let expected = if n < 4 { 3_000u128 << n } else { 30_000 };
            assert_eq!(delay.as_millis(), expected, "attempt {n}");
            assert!(delay >= previous);
            assert!(delay <= DEFAULT_MAX_DELAY);
            previous = delay;
        }
    }

    #[test]
    fn huge_attempt_counts_saturate() {
        let backoff = Backoff::default();
        assert_eq!(backoff.delay(63), DEFAULT_MAX_DELAY);
        assert_eq!(backoff.delay(64), DEFAULT_MAX_DELAY);
        assert_eq!(backoff.delay(u64::MAX), DEFAULT_MAX_DELAY);
    }

    #[test]
    fn custom_schedule() {
        let backoff = Backoff::new(Duration::from_millis(10), Duration::from_millis(50));
        assert_eq!(backoff.delay(0), Duration::from_millis(10));
        assert_eq!(backoff.delay(2), Duration::from_millis(40));
        assert_eq!(backoff.delay(3), Duration::from_millis(50));
    }
}
