//! Politeness delay between successive page fetches.

use std::time::Duration;

use rand::Rng;

/// Enforces a fixed delay, plus optional random jitter, before every fetch
/// except the first one of a run.
#[derive(Debug, Clone)]
pub struct Pacer {
    delay: Duration,
    jitter_ms: u64,
    has_fetched: bool,
}

impl Pacer {
    #[must_use]
    pub fn new(delay_ms: u64, jitter_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            jitter_ms,
            has_fetched: false,
        }
    }

    /// Sleeps for the pacing interval unless this is the first fetch.
    pub async fn pace(&mut self) {
        let wait = self.next_delay();
        self.has_fetched = true;
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }

    /// The delay the next [`Self::pace`] call will sleep for.
    fn next_delay(&self) -> Duration {
        if !self.has_fetched {
            return Duration::ZERO;
        }
        let jitter = if self.jitter_ms == 0 {
            0
        } else {
            rand::rng().random_range(0..=self.jitter_ms)
        };
        self.delay + Duration::from_millis(jitter)
    }
}
