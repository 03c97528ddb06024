//! Cooperative throttling of store operations.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::trace;

/// Pause policy: after every `every`-th operation, suspend for `delay_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Zero disables pausing.
    pub every: usize,
    pub delay_ms: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            every: 10,
            delay_ms: 60,
        }
    }
}

impl ThrottleConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Counts operations and suspends the current task on schedule.
///
/// Pausing never reorders operations: the caller awaits [`Throttle::tick`]
/// between two store calls.
#[derive(Debug, Clone)]
pub struct Throttle {
    config: ThrottleConfig,
    count: usize,
}

impl Throttle {
    pub fn new(config: ThrottleConfig) -> Self {
        Self { config, count: 0 }
    }

    /// Record one operation, pausing if it completes a batch.
    pub async fn tick(&mut self) {
        self.count += 1;
        if self.config.every == 0 || self.count % self.config.every != 0 {
            return;
        }

        trace!(count = self.count, delay_ms = self.config.delay_ms, "Throttle pause");
        if self.config.delay_ms == 0 {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.config.delay()).await;
        }
    }

    /// Operations recorded so far.
    pub fn count(&self) -> usize {
        self.count
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(ThrottleConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_pauses_after_every_tenth_operation() {
        let mut throttle = Throttle::default();
        let start = Instant::now();

        for _ in 0..9 {
            throttle.tick().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);

        throttle.tick().await;
        let after_first_batch = start.elapsed();
        assert!(after_first_batch >= Duration::from_millis(60));

        for _ in 0..10 {
            throttle.tick().await;
        }
        assert!(start.elapsed() >= Duration::from_millis(120));
        assert_eq!(throttle.count(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_throttle_never_pauses() {
        let mut throttle = Throttle::new(ThrottleConfig {
            every: 0,
            delay_ms: 60,
        });
        let start = Instant::now();
        for _ in 0..50 {
            throttle.tick().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(throttle.count(), 50);
    }

    #[tokio::test]
    async fn test_zero_delay_still_counts() {
        let mut throttle = Throttle::new(ThrottleConfig {
            every: 2,
            delay_ms: 0,
        });
        for _ in 0..5 {
            throttle.tick().await;
        }
        assert_eq!(throttle.count(), 5);
    }

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let config: ThrottleConfig = serde_json::from_str(r#"{"every": 4}"#).unwrap();
        assert_eq!(config.every, 4);
        assert_eq!(config.delay_ms, 60);
    }
}
