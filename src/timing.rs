// src/timing.rs
//! Randomized pauses between page actions

use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    min: Duration,
    max: Duration,
}

impl Pacing {
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        Self::new(Duration::from_millis(min_ms), Duration::from_millis(max_ms))
    }

    /// No waiting at all; used for dry runs and tests.
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn next_delay(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        Duration::from_millis(rand::rng().random_range(min..=max))
    }

    pub async fn pause(&self) -> Duration {
        let delay = self.next_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        delay
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::from_millis(1000, 3000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_within_bounds() {
        let pacing = Pacing::from_millis(100, 200);
        for _ in 0..50 {
            let delay = pacing.next_delay();
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(200));
        }
    }

    #[test]
    fn test_swapped_bounds_are_normalized() {
        let pacing = Pacing::from_millis(500, 100);
        let delay = pacing.next_delay();
        assert!(delay >= Duration::from_millis(100) && delay <= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_none_does_not_wait() {
        assert_eq!(Pacing::none().pause().await, Duration::ZERO);
    }
}
