// Retry policy for the LLM Gateway, adapted from this workspace's
// `durable::reliability::retry::RetryPolicy`. The spec caps LLM retries at
// 3 attempts with exponential backoff; 429 triggers backoff, any other
// non-retryable 4xx propagates immediately.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub backoff_coefficient: f64,
    pub jitter: f64,
}

impl RetryPolicy {
    pub fn exponential(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(8),
            backoff_coefficient: 2.0,
            jitter: 0.1,
        }
    }

    /// 1-based attempt number; attempt 1 has zero delay.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let exponent = (attempt - 2) as f64;
        let raw_ms = self.initial_interval.as_millis() as f64
            * self.backoff_coefficient.powf(exponent);
        let capped_ms = raw_ms.min(self.max_interval.as_millis() as f64);

        let jitter_range = capped_ms * self.jitter;
        let jittered = if jitter_range > 0.0 {
            capped_ms + (rand::random::<f64>() * 2.0 - 1.0) * jitter_range
        } else {
            capped_ms
        };

        Duration::from_millis(jittered.max(0.0) as u64)
    }

    pub fn has_attempts_remaining(&self, current_attempt: u32) -> bool {
        current_attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_attempt_has_no_delay() {
        let policy = RetryPolicy::exponential(3);
        assert_eq!(policy.delay_for_attempt(1), Duration::ZERO);
    }

    #[test]
    fn delay_grows_with_attempt() {
        let policy = RetryPolicy {
            jitter: 0.0,
            ..RetryPolicy::exponential(5)
        };
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(500));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_millis(2000));
    }

    #[test]
    fn delay_is_capped_at_max_interval() {
        let policy = RetryPolicy {
            jitter: 0.0,
            ..RetryPolicy::exponential(10)
        };
        assert_eq!(policy.delay_for_attempt(10), policy.max_interval);
    }

    #[test]
    fn caps_attempts_at_three_by_default() {
        let policy = RetryPolicy::default();
        assert!(policy.has_attempts_remaining(1));
        assert!(policy.has_attempts_remaining(2));
        assert!(!policy.has_attempts_remaining(3));
    }
}
