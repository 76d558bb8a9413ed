//! Exponential backoff retry policy.

use std::time::{Duration, SystemTime};

use reqwest_retry::{RetryDecision, RetryPolicy};

/// Exponential backoff retry policy.
///
/// Retries failed requests with exponentially increasing delays, capped at a maximum.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl BackoffPolicy {
    /// Create a new retry policy with default delays (1s base, 60s cap).
    ///
    /// # Arguments
    ///
    /// * `max_retries` - Maximum number of retry attempts
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }

    /// Override the base and maximum delay between attempts.
    pub fn with_delays(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self.max_delay = max_delay.max(base_delay);
        self
    }

    /// Calculate exponential backoff delay.
    fn exponential_delay(&self, n_attempts: u32) -> Duration {
        let delay = self.base_delay.as_secs_f64() * 2_f64.powi(n_attempts as i32);
        Duration::from_secs_f64(delay.min(self.max_delay.as_secs_f64()))
    }
}

impl RetryPolicy for BackoffPolicy {
    fn should_retry(&self, _request_start_time: SystemTime, n_past_retries: u32) -> RetryDecision {
        if n_past_retries >= self.max_retries {
            RetryDecision::DoNotRetry
        } else {
            let delay = self.exponential_delay(n_past_retries);
            RetryDecision::Retry {
                execute_after: SystemTime::now() + delay,
            }
        }
    }
}
