//! Bounded retry with exponential backoff

use reqwest::Method;
use std::time::Duration;

/// Statuses retried by default
pub const DEFAULT_RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// When and how often a request is re-sent
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Base delay; doubles after every failed attempt
    pub backoff_factor: Duration,
    /// Upper bound for a single delay
    pub max_backoff: Duration,
    /// Response statuses that trigger a retry
    pub retry_statuses: Vec<u16>,
    /// Also retry POST and PATCH
    pub retry_non_idempotent: bool,
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self {
            max_attempts: 3,
            backoff_factor: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
            retry_statuses: DEFAULT_RETRY_STATUSES.to_vec(),
            retry_non_idempotent: false,
        }
    }

    /// Single attempt, never retried
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::new()
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_backoff(mut self, factor: Duration, max: Duration) -> Self {
        self.backoff_factor = factor;
        self.max_backoff = max;
        self
    }

    pub fn with_retry_statuses(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.retry_statuses = statuses.into_iter().collect();
        self
    }

    pub fn with_retry_non_idempotent(mut self, enabled: bool) -> Self {
        self.retry_non_idempotent = enabled;
        self
    }

    /// Delay before the attempt that follows `attempt` (1-based):
    /// `min(backoff_factor * 2^(attempt-1), max_backoff)`
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.backoff_factor
            .saturating_mul(1u32 << exponent)
            .min(self.max_backoff)
    }

    /// Whether a response with `status` to attempt number `attempt` should be
    /// re-sent
    pub fn should_retry(&self, method: &Method, status: u16, attempt: u32) -> bool {
        attempt < self.max_attempts
            && self.retry_statuses.contains(&status)
            && (self.retry_non_idempotent || is_idempotent(method))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// GET, HEAD, PUT, DELETE and OPTIONS can be repeated safely
pub fn is_idempotent(method: &Method) -> bool {
    *method == Method::GET
        || *method == Method::HEAD
        || *method == Method::PUT
        || *method == Method::DELETE
        || *method == Method::OPTIONS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_then_caps() {
        let policy = RetryPolicy::new()
            .with_backoff(Duration::from_millis(100), Duration::from_millis(350));
        assert_eq!(policy.delay(1), Duration::from_millis(100));
        assert_eq!(policy.delay(2), Duration::from_millis(200));
        assert_eq!(policy.delay(3), Duration::from_millis(350));
        assert_eq!(policy.delay(40), Duration::from_millis(350));
    }

    #[test]
    fn test_attempt_limit() {
        let policy = RetryPolicy::new();
        assert!(policy.should_retry(&Method::GET, 503, 1));
        assert!(policy.should_retry(&Method::GET, 503, 2));
        assert!(!policy.should_retry(&Method::GET, 503, 3));
    }

    #[test]
    fn test_only_listed_statuses() {
        let policy = RetryPolicy::new();
        assert!(policy.should_retry(&Method::GET, 429, 1));
        assert!(!policy.should_retry(&Method::GET, 404, 1));
        assert!(!policy.should_retry(&Method::GET, 400, 1));
    }

    #[test]
    fn test_non_idempotent_requires_opt_in() {
        let policy = RetryPolicy::new();
        assert!(!policy.should_retry(&Method::POST, 503, 1));
        assert!(!policy.should_retry(&Method::PATCH, 503, 1));
        assert!(policy.should_retry(&Method::PUT, 503, 1));

        let policy = policy.with_retry_non_idempotent(true);
        assert!(policy.should_retry(&Method::POST, 503, 1));
    }

    #[test]
    fn test_none_never_retries() {
        assert!(!RetryPolicy::none().should_retry(&Method::GET, 503, 1));
    }
}
