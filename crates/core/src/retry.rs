//! Retry policy for model calls.
//!
//! Only rate limiting and upstream server faults are worth another attempt.
//! The delay after failed attempt `n` (1-based) is `base_delay * 2^n`, so the
//! default policy waits 2s, 4s, 8s and 16s across its five attempts.

use std::time::Duration;

/// Upper bound on attempts per model call, the first one included.
pub const MAX_ATTEMPTS: u32 = 5;

/// How an upstream failure should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// HTTP 429.
    RateLimited,
    /// HTTP 5xx.
    Server,
    /// Any other 4xx: malformed request, bad credentials, blocked content.
    Client,
    /// No usable status: transport, decode or empty-response failures.
    Unknown,
}

impl FailureClass {
    /// Classify a non-success HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => FailureClass::RateLimited,
            500..=599 => FailureClass::Server,
            400..=499 => FailureClass::Client,
            _ => FailureClass::Unknown,
        }
    }

    pub fn is_transient(self) -> bool {
        matches!(self, FailureClass::RateLimited | FailureClass::Server)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Set the attempt budget, kept within `1..=MAX_ATTEMPTS`.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.clamp(1, MAX_ATTEMPTS);
        self
    }

    /// Delay to wait after failed attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Whether attempt `attempt` (1-based) failing with `class` earns another try.
    pub fn should_retry(&self, attempt: u32, class: FailureClass) -> bool {
        class.is_transient() && attempt < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_statuses() {
        assert_eq!(FailureClass::from_status(429), FailureClass::RateLimited);
        assert_eq!(FailureClass::from_status(500), FailureClass::Server);
        assert_eq!(FailureClass::from_status(503), FailureClass::Server);
        assert_eq!(FailureClass::from_status(400), FailureClass::Client);
        assert_eq!(FailureClass::from_status(401), FailureClass::Client);
        assert_eq!(FailureClass::from_status(302), FailureClass::Unknown);
    }

    #[test]
    fn test_only_rate_limit_and_server_are_transient() {
        assert!(FailureClass::RateLimited.is_transient());
        assert!(FailureClass::Server.is_transient());
        assert!(!FailureClass::Client.is_transient());
        assert!(!FailureClass::Unknown.is_transient());
    }

    #[test]
    fn test_delay_is_two_to_the_attempt_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));
        assert_eq!(policy.delay_for(4), Duration::from_secs(16));
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(10), Duration::from_secs(60));
        assert_eq!(policy.delay_for(64), Duration::from_secs(60));
    }

    #[test]
    fn test_should_retry_respects_attempt_budget() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(1, FailureClass::RateLimited));
        assert!(policy.should_retry(4, FailureClass::Server));
        assert!(!policy.should_retry(5, FailureClass::RateLimited));
    }

    #[test]
    fn test_should_not_retry_fatal_failures() {
        let policy = RetryPolicy::default();
        assert!(!policy.should_retry(1, FailureClass::Client));
        assert!(!policy.should_retry(1, FailureClass::Unknown));
    }

    #[test]
    fn test_max_attempts_is_at_least_one() {
        assert_eq!(RetryPolicy::default().with_max_attempts(0).max_attempts, 1);
    }

    #[test]
    fn test_max_attempts_never_exceeds_five() {
        let policy = RetryPolicy::default().with_max_attempts(10);
        assert_eq!(policy.max_attempts, 5);
        assert!(policy.should_retry(4, FailureClass::RateLimited));
        assert!(!policy.should_retry(5, FailureClass::RateLimited));
        assert!(!policy.should_retry(7, FailureClass::RateLimited));
    }

    #[test]
    fn test_smaller_attempt_budget_is_kept() {
        assert_eq!(RetryPolicy::default().with_max_attempts(3).max_attempts, 3);
    }
}
