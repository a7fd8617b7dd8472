//! Retry decisions for coordinated remote calls

use crate::error::ConnectorError;
use std::time::Duration;
use tokio::time::Instant;

/// Classification of errors for retry decision making
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClassification {
    /// Connectivity failure that is safe to repeat
    Transient,
    /// Anything else; surfaced to the caller immediately
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Fixed pause before each retry
    pub delay: Duration,
    /// Failures observed later than this after their own attempt started are not retried
    pub max_elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_millis(250),
            max_elapsed: Duration::from_millis(4000),
        }
    }
}

/// Result of retry decision making
#[derive(Debug, Clone, PartialEq)]
pub enum RetryDecision {
    /// Retry the operation after the specified delay
    Retry { delay: Duration, attempt: u32 },
    /// Stop retrying and return the error
    Stop { reason: String, total_elapsed: Duration },
}

#[derive(Debug, Clone, Default)]
pub struct RetryManager {
    policy: RetryPolicy,
}

impl RetryManager {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn classify_error(&self, error: &ConnectorError) -> ErrorClassification {
        if error.is_transient() {
            ErrorClassification::Transient
        } else {
            ErrorClassification::Fatal
        }
    }

    /// Decide whether to retry after `retries` retries have already been made.
    ///
    /// All three must hold: retries left, the failure came fast, and the error is transient.
    pub fn should_retry(
        &self,
        error: &ConnectorError,
        retries: u32,
        start_time: Instant,
    ) -> RetryDecision {
        let elapsed = start_time.elapsed();

        if retries >= self.policy.max_retries {
            return RetryDecision::Stop {
                reason: format!("Maximum retry attempts ({}) exceeded", self.policy.max_retries),
                total_elapsed: elapsed,
            };
        }

        if elapsed > self.policy.max_elapsed {
            return RetryDecision::Stop {
                reason: format!(
                    "Failed after {}ms, past the {}ms retry window",
                    elapsed.as_millis(),
                    self.policy.max_elapsed.as_millis()
                ),
                total_elapsed: elapsed,
            };
        }

        match self.classify_error(error) {
            ErrorClassification::Fatal => RetryDecision::Stop {
                reason: "Error is not retryable".to_string(),
                total_elapsed: elapsed,
            },
            ErrorClassification::Transient => RetryDecision::Retry {
                delay: self.policy.delay,
                attempt: retries + 1,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transient() -> ConnectorError {
        ConnectorError::Connection("connection reset".to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_errors() {
        let manager = RetryManager::default();
        let start = Instant::now();
        assert_eq!(
            manager.should_retry(&transient(), 0, start),
            RetryDecision::Retry { delay: Duration::from_millis(250), attempt: 1 }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_after_max_retries() {
        let manager = RetryManager::default();
        let decision = manager.should_retry(&transient(), 3, Instant::now());
        assert!(matches!(decision, RetryDecision::Stop { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_on_slow_failure() {
        let manager = RetryManager::default();
        let start = Instant::now();
        tokio::time::advance(Duration::from_millis(4001)).await;
        assert!(matches!(
            manager.should_retry(&transient(), 0, start),
            RetryDecision::Stop { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_boundary_is_inclusive() {
        let manager = RetryManager::default();
        let start = Instant::now();
        tokio::time::advance(Duration::from_millis(4000)).await;
        assert!(matches!(
            manager.should_retry(&transient(), 0, start),
            RetryDecision::Retry { .. }
        ));
    }

    #[test]
    fn test_fatal_errors_are_not_retried() {
        let manager = RetryManager::default();
        let error = ConnectorError::Authentication("Unauthorized".to_string());
        assert_eq!(manager.classify_error(&error), ErrorClassification::Fatal);
    }
}
