//! Bounded retry with a fixed backoff and an injectable sleeper.
//!
//! The search phase is the only place that retries. A failure is classified
//! into a [`FailureType`], [`RetryPolicy::should_retry`] turns that into a
//! [`RetryDecision`], and the caller waits through a [`Sleeper`] so tests can
//! count delays without real waiting.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use paperfetch_core::retry::{FailureType, RetryDecision, RetryPolicy};
//!
//! let policy = RetryPolicy::new(3, Duration::from_secs(5));
//! match policy.should_retry(FailureType::RateLimited, 1, None) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         assert_eq!(delay, Duration::from_secs(5));
//!         assert_eq!(attempt, 2);
//!     }
//!     RetryDecision::DoNotRetry { reason } => panic!("{reason}"),
//! }
//! ```

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default fixed backoff between attempts (5 seconds).
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(5);

/// Maximum Retry-After value honored (1 hour).
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// Classification of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Temporary failure: network error, timeout, 5xx.
    Transient,
    /// Won't succeed on retry: 4xx other than 429, malformed request.
    Permanent,
    /// HTTP 429.
    RateLimited,
}

/// Decision on whether to retry a failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the delay.
    Retry {
        /// How long to wait first.
        delay: Duration,
        /// 1-indexed number of the next attempt.
        attempt: u32,
    },

    /// Give up.
    DoNotRetry {
        /// Human-readable reason.
        reason: String,
    },
}

/// Retry budget with a fixed backoff interval.
///
/// `max_retries` counts retries after the initial attempt, so a policy with
/// `max_retries = 3` makes at most four requests and sleeps at most three
/// times.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with an explicit retry budget and backoff.
    #[must_use]
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Retries allowed after the first attempt.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Fixed delay between attempts.
    #[must_use]
    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Decides whether attempt number `attempt` (1-indexed) should be retried.
    ///
    /// A server-provided `retry_after` replaces the fixed backoff for
    /// rate-limited responses.
    #[instrument(skip(self), fields(max_retries = self.max_retries))]
    pub fn should_retry(
        &self,
        failure_type: FailureType,
        attempt: u32,
        retry_after: Option<Duration>,
    ) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if attempt > self.max_retries {
            debug!(attempt, max = self.max_retries, "retry budget exhausted");
            return RetryDecision::DoNotRetry {
                reason: format!("max retries ({}) exhausted", self.max_retries),
            };
        }

        let delay = match (failure_type, retry_after) {
            (FailureType::RateLimited, Some(server_delay)) => server_delay.min(MAX_RETRY_AFTER),
            _ => self.backoff,
        };

        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }
}

/// Classifies an HTTP status code for retry purposes.
#[must_use]
pub fn classify_http_status(status: u16) -> FailureType {
    match status {
        429 => FailureType::RateLimited,
        408 | 500..=599 => FailureType::Transient,
        _ => FailureType::Permanent,
    }
}

/// Parses a `Retry-After` header value (delta-seconds or HTTP-date).
///
/// Returns `None` for negative, past or unparseable values. Values above
/// [`MAX_RETRY_AFTER`] are capped.
#[must_use]
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    let header_value = header_value.trim();

    if let Ok(seconds) = header_value.parse::<i64>() {
        let seconds = u64::try_from(seconds).ok()?;
        return Some(cap_retry_after(Duration::from_secs(seconds)));
    }

    let datetime = httpdate::parse_http_date(header_value).ok()?;
    let duration = datetime.duration_since(std::time::SystemTime::now()).ok()?;
    Some(cap_retry_after(duration))
}

fn cap_retry_after(duration: Duration) -> Duration {
    if duration > MAX_RETRY_AFTER {
        warn!(
            delay_secs = duration.as_secs(),
            max_secs = MAX_RETRY_AFTER.as_secs(),
            "Retry-After exceeds maximum, capping at 1 hour"
        );
        MAX_RETRY_AFTER
    } else {
        duration
    }
}

/// Waits between retry attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspends the caller for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Real sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Sleeper that returns immediately and records every requested delay.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far, in order.
    #[must_use]
    pub fn delays(&self) -> Vec<Duration> {
        self.delays
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Number of delays requested so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.delays().len()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut guard) = self.delays.lock() {
            guard.push(duration);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries(), 3);
        assert_eq!(policy.backoff(), Duration::from_secs(5));
    }

    #[test]
    fn test_rate_limited_retries_with_fixed_backoff() {
        let policy = RetryPolicy::default();
        for attempt in 1..=3 {
            assert_eq!(
                policy.should_retry(FailureType::RateLimited, attempt, None),
                RetryDecision::Retry {
                    delay: Duration::from_secs(5),
                    attempt: attempt + 1,
                }
            );
        }
    }

    #[test]
    fn test_budget_exhausted_after_max_retries() {
        let policy = RetryPolicy::default();
        assert!(matches!(
            policy.should_retry(FailureType::RateLimited, 4, None),
            RetryDecision::DoNotRetry { .. }
        ));
    }

    #[test]
    fn test_zero_retries_never_retries() {
        let policy = RetryPolicy::new(0, Duration::from_secs(5));
        assert!(matches!(
            policy.should_retry(FailureType::Transient, 1, None),
            RetryDecision::DoNotRetry { .. }
        ));
    }

    #[test]
    fn test_permanent_failure_not_retried() {
        let policy = RetryPolicy::default();
        match policy.should_retry(FailureType::Permanent, 1, None) {
            RetryDecision::DoNotRetry { reason } => assert!(reason.contains("permanent")),
            other => panic!("Expected DoNotRetry, got: {other:?}"),
        }
    }

    #[test]
    fn test_retry_after_overrides_backoff_for_rate_limit_only() {
        let policy = RetryPolicy::default();
        let server = Some(Duration::from_secs(12));
        assert_eq!(
            policy.should_retry(FailureType::RateLimited, 1, server),
            RetryDecision::Retry {
                delay: Duration::from_secs(12),
                attempt: 2,
            }
        );
        assert_eq!(
            policy.should_retry(FailureType::Transient, 1, server),
            RetryDecision::Retry {
                delay: Duration::from_secs(5),
                attempt: 2,
            }
        );
    }

    #[test]
    fn test_classify_http_status() {
        assert_eq!(classify_http_status(429), FailureType::RateLimited);
        assert_eq!(classify_http_status(500), FailureType::Transient);
        assert_eq!(classify_http_status(503), FailureType::Transient);
        assert_eq!(classify_http_status(408), FailureType::Transient);
        assert_eq!(classify_http_status(400), FailureType::Permanent);
        assert_eq!(classify_http_status(403), FailureType::Permanent);
        assert_eq!(classify_http_status(404), FailureType::Permanent);
    }

    #[test]
    fn test_parse_retry_after_seconds() {
        assert_eq!(parse_retry_after("7"), Some(Duration::from_secs(7)));
        assert_eq!(parse_retry_after(" 0 "), Some(Duration::ZERO));
        assert_eq!(parse_retry_after("-1"), None);
        assert_eq!(parse_retry_after("soon"), None);
    }

    #[test]
    fn test_parse_retry_after_caps_large_values() {
        assert_eq!(parse_retry_after("999999"), Some(MAX_RETRY_AFTER));
    }

    #[test]
    fn test_parse_retry_after_past_http_date_is_none() {
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }

    #[tokio::test]
    async fn test_recording_sleeper_records_without_waiting() {
        let sleeper = RecordingSleeper::new();
        sleeper.sleep(Duration::from_secs(3600)).await;
        sleeper.sleep(Duration::from_secs(5)).await;
        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_secs(3600), Duration::from_secs(5)]
        );
        assert_eq!(sleeper.count(), 2);
    }
}
