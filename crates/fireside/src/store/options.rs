use std::time::Duration;

use bon::Builder;
use smol_str::SmolStr;
use url::Url;

/// Public document service endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://firestore.googleapis.com/v1/";

/// Database used when none is configured.
pub const DEFAULT_DATABASE: &str = "(default)";

/// Configuration for a [`DocumentStore`](super::DocumentStore).
///
/// - `endpoint`: base URL of the REST API, ending in `/`. Point it at an
///   emulator for local testing.
/// - `database`: database id within the project.
/// - `timeout`: applied to every individual request.
/// - `retry`: backoff schedule for conflicting updates.
#[derive(Debug, Clone, Builder)]
#[builder(start_fn = new)]
pub struct StoreOptions {
    /// Base URL of the REST API
    pub endpoint: Url,
    /// Database id
    #[builder(into)]
    pub database: SmolStr,
    /// Per-request timeout
    pub timeout: Duration,
    /// Backoff schedule for [`update`](super::DocumentStore::update)
    pub retry: RetryPolicy,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self::new()
            .endpoint(Url::parse(DEFAULT_ENDPOINT).expect("default endpoint should be a valid url"))
            .database(DEFAULT_DATABASE)
            .timeout(Duration::from_secs(60))
            .retry(RetryPolicy::default())
            .build()
    }
}

/// Backoff schedule for optimistic updates.
///
/// The first `fast_attempts` attempts run back to back. Attempt
/// `fast_attempts + k` (k ≥ 1) waits `initial_backoff × multiplier^(k−1)`
/// first. Once that wait would reach `max_backoff` the update gives up.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(start_fn = new)]
pub struct RetryPolicy {
    /// Attempts made without waiting
    pub fast_attempts: u32,
    /// Wait before the first delayed attempt
    pub initial_backoff: Duration,
    /// Growth factor between delayed attempts
    pub multiplier: f64,
    /// Waits at or above this end the update
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
            .fast_attempts(4)
            .initial_backoff(Duration::from_secs(1))
            .multiplier(1.5)
            .max_backoff(Duration::from_secs(60))
            .build()
    }
}

impl RetryPolicy {
    /// How long to wait before the 1-based `attempt`, or `None` when the
    /// schedule is exhausted.
    pub fn backoff_for(&self, attempt: u32) -> Option<Duration> {
        if attempt <= self.fast_attempts {
            return Some(Duration::ZERO);
        }
        let exponent = i32::try_from(attempt - self.fast_attempts - 1).unwrap_or(i32::MAX);
        let secs = self.initial_backoff.as_secs_f64() * self.multiplier.powi(exponent);
        let wait = Duration::try_from_secs_f64(secs).ok()?;
        (wait < self.max_backoff).then_some(wait)
    }

    /// Total number of attempts the schedule allows. `None` if it does not
    /// end within 10,000 attempts.
    pub fn max_attempts(&self) -> Option<u32> {
        (1..=10_000u32)
            .find(|attempt| self.backoff_for(*attempt).is_none())
            .map(|first_refused| first_refused - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule() {
        let policy = RetryPolicy::default();
        for attempt in 1..=4 {
            assert_eq!(policy.backoff_for(attempt), Some(Duration::ZERO));
        }
        assert_eq!(policy.backoff_for(5), Some(Duration::from_secs(1)));
        assert_eq!(policy.backoff_for(6), Some(Duration::from_millis(1500)));
        assert_eq!(policy.backoff_for(7), Some(Duration::from_millis(2250)));
        // 1.5^10 ≈ 57.7 s is the last wait under a minute
        assert!(policy.backoff_for(15).is_some());
        assert_eq!(policy.backoff_for(16), None);
        assert_eq!(policy.max_attempts(), Some(15));
    }

    #[test]
    fn non_growing_schedule_is_unbounded() {
        let policy = RetryPolicy::new()
            .fast_attempts(0)
            .initial_backoff(Duration::from_millis(10))
            .multiplier(1.0)
            .max_backoff(Duration::from_secs(1))
            .build();
        assert_eq!(policy.backoff_for(1), Some(Duration::from_millis(10)));
        assert_eq!(policy.backoff_for(500), Some(Duration::from_millis(10)));
        assert_eq!(policy.max_attempts(), None);
    }

    #[test]
    fn invalid_multiplier_ends_schedule() {
        let policy = RetryPolicy::new()
            .fast_attempts(1)
            .initial_backoff(Duration::from_secs(1))
            .multiplier(-2.0)
            .max_backoff(Duration::from_secs(60))
            .build();
        assert_eq!(policy.backoff_for(2), Some(Duration::from_secs(1)));
        assert_eq!(policy.backoff_for(3), None);
    }

    #[test]
    fn options_defaults() {
        let options = StoreOptions::default();
        assert_eq!(options.endpoint.as_str(), DEFAULT_ENDPOINT);
        assert_eq!(options.database, "(default)");
        assert_eq!(options.timeout, Duration::from_secs(60));
        assert_eq!(options.retry, RetryPolicy::default());
    }
}
