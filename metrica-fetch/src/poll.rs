//! Polling policy for asynchronous export jobs.
//!
//! The export API answers `202 Accepted` while a job is being prepared. The
//! log-export client re-sends the same request after a fixed delay until the
//! job is ready. [`PollPolicy`] decides how long to wait and when to give up;
//! [`Sleeper`] performs the wait so tests can substitute a recorder.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::FetchError;

/// Default delay between status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

// ============================================================================
// Poll Policy
// ============================================================================

/// How often to re-check a pending export, and for how long.
///
/// The default waits forever with a 10 second interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Fixed delay between requests.
    pub interval: Duration,
    /// Maximum number of requests, including the first one.
    pub max_attempts: Option<u32>,
    /// Maximum total time spent sleeping.
    pub max_wait: Option<Duration>,
}

impl PollPolicy {
    /// Creates an unbounded policy with the given interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
            max_wait: None,
        }
    }

    /// Caps the number of requests.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Caps the total time spent waiting.
    #[must_use]
    pub fn with_max_wait(mut self, wait: Duration) -> Self {
        self.max_wait = Some(wait);
        self
    }

    /// Returns true if the policy never gives up.
    pub fn is_unbounded(&self) -> bool {
        self.max_attempts.is_none() && self.max_wait.is_none()
    }

    /// Starts tracking one polling loop.
    pub fn start(&self) -> PollState {
        PollState {
            policy: *self,
            attempts: 0,
            waited: Duration::ZERO,
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

// ============================================================================
// Poll State
// ============================================================================

/// Progress of one polling loop.
#[derive(Debug, Clone)]
pub struct PollState {
    policy: PollPolicy,
    attempts: u32,
    waited: Duration,
}

impl PollState {
    /// Records a pending response and returns how long to wait before the
    /// next request.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::PollExhausted`] when another request would
    /// exceed the policy.
    pub fn next_delay(&mut self) -> Result<Duration, FetchError> {
        self.attempts = self.attempts.saturating_add(1);

        let out_of_attempts = self
            .policy
            .max_attempts
            .is_some_and(|max| self.attempts >= max);
        let out_of_time = self
            .policy
            .max_wait
            .is_some_and(|max| self.waited.saturating_add(self.policy.interval) > max);

        if out_of_attempts || out_of_time {
            return Err(FetchError::PollExhausted {
                attempts: self.attempts,
                waited: self.waited,
            });
        }

        self.waited = self.waited.saturating_add(self.policy.interval);
        Ok(self.policy.interval)
    }

    /// Requests recorded as pending so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Total time scheduled for sleeping so far.
    pub fn waited(&self) -> Duration {
        self.waited
    }
}

// ============================================================================
// Sleeper
// ============================================================================

/// Something that can wait.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Waits for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the Tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unbounded() {
        let policy = PollPolicy::default();
        assert!(policy.is_unbounded());
        assert_eq!(policy.interval, Duration::from_secs(10));

        let mut state = policy.start();
        for _ in 0..10_000 {
            assert_eq!(state.next_delay().unwrap(), Duration::from_secs(10));
        }
        assert_eq!(state.attempts(), 10_000);
    }

    #[test]
    fn test_max_attempts_counts_requests() {
        // Three requests allowed: two pending answers may be waited out,
        // the third pending answer ends the loop.
        let mut state = PollPolicy::new(Duration::from_secs(1))
            .with_max_attempts(3)
            .start();

        assert!(state.next_delay().is_ok());
        assert!(state.next_delay().is_ok());
        match state.next_delay() {
            Err(FetchError::PollExhausted { attempts, waited }) => {
                assert_eq!(attempts, 3);
                assert_eq!(waited, Duration::from_secs(2));
            }
            other => panic!("expected PollExhausted, got {other:?}"),
        }
    }

    #[test]
    fn test_max_wait() {
        let mut state = PollPolicy::new(Duration::from_secs(10))
            .with_max_wait(Duration::from_secs(25))
            .start();

        assert!(state.next_delay().is_ok()); // 10s
        assert!(state.next_delay().is_ok()); // 20s
        assert!(state.next_delay().is_err()); // 30s > 25s
        assert_eq!(state.waited(), Duration::from_secs(20));
    }

    #[test]
    fn test_huge_interval_saturates() {
        let mut state = PollPolicy::new(Duration::MAX).start();
        assert_eq!(state.next_delay().unwrap(), Duration::MAX);
        assert_eq!(state.next_delay().unwrap(), Duration::MAX);
        assert_eq!(state.waited(), Duration::MAX);

        let mut state = PollPolicy::new(Duration::MAX)
            .with_max_wait(Duration::from_secs(60))
            .start();
        assert!(matches!(
            state.next_delay(),
            Err(FetchError::PollExhausted { attempts: 1, .. })
        ));
    }

    #[test]
    fn test_single_attempt_never_waits() {
        let mut state = PollPolicy::default().with_max_attempts(1).start();
        assert!(state.next_delay().is_err());
        assert_eq!(state.waited(), Duration::ZERO);
    }
}
