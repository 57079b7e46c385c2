use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for DOM polling and click retries.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WaitPolicy {
    /// Overall deadline for one wait operation (milliseconds).
    pub wait_timeout_ms: u64,

    /// Pause between presence polls (milliseconds).
    pub poll_interval_ms: u64,

    /// Maximum simulated-click attempts.
    pub click_attempts: u32,

    /// Base delay before a retry click (milliseconds).
    pub click_base_delay_ms: u64,

    /// Extra delay added per failed attempt (milliseconds).
    pub click_step_delay_ms: u64,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            wait_timeout_ms: 18_000,
            poll_interval_ms: 600,
            click_attempts: 3,
            click_base_delay_ms: 300,
            click_step_delay_ms: 200,
        }
    }
}

impl WaitPolicy {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Delay before retrying after zero-based `attempt` failed.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.click_base_delay_ms + u64::from(attempt) * self.click_step_delay_ms)
    }

    /// Short intervals for tests so polling loops finish quickly.
    pub fn fast() -> Self {
        Self {
            wait_timeout_ms: 80,
            poll_interval_ms: 5,
            click_attempts: 3,
            click_base_delay_ms: 2,
            click_step_delay_ms: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_values() {
        let policy = WaitPolicy::default();
        assert_eq!(policy.wait_timeout_ms, 18_000);
        assert_eq!(policy.poll_interval_ms, 600);
        assert_eq!(policy.click_attempts, 3);
    }

    #[test]
    fn retry_delay_grows_linearly() {
        let policy = WaitPolicy::default();
        assert_eq!(policy.retry_delay(0), Duration::from_millis(300));
        assert_eq!(policy.retry_delay(1), Duration::from_millis(500));
        assert_eq!(policy.retry_delay(2), Duration::from_millis(700));
    }
}
