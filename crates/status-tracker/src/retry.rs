use std::time::Duration;

/// When to try again after a failed attempt or a dropped connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    /// Consecutive failures after which no further retry is scheduled.
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// A constant delay, retried indefinitely.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// The delay before the next attempt, or `None` once the budget is spent.
    pub fn next_delay(&self, consecutive_failures: u32) -> Option<Duration> {
        match self.max_attempts {
            Some(max) if consecutive_failures >= max => None,
            _ => Some(self.delay),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(5))
    }
}

impl From<&configuration::RetrySettings> for RetryPolicy {
    fn from(settings: &configuration::RetrySettings) -> Self {
        Self {
            delay: settings.delay(),
            max_attempts: settings.max_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_policy_never_gives_up() {
        let policy = RetryPolicy::fixed(Duration::from_secs(5));
        for failures in [0, 1, 10, u32::MAX] {
            assert_eq!(policy.next_delay(failures), Some(Duration::from_secs(5)));
        }
    }

    #[test]
    fn bounded_policy_stops_at_the_limit() {
        let policy = RetryPolicy::fixed(Duration::from_secs(1)).with_max_attempts(3);
        assert_eq!(policy.next_delay(2), Some(Duration::from_secs(1)));
        assert_eq!(policy.next_delay(3), None);
    }

    #[test]
    fn built_from_settings() {
        let settings = configuration::RetrySettings {
            delay_secs: 7,
            max_attempts: Some(2),
        };
        let policy = RetryPolicy::from(&settings);
        assert_eq!(policy.delay, Duration::from_secs(7));
        assert_eq!(policy.max_attempts, Some(2));
    }
}
