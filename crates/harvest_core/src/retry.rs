use std::time::Duration;

/// Bounded retry with exponential backoff for a repeated advance step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Re-attempts allowed after the first try.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: f64,
    pub max_backoff: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { attempt: u32, delay: Duration },
    GiveUp { attempts: u32 },
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            multiplier: 2.0,
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// No waiting between attempts; used by tests and fixture runs.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff: Duration::ZERO,
            multiplier: 1.0,
            max_backoff: Duration::ZERO,
        }
    }

    /// Decide what to do after `failures` consecutive failures of the same step.
    pub fn decide(&self, failures: u32) -> RetryDecision {
        if failures == 0 || failures > self.max_attempts {
            return RetryDecision::GiveUp {
                attempts: failures.saturating_sub(1),
            };
        }
        RetryDecision::Retry {
            attempt: failures,
            delay: self.delay_for(failures),
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32) as i32;
        let factor = self.multiplier.max(1.0).powi(exponent);
        let millis = self.initial_backoff.as_millis() as f64 * factor;
        let capped = millis.min(self.max_backoff.as_millis() as f64);
        Duration::from_millis(capped.max(0.0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.decide(1),
            RetryDecision::Retry {
                attempt: 1,
                delay: Duration::from_millis(500)
            }
        );
        assert_eq!(
            policy.decide(3),
            RetryDecision::Retry {
                attempt: 3,
                delay: Duration::from_millis(2000)
            }
        );
        assert_eq!(policy.decide(4), RetryDecision::GiveUp { attempts: 3 });

        let wide = RetryPolicy {
            max_attempts: 10,
            ..RetryPolicy::default()
        };
        assert!(matches!(
            wide.decide(9),
            RetryDecision::Retry { delay, .. } if delay == Duration::from_secs(5)
        ));
    }
}
