//! Fixed-interval, bounded polling.

use std::time::Duration;

use rollout_core::config::SyncPollConfig;

pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Blocks the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&SyncPollConfig::default())
    }
}

impl From<&SyncPollConfig> for PollPolicy {
    fn from(config: &SyncPollConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_secs),
            max_attempts: config.max_attempts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Ready { value: T, attempts: u32 },
    Exhausted { attempts: u32 },
}

/// Call `probe` with attempt numbers `1..=max_attempts` until it yields a value.
///
/// Sleeps `interval` between attempts, never after the last one.
pub fn poll_until<T>(
    policy: &PollPolicy,
    sleeper: &dyn Sleeper,
    mut probe: impl FnMut(u32) -> Option<T>,
) -> PollOutcome<T> {
    for attempt in 1..=policy.max_attempts {
        if let Some(value) = probe(attempt) {
            return PollOutcome::Ready {
                value,
                attempts: attempt,
            };
        }
        if attempt < policy.max_attempts {
            sleeper.sleep(policy.interval);
        }
    }
    PollOutcome::Exhausted {
        attempts: policy.max_attempts,
    }
}
