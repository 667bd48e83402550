//! Bounded retry with a fixed pause.
//!
//! The loop is explicit: attempt, on failure pause unless the attempt was
//! the last one, stop at the first success. Pauses go through [`Sleeper`]
//! so they block only the calling worker and can be observed in tests.

use std::time::Duration;

use tracing::warn;

use crate::config::RetryPolicy;
use crate::errors::CallmapResult;

pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Blocks the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Result of running an operation under a [`RetryPolicy`].
#[derive(Debug)]
pub struct RetryOutcome<T> {
    pub value: Option<T>,
    /// Attempts actually made, 1..=max_attempts.
    pub attempts: u32,
}

impl<T> RetryOutcome<T> {
    pub fn succeeded(&self) -> bool {
        self.value.is_some()
    }
}

/// Run `op` until it succeeds or `policy.max_attempts` is exhausted.
///
/// `op` receives the 1-based attempt number. `label` names the unit of work
/// in failure logs.
pub fn run_with_retry<T, F>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    label: &str,
    mut op: F,
) -> RetryOutcome<T>
where
    F: FnMut(u32) -> CallmapResult<T>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    while attempt < max_attempts {
        attempt += 1;
        match op(attempt) {
            Ok(value) => {
                return RetryOutcome {
                    value: Some(value),
                    attempts: attempt,
                }
            }
            Err(e) => {
                warn!(target_name = label, attempt, max_attempts, error = %e, "attempt failed");
                if attempt < max_attempts {
                    sleeper.sleep(policy.delay());
                }
            }
        }
    }
    RetryOutcome {
        value: None,
        attempts: max_attempts,
    }
}
