//! Retry loop: run a closure until success or the policy says stop.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::backoff::{capped, next_delay};
use super::classify::RetryOn;
use super::policy::{RetryDecision, RetryOptions, RetryPolicy, StopReason};
use super::report::{Reporter, RetryEvent};

/// Blocks between attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, delay: Duration);
}

/// Blocks the calling thread with `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

/// A resolved retry wrapper: frozen policy, error filter, reporter and sleeper.
///
/// Build one with [`RetryOptions`]. Cloning is cheap and clones share the
/// reporter and sleeper.
pub struct Retry<E> {
    policy: RetryPolicy,
    retry_on: RetryOn<E>,
    reporter: Arc<dyn Reporter>,
    sleeper: Arc<dyn Sleeper>,
}

impl<E> Clone for Retry<E> {
    fn clone(&self) -> Self {
        Self {
            policy: self.policy,
            retry_on: self.retry_on.clone(),
            reporter: Arc::clone(&self.reporter),
            sleeper: Arc::clone(&self.sleeper),
        }
    }
}

impl<E> fmt::Debug for Retry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retry")
            .field("policy", &self.policy)
            .field("retry_on", &self.retry_on)
            .field("reporter", &self.reporter.name())
            .finish_non_exhaustive()
    }
}

/// Per-call bookkeeping, discarded once the call returns.
struct AttemptState {
    attempt: u32,
    started: Instant,
    current_delay: Duration,
}

impl<E> Retry<E> {
    pub(super) fn new(
        policy: RetryPolicy,
        retry_on: RetryOn<E>,
        reporter: Arc<dyn Reporter>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            policy,
            retry_on,
            reporter,
            sleeper,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Wrap `f` so that every call goes through [`Retry::call`].
    ///
    /// Each attempt receives a clone of the arguments the wrapper was called
    /// with; use a tuple for several arguments.
    pub fn wrap<A, T, F>(self, f: F) -> impl Fn(A) -> Result<T, E>
    where
        A: Clone,
        F: Fn(A) -> Result<T, E>,
        E: fmt::Display,
    {
        move |args: A| self.call(|| f(args.clone()))
    }
}

impl<E: fmt::Display> Retry<E> {
    /// Run `op` until it succeeds or the policy gives up.
    ///
    /// Errors rejected by the filter are returned on first occurrence. When
    /// attempts or `max_duration` run out the last error is returned as is,
    /// so the two cases look the same to the caller; only the reporter
    /// messages tell them apart.
    pub fn call<T, F>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
    {
        let mut state = AttemptState {
            attempt: 1,
            started: Instant::now(),
            current_delay: self.policy.initial_delay,
        };
        loop {
            let err = match op() {
                Ok(value) => {
                    if state.attempt > 1 {
                        tracing::debug!(attempt = state.attempt, "operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) => e,
            };

            if !self.retry_on.matches(&err) {
                tracing::debug!(attempt = state.attempt, error = %err, "error is not retryable");
                return Err(err);
            }

            match self.policy.decide(state.attempt) {
                RetryDecision::Stop => {
                    return Err(Self::give_up(err, StopReason::Exhausted, &state));
                }
                RetryDecision::Retry { alert } => {
                    if let (true, Some(threshold)) = (alert, self.policy.alert_threshold) {
                        self.reporter.report_event(&RetryEvent::AlertThreshold {
                            threshold,
                            attempt: state.attempt,
                        });
                    }
                }
            }

            // Read after the alert so a slow reporter counts against the budget.
            let elapsed = state.started.elapsed();
            if self.policy.out_of_time(elapsed) {
                if let Some(max_duration) = self.policy.max_duration {
                    self.reporter.report_event(&RetryEvent::DurationExceeded {
                        elapsed,
                        max_duration,
                    });
                }
                return Err(Self::give_up(err, StopReason::DurationExceeded, &state));
            }

            self.reporter.report_event(&RetryEvent::Retrying {
                attempt: state.attempt,
                error: &err,
                delay: state.current_delay,
            });

            self.sleeper.sleep(state.current_delay);
            state.current_delay = capped(
                next_delay(state.current_delay, self.policy.backoff_multiplier),
                self.policy.max_delay,
            );
            state.attempt += 1;
        }
    }

    fn give_up(err: E, reason: StopReason, state: &AttemptState) -> E {
        tracing::warn!(
            attempt = state.attempt,
            ?reason,
            elapsed_ms = state.started.elapsed().as_millis() as u64,
            error = %err,
            "giving up"
        );
        err
    }
}

/// Runs a closure under `retry`'s policy. Same as [`Retry::call`].
pub fn run_with_retry<T, E, F>(retry: &Retry<E>, op: F) -> Result<T, E>
where
    E: fmt::Display,
    F: FnMut() -> Result<T, E>,
{
    retry.call(op)
}

/// Retry `op` with default options resolved against the global defaults.
pub fn retry<T, E, F>(op: F) -> Result<T, E>
where
    E: fmt::Display,
    F: FnMut() -> Result<T, E>,
{
    RetryOptions::default().build().call(op)
}
