use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::classify::RetryOn;
use super::defaults::{self, DefaultPolicy};
use super::report::{PrintReporter, Reporter};
use super::run::{Retry, Sleeper, ThreadSleeper};

/// Why the executor stopped retrying a retryable error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The failed attempt was the last one allowed.
    Exhausted,
    /// `max_duration` has elapsed since the first attempt.
    DurationExceeded,
}

/// Decision returned by the retry policy for a retryable failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Out of attempts; hand the last error back to the caller.
    Stop,
    /// Retry unless [`RetryPolicy::out_of_time`] says otherwise. `alert` is
    /// set once the alert threshold is reached.
    Retry { alert: bool },
}

/// Frozen retry parameters for one wrapper.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first). Always >= 1.
    pub max_retries: u32,
    /// Wait before the first retry.
    pub initial_delay: Duration,
    /// Growth factor applied to the wait after every retry.
    pub backoff_multiplier: f64,
    /// Wall-clock budget measured from the first attempt.
    pub max_duration: Option<Duration>,
    /// Attempt number from which every failed attempt reports a warning.
    pub alert_threshold: Option<u32>,
    /// Upper bound on a single wait. `None` lets the backoff grow without limit.
    pub max_delay: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        let d = defaults::RetryDefaults::default();
        Self {
            max_retries: d.max_retries,
            initial_delay: d.delay,
            backoff_multiplier: 2.0,
            max_duration: None,
            alert_threshold: None,
            max_delay: None,
        }
    }
}

impl RetryPolicy {
    /// Decide what to do after a retryable failure on `attempt` (1-based).
    pub fn decide(&self, attempt: u32) -> RetryDecision {
        if attempt >= self.max_retries {
            return RetryDecision::Stop;
        }
        RetryDecision::Retry {
            alert: self.alert_threshold.is_some_and(|t| attempt >= t),
        }
    }

    /// Whether `max_duration` has run out after `elapsed` since the first attempt.
    ///
    /// The executor asks only after reporting the alert, so time spent in the
    /// reporter counts against the budget.
    pub fn out_of_time(&self, elapsed: Duration) -> bool {
        self.max_duration.is_some_and(|max| elapsed >= max)
    }
}

/// Caller-supplied settings for a retry wrapper.
///
/// `max_retries` and `delay` fall back to a [`DefaultPolicy`] when unset.
/// Zero counts as unset for both: `max_retries(0)` and `delay(Duration::ZERO)`
/// pick up the defaults rather than meaning "no attempts" or "no wait". The
/// same holds for `max_duration` and `alert_threshold`, which become
/// disabled when given as zero.
pub struct RetryOptions<E> {
    max_retries: Option<u32>,
    delay: Option<Duration>,
    backoff_multiplier: f64,
    retry_on: RetryOn<E>,
    max_duration: Option<Duration>,
    alert_threshold: Option<u32>,
    max_delay: Option<Duration>,
    reporter: Arc<dyn Reporter>,
    sleeper: Arc<dyn Sleeper>,
}

impl<E> Default for RetryOptions<E> {
    fn default() -> Self {
        Self {
            max_retries: None,
            delay: None,
            backoff_multiplier: 2.0,
            retry_on: RetryOn::All,
            max_duration: None,
            alert_threshold: None,
            max_delay: None,
            reporter: Arc::new(PrintReporter),
            sleeper: Arc::new(ThreadSleeper),
        }
    }
}

impl<E> fmt::Debug for RetryOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOptions")
            .field("max_retries", &self.max_retries)
            .field("delay", &self.delay)
            .field("backoff_multiplier", &self.backoff_multiplier)
            .field("retry_on", &self.retry_on)
            .field("max_duration", &self.max_duration)
            .field("alert_threshold", &self.alert_threshold)
            .field("max_delay", &self.max_delay)
            .field("reporter", &self.reporter.name())
            .finish_non_exhaustive()
    }
}

impl<E> RetryOptions<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn retry_on(mut self, retry_on: RetryOn<E>) -> Self {
        self.retry_on = retry_on;
        self
    }

    pub fn max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = Some(max_duration);
        self
    }

    pub fn alert_threshold(mut self, threshold: u32) -> Self {
        self.alert_threshold = Some(threshold);
        self
    }

    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    pub fn reporter<R: Reporter + 'static>(mut self, reporter: R) -> Self {
        self.reporter = Arc::new(reporter);
        self
    }

    pub fn sleeper<S: Sleeper + 'static>(mut self, sleeper: S) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Merge these options with the current values of `defaults`.
    ///
    /// This is the only point where the defaults are read. The returned
    /// wrapper keeps its own copy; later `set_defaults` calls do not reach it.
    pub fn resolve(self, defaults: &DefaultPolicy) -> Retry<E> {
        let fallback = defaults.read_defaults();
        let max_retries = self
            .max_retries
            .filter(|&n| n != 0)
            .unwrap_or(fallback.max_retries);
        let delay = self.delay.filter(|d| !d.is_zero()).unwrap_or(fallback.delay);

        let policy = RetryPolicy {
            // A zero default still has to make one attempt.
            max_retries: max_retries.max(1),
            initial_delay: delay,
            backoff_multiplier: self.backoff_multiplier,
            max_duration: self.max_duration.filter(|d| !d.is_zero()),
            alert_threshold: self.alert_threshold.filter(|&t| t != 0),
            max_delay: self.max_delay,
        };
        tracing::debug!(?policy, "resolved retry policy");

        Retry::new(policy, self.retry_on, self.reporter, self.sleeper)
    }

    /// Resolve against the process-wide defaults.
    pub fn build(self) -> Retry<E> {
        self.resolve(defaults::global())
    }
}
