//! Progress and warning messages emitted while retrying.
//!
//! A reporter only observes; nothing it does changes whether the executor
//! retries. A reporter that panics aborts the retry loop with it.

use std::fmt;
use std::io::Write;
use std::time::Duration;

/// Something worth telling the user between attempts.
#[derive(Clone, Copy)]
pub enum RetryEvent<'a> {
    /// A retryable failure; the executor will wait `delay` and try again.
    Retrying {
        attempt: u32,
        error: &'a dyn fmt::Display,
        delay: Duration,
    },
    /// The failed attempt is at or past the alert threshold.
    AlertThreshold { threshold: u32, attempt: u32 },
    /// `max_duration` elapsed; the last error is returned.
    DurationExceeded {
        elapsed: Duration,
        max_duration: Duration,
    },
}

impl fmt::Display for RetryEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryEvent::Retrying { attempt, error, .. } => {
                write!(f, "retry attempt {}, error: {}", attempt, error)
            }
            RetryEvent::AlertThreshold { threshold, .. } => {
                write!(f, "warning: retries passed the alert threshold ({})", threshold)
            }
            RetryEvent::DurationExceeded { .. } => {
                f.write_str("retry exceeded the maximum duration, giving up")
            }
        }
    }
}

/// Sink for human-readable retry messages.
pub trait Reporter: Send + Sync {
    fn report(&self, message: &str);

    /// Type name of the reporter, shown in `Debug` output of wrappers.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Called by the executor. Override to act on the structured event;
    /// the default renders it and forwards the text to [`Reporter::report`].
    fn report_event(&self, event: &RetryEvent<'_>) {
        self.report(&event.to_string());
    }
}

impl<F> Reporter for F
where
    F: Fn(&str) + Send + Sync,
{
    fn report(&self, message: &str) {
        self(message)
    }
}

/// Prints each message as one line on stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrintReporter;

impl Reporter for PrintReporter {
    fn report(&self, message: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", message);
    }
}

/// Drops every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn report(&self, _message: &str) {}
}

/// Sends messages to `tracing`, tagged with the operation name.
///
/// Retries log at INFO; alert and duration messages at WARN.
#[derive(Debug, Clone)]
pub struct TracingReporter {
    operation: String,
}

impl TracingReporter {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
        }
    }
}

impl Reporter for TracingReporter {
    fn report(&self, message: &str) {
        tracing::info!(operation = %self.operation, "{}", message);
    }

    fn report_event(&self, event: &RetryEvent<'_>) {
        match event {
            RetryEvent::Retrying { attempt, delay, .. } => tracing::info!(
                operation = %self.operation,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "{}",
                event
            ),
            RetryEvent::AlertThreshold { attempt, .. } => {
                tracing::warn!(operation = %self.operation, attempt, "{}", event)
            }
            RetryEvent::DurationExceeded {
                elapsed,
                max_duration,
            } => tracing::warn!(
                operation = %self.operation,
                elapsed_ms = elapsed.as_millis() as u64,
                max_duration_ms = max_duration.as_millis() as u64,
                "{}",
                event
            ),
        }
    }
}
