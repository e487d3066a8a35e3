//! Retry and backoff policy.
//!
//! This module wraps a fallible operation in a bounded retry loop: a fixed
//! number of attempts, exponential backoff between them, an optional
//! wall-clock cutoff and an optional alert threshold. Policies are resolved
//! once against a [`DefaultPolicy`] and then frozen; changing the defaults
//! later never affects a wrapper that already exists.
//!
//! The caller's error type is never wrapped. Whether the loop stopped because
//! attempts ran out or because `max_duration` elapsed is only visible through
//! the reporter messages, not through the returned error.

mod backoff;
mod classify;
mod defaults;
mod policy;
mod report;
mod run;

pub use backoff::{capped, next_delay, Backoff};
pub use classify::{io_kinds, transient_io, RetryOn};
pub use defaults::{global, setup_retry, DefaultPolicy, RetryDefaults};
pub use policy::{RetryDecision, RetryOptions, RetryPolicy, StopReason};
pub use report::{NoopReporter, PrintReporter, Reporter, RetryEvent, TracingReporter};
pub use run::{retry, run_with_retry, Retry, Sleeper, ThreadSleeper};
