//! Process-wide fallback values for `max_retries` and `delay`.

use std::sync::{OnceLock, RwLock};
use std::time::Duration;

/// Fallback values used when a caller leaves `max_retries` or `delay` unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryDefaults {
    /// Maximum number of attempts (including the first).
    pub max_retries: u32,
    /// Initial delay before the first retry.
    pub delay: Duration,
}

impl Default for RetryDefaults {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(1),
        }
    }
}

/// Mutable store of [`RetryDefaults`].
///
/// Both fields live behind one lock so a reader never sees a half-updated
/// pair. The store is consulted only when a policy is resolved; resolved
/// policies keep their own copy.
#[derive(Debug, Default)]
pub struct DefaultPolicy {
    inner: RwLock<RetryDefaults>,
}

impl DefaultPolicy {
    pub fn new(defaults: RetryDefaults) -> Self {
        Self {
            inner: RwLock::new(defaults),
        }
    }

    /// Overwrite both defaults. No validation is applied.
    pub fn set_defaults(&self, max_retries: u32, delay: Duration) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = RetryDefaults { max_retries, delay };
        tracing::debug!(max_retries, delay_ms = delay.as_millis() as u64, "retry defaults updated");
    }

    /// Current snapshot of both defaults.
    pub fn read_defaults(&self) -> RetryDefaults {
        *self.inner.read().unwrap_or_else(|e| e.into_inner())
    }
}

static GLOBAL: OnceLock<DefaultPolicy> = OnceLock::new();

/// The process-wide default policy, initialized to 3 attempts and 1 second.
pub fn global() -> &'static DefaultPolicy {
    GLOBAL.get_or_init(DefaultPolicy::default)
}

/// Change the process-wide defaults.
///
/// Only wrappers resolved after this call pick up the new values.
pub fn setup_retry(max_retries: u32, delay: Duration) {
    global().set_defaults(max_retries, delay);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_defaults() {
        let d = RetryDefaults::default();
        assert_eq!(d.max_retries, 3);
        assert_eq!(d.delay, Duration::from_secs(1));
    }

    #[test]
    fn set_defaults_overwrites_both_fields() {
        let store = DefaultPolicy::default();
        store.set_defaults(7, Duration::from_millis(50));
        assert_eq!(
            store.read_defaults(),
            RetryDefaults {
                max_retries: 7,
                delay: Duration::from_millis(50),
            }
        );
    }

    #[test]
    fn set_defaults_accepts_zero() {
        let store = DefaultPolicy::new(RetryDefaults::default());
        store.set_defaults(0, Duration::ZERO);
        let d = store.read_defaults();
        assert_eq!(d.max_retries, 0);
        assert_eq!(d.delay, Duration::ZERO);
    }

    #[test]
    fn concurrent_readers_never_see_a_torn_pair() {
        let store = std::sync::Arc::new(DefaultPolicy::default());
        let writer = {
            let store = store.clone();
            std::thread::spawn(move || {
                for i in 1..200u32 {
                    store.set_defaults(i, Duration::from_millis(i as u64));
                }
            })
        };
        for _ in 0..200 {
            let d = store.read_defaults();
            if d.max_retries != 3 {
                assert_eq!(d.delay, Duration::from_millis(d.max_retries as u64));
            }
        }
        writer.join().unwrap();
    }
}
