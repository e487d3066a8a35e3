//! Decide which failures are retried and which propagate immediately.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::io;
use std::sync::Arc;

/// Which errors the executor catches and retries.
///
/// Anything not matched is returned to the caller on its first occurrence.
pub enum RetryOn<E> {
    /// Retry every error (the default).
    All,
    /// Retry only errors for which the predicate holds.
    When(Arc<dyn Fn(&E) -> bool + Send + Sync>),
}

impl<E> RetryOn<E> {
    pub fn when<F>(pred: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        RetryOn::When(Arc::new(pred))
    }

    /// Retry errors whose kind, as computed by `classify`, is in `kinds`.
    pub fn kinds<K, I, C>(kinds: I, classify: C) -> Self
    where
        K: Eq + Hash + Send + Sync + 'static,
        I: IntoIterator<Item = K>,
        C: Fn(&E) -> K + Send + Sync + 'static,
    {
        let set: HashSet<K> = kinds.into_iter().collect();
        Self::when(move |e| set.contains(&classify(e)))
    }

    pub fn matches(&self, err: &E) -> bool {
        match self {
            RetryOn::All => true,
            RetryOn::When(pred) => pred(err),
        }
    }
}

impl<E> Default for RetryOn<E> {
    fn default() -> Self {
        RetryOn::All
    }
}

impl<E> Clone for RetryOn<E> {
    fn clone(&self) -> Self {
        match self {
            RetryOn::All => RetryOn::All,
            RetryOn::When(pred) => RetryOn::When(Arc::clone(pred)),
        }
    }
}

impl<E> fmt::Debug for RetryOn<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryOn::All => f.write_str("All"),
            RetryOn::When(_) => f.write_str("When(..)"),
        }
    }
}

/// Retry IO errors of the listed kinds only.
pub fn io_kinds<I>(kinds: I) -> RetryOn<io::Error>
where
    I: IntoIterator<Item = io::ErrorKind>,
{
    RetryOn::kinds(kinds, io::Error::kind)
}

/// IO failures that usually clear up on their own.
pub fn transient_io() -> RetryOn<io::Error> {
    io_kinds([
        io::ErrorKind::TimedOut,
        io::ErrorKind::Interrupted,
        io::ErrorKind::WouldBlock,
        io::ErrorKind::ConnectionReset,
        io::ErrorKind::ConnectionRefused,
        io::ErrorKind::ConnectionAborted,
        io::ErrorKind::BrokenPipe,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_matches_everything() {
        let on: RetryOn<io::Error> = RetryOn::default();
        assert!(on.matches(&io::Error::new(io::ErrorKind::NotFound, "x")));
    }

    #[test]
    fn io_kinds_filters_by_kind() {
        let on = io_kinds([io::ErrorKind::TimedOut]);
        assert!(on.matches(&io::Error::new(io::ErrorKind::TimedOut, "slow")));
        assert!(!on.matches(&io::Error::new(io::ErrorKind::PermissionDenied, "no")));
    }

    #[test]
    fn transient_io_excludes_not_found() {
        let on = transient_io();
        assert!(on.matches(&io::Error::new(io::ErrorKind::ConnectionReset, "reset")));
        assert!(!on.matches(&io::Error::new(io::ErrorKind::NotFound, "gone")));
    }

    #[test]
    fn kinds_with_custom_classifier() {
        #[derive(Debug)]
        struct Status(u16);
        let on = RetryOn::kinds([true], |s: &Status| s.0 >= 500);
        assert!(on.matches(&Status(503)));
        assert!(!on.matches(&Status(404)));
    }

    #[test]
    fn clone_shares_predicate() {
        let on = RetryOn::when(|n: &i32| *n > 0);
        let copy = on.clone();
        assert!(copy.matches(&1));
        assert!(!copy.matches(&-1));
    }
}
