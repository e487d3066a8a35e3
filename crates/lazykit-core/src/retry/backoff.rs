//! Exponential backoff between attempts.

use std::time::Duration;

/// Next wait after a failed attempt: `current * multiplier`.
///
/// Saturates at `Duration::MAX`; a negative or NaN product yields zero.
pub fn next_delay(current: Duration, multiplier: f64) -> Duration {
    let secs = current.as_secs_f64() * multiplier;
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

/// Apply an optional upper bound to a delay.
pub fn capped(delay: Duration, max_delay: Option<Duration>) -> Duration {
    match max_delay {
        Some(max) => delay.min(max),
        None => delay,
    }
}

/// Successive waits starting at an initial delay.
///
/// Yields `initial`, `initial * m`, `initial * m^2`, ... each passed through
/// the optional cap. The iterator never ends; use `take`.
#[derive(Debug, Clone)]
pub struct Backoff {
    current: Duration,
    multiplier: f64,
    max_delay: Option<Duration>,
}

impl Backoff {
    pub fn new(initial: Duration, multiplier: f64, max_delay: Option<Duration>) -> Self {
        Self {
            current: capped(initial, max_delay),
            multiplier,
            max_delay,
        }
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let out = self.current;
        self.current = capped(next_delay(self.current, self.multiplier), self.max_delay);
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_by_default_multiplier() {
        assert_eq!(
            next_delay(Duration::from_millis(250), 2.0),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn fractional_multiplier() {
        assert_eq!(
            next_delay(Duration::from_secs(2), 1.5),
            Duration::from_secs(3)
        );
    }

    #[test]
    fn zero_delay_stays_zero() {
        assert_eq!(next_delay(Duration::ZERO, 2.0), Duration::ZERO);
    }

    #[test]
    fn overflow_saturates() {
        assert_eq!(next_delay(Duration::MAX, 2.0), Duration::MAX);
    }

    #[test]
    fn negative_and_nan_multipliers_clamp_to_zero() {
        assert_eq!(next_delay(Duration::from_secs(1), -1.0), Duration::ZERO);
        assert_eq!(next_delay(Duration::from_secs(1), f64::NAN), Duration::ZERO);
    }

    #[test]
    fn schedule_grows_unbounded_without_cap() {
        let waits: Vec<_> = Backoff::new(Duration::from_secs(1), 2.0, None)
            .take(5)
            .collect();
        assert_eq!(
            waits,
            vec![1, 2, 4, 8, 16]
                .into_iter()
                .map(Duration::from_secs)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn schedule_respects_cap() {
        let max = Duration::from_secs(5);
        let last = Backoff::new(Duration::from_secs(1), 2.0, Some(max))
            .take(10)
            .last()
            .unwrap();
        assert_eq!(last, max);
    }
}
