//! Exponential backoff for accept retries.

use std::time::Duration;

use crate::config::BackoffConfig;

/// Calculate the exponential backoff delay for a retry attempt.
///
/// Attempt 0 means "no failure yet" and yields zero. Attempt `n` yields
/// `base * 2^(n-1)`, capped at `max`.
pub fn calculate_backoff(attempt: u32, base: Duration, max: Duration) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let factor = 2u32.saturating_pow(attempt - 1);
    base.saturating_mul(factor).min(max)
}

/// Backoff state for one run of retries.
///
/// Starts at zero delay. Every [`next_delay`](Backoff::next_delay) call
/// moves to the next step: `initial`, then double the previous, never above
/// `max`. Nothing is shared between instances.
#[derive(Debug, Clone)]
pub struct Backoff {
    attempt: u32,
    initial: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            attempt: 0,
            initial,
            max,
        }
    }

    pub fn from_config(config: &BackoffConfig) -> Self {
        Self::new(config.initial(), config.max())
    }

    /// Advance and return the delay to sleep before the next retry.
    pub fn next_delay(&mut self) -> Duration {
        self.attempt = self.attempt.saturating_add(1);
        self.current()
    }

    /// The delay of the last step, zero before any failure.
    pub fn current(&self) -> Duration {
        calculate_backoff(self.attempt, self.initial, self.max)
    }

    /// Number of failures seen so far.
    pub fn attempts(&self) -> u32 {
        self.attempt
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::from_config(&BackoffConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_backoff_calculation() {
        assert_eq!(calculate_backoff(0, ms(5), ms(1000)), Duration::ZERO);
        assert_eq!(calculate_backoff(1, ms(5), ms(1000)), ms(5));
        assert_eq!(calculate_backoff(2, ms(5), ms(1000)), ms(10));
        assert_eq!(calculate_backoff(8, ms(5), ms(1000)), ms(640));
        assert_eq!(calculate_backoff(9, ms(5), ms(1000)), ms(1000));
        assert_eq!(calculate_backoff(u32::MAX, ms(5), ms(1000)), ms(1000));
    }

    #[test]
    fn default_sequence_doubles_then_caps() {
        let mut backoff = Backoff::default();
        assert_eq!(backoff.current(), Duration::ZERO);

        let delays: Vec<u64> = (0..12)
            .map(|_| backoff.next_delay().as_millis() as u64)
            .collect();
        assert_eq!(
            delays,
            vec![5, 10, 20, 40, 80, 160, 320, 640, 1000, 1000, 1000, 1000]
        );
    }

    #[test]
    fn each_step_is_min_of_double_and_cap() {
        let mut backoff = Backoff::new(ms(7), ms(300));
        let mut prev = backoff.next_delay();
        assert_eq!(prev, ms(7));
        for _ in 0..20 {
            let next = backoff.next_delay();
            assert_eq!(next, (prev * 2).min(ms(300)));
            prev = next;
        }
    }

    #[test]
    fn instances_are_independent() {
        let mut a = Backoff::default();
        let mut b = Backoff::default();
        a.next_delay();
        a.next_delay();
        assert_eq!(a.current(), ms(10));
        assert_eq!(b.next_delay(), ms(5));
        assert_eq!(a.attempts(), 2);
    }
}
