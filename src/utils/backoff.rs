// src/utils/backoff.rs
use rand::Rng;
use std::time::Duration;

/// Restart cooldown for the outer recovery wrapper: doubles per attempt
/// up to a cap, with a little jitter so restarts don't land in lockstep
/// with whatever took the exchange down.
#[derive(Debug)]
pub struct RestartBackoff {
    base: Duration,
    cap: Duration,
    jitter_factor: f64,
    attempt: u32,
}

impl RestartBackoff {
    pub fn new(base: Duration, cap: Duration, jitter_factor: f64) -> Self {
        Self {
            base,
            cap,
            jitter_factor: jitter_factor.max(0.0),
            attempt: 0,
        }
    }

    /// Delay before the next restart; increments the attempt counter.
    pub fn next_delay(&mut self) -> Duration {
        let doubled = self.base.saturating_mul(2u32.saturating_pow(self.attempt));
        let capped = doubled.min(self.cap);
        self.attempt = self.attempt.saturating_add(1);

        if self.jitter_factor == 0.0 {
            return capped;
        }
        let spread = capped.as_secs_f64() * self.jitter_factor;
        let jitter = rand::thread_rng().gen_range(-spread..=spread);
        Duration::from_secs_f64((capped.as_secs_f64() + jitter).max(0.0))
    }

    /// Call after a run that stayed healthy for a while.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_until_the_cap() {
        let mut backoff =
            RestartBackoff::new(Duration::from_secs(10), Duration::from_secs(60), 0.0);

        assert_eq!(backoff.next_delay(), Duration::from_secs(10));
        assert_eq!(backoff.next_delay(), Duration::from_secs(20));
        assert_eq!(backoff.next_delay(), Duration::from_secs(40));
        assert_eq!(backoff.next_delay(), Duration::from_secs(60));
        assert_eq!(backoff.next_delay(), Duration::from_secs(60));
    }

    #[test]
    fn reset_starts_the_ladder_over() {
        let mut backoff =
            RestartBackoff::new(Duration::from_secs(10), Duration::from_secs(60), 0.0);

        backoff.next_delay();
        backoff.next_delay();
        assert_eq!(backoff.attempt(), 2);

        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_secs(10));
    }

    #[test]
    fn jitter_stays_within_the_spread() {
        let mut backoff =
            RestartBackoff::new(Duration::from_secs(10), Duration::from_secs(60), 0.2);

        let secs = backoff.next_delay().as_secs_f64();
        assert!((8.0..=12.0).contains(&secs), "delay was {}", secs);
    }
}
