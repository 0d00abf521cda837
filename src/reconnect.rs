// Exponential backoff between reconnect attempts

use crate::config::ReconnectConfig;
use std::time::Duration;

/// Next delay: current * multiplier, clamped to the configured maximum.
pub fn next_delay(current: Duration, config: &ReconnectConfig) -> Duration {
    Duration::try_from_secs_f64(current.as_secs_f64() * config.multiplier)
        .unwrap_or(config.max_delay())
        .min(config.max_delay())
}

/// Delay state across consecutive failed attempts.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: ReconnectConfig,
    current: Duration,
    attempt: u32,
}

impl Backoff {
    pub fn new(config: ReconnectConfig) -> Self {
        let current = config.initial_delay();
        Self {
            config,
            current,
            attempt: 0,
        }
    }

    /// Delay to wait before the next attempt; grows the following one.
    pub fn next(&mut self) -> Duration {
        let delay = self.current;
        self.attempt += 1;
        self.current = next_delay(self.current, &self.config);
        delay
    }

    /// Attempts made since the last reset.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Back to the initial delay after a successful connection.
    pub fn reset(&mut self) {
        self.current = self.config.initial_delay();
        self.attempt = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_delay_doubles() {
        let config = ReconnectConfig::default();
        let d = next_delay(Duration::from_secs(1), &config);
        assert_eq!(d, Duration::from_secs(2));
    }

    #[test]
    fn next_delay_clamps_at_max() {
        let config = ReconnectConfig {
            max_delay_ms: 10_000,
            ..Default::default()
        };
        let d = next_delay(Duration::from_secs(8), &config);
        assert_eq!(d, Duration::from_secs(10));
    }

    #[test]
    fn next_delay_saturates_instead_of_overflowing() {
        let config = ReconnectConfig {
            max_delay_ms: u64::MAX,
            multiplier: 1e300,
            ..Default::default()
        };
        let d = next_delay(Duration::from_secs(u64::MAX / 2), &config);
        assert_eq!(d, config.max_delay());
    }

    #[test]
    fn backoff_sequence_with_defaults() {
        let mut backoff = Backoff::new(ReconnectConfig::default());
        let expected = [1, 2, 4, 8, 16, 30, 30, 30];
        for &secs in &expected {
            assert_eq!(backoff.next().as_secs(), secs);
        }
        assert_eq!(backoff.attempt(), expected.len() as u32);
    }

    #[test]
    fn reset_restarts_from_initial_delay() {
        let mut backoff = Backoff::new(ReconnectConfig::default());
        backoff.next();
        backoff.next();
        backoff.reset();
        assert_eq!(backoff.attempt(), 0);
        assert_eq!(backoff.next(), Duration::from_secs(1));
    }
}
