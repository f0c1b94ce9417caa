use crate::core::error::SimError;
use std::time::{Duration, Instant};

/// Throttles time steps so simulated time tracks real time scaled by `speedup`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacer {
    delay_between_steps: Duration,
}

impl Pacer {
    pub fn new(step_interval: Duration, speedup: u32) -> Result<Self, SimError> {
        if speedup == 0 {
            return Err(SimError::InvalidConfiguration(
                "speedup must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            delay_between_steps: step_interval / speedup,
        })
    }

    /// Real-time budget for one step
    pub fn delay_between_steps(&self) -> Duration {
        self.delay_between_steps
    }

    /// Time left to sleep after a step that took `elapsed`
    pub fn remaining(&self, elapsed: Duration) -> Duration {
        self.delay_between_steps.saturating_sub(elapsed)
    }

    /// Sleep out the remainder of the budget for a step started at `step_started`
    pub fn pace(&self, step_started: Instant) {
        let remaining = self.remaining(step_started.elapsed());
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speedup_divides_interval() {
        let pacer = Pacer::new(Duration::from_secs(1), 4).unwrap();
        assert_eq!(pacer.delay_between_steps(), Duration::from_millis(250));
    }

    #[test]
    fn test_remaining_subtracts_elapsed() {
        let pacer = Pacer::new(Duration::from_millis(100), 1).unwrap();
        assert_eq!(pacer.remaining(Duration::from_millis(30)), Duration::from_millis(70));
        assert_eq!(pacer.remaining(Duration::from_millis(150)), Duration::ZERO);
    }

    #[test]
    fn test_zero_speedup_rejected() {
        let result = Pacer::new(Duration::from_secs(1), 0);
        assert!(matches!(result, Err(SimError::InvalidConfiguration(_))));
    }
}
