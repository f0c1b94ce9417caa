use super::error::InstanceError;
use super::types::SimTime;
use log::warn;
use std::time::Duration;

/// Requested delay meaning "use the configured step interval"
pub const DEFAULT_CADENCE: Duration = Duration::ZERO;

/// Requested delay meaning "do not schedule this instance again"
pub const PAUSE_INDEFINITELY: Duration = Duration::MAX;

/// A simulated actor that the runner advances one time step at a time.
///
/// The runner owns a pending instance and moves it out of the timeline while it
/// steps, so an instance never has two steps in flight. Siblings in the same
/// slice may be stepped concurrently when the runner uses parallel stepping.
pub trait SimulationInstance: Send {
    /// Perform one step of work at `simulation_time` and return how long to
    /// wait before the next step.
    ///
    /// [`DEFAULT_CADENCE`] reschedules after one step interval,
    /// [`PAUSE_INDEFINITELY`] removes the instance from future slices, and any
    /// other delay is rounded up to a whole number of step intervals.
    fn process_time_step(&mut self, simulation_time: SimTime) -> Result<Duration, InstanceError>;
}

impl<T: SimulationInstance + ?Sized> SimulationInstance for Box<T> {
    fn process_time_step(&mut self, simulation_time: SimTime) -> Result<Duration, InstanceError> {
        (**self).process_time_step(simulation_time)
    }
}

/// Runs the wrapped instance with local failure capture.
///
/// A failed step is logged and treated as [`PAUSE_INDEFINITELY`], so one
/// misbehaving instance leaves the run instead of aborting it.
#[derive(Debug)]
pub struct Isolated<I> {
    inner: I,
    label: String,
    failures: u64,
}

impl<I: SimulationInstance> Isolated<I> {
    pub fn new(label: impl Into<String>, inner: I) -> Self {
        Self {
            inner,
            label: label.into(),
            failures: 0,
        }
    }

    /// Number of steps that failed and were converted to an opt-out
    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn inner(&self) -> &I {
        &self.inner
    }

    pub fn into_inner(self) -> I {
        self.inner
    }
}

impl<I: SimulationInstance> SimulationInstance for Isolated<I> {
    fn process_time_step(&mut self, simulation_time: SimTime) -> Result<Duration, InstanceError> {
        match self.inner.process_time_step(simulation_time) {
            Ok(delay) => Ok(delay),
            Err(err) => {
                self.failures += 1;
                warn!(
                    "[Instance {}] step failed at {}: {}. Removing it from the simulation.",
                    self.label, simulation_time, err
                );
                Ok(PAUSE_INDEFINITELY)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl SimulationInstance for Failing {
        fn process_time_step(&mut self, _simulation_time: SimTime) -> Result<Duration, InstanceError> {
            Err("remote call refused".into())
        }
    }

    struct Fixed(Duration);

    impl SimulationInstance for Fixed {
        fn process_time_step(&mut self, _simulation_time: SimTime) -> Result<Duration, InstanceError> {
            Ok(self.0)
        }
    }

    #[test]
    fn test_isolated_converts_failure_to_pause() {
        let mut isolated = Isolated::new("failing", Failing);
        let delay = isolated.process_time_step(SimTime::ZERO).unwrap();
        assert_eq!(delay, PAUSE_INDEFINITELY);
        assert_eq!(isolated.failures(), 1);
    }

    #[test]
    fn test_isolated_passes_success_through() {
        let mut isolated = Isolated::new("fixed", Fixed(Duration::from_secs(3)));
        let delay = isolated.process_time_step(SimTime::ZERO).unwrap();
        assert_eq!(delay, Duration::from_secs(3));
        assert_eq!(isolated.failures(), 0);
    }

    #[test]
    fn test_boxed_instance_delegates() {
        let mut boxed: Box<dyn SimulationInstance> = Box::new(Fixed(DEFAULT_CADENCE));
        assert_eq!(boxed.process_time_step(SimTime::ZERO).unwrap(), DEFAULT_CADENCE);
    }
}
