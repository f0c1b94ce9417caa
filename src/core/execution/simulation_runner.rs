use crate::core::builder::simulation_builder::SimulationRunnerBuilder;
use crate::core::error::SimError;
use crate::core::event_scheduler::EventScheduler;
use crate::core::execution::config::{ConcurrencyMode, ExecutionConfig, SimOptions};
use crate::core::execution::pacing::Pacer;
use crate::core::execution::step_result::{SimulationState, StepResult};
use crate::core::instance::{SimulationInstance, PAUSE_INDEFINITELY};
use crate::core::types::SimTime;
use log::{debug, error, info};
use rayon::iter::{ParallelBridge, ParallelIterator};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Observer trait for simulation events
pub trait SimulationObserver: Send {
    /// Called when a slice starts at a later simulation time than the previous one
    fn on_time_advance(&mut self, previous: Option<SimTime>, current: SimTime);

    /// Called when a time step completes
    fn on_step_complete(&mut self, time: SimTime, events_processed: usize, result: &StepResult);
}

/// Time at which an instance that asked for `requested_delay` at `now` runs next.
///
/// A zero delay means one `step_interval`, `PAUSE_INDEFINITELY` means never
/// (`None`), and anything else is rounded up to a whole number of intervals.
/// A time that saturates to `SimTime::MAX` is past any end time and is treated
/// as never as well.
pub fn next_event_time(now: SimTime, requested_delay: Duration, step_interval: Duration) -> Option<SimTime> {
    if requested_delay == PAUSE_INDEFINITELY {
        return None;
    }
    let next = if requested_delay.is_zero() {
        now + step_interval
    } else {
        let interval_nanos = step_interval.as_nanos().max(1);
        let interval_count = requested_delay.as_nanos().div_ceil(interval_nanos);
        let wait_millis = interval_count.saturating_mul(interval_nanos) / 1_000_000;
        now + Duration::from_millis(u64::try_from(wait_millis).unwrap_or(u64::MAX))
    };
    (!next.is_max()).then_some(next)
}

/// Steps one instance and puts it back into the timeline (or retires it)
struct Dispatcher<'a, I> {
    scheduler: &'a EventScheduler<I>,
    retired: &'a Mutex<Vec<I>>,
    step_interval: Duration,
}

impl<I: SimulationInstance> Dispatcher<'_, I> {
    fn dispatch(&self, mut instance: I, now: SimTime) -> Result<(), SimError> {
        let requested_delay = match instance.process_time_step(now) {
            Ok(delay) => delay,
            Err(source) => {
                self.retire(instance);
                return Err(SimError::Instance { time: now, source });
            }
        };

        match next_event_time(now, requested_delay, self.step_interval) {
            Some(event_time) => self.scheduler.try_enqueue(instance, event_time).map_err(|(instance, err)| {
                self.retire(instance);
                err
            }),
            None => {
                self.retire(instance);
                Ok(())
            }
        }
    }

    /// The host keeps ownership of instances that stop taking events
    fn retire(&self, instance: I) {
        self.retired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(instance);
    }
}

/// Drives a set of instances through simulated time.
///
/// Every instance is seeded at the start time. Each step extracts the slice of
/// instances due at the earliest pending time, steps them, reschedules them
/// from their requested delay and classifies the outcome. A terminal outcome
/// completes the runner.
pub struct SimulationRunner<I> {
    scheduler: EventScheduler<I>,
    retired: Mutex<Vec<I>>,
    options: SimOptions,
    execution: ExecutionConfig,
    thread_pool: Option<rayon::ThreadPool>,
    state: SimulationState,
    observers: Vec<Box<dyn SimulationObserver>>,
}

impl<I: SimulationInstance> SimulationRunner<I> {
    /// Create a runner with the default execution config
    pub fn new(instances: Vec<I>, options: SimOptions) -> Result<Self, SimError> {
        Self::builder(options).add_instances(instances).build()
    }

    pub fn builder(options: SimOptions) -> SimulationRunnerBuilder<I> {
        SimulationRunnerBuilder::new(options)
    }

    pub(crate) fn from_parts(
        instances: Vec<I>,
        options: SimOptions,
        execution: ExecutionConfig,
        observers: Vec<Box<dyn SimulationObserver>>,
    ) -> Result<Self, SimError> {
        if instances.is_empty() {
            return Err(SimError::NoInstances);
        }
        let options = options.validate()?;
        let thread_pool = execution.build_thread_pool()?;

        info!(
            "Initializing simulation, start: {}, end: {}, iteration interval: {:?}, instances: {}, mode: {:?}",
            options.start_time,
            options.end_time,
            options.step_interval,
            instances.len(),
            execution.concurrency_mode
        );

        let mut runner = Self {
            scheduler: EventScheduler::new(),
            retired: Mutex::new(Vec::new()),
            options,
            execution,
            thread_pool,
            state: SimulationState::Initializing,
            observers,
        };

        for instance in instances {
            runner.scheduler.enqueue(instance, runner.options.start_time)?;
        }
        runner.state = SimulationState::Running;

        Ok(runner)
    }

    fn dispatcher(&self) -> Dispatcher<'_, I> {
        Dispatcher {
            scheduler: &self.scheduler,
            retired: &self.retired,
            step_interval: self.options.step_interval,
        }
    }

    fn ensure_running(&self) -> Result<(), SimError> {
        match self.state {
            SimulationState::Running => Ok(()),
            SimulationState::Completed => Err(SimError::AlreadyCompleted),
            SimulationState::Initializing => Err(SimError::InvalidState("simulation has not been initialized")),
        }
    }

    /// Execute the events of the next time step one instance at a time
    pub fn step(&mut self) -> Result<StepResult, SimError> {
        self.ensure_running()?;
        let previous = self.scheduler.current_time().ok();

        let dispatcher = self.dispatcher();
        let slice = self.scheduler.extract_due_events();
        let now = slice.time();
        let outcome = match now {
            Some(now) => slice.into_iter().try_fold(0usize, |processed, instance| {
                dispatcher.dispatch(instance, now).map(|()| processed + 1)
            }),
            None => Ok(0),
        };

        self.complete_step(previous, now, outcome)
    }

    /// Execute the events of the next time step with the slice's instances
    /// stepped concurrently.
    ///
    /// All instances observe the same slice time. Re-enqueues are serialized
    /// by the timeline lock; their relative order within a tied time is not
    /// deterministic.
    pub fn step_parallel(&mut self) -> Result<StepResult, SimError> {
        self.ensure_running()?;
        let previous = self.scheduler.current_time().ok();

        let dispatcher = self.dispatcher();
        let slice = self.scheduler.extract_due_events();
        let now = slice.time();
        let outcome = match now {
            Some(now) => {
                let run_slice = move || {
                    slice
                        .par_bridge()
                        .map(|instance| dispatcher.dispatch(instance, now).map(|()| 1usize))
                        .try_reduce(|| 0, |a, b| Ok(a + b))
                };
                match &self.thread_pool {
                    Some(pool) => pool.install(run_slice),
                    None => run_slice(),
                }
            }
            None => Ok(0),
        };

        self.complete_step(previous, now, outcome)
    }

    /// Execute one step with the configured concurrency mode
    pub fn step_configured(&mut self) -> Result<StepResult, SimError> {
        match self.execution.concurrency_mode {
            ConcurrencyMode::Sequential => self.step(),
            ConcurrencyMode::Rayon => self.step_parallel(),
        }
    }

    fn complete_step(
        &mut self,
        previous: Option<SimTime>,
        now: Option<SimTime>,
        outcome: Result<usize, SimError>,
    ) -> Result<StepResult, SimError> {
        let events_processed = match outcome {
            Ok(count) => count,
            Err(err) => {
                self.state = SimulationState::Completed;
                error!("Simulation aborted: {}", err);
                return Err(err);
            }
        };

        let result = StepResult::classify(self.scheduler.next_event_time(), self.options.end_time);

        if let Some(now) = now {
            debug!("=== Simulation {} : {} instances stepped ===", now, events_processed);
            for observer in &mut self.observers {
                if previous != Some(now) {
                    observer.on_time_advance(previous, now);
                }
                observer.on_step_complete(now, events_processed, &result);
            }
        }

        if result.status.is_terminal() {
            self.state = SimulationState::Completed;
            info!(
                "Simulation completed with {:?}, next time {}, {} instances retired",
                result.status,
                result.next_time,
                self.retired_count()
            );
        }

        Ok(result)
    }

    /// Run the simulation to completion, pacing steps to real time.
    ///
    /// # Arguments
    /// * `speedup` - Factor by which simulated time runs faster than real time
    ///
    /// # Returns
    /// The final, terminal step result
    pub fn run(&mut self, speedup: u32) -> Result<StepResult, SimError> {
        let pacer = Pacer::new(self.options.step_interval, speedup)?;
        loop {
            let started = Instant::now();
            let result = self.step_configured()?;
            if result.status.is_terminal() {
                return Ok(result);
            }
            pacer.pace(started);
        }
    }

    /// Run the simulation to completion as fast as possible
    pub fn run_unpaced(&mut self) -> Result<StepResult, SimError> {
        loop {
            let result = self.step_configured()?;
            if result.status.is_terminal() {
                return Ok(result);
            }
        }
    }

    /// Time of the next step, or `SimTime::MAX` if no work remains.
    /// Only valid once a step has been taken.
    pub fn peek_next_time_step(&self) -> Result<SimTime, SimError> {
        self.scheduler.current_time()?;
        Ok(self.scheduler.peek_next_time())
    }

    /// Simulation time of the most recent step
    pub fn current_time(&self) -> Result<SimTime, SimError> {
        self.scheduler.current_time()
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn options(&self) -> &SimOptions {
        &self.options
    }

    pub fn execution_config(&self) -> &ExecutionConfig {
        &self.execution
    }

    /// Number of instances waiting in the timeline
    pub fn pending_count(&self) -> usize {
        self.scheduler.len()
    }

    /// Number of instances that take no further events (opted out or failed)
    pub fn retired_count(&self) -> usize {
        self.retired.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Hand every instance back, pending ones first in event order, then retired ones
    pub fn into_instances(self) -> Vec<I> {
        let mut instances = self.scheduler.drain_all();
        instances.extend(self.retired.into_inner().unwrap_or_else(PoisonError::into_inner));
        instances
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_secs(5);

    #[test]
    fn test_zero_delay_uses_step_interval() {
        let now = SimTime::from_secs(100);
        assert_eq!(next_event_time(now, Duration::ZERO, INTERVAL), Some(SimTime::from_secs(105)));
    }

    #[test]
    fn test_pause_is_never_rescheduled() {
        assert_eq!(next_event_time(SimTime::ZERO, PAUSE_INDEFINITELY, INTERVAL), None);
    }

    #[test]
    fn test_delay_rounds_up_to_interval_multiple() {
        let now = SimTime::from_secs(10);
        assert_eq!(next_event_time(now, Duration::from_secs(7), INTERVAL), Some(SimTime::from_secs(20)));
        assert_eq!(next_event_time(now, Duration::from_secs(10), INTERVAL), Some(SimTime::from_secs(20)));
        assert_eq!(next_event_time(now, Duration::from_secs(11), INTERVAL), Some(SimTime::from_secs(25)));
        assert_eq!(next_event_time(now, Duration::from_secs(1), INTERVAL), Some(SimTime::from_secs(15)));
    }

    #[test]
    fn test_sub_millisecond_delay_waits_a_full_interval() {
        let now = SimTime::from_millis(40);
        let next = next_event_time(now, Duration::from_nanos(1), Duration::from_millis(10));
        assert_eq!(next, Some(SimTime::from_millis(50)));
    }

    #[test]
    fn test_saturated_delay_is_never_rescheduled() {
        let next = next_event_time(SimTime::from_secs(1), Duration::MAX - Duration::from_secs(1), INTERVAL);
        assert_eq!(next, None);
    }

    #[test]
    fn test_largest_representable_time_is_kept() {
        let now = SimTime::from_millis(u64::MAX - 10_001);
        let next = next_event_time(now, Duration::ZERO, Duration::from_secs(10));
        assert_eq!(next, Some(SimTime::from_millis(u64::MAX - 1)));
    }
}
