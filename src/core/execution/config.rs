//! Configuration for simulation runs
//!
//! `SimOptions` holds the simulated timeline bounds and cadence, `ExecutionConfig`
//! controls how each time slice is executed.

use crate::core::error::SimError;
use crate::core::types::{truncate_to_millis, SimTime};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeline bounds and cadence of a simulation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimOptions {
    /// Simulated time of the first time step
    pub start_time: SimTime,
    /// End time (exclusive). Use `SimTime::MAX` to run until no work remains.
    pub end_time: SimTime,
    /// Default cadence between an instance's steps, serialized as milliseconds
    #[serde(rename = "step_interval_ms", with = "duration_millis")]
    pub step_interval: Duration,
}

impl SimOptions {
    pub fn new(start_time: SimTime, end_time: SimTime, step_interval: Duration) -> Self {
        Self {
            start_time,
            end_time,
            step_interval,
        }
    }

    /// Check the options and truncate the interval to whole milliseconds
    ///
    /// # Returns
    /// The options the runner actually uses
    pub fn validate(&self) -> Result<Self, SimError> {
        if self.start_time >= self.end_time {
            return Err(SimError::InvalidConfiguration(format!(
                "end time ({}) must be greater than start time ({})",
                self.end_time, self.start_time
            )));
        }

        let step_interval = truncate_to_millis(self.step_interval);
        if step_interval.is_zero() {
            return Err(SimError::InvalidConfiguration(
                "step interval must be at least 1 millisecond".to_string(),
            ));
        }

        Ok(Self {
            start_time: self.start_time,
            end_time: self.end_time,
            step_interval,
        })
    }
}

/// Enumeration of supported concurrency modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConcurrencyMode {
    /// Instances of a slice are stepped one at a time, in extraction order
    #[default]
    Sequential,
    /// Instances of a slice are stepped concurrently on a Rayon pool
    Rayon,
}

/// Execution settings for the runner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Mode used by `run` and `run_unpaced`
    pub concurrency_mode: ConcurrencyMode,
    /// The size of a dedicated thread pool for parallel stepping.
    /// `None` uses Rayon's global pool.
    pub thread_pool_size: Option<usize>,
}

impl ExecutionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency_mode = mode;
        self
    }

    /// Only affects execution when concurrency_mode is Rayon
    pub fn with_thread_pool_size(mut self, size: usize) -> Self {
        self.thread_pool_size = Some(size);
        self
    }

    pub(crate) fn build_thread_pool(&self) -> Result<Option<rayon::ThreadPool>, SimError> {
        match (self.concurrency_mode, self.thread_pool_size) {
            (ConcurrencyMode::Rayon, Some(size)) => rayon::ThreadPoolBuilder::new()
                .num_threads(size)
                .thread_name(|index| format!("simstep-worker-{index}"))
                .build()
                .map(Some)
                .map_err(|err| SimError::ThreadPool(err.to_string())),
            _ => Ok(None),
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
