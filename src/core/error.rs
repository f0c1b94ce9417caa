//! Error types for the simulation engine.

use super::types::SimTime;
use thiserror::Error;

/// Failure reported by a simulation instance's own step.
pub type InstanceError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by the timeline and the runner.
#[derive(Debug, Error)]
pub enum SimError {
    /// Start/end/interval (or pacing speedup) are malformed.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The runner was built without any instances.
    #[error("No simulation instances were registered, no work to do")]
    NoInstances,

    /// An event was scheduled before the current simulation time.
    #[error("Cannot schedule an event at {requested}, current simulation time is {current}")]
    InvalidSchedule { requested: SimTime, current: SimTime },

    /// Simulation time was queried before the first time step.
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),

    /// Stepping was attempted after a terminal outcome.
    #[error("Simulation has completed, no more time steps to perform")]
    AlreadyCompleted,

    /// An instance failed while processing its time step.
    #[error("Instance failed at {time}: {source}")]
    Instance {
        time: SimTime,
        #[source]
        source: InstanceError,
    },

    /// A dedicated rayon pool could not be created.
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}
