pub mod core;

// Re-export commonly used types
pub use crate::core::builder::SimulationRunnerBuilder;
pub use crate::core::error::{InstanceError, SimError};
pub use crate::core::event_scheduler::{DueEvents, EventScheduler};
pub use crate::core::execution::{
    ConcurrencyMode, ExecutionConfig, SimOptions, SimulationObserver, SimulationRunner, SimulationState,
    SimulationStatus, StepResult,
};
pub use crate::core::instance::{Isolated, SimulationInstance, DEFAULT_CADENCE, PAUSE_INDEFINITELY};
pub use crate::core::types::SimTime;
