pub mod config;
pub mod pacing;
pub mod simulation_runner;
pub mod step_result;

// Re-export commonly used types
pub use config::{ConcurrencyMode, ExecutionConfig, SimOptions};
pub use pacing::Pacer;
pub use simulation_runner::{next_event_time, SimulationObserver, SimulationRunner};
pub use step_result::{SimulationState, SimulationStatus, StepResult};
