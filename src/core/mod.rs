pub mod builder;
pub mod error;
pub mod event_scheduler;
pub mod execution;
pub mod instance;
pub mod types;
