use crate::core::error::SimError;
use crate::core::execution::config::{ExecutionConfig, SimOptions};
use crate::core::execution::simulation_runner::{SimulationObserver, SimulationRunner};
use crate::core::instance::SimulationInstance;

/// Collects instances and settings before a run starts.
///
/// Nothing is scheduled until [`build`](Self::build), which validates the
/// options, seeds every instance at the start time and returns a running
/// [`SimulationRunner`].
pub struct SimulationRunnerBuilder<I> {
    options: SimOptions,
    execution: ExecutionConfig,
    /// Instances in registration order
    instances: Vec<I>,
    observers: Vec<Box<dyn SimulationObserver>>,
}

impl<I: SimulationInstance> SimulationRunnerBuilder<I> {
    pub fn new(options: SimOptions) -> Self {
        Self {
            options,
            execution: ExecutionConfig::default(),
            instances: Vec::new(),
            observers: Vec::new(),
        }
    }

    pub fn add_instance(mut self, instance: I) -> Self {
        self.instances.push(instance);
        self
    }

    pub fn add_instances(mut self, instances: impl IntoIterator<Item = I>) -> Self {
        self.instances.extend(instances);
        self
    }

    pub fn with_execution_config(mut self, execution: ExecutionConfig) -> Self {
        self.execution = execution;
        self
    }

    pub fn with_observer(mut self, observer: impl SimulationObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Validate and start the simulation
    pub fn build(self) -> Result<SimulationRunner<I>, SimError> {
        SimulationRunner::from_parts(self.instances, self.options, self.execution, self.observers)
    }
}
