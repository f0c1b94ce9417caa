use crate::core::types::SimTime;

/// Status of a simulation after a time step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationStatus {
    /// Additional time steps remain
    Running,
    /// No instances are scheduled any more
    NoRemainingWork,
    /// The next pending event is at or past the configured end time
    EndTimeReached,
}

impl SimulationStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, SimulationStatus::Running)
    }
}

/// Outcome of a single time step.
///
/// `next_time` is the time of the next pending event. It is `SimTime::MAX`
/// for `NoRemainingWork`; for `EndTimeReached` it is the step that would have
/// run had the simulation not ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepResult {
    pub status: SimulationStatus,
    pub next_time: SimTime,
}

impl StepResult {
    /// `next_event` is `None` when the timeline is empty
    pub(crate) fn classify(next_event: Option<SimTime>, end_time: SimTime) -> Self {
        match next_event {
            None => Self {
                status: SimulationStatus::NoRemainingWork,
                next_time: SimTime::MAX,
            },
            Some(next_time) if next_time >= end_time => Self {
                status: SimulationStatus::EndTimeReached,
                next_time,
            },
            Some(next_time) => Self {
                status: SimulationStatus::Running,
                next_time,
            },
        }
    }
}

/// Lifecycle of a runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationState {
    /// Instances are still being seeded into the timeline
    Initializing,
    Running,
    Completed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        let end = SimTime::from_secs(20);

        let result = StepResult::classify(Some(SimTime::from_secs(15)), end);
        assert_eq!(result.status, SimulationStatus::Running);
        assert!(!result.status.is_terminal());

        let result = StepResult::classify(Some(end), end);
        assert_eq!(result.status, SimulationStatus::EndTimeReached);
        assert_eq!(result.next_time, end);

        let result = StepResult::classify(None, end);
        assert_eq!(result.status, SimulationStatus::NoRemainingWork);
        assert_eq!(result.next_time, SimTime::MAX);
        assert!(result.status.is_terminal());
    }
}
