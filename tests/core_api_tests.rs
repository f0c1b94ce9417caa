use simstep::{
    ConcurrencyMode, EventScheduler, ExecutionConfig, InstanceError, Isolated, SimError, SimOptions, SimTime,
    SimulationInstance, SimulationRunner, SimulationState, SimulationStatus, DEFAULT_CADENCE, PAUSE_INDEFINITELY,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Steps on the default cadence forever and counts its steps in a shared counter
struct Ticker {
    steps: Arc<AtomicUsize>,
    last_seen: Option<SimTime>,
}

impl SimulationInstance for Ticker {
    fn process_time_step(&mut self, simulation_time: SimTime) -> Result<Duration, InstanceError> {
        if let Some(last) = self.last_seen {
            assert!(simulation_time > last, "time went backwards for an instance");
        }
        self.last_seen = Some(simulation_time);
        self.steps.fetch_add(1, Ordering::SeqCst);
        Ok(DEFAULT_CADENCE)
    }
}

/// Takes a fixed number of steps with a fixed think time, then leaves
struct Visitor {
    think_time: Duration,
    remaining_steps: u32,
}

impl SimulationInstance for Visitor {
    fn process_time_step(&mut self, _simulation_time: SimTime) -> Result<Duration, InstanceError> {
        self.remaining_steps = self.remaining_steps.saturating_sub(1);
        if self.remaining_steps == 0 {
            Ok(PAUSE_INDEFINITELY)
        } else {
            Ok(self.think_time)
        }
    }
}

struct Broken;

impl SimulationInstance for Broken {
    fn process_time_step(&mut self, _simulation_time: SimTime) -> Result<Duration, InstanceError> {
        Err(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "cart service down").into())
    }
}

fn twenty_second_run() -> SimOptions {
    SimOptions::new(
        SimTime::from_secs(60),
        SimTime::from_secs(80),
        Duration::from_secs(5),
    )
}

#[test]
fn test_three_instances_default_cadence_scenario() {
    for mode in [ConcurrencyMode::Sequential, ConcurrencyMode::Rayon] {
        let steps = Arc::new(AtomicUsize::new(0));
        let instances: Vec<Ticker> = (0..3)
            .map(|_| Ticker {
                steps: steps.clone(),
                last_seen: None,
            })
            .collect();

        let mut runner = SimulationRunner::builder(twenty_second_run())
            .add_instances(instances)
            .with_execution_config(ExecutionConfig::new().with_concurrency(mode))
            .build()
            .unwrap();

        let mut cursors = Vec::new();
        let final_result = loop {
            let result = runner.step_configured().unwrap();
            cursors.push(runner.current_time().unwrap().as_millis() / 1000);
            if result.status != SimulationStatus::Running {
                break result;
            }
        };

        assert_eq!(final_result.status, SimulationStatus::EndTimeReached, "mode {:?}", mode);
        assert_eq!(final_result.next_time, SimTime::from_secs(80));
        assert_eq!(cursors, vec![60, 65, 70, 75]);
        assert_eq!(steps.load(Ordering::SeqCst), 12);
        assert_eq!(runner.state(), SimulationState::Completed);
        assert!(matches!(runner.step(), Err(SimError::AlreadyCompleted)));
    }
}

#[test]
fn test_heterogeneous_instances_until_no_work() {
    let instances: Vec<Box<dyn SimulationInstance>> = vec![
        Box::new(Visitor {
            think_time: Duration::from_secs(7),
            remaining_steps: 3,
        }),
        Box::new(Visitor {
            think_time: Duration::from_secs(2),
            remaining_steps: 2,
        }),
        Box::new(Isolated::new("broken", Broken)),
    ];

    let options = SimOptions::new(SimTime::ZERO, SimTime::MAX, Duration::from_secs(5));
    let mut runner = SimulationRunner::new(instances, options).unwrap();
    let result = runner.run_unpaced().unwrap();

    assert_eq!(result.status, SimulationStatus::NoRemainingWork);
    assert_eq!(result.next_time, SimTime::MAX);
    // 7s rounds up to 10s: the first visitor steps at 0, 10 and 20
    assert_eq!(runner.current_time().unwrap(), SimTime::from_secs(20));
    assert_eq!(runner.retired_count(), 3);
}

#[test]
fn test_unisolated_failure_surfaces_to_host() {
    let instances: Vec<Box<dyn SimulationInstance>> = vec![
        Box::new(Visitor {
            think_time: DEFAULT_CADENCE,
            remaining_steps: 10,
        }),
        Box::new(Broken),
    ];
    let mut runner = SimulationRunner::new(instances, twenty_second_run()).unwrap();

    let err = runner.run_unpaced().unwrap_err();
    assert!(matches!(err, SimError::Instance { .. }));
    assert!(err.to_string().contains("cart service down"));
    assert!(matches!(runner.step(), Err(SimError::AlreadyCompleted)));
    assert_eq!(runner.into_instances().len(), 2);
}

#[test]
fn test_paced_parallel_run() {
    let steps = Arc::new(AtomicUsize::new(0));
    let instances: Vec<Ticker> = (0..16)
        .map(|_| Ticker {
            steps: steps.clone(),
            last_seen: None,
        })
        .collect();
    let options = SimOptions::new(SimTime::ZERO, SimTime::from_millis(100), Duration::from_millis(20));
    let execution = ExecutionConfig::new()
        .with_concurrency(ConcurrencyMode::Rayon)
        .with_thread_pool_size(4);

    let mut runner = SimulationRunner::builder(options)
        .add_instances(instances)
        .with_execution_config(execution)
        .build()
        .unwrap();
    let result = runner.run(20).unwrap();

    assert_eq!(result.status, SimulationStatus::EndTimeReached);
    assert_eq!(steps.load(Ordering::SeqCst), 16 * 5);
    assert_eq!(runner.into_instances().len(), 16);
}

#[test]
fn test_timeline_rejects_time_travel() {
    let timeline = EventScheduler::new();
    timeline.enqueue("shopper_00001", SimTime::from_secs(30)).unwrap();
    assert_eq!(timeline.extract_due_events().count(), 1);

    let err = timeline.enqueue("shopper_00002", SimTime::from_secs(29)).unwrap_err();
    assert!(matches!(err, SimError::InvalidSchedule { .. }));
    assert_eq!(timeline.peek_next_time(), SimTime::MAX);

    let (rejected, err) = timeline.try_enqueue("shopper_00003", SimTime::from_secs(10)).unwrap_err();
    assert_eq!(rejected, "shopper_00003");
    assert!(matches!(err, SimError::InvalidSchedule { .. }));
    assert!(timeline.is_empty());
}
