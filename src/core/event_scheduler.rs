use super::error::SimError;
use super::types::SimTime;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::{Mutex, MutexGuard};

/// An instance waiting in the timeline for its next event time
#[derive(Debug)]
pub struct ScheduledEvent<I> {
    pub event_time: SimTime,
    pub sequence_num: u64,
    pub instance: I,
}

impl<I> PartialEq for ScheduledEvent<I> {
    fn eq(&self, other: &Self) -> bool {
        self.event_time == other.event_time && self.sequence_num == other.sequence_num
    }
}

impl<I> Eq for ScheduledEvent<I> {}

impl<I> PartialOrd for ScheduledEvent<I> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<I> Ord for ScheduledEvent<I> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .event_time
            .cmp(&self.event_time)
            .then_with(|| other.sequence_num.cmp(&self.sequence_num))
    }
}

struct SchedulerState<I> {
    event_queue: BinaryHeap<ScheduledEvent<I>>,
    sequence_counter: u64,
    /// Unset until the first slice is extracted
    simulation_time: Option<SimTime>,
}

/// Time-ordered queue of pending instances.
///
/// Every operation takes the internal lock only for the heap operation itself,
/// so instances can be stepped (and re-enqueued from other threads) while a
/// slice is still being drained.
pub struct EventScheduler<I> {
    state: Mutex<SchedulerState<I>>,
}

impl<I> EventScheduler<I> {
    /// Create an empty scheduler with no simulation time yet
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SchedulerState {
                event_queue: BinaryHeap::new(),
                sequence_counter: 0,
                simulation_time: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerState<I>> {
        // A panicking instance never runs under this lock, so the heap is still consistent
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Schedule `instance` for `event_time`.
    ///
    /// Fails once the simulation time is established if `event_time` lies in
    /// the past. The rejected instance is dropped; use `try_enqueue` to get it back.
    pub fn enqueue(&self, instance: I, event_time: SimTime) -> Result<(), SimError> {
        self.try_enqueue(instance, event_time).map_err(|(_, err)| err)
    }

    /// Like `enqueue`, but a rejected instance is returned alongside the error
    pub fn try_enqueue(&self, instance: I, event_time: SimTime) -> Result<(), (I, SimError)> {
        let mut state = self.lock();
        if let Some(current) = state.simulation_time {
            if event_time < current {
                return Err((
                    instance,
                    SimError::InvalidSchedule {
                        requested: event_time,
                        current,
                    },
                ));
            }
        }

        let sequence_num = state.sequence_counter;
        state.sequence_counter += 1;
        state.event_queue.push(ScheduledEvent {
            event_time,
            sequence_num,
            instance,
        });
        Ok(())
    }

    /// Start the next time slice.
    ///
    /// Moves the simulation time to the earliest pending event time and returns
    /// a one-shot iterator that pops the instances due at exactly that time.
    /// An empty scheduler yields nothing and leaves the simulation time alone.
    pub fn extract_due_events(&self) -> DueEvents<'_, I> {
        let mut state = self.lock();
        let slice_time = state.event_queue.peek().map(|event| event.event_time);
        if slice_time.is_some() {
            state.simulation_time = slice_time;
        }
        DueEvents {
            scheduler: self,
            slice_time,
            exhausted: slice_time.is_none(),
        }
    }

    /// Earliest pending event time, or `SimTime::MAX` when nothing is pending
    pub fn peek_next_time(&self) -> SimTime {
        self.next_event_time().unwrap_or(SimTime::MAX)
    }

    /// Earliest pending event time, `None` when nothing is pending
    pub fn next_event_time(&self) -> Option<SimTime> {
        self.lock().event_queue.peek().map(|event| event.event_time)
    }

    /// Check if there are any events remaining in the queue
    pub fn is_empty(&self) -> bool {
        self.lock().event_queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().event_queue.len()
    }

    /// Time of the slice most recently extracted
    pub fn current_time(&self) -> Result<SimTime, SimError> {
        self.lock().simulation_time.ok_or(SimError::InvalidState(
            "simulation has been initialized but has not yet stepped into a time increment",
        ))
    }

    /// Remove every pending instance, in event order
    pub fn drain_all(&self) -> Vec<I> {
        let mut state = self.lock();
        let mut instances = Vec::with_capacity(state.event_queue.len());
        while let Some(event) = state.event_queue.pop() {
            instances.push(event.instance);
        }
        instances
    }
}

impl<I> Default for EventScheduler<I> {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazily drains the instances of one time slice.
///
/// The lock is re-acquired for every element, so entries enqueued while the
/// slice is being consumed are visible, but only those at the slice time are
/// drawn into it. Once it returns `None` it stays exhausted.
pub struct DueEvents<'a, I> {
    scheduler: &'a EventScheduler<I>,
    slice_time: Option<SimTime>,
    exhausted: bool,
}

impl<I> DueEvents<'_, I> {
    /// Simulation time of this slice, `None` if the scheduler was empty
    pub fn time(&self) -> Option<SimTime> {
        self.slice_time
    }
}

impl<I> Iterator for DueEvents<'_, I> {
    type Item = I;

    fn next(&mut self) -> Option<I> {
        if self.exhausted {
            return None;
        }
        let slice_time = self.slice_time?;
        let mut state = self.scheduler.lock();
        let due = state
            .event_queue
            .peek()
            .is_some_and(|event| event.event_time <= slice_time);
        if due {
            return state.event_queue.pop().map(|event| event.instance);
        }
        drop(state);
        self.exhausted = true;
        None
    }
}

impl<I> std::iter::FusedIterator for DueEvents<'_, I> {}
