//! One-shot delayed task scheduling for the UI loop.
//!
//! Tasks are kept in a min-heap ordered by due time. The loop asks for the
//! tasks that are due at a given instant and runs them itself, so tests can
//! drive time explicitly instead of sleeping.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use slotmap::{SlotMap, new_key_type};

use crate::task::BoxedTask;

new_key_type! {
    /// A unique identifier for a scheduled task.
    pub struct ScheduledTaskId;
}

/// Internal scheduled task data.
struct ScheduledTaskData {
    /// When this task becomes due.
    due: Instant,
    /// The task closure; taken when the task runs.
    task: Option<BoxedTask>,
}

/// An entry in the scheduler queue (min-heap by due time).
#[derive(Debug, Clone, Copy)]
struct SchedulerQueueEntry {
    id: ScheduledTaskId,
    due: Instant,
    /// Insertion order, so tasks due at the same instant run FIFO.
    sequence: u64,
}

impl PartialEq for SchedulerQueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.sequence == other.sequence
    }
}

impl Eq for SchedulerQueueEntry {}

impl PartialOrd for SchedulerQueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SchedulerQueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap (BinaryHeap is max-heap by default).
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Manages one-shot delayed tasks.
#[derive(Default)]
pub struct Scheduler {
    tasks: SlotMap<ScheduledTaskId, ScheduledTaskData>,
    queue: BinaryHeap<SchedulerQueueEntry>,
    sequence: u64,
}

impl Scheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a task to become due after `delay` from now.
    pub fn schedule_once<F>(&mut self, delay: Duration, task: F) -> ScheduledTaskId
    where
        F: FnOnce() + 'static,
    {
        self.schedule_at(Instant::now() + delay, task)
    }

    /// Schedule a task to become due at `due`.
    ///
    /// A due time in the past makes the task ready on the next processing pass.
    pub fn schedule_at<F>(&mut self, due: Instant, task: F) -> ScheduledTaskId
    where
        F: FnOnce() + 'static,
    {
        let id = self.tasks.insert(ScheduledTaskData {
            due,
            task: Some(Box::new(task)),
        });
        self.sequence += 1;
        self.queue.push(SchedulerQueueEntry {
            id,
            due,
            sequence: self.sequence,
        });
        id
    }

    /// Number of tasks still waiting to run.
    pub fn active_count(&self) -> usize {
        self.tasks.len()
    }

    /// Duration from `now` until the next task becomes due.
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        self.queue
            .peek()
            .map(|entry| entry.due.saturating_duration_since(now))
    }

    /// Remove and return every task due at or before `now`, earliest first.
    pub(crate) fn take_due(&mut self, now: Instant) -> Vec<BoxedTask> {
        let mut ready = Vec::new();
        while let Some(entry) = self.queue.peek() {
            if entry.due > now {
                break;
            }
            let entry = *entry;
            self.queue.pop();
            if let Some(mut data) = self.tasks.remove(entry.id) {
                debug_assert_eq!(data.due, entry.due);
                if let Some(task) = data.task.take() {
                    ready.push(task);
                }
            }
        }
        ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_tasks_become_due_in_time_order() {
        let mut scheduler = Scheduler::new();
        let start = Instant::now();
        let log = Rc::new(RefCell::new(Vec::new()));

        for (label, ms) in [("late", 30), ("early", 10), ("mid", 20)] {
            let log = log.clone();
            scheduler.schedule_at(start + Duration::from_millis(ms), move || {
                log.borrow_mut().push(label)
            });
        }

        assert!(scheduler.take_due(start).is_empty());

        for task in scheduler.take_due(start + Duration::from_millis(20)) {
            task();
        }
        assert_eq!(*log.borrow(), vec!["early", "mid"]);
        assert_eq!(scheduler.active_count(), 1);
    }

    #[test]
    fn test_time_until_next_tracks_earliest() {
        let mut scheduler = Scheduler::new();
        let start = Instant::now();
        assert_eq!(scheduler.time_until_next(start), None);

        scheduler.schedule_at(start + Duration::from_millis(50), || {});
        scheduler.schedule_at(start + Duration::from_millis(5), || {});
        assert_eq!(
            scheduler.time_until_next(start),
            Some(Duration::from_millis(5))
        );

        // Overdue tasks report zero rather than a negative wait.
        assert_eq!(
            scheduler.time_until_next(start + Duration::from_secs(1)),
            Some(Duration::ZERO)
        );
    }
}
