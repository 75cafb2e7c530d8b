use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::trace;

use crate::scheduler::{Task, TaskHandle, TickScheduler};

/// Tasks waiting for their tick, ordered by (due tick, handle)
#[derive(Default)]
struct Pending {
    now: u64,
    next_id: u64,
    queue: BTreeMap<(u64, TaskHandle), Task>,
    due: HashMap<TaskHandle, u64>,
}

/// Scheduler whose clock only moves when the host calls [`advance`]
///
/// Suited to hosts that already run a fixed-rate game loop: call
/// `advance(1)` once per loop iteration. Tasks run on the caller's thread,
/// in due order, and may schedule further tasks while running.
///
/// [`advance`]: ManualScheduler::advance
#[derive(Default)]
pub struct ManualScheduler {
    pending: Mutex<Pending>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current tick
    pub fn now(&self) -> u64 {
        self.lock().now
    }

    /// Number of tasks waiting to run
    pub fn pending_count(&self) -> usize {
        self.lock().queue.len()
    }

    /// Tick at which `handle` will run, if it is still pending
    pub fn due_at(&self, handle: TaskHandle) -> Option<u64> {
        self.lock().due.get(&handle).copied()
    }

    /// Move the clock forward by `ticks`, running every task that comes due
    ///
    /// Returns the number of tasks run.
    pub fn advance(&self, ticks: u64) -> usize {
        let target = self.lock().now.saturating_add(ticks);
        let mut ran = 0;

        loop {
            let task = {
                let mut pending = self.lock();
                let next = pending
                    .queue
                    .first_key_value()
                    .map(|(&(due, handle), _)| (due, handle))
                    .filter(|&(due, _)| due <= target);

                match next {
                    Some((due, handle)) => {
                        pending.now = due;
                        pending.due.remove(&handle);
                        let task = pending.queue.remove(&(due, handle));
                        trace!(target: "scheduler", "Running {} at tick {}", handle, due);
                        task
                    }
                    None => {
                        pending.now = target;
                        break;
                    }
                }
            };

            // Lock released: the task may schedule or cancel
            if let Some(task) = task {
                task();
                ran += 1;
            }
        }

        ran
    }

    /// Advance until no task is pending or `max_ticks` have elapsed
    ///
    /// Returns the number of tasks run.
    pub fn run_until_idle(&self, max_ticks: u64) -> usize {
        let start = self.now();
        let mut ran = 0;
        while let Some(next_due) = self.next_due() {
            if next_due.saturating_sub(start) > max_ticks {
                break;
            }
            ran += self.advance(next_due - self.now());
        }
        ran
    }

    fn next_due(&self) -> Option<u64> {
        self.lock().queue.keys().next().map(|&(due, _)| due)
    }
}

impl TickScheduler for ManualScheduler {
    fn schedule_after(&self, ticks: u64, task: Task) -> TaskHandle {
        let mut pending = self.lock();
        let handle = TaskHandle::new(pending.next_id);
        pending.next_id += 1;

        let due = pending.now.saturating_add(ticks);
        pending.queue.insert((due, handle), task);
        pending.due.insert(handle, due);
        trace!(target: "scheduler", "Scheduled {} for tick {}", handle, due);
        handle
    }

    fn cancel(&self, handle: TaskHandle) -> bool {
        let mut pending = self.lock();
        match pending.due.remove(&handle) {
            Some(due) => pending.queue.remove(&(due, handle)).is_some(),
            None => false,
        }
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pending = self.lock();
        f.debug_struct("ManualScheduler")
            .field("now", &pending.now)
            .field("pending", &pending.queue.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Task) {
        let count = Arc::new(AtomicUsize::new(0));
        let make = {
            let count = Arc::clone(&count);
            move || -> Task {
                let count = Arc::clone(&count);
                Box::new(move || {
                    count.fetch_add(1, Ordering::SeqCst);
                })
            }
        };
        (count, make)
    }

    #[test]
    fn test_task_runs_when_due() {
        let scheduler = ManualScheduler::new();
        let (count, task) = counter();
        scheduler.schedule_after(20, task());

        assert_eq!(scheduler.advance(19), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.advance(1), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending_count(), 0);
        assert_eq!(scheduler.now(), 20);
    }

    #[test]
    fn test_cancel_before_firing() {
        let scheduler = ManualScheduler::new();
        let (count, task) = counter();
        let handle = scheduler.schedule_after(5, task());

        assert!(scheduler.cancel(handle));
        assert!(!scheduler.cancel(handle));
        scheduler.advance(10);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cancel_after_firing_returns_false() {
        let scheduler = ManualScheduler::new();
        let (_count, task) = counter();
        let handle = scheduler.schedule_after(1, task());
        scheduler.advance(1);
        assert!(!scheduler.cancel(handle));
    }

    #[test]
    fn test_tasks_run_in_due_order() {
        let scheduler = Arc::new(ManualScheduler::new());
        let order = Arc::new(Mutex::new(Vec::new()));
        for (label, delay) in [("late", 30u64), ("early", 10), ("mid", 20)] {
            let order = Arc::clone(&order);
            scheduler.schedule_after(delay, Box::new(move || order.lock().unwrap().push(label)));
        }

        scheduler.advance(100);
        assert_eq!(*order.lock().unwrap(), vec!["early", "mid", "late"]);
    }

    #[test]
    fn test_task_can_reschedule_within_same_advance() {
        let scheduler = Arc::new(ManualScheduler::new());
        let fired_at = Arc::new(Mutex::new(Vec::new()));

        let inner_scheduler = Arc::clone(&scheduler);
        let inner_fired = Arc::clone(&fired_at);
        scheduler.schedule_after(
            10,
            Box::new(move || {
                inner_fired.lock().unwrap().push(inner_scheduler.now());
                let again = Arc::clone(&inner_fired);
                let clock = Arc::clone(&inner_scheduler);
                inner_scheduler.schedule_after(
                    15,
                    Box::new(move || again.lock().unwrap().push(clock.now())),
                );
            }),
        );

        assert_eq!(scheduler.advance(40), 2);
        assert_eq!(*fired_at.lock().unwrap(), vec![10, 25]);
        assert_eq!(scheduler.now(), 40);
    }

    #[test]
    fn test_run_until_idle_respects_limit() {
        let scheduler = ManualScheduler::new();
        let (count, task) = counter();
        scheduler.schedule_after(10, task());
        scheduler.schedule_after(500, task());

        assert_eq!(scheduler.run_until_idle(100), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending_count(), 1);
        assert_eq!(scheduler.due_at(TaskHandle::new(1)), Some(500));
    }
}
