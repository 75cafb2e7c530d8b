use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::trace;

use crate::scheduler::{Task, TaskHandle, TickScheduler};

type Tasks = Arc<Mutex<HashMap<TaskHandle, AbortHandle>>>;

fn lock(tasks: &Tasks) -> MutexGuard<'_, HashMap<TaskHandle, AbortHandle>> {
    tasks.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scheduler backed by tokio timers on the host's runtime
///
/// Each task is a spawned sleep of `ticks * tick` followed by the work.
/// Cancelling aborts the sleep.
pub struct TokioScheduler {
    runtime: Handle,
    tick: Duration,
    next_id: AtomicU64,
    tasks: Tasks,
}

impl TokioScheduler {
    /// Create a scheduler on the runtime the caller is running in
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn new(tick: Duration) -> Self {
        Self::with_handle(Handle::current(), tick)
    }

    pub fn with_handle(runtime: Handle, tick: Duration) -> Self {
        Self {
            runtime,
            tick,
            next_id: AtomicU64::new(0),
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Number of tasks waiting to run
    pub fn pending_count(&self) -> usize {
        lock(&self.tasks).len()
    }

    fn delay_for(&self, ticks: u64) -> Duration {
        let ticks = u32::try_from(ticks).unwrap_or(u32::MAX);
        self.tick.saturating_mul(ticks)
    }
}

impl TickScheduler for TokioScheduler {
    fn schedule_after(&self, ticks: u64, task: Task) -> TaskHandle {
        let handle = TaskHandle::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let delay = self.delay_for(ticks);
        let tasks = Arc::clone(&self.tasks);

        // Hold the map while spawning so the task cannot finish before its
        // abort handle is recorded
        let mut pending = lock(&self.tasks);
        let join = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let still_pending = lock(&tasks).remove(&handle).is_some();
            if still_pending {
                trace!(target: "scheduler", "Running {}", handle);
                task();
            }
        });
        pending.insert(handle, join.abort_handle());
        trace!(target: "scheduler", "Scheduled {} in {:?}", handle, delay);
        handle
    }

    fn cancel(&self, handle: TaskHandle) -> bool {
        match lock(&self.tasks).remove(&handle) {
            Some(abort) => {
                abort.abort();
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for TokioScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioScheduler")
            .field("tick", &self.tick)
            .field("pending", &self.pending_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test(start_paused = true)]
    async fn test_task_fires_after_delay() {
        let scheduler = TokioScheduler::new(Duration::from_millis(50));
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        scheduler.schedule_after(
            20,
            Box::new(move || {
                inner.fetch_add(1, Ordering::SeqCst);
            }),
        );

        tokio::time::sleep(Duration::from_millis(900)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_task_never_fires() {
        let scheduler = TokioScheduler::new(Duration::from_millis(50));
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        let handle = scheduler.schedule_after(
            10,
            Box::new(move || {
                inner.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert!(scheduler.cancel(handle));
        assert!(!scheduler.cancel(handle));
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
