use std::fmt;

/// Zero-argument work queued on a scheduler
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Handle returned by [`TickScheduler::schedule_after`], used to cancel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

impl TaskHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// The host's delayed-task capability
///
/// Ticks are the host's fixed scheduling unit. Implementations only promise
/// that ticks are monotonic and roughly uniform.
pub trait TickScheduler: Send + Sync {
    /// Run `task` once after roughly `ticks` ticks
    ///
    /// Must not run the task before returning; callers rely on storing the
    /// handle before the task can observe it.
    fn schedule_after(&self, ticks: u64, task: Task) -> TaskHandle;

    /// Cancel a pending task. Returns false if it already ran or was cancelled.
    fn cancel(&self, handle: TaskHandle) -> bool;
}
