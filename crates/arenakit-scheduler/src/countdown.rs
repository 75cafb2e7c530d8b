//! Interval countdowns used to gate match-phase transitions
//!
//! A countdown of `total` seconds at `interval` fires its callback once per
//! interval. The remainder (`total % interval`) is consumed by the first tick,
//! so every later tick lands on an exact multiple of the interval: 7 seconds at
//! an interval of 3 ticks after 1s, 4s and 7s rather than 3s, 6s and 7s.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, error, trace};

use crate::config::TickConfig;
use crate::scheduler::{Task, TaskHandle, TickScheduler};

static NEXT_COUNTDOWN_ID: AtomicU64 = AtomicU64::new(0);

/// Receives each countdown tick
pub trait CountdownCallback: Send + 'static {
    /// Called with the seconds left after this tick
    ///
    /// Return `false` to end the countdown early.
    fn interval_tick(&mut self, seconds_remaining: i64) -> bool;
}

impl<F> CountdownCallback for F
where
    F: FnMut(i64) -> bool + Send + 'static,
{
    fn interval_tick(&mut self, seconds_remaining: i64) -> bool {
        self(seconds_remaining)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CountdownError {
    #[error("countdown must last at least one second")]
    ZeroDuration,
}

/// Where a countdown is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownPhase {
    /// A tick is pending on the scheduler
    Scheduled,
    /// The callback is running
    Ticking,
    /// Ran out of time with `cancel_on_expire` set
    Expired,
    /// The callback returned `false`
    Finished,
    /// `stop()` was called
    Stopped,
}

impl CountdownPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CountdownPhase::Expired | CountdownPhase::Finished | CountdownPhase::Stopped
        )
    }
}

struct State {
    seconds: i64,
    pending: Option<TaskHandle>,
    cancel_on_expire: bool,
    stopped: bool,
    phase: CountdownPhase,
    ticks_fired: u64,
}

struct Inner {
    id: u64,
    interval: i64,
    total: i64,
    config: TickConfig,
    scheduler: Arc<dyn TickScheduler>,
    start_time: DateTime<Utc>,
    expected_end_time: DateTime<Utc>,
    state: Mutex<State>,
    callback: Mutex<Box<dyn CountdownCallback>>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to a running countdown
///
/// Clones share the same countdown. The pending tick keeps it alive, so
/// dropping every handle does not stop it; call [`Countdown::stop`].
#[derive(Clone)]
pub struct Countdown {
    inner: Arc<Inner>,
}

/// Options for starting a [`Countdown`]
#[derive(Debug, Clone, Copy)]
pub struct CountdownBuilder {
    seconds: u32,
    interval: Option<u32>,
    cancel_on_expire: bool,
}

impl CountdownBuilder {
    pub fn new(seconds: u32) -> Self {
        Self {
            seconds,
            interval: None,
            cancel_on_expire: true,
        }
    }

    /// Seconds between ticks; zero means "one tick at the end"
    pub fn interval(mut self, interval: u32) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Keep ticking past zero until stopped when `false` (default: `true`)
    pub fn cancel_on_expire(mut self, cancel: bool) -> Self {
        self.cancel_on_expire = cancel;
        self
    }

    pub fn start<C>(
        self,
        scheduler: Arc<dyn TickScheduler>,
        config: TickConfig,
        callback: C,
    ) -> Result<Countdown, CountdownError>
    where
        C: CountdownCallback,
    {
        if self.seconds == 0 {
            return Err(CountdownError::ZeroDuration);
        }

        let total = i64::from(self.seconds);
        let interval = match self.interval {
            Some(interval) if interval > 0 => i64::from(interval),
            _ => total,
        };

        // Consume the remainder first so later ticks are whole intervals
        let rem = total % interval;
        let first = if rem != 0 { rem } else { interval };

        let start_time = Utc::now();
        let inner = Arc::new(Inner {
            id: NEXT_COUNTDOWN_ID.fetch_add(1, Ordering::Relaxed),
            interval,
            total,
            config,
            scheduler,
            start_time,
            expected_end_time: start_time + TimeDelta::seconds(total),
            state: Mutex::new(State {
                seconds: total - first,
                pending: None,
                cancel_on_expire: self.cancel_on_expire,
                stopped: false,
                phase: CountdownPhase::Scheduled,
                ticks_fired: 0,
            }),
            callback: Mutex::new(Box::new(callback)),
        });

        {
            let mut state = inner.state();
            let ticks = inner.config.ticks_for_seconds(first);
            state.pending = Some(inner.scheduler.schedule_after(ticks, tick_task(&inner)));
        }

        debug!(
            target: "countdown",
            "Started countdown {} for {}s every {}s (first tick in {}s)",
            inner.id,
            total,
            interval,
            first
        );
        Ok(Countdown { inner })
    }
}

fn tick_task(inner: &Arc<Inner>) -> Task {
    let countdown = Countdown {
        inner: Arc::clone(inner),
    };
    Box::new(move || countdown.fire())
}

impl Countdown {
    pub fn builder(seconds: u32) -> CountdownBuilder {
        CountdownBuilder::new(seconds)
    }

    /// Start a countdown of `seconds`, ticking every `interval` seconds
    ///
    /// `interval` defaults to `seconds` when `None` or zero.
    pub fn start<C>(
        scheduler: Arc<dyn TickScheduler>,
        config: TickConfig,
        seconds: u32,
        interval: Option<u32>,
        callback: C,
    ) -> Result<Self, CountdownError>
    where
        C: CountdownCallback,
    {
        let mut builder = CountdownBuilder::new(seconds);
        if let Some(interval) = interval {
            builder = builder.interval(interval);
        }
        builder.start(scheduler, config, callback)
    }

    fn fire(&self) {
        let seconds = {
            let mut state = self.inner.state();
            if state.stopped {
                return;
            }
            state.pending = None;
            state.phase = CountdownPhase::Ticking;
            state.ticks_fired += 1;
            state.seconds
        };

        // No state lock while user code runs, so it may call stop()
        let outcome = {
            let mut callback = self
                .inner
                .callback
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            panic::catch_unwind(AssertUnwindSafe(|| callback.interval_tick(seconds)))
        };

        let continue_on = match outcome {
            Ok(continue_on) => continue_on,
            Err(_) => {
                error!(
                    target: "countdown",
                    "Countdown {} callback panicked at {}s remaining; ending countdown",
                    self.inner.id,
                    seconds
                );
                false
            }
        };

        let mut state = self.inner.state();
        if !continue_on {
            if !state.stopped {
                state.phase = CountdownPhase::Finished;
            }
            trace!(target: "countdown", "Countdown {} ended by callback", self.inner.id);
            return;
        }

        if !state.stopped && (state.seconds > 0 || !state.cancel_on_expire) {
            let ticks = self.inner.config.ticks_for_seconds(self.inner.interval);
            state.pending = Some(
                self.inner
                    .scheduler
                    .schedule_after(ticks, tick_task(&self.inner)),
            );
            state.phase = CountdownPhase::Scheduled;
        } else if !state.stopped {
            state.phase = CountdownPhase::Expired;
            debug!(target: "countdown", "Countdown {} expired", self.inner.id);
        }
        state.seconds -= self.inner.interval;
    }

    /// Stop the countdown; no tick fires after this returns
    ///
    /// Safe to call repeatedly and from inside the callback.
    pub fn stop(&self) {
        let mut state = self.inner.state();
        if !state.stopped {
            trace!(target: "countdown", "Stopping countdown {}", self.inner.id);
        }
        state.stopped = true;
        if !state.phase.is_terminal() {
            state.phase = CountdownPhase::Stopped;
        }
        if let Some(handle) = state.pending.take() {
            self.inner.scheduler.cancel(handle);
        }
    }

    pub fn set_cancel_on_expire(&self, cancel: bool) {
        self.inner.state().cancel_on_expire = cancel;
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn interval(&self) -> i64 {
        self.inner.interval
    }

    pub fn total_seconds(&self) -> i64 {
        self.inner.total
    }

    /// Seconds the next tick will report
    pub fn remaining_seconds(&self) -> i64 {
        self.inner.state().seconds
    }

    pub fn phase(&self) -> CountdownPhase {
        self.inner.state().phase
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.state().stopped
    }

    /// Number of times the callback has been invoked
    pub fn ticks_fired(&self) -> u64 {
        self.inner.state().ticks_fired
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.inner.start_time
    }

    pub fn expected_end_time(&self) -> DateTime<Utc> {
        self.inner.expected_end_time
    }

    /// Wall-clock estimate of the time left; negative once overdue
    ///
    /// Informational only: scheduler jitter means this can drift from
    /// `remaining_seconds`.
    pub fn time_remaining(&self) -> TimeDelta {
        self.inner.expected_end_time - Utc::now()
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[Countdown {}:{}]",
            self.remaining_seconds(),
            self.inner.interval
        )
    }
}

impl fmt::Debug for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state();
        f.debug_struct("Countdown")
            .field("id", &self.inner.id)
            .field("seconds", &state.seconds)
            .field("interval", &self.inner.interval)
            .field("phase", &state.phase)
            .finish()
    }
}
