use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use arenakit_events::{
    EventSender, MatchCancelledEvent, MatchCompletedEvent, MatchCountdownTickEvent, MatchId,
    MatchPrestartEvent, MatchStartEvent, MatchVictoryEvent, Team,
};
use arenakit_scheduler::{Countdown, CountdownError, TickConfig, TickScheduler};
use tracing::{debug, info};

use crate::config::MatchConfig;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PhaseGateError {
    #[error("{0} is already in prestart")]
    AlreadyInPrestart(MatchId),
    #[error(transparent)]
    Countdown(#[from] CountdownError),
}

struct Active {
    generation: u64,
    countdown: Countdown,
}

/// Matches currently in prestart
///
/// Countdown callbacks only hold a weak reference, so the last gate clone
/// going away drops this map and stops whatever is still counting.
#[derive(Default)]
struct ActiveMatches(Mutex<HashMap<MatchId, Active>>);

impl ActiveMatches {
    fn lock(&self) -> MutexGuard<'_, HashMap<MatchId, Active>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ActiveMatches {
    fn drop(&mut self) {
        let active = self.0.get_mut().unwrap_or_else(PoisonError::into_inner);
        for (match_id, entry) in active.drain() {
            debug!(target: "host", "{} prestart abandoned; stopping countdown", match_id);
            entry.countdown.stop();
        }
    }
}

/// Drives a match from prestart to start and publishes each transition
///
/// For a prestart of N seconds the bus sees, in order: one
/// `MatchPrestartEvent`, a `MatchCountdownTickEvent` per interval, then a
/// `MatchStartEvent` once the countdown reaches zero.
#[derive(Clone)]
pub struct PhaseGate {
    scheduler: Arc<dyn TickScheduler>,
    ticks: TickConfig,
    timing: MatchConfig,
    events: EventSender,
    active: Arc<ActiveMatches>,
    generation: Arc<AtomicU64>,
}

impl PhaseGate {
    pub fn new(
        scheduler: Arc<dyn TickScheduler>,
        ticks: TickConfig,
        timing: MatchConfig,
        events: EventSender,
    ) -> Self {
        Self {
            scheduler,
            ticks,
            timing,
            events,
            active: Arc::new(ActiveMatches::default()),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Enter prestart for `match_id` with `teams` in their listed order
    ///
    /// A zero-length prestart starts the match immediately.
    pub fn begin_prestart(&self, match_id: MatchId, teams: Vec<Team>) -> Result<(), PhaseGateError> {
        let mut active = self.active.lock();
        if active.contains_key(&match_id) {
            return Err(PhaseGateError::AlreadyInPrestart(match_id));
        }

        self.events
            .publish(MatchPrestartEvent::new(match_id, teams.clone()));

        if self.timing.prestart_seconds == 0 {
            info!(target: "host", "{} starting with no prestart", match_id);
            self.events.publish(MatchStartEvent::new(match_id, teams));
            return Ok(());
        }

        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let events = self.events.clone();
        let registry: Weak<ActiveMatches> = Arc::downgrade(&self.active);
        let countdown = Countdown::start(
            Arc::clone(&self.scheduler),
            self.ticks,
            self.timing.prestart_seconds,
            Some(self.timing.prestart_interval),
            move |remaining: i64| {
                events.publish(MatchCountdownTickEvent::new(match_id, remaining));
                if remaining <= 0 {
                    if let Some(registry) = registry.upgrade() {
                        let mut active = registry.lock();
                        if active.get(&match_id).map(|a| a.generation) == Some(generation) {
                            active.remove(&match_id);
                        }
                    }
                    info!(target: "host", "{} prestart finished; starting", match_id);
                    events.publish(MatchStartEvent::new(match_id, teams.clone()));
                }
                true
            },
        )?;

        debug!(target: "host", "{} entered prestart with {}", match_id, countdown);
        active.insert(
            match_id,
            Active {
                generation,
                countdown,
            },
        );
        Ok(())
    }

    /// Abort a match; stops its prestart countdown if one is running
    ///
    /// Returns whether a countdown was stopped.
    pub fn cancel(&self, match_id: MatchId, reason: &str) -> bool {
        let stopped = self.stop_countdown(match_id);
        info!(target: "host", "{} cancelled: {}", match_id, reason);
        self.events
            .publish(MatchCancelledEvent::new(match_id, reason));
        stopped
    }

    /// Report the outcome of a finished match
    pub fn complete(&self, match_id: MatchId, winners: Vec<Team>, losers: Vec<Team>) {
        self.stop_countdown(match_id);

        let mut teams = winners.clone();
        teams.extend(losers.iter().cloned());
        self.events
            .publish(MatchVictoryEvent::new(match_id, winners, losers));
        self.events
            .publish(MatchCompletedEvent::new(match_id, teams));
    }

    pub fn is_in_prestart(&self, match_id: MatchId) -> bool {
        self.active.lock().contains_key(&match_id)
    }

    /// Seconds the next prestart tick for `match_id` will report
    pub fn prestart_remaining(&self, match_id: MatchId) -> Option<i64> {
        self.active
            .lock()
            .get(&match_id)
            .map(|a| a.countdown.remaining_seconds())
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }

    fn stop_countdown(&self, match_id: MatchId) -> bool {
        let removed = self.active.lock().remove(&match_id);
        match removed {
            Some(active) => {
                active.countdown.stop();
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for PhaseGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseGate")
            .field("timing", &self.timing)
            .field("active", &self.active_count())
            .finish()
    }
}
