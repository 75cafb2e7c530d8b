//! Match lifecycle events for arenakit
//!
//! This crate provides the immutable event records published when a match
//! crosses a phase boundary, plus the bus that carries them to listeners.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod event_bus;
pub mod match_events;

pub use event_bus::{
    EventBus, EventConsumer, EventEnvelope, EventSender, EventSource, LoggingConsumer,
    run_consumer,
};
pub use match_events::{
    MatchCancelledEvent, MatchCompletedEvent, MatchCountdownTickEvent, MatchPrestartEvent,
    MatchStartEvent, MatchVictoryEvent,
};

// ============================================================================
// Identifiers
// ============================================================================

/// Opaque identifier of a running match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchId(pub u64);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "match-{}", self.0)
    }
}

/// A participating team as seen by lifecycle listeners
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Team {
    pub id: u32,
    pub name: String,
}

impl Team {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// ============================================================================
// Unified Event Type
// ============================================================================

/// Every lifecycle transition a match can publish
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchEvent {
    Prestart(MatchPrestartEvent),
    CountdownTick(MatchCountdownTickEvent),
    Start(MatchStartEvent),
    Victory(MatchVictoryEvent),
    Completed(MatchCompletedEvent),
    Cancelled(MatchCancelledEvent),
}

impl MatchEvent {
    /// The match this event belongs to
    pub fn match_id(&self) -> MatchId {
        match self {
            MatchEvent::Prestart(e) => e.match_id(),
            MatchEvent::CountdownTick(e) => e.match_id(),
            MatchEvent::Start(e) => e.match_id(),
            MatchEvent::Victory(e) => e.match_id(),
            MatchEvent::Completed(e) => e.match_id(),
            MatchEvent::Cancelled(e) => e.match_id(),
        }
    }

    /// The filter kind this event satisfies
    pub fn kind(&self) -> MatchEventKind {
        match self {
            MatchEvent::Prestart(_) => MatchEventKind::Prestart,
            MatchEvent::CountdownTick(_) => MatchEventKind::CountdownTick,
            MatchEvent::Start(_) => MatchEventKind::Start,
            MatchEvent::Victory(_) => MatchEventKind::Victory,
            MatchEvent::Completed(_) => MatchEventKind::Completed,
            MatchEvent::Cancelled(_) => MatchEventKind::Cancelled,
        }
    }
}

impl From<MatchPrestartEvent> for MatchEvent {
    fn from(event: MatchPrestartEvent) -> Self {
        MatchEvent::Prestart(event)
    }
}

impl From<MatchCountdownTickEvent> for MatchEvent {
    fn from(event: MatchCountdownTickEvent) -> Self {
        MatchEvent::CountdownTick(event)
    }
}

impl From<MatchStartEvent> for MatchEvent {
    fn from(event: MatchStartEvent) -> Self {
        MatchEvent::Start(event)
    }
}

impl From<MatchVictoryEvent> for MatchEvent {
    fn from(event: MatchVictoryEvent) -> Self {
        MatchEvent::Victory(event)
    }
}

impl From<MatchCompletedEvent> for MatchEvent {
    fn from(event: MatchCompletedEvent) -> Self {
        MatchEvent::Completed(event)
    }
}

impl From<MatchCancelledEvent> for MatchEvent {
    fn from(event: MatchCancelledEvent) -> Self {
        MatchEvent::Cancelled(event)
    }
}

// ============================================================================
// Event Filters
// ============================================================================

/// Filter used by behaviors to declare which lifecycle events they handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchEventKind {
    /// Every lifecycle event
    All,
    /// Match entered prestart
    Prestart,
    /// Countdown interval elapsed
    CountdownTick,
    /// Match started
    Start,
    /// Victory decided
    Victory,
    /// Match finished and cleaned up
    Completed,
    /// Match aborted before completion
    Cancelled,
}

impl MatchEventKind {
    /// Check if this filter matches the given event
    pub fn matches(&self, event: &MatchEvent) -> bool {
        match self {
            MatchEventKind::All => true,
            kind => *kind == event.kind(),
        }
    }
}
