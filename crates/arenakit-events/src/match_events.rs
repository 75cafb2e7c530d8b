//! Immutable records for each match phase transition.
//!
//! Team lists keep the order they were given at construction. That order is
//! the seeding/turn order of the match and listeners rely on it.

use serde::{Deserialize, Serialize};

use crate::{MatchId, Team};

/// Published when a match enters prestart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPrestartEvent {
    match_id: MatchId,
    teams: Vec<Team>,
}

impl MatchPrestartEvent {
    pub fn new(match_id: MatchId, teams: Vec<Team>) -> Self {
        Self { match_id, teams }
    }

    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }
}

/// Published each time a phase countdown reaches an interval boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCountdownTickEvent {
    match_id: MatchId,
    seconds_remaining: i64,
}

impl MatchCountdownTickEvent {
    pub fn new(match_id: MatchId, seconds_remaining: i64) -> Self {
        Self {
            match_id,
            seconds_remaining,
        }
    }

    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    pub fn seconds_remaining(&self) -> i64 {
        self.seconds_remaining
    }
}

/// Published when the prestart countdown runs out and play begins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStartEvent {
    match_id: MatchId,
    teams: Vec<Team>,
}

impl MatchStartEvent {
    pub fn new(match_id: MatchId, teams: Vec<Team>) -> Self {
        Self { match_id, teams }
    }

    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchVictoryEvent {
    match_id: MatchId,
    winners: Vec<Team>,
    losers: Vec<Team>,
}

impl MatchVictoryEvent {
    pub fn new(match_id: MatchId, winners: Vec<Team>, losers: Vec<Team>) -> Self {
        Self {
            match_id,
            winners,
            losers,
        }
    }

    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    pub fn winners(&self) -> &[Team] {
        &self.winners
    }

    pub fn losers(&self) -> &[Team] {
        &self.losers
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCompletedEvent {
    match_id: MatchId,
    teams: Vec<Team>,
}

impl MatchCompletedEvent {
    pub fn new(match_id: MatchId, teams: Vec<Team>) -> Self {
        Self { match_id, teams }
    }

    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCancelledEvent {
    match_id: MatchId,
    reason: String,
}

impl MatchCancelledEvent {
    pub fn new(match_id: MatchId, reason: impl Into<String>) -> Self {
        Self {
            match_id,
            reason: reason.into(),
        }
    }

    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}
