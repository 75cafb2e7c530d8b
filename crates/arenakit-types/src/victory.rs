//! Victory condition kinds
//!
//! Victory factories are built against the match they will judge, so they take
//! a [`MatchContext`]. Names are stored upper-cased; `LASTMANSTANDING` is the
//! default kind and exists from construction.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use arenakit_events::{MatchEvent, MatchEventKind, MatchId, Team};
use tracing::error;

use crate::registry::{CreateError, NameCase, TypeRegistry, panic_message};
use crate::token::{ExtensionId, TypeToken};

/// Name of the default victory kind
pub const LAST_MAN_STANDING: &str = "LASTMANSTANDING";

/// What a victory condition knows about the match it was built for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchContext {
    pub match_id: MatchId,
    pub victory_type: TypeToken,
    pub teams: Vec<Team>,
}

impl MatchContext {
    pub fn new(match_id: MatchId, victory_type: TypeToken, teams: Vec<Team>) -> Self {
        Self {
            match_id,
            victory_type,
            teams,
        }
    }
}

/// Behavior an extension supplies for a victory kind
pub trait VictoryCondition: Send + fmt::Debug {
    fn name(&self) -> &str;

    fn match_id(&self) -> MatchId;

    /// Called for lifecycle events the kind declared handlers for
    fn handle_event(&mut self, _event: &MatchEvent) {}

    /// The winning team, once decided
    fn winner(&self) -> Option<&Team> {
        None
    }
}

/// Default condition: the last team left wins
#[derive(Debug, Clone)]
pub struct LastManStanding {
    match_id: MatchId,
    remaining: Vec<Team>,
}

impl LastManStanding {
    pub fn new(ctx: MatchContext) -> Self {
        Self {
            match_id: ctx.match_id,
            remaining: ctx.teams,
        }
    }

    /// Teams still in play, in seeding order
    pub fn remaining(&self) -> &[Team] {
        &self.remaining
    }

    /// Remove a team; returns the winner once only one team is left
    pub fn eliminate(&mut self, team_id: u32) -> Option<&Team> {
        self.remaining.retain(|team| team.id != team_id);
        match self.remaining.as_slice() {
            [winner] => Some(winner),
            _ => None,
        }
    }
}

impl VictoryCondition for LastManStanding {
    fn name(&self) -> &str {
        LAST_MAN_STANDING
    }

    fn match_id(&self) -> MatchId {
        self.match_id
    }

    fn winner(&self) -> Option<&Team> {
        match self.remaining.as_slice() {
            [winner] => Some(winner),
            _ => None,
        }
    }
}

/// Registry of victory condition kinds
#[derive(Debug)]
pub struct VictoryTypes {
    registry: TypeRegistry<MatchContext, Box<dyn VictoryCondition>>,
    default: TypeToken,
}

impl VictoryTypes {
    pub fn new() -> Self {
        let mut registry: TypeRegistry<MatchContext, Box<dyn VictoryCondition>> =
            TypeRegistry::new("victory", NameCase::Upper);
        let default = registry.register(LAST_MAN_STANDING, &ExtensionId::core(), |ctx| {
            Ok(Box::new(LastManStanding::new(ctx)) as Box<dyn VictoryCondition>)
        });
        Self { registry, default }
    }

    /// The `LASTMANSTANDING` token
    pub fn default_type(&self) -> &TypeToken {
        &self.default
    }

    /// Register a victory kind; the stored name is upper-cased
    pub fn register<V, F>(&mut self, name: &str, owner: &ExtensionId, factory: F) -> TypeToken
    where
        V: VictoryCondition + 'static,
        F: Fn(MatchContext) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        self.register_with_handlers(name, owner, &[], factory)
    }

    pub fn register_with_handlers<V, F>(
        &mut self,
        name: &str,
        owner: &ExtensionId,
        handlers: &[MatchEventKind],
        factory: F,
    ) -> TypeToken
    where
        V: VictoryCondition + 'static,
        F: Fn(MatchContext) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        self.registry
            .register_with_handlers(name, owner, handlers, move |ctx| {
                factory(ctx).map(|condition| Box::new(condition) as Box<dyn VictoryCondition>)
            })
    }

    pub fn lookup(&self, name: &str) -> Option<TypeToken> {
        self.registry.lookup(name)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registry.is_registered(name)
    }

    pub fn registry(&self) -> &TypeRegistry<MatchContext, Box<dyn VictoryCondition>> {
        &self.registry
    }

    pub fn try_create(&self, ctx: &MatchContext) -> Result<Box<dyn VictoryCondition>, CreateError> {
        self.registry.try_create(&ctx.victory_type, ctx.clone())
    }

    /// Build the victory condition named by `ctx.victory_type`
    pub fn create_victory_condition(&self, ctx: &MatchContext) -> Option<Box<dyn VictoryCondition>> {
        self.registry.create(&ctx.victory_type, ctx.clone())
    }

    /// Deliver `event` to the live conditions of its match whose kind
    /// declared a handler for it
    ///
    /// Returns the number of conditions notified. A handler that panics is
    /// logged and skipped.
    pub fn dispatch(
        &self,
        event: &MatchEvent,
        conditions: &mut [Box<dyn VictoryCondition>],
    ) -> usize {
        let interested = self.registry.handlers_for(event.kind());
        if interested.is_empty() {
            return 0;
        }

        let mut notified = 0;
        for condition in conditions.iter_mut() {
            if condition.match_id() != event.match_id() {
                continue;
            }
            let Some(token) = self.registry.lookup(condition.name()) else {
                continue;
            };
            if !interested.contains(&token) {
                continue;
            }

            match panic::catch_unwind(AssertUnwindSafe(|| condition.handle_event(event))) {
                Ok(()) => notified += 1,
                Err(payload) => {
                    error!(target: "registry",
                        "Victory condition {} for {} panicked while handling {:?}: {}",
                        token,
                        event.match_id(),
                        event.kind(),
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
        notified
    }
}

impl Default for VictoryTypes {
    fn default() -> Self {
        Self::new()
    }
}
