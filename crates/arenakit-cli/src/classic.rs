use std::collections::HashMap;

use arenakit_events::{MatchEvent, MatchEventKind, MatchId, Team};
use arenakit_host::{Extension, ExtensionContext};
use arenakit_types::{BasicArena, MatchContext, VictoryCondition};
use tracing::info;

pub const MOST_KILLS: &str = "MOSTKILLS";

/// Built-in extension with a handful of common arena kinds
#[derive(Debug, Default)]
pub struct Classic;

impl Extension for Classic {
    fn id(&self) -> &'static str {
        "classic"
    }

    fn name(&self) -> &'static str {
        "Classic Arenas"
    }

    fn description(&self) -> &'static str {
        "Arena, Skirmish, Battleground and FreeForAll kinds plus a kill-count victory"
    }

    fn on_load(&mut self, ctx: &mut ExtensionContext<'_>) {
        for name in ["Arena", "Skirmish", "Battleground", "FreeForAll"] {
            ctx.register_arena(name, || Ok(BasicArena::default()));
        }
        ctx.add_compatibility("Arena", "Skirmish");
        ctx.add_compatibility("Skirmish", "Battleground");

        ctx.register_victory_with_handlers(
            "MostKills",
            &[MatchEventKind::Completed],
            |ctx| Ok(MostKills::new(ctx)),
        );
    }
}

/// Team with the most kills when the match completes wins
#[derive(Debug, Clone)]
pub struct MostKills {
    match_id: MatchId,
    teams: Vec<Team>,
    kills: HashMap<u32, u32>,
    winner: Option<Team>,
}

impl MostKills {
    pub fn new(ctx: MatchContext) -> Self {
        Self {
            match_id: ctx.match_id,
            teams: ctx.teams,
            kills: HashMap::new(),
            winner: None,
        }
    }

    pub fn record_kill(&mut self, team_id: u32) {
        *self.kills.entry(team_id).or_insert(0) += 1;
    }

    pub fn kills(&self, team_id: u32) -> u32 {
        self.kills.get(&team_id).copied().unwrap_or(0)
    }

    /// The single team with the highest count; `None` on a tie or no kills
    ///
    /// Kills credited to team ids outside the match are ignored.
    pub fn leader(&self) -> Option<&Team> {
        let best = self.teams.iter().map(|team| self.kills(team.id)).max()?;
        if best == 0 {
            return None;
        }
        let mut leaders = self.teams.iter().filter(|team| self.kills(team.id) == best);
        match (leaders.next(), leaders.next()) {
            (Some(team), None) => Some(team),
            _ => None,
        }
    }
}

impl VictoryCondition for MostKills {
    fn name(&self) -> &str {
        MOST_KILLS
    }

    fn match_id(&self) -> MatchId {
        self.match_id
    }

    fn handle_event(&mut self, event: &MatchEvent) {
        if let MatchEvent::Completed(_) = event {
            self.winner = self.leader().cloned();
            match &self.winner {
                Some(team) => info!(target: "host", "{}: {} wins on kills", self.match_id, team),
                None => info!(target: "host", "{}: no outright kill leader", self.match_id),
            }
        }
    }

    fn winner(&self) -> Option<&Team> {
        self.winner.as_ref()
    }
}
