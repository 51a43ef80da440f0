//! Per-match authoritative state. Owned by a single tick-loop worker;
//! the only cross-thread surfaces are the input queue and the
//! broadcast channel (see `lifecycle.rs`).

use std::collections::HashMap;

use crate::model::loot::{Crate, LootItem};
use crate::model::obstacle::Obstacle;
use crate::model::player::Player;
use crate::model::projectile::Projectile;
use crate::model::ranking::RankingEntry;
use crate::model::safe_zone::SafeZone;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    Waiting,
    Playing,
    Ending,
    Finished,
}

impl MatchPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchPhase::Waiting => "waiting",
            MatchPhase::Playing => "playing",
            MatchPhase::Ending => "ending",
            MatchPhase::Finished => "finished",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GameState {
    pub match_id: String,
    pub tick: u64,
    pub phase: MatchPhase,
    pub players: HashMap<String, Player>,
    pub projectiles: HashMap<String, Projectile>,
    pub obstacles: Vec<Obstacle>,
    pub crates: HashMap<String, Crate>,
    pub loot: HashMap<String, LootItem>,
    pub safe_zone: SafeZone,
    pub rankings: Vec<RankingEntry>,
    /// Wall-clock ms since match start; set when `start()` succeeds.
    pub start_time_ms: Option<u64>,
    pub next_projectile_seq: u64,
    /// Crates opened this tick, removed at the start of the next one so
    /// at least one broadcast shows `opened = true` before they vanish.
    pub pending_crate_removals: Vec<String>,
}

impl GameState {
    pub fn new(match_id: String) -> Self {
        Self {
            match_id,
            tick: 0,
            phase: MatchPhase::Waiting,
            players: HashMap::new(),
            projectiles: HashMap::new(),
            obstacles: Vec::new(),
            crates: HashMap::new(),
            loot: HashMap::new(),
            safe_zone: SafeZone::new(0.0, 0.0),
            rankings: Vec::new(),
            start_time_ms: None,
            next_projectile_seq: 0,
            pending_crate_removals: Vec::new(),
        }
    }

    pub fn alive_count(&self) -> usize {
        self.players.values().filter(|p| p.alive).count()
    }

    /// Player, Ranking, and Obstacle entries are deep (value) clones;
    /// Projectile and SafeZone are shallow-copied because they are
    /// immutable within the tick they are sampled (SPEC_FULL.md 4.2).
    pub fn snapshot(&self) -> GameState {
        self.clone()
    }

    pub fn next_projectile_id(&mut self) -> String {
        self.next_projectile_seq += 1;
        format!("{}-proj-{}", self.match_id, self.next_projectile_seq)
    }
}
