//! Wire protocol: JSON, one object per frame, `type` tag required.
//!
//! Replaces the base server's binary MessagePack framing
//! (1-byte type id + `rmp_serde` body) with a tagged JSON enum, per the
//! connection-fabric requirement in SPEC_FULL.md section 4.8.

use serde::{Deserialize, Serialize};

use crate::model::player::Weapon;
use crate::model::ranking::RankingEntry;

/// C->S messages.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    #[serde(rename = "match:join")]
    MatchJoin { #[serde(rename = "matchId")] match_id: String },
    PlayerInput {
        tick: u64,
        up: bool,
        down: bool,
        left: bool,
        right: bool,
        shoot: bool,
        #[serde(rename = "aimAngle")]
        aim_angle: f64,
    },
}

/// S->C messages.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    MatchFound {
        #[serde(rename = "matchId")]
        match_id: String,
        #[serde(rename = "playerCount")]
        player_count: usize,
    },
    #[serde(rename = "match:joined")]
    MatchJoined { #[serde(rename = "matchId")] match_id: String },
    #[serde(rename = "game:state")]
    GameState {
        tick: u64,
        players: Vec<PlayerView>,
        projectiles: Vec<ProjectileView>,
        loot: Vec<LootView>,
        crates: Vec<CrateView>,
        #[serde(rename = "safeZone")]
        safe_zone: SafeZoneView,
        phase: String,
        rankings: Vec<RankingEntry>,
    },
    MatchEnded {
        #[serde(rename = "matchId")]
        match_id: String,
        duration: f64,
        rankings: Vec<RankingEntry>,
        #[serde(rename = "winnerId")]
        winner_id: Option<String>,
    },
    Error { message: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub body_rotation: f64,
    pub turret_rotation: f64,
    pub health: f64,
    pub shield: f64,
    pub alive: bool,
    pub kills: u32,
    pub weapon: Weapon,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectileView {
    pub id: String,
    pub owner_id: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LootView {
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrateView {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub opened: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeZoneView {
    pub center_x: f64,
    pub center_y: f64,
    pub current_radius: f64,
    pub target_radius: f64,
}
