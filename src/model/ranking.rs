//! Final-rank bookkeeping. Placement is assigned on death using
//! `1 + number still alive`; the winner's placement is set to 1 at
//! match end.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub player_id: String,
    pub display_name: String,
    /// 0 while alive; final placement (1 = winner) once set.
    pub placement: u32,
    pub kills: u32,
    pub damage_dealt: f64,
    pub alive: bool,
    /// Match tick at which this entry was recorded: the death tick for
    /// an eliminated player, or the tick the match ended on for a
    /// survivor. Used both to report survival time and to break
    /// placement ties (kills, then this, then player id).
    pub death_tick: u64,
}
