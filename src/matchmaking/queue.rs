//! Matchmaking queue: an ordered set in the shared KV, score = MMR,
//! member = serialized `QueueEntry` (SPEC_FULL.md section 4.7).

use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::KvError;
use crate::kv::Kv;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    pub player_id: String,
    pub display_name: String,
    pub mmr: i64,
    /// Milliseconds since the Unix epoch.
    pub joined_at_ms: u64,
}

/// Idempotent: re-joining the same player overwrites their join
/// timestamp rather than creating a second entry.
pub async fn join_queue(kv: &Kv, player_id: &str, display_name: &str, mmr: i64, now_ms: u64) -> Result<(), KvError> {
    remove_entry_for_player(kv, player_id).await?;
    let entry = QueueEntry { player_id: player_id.to_string(), display_name: display_name.to_string(), mmr, joined_at_ms: now_ms };
    let member = serde_json::to_string(&entry)?;
    kv.zadd(config::MATCHMAKING_QUEUE_KEY, &member, mmr as f64).await
}

pub async fn leave_queue(kv: &Kv, player_id: &str) -> Result<(), KvError> {
    remove_entry_for_player(kv, player_id).await
}

async fn remove_entry_for_player(kv: &Kv, player_id: &str) -> Result<(), KvError> {
    let entries = kv.zrange_with_scores(config::MATCHMAKING_QUEUE_KEY).await?;
    for member in members_for_player(&entries, player_id) {
        kv.zrem(config::MATCHMAKING_QUEUE_KEY, &member).await?;
    }
    Ok(())
}

/// Pure dedup step shared by `join_queue`/`leave_queue`: which raw
/// members (if any) in the sorted set belong to `player_id`. Separated
/// out so the two round-trip laws (spec.md section 8) can be checked
/// without a live KV connection.
fn members_for_player(raw: &[(String, f64)], player_id: &str) -> Vec<String> {
    raw.iter()
        .filter_map(|(member, _score)| serde_json::from_str::<QueueEntry>(member).ok().map(|e| (member.clone(), e)))
        .filter(|(_, e)| e.player_id == player_id)
        .map(|(member, _)| member)
        .collect()
}

/// The full queue, ascending by MMR, with entries aged past the KV TTL
/// silently dropped (section 4.7).
pub async fn read_queue(kv: &Kv, now_ms: u64) -> Result<Vec<QueueEntry>, KvError> {
    let raw = kv.zrange_with_scores(config::MATCHMAKING_QUEUE_KEY).await?;
    let ttl_ms = config::QUEUE_ENTRY_TTL_SECS * 1000;
    let mut entries: Vec<QueueEntry> = raw
        .into_iter()
        .filter_map(|(member, _score)| serde_json::from_str::<QueueEntry>(&member).ok())
        .filter(|e| now_ms.saturating_sub(e.joined_at_ms) <= ttl_ms)
        .collect();
    entries.sort_by(|a, b| a.mmr.cmp(&b.mmr).then(a.player_id.cmp(&b.player_id)));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(player_id: &str, mmr: i64, joined_at_ms: u64) -> QueueEntry {
        QueueEntry { player_id: player_id.to_string(), display_name: player_id.to_string(), mmr, joined_at_ms }
    }

    fn member(e: &QueueEntry) -> (String, f64) {
        (serde_json::to_string(e).unwrap(), e.mmr as f64)
    }

    /// join_queue -> join_queue leaves exactly one entry for that player.
    #[test]
    fn rejoin_leaves_exactly_one_entry() {
        let first = entry("p1", 1000, 0);
        let mut raw = vec![member(&first)];

        // Simulate the second join_queue: remove any existing entry for
        // the player, then add the fresh one, exactly as join_queue does.
        let second = entry("p1", 1050, 5_000);
        let to_remove = members_for_player(&raw, "p1");
        assert_eq!(to_remove.len(), 1, "first join should have produced exactly one member to dedup");
        raw.retain(|(m, _)| !to_remove.contains(m));
        raw.push(member(&second));

        let remaining: Vec<QueueEntry> = raw.iter().filter_map(|(m, _)| serde_json::from_str(m).ok()).collect();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].mmr, 1050);
        assert_eq!(remaining[0].joined_at_ms, 5_000);
    }

    /// join_queue -> leave_queue leaves zero entries for that player.
    #[test]
    fn join_then_leave_leaves_zero_entries() {
        let mine = entry("p1", 1000, 0);
        let other = entry("p2", 900, 0);
        let raw = vec![member(&mine), member(&other)];

        let to_remove = members_for_player(&raw, "p1");
        assert_eq!(to_remove.len(), 1);
        let remaining: Vec<(String, f64)> = raw.into_iter().filter(|(m, _)| !to_remove.contains(m)).collect();

        let remaining_ids: Vec<QueueEntry> = remaining.iter().filter_map(|(m, _)| serde_json::from_str(m).ok()).collect();
        assert_eq!(remaining_ids.len(), 1);
        assert_eq!(remaining_ids[0].player_id, "p2");
    }

    #[test]
    fn members_for_player_ignores_unrelated_entries() {
        let raw = vec![member(&entry("p1", 1000, 0)), member(&entry("p2", 900, 0))];
        assert!(members_for_player(&raw, "p3").is_empty());
    }
}
