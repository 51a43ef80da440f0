//! The matcher: every 2 seconds, groups queued players into matches of
//! 8-16 within an expanding MMR window (SPEC_FULL.md section 4.7).

use crate::config;
use crate::matchmaking::queue::QueueEntry;

/// Tolerated MMR window for a player who has waited `waited_secs`.
pub fn window(waited_secs: i64) -> i64 {
    let steps = (waited_secs.max(0) / config::MATCHMAKING_WINDOW_STEP_SECS) as i64;
    (config::MATCHMAKING_WINDOW_BASE + config::MATCHMAKING_WINDOW_STEP * steps).min(config::MATCHMAKING_WINDOW_MAX)
}

/// Groups a queue (already sorted ascending by MMR) into matches.
/// Returns the groups formed; entries not included remain queued.
/// `now_ms` is used to compute each entry's waited time.
pub fn form_groups(entries: &[QueueEntry], now_ms: u64) -> Vec<Vec<QueueEntry>> {
    let mut assigned = vec![false; entries.len()];
    let mut groups = Vec::new();

    for anchor_idx in 0..entries.len() {
        if assigned[anchor_idx] {
            continue;
        }
        let anchor = &entries[anchor_idx];
        let anchor_wait = waited_secs(anchor, now_ms);

        let mut candidates = vec![anchor_idx];
        for idx in (anchor_idx + 1)..entries.len() {
            if assigned[idx] {
                continue;
            }
            let entry = &entries[idx];
            let entry_wait = waited_secs(entry, now_ms);
            let tolerated = window(anchor_wait.min(entry_wait));
            if entry.mmr - anchor.mmr <= tolerated {
                candidates.push(idx);
                if candidates.len() >= config::MAX_PLAYERS {
                    break;
                }
            } else {
                // MMR-ascending order means once the window is exceeded
                // for a consecutive entry, no later entry can qualify
                // either against this anchor (it only grows further away).
                break;
            }
        }

        if candidates.len() >= config::MIN_PLAYERS {
            for &idx in &candidates {
                assigned[idx] = true;
            }
            groups.push(candidates.into_iter().map(|i| entries[i].clone()).collect());
        }
    }

    groups
}

fn waited_secs(entry: &QueueEntry, now_ms: u64) -> i64 {
    (now_ms.saturating_sub(entry.joined_at_ms) / 1000) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, mmr: i64, waited_secs: u64) -> QueueEntry {
        QueueEntry { player_id: id.to_string(), display_name: id.to_string(), mmr, joined_at_ms: 1_000_000 - waited_secs * 1000 }
    }

    #[test]
    fn window_grows_in_steps_and_caps() {
        assert_eq!(window(0), 100);
        assert_eq!(window(70), 450);
        assert_eq!(window(130), 500);
        assert_eq!(window(10_000), 500);
    }

    #[test]
    fn eight_close_mmr_players_group_immediately() {
        // Scenario 4.
        let mmrs = [1000, 1020, 1050, 1080, 1100, 1130, 1150, 1180];
        let entries: Vec<QueueEntry> = mmrs.iter().enumerate().map(|(i, m)| entry(&format!("p{i}"), *m, 0)).collect();
        let groups = form_groups(&entries, 1_000_000);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 8);
    }

    #[test]
    fn wide_mmr_gap_does_not_group_even_after_window_expansion() {
        // Scenario 5: 1000 and 1600 at 70s wait, then at 130s wait.
        let entries_70 = vec![entry("lo", 1000, 70), entry("hi", 1600, 70)];
        assert!(form_groups(&entries_70, 1_000_000).is_empty());

        let entries_130 = vec![entry("lo", 1000, 130), entry("hi", 1600, 130)];
        assert!(form_groups(&entries_130, 1_000_000).is_empty());
    }

    #[test]
    fn group_absorbs_up_to_sixteen() {
        let entries: Vec<QueueEntry> = (0..20).map(|i| entry(&format!("p{i}"), 1000 + i, 0)).collect();
        let groups = form_groups(&entries, 1_000_000);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 16);
    }

    #[test]
    fn leftover_players_remain_ungrouped_when_fewer_than_minimum() {
        let entries: Vec<QueueEntry> = (0..5).map(|i| entry(&format!("p{i}"), 1000 + i, 0)).collect();
        let groups = form_groups(&entries, 1_000_000);
        assert!(groups.is_empty());
    }
}
