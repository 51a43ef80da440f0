pub mod matcher;
pub mod queue;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{info, warn};
use uuid::Uuid;

use crate::config;
use crate::kv::Kv;
use crate::match_engine::lifecycle::{spawn_match, MatchRegistry};
use crate::persistence::Database;

fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}

/// Runs forever, polling the queue every `MATCHER_INTERVAL_SECS` and
/// creating match instances for any group the matcher forms. KV
/// failures abandon this tick only; the next tick retries (section 7).
pub async fn run_matcher_loop(kv: Kv, db: Arc<Database>, registry: MatchRegistry) {
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(config::MATCHER_INTERVAL_SECS));
    loop {
        interval.tick().await;

        let entries = match queue::read_queue(&kv, now_ms()).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "matcher: KV read failed, skipping this pass");
                continue;
            }
        };
        if entries.is_empty() {
            continue;
        }

        let groups = matcher::form_groups(&entries, now_ms());
        for group in groups {
            let match_id = Uuid::new_v4().to_string();
            info!(match_id = %match_id, player_count = group.len(), "matcher formed a group");

            for entry in &group {
                if let Err(e) = queue::leave_queue(&kv, &entry.player_id).await {
                    warn!(error = %e, player_id = %entry.player_id, "failed to remove matched player from queue");
                }
                let assignment = serde_json::json!({
                    "matchId": match_id,
                    "playerCount": group.len(),
                    "createdAt": now_ms(),
                });
                if let Err(e) = kv
                    .set_with_ttl(&config::assignment_key(&entry.player_id), &assignment.to_string(), config::ASSIGNMENT_TTL_SECS)
                    .await
                {
                    warn!(error = %e, player_id = %entry.player_id, "failed to write match assignment");
                }
            }

            let handle = spawn_match(match_id.clone(), group, db.clone(), registry.clone());
            registry.insert(handle).await;
        }
    }
}
