//! Per-connection WebSocket handling: admission, `match:join`,
//! streaming `player_input`, and delivery of match broadcasts. Mirrors
//! the base server's split read/write task pattern, adapted to the
//! JSON protocol required by SPEC_FULL.md section 4.8.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::{info, warn};

use crate::config;
use crate::error::ProtocolError;
use crate::kv::Kv;
use crate::match_engine::lifecycle::MatchRegistry;
use crate::model::player::PlayerInput;
use crate::protocol::{ClientMsg, ServerMsg};

/// Handles one accepted WebSocket connection end-to-end. `identity` is
/// the token supplied via header or query param — verification of the
/// token itself is an external collaborator's concern (section 1); the
/// core trusts it as the player id.
pub async fn handle_connection(ws_stream: WebSocketStream<TcpStream>, identity: String, kv: Kv, registry: MatchRegistry) {
    let (mut ws_write, mut ws_read) = ws_stream.split();
    let (out_tx, mut out_rx) = mpsc::channel::<ServerMsg>(config::BROADCAST_CHANNEL_CAPACITY);

    let mut joined_match_id: Option<String> = None;

    let write_task = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            let Ok(json) = serde_json::to_string(&msg) else { continue };
            if ws_write.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    loop {
        let next = tokio::time::timeout(Duration::from_secs(config::SOCKET_IDLE_TIMEOUT_SECS), ws_read.next()).await;
        let Ok(Some(Ok(msg))) = next else {
            break; // idle timeout, close, or read error
        };

        let text = match msg {
            Message::Text(t) => t,
            Message::Close(_) => break,
            _ => continue, // ignore binary/ping/pong — protocol is JSON text frames
        };

        match serde_json::from_str::<ClientMsg>(&text) {
            Ok(ClientMsg::MatchJoin { match_id }) => {
                match try_join_match(&identity, &match_id, &kv, &registry, out_tx.clone()).await {
                    Ok(()) => {
                        joined_match_id = Some(match_id.clone());
                        let _ = out_tx.try_send(ServerMsg::MatchJoined { match_id });
                    }
                    Err(message) => {
                        let _ = out_tx.try_send(ServerMsg::Error { message });
                    }
                }
            }
            Ok(ClientMsg::PlayerInput { tick, up, down, left, right, shoot, aim_angle }) => {
                let Some(match_id) = joined_match_id.as_ref() else {
                    let _ = out_tx.try_send(ServerMsg::Error { message: "not joined to a match".to_string() });
                    continue;
                };
                let Some(handle) = registry.get(match_id).await else { continue };
                let input = PlayerInput {
                    owner_id: identity.clone(),
                    declared_tick: tick,
                    client_timestamp_ms: handle.elapsed_ms(),
                    up,
                    down,
                    left,
                    right,
                    aim_angle,
                    shoot,
                    interact: false,
                };
                handle.queue_input(input);
            }
            Err(e) => {
                let err = ProtocolError::from(e);
                warn!(identity = %identity, %err, "rejecting frame");
                let _ = out_tx.try_send(ServerMsg::Error { message: err.to_string() });
            }
        }
    }

    if let Some(match_id) = joined_match_id {
        if let Some(handle) = registry.get(&match_id).await {
            handle.detach(&identity);
        }
    }
    write_task.abort();
    info!(identity = %identity, "connection closed");
}

async fn try_join_match(identity: &str, match_id: &str, kv: &Kv, registry: &MatchRegistry, sender: mpsc::Sender<ServerMsg>) -> Result<(), String> {
    let assignment_raw = kv.get(&config::assignment_key(identity)).await.map_err(|_| "no assignment".to_string())?;
    let Some(raw) = assignment_raw else {
        return Err("no assignment".to_string());
    };
    let assignment: serde_json::Value = serde_json::from_str(&raw).map_err(|_| "no assignment".to_string())?;
    let assigned_match_id = assignment.get("matchId").and_then(|v| v.as_str()).ok_or_else(|| "no assignment".to_string())?;
    if assigned_match_id != match_id {
        return Err("no assignment".to_string());
    }

    let Some(handle) = registry.get(match_id).await else {
        return Err("match not found".to_string());
    };
    handle.attach(identity, sender);
    if handle.command_tx.send(crate::match_engine::lifecycle::MatchCommand::Start(tokio::sync::oneshot::channel().0)).is_err() {
        warn!(match_id, "match task gone while attaching");
    }
    Ok(())
}

pub fn extract_identity(uri: &str, headers: &[(String, String)]) -> Option<String> {
    for (name, value) in headers {
        if name.eq_ignore_ascii_case("authorization") {
            if let Some(token) = value.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }
    let query = uri.split_once('?').map(|(_, q)| q).unwrap_or("");
    for pair in query.split('&') {
        if let Some(value) = pair.strip_prefix("token=") {
            return Some(value.to_string());
        }
    }
    None
}

pub fn now_unix_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_token_from_bearer_header() {
        let headers = vec![("Authorization".to_string(), "Bearer abc123".to_string())];
        assert_eq!(extract_identity("/ws", &headers), Some("abc123".to_string()));
    }

    #[test]
    fn extracts_token_from_query_param() {
        let headers = vec![];
        assert_eq!(extract_identity("/ws?token=xyz", &headers), Some("xyz".to_string()));
    }

    #[test]
    fn missing_identity_returns_none() {
        assert_eq!(extract_identity("/ws", &[]), None);
    }
}
