#![allow(dead_code)]
/// All match-engine and matchmaking constants — the source of truth for
/// every numeric value named in the design spec.

pub const GATEWAY_PORT: u16 = 8765;
pub const PROTOCOL_VERSION: u32 = 1;

// ─── Tick loop ───────────────────────────────────────────────────────

pub const TICK_RATE_HZ: u32 = 30;
/// Nominal tick interval in whole milliseconds, for logging only — the
/// scheduler itself uses the exact `1.0 / TICK_RATE_HZ` fractional duration.
pub const TICK_INTERVAL_MS: u64 = 33;

pub fn tick_interval() -> std::time::Duration {
    std::time::Duration::from_secs_f64(1.0 / TICK_RATE_HZ as f64)
}

// ─── Match composition ───────────────────────────────────────────────

pub const MIN_PLAYERS: usize = 8;
pub const MAX_PLAYERS: usize = 16;
pub const MATCH_HARD_CAP_SECS: u64 = 15 * 60;
pub const MATCH_ENDING_LINGER_SECS: u64 = 5;
pub const MATCH_CLEANUP_DELAY_SECS: u64 = 10;

// ─── Lag compensation ────────────────────────────────────────────────

pub const LAG_BUDGET_MS: u64 = 200;
pub const HISTORY_RING_SIZE: usize = 6; // ceil(200 / 33.333)

/// Backstop expiry for a projectile that never leaves its own range (a
/// near-stationary shot, or a future zero-speed weapon): 150 ticks is 5s
/// at 30Hz, comfortably above every weapon's range/speed tick count
/// (sniper ~80, rifle ~67, pistol 60, shotgun 50).
pub const PROJECTILE_MAX_LIFETIME_TICKS: u64 = 150;

// ─── Physics ──────────────────────────────────────────────────────────

pub const PLAYER_RADIUS: f64 = 20.0;
pub const PROJECTILE_RADIUS: f64 = 4.0;
pub const MAP_WIDTH: f64 = 4000.0;
pub const MAP_HEIGHT: f64 = 4000.0;
pub const PLAYER_PUSH_APART_FACTOR: f64 = 0.5;

// ─── Safe zone ───────────────────────────────────────────────────────

pub const ZONE_GRACE_PERIOD_SECS: u64 = 120;
pub const ZONE_SHRINK_DURATION_SECS: u64 = 180;
pub const ZONE_MIN_RADIUS: f64 = 200.0;
pub const ZONE_INITIAL_RADIUS: f64 = 1800.0;
pub const ZONE_DAMAGE_PER_TICK: f64 = 2.0;

// ─── Combat defaults ─────────────────────────────────────────────────

pub const DEFAULT_MAX_HEALTH: f64 = 100.0;
pub const MAX_SHIELD: f64 = 150.0;
pub const SHIELD_STACK_VALUE: f64 = 50.0;
pub const MAX_STACKS: u8 = 3;
pub const DAMAGE_STACK_BONUS: f64 = 5.0;
pub const FIRE_RATE_STACK_BONUS: f64 = 0.20;

// ─── Matchmaking ─────────────────────────────────────────────────────

pub const DEFAULT_MMR: i64 = 1000;
pub const MATCHER_INTERVAL_SECS: u64 = 2;
pub const QUEUE_ENTRY_TTL_SECS: u64 = 300;
pub const ASSIGNMENT_TTL_SECS: u64 = 300;
pub const MATCHMAKING_WINDOW_BASE: i64 = 100;
pub const MATCHMAKING_WINDOW_STEP: i64 = 50;
pub const MATCHMAKING_WINDOW_STEP_SECS: i64 = 10;
pub const MATCHMAKING_WINDOW_MAX: i64 = 500;

// ─── Connection fabric ───────────────────────────────────────────────

pub const INPUT_QUEUE_CAPACITY: usize = 1000;
pub const BROADCAST_CHANNEL_CAPACITY: usize = 100;
pub const SOCKET_IDLE_TIMEOUT_SECS: u64 = 30;

// ─── Storage ─────────────────────────────────────────────────────────

pub const SQLITE_PATH: &str = "outlast.db";
pub const REDIS_URL: &str = "redis://127.0.0.1:6379";
pub const MATCHMAKING_QUEUE_KEY: &str = "matchmaking:queue";

pub fn assignment_key(player_id: &str) -> String {
    format!("match:assignment:{player_id}")
}

pub fn session_key(player_id: &str) -> String {
    format!("session:{player_id}")
}
