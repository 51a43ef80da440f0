//! Error hierarchy: one enum per subsystem boundary, composed into
//! `AppError` where subsystems meet. `?` propagates within a subsystem;
//! crossing a boundary goes through an explicit `From` impl.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed json: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unknown message type: {0}")]
    UnknownType(String),
    #[error("missing field: {0}")]
    MissingField(&'static str),
}

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("match is full")]
    Full,
    #[error("player already in match")]
    DuplicatePlayer,
    #[error("not enough players to start (have {have}, need {need})")]
    NotEnoughPlayers { have: usize, need: usize },
    #[error("match already started")]
    AlreadyStarted,
    #[error("no assignment")]
    NoAssignment,
    #[error("match id mismatch")]
    WrongMatch,
    #[error("match not found")]
    NotFound,
}

#[derive(Debug, Error)]
pub enum KvError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("malformed kv payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Top-level error, used only where subsystems cross or at process
/// start. Most `MatchError`/`KvError`/`PersistenceError` instances are
/// handled locally (logged or turned into a protocol frame) and never
/// reach this type — see SPEC_FULL.md section 10.2.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Match(#[from] MatchError),
    #[error(transparent)]
    Kv(#[from] KvError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("startup failure: {0}")]
    Startup(String),
}
