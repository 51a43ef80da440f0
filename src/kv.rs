//! Thin wrapper over the shared KV store (redis). Used by the
//! matchmaking queue/matcher for the ordered set and by the gateway for
//! match assignments and sessions (SPEC_FULL.md section 6).

use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::error::KvError;

#[derive(Clone)]
pub struct Kv {
    conn: ConnectionManager,
}

impl Kv {
    pub async fn connect(url: &str) -> Result<Self, KvError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }

    pub async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<(), KvError> {
        let mut conn = self.conn.clone();
        conn.zadd(key, member, score).await?;
        Ok(())
    }

    pub async fn zrem(&self, key: &str, member: &str) -> Result<(), KvError> {
        let mut conn = self.conn.clone();
        conn.zrem(key, member).await?;
        Ok(())
    }

    /// Entire set, ascending by score.
    pub async fn zrange_with_scores(&self, key: &str) -> Result<Vec<(String, f64)>, KvError> {
        let mut conn = self.conn.clone();
        let items: Vec<(String, f64)> = conn.zrange_withscores(key, 0, -1).await?;
        Ok(items)
    }

    pub async fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), KvError> {
        let mut conn = self.conn.clone();
        conn.set_ex(key, value, ttl_secs).await?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    pub async fn del(&self, key: &str) -> Result<(), KvError> {
        let mut conn = self.conn.clone();
        conn.del(key).await?;
        Ok(())
    }
}
