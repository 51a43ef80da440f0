//! Relational store: match records, per-player result rows, and
//! aggregate player stats (SPEC_FULL.md sections 3 and 4.6). Written
//! only by the match-runner during teardown.

use rusqlite::{params, Connection};
use tracing::info;

use crate::error::PersistenceError;
use crate::mmr;

pub struct Database {
    conn: Connection,
}

// SAFETY: all access goes through &self methods using interior
// rusqlite locking; the bundled sqlite3 is compiled serialized
// (SQLITE_THREADSAFE=1), and in this repo each call is driven from a
// single match's teardown path at a time.
unsafe impl Send for Database {}
unsafe impl Sync for Database {}

pub struct MatchResultRow {
    pub player_id: String,
    pub placement: u32,
    pub kills: u32,
    pub damage: f64,
    pub survival_seconds: f64,
    pub mmr_delta: i64,
}

impl Database {
    pub fn new(path: &str) -> Result<Self, PersistenceError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_tables()?;
        info!("Database initialized at {path}");
        Ok(db)
    }

    fn init_tables(&self) -> Result<(), PersistenceError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS matches (
                id TEXT PRIMARY KEY,
                map_name TEXT NOT NULL,
                player_count INTEGER NOT NULL,
                start_time TEXT NOT NULL DEFAULT (datetime('now')),
                end_time TEXT NOT NULL DEFAULT (datetime('now')),
                duration_seconds REAL NOT NULL
            );

            CREATE TABLE IF NOT EXISTS match_results (
                match_id TEXT NOT NULL,
                player_id TEXT NOT NULL,
                placement INTEGER NOT NULL,
                kills INTEGER NOT NULL,
                damage REAL NOT NULL,
                survival_seconds REAL NOT NULL,
                mmr_delta INTEGER NOT NULL,
                PRIMARY KEY (match_id, player_id),
                FOREIGN KEY (match_id) REFERENCES matches(id)
            );

            CREATE TABLE IF NOT EXISTS player_stats (
                player_id TEXT PRIMARY KEY,
                mmr INTEGER NOT NULL DEFAULT 1000,
                wins INTEGER NOT NULL DEFAULT 0,
                losses INTEGER NOT NULL DEFAULT 0,
                kills INTEGER NOT NULL DEFAULT 0,
                deaths INTEGER NOT NULL DEFAULT 0
            );",
        )?;
        Ok(())
    }

    /// Persists one match record and its result rows, then rolls the
    /// MMR delta and win/loss/kill/death counters into `player_stats`.
    /// `match_results` rows are write-once per `(match_id, player_id)`
    /// (`INSERT OR IGNORE`); the aggregate-stats update only runs for
    /// rows that did not already exist, so replaying the same match's
    /// results is idempotent rather than double-counting.
    pub fn persist_match_results(&self, match_id: &str, player_count: u32, duration_secs: f64, results: &[MatchResultRow]) -> Result<(), PersistenceError> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT OR IGNORE INTO matches (id, map_name, player_count, duration_seconds) VALUES (?1, ?2, ?3, ?4)",
            params![match_id, "generated", player_count, duration_secs],
        )?;

        for row in results {
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO match_results (match_id, player_id, placement, kills, damage, survival_seconds, mmr_delta)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![match_id, row.player_id, row.placement, row.kills, row.damage, row.survival_seconds, row.mmr_delta],
            )?;
            if inserted == 0 {
                continue; // already recorded for this (match_id, player_id)
            }

            let won: i64 = if row.placement == 1 { 1 } else { 0 };
            let lost: i64 = 1 - won;
            tx.execute(
                "INSERT INTO player_stats (player_id, mmr, wins, losses, kills, deaths)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(player_id) DO UPDATE SET
                    mmr = MAX(0, player_stats.mmr + ?7),
                    wins = player_stats.wins + ?3,
                    losses = player_stats.losses + ?4,
                    kills = player_stats.kills + ?5,
                    deaths = player_stats.deaths + ?8",
                params![row.player_id, mmr::apply_mmr_delta(crate::config::DEFAULT_MMR, row.mmr_delta), won, lost, row.kills, lost, row.mmr_delta, lost],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    pub fn player_mmr(&self, player_id: &str) -> Result<i64, PersistenceError> {
        self.conn
            .query_row("SELECT mmr FROM player_stats WHERE player_id = ?1", params![player_id], |row| row.get(0))
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(crate::config::DEFAULT_MMR),
                other => Err(other),
            })
            .map_err(PersistenceError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persists_match_and_results() {
        let db = Database::new(":memory:").unwrap();
        let results = vec![
            MatchResultRow { player_id: "p1".into(), placement: 1, kills: 3, damage: 120.0, survival_seconds: 600.0, mmr_delta: 27 },
            MatchResultRow { player_id: "p2".into(), placement: 2, kills: 1, damage: 40.0, survival_seconds: 500.0, mmr_delta: 5 },
            MatchResultRow { player_id: "p3".into(), placement: 3, kills: 0, damage: 10.0, survival_seconds: 300.0, mmr_delta: -10 },
            MatchResultRow { player_id: "p4".into(), placement: 4, kills: 0, damage: 0.0, survival_seconds: 100.0, mmr_delta: -10 },
        ];
        db.persist_match_results("m1", 4, 600.0, &results).unwrap();

        let count: i64 = db.conn.query_row("SELECT COUNT(*) FROM match_results WHERE match_id = 'm1'", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 4);

        let p1_mmr = db.player_mmr("p1").unwrap();
        assert_eq!(p1_mmr, 1027);
    }

    #[test]
    fn unknown_player_defaults_to_starting_mmr() {
        let db = Database::new(":memory:").unwrap();
        assert_eq!(db.player_mmr("ghost").unwrap(), crate::config::DEFAULT_MMR);
    }

    #[test]
    fn persisting_same_result_twice_is_idempotent() {
        let db = Database::new(":memory:").unwrap();
        let results = vec![MatchResultRow { player_id: "p1".into(), placement: 1, kills: 3, damage: 120.0, survival_seconds: 600.0, mmr_delta: 27 }];
        db.persist_match_results("m1", 1, 600.0, &results).unwrap();
        db.persist_match_results("m1", 1, 600.0, &results).unwrap();
        let count: i64 = db.conn.query_row("SELECT COUNT(*) FROM match_results WHERE match_id = 'm1'", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 1);

        let mmr = db.player_mmr("p1").unwrap();
        assert_eq!(mmr, 1027, "re-persisting the same match must not double-apply the MMR delta");
    }
}
