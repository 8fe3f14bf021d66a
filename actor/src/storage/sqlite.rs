//! SQLite backend for replay buffer storage.
//!
//! The external trainer reads the `examples` table directly, so the schema
//! is part of the hand-off contract.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::{encode_f32s, GameMetadata, ReplayStore};
use crate::selfplay::TrainingBatch;

/// SQLite-based replay buffer implementation.
///
/// Uses a Mutex for thread-safety since rusqlite Connection is not Sync.
pub struct SqliteReplayStore {
    conn: Mutex<Connection>,
}

impl SqliteReplayStore {
    /// Create a new SQLite replay store, initializing the database if needed.
    pub fn new(db_path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(db_path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS examples (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                iteration INTEGER NOT NULL,
                game_id TEXT NOT NULL,
                ply INTEGER NOT NULL,
                state BLOB NOT NULL,
                availability BLOB NOT NULL,
                policy BLOB NOT NULL,
                value REAL NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (game_id, ply)
            )",
            [],
        )?;

        // Trainer pulls whole iterations at a time
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_examples_iteration ON examples(iteration)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS game_metadata (
                env_id TEXT PRIMARY KEY,
                display_name TEXT NOT NULL,
                num_actions INTEGER NOT NULL,
                state_size INTEGER NOT NULL,
                availability_size INTEGER NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| anyhow!("Lock poisoned: {}", e))
    }
}

#[async_trait]
impl ReplayStore for SqliteReplayStore {
    async fn store_batch(&self, batch: &TrainingBatch) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        let mut stmt = tx.prepare_cached(
            "INSERT INTO examples
             (iteration, game_id, ply, state, availability, policy, value)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;

        let mut rows = 0;
        let mut state = Vec::new();
        let mut availability = Vec::new();
        for (game, example) in batch.examples() {
            state.clear();
            availability.clear();
            example.observation.encode_state(&mut state);
            example.observation.encode_availability(&mut availability);

            stmt.execute(params![
                batch.iteration,
                format!("{}-{}", batch.iteration, game),
                example.ply,
                state,
                availability,
                encode_f32s(&example.policy),
                example.value,
            ])?;
            rows += 1;
        }

        // Drop stmt before commit to release borrow on tx
        drop(stmt);
        tx.commit()?;
        Ok(rows)
    }

    async fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM examples", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    async fn count_iteration(&self, iteration: u32) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM examples WHERE iteration = ?1",
            params![iteration],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    async fn remove_iteration(&self, iteration: u32) -> Result<usize> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM examples WHERE iteration = ?1",
            params![iteration],
        )?;
        Ok(removed)
    }

    async fn store_metadata(&self, metadata: &GameMetadata) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO game_metadata
             (env_id, display_name, num_actions, state_size, availability_size, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, CURRENT_TIMESTAMP)",
            params![
                metadata.env_id,
                metadata.display_name,
                metadata.num_actions as i64,
                metadata.state_size as i64,
                metadata.availability_size as i64,
            ],
        )?;
        Ok(())
    }
}
