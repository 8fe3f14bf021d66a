//! Replay storage: where finished training batches are handed to the trainer.
//!
//! # Usage
//!
//! ```rust,ignore
//! use actor::storage::{create_replay_store, ReplayStore};
//!
//! let store = create_replay_store(&db_path)?;
//! store.store_batch(&batch).await?;
//! ```

mod sqlite;

pub use sqlite::SqliteReplayStore;

use anyhow::Result;
use async_trait::async_trait;
use games_ultimate::{AVAILABILITY_SIZE, NUM_ACTIONS, STATE_SIZE};

use crate::selfplay::TrainingBatch;

/// Shapes the trainer needs to decode stored tensors.
#[derive(Debug, Clone, PartialEq)]
pub struct GameMetadata {
    pub env_id: String,
    pub display_name: String,
    pub num_actions: usize,
    pub state_size: usize,
    pub availability_size: usize,
}

impl GameMetadata {
    pub fn ultimate() -> Self {
        Self {
            env_id: "ultimate".to_string(),
            display_name: "Nested Tic-Tac-Toe".to_string(),
            num_actions: NUM_ACTIONS,
            state_size: STATE_SIZE,
            availability_size: AVAILABILITY_SIZE,
        }
    }
}

/// Abstract interface for replay buffer storage.
///
/// A batch is written in a single transaction: readers see all of it or
/// none of it.
#[async_trait]
pub trait ReplayStore: Send + Sync {
    /// Store every example of the batch. Returns the number of rows written.
    async fn store_batch(&self, batch: &TrainingBatch) -> Result<usize>;

    /// Total number of stored examples
    async fn count(&self) -> Result<usize>;

    /// Number of stored examples produced in `iteration`
    async fn count_iteration(&self, iteration: u32) -> Result<usize>;

    /// Delete the examples of `iteration`. Returns the number of rows removed.
    async fn remove_iteration(&self, iteration: u32) -> Result<usize>;

    /// Store or update game metadata (upsert)
    async fn store_metadata(&self, metadata: &GameMetadata) -> Result<()>;
}

/// Open the SQLite replay store at `db_path`.
pub fn create_replay_store(db_path: &str) -> Result<Box<dyn ReplayStore>> {
    Ok(Box::new(SqliteReplayStore::new(db_path)?))
}

/// Little-endian f32 bytes, the layout every BLOB column uses.
pub(crate) fn encode_f32s(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}
