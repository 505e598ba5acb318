//! Snapshot persistence port and adapters.

use crate::answers::FormAnswers;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod database;
pub mod memory;

pub use database::SqliteSessionStore;
pub use memory::MemoryStore;

/// Session-scoped key/value port for engine snapshots.
///
/// The engine only ever talks to this trait, never to a concrete
/// backend, so it stays testable without a real storage layer.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn put(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// What survives a reload. The wire shape is fixed (camelCase keys) so
/// snapshots written by earlier sessions keep deserializing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub current_step: usize,
    pub form_data: FormAnswers,
    pub navigation_history: Vec<usize>,
    pub visited_steps: Vec<usize>,
}
