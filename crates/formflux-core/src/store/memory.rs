use super::SnapshotStore;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// In-memory snapshot store for tests and embedded hosts.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    storage: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.storage.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.storage.read().unwrap().get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.storage
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.storage.write().unwrap().remove(key);
        Ok(())
    }
}
