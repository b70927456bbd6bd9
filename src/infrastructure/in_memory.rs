use crate::domain::ports::StateStore;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory global state, keyed by address.
///
/// Uses `Arc<RwLock<HashMap<String, Vec<u8>>>>` so clones share the same state.
/// Ideal for testing or short-lived local ledgers where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryStateStore {
    entries: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl InMemoryStateStore {
    /// Creates a new, empty in-memory state store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn get(&self, address: &str) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.read().await;
        Ok(entries.get(address).cloned())
    }

    async fn put(&self, updates: Vec<(String, Vec<u8>)>) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.extend(updates);
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<(String, Vec<u8>)>> {
        let entries = self.entries.read().await;
        let mut all: Vec<_> = entries
            .iter()
            .map(|(address, value)| (address.clone(), value.clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(all)
    }
}
