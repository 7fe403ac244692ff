//! In-memory storage backend.
//!
//! Used for tests and ephemeral projects. All data is lost when dropped.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{RecordMeta, Storage, StorageResult, StoredRecord};

/// In-memory key/value store.
///
/// Thread-safe via internal `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tables: RwLock<HashMap<String, HashMap<String, StoredRecord>>>,
}

impl MemoryStorage {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in a table.
    pub async fn len(&self, table: &str) -> usize {
        self.tables
            .read()
            .await
            .get(table)
            .map(HashMap::len)
            .unwrap_or(0)
    }

    /// Sorted record ids of a table.
    pub async fn ids(&self, table: &str) -> Vec<String> {
        let tables = self.tables.read().await;
        let mut ids: Vec<String> = tables
            .get(table)
            .map(|records| records.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, table: &str, id: &str) -> StorageResult<Option<StoredRecord>> {
        let tables = self.tables.read().await;
        Ok(tables.get(table).and_then(|records| records.get(id)).cloned())
    }

    async fn save(
        &self,
        table: &str,
        id: &str,
        blob: Vec<u8>,
        meta: RecordMeta,
    ) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .entry(table.to_string())
            .or_default()
            .insert(id.to_string(), StoredRecord { blob, meta });
        Ok(())
    }

    async fn delete(&self, table: &str, id: &str) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(records) = tables.get_mut(table) {
            records.remove(id);
        }
        Ok(())
    }

    async fn delete_many(&self, table: &str, parent_id: &str) -> StorageResult<usize> {
        let mut tables = self.tables.write().await;
        let Some(records) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = records.len();
        records.retain(|_, record| record.meta.parent_id.as_deref() != Some(parent_id));
        Ok(before - records.len())
    }
}
