use crate::storage::{RecordKey, Storage, StorageError};
use dashmap::DashMap;
use std::sync::Arc;

/// Process-local backend. Nothing survives a restart.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    records: Arc<DashMap<RecordKey, String>>
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            records: Arc::new(DashMap::new())
        }
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: RecordKey) -> Result<Option<String>, StorageError> {
        Ok(self.records.get(&key).map(|record| record.value().clone()))
    }

    fn commit(&self, batch: &[(RecordKey, String)]) -> Result<(), StorageError> {
        //NOTE: Callers serialize commits behind the store's write lock, so inserting one key at a
        //      time cannot be observed half-done through the store.
        for (key, value) in batch {
            self.records.insert(*key, value.clone());
        }

        Ok(())
    }
}
