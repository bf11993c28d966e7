use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{
    Collection, RecordStore, StoreError, StoreResult, StoredRecord, WriteBatch, WriteOp,
};

/// In-process store. Entries are kept newest first.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<Collection, Vec<StoredRecord>>>,
    reject_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `apply` fail without touching any collection.
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    pub async fn len(&self, collection: Collection) -> usize {
        let guard = self.collections.lock().await;
        guard.get(&collection).map(Vec::len).unwrap_or(0)
    }
}

fn apply_op(collections: &mut HashMap<Collection, Vec<StoredRecord>>, op: WriteOp) {
    match op {
        WriteOp::Prepend {
            collection,
            id,
            payload,
        } => {
            collections
                .entry(collection)
                .or_default()
                .insert(0, StoredRecord { id, payload });
        }
        WriteOp::Put {
            collection,
            id,
            payload,
        } => {
            let entries = collections.entry(collection).or_default();
            entries.retain(|entry| entry.id != id);
            entries.insert(0, StoredRecord { id, payload });
        }
        WriteOp::Delete { collection, id } | WriteOp::Take { collection, id } => {
            if let Some(entries) = collections.get_mut(&collection) {
                entries.retain(|entry| entry.id != id);
            }
        }
        WriteOp::RetainLatest { collection, keep } => {
            if let Some(entries) = collections.get_mut(&collection) {
                entries.truncate(keep);
            }
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn list(&self, collection: Collection) -> StoreResult<Vec<StoredRecord>> {
        let guard = self.collections.lock().await;
        Ok(guard.get(&collection).cloned().unwrap_or_default())
    }

    async fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<StoredRecord>> {
        let guard = self.collections.lock().await;
        Ok(guard
            .get(&collection)
            .and_then(|entries| entries.iter().find(|entry| entry.id == id))
            .cloned())
    }

    async fn apply(&self, batch: WriteBatch) -> StoreResult<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes rejected".to_string()));
        }
        let mut guard = self.collections.lock().await;
        for op in batch.ops() {
            if let WriteOp::Take { collection, id } = op {
                let present = guard
                    .get(collection)
                    .is_some_and(|entries| entries.iter().any(|entry| &entry.id == id));
                if !present {
                    return Err(StoreError::Missing {
                        collection: *collection,
                        id: id.clone(),
                    });
                }
            }
        }
        for op in batch.into_ops() {
            apply_op(&mut guard, op);
        }
        Ok(())
    }
}
