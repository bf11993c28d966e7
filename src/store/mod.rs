//! Record persistence.
//!
//! Every collection the application keeps is an ordered list of JSON payloads
//! keyed by a record id. Lists are returned newest first. Writes go through a
//! [`WriteBatch`] that backends apply atomically, so derived projections of a
//! single command either all land or none do.

use std::fmt;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgRecordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Documents,
    Approvals,
    Channels,
    ApprovalDecisions,
    UserPreferences,
    EmergencyRecipientSettings,
    NotificationLogs,
    EmergencySubmissions,
    NotificationIntervals,
    MeetingRequests,
    RoutingModes,
}

impl Collection {
    pub const fn key(self) -> &'static str {
        match self {
            Collection::Documents => "submitted-documents",
            Collection::Approvals => "pending-approvals",
            Collection::Channels => "document-channels",
            Collection::ApprovalDecisions => "approval-decisions",
            Collection::UserPreferences => "user-preferences",
            Collection::EmergencyRecipientSettings => "emergency-recipient-settings",
            Collection::NotificationLogs => "emergency-notification-logs",
            Collection::EmergencySubmissions => "emergency-submissions",
            Collection::NotificationIntervals => "notification-intervals",
            Collection::MeetingRequests => "livemeet-requests",
            Collection::RoutingModes => "routing-modes",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("connection pool error: {0}")]
    Pool(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("storage task failed: {0}")]
    Task(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("no {collection} record with id {id}")]
    Missing { collection: Collection, id: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: String,
    pub payload: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Insert as the newest entry. Existing entries with the same id are kept.
    Prepend {
        collection: Collection,
        id: String,
        payload: Value,
    },
    /// Replace every entry with the same id by a single newest entry.
    Put {
        collection: Collection,
        id: String,
        payload: Value,
    },
    /// Remove every entry whose id equals `id`.
    Delete { collection: Collection, id: String },
    /// Like `Delete`, but the whole batch fails with [`StoreError::Missing`]
    /// when no entry had that id before the batch.
    Take { collection: Collection, id: String },
    /// Drop the oldest entries until at most `keep` remain.
    RetainLatest { collection: Collection, keep: usize },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prepend<T: Serialize>(
        &mut self,
        collection: Collection,
        id: impl Into<String>,
        record: &T,
    ) -> StoreResult<&mut Self> {
        self.ops.push(WriteOp::Prepend {
            collection,
            id: id.into(),
            payload: serde_json::to_value(record)?,
        });
        Ok(self)
    }

    pub fn put<T: Serialize>(
        &mut self,
        collection: Collection,
        id: impl Into<String>,
        record: &T,
    ) -> StoreResult<&mut Self> {
        self.ops.push(WriteOp::Put {
            collection,
            id: id.into(),
            payload: serde_json::to_value(record)?,
        });
        Ok(self)
    }

    pub fn delete(&mut self, collection: Collection, id: impl Into<String>) -> &mut Self {
        self.ops.push(WriteOp::Delete {
            collection,
            id: id.into(),
        });
        self
    }

    pub fn take(&mut self, collection: Collection, id: impl Into<String>) -> &mut Self {
        self.ops.push(WriteOp::Take {
            collection,
            id: id.into(),
        });
        self
    }

    pub fn retain_latest(&mut self, collection: Collection, keep: usize) -> &mut Self {
        self.ops.push(WriteOp::RetainLatest { collection, keep });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    fn backend_tag(&self) -> &'static str;

    async fn list(&self, collection: Collection) -> StoreResult<Vec<StoredRecord>>;

    /// Newest entry with the given id.
    async fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<StoredRecord>>;

    async fn apply(&self, batch: WriteBatch) -> StoreResult<()>;

    async fn put(&self, collection: Collection, id: &str, payload: Value) -> StoreResult<()> {
        self.apply(WriteBatch {
            ops: vec![WriteOp::Put {
                collection,
                id: id.to_string(),
                payload,
            }],
        })
        .await
    }

    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.delete(collection, id);
        self.apply(batch).await
    }
}

pub async fn list_as<T: DeserializeOwned>(
    store: &dyn RecordStore,
    collection: Collection,
) -> StoreResult<Vec<T>> {
    store
        .list(collection)
        .await?
        .into_iter()
        .map(|record| serde_json::from_value(record.payload).map_err(StoreError::from))
        .collect()
}

pub async fn get_as<T: DeserializeOwned>(
    store: &dyn RecordStore,
    collection: Collection,
    id: &str,
) -> StoreResult<Option<T>> {
    match store.get(collection, id).await? {
        Some(record) => Ok(Some(serde_json::from_value(record.payload)?)),
        None => Ok(None),
    }
}
