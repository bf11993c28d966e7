use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use tokio::task;

use super::{
    Collection, RecordStore, StoreError, StoreResult, StoredRecord, WriteBatch, WriteOp,
};
use crate::db::PgPool;
use crate::models::{NewRecord, Record};
use crate::schema::records;

/// Postgres-backed store. Each batch runs in one transaction.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn with_conn<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|err| StoreError::Pool(err.to_string()))?;
            f(&mut conn)
        })
        .await
        .map_err(|err| StoreError::Task(err.to_string()))?
    }
}

fn to_stored(record: Record) -> StoredRecord {
    StoredRecord {
        id: record.record_id,
        payload: record.payload,
    }
}

fn apply_op(conn: &mut PgConnection, op: &WriteOp) -> StoreResult<()> {
    match op {
        WriteOp::Prepend {
            collection,
            id,
            payload,
        } => {
            diesel::insert_into(records::table)
                .values(&NewRecord {
                    collection: collection.key(),
                    record_id: id.as_str(),
                    payload: payload.clone(),
                })
                .execute(conn)?;
        }
        WriteOp::Put {
            collection,
            id,
            payload,
        } => {
            diesel::delete(
                records::table
                    .filter(records::collection.eq(collection.key()))
                    .filter(records::record_id.eq(id.as_str())),
            )
            .execute(conn)?;
            diesel::insert_into(records::table)
                .values(&NewRecord {
                    collection: collection.key(),
                    record_id: id.as_str(),
                    payload: payload.clone(),
                })
                .execute(conn)?;
        }
        WriteOp::Delete { collection, id } => {
            diesel::delete(
                records::table
                    .filter(records::collection.eq(collection.key()))
                    .filter(records::record_id.eq(id.as_str())),
            )
            .execute(conn)?;
        }
        WriteOp::Take { collection, id } => {
            let removed = diesel::delete(
                records::table
                    .filter(records::collection.eq(collection.key()))
                    .filter(records::record_id.eq(id.as_str())),
            )
            .execute(conn)?;
            if removed == 0 {
                return Err(StoreError::Missing {
                    collection: *collection,
                    id: id.clone(),
                });
            }
        }
        WriteOp::RetainLatest { collection, keep } => {
            let boundary: Option<i64> = records::table
                .filter(records::collection.eq(collection.key()))
                .order(records::seq.desc())
                .select(records::seq)
                .offset(*keep as i64)
                .first(conn)
                .optional()?;
            if let Some(boundary) = boundary {
                diesel::delete(
                    records::table
                        .filter(records::collection.eq(collection.key()))
                        .filter(records::seq.le(boundary)),
                )
                .execute(conn)?;
            }
        }
    }
    Ok(())
}

#[async_trait]
impl RecordStore for PgRecordStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn list(&self, collection: Collection) -> StoreResult<Vec<StoredRecord>> {
        self.with_conn(move |conn| {
            let rows: Vec<Record> = records::table
                .filter(records::collection.eq(collection.key()))
                .order(records::seq.desc())
                .load(conn)?;
            Ok(rows.into_iter().map(to_stored).collect())
        })
        .await
    }

    async fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<StoredRecord>> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let row: Option<Record> = records::table
                .filter(records::collection.eq(collection.key()))
                .filter(records::record_id.eq(id.as_str()))
                .order(records::seq.desc())
                .first(conn)
                .optional()?;
            Ok(row.map(to_stored))
        })
        .await
    }

    async fn apply(&self, batch: WriteBatch) -> StoreResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        self.with_conn(move |conn| {
            conn.transaction(|conn| {
                for op in batch.ops() {
                    apply_op(conn, op)?;
                }
                Ok::<(), StoreError>(())
            })
        })
        .await
    }
}
