use std::env;

use anyhow::{anyhow, Context, Result};
use diesel::connection::SimpleConnection;
use iaoms::db;
use iaoms::store::{Collection, PgRecordStore, RecordStore, StoreError, WriteBatch};
use once_cell::sync::Lazy;
use serde_json::json;
use tokio::sync::Mutex;

static DB_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Store over a freshly migrated and emptied database, or `None` when
/// `TEST_DATABASE_URL` is not set.
async fn fresh_store() -> Result<Option<PgRecordStore>> {
    let Ok(database_url) = env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set; skipping postgres store test");
        return Ok(None);
    };

    let pool = db::init_pool_with_size(&database_url, db::DEFAULT_MAX_POOL_SIZE)?;
    let setup_pool = pool.clone();
    tokio::task::spawn_blocking(move || -> Result<()> {
        db::run_migrations(&setup_pool)?;
        let mut conn = setup_pool
            .get()
            .map_err(|err| anyhow!("failed to acquire connection: {err}"))?;
        conn.batch_execute("TRUNCATE TABLE records RESTART IDENTITY;")
            .context("failed to truncate records")?;
        Ok(())
    })
    .await
    .context("setup task panicked")??;

    Ok(Some(PgRecordStore::new(pool)))
}

fn ids(records: Vec<iaoms::store::StoredRecord>) -> Vec<String> {
    records.into_iter().map(|record| record.id).collect()
}

#[tokio::test]
async fn postgres_store_matches_memory_semantics() -> Result<()> {
    let _lock = DB_LOCK.lock().await;
    let Some(store) = fresh_store().await? else {
        return Ok(());
    };

    for n in 0..3 {
        let mut batch = WriteBatch::new();
        batch
            .prepend(Collection::Documents, format!("DOC-{n}"), &json!({ "n": n }))?
            .prepend(Collection::Approvals, format!("DOC-{n}"), &json!({ "n": n }))?;
        store.apply(batch).await?;
    }
    assert_eq!(
        ids(store.list(Collection::Documents).await?),
        vec!["DOC-2", "DOC-1", "DOC-0"]
    );

    store.delete(Collection::Approvals, "DOC-1").await?;
    assert_eq!(
        ids(store.list(Collection::Approvals).await?),
        vec!["DOC-2", "DOC-0"]
    );

    store
        .put(Collection::UserPreferences, "hod-cse", json!({ "v": 1 }))
        .await?;
    store
        .put(Collection::UserPreferences, "hod-cse", json!({ "v": 2 }))
        .await?;
    let stored = store.get(Collection::UserPreferences, "hod-cse").await?;
    assert_eq!(stored.map(|record| record.payload), Some(json!({ "v": 2 })));
    assert_eq!(store.list(Collection::UserPreferences).await?.len(), 1);

    let mut batch = WriteBatch::new();
    for n in 0..5 {
        batch.prepend(Collection::NotificationLogs, format!("log-{n}"), &json!(n))?;
    }
    batch.retain_latest(Collection::NotificationLogs, 3);
    store.apply(batch).await?;
    assert_eq!(
        ids(store.list(Collection::NotificationLogs).await?),
        vec!["log-4", "log-3", "log-2"]
    );

    Ok(())
}

#[tokio::test]
async fn postgres_batch_is_atomic() -> Result<()> {
    let _lock = DB_LOCK.lock().await;
    let Some(store) = fresh_store().await? else {
        return Ok(());
    };

    // A record id longer than the column allows makes the second insert fail.
    let mut batch = WriteBatch::new();
    batch
        .prepend(Collection::Documents, "DOC-1", &json!({}))?
        .prepend(Collection::Approvals, "x".repeat(300), &json!({}))?;
    assert!(store.apply(batch).await.is_err());

    assert!(store.list(Collection::Documents).await?.is_empty());
    assert!(store.list(Collection::Approvals).await?.is_empty());

    let mut batch = WriteBatch::new();
    batch
        .put(Collection::ApprovalDecisions, "DOC-2", &json!({}))?
        .take(Collection::Approvals, "DOC-2");
    assert!(matches!(
        store.apply(batch).await,
        Err(StoreError::Missing { .. })
    ));
    assert!(store.list(Collection::ApprovalDecisions).await?.is_empty());
    Ok(())
}
