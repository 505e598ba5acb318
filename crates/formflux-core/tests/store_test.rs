use chrono::Duration;
use formflux_core::store::{MemoryStore, SnapshotStore, SqliteSessionStore};

#[tokio::test]
async fn test_memory_store_roundtrip() {
    let store = MemoryStore::new();
    assert_eq!(store.get("session-a").await.unwrap(), None);

    store.put("session-a", "{\"currentStep\":0}").await.unwrap();
    assert_eq!(
        store.get("session-a").await.unwrap().as_deref(),
        Some("{\"currentStep\":0}")
    );
    assert_eq!(store.len(), 1);

    store.put("session-a", "{\"currentStep\":2}").await.unwrap();
    assert_eq!(
        store.get("session-a").await.unwrap().as_deref(),
        Some("{\"currentStep\":2}")
    );
    assert_eq!(store.len(), 1, "overwrite must not grow the store");

    store.remove("session-a").await.unwrap();
    assert_eq!(store.get("session-a").await.unwrap(), None);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_memory_store_remove_missing_key_is_ok() {
    let store = MemoryStore::new();
    store.remove("never-written").await.unwrap();
}

#[tokio::test]
async fn test_sqlite_store_roundtrip() {
    let store = SqliteSessionStore::new("sqlite::memory:").await.unwrap();
    assert_eq!(store.get("session-a").await.unwrap(), None);

    store.put("session-a", "{\"currentStep\":1}").await.unwrap();
    store.put("session-b", "{\"currentStep\":3}").await.unwrap();
    assert_eq!(
        store.get("session-a").await.unwrap().as_deref(),
        Some("{\"currentStep\":1}")
    );

    store.put("session-a", "{\"currentStep\":4}").await.unwrap();
    assert_eq!(
        store.get("session-a").await.unwrap().as_deref(),
        Some("{\"currentStep\":4}")
    );

    store.remove("session-a").await.unwrap();
    assert_eq!(store.get("session-a").await.unwrap(), None);
    // Other sessions are untouched.
    assert!(store.get("session-b").await.unwrap().is_some());
}

#[tokio::test]
async fn test_sqlite_purge_keeps_recent_sessions() {
    let store = SqliteSessionStore::new("sqlite::memory:").await.unwrap();
    store.put("fresh", "{}").await.unwrap();

    let purged = store.purge_older_than(Duration::days(1)).await.unwrap();
    assert_eq!(purged, 0);
    assert!(store.get("fresh").await.unwrap().is_some());
}

#[tokio::test]
async fn test_sqlite_purge_removes_stale_sessions() {
    let store = SqliteSessionStore::new("sqlite::memory:").await.unwrap();
    store.put("stale", "{}").await.unwrap();

    // A negative age puts the cutoff in the future, so every row is stale.
    let purged = store.purge_older_than(Duration::seconds(-5)).await.unwrap();
    assert_eq!(purged, 1);
    assert_eq!(store.get("stale").await.unwrap(), None);
}
