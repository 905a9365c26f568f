use chrono::DateTime;
use lazytodo_core::{
    MemoryTodoStore, RepoError, SqliteTodoStore, StoreConfig, Todo, TodoStore,
    DEFAULT_STORAGE_KEY,
};
use rusqlite::params;

fn todo(id: i64, title: &str, completed: bool) -> Todo {
    let mut todo = Todo::new(id, title, DateTime::from_timestamp_millis(id).unwrap());
    todo.completed = completed;
    todo
}

fn sample() -> Vec<Todo> {
    vec![
        todo(1_700_000_000_001, "Buy milk", false),
        todo(1_700_000_000_002, "Call mom", true),
        todo(1_700_000_000_003, "Ship release", false),
    ]
}

fn write_raw(store: &SqliteTodoStore, raw: &str) {
    store
        .connection()
        .execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, 0)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
            params![store.config().key.as_str(), raw],
        )
        .unwrap();
}

#[test]
fn missing_key_loads_empty_collection() {
    let store = SqliteTodoStore::open_in_memory(StoreConfig::default()).unwrap();
    assert!(store.load().is_empty());
    assert_eq!(store.raw_blob().unwrap(), None);
}

#[test]
fn save_then_load_preserves_order_and_fields() {
    let mut store = SqliteTodoStore::open_in_memory(StoreConfig::default()).unwrap();
    store.save(&sample()).unwrap();

    assert_eq!(store.load(), sample());
}

#[test]
fn save_replaces_previous_collection_entirely() {
    let mut store = SqliteTodoStore::open_in_memory(StoreConfig::default()).unwrap();
    store.save(&sample()).unwrap();
    store.save(&sample()[2..]).unwrap();

    let loaded = store.load();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].title, "Ship release");

    let rows: i64 = store
        .connection()
        .query_row("SELECT COUNT(*) FROM kv_store;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn blob_uses_camel_case_json_array_under_default_key() {
    let mut store = SqliteTodoStore::open_in_memory(StoreConfig::default()).unwrap();
    store.save(&sample()[..1]).unwrap();

    let raw = store.raw_blob().unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let record = &value.as_array().unwrap()[0];
    assert_eq!(record["id"], 1_700_000_000_001_i64);
    assert_eq!(record["title"], "Buy milk");
    assert_eq!(record["completed"], false);
    assert!(record["createdAt"].as_str().unwrap().ends_with('Z'));
    assert_eq!(record["createdAt"], record["updatedAt"]);
    assert_eq!(store.config().key, DEFAULT_STORAGE_KEY);
}

#[test]
fn corrupt_blob_loads_as_empty_collection() {
    let store = SqliteTodoStore::open_in_memory(StoreConfig::default()).unwrap();
    write_raw(&store, "{not json");
    assert!(store.load().is_empty());

    write_raw(&store, r#"[{"id":"nope"}]"#);
    assert!(store.load().is_empty());
}

#[test]
fn stores_with_different_keys_do_not_share_slots() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("todos.db");

    let mut work = SqliteTodoStore::open(
        &path,
        StoreConfig {
            key: "work".to_string(),
            ..StoreConfig::default()
        },
    )
    .unwrap();
    work.save(&sample()).unwrap();

    let home = SqliteTodoStore::open(&path, StoreConfig::default()).unwrap();
    assert!(home.load().is_empty());
    assert_eq!(work.load().len(), 3);
}

#[test]
fn file_backed_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("todos.db");

    let mut first = SqliteTodoStore::open(&path, StoreConfig::default()).unwrap();
    first.save(&sample()).unwrap();
    drop(first);

    let second = SqliteTodoStore::open(&path, StoreConfig::default()).unwrap();
    assert_eq!(second.load(), sample());
}

#[test]
fn quota_rejection_is_reported_and_keeps_old_blob() {
    let mut store = SqliteTodoStore::open_in_memory(StoreConfig {
        quota_bytes: Some(200),
        ..StoreConfig::default()
    })
    .unwrap();
    store.save(&sample()[..1]).unwrap();
    let before = store.raw_blob().unwrap();

    let err = store.save(&sample()).unwrap_err();
    assert!(matches!(err, RepoError::QuotaExceeded { limit: 200, .. }));
    assert_eq!(store.raw_blob().unwrap(), before);
}

#[test]
fn save_of_fresh_load_is_idempotent() {
    let mut sqlite = SqliteTodoStore::open_in_memory(StoreConfig::default()).unwrap();
    sqlite.save(&sample()).unwrap();
    let first_blob = sqlite.raw_blob().unwrap();

    let loaded = sqlite.load();
    sqlite.save(&loaded).unwrap();
    assert_eq!(sqlite.raw_blob().unwrap(), first_blob);
    assert_eq!(sqlite.load(), loaded);

    let mut memory = MemoryTodoStore::default();
    memory.save(&loaded).unwrap();
    let reloaded = memory.load();
    memory.save(&reloaded).unwrap();
    assert_eq!(memory.load(), loaded);
}

#[test]
fn write_failure_surfaces_as_db_error() {
    let mut store = SqliteTodoStore::open_in_memory(StoreConfig::default()).unwrap();
    store
        .connection()
        .execute_batch("DROP TABLE kv_store;")
        .unwrap();

    let err = store.save(&sample()).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
    assert!(store.load().is_empty());
}
