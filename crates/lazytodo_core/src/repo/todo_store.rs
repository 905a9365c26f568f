//! Todo store contract and SQLite key-value implementation.
//!
//! # Responsibility
//! - Serialize the whole collection as one JSON array under one key.
//! - Report write rejections (SQLite errors, quota) to the caller.
//!
//! # Invariants
//! - Writes are a single upsert statement, so readers see either the old or
//!   the new blob, never a mix.
//! - Loaded collections never contain duplicate ids.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::todo::{Todo, TodoId};
use log::{debug, error, warn};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Storage key used when no other key is configured.
pub const DEFAULT_STORAGE_KEY: &str = "todos";

pub type RepoResult<T> = Result<T, RepoError>;

/// Write-side failure of a todo store.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Serialize(serde_json::Error),
    /// Serialized blob is larger than the configured quota.
    QuotaExceeded { required: usize, limit: usize },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialize(err) => write!(f, "failed to serialize todos: {err}"),
            Self::QuotaExceeded { required, limit } => write!(
                f,
                "storage quota exceeded: blob needs {required} bytes, limit is {limit}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialize(err) => Some(err),
            Self::QuotaExceeded { .. } => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// Slot configuration shared by all store implementations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Key of the single slot holding the collection.
    pub key: String,
    /// Maximum serialized blob size in bytes; `None` means unlimited.
    pub quota_bytes: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_STORAGE_KEY.to_string(),
            quota_bytes: None,
        }
    }
}

/// Durable mirror of the todo collection.
pub trait TodoStore {
    /// Reads the stored collection, or an empty one when absent or unreadable.
    fn load(&self) -> Vec<Todo>;

    /// Replaces the stored collection with `todos`.
    fn save(&mut self, todos: &[Todo]) -> RepoResult<()>;
}

impl<S: TodoStore + ?Sized> TodoStore for Box<S> {
    fn load(&self) -> Vec<Todo> {
        (**self).load()
    }

    fn save(&mut self, todos: &[Todo]) -> RepoResult<()> {
        (**self).save(todos)
    }
}

/// SQLite-backed todo store using the `kv_store` table.
pub struct SqliteTodoStore {
    conn: Connection,
    config: StoreConfig,
}

impl SqliteTodoStore {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection, config: StoreConfig) -> Self {
        Self { conn, config }
    }

    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>, config: StoreConfig) -> RepoResult<Self> {
        Ok(Self::new(open_db(path)?, config))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory(config: StoreConfig) -> RepoResult<Self> {
        Ok(Self::new(open_db_in_memory()?, config))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Underlying connection, for diagnostics and tests.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Returns the raw stored blob, if any.
    pub fn raw_blob(&self) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                params![self.config.key.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }
}

impl TodoStore for SqliteTodoStore {
    fn load(&self) -> Vec<Todo> {
        match self.raw_blob() {
            Ok(Some(raw)) => decode_collection(&raw),
            Ok(None) => {
                debug!("event=store_load module=repo status=ok backend=sqlite blob=absent");
                Vec::new()
            }
            Err(err) => {
                error!(
                    "event=store_load module=repo status=error backend=sqlite error_code=read_failed error={err}"
                );
                Vec::new()
            }
        }
    }

    fn save(&mut self, todos: &[Todo]) -> RepoResult<()> {
        let blob = encode_collection(todos, &self.config)?;
        let result = self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![self.config.key.as_str(), blob.as_str()],
        );

        match result {
            Ok(_) => {
                debug!(
                    "event=store_save module=repo status=ok backend=sqlite count={} bytes={}",
                    todos.len(),
                    blob.len()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=store_save module=repo status=error backend=sqlite error_code=write_failed error={err}"
                );
                Err(err.into())
            }
        }
    }
}

/// Serializes a collection, enforcing the configured quota.
pub(crate) fn encode_collection(todos: &[Todo], config: &StoreConfig) -> RepoResult<String> {
    let blob = serde_json::to_string(todos)?;
    if let Some(limit) = config.quota_bytes {
        if blob.len() > limit {
            warn!(
                "event=store_save module=repo status=rejected error_code=quota_exceeded bytes={} limit={limit}",
                blob.len()
            );
            return Err(RepoError::QuotaExceeded {
                required: blob.len(),
                limit,
            });
        }
    }
    Ok(blob)
}

/// Parses a stored blob, treating corrupt data as an empty collection.
///
/// Later records that repeat an earlier id are dropped.
pub(crate) fn decode_collection(raw: &str) -> Vec<Todo> {
    let parsed: Vec<Todo> = match serde_json::from_str(raw) {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!(
                "event=store_load module=repo status=corrupt bytes={} error={err}",
                raw.len()
            );
            return Vec::new();
        }
    };

    let total = parsed.len();
    let mut seen: HashSet<TodoId> = HashSet::with_capacity(total);
    let todos: Vec<Todo> = parsed
        .into_iter()
        .filter(|todo| seen.insert(todo.id))
        .collect();

    if todos.len() != total {
        warn!(
            "event=store_load module=repo status=repaired dropped_duplicates={}",
            total - todos.len()
        );
    }
    debug!("event=store_load module=repo status=ok count={}", todos.len());
    todos
}

#[cfg(test)]
mod tests {
    use super::{decode_collection, encode_collection, RepoError, StoreConfig};
    use crate::model::todo::Todo;
    use chrono::DateTime;

    fn todo(id: i64, title: &str) -> Todo {
        Todo::new(id, title, DateTime::from_timestamp_millis(id).unwrap())
    }

    #[test]
    fn decode_treats_garbage_as_empty() {
        assert!(decode_collection("not json").is_empty());
        assert!(decode_collection(r#"{"id":1}"#).is_empty());
        assert!(decode_collection("").is_empty());
    }

    #[test]
    fn decode_keeps_first_of_duplicate_ids() {
        let blob = serde_json::to_string(&vec![todo(1, "a"), todo(2, "b"), todo(1, "c")]).unwrap();
        let todos = decode_collection(&blob);
        let titles: Vec<&str> = todos.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b"]);
    }

    #[test]
    fn encode_rejects_blob_over_quota() {
        let config = StoreConfig {
            quota_bytes: Some(16),
            ..StoreConfig::default()
        };
        let err = encode_collection(&[todo(1, "too long for quota")], &config).unwrap_err();
        assert!(matches!(err, RepoError::QuotaExceeded { limit: 16, .. }));

        assert_eq!(encode_collection(&[], &config).unwrap(), "[]");
    }
}
