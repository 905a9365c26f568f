//! In-process todo store.
//!
//! Holds the serialized blob in memory so it goes through the same
//! encode/decode path (and quota check) as the SQLite store.

use crate::model::todo::Todo;
use crate::repo::todo_store::{
    decode_collection, encode_collection, RepoResult, StoreConfig, TodoStore,
};
use log::debug;

/// Non-durable single-slot store.
#[derive(Debug, Clone, Default)]
pub struct MemoryTodoStore {
    blob: Option<String>,
    config: StoreConfig,
    save_count: usize,
}

impl MemoryTodoStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            blob: None,
            config,
            save_count: 0,
        }
    }

    /// Creates a store whose slot already holds `raw`, valid or not.
    pub fn with_raw_blob(raw: impl Into<String>) -> Self {
        Self {
            blob: Some(raw.into()),
            ..Self::default()
        }
    }

    pub fn raw_blob(&self) -> Option<&str> {
        self.blob.as_deref()
    }

    /// Number of successful saves since construction.
    pub fn save_count(&self) -> usize {
        self.save_count
    }

    /// Changes the quota for subsequent saves.
    pub fn set_quota(&mut self, quota_bytes: Option<usize>) {
        self.config.quota_bytes = quota_bytes;
    }
}

impl TodoStore for MemoryTodoStore {
    fn load(&self) -> Vec<Todo> {
        match self.blob.as_deref() {
            Some(raw) => decode_collection(raw),
            None => Vec::new(),
        }
    }

    fn save(&mut self, todos: &[Todo]) -> RepoResult<()> {
        let blob = encode_collection(todos, &self.config)?;
        debug!(
            "event=store_save module=repo status=ok backend=memory count={} bytes={}",
            todos.len(),
            blob.len()
        );
        self.blob = Some(blob);
        self.save_count += 1;
        Ok(())
    }
}
