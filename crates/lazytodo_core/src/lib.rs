//! Core todo state management and persistence for LazyTodo.
//! This crate is the single source of truth for todo invariants.

pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::todo::{normalize_title, Todo, TodoId};
pub use repo::memory_store::MemoryTodoStore;
pub use repo::todo_store::{
    RepoError, RepoResult, SqliteTodoStore, StoreConfig, TodoStore, DEFAULT_STORAGE_KEY,
};
pub use service::shared::TodoHandle;
pub use service::todo_manager::{
    ManagerError, ManagerResult, Outcome, ReorderError, SubscriptionId, TodoManager,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
