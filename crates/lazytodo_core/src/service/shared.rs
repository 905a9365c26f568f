//! Thread-safe handle around a [`TodoManager`].
//!
//! # Responsibility
//! - Let several owners (threads, UI callbacks) share one manager.
//! - Serialize whole operations, including their persist step.
//!
//! # Invariants
//! - At most one operation runs at a time; a later operation's save can never
//!   be overwritten by an earlier one.
//! - Listeners run while the lock is held and must not call back into the
//!   handle.

use crate::model::todo::{Todo, TodoId};
use crate::repo::todo_store::TodoStore;
use crate::service::todo_manager::{ManagerResult, Outcome, SubscriptionId, TodoManager};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Clonable, shareable access to one [`TodoManager`].
pub struct TodoHandle<S: TodoStore> {
    inner: Arc<Mutex<TodoManager<S>>>,
}

impl<S: TodoStore> Clone for TodoHandle<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: TodoStore> TodoHandle<S> {
    pub fn new(manager: TodoManager<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(manager)),
        }
    }

    /// Runs `f` with exclusive access to the manager.
    pub fn with<R>(&self, f: impl FnOnce(&mut TodoManager<S>) -> R) -> R {
        let mut manager = self.lock();
        f(&mut *manager)
    }

    /// Snapshot of the current collection.
    pub fn list(&self) -> Vec<Todo> {
        self.lock().list().to_vec()
    }

    pub fn get(&self, id: TodoId) -> Option<Todo> {
        self.lock().get(id).cloned()
    }

    pub fn add(&self, title: &str) -> ManagerResult<Todo> {
        self.lock().add(title)
    }

    pub fn toggle(&self, id: TodoId) -> ManagerResult<Outcome> {
        self.lock().toggle(id)
    }

    pub fn edit(&self, id: TodoId, title: &str) -> ManagerResult<Outcome> {
        self.lock().edit(id, title)
    }

    pub fn delete(&self, id: TodoId) -> ManagerResult<Outcome> {
        self.lock().delete(id)
    }

    pub fn delete_many(&self, ids: &[TodoId]) -> ManagerResult<Outcome> {
        self.lock().delete_many(ids)
    }

    pub fn reorder(&self, id_order: &[TodoId]) -> ManagerResult<Outcome> {
        self.lock().reorder(id_order)
    }

    pub fn move_todo(&self, from: usize, to: usize) -> ManagerResult<Outcome> {
        self.lock().move_todo(from, to)
    }

    pub fn flush(&self) -> ManagerResult<()> {
        self.lock().flush()
    }

    pub fn is_dirty(&self) -> bool {
        self.lock().is_dirty()
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: FnMut(&[Todo]) + Send + 'static,
    {
        self.lock().subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.lock().unsubscribe(id)
    }

    // Poisoning only comes from a panicking listener; the collection is intact.
    fn lock(&self) -> MutexGuard<'_, TodoManager<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
