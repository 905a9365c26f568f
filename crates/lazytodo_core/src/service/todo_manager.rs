//! Todo manager: the single owner of the in-memory collection.
//!
//! # Responsibility
//! - Validate and apply add/toggle/edit/delete/reorder operations.
//! - Persist the full collection through a [`TodoStore`] after every change.
//! - Notify subscribers with the new collection after every change.
//!
//! # Invariants
//! - Ids are unique and strictly increasing in creation order.
//! - Rejected input never mutates, persists, or notifies.
//! - Operations that find nothing to change (unknown id, same order) return
//!   [`Outcome::Unchanged`] and never persist or notify.
//! - A failed save keeps the in-memory change and marks the manager dirty
//!   until a later save succeeds.

use crate::clock::{Clock, SystemClock};
use crate::model::todo::{normalize_title, Todo, TodoId};
use crate::repo::todo_store::{RepoError, TodoStore};
use log::{debug, error, info};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SubscriptionId = u64;
pub type ManagerResult<T> = Result<T, ManagerError>;

type Listener = Box<dyn FnMut(&[Todo]) + Send>;

/// Result of a mutating operation that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// State changed, was persisted, and subscribers were notified.
    Applied,
    /// Nothing to change; no save, no notification.
    Unchanged,
}

/// Why a requested id order is not a permutation of the current ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReorderError {
    LengthMismatch { expected: usize, actual: usize },
    DuplicateId(TodoId),
    UnknownId(TodoId),
}

impl Display for ReorderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LengthMismatch { expected, actual } => {
                write!(f, "expected {expected} ids, got {actual}")
            }
            Self::DuplicateId(id) => write!(f, "id {id} appears more than once"),
            Self::UnknownId(id) => write!(f, "unknown todo id {id}"),
        }
    }
}

/// Errors surfaced by manager operations.
#[derive(Debug)]
pub enum ManagerError {
    /// Title is blank after trim.
    InvalidTitle,
    /// Requested order is not a permutation of current ids.
    InvalidReorder(ReorderError),
    /// Move index is outside the collection.
    InvalidMove { from: usize, to: usize, len: usize },
    /// No id above the largest issued one is representable.
    IdSpaceExhausted { last: TodoId },
    /// Change was applied in memory but the store rejected the write.
    Persistence(RepoError),
}

impl Display for ManagerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle => write!(f, "title must not be blank"),
            Self::InvalidReorder(err) => write!(f, "invalid reorder: {err}"),
            Self::InvalidMove { from, to, len } => {
                write!(f, "invalid move from {from} to {to} in list of {len}")
            }
            Self::IdSpaceExhausted { last } => {
                write!(f, "no todo id left after {last}")
            }
            Self::Persistence(err) => write!(f, "change not persisted: {err}"),
        }
    }
}

impl Error for ManagerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Persistence(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ManagerError {
    fn from(value: RepoError) -> Self {
        Self::Persistence(value)
    }
}

impl ManagerError {
    /// Whether the caller's input was rejected before any state change.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidTitle | Self::InvalidReorder(_) | Self::InvalidMove { .. }
        )
    }
}

/// Owner of the todo collection and its synchronization with a store.
pub struct TodoManager<S: TodoStore> {
    store: S,
    clock: Box<dyn Clock>,
    todos: Vec<Todo>,
    last_issued_id: Option<TodoId>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription_id: SubscriptionId,
    dirty: bool,
}

impl<S: TodoStore> TodoManager<S> {
    /// Loads the initial collection from `store` using the system clock.
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }

    /// Loads the initial collection from `store` with an explicit clock.
    pub fn with_clock(store: S, clock: impl Clock + 'static) -> Self {
        let todos = store.load();
        info!(
            "event=manager_init module=service status=ok count={}",
            todos.len()
        );
        Self {
            store,
            clock: Box::new(clock),
            last_issued_id: todos.iter().map(|todo| todo.id).max(),
            todos,
            listeners: Vec::new(),
            next_subscription_id: 1,
            dirty: false,
        }
    }

    /// Current collection in display order.
    pub fn list(&self) -> &[Todo] {
        &self.todos
    }

    pub fn get(&self, id: TodoId) -> Option<&Todo> {
        self.todos.iter().find(|todo| todo.id == id)
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    /// Whether the in-memory collection is ahead of the last successful save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Appends a new open todo.
    ///
    /// # Errors
    /// - `InvalidTitle` when `title` is blank after trim; nothing is created.
    /// - `IdSpaceExhausted` when the largest issued id is `i64::MAX`; nothing
    ///   is created.
    /// - `Persistence` when the save fails; the todo stays in memory.
    pub fn add(&mut self, title: &str) -> ManagerResult<Todo> {
        let title = normalize_title(title).ok_or_else(|| {
            debug!("event=todo_add module=service status=rejected reason=blank_title");
            ManagerError::InvalidTitle
        })?;

        let id = self.next_id()?;
        let todo = Todo::new(id, title, self.clock.now());
        self.todos.push(todo.clone());
        self.last_issued_id = Some(id);

        debug!(
            "event=todo_add module=service status=applied id={id} count={}",
            self.todos.len()
        );
        self.commit("todo_add")?;
        Ok(todo)
    }

    /// Flips completion of one todo. Unknown ids are ignored.
    pub fn toggle(&mut self, id: TodoId) -> ManagerResult<Outcome> {
        let now = self.clock.now();
        let Some(todo) = self.todos.iter_mut().find(|todo| todo.id == id) else {
            return Ok(not_found("todo_toggle", id));
        };
        todo.toggle(now);
        debug!(
            "event=todo_toggle module=service status=applied id={id} completed={}",
            todo.completed
        );
        self.commit("todo_toggle")?;
        Ok(Outcome::Applied)
    }

    /// Replaces the title of one todo. Unknown ids are ignored.
    ///
    /// # Errors
    /// - `InvalidTitle` when `title` is blank after trim, whether or not the
    ///   id exists.
    pub fn edit(&mut self, id: TodoId, title: &str) -> ManagerResult<Outcome> {
        let title = normalize_title(title).ok_or_else(|| {
            debug!("event=todo_edit module=service status=rejected reason=blank_title id={id}");
            ManagerError::InvalidTitle
        })?;

        let now = self.clock.now();
        let Some(todo) = self.todos.iter_mut().find(|todo| todo.id == id) else {
            return Ok(not_found("todo_edit", id));
        };
        todo.rename(title, now);
        debug!("event=todo_edit module=service status=applied id={id}");
        self.commit("todo_edit")?;
        Ok(Outcome::Applied)
    }

    /// Removes one todo, keeping the relative order of the rest.
    pub fn delete(&mut self, id: TodoId) -> ManagerResult<Outcome> {
        let Some(index) = self.todos.iter().position(|todo| todo.id == id) else {
            return Ok(not_found("todo_delete", id));
        };
        self.todos.remove(index);
        debug!(
            "event=todo_delete module=service status=applied id={id} count={}",
            self.todos.len()
        );
        self.commit("todo_delete")?;
        Ok(Outcome::Applied)
    }

    /// Removes every todo whose id is in `ids` with a single save and
    /// notification.
    pub fn delete_many(&mut self, ids: &[TodoId]) -> ManagerResult<Outcome> {
        let targets: HashSet<TodoId> = ids.iter().copied().collect();
        let before = self.todos.len();
        self.todos.retain(|todo| !targets.contains(&todo.id));
        let removed = before - self.todos.len();

        if removed == 0 {
            debug!(
                "event=todo_delete_many module=service status=noop reason=not_found requested={}",
                ids.len()
            );
            return Ok(Outcome::Unchanged);
        }

        debug!(
            "event=todo_delete_many module=service status=applied requested={} removed={removed} count={}",
            ids.len(),
            self.todos.len()
        );
        self.commit("todo_delete_many")?;
        Ok(Outcome::Applied)
    }

    /// Rearranges the collection into exactly `id_order`.
    ///
    /// # Errors
    /// - `InvalidReorder` when `id_order` is not a permutation of the current
    ///   ids; the collection is left untouched.
    pub fn reorder(&mut self, id_order: &[TodoId]) -> ManagerResult<Outcome> {
        let position = self.validate_permutation(id_order).map_err(|err| {
            debug!("event=todo_reorder module=service status=rejected reason={err}");
            ManagerError::InvalidReorder(err)
        })?;

        let unchanged = self
            .todos
            .iter()
            .map(|todo| todo.id)
            .eq(id_order.iter().copied());
        if unchanged {
            debug!("event=todo_reorder module=service status=noop reason=same_order");
            return Ok(Outcome::Unchanged);
        }

        self.todos
            .sort_by_key(|todo| position.get(&todo.id).copied().unwrap_or(usize::MAX));
        debug!(
            "event=todo_reorder module=service status=applied count={}",
            self.todos.len()
        );
        self.commit("todo_reorder")?;
        Ok(Outcome::Applied)
    }

    /// Moves the todo at index `from` so that it ends up at index `to`.
    ///
    /// This is the entry point for drag-and-drop gestures resolved to a
    /// source/target index pair.
    pub fn move_todo(&mut self, from: usize, to: usize) -> ManagerResult<Outcome> {
        let len = self.todos.len();
        if from >= len || to >= len {
            debug!("event=todo_move module=service status=rejected from={from} to={to} len={len}");
            return Err(ManagerError::InvalidMove { from, to, len });
        }
        if from == to {
            return Ok(Outcome::Unchanged);
        }

        let mut order: Vec<TodoId> = self.todos.iter().map(|todo| todo.id).collect();
        let moved = order.remove(from);
        order.insert(to, moved);
        self.reorder(&order)
    }

    /// Retries persisting the current collection.
    ///
    /// Does not notify subscribers; the in-memory state is unchanged.
    pub fn flush(&mut self) -> ManagerResult<()> {
        match self.store.save(&self.todos) {
            Ok(()) => {
                self.dirty = false;
                info!(
                    "event=todo_flush module=service status=ok count={}",
                    self.todos.len()
                );
                Ok(())
            }
            Err(err) => {
                self.dirty = true;
                error!("event=todo_flush module=service status=error error={err}");
                Err(err.into())
            }
        }
    }

    /// Registers a listener called with the full collection after each change.
    ///
    /// Listeners run synchronously inside the mutating call.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&[Todo]) + Send + 'static,
    {
        let id = self.next_subscription_id;
        self.next_subscription_id += 1;
        self.listeners.push((id, Box::new(listener)));
        debug!("event=subscribe module=service status=ok subscription_id={id}");
        id
    }

    /// Removes a listener. Returns `false` when `id` was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    fn next_id(&self) -> ManagerResult<TodoId> {
        let now = self.clock.now_millis();
        match self.last_issued_id {
            Some(last) if last >= now => last.checked_add(1).ok_or_else(|| {
                error!(
                    "event=todo_add module=service status=rejected reason=id_space_exhausted last_id={last}"
                );
                ManagerError::IdSpaceExhausted { last }
            }),
            _ => Ok(now),
        }
    }

    fn validate_permutation(
        &self,
        id_order: &[TodoId],
    ) -> Result<HashMap<TodoId, usize>, ReorderError> {
        if id_order.len() != self.todos.len() {
            return Err(ReorderError::LengthMismatch {
                expected: self.todos.len(),
                actual: id_order.len(),
            });
        }

        let known: HashSet<TodoId> = self.todos.iter().map(|todo| todo.id).collect();
        let mut position = HashMap::with_capacity(id_order.len());
        for (index, id) in id_order.iter().copied().enumerate() {
            if !known.contains(&id) {
                return Err(ReorderError::UnknownId(id));
            }
            if position.insert(id, index).is_some() {
                return Err(ReorderError::DuplicateId(id));
            }
        }
        Ok(position)
    }

    /// Persists the collection, records the dirty flag, then notifies listeners
    /// whatever the outcome.
    fn commit(&mut self, event: &'static str) -> ManagerResult<()> {
        let saved = self.store.save(&self.todos);
        self.dirty = saved.is_err();
        if let Err(err) = &saved {
            error!(
                "event={event} module=service status=error error_code=persist_failed error={err}"
            );
        }

        self.notify();
        saved.map_err(ManagerError::Persistence)
    }

    fn notify(&mut self) {
        let todos = self.todos.as_slice();
        for (_, listener) in self.listeners.iter_mut() {
            listener(todos);
        }
    }
}

fn not_found(event: &'static str, id: TodoId) -> Outcome {
    debug!("event={event} module=service status=noop reason=not_found id={id}");
    Outcome::Unchanged
}
