//! Persistence store contracts and implementations.
//!
//! # Responsibility
//! - Mirror the full todo collection into one durable key-value slot.
//! - Keep SQLite and serialization details out of the manager.
//!
//! # Invariants
//! - `save` replaces the whole stored collection; there is no patching.
//! - `load` never fails: missing or corrupt blobs read as an empty collection.

pub mod memory_store;
pub mod todo_store;
