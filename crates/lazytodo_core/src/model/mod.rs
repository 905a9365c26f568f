//! Todo domain model.
//!
//! # Responsibility
//! - Define the record shape shared by the store, the manager, and callers.
//!
//! # Invariants
//! - Every todo is identified by a stable integer `TodoId`.
//! - Titles are stored trimmed and never blank.

pub mod todo;
