//! Core use-case services.
//!
//! # Responsibility
//! - Own the in-memory todo collection and its synchronization with storage.
//! - Keep presentation layers decoupled from storage details.

pub mod shared;
pub mod todo_manager;
