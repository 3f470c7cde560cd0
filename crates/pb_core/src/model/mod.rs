//! Domain model for todo items.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep one item shape for add, list and show projections.
//!
//! # Invariants
//! - Every stored item is identified by a unique `message_id`.
//! - Items are immutable once written to a container.

pub mod item;
