//! Token resolution for user-typed names.
//!
//! # Responsibility
//! - Resolve partial or abbreviated tokens against a known vocabulary.
//! - Normalize priority tokens onto the fixed priority scale.
//!
//! # Invariants
//! - Resolution is deterministic: candidates are always reported sorted.
//! - Ambiguity handling is chosen explicitly by each caller.

pub mod fuzzy;
pub mod priority;
