//! Domain model for time tracking.
//!
//! # Responsibility
//! - Define the canonical entry record shared by every backend.
//! - Define the query value object evaluated by backends.
//!
//! # Invariants
//! - Every entry is identified by a stable `EntryId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod entry;
pub mod filter;
