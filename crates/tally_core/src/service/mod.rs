//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and editor calls into tracker commands.
//! - Keep callers decoupled from storage details.

pub mod auto_tag;
pub mod tracker;
