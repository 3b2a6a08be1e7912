//! Core domain logic for tally, a personal time tracker.
//! This crate is the single source of truth for entry invariants.

pub mod config;
pub mod db;
pub mod editor;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, Settings};
pub use editor::{EditFormat, EditorError, EntryEditor, ShellEditor};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entry::{Entry, EntryError, EntryId, EntryValidationError, Timestamp};
pub use model::filter::{EntryFilter, ParseTimePeriodError, ProjectMatcher, TimePeriod};
pub use repo::format::{EntryDocument, StorageFormat};
pub use repo::{
    open_repository, EntryRepository, FileEntryRepository, RepoError, RepoResult,
    SqliteEntryRepository, StoreKind,
};
pub use service::auto_tag::{AutoTagEngine, AutoTagError, AutoTagRule};
pub use service::tracker::{StartRequest, TrackerError, TrackerResult, TrackerService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
