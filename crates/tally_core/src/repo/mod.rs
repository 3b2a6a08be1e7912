//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the storage contract every backend honors.
//! - Select a backend from the store path (`StoreKind`).
//!
//! # Invariants
//! - Every backend returns identical, identically ordered results for the
//!   same data and `EntryFilter`.
//! - Listings are ascending by `start_time`, ties broken by `id`.
//! - Write paths call `Entry::validate()` before persistence.
//! - Missing ids surface as `RepoError::NotFound`, not transport errors.

pub mod file_repo;
pub mod format;
pub mod sqlite_repo;

use crate::db::DbError;
use crate::model::entry::{Entry, EntryId, EntryValidationError};
use crate::model::filter::EntryFilter;
use format::StorageFormat;
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub use file_repo::FileEntryRepository;
pub use sqlite_repo::SqliteEntryRepository;

const SQLITE_EXTENSIONS: [&str; 3] = ["db", "sqlite", "sqlite3"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by all backends.
#[derive(Debug)]
pub enum RepoError {
    Validation(EntryValidationError),
    Db(DbError),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Document could not be encoded or decoded in its storage format.
    Format {
        format: StorageFormat,
        message: String,
    },
    NotFound(EntryId),
    UnsupportedFormat(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Format { format, message } => {
                write!(f, "invalid {format} entry document: {message}")
            }
            Self::NotFound(id) => write!(f, "entry not found: {id}"),
            Self::UnsupportedFormat(extension) => {
                write!(f, "unsupported storage format: `{extension}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted entry data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::Format { .. }
            | Self::NotFound(_)
            | Self::UnsupportedFormat(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<EntryValidationError> for RepoError {
    fn from(value: EntryValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage contract for time entries.
pub trait EntryRepository {
    /// Inserts or replaces the entry with the same id.
    fn save(&self, entry: &Entry) -> RepoResult<()>;
    /// Returns the earliest entry without `end_time`, if any.
    fn get_active_entry(&self) -> RepoResult<Option<Entry>>;
    fn get_all(&self) -> RepoResult<Vec<Entry>>;
    /// Entries whose project equals `project` exactly.
    fn get_by_project(&self, project: &str) -> RepoResult<Vec<Entry>>;
    fn get_by_id(&self, id: &str) -> RepoResult<Entry>;
    /// Removes the entry and returns what was stored.
    fn delete_by_id(&self, id: &str) -> RepoResult<Entry>;
    fn filter(&self, filter: &EntryFilter) -> RepoResult<Vec<Entry>>;
    /// Bulk upsert in a single write.
    fn save_all(&self, entries: &[Entry]) -> RepoResult<()>;
}

impl<R: EntryRepository + ?Sized> EntryRepository for Box<R> {
    fn save(&self, entry: &Entry) -> RepoResult<()> {
        (**self).save(entry)
    }

    fn get_active_entry(&self) -> RepoResult<Option<Entry>> {
        (**self).get_active_entry()
    }

    fn get_all(&self) -> RepoResult<Vec<Entry>> {
        (**self).get_all()
    }

    fn get_by_project(&self, project: &str) -> RepoResult<Vec<Entry>> {
        (**self).get_by_project(project)
    }

    fn get_by_id(&self, id: &str) -> RepoResult<Entry> {
        (**self).get_by_id(id)
    }

    fn delete_by_id(&self, id: &str) -> RepoResult<Entry> {
        (**self).delete_by_id(id)
    }

    fn filter(&self, filter: &EntryFilter) -> RepoResult<Vec<Entry>> {
        (**self).filter(filter)
    }

    fn save_all(&self, entries: &[Entry]) -> RepoResult<()> {
        (**self).save_all(entries)
    }
}

/// Backend kind derived from a store path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    File(StorageFormat),
    Sqlite,
}

impl StoreKind {
    /// Maps the path extension (case-insensitive) to a backend kind.
    pub fn from_path(path: &Path) -> RepoResult<Self> {
        let extension = path
            .extension()
            .and_then(|value| value.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if SQLITE_EXTENSIONS.contains(&extension.as_str()) {
            return Ok(Self::Sqlite);
        }
        StorageFormat::from_extension(&extension).map(Self::File)
    }
}

/// Opens the backend matching the path extension.
pub fn open_repository(path: impl AsRef<Path>) -> RepoResult<Box<dyn EntryRepository>> {
    let path = path.as_ref();
    match StoreKind::from_path(path)? {
        StoreKind::Sqlite => Ok(Box::new(SqliteEntryRepository::open(path)?)),
        StoreKind::File(format) => Ok(Box::new(FileEntryRepository::open_with_format(
            path, format,
        )?)),
    }
}

/// Canonical listing order shared by every backend.
pub(crate) fn entry_order(left: &Entry, right: &Entry) -> Ordering {
    left.start_time
        .cmp(&right.start_time)
        .then_with(|| left.id.cmp(&right.id))
}
