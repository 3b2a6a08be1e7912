//! Time tracking use-case service.
//!
//! # Responsibility
//! - Compose repository, editor and auto-tag rules into tracker commands.
//! - Enforce the single-active-entry rule on every start.
//!
//! # Invariants
//! - Starting a new entry closes any running one at the new start time.
//! - Auto-tags are applied on creation only, never on edit or update.
//! - Every entry written by the service is validated first.
//! - Service layer remains storage-agnostic.

use crate::editor::{EditorError, EntryEditor};
use crate::model::entry::{local_now, Entry, EntryError, EntryId, EntryValidationError, Timestamp};
use crate::model::filter::EntryFilter;
use crate::repo::{open_repository, EntryRepository, RepoError};
use crate::service::auto_tag::AutoTagEngine;
use log::{info, warn};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub type TrackerResult<T> = Result<T, TrackerError>;

/// Error kinds presented to tracker callers.
#[derive(Debug)]
pub enum TrackerError {
    /// No entry with this id (or id prefix).
    NotFound(String),
    /// Partial id matches more than one entry.
    Ambiguous { prefix: String, matches: usize },
    AlreadyStopped(EntryId),
    Validation(EntryValidationError),
    Editor(EditorError),
    UnsupportedFormat(String),
    Repo(RepoError),
}

impl Display for TrackerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "entry not found: {id}"),
            Self::Ambiguous { prefix, matches } => {
                write!(f, "entry id `{prefix}` is ambiguous ({matches} matches)")
            }
            Self::AlreadyStopped(id) => write!(f, "entry already stopped: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Editor(err) => write!(f, "{err}"),
            Self::UnsupportedFormat(extension) => {
                write!(f, "unsupported storage format: `{extension}`")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TrackerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Editor(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TrackerError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::UnsupportedFormat(extension) => Self::UnsupportedFormat(extension),
            other => Self::Repo(other),
        }
    }
}

impl From<EntryError> for TrackerError {
    fn from(value: EntryError) -> Self {
        match value {
            EntryError::Validation(err) => Self::Validation(err),
            EntryError::AlreadyStopped(id) => Self::AlreadyStopped(id),
        }
    }
}

impl From<EntryValidationError> for TrackerError {
    fn from(value: EntryValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<EditorError> for TrackerError {
    fn from(value: EditorError) -> Self {
        Self::Editor(value)
    }
}

/// Request model for starting a new entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRequest {
    pub project: String,
    /// Defaults to local "now".
    pub start_time: Option<Timestamp>,
    pub comment: String,
    /// User-supplied tags; auto-tags are merged in.
    pub tags: BTreeSet<String>,
}

impl StartRequest {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            start_time: None,
            comment: String::new(),
            tags: BTreeSet::new(),
        }
    }

    pub fn at(mut self, start_time: Timestamp) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Tracker facade over one store.
pub struct TrackerService<R: EntryRepository> {
    repo: R,
    editor: Box<dyn EntryEditor>,
    auto_tags: AutoTagEngine,
}

impl<R: EntryRepository> TrackerService<R> {
    pub fn new(repo: R, editor: Box<dyn EntryEditor>, auto_tags: AutoTagEngine) -> Self {
        Self {
            repo,
            editor,
            auto_tags,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Starts a new entry, closing the running one first.
    ///
    /// # Contract
    /// - The running entry's `end_time` becomes the new `start_time`.
    /// - `tags = request.tags ∪ auto_tags(project)`.
    /// - Nothing is written when the new entry is invalid.
    pub fn start_tracking(&self, request: StartRequest) -> TrackerResult<Entry> {
        let start_time = request.start_time.unwrap_or_else(local_now);
        let mut tags = request.tags;
        tags.extend(self.auto_tags.apply(&request.project));
        let entry = Entry::new(request.project, start_time)?
            .with_tags(tags)
            .with_comment(request.comment);

        if let Some(mut active) = self.repo.get_active_entry()? {
            active.stop(Some(start_time))?;
            self.repo.save(&active)?;
            info!(
                "event=entry_stop module=service status=ok reason=implicit entry_id={}",
                active.id
            );
        }

        self.repo.save(&entry)?;
        info!(
            "event=entry_start module=service status=ok entry_id={} tags={}",
            entry.id,
            entry.tags.len()
        );
        Ok(entry)
    }

    /// Stops the running entry; `Ok(None)` when nothing is running.
    pub fn stop_tracking(&self, stop_time: Option<Timestamp>) -> TrackerResult<Option<Entry>> {
        let Some(mut active) = self.repo.get_active_entry()? else {
            info!("event=entry_stop module=service status=noop reason=no_active_entry");
            return Ok(None);
        };

        active.stop(stop_time)?;
        self.repo.save(&active)?;
        info!(
            "event=entry_stop module=service status=ok entry_id={}",
            active.id
        );
        Ok(Some(active))
    }

    pub fn get_active_entry(&self) -> TrackerResult<Option<Entry>> {
        Ok(self.repo.get_active_entry()?)
    }

    pub fn get_entry(&self, id: &str) -> TrackerResult<Entry> {
        Ok(self.repo.get_by_id(id)?)
    }

    /// Lists entries; `None` lists the whole store.
    pub fn list_entries(&self, filter: Option<&EntryFilter>) -> TrackerResult<Vec<Entry>> {
        match filter {
            Some(filter) => Ok(self.repo.filter(filter)?),
            None => Ok(self.repo.get_all()?),
        }
    }

    /// Replaces an existing entry as-is.
    pub fn update_entry(&self, entry: &Entry) -> TrackerResult<Entry> {
        self.repo.get_by_id(&entry.id)?;
        entry.validate()?;
        self.repo.save(entry)?;
        Ok(entry.clone())
    }

    pub fn delete_entry(&self, id: &str) -> TrackerResult<Entry> {
        let removed = self.repo.delete_by_id(id)?;
        info!("event=entry_delete module=service status=ok entry_id={id}");
        Ok(removed)
    }

    /// Opens the entry in the external editor and persists the result.
    pub fn edit_entry(&self, id: &str) -> TrackerResult<Entry> {
        let entry = self.repo.get_by_id(id)?;
        let edited = self.editor.edit(&entry).map_err(|err| {
            warn!("event=entry_edit module=service status=error entry_id={id} error={err}");
            err
        })?;
        self.update_entry(&edited)
    }

    /// Resolves a unique id prefix to its entry.
    pub fn resolve_by_partial_id(&self, prefix: &str) -> TrackerResult<Entry> {
        if prefix.is_empty() {
            return Err(TrackerError::NotFound(String::new()));
        }

        let mut matches = self
            .repo
            .filter(&EntryFilter::all().with_id_prefix(prefix))?;
        match matches.len() {
            0 => Err(TrackerError::NotFound(prefix.to_string())),
            1 => Ok(matches.remove(0)),
            count => Err(TrackerError::Ambiguous {
                prefix: prefix.to_string(),
                matches: count,
            }),
        }
    }

    /// Copies every entry into the store at `target`; returns the count.
    ///
    /// The backend is chosen from the target extension. The source store
    /// is not modified.
    pub fn export_entries(&self, target: impl AsRef<Path>) -> TrackerResult<usize> {
        let target = target.as_ref();
        let entries = self.repo.get_all()?;
        let destination = open_repository(target)?;
        destination.save_all(&entries)?;
        info!(
            "event=entry_export module=service status=ok count={} target={}",
            entries.len(),
            target.display()
        );
        Ok(entries.len())
    }
}
