//! Time entry domain model.
//!
//! # Responsibility
//! - Define the canonical record persisted by every storage backend.
//! - Own the active -> stopped lifecycle transition.
//!
//! # Invariants
//! - `id` is non-empty, stable and never reused for another entry.
//! - `project` is non-empty.
//! - `end_time` is never earlier than `start_time` when set.
//! - Deserialized entries are validated before they reach callers.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a time entry.
///
/// Kept as a plain string so partial-id lookups can prefix-match it.
pub type EntryId = String;

/// Timestamp type used for entry boundaries.
pub type Timestamp = DateTime<FixedOffset>;

/// Returns the current local time with its UTC offset attached.
pub fn local_now() -> Timestamp {
    Local::now().fixed_offset()
}

/// Generates a fresh entry id (32 lowercase hex chars).
pub fn generate_entry_id() -> EntryId {
    Uuid::new_v4().simple().to_string()
}

/// Structural validation failure for an [`Entry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValidationError {
    EmptyId,
    EmptyProject,
    EndBeforeStart { start: Timestamp, end: Timestamp },
}

impl Display for EntryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "entry id must not be empty"),
            Self::EmptyProject => write!(f, "entry project must not be empty"),
            Self::EndBeforeStart { start, end } => write!(
                f,
                "end_time ({}) must be >= start_time ({})",
                end.to_rfc3339(),
                start.to_rfc3339()
            ),
        }
    }
}

impl Error for EntryValidationError {}

/// Lifecycle error raised by entry mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryError {
    Validation(EntryValidationError),
    AlreadyStopped(EntryId),
}

impl Display for EntryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::AlreadyStopped(id) => write!(f, "entry already stopped: {id}"),
        }
    }
}

impl Error for EntryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::AlreadyStopped(_) => None,
        }
    }
}

impl From<EntryValidationError> for EntryError {
    fn from(value: EntryValidationError) -> Self {
        Self::Validation(value)
    }
}

/// One recorded span of tracked time against a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EntryWire")]
pub struct Entry {
    pub id: EntryId,
    pub start_time: Timestamp,
    /// `None` while the entry is running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Timestamp>,
    pub project: String,
    pub tags: BTreeSet<String>,
    pub comment: String,
}

/// Unvalidated wire shape; missing optional fields fall back to defaults.
#[derive(Deserialize)]
struct EntryWire {
    id: EntryId,
    start_time: Timestamp,
    #[serde(default)]
    end_time: Option<Timestamp>,
    project: String,
    #[serde(default)]
    tags: BTreeSet<String>,
    #[serde(default)]
    comment: String,
}

impl TryFrom<EntryWire> for Entry {
    type Error = EntryValidationError;

    fn try_from(value: EntryWire) -> Result<Self, Self::Error> {
        let entry = Entry {
            id: value.id,
            start_time: value.start_time,
            end_time: value.end_time,
            project: value.project,
            tags: value.tags,
            comment: value.comment,
        };
        entry.validate()?;
        Ok(entry)
    }
}

impl Entry {
    /// Creates a new active entry with a generated id.
    pub fn new(
        project: impl Into<String>,
        start_time: Timestamp,
    ) -> Result<Self, EntryValidationError> {
        Self::with_id(generate_entry_id(), project, start_time)
    }

    /// Creates a new active entry with a caller-provided id.
    ///
    /// Used by import paths where identity already exists.
    pub fn with_id(
        id: impl Into<EntryId>,
        project: impl Into<String>,
        start_time: Timestamp,
    ) -> Result<Self, EntryValidationError> {
        let entry = Self {
            id: id.into(),
            start_time,
            end_time: None,
            project: project.into(),
            tags: BTreeSet::new(),
            comment: String::new(),
        };
        entry.validate()?;
        Ok(entry)
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Sets the end time, re-validating the time window.
    pub fn with_end_time(mut self, end_time: Timestamp) -> Result<Self, EntryValidationError> {
        self.end_time = Some(end_time);
        self.validate()?;
        Ok(self)
    }

    /// Checks identity and time-window invariants.
    pub fn validate(&self) -> Result<(), EntryValidationError> {
        if self.id.is_empty() {
            return Err(EntryValidationError::EmptyId);
        }
        if self.project.trim().is_empty() {
            return Err(EntryValidationError::EmptyProject);
        }
        if let Some(end) = self.end_time {
            if end < self.start_time {
                return Err(EntryValidationError::EndBeforeStart {
                    start: self.start_time,
                    end,
                });
            }
        }
        Ok(())
    }

    /// Returns whether the entry is still running.
    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }

    /// Calendar date of `start_time` in the offset it was recorded with.
    pub fn start_date(&self) -> NaiveDate {
        self.start_time.date_naive()
    }

    /// Stops the entry at `end_time`, or at local "now" when `None`.
    ///
    /// A stored end time that already violates the window is treated as
    /// not stopped and gets replaced. On error the entry is left untouched.
    pub fn stop(&mut self, end_time: Option<Timestamp>) -> Result<(), EntryError> {
        if let Some(current) = self.end_time {
            if current >= self.start_time {
                return Err(EntryError::AlreadyStopped(self.id.clone()));
            }
        }

        let end = end_time.unwrap_or_else(local_now);
        if end < self.start_time {
            return Err(EntryValidationError::EndBeforeStart {
                start: self.start_time,
                end,
            }
            .into());
        }

        self.end_time = Some(end);
        Ok(())
    }

    /// Elapsed time; keeps growing while the entry is active.
    pub fn duration(&self) -> TimeDelta {
        self.duration_at(local_now())
    }

    /// Elapsed time, using `now` as the end of an active entry.
    pub fn duration_at(&self, now: Timestamp) -> TimeDelta {
        self.end_time.unwrap_or(now) - self.start_time
    }
}
