//! Declarative entry query.
//!
//! # Responsibility
//! - Describe which entries a list call should return.
//! - Materialize `TimePeriod` into concrete date bounds once, at
//!   construction, from a caller-supplied "today".
//!
//! # Invariants
//! - Date bounds never change after construction.
//! - Dimensions combine with AND; tags and project matchers combine with OR.
//! - Dates compare against `Entry::start_date()` (recorded offset).

use crate::model::entry::Entry;
use chrono::{Datelike, Local, NaiveDate, TimeDelta};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Suffix characters that turn a project pattern into a prefix match.
const PROJECT_WILDCARD_SUFFIXES: [char; 3] = ['*', '+', '.'];

/// Named time window used to derive filter date bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimePeriod {
    Today,
    Yesterday,
    /// Monday of the current week onward.
    Week,
    /// First day of the current month onward.
    Month,
    All,
    /// The empty period: today's entries plus whatever is still running.
    Default,
}

impl TimePeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::Week => "week",
            Self::Month => "month",
            Self::All => "all",
            Self::Default => "",
        }
    }
}

impl Display for TimePeriod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a time period name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTimePeriodError(pub String);

impl Display for ParseTimePeriodError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown time period `{}`; expected today|yesterday|week|month|all or empty",
            self.0
        )
    }
}

impl Error for ParseTimePeriodError {}

impl FromStr for TimePeriod {
    type Err = ParseTimePeriodError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(Self::Today),
            "yesterday" => Ok(Self::Yesterday),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "all" => Ok(Self::All),
            "" => Ok(Self::Default),
            _ => Err(ParseTimePeriodError(value.to_string())),
        }
    }
}

/// One project selector.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProjectMatcher {
    Exact(String),
    /// Matches any project starting with the stored text.
    Prefix(String),
}

impl ProjectMatcher {
    /// Parses user input; a trailing `*`, `+` or `.` means prefix match.
    pub fn parse(pattern: &str) -> Self {
        match pattern.char_indices().last() {
            Some((index, last)) if PROJECT_WILDCARD_SUFFIXES.contains(&last) => {
                Self::Prefix(pattern[..index].to_string())
            }
            _ => Self::Exact(pattern.to_string()),
        }
    }

    pub fn matches(&self, project: &str) -> bool {
        match self {
            Self::Exact(value) => project == value,
            Self::Prefix(prefix) => project.starts_with(prefix.as_str()),
        }
    }
}

/// Query over entries. See module docs for combination rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    id_prefix: Option<String>,
    projects: BTreeSet<ProjectMatcher>,
    tags: BTreeSet<String>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    include_active: bool,
    time_period: Option<TimePeriod>,
}

impl EntryFilter {
    /// Filter without any constraint.
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter with explicit inclusive date bounds.
    pub fn between(start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> Self {
        Self {
            start_date,
            end_date,
            ..Self::default()
        }
    }

    /// Derives date bounds for `period` relative to `today`.
    pub fn for_period(period: TimePeriod, today: NaiveDate) -> Self {
        let (start_date, end_date, include_active) = match period {
            TimePeriod::Today => (Some(today), Some(today), false),
            TimePeriod::Yesterday => {
                let yesterday = today - TimeDelta::days(1);
                (Some(yesterday), Some(yesterday), false)
            }
            TimePeriod::Week => {
                let offset = i64::from(today.weekday().num_days_from_monday());
                (Some(today - TimeDelta::days(offset)), None, false)
            }
            TimePeriod::Month => {
                let offset = i64::from(today.day0());
                (Some(today - TimeDelta::days(offset)), None, false)
            }
            TimePeriod::All => (None, None, false),
            TimePeriod::Default => (Some(today), Some(today), true),
        };

        Self {
            start_date,
            end_date,
            include_active,
            time_period: Some(period),
            ..Self::default()
        }
    }

    /// Same as [`EntryFilter::for_period`] with today's local date.
    pub fn for_period_now(period: TimePeriod) -> Self {
        Self::for_period(period, Local::now().date_naive())
    }

    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.id_prefix = if prefix.is_empty() { None } else { Some(prefix) };
        self
    }

    pub fn with_projects<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.projects = patterns
            .into_iter()
            .map(|pattern| ProjectMatcher::parse(pattern.as_ref()))
            .collect();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn id_prefix(&self) -> Option<&str> {
        self.id_prefix.as_deref()
    }

    pub fn projects(&self) -> &BTreeSet<ProjectMatcher> {
        &self.projects
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    /// Whether running entries bypass the date bounds.
    pub fn include_active(&self) -> bool {
        self.include_active
    }

    pub fn time_period(&self) -> Option<TimePeriod> {
        self.time_period
    }

    /// Evaluates the full predicate against one entry.
    pub fn matches(&self, entry: &Entry) -> bool {
        self.matches_id(entry)
            && self.matches_project(entry)
            && self.matches_dates(entry)
            && self.matches_tags(entry)
    }

    fn matches_id(&self, entry: &Entry) -> bool {
        self.id_prefix
            .as_deref()
            .map_or(true, |prefix| entry.id.starts_with(prefix))
    }

    fn matches_project(&self, entry: &Entry) -> bool {
        self.projects.is_empty()
            || self
                .projects
                .iter()
                .any(|matcher| matcher.matches(&entry.project))
    }

    fn matches_dates(&self, entry: &Entry) -> bool {
        if self.include_active && entry.is_active() {
            return true;
        }
        let date = entry.start_date();
        self.start_date.map_or(true, |start| date >= start)
            && self.end_date.map_or(true, |end| date <= end)
    }

    fn matches_tags(&self, entry: &Entry) -> bool {
        self.tags.is_empty() || self.tags.iter().any(|tag| entry.tags.contains(tag))
    }
}
