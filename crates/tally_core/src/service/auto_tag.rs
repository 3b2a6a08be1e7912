//! Regex-driven implicit tagging.
//!
//! # Responsibility
//! - Compile ordered `{pattern, tags}` declarations once.
//! - Derive implicit tags for a project name at entry creation.
//!
//! # Invariants
//! - Patterns use substring search (`Regex::is_match`), not full match.
//! - Every matching rule contributes; the result is the tag union.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Declarative auto-tag rule as written in settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoTagRule {
    pub pattern: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl AutoTagRule {
    pub fn new<I, S>(pattern: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pattern: pattern.into(),
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug)]
pub enum AutoTagError {
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}

impl Display for AutoTagError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPattern { pattern, source } => {
                write!(f, "invalid auto-tag pattern `{pattern}`: {source}")
            }
        }
    }
}

impl Error for AutoTagError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidPattern { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    pattern: Regex,
    tags: BTreeSet<String>,
}

/// Closed, compiled rule set.
#[derive(Debug, Clone, Default)]
pub struct AutoTagEngine {
    rules: Vec<CompiledRule>,
}

impl AutoTagEngine {
    /// Compiles rules in declaration order; fails on the first bad pattern.
    pub fn new(rules: &[AutoTagRule]) -> Result<Self, AutoTagError> {
        let rules = rules
            .iter()
            .map(|rule| {
                let pattern =
                    Regex::new(&rule.pattern).map_err(|source| AutoTagError::InvalidPattern {
                        pattern: rule.pattern.clone(),
                        source,
                    })?;
                Ok(CompiledRule {
                    pattern,
                    tags: rule.tags.iter().cloned().collect(),
                })
            })
            .collect::<Result<Vec<_>, AutoTagError>>()?;
        Ok(Self { rules })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Union of tags from every rule matching within `project`.
    pub fn apply(&self, project: &str) -> BTreeSet<String> {
        self.rules
            .iter()
            .filter(|rule| rule.pattern.is_match(project))
            .flat_map(|rule| rule.tags.iter().cloned())
            .collect()
    }
}
