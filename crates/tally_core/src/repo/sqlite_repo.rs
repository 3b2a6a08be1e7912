//! SQLite entry repository.
//!
//! # Responsibility
//! - Persist entries as rows of `time_entries`.
//! - Push `EntryFilter` predicates down into SQL.
//!
//! # Invariants
//! - `start_epoch`/`start_nanos`/`start_date` are derived from
//!   `start_time` on every write and never edited independently.
//! - `tags` holds a JSON array; membership goes through `tags_contain`.
//! - Filter SQL must combine dimensions exactly like
//!   `EntryFilter::matches` does.

use crate::db::functions::TAGS_CONTAIN_FN;
use crate::db::{open_db, open_db_in_memory};
use crate::model::entry::{Entry, Timestamp};
use crate::model::filter::{EntryFilter, ProjectMatcher};
use crate::repo::{EntryRepository, RepoError, RepoResult};
use chrono::{DateTime, SecondsFormat};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

const ENTRY_SELECT_SQL: &str = "SELECT
    id,
    start_time,
    end_time,
    project,
    tags,
    comment
FROM time_entries";

const ENTRY_ORDER_SQL: &str = " ORDER BY start_epoch ASC, start_nanos ASC, id ASC";

const ENTRY_UPSERT_SQL: &str = "INSERT INTO time_entries (
        id,
        start_time,
        start_epoch,
        start_nanos,
        start_date,
        end_time,
        project,
        tags,
        comment
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
    ON CONFLICT(id) DO UPDATE SET
        start_time = excluded.start_time,
        start_epoch = excluded.start_epoch,
        start_nanos = excluded.start_nanos,
        start_date = excluded.start_date,
        end_time = excluded.end_time,
        project = excluded.project,
        tags = excluded.tags,
        comment = excluded.comment;";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-backed entry repository owning its connection.
pub struct SqliteEntryRepository {
    conn: Connection,
}

impl SqliteEntryRepository {
    /// Opens (or creates) a database file with migrations applied.
    ///
    /// Missing parent directories are created first.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| RepoError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Ok(Self::from_connection(open_db(path)?))
    }

    pub fn open_in_memory() -> RepoResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps a connection returned by `db::open_db*`.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn upsert(conn: &Connection, entry: &Entry) -> RepoResult<()> {
        entry.validate()?;
        let tags = serde_json::to_string(&entry.tags)
            .map_err(|err| RepoError::InvalidData(format!("cannot encode tags: {err}")))?;

        conn.execute(
            ENTRY_UPSERT_SQL,
            params![
                entry.id.as_str(),
                timestamp_to_db(&entry.start_time),
                entry.start_time.timestamp(),
                i64::from(entry.start_time.timestamp_subsec_nanos()),
                entry.start_date().format(DATE_FORMAT).to_string(),
                entry.end_time.as_ref().map(timestamp_to_db),
                entry.project.as_str(),
                tags,
                entry.comment.as_str(),
            ],
        )?;
        Ok(())
    }

    fn query_entries(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Entry>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }
        Ok(entries)
    }
}

impl EntryRepository for SqliteEntryRepository {
    fn save(&self, entry: &Entry) -> RepoResult<()> {
        Self::upsert(&self.conn, entry)
    }

    fn get_active_entry(&self) -> RepoResult<Option<Entry>> {
        let sql = format!("{ENTRY_SELECT_SQL} WHERE end_time IS NULL{ENTRY_ORDER_SQL} LIMIT 1");
        Ok(self.query_entries(&sql, Vec::new())?.into_iter().next())
    }

    fn get_all(&self) -> RepoResult<Vec<Entry>> {
        self.query_entries(&format!("{ENTRY_SELECT_SQL}{ENTRY_ORDER_SQL}"), Vec::new())
    }

    fn get_by_project(&self, project: &str) -> RepoResult<Vec<Entry>> {
        self.query_entries(
            &format!("{ENTRY_SELECT_SQL} WHERE project = ?{ENTRY_ORDER_SQL}"),
            vec![Value::Text(project.to_string())],
        )
    }

    fn get_by_id(&self, id: &str) -> RepoResult<Entry> {
        self.query_entries(
            &format!("{ENTRY_SELECT_SQL} WHERE id = ?"),
            vec![Value::Text(id.to_string())],
        )?
        .into_iter()
        .next()
        .ok_or_else(|| RepoError::NotFound(id.to_string()))
    }

    fn delete_by_id(&self, id: &str) -> RepoResult<Entry> {
        let entry = self.get_by_id(id)?;
        let changed = self
            .conn
            .execute("DELETE FROM time_entries WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }
        Ok(entry)
    }

    fn filter(&self, filter: &EntryFilter) -> RepoResult<Vec<Entry>> {
        let (clause, bind_values) = build_filter_clause(filter);
        let sql = format!("{ENTRY_SELECT_SQL} WHERE {clause}{ENTRY_ORDER_SQL}");
        debug!(
            "event=entry_filter module=repo status=start backend=sqlite binds={}",
            bind_values.len()
        );
        self.query_entries(&sql, bind_values)
    }

    fn save_all(&self, entries: &[Entry]) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        for entry in entries {
            Self::upsert(&tx, entry)?;
        }
        tx.commit()?;
        Ok(())
    }
}

/// Translates a filter into a WHERE clause plus positional binds.
fn build_filter_clause(filter: &EntryFilter) -> (String, Vec<Value>) {
    let mut sql = String::from("1 = 1");
    let mut bind_values: Vec<Value> = Vec::new();

    if let Some(prefix) = filter.id_prefix() {
        sql.push_str(" AND substr(id, 1, length(?)) = ?");
        bind_values.push(Value::Text(prefix.to_string()));
        bind_values.push(Value::Text(prefix.to_string()));
    }

    if !filter.projects().is_empty() {
        let mut exact = Vec::new();
        let mut alternatives = Vec::new();
        for matcher in filter.projects() {
            match matcher {
                ProjectMatcher::Exact(project) => exact.push(project.clone()),
                ProjectMatcher::Prefix(prefix) => {
                    alternatives.push("substr(project, 1, length(?)) = ?".to_string());
                    bind_values.push(Value::Text(prefix.clone()));
                    bind_values.push(Value::Text(prefix.clone()));
                }
            }
        }
        if !exact.is_empty() {
            let placeholders = vec!["?"; exact.len()].join(", ");
            alternatives.push(format!("project IN ({placeholders})"));
            bind_values.extend(exact.into_iter().map(Value::Text));
        }
        sql.push_str(&format!(" AND ({})", alternatives.join(" OR ")));
    }

    let mut date_terms = Vec::new();
    if let Some(start) = filter.start_date() {
        date_terms.push("start_date >= ?");
        bind_values.push(Value::Text(start.format(DATE_FORMAT).to_string()));
    }
    if let Some(end) = filter.end_date() {
        date_terms.push("start_date <= ?");
        bind_values.push(Value::Text(end.format(DATE_FORMAT).to_string()));
    }
    if !date_terms.is_empty() {
        let dates = date_terms.join(" AND ");
        if filter.include_active() {
            sql.push_str(&format!(" AND (({dates}) OR end_time IS NULL)"));
        } else {
            sql.push_str(&format!(" AND {dates}"));
        }
    }

    if !filter.tags().is_empty() {
        let terms = vec![format!("{TAGS_CONTAIN_FN}(tags, ?)"); filter.tags().len()];
        sql.push_str(&format!(" AND ({})", terms.join(" OR ")));
        bind_values.extend(filter.tags().iter().cloned().map(Value::Text));
    }

    (sql, bind_values)
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<Entry> {
    let id: String = row.get("id")?;
    let start_time = parse_timestamp(&row.get::<_, String>("start_time")?, "start_time")?;
    let end_time = match row.get::<_, Option<String>>("end_time")? {
        Some(value) => Some(parse_timestamp(&value, "end_time")?),
        None => None,
    };

    let tags_text: String = row.get("tags")?;
    let tags: BTreeSet<String> = serde_json::from_str(&tags_text).map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid tags value `{tags_text}` in time_entries.tags: {err}"
        ))
    })?;

    let entry = Entry {
        id,
        start_time,
        end_time,
        project: row.get("project")?,
        tags,
        comment: row.get("comment")?,
    };
    entry.validate()?;
    Ok(entry)
}

fn timestamp_to_db(value: &Timestamp) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

fn parse_timestamp(value: &str, column: &str) -> RepoResult<Timestamp> {
    DateTime::parse_from_rfc3339(value).map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid timestamp `{value}` in time_entries.{column}: {err}"
        ))
    })
}
