//! Whole-document file repository.
//!
//! # Responsibility
//! - Persist the full entry collection as one YAML/TOML/JSON document.
//! - Evaluate filters in memory with `EntryFilter::matches`.
//!
//! # Invariants
//! - Load is lazy and cached per repository instance.
//! - Every mutation re-sorts and rewrites the whole document.
//! - Rewrites go through a sibling temp file and a rename, so readers see
//!   either the old or the new document.
//! - No cross-process locking: concurrent writers are last-writer-wins.

use crate::model::entry::Entry;
use crate::model::filter::EntryFilter;
use crate::repo::format::{EntryDocument, StorageFormat};
use crate::repo::{entry_order, EntryRepository, RepoError, RepoResult, StoreKind};
use log::{debug, info};
use std::cell::RefCell;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File-backed entry repository.
pub struct FileEntryRepository {
    path: PathBuf,
    format: StorageFormat,
    cache: RefCell<Option<Vec<Entry>>>,
}

impl FileEntryRepository {
    /// Opens a file store, picking the format from the extension.
    ///
    /// Creates an empty document (and parent directories) when missing.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        let path = path.as_ref();
        match StoreKind::from_path(path)? {
            StoreKind::File(format) => Self::open_with_format(path, format),
            StoreKind::Sqlite => Err(RepoError::UnsupportedFormat(
                path.extension()
                    .and_then(|value| value.to_str())
                    .unwrap_or_default()
                    .to_string(),
            )),
        }
    }

    pub fn open_with_format(path: impl AsRef<Path>, format: StorageFormat) -> RepoResult<Self> {
        let repo = Self {
            path: path.as_ref().to_path_buf(),
            format,
            cache: RefCell::new(None),
        };
        if !repo.path.exists() {
            repo.write_entries(Vec::new())?;
            info!(
                "event=store_create module=repo status=ok backend=file format={} path={}",
                format,
                repo.path.display()
            );
        }
        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> StorageFormat {
        self.format
    }

    /// Drops the cached collection; the next read reloads from disk.
    pub fn invalidate_cache(&self) {
        self.cache.replace(None);
    }

    fn load_entries(&self) -> RepoResult<Vec<Entry>> {
        if let Some(entries) = self.cache.borrow().as_ref() {
            return Ok(entries.clone());
        }

        let content = fs::read_to_string(&self.path).map_err(|source| self.io_error(source))?;
        let mut document = self.format.decode(&content)?;
        document.entries.sort_by(entry_order);
        debug!(
            "event=store_load module=repo status=ok backend=file entries={}",
            document.entries.len()
        );
        self.cache.replace(Some(document.entries.clone()));
        Ok(document.entries)
    }

    fn write_entries(&self, mut entries: Vec<Entry>) -> RepoResult<()> {
        entries.sort_by(entry_order);
        let document = EntryDocument { entries };
        let content = self.format.encode(&document)?;

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|source| self.io_error(source))?;

        let mut staged = NamedTempFile::new_in(&parent).map_err(|source| self.io_error(source))?;
        staged
            .write_all(content.as_bytes())
            .and_then(|()| staged.flush())
            .map_err(|source| self.io_error(source))?;
        staged
            .persist(&self.path)
            .map_err(|err| self.io_error(err.error))?;

        debug!(
            "event=store_write module=repo status=ok backend=file entries={}",
            document.entries.len()
        );
        self.cache.replace(Some(document.entries));
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> RepoError {
        RepoError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl EntryRepository for FileEntryRepository {
    fn save(&self, entry: &Entry) -> RepoResult<()> {
        self.save_all(std::slice::from_ref(entry))
    }

    fn get_active_entry(&self) -> RepoResult<Option<Entry>> {
        Ok(self
            .load_entries()?
            .into_iter()
            .find(|entry| entry.is_active()))
    }

    fn get_all(&self) -> RepoResult<Vec<Entry>> {
        self.load_entries()
    }

    fn get_by_project(&self, project: &str) -> RepoResult<Vec<Entry>> {
        Ok(self
            .load_entries()?
            .into_iter()
            .filter(|entry| entry.project == project)
            .collect())
    }

    fn get_by_id(&self, id: &str) -> RepoResult<Entry> {
        self.load_entries()?
            .into_iter()
            .find(|entry| entry.id == id)
            .ok_or_else(|| RepoError::NotFound(id.to_string()))
    }

    fn delete_by_id(&self, id: &str) -> RepoResult<Entry> {
        let mut entries = self.load_entries()?;
        let position = entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or_else(|| RepoError::NotFound(id.to_string()))?;
        let removed = entries.remove(position);
        self.write_entries(entries)?;
        Ok(removed)
    }

    fn filter(&self, filter: &EntryFilter) -> RepoResult<Vec<Entry>> {
        Ok(self
            .load_entries()?
            .into_iter()
            .filter(|entry| filter.matches(entry))
            .collect())
    }

    fn save_all(&self, incoming: &[Entry]) -> RepoResult<()> {
        for entry in incoming {
            entry.validate()?;
        }

        let mut entries = self.load_entries()?;
        for entry in incoming {
            match entries.iter_mut().find(|existing| existing.id == entry.id) {
                Some(existing) => *existing = entry.clone(),
                None => entries.push(entry.clone()),
            }
        }
        self.write_entries(entries)
    }
}
