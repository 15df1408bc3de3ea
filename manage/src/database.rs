//! A site database kept as files in one directory.
//!
//! | file | format | contents |
//! |---|---|---|
//! | `pages.json` | JSON array | `Page` |
//! | `revisions.jsonl` | one JSON object per line | `PageRevision` |
//! | `log_entries.jsonl` | one JSON object per line | `LogEntry` |
//!
//! Revisions are never loaded all at once. Opening the revision file reads
//! only each line's ordering key and byte offset; the stream then seeks to
//! each revision in `(page_id, created_at)` order and parses it on demand.

use std::{
    fs::{self, File},
    io::{BufRead, BufReader, BufWriter, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use wagtail_audit::InMemoryLogStore;
use wagtail_backfill::InMemoryPages;
use wagtail_contracts::{
    error::{WagtailError, WagtailResult},
    log_entry::LogEntry,
    site::{Page, PageId, PageRevision, RevisionId},
};
use wagtail_core::traits::{RevisionSource, RevisionStream};

pub const PAGES_FILE: &str = "pages.json";
pub const REVISIONS_FILE: &str = "revisions.jsonl";
pub const LOG_ENTRIES_FILE: &str = "log_entries.jsonl";

fn store_error(path: &Path, e: impl std::fmt::Display) -> WagtailError {
    WagtailError::Store {
        reason: format!("{}: {}", path.display(), e),
    }
}

pub struct Database {
    dir: PathBuf,
}

impl Database {
    pub fn open(dir: &Path) -> WagtailResult<Self> {
        if !dir.is_dir() {
            return Err(WagtailError::Config {
                reason: format!("database directory '{}' does not exist", dir.display()),
            });
        }
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// All pages. A missing file means an empty site.
    pub fn pages(&self) -> WagtailResult<InMemoryPages> {
        let path = self.dir.join(PAGES_FILE);
        if !path.exists() {
            return Ok(InMemoryPages::default());
        }
        let contents = fs::read_to_string(&path).map_err(|e| store_error(&path, e))?;
        let pages: Vec<Page> = serde_json::from_str(&contents).map_err(|e| store_error(&path, e))?;
        debug!(count = pages.len(), "pages loaded");
        Ok(InMemoryPages::new(pages))
    }

    pub fn revisions(&self) -> WagtailResult<RevisionFile> {
        RevisionFile::index(&self.dir.join(REVISIONS_FILE))
    }

    /// Load the audit log into memory.
    pub fn log_entries(&self) -> WagtailResult<InMemoryLogStore> {
        let path = self.dir.join(LOG_ENTRIES_FILE);
        if !path.exists() {
            return Ok(InMemoryLogStore::new());
        }

        let reader = BufReader::new(File::open(&path).map_err(|e| store_error(&path, e))?);
        let mut entries = Vec::new();
        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| store_error(&path, e))?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let entry: LogEntry = serde_json::from_str(trimmed)
                .map_err(|e| store_error(&path, format!("line {}: {}", line_num + 1, e)))?;
            entries.push(entry);
        }

        debug!(count = entries.len(), "log entries loaded");
        Ok(InMemoryLogStore::with_entries(entries))
    }

    /// Replace the audit log file with the store's contents.
    ///
    /// Written to a sibling file first and renamed over the original, so an
    /// interrupted save leaves the previous log intact.
    pub fn save_log_entries(&self, store: &InMemoryLogStore) -> WagtailResult<usize> {
        let path = self.dir.join(LOG_ENTRIES_FILE);
        let tmp = self.dir.join(format!("{LOG_ENTRIES_FILE}.tmp"));
        let entries = store.snapshot()?;

        let file = File::create(&tmp).map_err(|e| store_error(&tmp, e))?;
        let mut writer = BufWriter::new(file);
        for entry in &entries {
            let line = serde_json::to_string(entry).map_err(|e| store_error(&tmp, e))?;
            writeln!(writer, "{line}").map_err(|e| store_error(&tmp, e))?;
        }
        writer.flush().map_err(|e| store_error(&tmp, e))?;
        drop(writer);

        fs::rename(&tmp, &path).map_err(|e| store_error(&path, e))?;
        info!(count = entries.len(), path = %path.display(), "log entries saved");
        Ok(entries.len())
    }
}

/// The fields of a revision line needed to order it.
#[derive(Deserialize)]
struct RevisionKey {
    id: RevisionId,
    page_id: PageId,
    created_at: DateTime<Utc>,
}

/// `revisions.jsonl` with an in-memory ordering index.
pub struct RevisionFile {
    path: PathBuf,
    /// `(page_id, created_at, id, byte offset)`, sorted.
    index: Vec<(PageId, DateTime<Utc>, RevisionId, u64)>,
}

impl RevisionFile {
    pub fn index(path: &Path) -> WagtailResult<Self> {
        let mut index = Vec::new();
        if !path.exists() {
            return Ok(Self {
                path: path.to_path_buf(),
                index,
            });
        }

        let mut reader = BufReader::new(File::open(path).map_err(|e| store_error(path, e))?);
        let mut offset = 0u64;
        let mut line = String::new();
        let mut line_num = 0;
        loop {
            line.clear();
            let read = reader.read_line(&mut line).map_err(|e| store_error(path, e))?;
            if read == 0 {
                break;
            }
            line_num += 1;

            if !line.trim().is_empty() {
                let key: RevisionKey = serde_json::from_str(line.trim())
                    .map_err(|e| store_error(path, format!("line {}: {}", line_num, e)))?;
                index.push((key.page_id, key.created_at, key.id, offset));
            }
            offset += read as u64;
        }

        index.sort();
        debug!(count = index.len(), "revision index built");
        Ok(Self {
            path: path.to_path_buf(),
            index,
        })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn read_at(&self, reader: &mut BufReader<File>, offset: u64) -> WagtailResult<PageRevision> {
        reader
            .seek(SeekFrom::Start(offset))
            .map_err(|e| store_error(&self.path, e))?;
        let mut line = String::new();
        reader.read_line(&mut line).map_err(|e| store_error(&self.path, e))?;
        serde_json::from_str(line.trim())
            .map_err(|e| store_error(&self.path, format!("offset {}: {}", offset, e)))
    }
}

impl RevisionSource for RevisionFile {
    fn revisions_in_page_order(&self) -> WagtailResult<RevisionStream<'_>> {
        if self.is_empty() {
            return Ok(Box::new(std::iter::empty()));
        }

        let mut reader = BufReader::new(File::open(&self.path).map_err(|e| store_error(&self.path, e))?);
        Ok(Box::new(
            self.index
                .iter()
                .map(move |(_, _, _, offset)| self.read_at(&mut reader, *offset)),
        ))
    }
}
