//! File helpers shared by the file-backed stores.
//!
//! - Whole-file JSON array of tasks, pretty printed.
//! - Writes go through a temp file in the same directory + rename, so a
//!   reader never observes a half-written file.
//! - Records written by older versions may lack `id`, `version` or `status`;
//!   they are completed on read and reported as `dirty` so the caller can
//!   persist the assigned ids before anyone observes them.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tempfile::NamedTempFile;

use super::TaskFactory;
use crate::domain::{StoreError, Task, TaskId, TaskStatus};

/// On-disk shape of a task; every field the store adds is optional.
#[derive(Debug, Deserialize)]
struct StoredRecord {
    #[serde(default)]
    id: Option<TaskId>,
    text: String,
    date: DateTime<Utc>,
    #[serde(default)]
    status: Option<TaskStatus>,
    #[serde(default)]
    version: Option<u64>,
}

/// Parsed file contents.
pub(super) struct Loaded {
    pub tasks: Vec<Task>,
    pub dirty: bool,
}

pub(super) fn parse_tasks(
    path: &Path,
    bytes: &[u8],
    factory: &TaskFactory,
) -> Result<Loaded, StoreError> {
    let records: Vec<StoredRecord> =
        serde_json::from_slice(bytes).map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;

    let mut dirty = false;
    let mut tasks = Vec::with_capacity(records.len());
    for record in records {
        dirty |= record.id.is_none() || record.version.is_none() || record.status.is_none();

        let status = record
            .status
            .unwrap_or_else(|| TaskStatus::classify(record.date, factory.now()));
        let id = match record.id {
            Some(id) => id,
            None => factory.create_id(),
        };
        tasks.push(Task {
            id,
            text: record.text,
            date: record.date,
            status,
            version: record.version.unwrap_or(1),
        });
    }
    Ok(Loaded { tasks, dirty })
}

pub(super) fn encode_tasks(tasks: &[Task]) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec_pretty(tasks)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

/// Write `content` to `path` atomically using a temp file + rename.
pub(super) fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut tmp = NamedTempFile::new_in(parent_dir(path))?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// `atomic_write` on the blocking pool, with the error mapped to the store's.
pub(super) async fn write_tasks(path: &Path, tasks: &[Task]) -> Result<(), StoreError> {
    let content = encode_tasks(tasks).map_err(|e| StoreError::Write {
        path: path.to_path_buf(),
        source: io::Error::other(e),
    })?;
    let target: PathBuf = path.to_path_buf();
    tokio::task::spawn_blocking(move || atomic_write(&target, &content))
        .await
        .map_err(|e| StoreError::Write {
            path: path.to_path_buf(),
            source: io::Error::other(e),
        })?
        .map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })
}
