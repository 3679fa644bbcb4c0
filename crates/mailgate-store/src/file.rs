//! File-backed record store.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::StoreError;

/// Dedup key → last subject delivered under that key.
pub type Records = BTreeMap<String, String>;

/// A flat JSON object on disk, read and written in full on every access.
///
/// There is no locking. Two processes racing `load` → mutate → `save` on the
/// same path lose updates; the last save wins. Callers that need concurrent
/// access must serialise it themselves.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole mapping.
    ///
    /// A missing file is created containing an empty object, so loading a
    /// fresh path always succeeds and repeated loads are idempotent.
    pub fn load(&self) -> Result<Records, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let records = Records::new();
                self.save(&records)?;
                info!(path = %self.path.display(), "created empty record store");
                return Ok(records);
            }
            Err(e) => return Err(StoreError::unavailable(&self.path, e)),
        };

        let records: Records =
            serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        debug!(path = %self.path.display(), count = records.len(), "loaded record store");
        Ok(records)
    }

    /// Replace the file content with `records`.
    ///
    /// This is a full overwrite: entries missing from `records` are gone
    /// afterwards. The new content is written to a sibling temp file and
    /// renamed over the target. A symlinked store is resolved first so the
    /// link keeps pointing at the updated file, and an existing file keeps
    /// its permissions.
    pub fn save(&self, records: &Records) -> Result<(), StoreError> {
        let unavailable = |e: io::Error| StoreError::unavailable(&self.path, e);

        let mut content = serde_json::to_string_pretty(records)
            .map_err(|e| unavailable(io::Error::from(e)))?;
        content.push('\n');

        let target = match fs::canonicalize(&self.path) {
            Ok(resolved) => resolved,
            Err(e) if e.kind() == io::ErrorKind::NotFound => self.path.clone(),
            Err(e) => return Err(unavailable(e)),
        };
        let permissions = fs::metadata(&target).ok().map(|m| m.permissions());

        let mut tmp = NamedTempFile::new_in(parent_dir(&target)).map_err(unavailable)?;
        tmp.write_all(content.as_bytes()).map_err(unavailable)?;
        if let Some(permissions) = permissions {
            tmp.as_file().set_permissions(permissions).map_err(unavailable)?;
        }
        tmp.as_file().sync_all().map_err(unavailable)?;
        tmp.persist(&target).map_err(|e| unavailable(e.error))?;

        debug!(path = %self.path.display(), count = records.len(), "saved record store");
        Ok(())
    }

    /// Load, set `key` to `subject`, save. Returns the subject previously
    /// stored under `key`, if any.
    pub fn record(&self, key: &str, subject: &str) -> Result<Option<String>, StoreError> {
        let mut records = self.load()?;
        let previous = records.insert(key.to_string(), subject.to_string());
        self.save(&records)?;
        Ok(previous)
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}
