//! Filesystem-backed credential store.
//!
//! Records are JSON files under a directory tree:
//!
//! ```text
//! {base_dir}/
//! ├── records/          one file per agent
//! │   └── {agent_id}.json
//! ├── names/            name index, one file per taken name
//! │   └── {base58(name)}.json
//! └── store.lock        advisory lock serializing writers
//! ```
//!
//! File format for records:
//! ```json
//! { "version": 1, "record": { ... CredentialRecord ... } }
//! ```
//!
//! File format for name index entries:
//! ```json
//! { "version": 1, "id": "agt_..." }
//! ```
//!
//! Every write (insert, `set_active`, `update_last_auth`) holds an
//! exclusive lock on `store.lock`, so writers in separate processes on the
//! same directory never interleave a read-modify-write. Readers take no
//! lock: record files are written to a temporary sibling and renamed into
//! place, so a reader sees either the old or the new record.
//!
//! A name is claimed by creating its index file with `create_new`. A claim
//! left behind by a crashed insert (empty, or pointing at a record that
//! was never written) is reclaimed by the next insert of that name.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::agent::{AgentId, CredentialRecord};
use crate::crypto::random::random_bytes;

use super::{CredentialStore, StoreError, StoreResult};

// ── File format constants ─────────────────────────────────────────────────────

const RECORD_FILE_VERSION: u32 = 1;

const RECORDS_DIR: &str = "records";
const NAMES_DIR: &str = "names";
const LOCK_FILE: &str = "store.lock";

// ── On-disk structures ────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct RecordFile {
    version: u32,
    record: CredentialRecord,
}

#[derive(Debug, Serialize, Deserialize)]
struct NameFile {
    version: u32,
    id: AgentId,
}

// ── FileStore ─────────────────────────────────────────────────────────────────

/// Exclusive hold on the store's lock file, released on drop.
struct StoreLock(File);

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.0);
    }
}

/// Credential store persisted as JSON files.
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Open (or create) a store rooted at `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the directories cannot be created.
    pub fn new(base_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(base_dir.join(RECORDS_DIR))?;
        std::fs::create_dir_all(base_dir.join(NAMES_DIR))?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    /// Block until this handle holds the store-wide writer lock.
    ///
    /// The lock is per open file handle, so it excludes other threads of
    /// this process as well as other processes.
    fn lock(&self) -> StoreResult<StoreLock> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(self.base_dir.join(LOCK_FILE))?;
        FileExt::lock_exclusive(&file)?;
        Ok(StoreLock(file))
    }

    /// A name file with no usable record behind it, left by an insert
    /// that died between claiming the name and writing the record.
    fn is_stale_claim(&self, name_path: &Path) -> StoreResult<bool> {
        let raw = match std::fs::read_to_string(name_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(true);
        }
        let entry: NameFile = serde_json::from_str(&raw).map_err(|e| {
            StoreError::Corrupt(format!(
                "failed to parse name file {}: {e}",
                name_path.display()
            ))
        })?;
        Ok(self.find_by_id(&entry.id)?.is_none())
    }

    fn record_path(&self, id: &AgentId) -> Option<PathBuf> {
        is_path_safe(id.as_str()).then(|| {
            self.base_dir
                .join(RECORDS_DIR)
                .join(format!("{}.json", id.0))
        })
    }

    fn name_path(&self, name: &str) -> PathBuf {
        let encoded = bs58::encode(name.as_bytes()).into_string();
        self.base_dir
            .join(NAMES_DIR)
            .join(format!("{encoded}.json"))
    }

    fn read_record(&self, path: &Path) -> StoreResult<Option<CredentialRecord>> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let file: RecordFile = serde_json::from_slice(&bytes).map_err(|e| {
            StoreError::Corrupt(format!("failed to parse record file {}: {e}", path.display()))
        })?;
        if file.version != RECORD_FILE_VERSION {
            return Err(StoreError::Corrupt(format!(
                "unsupported record file version {} in {}",
                file.version,
                path.display()
            )));
        }
        Ok(Some(file.record))
    }

    fn write_record(&self, record: &CredentialRecord) -> StoreResult<()> {
        let path = self
            .record_path(&record.id)
            .ok_or_else(|| StoreError::Corrupt(format!("unsafe agent id: {}", record.id)))?;
        let file = RecordFile {
            version: RECORD_FILE_VERSION,
            record: record.clone(),
        };
        let json = serde_json::to_vec_pretty(&file)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        write_atomic(&path, &json)
    }

    fn update<F>(&self, id: &AgentId, f: F) -> StoreResult<()>
    where
        F: FnOnce(&mut CredentialRecord),
    {
        let _lock = self.lock()?;
        let mut record = self
            .find_by_id(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        f(&mut record);
        self.write_record(&record)
    }
}

impl CredentialStore for FileStore {
    fn find_by_name(&self, name: &str) -> StoreResult<Option<CredentialRecord>> {
        let path = self.name_path(name);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        // Claimed by an insert that has not written the id yet, or never will.
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let entry: NameFile = serde_json::from_str(&raw).map_err(|e| {
            StoreError::Corrupt(format!("failed to parse name file {}: {e}", path.display()))
        })?;

        match self.find_by_id(&entry.id)? {
            Some(record) if record.name == name => Ok(Some(record)),
            Some(record) => {
                log::warn!(
                    "name index for '{name}' points at agent {} named '{}'",
                    record.id,
                    record.name
                );
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn find_by_id(&self, id: &AgentId) -> StoreResult<Option<CredentialRecord>> {
        match self.record_path(id) {
            Some(path) => self.read_record(&path),
            None => Ok(None),
        }
    }

    fn insert(&self, record: CredentialRecord) -> StoreResult<()> {
        let _lock = self.lock()?;
        let name_path = self.name_path(&record.name);
        if self.is_stale_claim(&name_path)? {
            log::warn!("reclaiming abandoned name index entry for '{}'", record.name);
            std::fs::remove_file(&name_path)?;
        }

        let mut claim = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&name_path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::Conflict(record.name));
            }
            Err(e) => return Err(e.into()),
        };

        let entry = NameFile {
            version: RECORD_FILE_VERSION,
            id: record.id.clone(),
        };
        let written = serde_json::to_vec(&entry)
            .map_err(|e| StoreError::Corrupt(e.to_string()))
            .and_then(|json| claim.write_all(&json).map_err(StoreError::from))
            .and_then(|()| self.write_record(&record));

        if let Err(e) = written {
            // Release the name so a retry can succeed.
            drop(claim);
            let _ = std::fs::remove_file(&name_path);
            return Err(e);
        }
        Ok(())
    }

    fn update_last_auth(&self, id: &AgentId, timestamp: u64) -> StoreResult<()> {
        self.update(id, |record| record.last_auth_at = Some(timestamp))
    }

    fn set_active(&self, id: &AgentId, active: bool) -> StoreResult<()> {
        self.update(id, |record| record.active = active)
    }

    fn list(&self) -> StoreResult<Vec<CredentialRecord>> {
        let dir = self.base_dir.join(RECORDS_DIR);
        let mut records = Vec::new();

        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(record) = self.read_record(&path)? {
                records.push(record);
            }
        }

        Ok(records)
    }
}

/// Agent ids become file names; refuse anything that could leave the directory.
fn is_path_safe(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn write_atomic(path: &Path, data: &[u8]) -> StoreResult<()> {
    // Unique per writer so concurrent writers never share a temp file.
    let suffix = bs58::encode(random_bytes::<8>()).into_string();
    let tmp_path = path.with_extension(format!("json.{suffix}.tmp"));
    std::fs::write(&tmp_path, data)?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
