use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::{ProjectStore, PROJECTS_KEY};
use crate::error::{Error, Result};
use crate::state::data::ProjectMap;

/// Size-limited string key/value store backed by one JSON file.
///
/// Holds small client-local state (session token, unlock progress, theme)
/// and is the fallback when the blob store is unavailable. Every write is
/// flushed to disk; a write that would exceed the quota is rejected and
/// leaves the store unchanged.
///
/// The project map under `PROJECTS_KEY` is checked against everything in
/// the store, while the small-state keys are checked without it, so a large
/// fallback project map never blocks session or progress writes.
#[derive(Debug)]
pub struct LocalStore {
    path: Option<PathBuf>,
    quota: usize,
    entries: BTreeMap<String, String>,
}

impl LocalStore {
    /// Open the store file. A missing file starts empty; a corrupt one is
    /// discarded with a warning.
    pub fn open(path: &Path, quota: usize) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let entries = match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "local store is corrupt, starting empty");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path: Some(path.to_path_buf()),
            quota,
            entries,
        })
    }

    /// Store that lives only as long as the process
    pub fn in_memory(quota: usize) -> Self {
        Self {
            path: None,
            quota,
            entries: BTreeMap::new(),
        }
    }

    pub fn quota(&self) -> usize {
        self.quota
    }

    /// Bytes currently used by keys and values
    pub fn used(&self) -> usize {
        self.entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        let counted = self
            .entries
            .iter()
            .filter(|(k, _)| k.as_str() != key && (key == PROJECTS_KEY || k.as_str() != PROJECTS_KEY))
            .map(|(k, v)| k.len() + v.len())
            .sum::<usize>();
        let needed = counted + key.len() + value.len();
        if needed > self.quota {
            return Err(Error::QuotaExceeded {
                needed,
                quota: self.quota,
            });
        }

        let previous = self.entries.insert(key.to_string(), value);
        if let Err(e) = self.flush() {
            // Keep memory and disk in agreement
            match previous {
                Some(old) => self.entries.insert(key.to_string(), old),
                None => self.entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Result<bool> {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.flush()?;
        }
        Ok(removed)
    }

    /// Deserialize a JSON value; unreadable values read as absent
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key)?;
        serde_json::from_str(raw)
            .map_err(|e| warn!(key, error = %e, "ignoring unreadable local store value"))
            .ok()
    }

    pub fn set_json<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.set(key, json)
    }

    fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string(&self.entries)?)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl ProjectStore for LocalStore {
    fn load(&self) -> Result<Option<ProjectMap>> {
        match self.get(PROJECTS_KEY) {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, projects: &ProjectMap) -> Result<()> {
        self.set_json(PROJECTS_KEY, projects)
    }
}
