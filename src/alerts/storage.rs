//! Local key-value storage.

use super::AlertError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Single-user string store, one value per key.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, AlertError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), AlertError>;
}

/// One file per key under a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, AlertError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(AlertError::Io { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AlertError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| AlertError::Io {
            path: self.dir.clone(),
            source,
        })?;

        // Write-then-rename so a crash never leaves half a file
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value).map_err(|source| AlertError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &path).map_err(|source| AlertError::Io { path, source })?;
        Ok(())
    }
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, AlertError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AlertError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_roundtrip_and_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("nested"));

        assert_eq!(store.get("absent").unwrap(), None);
        store.set("key", "[1,2]").unwrap();
        assert_eq!(store.get("key").unwrap().as_deref(), Some("[1,2]"));
        assert!(dir.path().join("nested/key.json").exists());
    }
}
