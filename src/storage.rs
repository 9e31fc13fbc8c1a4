//! Key-value persistence for glowtasks
//!
//! State lives in a single data directory, one file per key:
//!
//! ```text
//! <data dir>/
//!   tasks           # JSON array of tasks
//!   theme           # "light" or "dark"
//!   tasks.corrupt   # raw copy of unreadable task data, if any
//!   config.toml     # optional configuration
//!   .lock           # write lock shared by every process
//! ```

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::error::{Error, Result};
use crate::lock::{self, FileLock, DEFAULT_LOCK_TIMEOUT_MS};

pub const TASKS_KEY: &str = "tasks";
pub const THEME_KEY: &str = "theme";
pub const CORRUPT_TASKS_KEY: &str = "tasks.corrupt";

pub const LOCK_FILE: &str = ".lock";
pub const CONFIG_FILE: &str = "config.toml";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "GLOWTASKS_HOME";

const FALLBACK_DATA_DIR: &str = ".glowtasks";

/// Minimal string key-value persistence.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Run `f` with no other writer able to interleave, so a read followed
    /// by a write inside `f` acts as one update.
    fn exclusive<T, F>(&mut self, f: F) -> Result<T>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<T>,
    {
        f(self)
    }
}

/// Pick the data directory: explicit path, then `GLOWTASKS_HOME`, then the
/// platform data dir, then `./.glowtasks`.
pub fn resolve_data_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Some(value) = std::env::var_os(DATA_DIR_ENV) {
        if !value.is_empty() {
            return PathBuf::from(value);
        }
    }
    ProjectDirs::from("", "", "glowtasks")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(FALLBACK_DATA_DIR))
}

/// Directory-backed store; each key maps to a file of the same name.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    lock_timeout_ms: u64,
    /// Set while `exclusive` holds the directory lock.
    lock_held: bool,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            lock_held: false,
        }
    }

    pub fn with_lock_timeout(mut self, timeout_ms: u64) -> Self {
        self.lock_timeout_ms = timeout_ms;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE)
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key != LOCK_FILE
            && key != CONFIG_FILE
            && !key.starts_with('.')
            && !key.contains(['/', '\\']);
        if !valid {
            return Err(Error::InvalidArgument(format!("invalid storage key '{key}'")));
        }
        Ok(self.dir.join(key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::Io(err)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.entry_path(key)?;
        if self.lock_held {
            lock::write_atomic(&path, value.as_bytes())?;
        } else {
            let _lock = FileLock::acquire(self.lock_path(), self.lock_timeout_ms)?;
            lock::write_atomic(&path, value.as_bytes())?;
        }
        tracing::trace!(key, bytes = value.len(), "stored entry");
        Ok(())
    }

    fn exclusive<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        if self.lock_held {
            return f(self);
        }
        let _lock = FileLock::acquire(self.lock_path(), self.lock_timeout_ms)?;
        self.lock_held = true;
        let result = f(self);
        self.lock_held = false;
        result
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_store_round_trips_entries() {
        let temp = TempDir::new().unwrap();
        let mut store = FileStore::new(temp.path().join("data"));

        assert_eq!(store.get(TASKS_KEY).unwrap(), None);
        store.set(TASKS_KEY, "[]").unwrap();
        store.set(THEME_KEY, "dark").unwrap();

        assert_eq!(store.get(TASKS_KEY).unwrap().as_deref(), Some("[]"));
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
        assert!(store.lock_path().exists());
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let temp = TempDir::new().unwrap();
        let mut store = FileStore::new(temp.path());

        for key in ["", "../tasks", "a/b", ".lock", "config.toml"] {
            assert!(matches!(
                store.set(key, "x"),
                Err(Error::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn file_store_times_out_when_lock_is_held() {
        let temp = TempDir::new().unwrap();
        let mut store = FileStore::new(temp.path()).with_lock_timeout(50);
        let _held = FileLock::acquire(store.lock_path(), 1000).unwrap();

        assert!(matches!(
            store.set(THEME_KEY, "dark"),
            Err(Error::LockFailed(_))
        ));
    }

    #[test]
    fn exclusive_writes_without_relocking() {
        let temp = TempDir::new().unwrap();
        let mut store = FileStore::new(temp.path()).with_lock_timeout(50);

        store
            .exclusive(|inner| {
                let current = inner.get(THEME_KEY)?;
                assert_eq!(current, None);
                inner.set(THEME_KEY, "dark")?;
                assert!(FileLock::try_acquire(inner.lock_path())?.is_none());
                Ok(())
            })
            .unwrap();

        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
        assert!(FileLock::try_acquire(store.lock_path()).unwrap().is_some());
    }

    #[test]
    fn exclusive_times_out_when_lock_is_held() {
        let temp = TempDir::new().unwrap();
        let mut store = FileStore::new(temp.path()).with_lock_timeout(50);
        let _held = FileLock::acquire(store.lock_path(), 1000).unwrap();

        let result = store.exclusive(|inner| inner.set(THEME_KEY, "dark"));
        assert!(matches!(result, Err(Error::LockFailed(_))));
        assert_eq!(store.get(THEME_KEY).unwrap(), None);
    }

    #[test]
    fn memory_store_starts_empty() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get(THEME_KEY).unwrap(), None);
        store.set(THEME_KEY, "light").unwrap();
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("light"));
    }

    #[test]
    fn explicit_data_dir_wins() {
        let dir = resolve_data_dir(Some(Path::new("/tmp/glow")));
        assert_eq!(dir, PathBuf::from("/tmp/glow"));
    }
}
