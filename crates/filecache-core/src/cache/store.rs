use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::diagnostics::DiagnosticHandler;

use super::codec::{from_bytes, to_bytes};
use super::{
    CacheDirProvider, Clock, ProjectCacheKey, Result, TimeConsistencyTable, CACHE_CATEGORY,
    TIME_DB_NAME,
};

/// How a [`CacheStore::load_with_status`] call produced its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// The file existed and decoded cleanly
    Loaded,
    /// No file under that name; the fallback was returned
    Missing,
    /// The file was corrupted, has been removed, and the fallback was returned
    Recovered,
}

/// Named, byte-serialized cache files under one directory
///
/// Every value is stored in its own file named by a logical name. Writes go
/// through a temporary file and a rename, so a reader never sees a partially
/// written file.
pub struct CacheStore {
    cache_dir: PathBuf,
    diagnostics: Arc<dyn DiagnosticHandler>,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    /// Open the store in the directory `provider` resolves for cache data
    pub fn new(
        provider: &dyn CacheDirProvider,
        diagnostics: Arc<dyn DiagnosticHandler>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        Self::with_category(provider, CACHE_CATEGORY, diagnostics, clock)
    }

    pub fn with_category(
        provider: &dyn CacheDirProvider,
        category: &str,
        diagnostics: Arc<dyn DiagnosticHandler>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let cache_dir = provider.cache_dir(category, diagnostics.as_ref())?;
        debug!("Using cache directory {:?}", cache_dir);

        Ok(Self {
            cache_dir,
            diagnostics,
            clock,
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn diagnostics(&self) -> &Arc<dyn DiagnosticHandler> {
        &self.diagnostics
    }

    /// Current time in Unix epoch seconds, as seen by this store's clock
    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    /// Full path of the cache file with the given logical name
    pub fn resolve_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(name)
    }

    /// Load the value stored under `name`, or `fallback` if there is none.
    ///
    /// A file that fails to decode is reported, removed and replaced by
    /// `fallback`. Other I/O errors are returned.
    pub fn load<T: DeserializeOwned>(&self, name: &str, fallback: T) -> Result<T> {
        self.load_with_status(name, fallback).map(|(value, _)| value)
    }

    /// Like [`CacheStore::load`], also telling whether the fallback was used
    /// because the file was missing or because it was corrupted.
    pub fn load_with_status<T: DeserializeOwned>(
        &self,
        name: &str,
        fallback: T,
    ) -> Result<(T, LoadStatus)> {
        let path = self.resolve_path(name);

        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No cache file at {:?}", path);
                return Ok((fallback, LoadStatus::Missing));
            }
            Err(e) => return Err(e.into()),
        };

        match from_bytes(&bytes) {
            Ok(value) => {
                debug!("Loaded cache file {:?} ({} bytes)", path, bytes.len());
                Ok((value, LoadStatus::Loaded))
            }
            Err(e) => {
                debug!("Corrupted cache file {:?}: {}", path, e);
                self.diagnostics.warning(
                    "The caching database is corrupted and will be removed. Each project \
                     will be re-cached automatically in the next run.",
                );
                self.delete_all(&[name]);
                Ok((fallback, LoadStatus::Recovered))
            }
        }
    }

    /// Serialize `value` and atomically replace the file stored under `name`
    pub fn save<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        let bytes = to_bytes(value)?;
        let path = self.resolve_path(name);

        std::fs::create_dir_all(&self.cache_dir)?;
        let mut file = NamedTempFile::new_in(&self.cache_dir)?;
        file.write_all(&bytes)?;
        file.as_file().sync_all()?;
        file.persist(&path).map_err(|e| e.error)?;

        debug!("Saved cache file {:?} ({} bytes)", path, bytes.len());
        Ok(())
    }

    /// Remove the named cache files.
    ///
    /// Returns `false` if any of them could not be removed (including files
    /// that did not exist), after reporting one warning that lists them.
    pub fn delete_all<N: AsRef<str>>(&self, names: &[N]) -> bool {
        let mut failed = Vec::new();

        for name in names {
            let name = name.as_ref();
            let path = self.resolve_path(name);
            match std::fs::remove_file(&path) {
                Ok(()) => debug!("Removed cache file {:?}", path),
                Err(e) => {
                    debug!("Failed to remove cache file {:?}: {}", path, e);
                    failed.push(name);
                }
            }
        }

        if failed.is_empty() {
            return true;
        }

        self.diagnostics.warning(&format!(
            "There was a problem deleting the following files: {}. Please delete them \
             manually from {}",
            failed.join(", "),
            self.cache_dir.display()
        ));
        false
    }

    /// Timestamp of the last successful run recorded for `key`
    pub fn last_recorded_run(&self, key: &ProjectCacheKey) -> Result<Option<i64>> {
        Ok(self.load_time_db()?.0.last_run(key))
    }

    /// Whether the clock has not gone backwards since the last recorded run
    /// of `key`. A project without a recorded run is not consistent.
    pub fn is_time_consistent(&self, key: &ProjectCacheKey) -> Result<bool> {
        Ok(self.load_time_db()?.0.is_consistent(key, self.now()))
    }

    /// Record "now" as the last successful run of `key`
    pub fn record_successful_run(&self, key: &ProjectCacheKey) -> Result<()> {
        let (mut time_db, _) = self.load_time_db()?;
        time_db.record(key.clone(), self.now());
        self.save(TIME_DB_NAME, &time_db)
    }

    /// The shared last-run table, with how it was loaded
    pub fn load_time_db(&self) -> Result<(TimeConsistencyTable, LoadStatus)> {
        self.load_with_status(TIME_DB_NAME, TimeConsistencyTable::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{FixedCacheDir, FixedClock};
    use crate::diagnostics::CollectingDiagnosticHandler;
    use tempfile::TempDir;

    fn test_store(temp_dir: &TempDir) -> (CacheStore, Arc<CollectingDiagnosticHandler>) {
        let diagnostics = Arc::new(CollectingDiagnosticHandler::new());
        let store = CacheStore::new(
            &FixedCacheDir::new(temp_dir.path()),
            diagnostics.clone(),
            Arc::new(FixedClock::new(1_000)),
        )
        .unwrap();
        (store, diagnostics)
    }

    #[test]
    fn test_resolve_path_under_category() {
        let temp_dir = TempDir::new().unwrap();
        let (store, _) = test_store(&temp_dir);

        assert_eq!(
            store.resolve_path("test_file"),
            temp_dir.path().join(CACHE_CATEGORY).join("test_file")
        );
    }

    #[test]
    fn test_load_missing_returns_fallback() {
        let temp_dir = TempDir::new().unwrap();
        let (store, diagnostics) = test_store(&temp_dir);

        let (value, status) = store.load_with_status("nonexistant_file", 42i64).unwrap();

        assert_eq!(value, 42);
        assert_eq!(status, LoadStatus::Missing);
        assert_eq!(diagnostics.warning_count(), 0);
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let (store, _) = test_store(&temp_dir);

        store.save("test_file", &vec![1i64, 2, 3]).unwrap();
        store.save("test_file", &vec![4i64]).unwrap();

        let names: Vec<_> = std::fs::read_dir(store.cache_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("test_file")]);
        assert_eq!(store.load("test_file", Vec::<i64>::new()).unwrap(), vec![4]);
    }

    #[test]
    fn test_record_successful_run_uses_clock() {
        let temp_dir = TempDir::new().unwrap();
        let (store, _) = test_store(&temp_dir);
        let key = ProjectCacheKey::from_project_dir(Path::new("/project")).unwrap();

        assert_eq!(store.last_recorded_run(&key).unwrap(), None);
        assert!(!store.is_time_consistent(&key).unwrap());

        store.record_successful_run(&key).unwrap();

        assert_eq!(store.last_recorded_run(&key).unwrap(), Some(1_000));
        assert!(store.is_time_consistent(&key).unwrap());
    }
}
