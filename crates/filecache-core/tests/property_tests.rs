//! Property-based tests for the file cache
//!
//! These use proptest to check the persistence round trip and the first-run
//! behavior of change detection over arbitrary inputs.

use filecache_core::cache::{
    CacheStore, CacheView, FileCache, FixedCacheDir, FixedClock, LoadStatus, CACHE_MAGIC,
    NEW_FILE_SENTINEL,
};
use filecache_core::diagnostics::CollectingDiagnosticHandler;
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

fn open_store(temp_dir: &TempDir) -> CacheStore {
    CacheStore::new(
        &FixedCacheDir::new(temp_dir.path()),
        Arc::new(CollectingDiagnosticHandler::new()),
        Arc::new(FixedClock::new(1_700_000_000)),
    )
    .unwrap()
}

fn path_strategy() -> impl Strategy<Value = PathBuf> {
    "/[a-z]{1,8}(/[a-z0-9_]{1,8}){0,3}\\.[a-z]{1,3}".prop_map(PathBuf::from)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn saved_view_loads_back(
        entries in prop::collection::btree_map(path_strategy(), -1i64..i64::MAX, 0..32),
        fallback in prop::collection::btree_map(path_strategy(), -1i64..10, 0..4),
    ) {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);
        let view: CacheView = entries.into_iter().collect();

        store.save("view", &view).unwrap();
        let fallback: CacheView = fallback.into_iter().collect();
        let loaded = store.load("view", fallback).unwrap();

        prop_assert_eq!(loaded, view);
    }

    #[test]
    fn saved_nested_maps_load_back(
        value in prop::collection::btree_map(
            "[a-z]{1,6}",
            prop::collection::btree_map("[a-z]{1,6}", any::<i64>(), 0..4),
            0..8,
        ),
    ) {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);

        store.save("nested", &value).unwrap();
        let loaded: BTreeMap<String, BTreeMap<String, i64>> =
            store.load("nested", BTreeMap::new()).unwrap();

        prop_assert_eq!(loaded, value);
    }

    #[test]
    fn first_run_reports_every_file(
        files in prop::collection::vec(path_strategy(), 1..24),
    ) {
        let temp_dir = TempDir::new().unwrap();
        let project = temp_dir.path().join("project");
        let mut cache = FileCache::new(open_store(&temp_dir), &project, true).unwrap();

        let changed = cache.compute_changed(&files).unwrap();

        prop_assert_eq!(&changed, &files);
        for file in &files {
            prop_assert_eq!(cache.last_cache().get(file), Some(NEW_FILE_SENTINEL));
        }
    }

    #[test]
    fn arbitrary_bytes_never_escape_load(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);
        std::fs::write(store.resolve_path("blob"), &bytes).unwrap();

        let (loaded, status) = store.load_with_status("blob", CacheView::new()).unwrap();
        if !bytes.starts_with(CACHE_MAGIC) {
            prop_assert_eq!(status, LoadStatus::Recovered);
            prop_assert!(loaded.is_empty());
        }
        if status == LoadStatus::Recovered {
            prop_assert!(!store.resolve_path("blob").exists());
        }
    }
}
