use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::ProjectCacheKey;

/// Last successful cache write per project, in Unix epoch seconds
///
/// Shared by every project using the same cache directory. Used to detect a
/// system clock that has gone backwards since the previous run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeConsistencyTable {
    last_runs: FxHashMap<ProjectCacheKey, i64>,
}

impl TimeConsistencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_run(&self, key: &ProjectCacheKey) -> Option<i64> {
        self.last_runs.get(key).copied()
    }

    pub fn record(&mut self, key: ProjectCacheKey, now: i64) {
        self.last_runs.insert(key, now);
    }

    /// True iff a run is recorded for `key` and it is not after `now`
    pub fn is_consistent(&self, key: &ProjectCacheKey, now: i64) -> bool {
        self.last_run(key).is_some_and(|last| last <= now)
    }

    pub fn len(&self) -> usize {
        self.last_runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_runs.is_empty()
    }
}
