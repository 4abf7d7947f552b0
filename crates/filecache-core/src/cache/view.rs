use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Stamp for a tracked file that has never been confirmed unchanged
pub const NEW_FILE_SENTINEL: i64 = -1;

/// One project's record of when each tracked file was last verified
///
/// Maps a file path to the Unix epoch second of its last verification, or
/// [`NEW_FILE_SENTINEL`]. Persisted as a plain map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheView {
    entries: FxHashMap<PathBuf, i64>,
}

impl CacheView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &Path) -> Option<i64> {
        self.entries.get(path).copied()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Start tracking `path` as a new file, replacing any previous stamp
    pub fn track_new(&mut self, path: PathBuf) {
        self.entries.insert(path, NEW_FILE_SENTINEL);
    }

    pub fn insert(&mut self, path: PathBuf, stamp: i64) {
        self.entries.insert(path, stamp);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, i64)> {
        self.entries.iter().map(|(path, stamp)| (path.as_path(), *stamp))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&PathBuf, &mut i64)> {
        self.entries.iter_mut()
    }
}

impl FromIterator<(PathBuf, i64)> for CacheView {
    fn from_iter<I: IntoIterator<Item = (PathBuf, i64)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_new_uses_sentinel() {
        let mut view = CacheView::new();
        view.track_new(PathBuf::from("test.c"));
        view.track_new(PathBuf::from("file.py"));

        assert_eq!(view.len(), 2);
        assert_eq!(view.get(Path::new("test.c")), Some(NEW_FILE_SENTINEL));
        assert_eq!(view.get(Path::new("file.py")), Some(NEW_FILE_SENTINEL));
    }

    #[test]
    fn test_track_new_resets_stamp() {
        let mut view: CacheView = [(PathBuf::from("a.c"), 42)].into_iter().collect();
        view.track_new(PathBuf::from("a.c"));

        assert_eq!(view.get(Path::new("a.c")), Some(NEW_FILE_SENTINEL));
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let view: CacheView = [(PathBuf::from("/src/a.c"), 7)].into_iter().collect();

        let json = serde_json::to_string(&view).unwrap();
        assert_eq!(json, r#"{"/src/a.c":7}"#);
    }
}
