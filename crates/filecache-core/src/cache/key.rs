use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use super::{CacheError, Result};

/// Stable identifier for a project, derived from its root directory
///
/// Blake3 of the UTF-8 path, hex encoded. The same directory string always
/// produces the same key; the key doubles as the project's cache file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectCacheKey(String);

impl ProjectCacheKey {
    pub fn from_project_dir(project_dir: &Path) -> Result<Self> {
        let dir = project_dir.to_str().ok_or_else(|| CacheError::NonUtf8Path {
            path: project_dir.to_path_buf(),
        })?;
        let hash = blake3::hash(dir.as_bytes());
        Ok(Self(hash.to_hex().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProjectCacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
