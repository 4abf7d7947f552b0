use std::path::{Path, PathBuf};
use tracing::debug;

use crate::diagnostics::DiagnosticHandler;

use super::{CacheError, Result};

/// Resolves the directory that holds persisted cache files.
///
/// `category` separates unrelated kinds of user data (the cache uses
/// [`super::CACHE_CATEGORY`]). The returned directory exists on success.
pub trait CacheDirProvider: Send + Sync {
    fn cache_dir(&self, category: &str, diagnostics: &dyn DiagnosticHandler) -> Result<PathBuf>;
}

/// Platform user cache directory, e.g. `~/.cache/<app>/<category>` on Linux
#[derive(Debug, Clone)]
pub struct UserCacheDir {
    app_name: String,
}

impl UserCacheDir {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

impl CacheDirProvider for UserCacheDir {
    fn cache_dir(&self, category: &str, diagnostics: &dyn DiagnosticHandler) -> Result<PathBuf> {
        let Some(base) = dirs::cache_dir() else {
            diagnostics.warning(
                "Unable to locate a user cache directory. Set FILECACHE_DIR or pass an \
                 explicit cache directory.",
            );
            return Err(CacheError::MissingCacheDir);
        };

        ensure_dir(base.join(&self.app_name).join(category))
    }
}

/// Fixed root directory, with the category appended
#[derive(Debug, Clone)]
pub struct FixedCacheDir {
    root: PathBuf,
}

impl FixedCacheDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl CacheDirProvider for FixedCacheDir {
    fn cache_dir(&self, category: &str, _diagnostics: &dyn DiagnosticHandler) -> Result<PathBuf> {
        ensure_dir(self.root.join(category))
    }
}

fn ensure_dir(dir: PathBuf) -> Result<PathBuf> {
    if !dir.is_dir() {
        debug!("Creating cache directory {:?}", dir);
        std::fs::create_dir_all(&dir)?;
    }
    Ok(dir)
}
