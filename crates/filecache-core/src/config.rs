use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cache::{CacheDirProvider, FixedCacheDir, Result, UserCacheDir, CACHE_CATEGORY};

/// Environment variable that overrides the cache root
pub const CACHE_DIR_ENV: &str = "FILECACHE_DIR";

/// File cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    /// Cache root overriding the platform user cache directory
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Directory name under the platform cache root (default: filecache)
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Subdirectory holding cache files (default: caching)
    #[serde(default = "default_category")]
    pub category: String,

    /// Discard stored state on open (default: false)
    #[serde(default)]
    pub flush_cache: bool,
}

fn default_app_name() -> String {
    "filecache".to_string()
}

fn default_category() -> String {
    CACHE_CATEGORY.to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            app_name: default_app_name(),
            category: default_category(),
            flush_cache: false,
        }
    }
}

/// Values given on the command line, applied over a loaded config
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub cache_dir: Option<PathBuf>,
    pub flush_cache: Option<bool>,
}

impl CacheConfig {
    /// Load configuration from a YAML (or JSON) file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CacheConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Default configuration with the cache root taken from `FILECACHE_DIR`
    pub fn from_env() -> Self {
        Self {
            cache_dir: std::env::var_os(CACHE_DIR_ENV).map(PathBuf::from),
            ..Self::default()
        }
    }

    pub fn merge_cli(&mut self, overrides: &CliOverrides) {
        if let Some(ref cache_dir) = overrides.cache_dir {
            self.cache_dir = Some(cache_dir.clone());
        }
        if let Some(flush_cache) = overrides.flush_cache {
            self.flush_cache = flush_cache;
        }
    }

    /// Directory provider honoring the cache root override
    pub fn dir_provider(&self) -> Box<dyn CacheDirProvider> {
        match self.cache_dir {
            Some(ref root) => Box::new(FixedCacheDir::new(root.clone())),
            None => Box::new(UserCacheDir::new(self.app_name.clone())),
        }
    }
}
