use crate::cache::{CacheDirProvider, CacheStore, Clock, FileCache, Result, SystemClock};
use crate::config::CacheConfig;
use crate::diagnostics::{DiagnosticHandler, TracingDiagnosticHandler};
use std::path::Path;
use std::sync::Arc;

/// Dependency injection container
/// Owns the shared collaborators and opens stores and caches wired to them
pub struct Container {
    config: Arc<CacheConfig>,
    diagnostic_handler: Arc<dyn DiagnosticHandler>,
    dir_provider: Arc<dyn CacheDirProvider>,
    clock: Arc<dyn Clock>,
}

impl Container {
    /// Create a new container with production dependencies
    pub fn new(config: CacheConfig) -> Self {
        let dir_provider: Arc<dyn CacheDirProvider> = Arc::from(config.dir_provider());

        Container {
            config: Arc::new(config),
            diagnostic_handler: Arc::new(TracingDiagnosticHandler::new()),
            dir_provider,
            clock: Arc::new(SystemClock),
        }
    }

    /// Create a container with custom dependencies (for testing)
    pub fn with_dependencies(
        config: CacheConfig,
        diagnostic_handler: Arc<dyn DiagnosticHandler>,
        dir_provider: Arc<dyn CacheDirProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Container {
            config: Arc::new(config),
            diagnostic_handler,
            dir_provider,
            clock,
        }
    }

    pub fn config(&self) -> &Arc<CacheConfig> {
        &self.config
    }

    pub fn diagnostic_handler(&self) -> &Arc<dyn DiagnosticHandler> {
        &self.diagnostic_handler
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostic_handler.warning_count()
    }

    /// Open the cache store in the configured directory
    pub fn open_store(&self) -> Result<CacheStore> {
        CacheStore::with_category(
            self.dir_provider.as_ref(),
            &self.config.category,
            self.diagnostic_handler.clone(),
            self.clock.clone(),
        )
    }

    /// Open the file cache of `project_dir`, flushing if either the config or
    /// `flush_cache` asks for it
    pub fn open_project(&self, project_dir: &Path, flush_cache: bool) -> Result<FileCache> {
        let store = self.open_store()?;
        FileCache::new(store, project_dir, flush_cache || self.config.flush_cache)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheOrigin, FixedCacheDir, FixedClock};
    use crate::diagnostics::CollectingDiagnosticHandler;
    use tempfile::TempDir;

    fn test_container(temp_dir: &TempDir, config: CacheConfig) -> Container {
        Container::with_dependencies(
            config,
            Arc::new(CollectingDiagnosticHandler::new()),
            Arc::new(FixedCacheDir::new(temp_dir.path())),
            Arc::new(FixedClock::new(1_000)),
        )
    }

    #[test]
    fn test_container_creation() {
        let container = Container::new(CacheConfig::default());

        assert_eq!(container.warning_count(), 0);
        assert_eq!(container.config().app_name, "filecache");
    }

    #[test]
    fn test_open_store_uses_configured_category() {
        let temp_dir = TempDir::new().unwrap();
        let config = CacheConfig {
            category: "files".to_string(),
            ..CacheConfig::default()
        };
        let container = test_container(&temp_dir, config);

        let store = container.open_store().unwrap();

        assert_eq!(store.cache_dir(), temp_dir.path().join("files"));
    }

    #[test]
    fn test_config_flush_applies_to_projects() {
        let temp_dir = TempDir::new().unwrap();
        let container = test_container(&temp_dir, CacheConfig::default());
        let project = Path::new("/project");

        let mut cache = container.open_project(project, false).unwrap();
        cache.compute_changed(&["a.c"]).unwrap();
        cache.commit().unwrap();

        let flushing = test_container(
            &temp_dir,
            CacheConfig {
                flush_cache: true,
                ..CacheConfig::default()
            },
        );
        let cache = flushing.open_project(project, false).unwrap();

        assert_eq!(cache.origin(), CacheOrigin::Flushed);
        assert!(cache.last_cache().is_empty());
    }
}
