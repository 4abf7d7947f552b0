pub mod cache;
pub mod config;
pub mod di;
pub mod diagnostics;

pub use cache::{
    get_changed_files, CacheError, CacheOrigin, CacheStore, CacheView, FileCache, LoadStatus,
    ProjectCacheKey, TimeConsistencyTable, NEW_FILE_SENTINEL,
};
pub use config::{CacheConfig, CliOverrides};
pub use di::Container;
pub use diagnostics::{
    CollectingDiagnosticHandler, Diagnostic, DiagnosticHandler, DiagnosticLevel,
    TracingDiagnosticHandler,
};
