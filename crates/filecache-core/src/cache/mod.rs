//! Modification-time change detection for incremental analysis
//!
//! A [`FileCache`] remembers, per project, when each file was last verified
//! and reports which files changed since. State lives in a [`CacheStore`]:
//! one bincode file per project (named by its [`ProjectCacheKey`]) plus a
//! shared [`TimeConsistencyTable`] that records each project's last
//! successful run, so a clock that jumped backwards forces a flush instead of
//! hiding changes.

mod cache_dir;
mod clock;
mod codec;
mod error;
mod file_cache;
mod key;
mod store;
mod time_db;
mod view;

pub use cache_dir::{CacheDirProvider, FixedCacheDir, UserCacheDir};
pub use clock::{epoch_seconds, Clock, FixedClock, SystemClock};
pub use codec::PAYLOAD_LIMIT_BYTES;
pub use error::{CacheError, Result};
pub use file_cache::{get_changed_files, CacheOrigin, FileCache};
pub use key::ProjectCacheKey;
pub use store::{CacheStore, LoadStatus};
pub use time_db::TimeConsistencyTable;
pub use view::{CacheView, NEW_FILE_SENTINEL};

/// Bumped whenever the on-disk layout of cache files changes
pub const CACHE_VERSION: u32 = 1;

/// Leading bytes of every cache file
pub const CACHE_MAGIC: &[u8; 4] = b"FCCH";

/// Category of user data the cache directory is resolved for
pub const CACHE_CATEGORY: &str = "caching";

/// Logical name of the shared last-run table
pub const TIME_DB_NAME: &str = "time_db";
