use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::clock::epoch_seconds;
use super::{CacheStore, CacheView, LoadStatus, ProjectCacheKey, Result, NEW_FILE_SENTINEL};

/// Where the view a [`FileCache`] started from came from
///
/// Every variant but `Loaded` starts from an empty view, and change detection
/// treats them all as a first run. The distinction is informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOrigin {
    /// A stored view was loaded
    Loaded,
    /// Nothing was stored for this project yet
    FirstRun,
    /// The stored view was corrupted and has been discarded
    Recovered,
    /// The caller asked for a flush
    Flushed,
    /// The system clock is behind the project's last recorded run
    ClockRollback,
}

/// Change tracking for the files of one project
///
/// Only one `FileCache` per project may be live at a time. Nothing guards
/// against two instances (or two processes) committing over each other.
pub struct FileCache {
    store: CacheStore,
    project_dir: PathBuf,
    key: ProjectCacheKey,
    data: CacheView,
    changed_files: FxHashSet<PathBuf>,
    origin: CacheOrigin,
}

impl FileCache {
    /// Open the cache for `project_dir`.
    ///
    /// Starts empty when `flush_cache` is set or when the clock check for
    /// the project fails; otherwise loads the stored view.
    pub fn new(store: CacheStore, project_dir: &Path, flush_cache: bool) -> Result<Self> {
        let key = ProjectCacheKey::from_project_dir(project_dir)?;

        let (time_db, time_db_status) = store.load_time_db()?;

        let (data, origin) = if !time_db.is_consistent(&key, store.now()) {
            store.diagnostics().warning(
                "It seems like you went back in time - your system time is behind the last \
                 recorded run time on this project. The cache will be flushed and rebuilt.",
            );
            store
                .diagnostics()
                .info("The file cache was successfully flushed.");
            let origin = match (time_db_status, time_db.last_run(&key)) {
                (LoadStatus::Recovered, _) => CacheOrigin::Recovered,
                (_, Some(_)) => CacheOrigin::ClockRollback,
                (_, None) => CacheOrigin::FirstRun,
            };
            (CacheView::new(), origin)
        } else if flush_cache {
            store
                .diagnostics()
                .info("The file cache was successfully flushed.");
            (CacheView::new(), CacheOrigin::Flushed)
        } else {
            let (data, status) = store.load_with_status(key.as_str(), CacheView::new())?;
            let origin = match status {
                LoadStatus::Loaded => CacheOrigin::Loaded,
                LoadStatus::Missing => CacheOrigin::FirstRun,
                LoadStatus::Recovered => CacheOrigin::Recovered,
            };
            (data, origin)
        };

        debug!(
            "Opened file cache {} for {:?} with {} entries ({:?})",
            key,
            project_dir,
            data.len(),
            origin
        );

        Ok(Self {
            store,
            project_dir: project_dir.to_path_buf(),
            key,
            data,
            changed_files: FxHashSet::default(),
            origin,
        })
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn key(&self) -> &ProjectCacheKey {
        &self.key
    }

    pub fn origin(&self) -> CacheOrigin {
        self.origin
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Last verified time of every tracked file
    pub fn last_cache(&self) -> &CacheView {
        &self.data
    }

    /// Files reported changed since the last commit
    pub fn changed_files(&self) -> &FxHashSet<PathBuf> {
        &self.changed_files
    }

    /// Report which of `files` changed since they were last verified.
    ///
    /// Untracked files are reported and start being tracked. On an empty
    /// view every file is reported without looking at the filesystem. The
    /// result keeps the order of `files`.
    ///
    /// If a tracked file cannot be stat'ed the query fails without tracking
    /// anything, and every tracked file it named stays unverified until a
    /// later commit.
    pub fn compute_changed<P: AsRef<Path>>(&mut self, files: &[P]) -> Result<Vec<PathBuf>> {
        let mut changed = Vec::new();
        let mut new_files = Vec::new();

        // Nothing is tracked until every file has been checked
        if self.data.is_empty() {
            changed.extend(files.iter().map(|f| f.as_ref().to_path_buf()));
            new_files.clone_from(&changed);
        } else {
            for file in files {
                let path = file.as_ref();
                match self.data.get(path) {
                    Some(last_run) => match modified_time(path) {
                        Ok(modified) if modified > last_run => changed.push(path.to_path_buf()),
                        Ok(_) => {}
                        Err(e) => {
                            // Tracked files of a failed query are left unverified
                            // so a later commit cannot stamp them
                            let tracked: Vec<PathBuf> = files
                                .iter()
                                .map(AsRef::<Path>::as_ref)
                                .filter(|f| self.data.contains(f))
                                .map(Path::to_path_buf)
                                .collect();
                            self.add_to_changed_files(tracked);
                            return Err(e);
                        }
                    },
                    None => {
                        new_files.push(path.to_path_buf());
                        changed.push(path.to_path_buf());
                    }
                }
            }
        }

        self.track_new_files(new_files);
        debug!("{} of {} files changed", changed.len(), files.len());
        self.add_to_changed_files(changed.iter().cloned());
        Ok(changed)
    }

    /// Start tracking `new_files` as never verified
    pub fn track_new_files<I: IntoIterator<Item = PathBuf>>(&mut self, new_files: I) {
        for new_file in new_files {
            self.data.track_new(new_file);
        }
    }

    /// Remember `changed_files` as changed until the next commit
    pub fn add_to_changed_files<I: IntoIterator<Item = PathBuf>>(&mut self, changed_files: I) {
        self.changed_files.extend(changed_files);
    }

    /// Stamp verified files with the current time and persist the view.
    ///
    /// Files still carrying the new-file sentinel and files not reported
    /// changed since the last commit get the new stamp. Files reported
    /// changed keep their old stamp until a later commit.
    pub fn commit(&mut self) -> Result<()> {
        let now = self.store.now();

        for (path, stamp) in self.data.iter_mut() {
            if *stamp == NEW_FILE_SENTINEL || !self.changed_files.contains(path) {
                *stamp = now;
            }
        }

        self.store.save(self.key.as_str(), &self.data)?;
        self.store.record_successful_run(&self.key)?;
        self.changed_files.clear();

        info!(
            "Saved file cache for {:?} with {} entries",
            self.project_dir,
            self.data.len()
        );
        Ok(())
    }
}

/// Files among `files` that need analysis.
///
/// Without a cache every file does.
pub fn get_changed_files<P: AsRef<Path>>(
    files: &[P],
    cache: Option<&mut FileCache>,
) -> Result<Vec<PathBuf>> {
    match cache {
        Some(cache) => cache.compute_changed(files),
        None => Ok(files.iter().map(|f| f.as_ref().to_path_buf()).collect()),
    }
}

fn modified_time(path: &Path) -> Result<i64> {
    let modified = std::fs::metadata(path)?.modified()?;
    Ok(epoch_seconds(modified))
}
