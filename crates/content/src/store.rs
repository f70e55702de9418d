use std::{
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
    time::SystemTime,
};

use {
    roster_config::{ContentConfig, ReloadPolicy},
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use roster_metrics::{content as content_metrics, counter, gauge, labels};

use crate::{
    error::{Error, Result},
    table::ContentTable,
};

/// Modification time and size of the table file when it was parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

impl FileStamp {
    fn of(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path).map_err(|e| Error::data_source(path, e))?;
        Ok(Self {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

struct CachedTable {
    table: Arc<ContentTable>,
    stamp: FileStamp,
}

/// Hands out immutable table snapshots, re-reading the file according to
/// its [`ReloadPolicy`].
///
/// Snapshots are `Arc`s, so a request keeps the table it started with even
/// if another request triggers a reload.
pub struct ContentStore {
    path: PathBuf,
    policy: ReloadPolicy,
    cache: RwLock<Option<CachedTable>>,
}

impl ContentStore {
    pub fn new(path: impl Into<PathBuf>, policy: ReloadPolicy) -> Self {
        Self {
            path: path.into(),
            policy,
            cache: RwLock::new(None),
        }
    }

    pub fn from_config(config: &ContentConfig) -> Self {
        Self::new(config.path.clone(), config.reload)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> ReloadPolicy {
        self.policy
    }

    /// Current table snapshot.
    pub fn snapshot(&self) -> Result<Arc<ContentTable>> {
        if self.policy == ReloadPolicy::Always {
            return self.load().map(Arc::new);
        }

        let stamp = FileStamp::of(&self.path).inspect_err(|_| self.invalidate())?;
        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(cached) = cache.as_ref()
                && cached.stamp == stamp
            {
                return Ok(Arc::clone(&cached.table));
            }
        }

        match self.load() {
            Ok(table) => {
                let table = Arc::new(table);
                info!(
                    path = %self.path.display(),
                    rows = table.len(),
                    "content table loaded"
                );
                for (name, action, row) in table.duplicates() {
                    warn!(name, action, row, "duplicate row ignored, first match wins");
                }
                // The file may have been replaced while it was parsed.
                if FileStamp::of(&self.path).ok() != Some(stamp) {
                    debug!(path = %self.path.display(), "table changed during load, not cached");
                    return Ok(table);
                }
                let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
                *cache = Some(CachedTable {
                    table: Arc::clone(&table),
                    stamp,
                });
                Ok(table)
            },
            Err(e) => {
                self.invalidate();
                Err(e)
            },
        }
    }

    fn load(&self) -> Result<ContentTable> {
        let result = ContentTable::load(&self.path);
        #[cfg(feature = "metrics")]
        {
            let outcome = if result.is_ok() { "ok" } else { "error" };
            counter!(content_metrics::TABLE_RELOADS_TOTAL, labels::RESULT => outcome).increment(1);
            if let Ok(table) = &result {
                gauge!(content_metrics::TABLE_ROWS).set(table.len() as f64);
            }
        }
        result
    }

    /// Drop the cached snapshot; the next [`snapshot`](Self::snapshot)
    /// re-reads the file.
    pub fn invalidate(&self) {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        if cache.take().is_some() {
            debug!(path = %self.path.display(), "content cache invalidated");
        }
    }
}
