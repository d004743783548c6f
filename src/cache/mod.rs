//! # Cache Module
//!
//! Session-scoped key/value cache with per-entry TTLs, persisted as one JSON
//! file per session. Every failure here is recoverable: callers treat an error
//! as a miss and carry on.

mod file;
mod null;

pub use file::{CACHE_FILE_PREFIX, CACHE_FORMAT_VERSION, CacheEntry, CacheFile, Clock, FileCache};
pub(crate) use file::write_atomic;
pub use null::NullCache;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::config::Reader;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to encode cache value: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode cached value: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("cache i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to move {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Object-safe cache interface. Values travel as JSON; use [`CacheExt`] for
/// typed access.
pub trait Cache: Send + Sync {
    /// Stored value for `key`, or `None` when absent or expired.
    fn get_value(&self, key: &str) -> Option<serde_json::Value>;

    fn set_value(&self, key: &str, value: serde_json::Value, ttl: Duration);

    fn delete(&self, key: &str);

    /// Persist pending changes. A no-op when nothing changed.
    fn save(&self) -> Result<(), CacheError>;

    /// Remove stale files left behind by other sessions. Returns how many were removed.
    fn cleanup(&self) -> Result<usize, CacheError>;

    /// Save, then occasionally clean up.
    fn close(&self) -> Result<(), CacheError>;
}

pub trait CacheExt: Cache {
    /// Typed read. A stored value that fails to decode is an error, not a miss.
    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.get_value(key) {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(CacheError::Decode),
            None => Ok(None),
        }
    }

    /// Typed write. Nothing is stored if `value` fails to serialize.
    fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) -> Result<(), CacheError> {
        let encoded = serde_json::to_value(value).map_err(CacheError::Encode)?;
        self.set_value(key, encoded, ttl);
        Ok(())
    }
}

impl<C: Cache + ?Sized> CacheExt for C {}

/// Default cache directory: `$CCSTATUS_CACHE_DIR`, else the user cache dir, else the temp dir.
pub fn default_cache_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CCSTATUS_CACHE_DIR") {
        let dir = dir.trim();
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    directories::BaseDirs::new()
        .map(|b| b.cache_dir().join("ccstatus"))
        .unwrap_or_else(|| std::env::temp_dir().join("ccstatus"))
}

/// Build the session cache from configuration.
///
/// `cache.enabled: false` or `CCSTATUS_NO_CACHE=1` selects the [`NullCache`].
pub fn new_cache(config: &Reader, session_id: &str) -> Arc<dyn Cache> {
    let enabled = config.get("cache.enabled", true) && !crate::utils::env_flag("CCSTATUS_NO_CACHE");
    if !enabled {
        debug!("session cache disabled");
        return Arc::new(NullCache);
    }

    let dir = config
        .get::<Option<String>>("cache.dir", None)
        .filter(|d| !d.trim().is_empty())
        .map(|d| crate::utils::expand_home(&d))
        .unwrap_or_else(default_cache_dir);
    Arc::new(FileCache::open(dir, session_id))
}
