//! Time-bounded key/value cache shared by the image and news pipelines.
//!
//! Two kinds of values live here: base64 text of scaled JPEG photos (keyed
//! by image URL) and article lists (keyed by `source` or `source-test`).
//! Both go through the same [`ExpiringCache`] trait, so the acquisition and
//! news code never know whether the store is in memory or on disk.
//!
//! # Expiration
//!
//! Every entry carries an absolute expiration in epoch milliseconds. There is
//! no background sweep: [`ExpiringCache::get`] treats an entry whose
//! expiration has passed as a miss and evicts it on the spot. Eviction is
//! time-only; there is no size bound and no LRU.
//!
//! A lookup returns `Option<serde_json::Value>`. `None` is a miss, so a
//! legitimately cached JSON `null` (`Some(Value::Null)`) is never confused
//! with an absent key.
//!
//! # Storage
//!
//! [`FileCache`] keeps the same map as [`MemoryCache`] and rewrites a JSON
//! file after every `set`. The write goes to a sibling temp file which is
//! then renamed over the target, so a crash mid-write leaves the previous
//! file intact. A file that is missing, unreadable, corrupt or written by a
//! different format version loads as an empty cache. Expired entries are
//! dropped when the file is loaded and before every write, so the file only
//! ever holds live entries. Persist failures are
//! logged and otherwise ignored; the in-memory copy stays authoritative for
//! the rest of the run.

use serde_json::Value;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

/// Version of the on-disk cache format. Bump to discard existing cache files
/// when the entry layout changes.
const CACHE_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key/value store with per-entry absolute expiration.
///
/// Implementations guard their map with a mutex so a concurrent caller can
/// never interleave two read-modify-write cycles.
pub trait ExpiringCache: Send + Sync {
    /// Returns the value for `key`, or `None` if it is absent or expired.
    fn get(&self, key: &str) -> Option<Value>;

    /// Stores `value` under `key` until `expires_at_ms`, replacing any
    /// existing entry.
    fn set(&self, key: &str, value: Value, expires_at_ms: i64);
}

/// A single cached value.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CacheEntry {
    pub value: Value,
    pub expires_at_ms: i64,
}

impl CacheEntry {
    fn is_expired(&self, now_ms: i64) -> bool {
        now_ms > self.expires_at_ms
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Absolute expiration `ttl` from now.
pub fn expires_in(ttl: Duration) -> i64 {
    let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
    now_ms().saturating_add(ttl_ms)
}

// ============================================================================
// In-memory store
// ============================================================================

/// Process-local cache. Used directly for `--no-cache` runs and as the
/// backing map of [`FileCache`].
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_entries(entries: HashMap<String, CacheEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Number of stored entries, expired ones included until they are evicted.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_at(&self, key: &str, now_ms: i64) -> Option<Value> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.is_expired(now_ms) => {
                tracing::debug!(key, "cache entry expired");
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    /// Evict every entry expired at `now_ms`. Returns how many were removed.
    fn purge_expired(&self, now_ms: i64) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now_ms));
        before - entries.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        // Inserts and removes are single calls; a poisoned map is intact.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ExpiringCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        self.get_at(key, now_ms())
    }

    fn set(&self, key: &str, value: Value, expires_at_ms: i64) {
        self.lock().insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at_ms,
            },
        );
    }
}

// ============================================================================
// File-backed store
// ============================================================================

#[derive(serde::Serialize, serde::Deserialize)]
struct CacheFile {
    version: u32,
    entries: HashMap<String, CacheEntry>,
}

/// JSON-file cache. Loads once on open, persists after every `set`.
#[derive(Debug)]
pub struct FileCache {
    path: PathBuf,
    memory: MemoryCache,
    /// Serialises writers of the shared temp file.
    write_lock: Mutex<()>,
}

impl FileCache {
    /// Open the cache file at `path`. Never fails: anything short of a
    /// readable file of the current version starts an empty cache.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match load_entries(&path, now_ms()) {
            Ok(entries) => {
                tracing::debug!(path = %path.display(), count = entries.len(), "loaded cache");
                entries
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "starting with empty cache");
                HashMap::new()
            }
        };
        Self {
            path,
            memory: MemoryCache::from_entries(entries),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// Write the live entries to disk, evicting expired ones first.
    pub fn save(&self) -> Result<(), CacheError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let purged = self.memory.purge_expired(now_ms());
        if purged > 0 {
            tracing::debug!(path = %self.path.display(), purged, "dropped expired cache entries");
        }
        let file = CacheFile {
            version: CACHE_VERSION,
            entries: self.memory.lock().clone(),
        };
        let json = serde_json::to_vec(&file)?;
        write_atomic(&self.path, &json)?;
        Ok(())
    }
}

impl ExpiringCache for FileCache {
    fn get(&self, key: &str) -> Option<Value> {
        self.memory.get(key)
    }

    fn set(&self, key: &str, value: Value, expires_at_ms: i64) {
        self.memory.set(key, value, expires_at_ms);
        if let Err(e) = self.save() {
            tracing::error!(path = %self.path.display(), error = %e, "failed to persist cache");
        }
    }
}

fn load_entries(path: &Path, now_ms: i64) -> Result<HashMap<String, CacheEntry>, CacheError> {
    let content = std::fs::read(path)?;
    let file: CacheFile = serde_json::from_slice(&content)?;
    if file.version != CACHE_VERSION {
        return Ok(HashMap::new());
    }
    let mut entries = file.entries;
    entries.retain(|_, entry| !entry.is_expired(now_ms));
    Ok(entries)
}

/// Write `bytes` to `path` via a temp file in the same directory plus rename.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut tmp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)
}
