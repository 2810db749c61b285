//! File-based cache with an optional in-memory layer
//!
//! Holds the offline worker snapshot and the pending location handed over
//! from sign-up. Keys are hashed, values are stored as JSON next to a small
//! metadata file carrying expiry and an integrity hash.
//!
//! # Example
//!
//! ```rust,ignore
//! use workkar_core::cache::{Cache, CacheConfig};
//!
//! let cache = Cache::new(CacheConfig::default())?;
//! cache.set("workers", &rows, None)?;
//!
//! if let Some(hit) = cache.get_entry::<Vec<serde_json::Value>>("workers")? {
//!     println!("{} rows stored at {}", hit.value.len(), hit.stored_at);
//! }
//! ```

use crate::error::{Error, ErrorCode, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache directory path
    pub cache_dir: PathBuf,
    /// Default TTL in seconds (0 = no expiry)
    pub default_ttl_secs: u64,
    /// Enable in-memory caching
    pub memory_cache: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("workkar");

        Self {
            cache_dir,
            default_ttl_secs: 86_400,
            memory_cache: true,
        }
    }
}

/// Cache entry metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    created_at: u64,
    /// 0 = never
    expires_at: u64,
    hash: String,
}

/// A cache hit together with the time it was written
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    /// Stored value
    pub value: T,
    /// Unix seconds at which the value was stored
    pub stored_at: u64,
}

/// File-based cache with optional in-memory layer
pub struct Cache {
    config: CacheConfig,
    memory: Option<RwLock<HashMap<String, (CacheEntry, Vec<u8>)>>>,
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("cache_dir", &self.config.cache_dir)
            .field("memory_cache", &self.memory.is_some())
            .finish()
    }
}

impl Cache {
    /// Create a new cache instance, creating the directory if needed
    pub fn new(config: CacheConfig) -> Result<Self> {
        fs::create_dir_all(&config.cache_dir).map_err(|e| {
            Error::from(e).with_context(format!(
                "Creating cache directory {}",
                config.cache_dir.display()
            ))
        })?;

        let memory = config.memory_cache.then(|| RwLock::new(HashMap::new()));

        Ok(Self { config, memory })
    }

    /// Directory backing this cache
    #[must_use]
    pub fn dir(&self) -> &std::path::Path {
        &self.config.cache_dir
    }

    /// Get a cached value
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        Ok(self.get_entry(key)?.map(|hit| hit.value))
    }

    /// Get a cached value along with its storage time
    pub fn get_entry<T: DeserializeOwned>(&self, key: &str) -> Result<Option<Cached<T>>> {
        let cache_key = hash_hex(key.as_bytes());

        if let Some(ref memory) = self.memory {
            let guard = memory
                .read()
                .map_err(|_| Error::new(ErrorCode::Internal, "Failed to acquire cache read lock"))?;

            if let Some((entry, data)) = guard.get(&cache_key) {
                if !is_expired(entry) {
                    return Ok(Some(Cached {
                        value: serde_json::from_slice(data)?,
                        stored_at: entry.created_at,
                    }));
                }
            }
        }

        let entry_path = self.entry_path(&cache_key);
        let data_path = self.data_path(&cache_key);

        if !entry_path.exists() || !data_path.exists() {
            return Ok(None);
        }

        let entry: CacheEntry = serde_json::from_str(&fs::read_to_string(&entry_path)?)?;

        if is_expired(&entry) {
            let _ = fs::remove_file(&entry_path);
            let _ = fs::remove_file(&data_path);
            return Ok(None);
        }

        let data = fs::read(&data_path)?;

        // Corrupted entry
        if hash_hex(&data) != entry.hash {
            let _ = fs::remove_file(&entry_path);
            let _ = fs::remove_file(&data_path);
            return Ok(None);
        }

        let hit = Cached {
            value: serde_json::from_slice(&data)?,
            stored_at: entry.created_at,
        };

        if let Some(ref memory) = self.memory {
            if let Ok(mut guard) = memory.write() {
                guard.insert(cache_key, (entry, data));
            }
        }

        Ok(Some(hit))
    }

    /// Set a cached value; `ttl` of `None` uses the configured default
    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) -> Result<()> {
        let cache_key = hash_hex(key.as_bytes());
        let data = serde_json::to_vec(value)?;

        let now = now_secs();
        let ttl_secs = ttl.map_or(self.config.default_ttl_secs, |d| d.as_secs());

        let entry = CacheEntry {
            created_at: now,
            expires_at: if ttl_secs > 0 { now + ttl_secs } else { 0 },
            hash: hash_hex(&data),
        };

        fs::write(self.entry_path(&cache_key), serde_json::to_string(&entry)?)?;
        fs::write(self.data_path(&cache_key), &data)?;

        if let Some(ref memory) = self.memory {
            if let Ok(mut guard) = memory.write() {
                guard.insert(cache_key, (entry, data));
            }
        }

        Ok(())
    }

    /// Remove a cached value, returning whether it existed
    pub fn remove(&self, key: &str) -> Result<bool> {
        let cache_key = hash_hex(key.as_bytes());

        if let Some(ref memory) = self.memory {
            if let Ok(mut guard) = memory.write() {
                guard.remove(&cache_key);
            }
        }

        let entry_path = self.entry_path(&cache_key);
        let existed = entry_path.exists();
        let _ = fs::remove_file(&entry_path);
        let _ = fs::remove_file(self.data_path(&cache_key));

        Ok(existed)
    }

    /// Clear all cached values
    pub fn clear(&self) -> Result<()> {
        if let Some(ref memory) = self.memory {
            if let Ok(mut guard) = memory.write() {
                guard.clear();
            }
        }

        if self.config.cache_dir.exists() {
            for entry in fs::read_dir(&self.config.cache_dir)? {
                let path = entry?.path();
                let ours = path
                    .extension()
                    .is_some_and(|e| e == "meta" || e == "data");
                if ours {
                    let _ = fs::remove_file(path);
                }
            }
        }

        Ok(())
    }

    fn entry_path(&self, cache_key: &str) -> PathBuf {
        self.config.cache_dir.join(format!("{cache_key}.meta"))
    }

    fn data_path(&self, cache_key: &str) -> PathBuf {
        self.config.cache_dir.join(format!("{cache_key}.data"))
    }
}

fn hash_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn is_expired(entry: &CacheEntry) -> bool {
    entry.expires_at != 0 && now_secs() > entry.expires_at
}
