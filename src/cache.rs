//! Image dimension cache for repeated conversions.
//!
//! Documentation trees tend to embed the same screenshots run after run.
//! This module remembers the dimensions probed for each image so later runs
//! answer from the cache instead of decoding headers again.
//!
//! # Design
//!
//! The cache is **content-addressed**: entries are keyed by the SHA-256 of
//! the image file, not by its path. Renaming or moving an image keeps its
//! entry valid; editing the image changes its hash and forces a new probe.
//! Content hashes rather than mtimes so the cache survives `git checkout`
//! (which resets modification times).
//!
//! Only successful probes are stored. An image that fails to probe is
//! retried on the next run, so fixing a broken asset needs no cache bust.
//!
//! ## Storage
//!
//! The cache is a JSON file at `<output_dir>/.md2storage-cache.json`. It
//! lives alongside the converted documents so it travels with the output
//! directory when cached in CI.
//!
//! ## Bypassing the cache
//!
//! Pass `--no-cache` to `convert` to start from an empty cache. The file is
//! rewritten at the end of the run.

use crate::imaging::{Dimensions, ImageBackend, ProbeError};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Name of the cache file within the output directory.
const CACHE_FILENAME: &str = ".md2storage-cache.json";

/// Version of the cache file format. Bump this to invalidate all existing
/// caches when the format or key computation changes.
const CACHE_VERSION: u32 = 1;

/// On-disk map from source content hash to probed dimensions.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DimensionCache {
    pub version: u32,
    pub entries: HashMap<String, Dimensions>,
}

impl DimensionCache {
    /// Create an empty cache (used for `--no-cache` or first run).
    pub fn empty() -> Self {
        Self {
            version: CACHE_VERSION,
            entries: HashMap::new(),
        }
    }

    /// Load from the output directory. Returns an empty cache if the file
    /// doesn't exist or can't be parsed (version mismatch, corruption).
    /// Entries with a zero side are dropped; no probe ever produces one.
    pub fn load(output_dir: &Path) -> Self {
        let content = match std::fs::read_to_string(cache_path(output_dir)) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        let mut cache: Self = match serde_json::from_str(&content) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring unreadable dimension cache");
                return Self::empty();
            }
        };
        if cache.version != CACHE_VERSION {
            return Self::empty();
        }
        let before = cache.entries.len();
        cache
            .entries
            .retain(|_, dims| dims.width > 0 && dims.height > 0);
        if cache.entries.len() < before {
            tracing::debug!(
                dropped = before - cache.entries.len(),
                "ignoring zero-sized dimension cache entries"
            );
        }
        cache
    }

    /// Save to the output directory.
    pub fn save(&self, output_dir: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(cache_path(output_dir), json)
    }

    pub fn get(&self, source_hash: &str) -> Option<Dimensions> {
        self.entries.get(source_hash).copied()
    }

    pub fn insert(&mut self, source_hash: String, dimensions: Dimensions) {
        self.entries.insert(source_hash, dimensions);
    }
}

/// Resolve the cache file path for an output directory.
pub fn cache_path(output_dir: &Path) -> PathBuf {
    output_dir.join(CACHE_FILENAME)
}

/// SHA-256 hash of a file's contents, returned as a hex string.
///
/// Streams the file so large assets are never held in memory.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Summary of cache performance for a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} probed ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} probed", self.misses)
        }
    }
}

/// Backend wrapper that answers from a [`DimensionCache`] before probing.
///
/// Shared by every rayon worker, so the cache and stats sit behind mutexes.
/// Hashing and probing happen outside the locks.
pub struct CachingBackend<B> {
    inner: B,
    cache: Mutex<DimensionCache>,
    stats: Mutex<CacheStats>,
}

impl<B: ImageBackend> CachingBackend<B> {
    pub fn new(inner: B, cache: DimensionCache) -> Self {
        Self {
            inner,
            cache: Mutex::new(cache),
            stats: Mutex::new(CacheStats::default()),
        }
    }

    pub fn stats(&self) -> CacheStats {
        *self.stats.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Consume the wrapper, returning the (possibly grown) cache for saving.
    pub fn into_cache(self) -> DimensionCache {
        self.cache.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl<B: ImageBackend> ImageBackend for CachingBackend<B> {
    fn identify(&self, path: &Path) -> Result<Dimensions, ProbeError> {
        let source_hash = hash_file(path)?;

        let cached = self
            .cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&source_hash);
        if let Some(dims) = cached {
            self.stats.lock().unwrap_or_else(|e| e.into_inner()).hit();
            return Ok(dims);
        }

        let dims = self.inner.identify(path)?;
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(source_hash, dims);
        self.stats.lock().unwrap_or_else(|e| e.into_inner()).miss();
        Ok(dims)
    }
}
