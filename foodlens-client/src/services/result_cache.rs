//! Barcode lookup result cache
//!
//! Keys pair a barcode with the allergy context used for the lookup, so a
//! profile change never serves a stale verdict. The context itself is only
//! stored as a hash.

use crate::models::BarcodeLookupOutcome;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Prefix of the storage form of a key
pub const BARCODE_CACHE_KEY_PREFIX: &str = "barcode_cache_";

/// How long a found product stays servable
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Stores between sweeps of expired entries
const PURGE_EVERY_INSERTS: usize = 256;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a over the UTF-16 code units of `input`
pub fn hash_context(input: &str) -> u32 {
    input.encode_utf16().fold(FNV_OFFSET_BASIS, |hash, unit| {
        (hash ^ u32::from(unit)).wrapping_mul(FNV_PRIME)
    })
}

/// Trim and lower-case; blank contexts collapse to `default`
pub fn normalize_cache_context(context: &str) -> String {
    let normalized = context.trim().to_lowercase();
    if normalized.is_empty() {
        "default".to_string()
    } else {
        normalized
    }
}

/// (barcode, allergy context) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    barcode: String,
    context_hash: u32,
}

impl CacheKey {
    pub fn new(barcode: &str, allergy_context: &str) -> Self {
        Self {
            barcode: barcode.trim().to_string(),
            context_hash: hash_context(&normalize_cache_context(allergy_context)),
        }
    }

    /// `barcode_cache_<barcode>_<hash hex>`
    pub fn storage_key(&self) -> String {
        format!("{}{}_{:x}", BARCODE_CACHE_KEY_PREFIX, self.barcode, self.context_hash)
    }
}

/// Lookup result store consulted before any network call
///
/// Storage failures are the implementation's concern; callers treat a failed
/// read as a miss.
#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Option<BarcodeLookupOutcome>;

    async fn set(&self, key: &CacheKey, outcome: &BarcodeLookupOutcome);
}

#[derive(Debug, Clone)]
struct CachedOutcome {
    outcome: BarcodeLookupOutcome,
    stored_at: Instant,
}

/// Process-local cache with a fixed time-to-live
#[derive(Debug)]
pub struct InMemoryResultCache {
    entries: RwLock<HashMap<CacheKey, CachedOutcome>>,
    ttl: Duration,
    inserts_since_purge: AtomicUsize,
}

impl InMemoryResultCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            inserts_since_purge: AtomicUsize::new(0),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
        tracing::info!("Barcode cache cleared");
    }

    /// Drop every expired entry, returning how many were removed
    ///
    /// Also runs on its own every few hundred stores, so keys that are never
    /// read again do not pile up in a long-running process.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        self.retain_fresh(&mut entries)
    }

    fn retain_fresh(&self, entries: &mut HashMap<CacheKey, CachedOutcome>) -> usize {
        let ttl = self.ttl;
        let before = entries.len();
        entries.retain(|_, cached| cached.stored_at.elapsed() <= ttl);
        let removed = before - entries.len();

        if removed > 0 {
            tracing::debug!(removed, "Purged expired barcode cache entries");
        }
        removed
    }

    fn is_expired(&self, cached: &CachedOutcome) -> bool {
        cached.stored_at.elapsed() > self.ttl
    }
}

impl Default for InMemoryResultCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultCache for InMemoryResultCache {
    async fn get(&self, key: &CacheKey) -> Option<BarcodeLookupOutcome> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return None,
                Some(cached) if !self.is_expired(cached) => return Some(cached.outcome.clone()),
                Some(_) => {}
            }
        }

        // Expired: evict under the write lock, re-checking in case it was refreshed
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|cached| self.is_expired(cached)) {
            entries.remove(key);
            tracing::debug!(key = %key.storage_key(), "Evicted expired barcode cache entry");
        }
        None
    }

    async fn set(&self, key: &CacheKey, outcome: &BarcodeLookupOutcome) {
        if !outcome.found || outcome.data.is_none() {
            return;
        }

        let mut entries = self.entries.write().await;
        entries.insert(
            key.clone(),
            CachedOutcome {
                outcome: outcome.clone(),
                stored_at: Instant::now(),
            },
        );

        let inserts = self.inserts_since_purge.fetch_add(1, Ordering::Relaxed) + 1;
        if inserts >= PURGE_EVERY_INSERTS {
            self.inserts_since_purge.store(0, Ordering::Relaxed);
            self.retain_fresh(&mut entries);
        }
    }
}
