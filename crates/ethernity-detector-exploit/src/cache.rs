use ethernity_core::types::ExploitInfo;
use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::time::Instant;

/// Cache LRU limitado de resultados por número de bloco
pub struct DetectionCache {
    entries: Mutex<LruCache<u64, CacheEntry>>,
    stats: RwLock<CacheStats>,
    ttl: Option<Duration>,
}

struct CacheEntry {
    info: ExploitInfo,
    expires_at: Option<Instant>,
}

/// Estatísticas de cache
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub inserts: usize,
    pub evictions: usize,
    pub expirations: usize,
}

impl DetectionCache {
    /// Cria um cache com a capacidade indicada (mínimo 1) e TTL opcional
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            stats: RwLock::new(CacheStats::default()),
            ttl,
        }
    }

    pub fn get(&self, block_number: u64) -> Option<ExploitInfo> {
        let mut entries = self.entries.lock();
        let expired = match entries.get(&block_number) {
            None => {
                self.stats.write().misses += 1;
                return None;
            }
            Some(entry) => entry.expires_at.map_or(false, |at| at <= Instant::now()),
        };

        if expired {
            entries.pop(&block_number);
            let mut stats = self.stats.write();
            stats.expirations += 1;
            stats.misses += 1;
            return None;
        }

        self.stats.write().hits += 1;
        entries.peek(&block_number).map(|entry| entry.info.clone())
    }

    pub fn insert(&self, block_number: u64, info: ExploitInfo) {
        let expires_at = self.ttl.map(|ttl| Instant::now() + ttl);
        let evicted = self
            .entries
            .lock()
            .push(block_number, CacheEntry { info, expires_at })
            .map_or(false, |(key, _)| key != block_number);

        let mut stats = self.stats.write();
        stats.inserts += 1;
        if evicted {
            stats.evictions += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.read().clone()
    }
}
