//! # Memoization Caches
//!
//! Reachability, round and lamport queries are pure functions of immutable
//! history, so their answers are cached. Hashes are interned into dense
//! integer ids first; the caches are keyed by ids or id pairs.
//!
//! Everything here is rebuilt from scratch on reset, arena included.

use lru::LruCache;
use shared_types::Hash;
use std::collections::HashMap;
use std::hash::Hash as StdHash;
use std::num::NonZeroUsize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    #[error("cache capacity must be non-zero")]
    ZeroCapacity,
}

/// Stable integer id of an interned event hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(u32);

/// Hash → id interner. Ids are dense and never reused.
#[derive(Debug, Default)]
pub struct EventArena {
    ids: HashMap<Hash, EventId>,
    hashes: Vec<Hash>,
}

impl EventArena {
    pub fn intern(&mut self, hash: &Hash) -> EventId {
        if let Some(id) = self.ids.get(hash) {
            return *id;
        }
        let id = EventId(self.hashes.len() as u32);
        self.hashes.push(*hash);
        self.ids.insert(*hash, id);
        id
    }

    pub fn lookup(&self, hash: &Hash) -> Option<EventId> {
        self.ids.get(hash).copied()
    }

    pub fn hash_of(&self, id: EventId) -> Option<&Hash> {
        self.hashes.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

/// Hit/miss counters of one cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub capacity: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Bounded LRU cache of copyable values.
pub struct MemoCache<K: StdHash + Eq, V: Copy> {
    inner: LruCache<K, V>,
    hits: u64,
    misses: u64,
}

impl<K: StdHash + Eq, V: Copy> MemoCache<K, V> {
    pub fn with_capacity(capacity: usize) -> Result<Self, CacheError> {
        let cap = NonZeroUsize::new(capacity).ok_or(CacheError::ZeroCapacity)?;
        Ok(Self {
            inner: LruCache::new(cap),
            hits: 0,
            misses: 0,
        })
    }

    pub fn get(&mut self, key: &K) -> Option<V> {
        match self.inner.get(key) {
            Some(v) => {
                self.hits += 1;
                Some(*v)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn put(&mut self, key: K, value: V) {
        self.inner.put(key, value);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.inner.len(),
            capacity: self.inner.cap().get(),
        }
    }
}

pub type PairKey = (EventId, EventId);

/// All memoization state owned by one poset.
pub struct PosetCaches {
    pub arena: EventArena,
    pub ancestor: MemoCache<PairKey, bool>,
    pub self_ancestor: MemoCache<PairKey, bool>,
    pub strongly_see: MemoCache<PairKey, bool>,
    pub round: MemoCache<EventId, i64>,
    pub lamport: MemoCache<EventId, i64>,
}

impl PosetCaches {
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        Ok(Self {
            arena: EventArena::default(),
            ancestor: MemoCache::with_capacity(capacity)?,
            self_ancestor: MemoCache::with_capacity(capacity)?,
            strongly_see: MemoCache::with_capacity(capacity)?,
            round: MemoCache::with_capacity(capacity)?,
            lamport: MemoCache::with_capacity(capacity)?,
        })
    }

    pub fn id(&mut self, hash: &Hash) -> EventId {
        self.arena.intern(hash)
    }

    pub fn pair(&mut self, x: &Hash, y: &Hash) -> PairKey {
        (self.arena.intern(x), self.arena.intern(y))
    }

    pub fn stats(&self) -> PosetCacheStats {
        PosetCacheStats {
            interned: self.arena.len(),
            ancestor: self.ancestor.stats(),
            self_ancestor: self.self_ancestor.stats(),
            strongly_see: self.strongly_see.stats(),
            round: self.round.stats(),
            lamport: self.lamport.stats(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PosetCacheStats {
    pub interned: usize,
    pub ancestor: CacheStats,
    pub self_ancestor: CacheStats,
    pub strongly_see: CacheStats,
    pub round: CacheStats,
    pub lamport: CacheStats,
}
