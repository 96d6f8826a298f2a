//! Deduplication of rendered output lines
//!
//! Two tiers:
//! - a private [`LocalCache`] per worker, checked without any locking
//! - one shared [`DedupSet`] behind a single mutex, the source of truth
//!   for uniqueness across workers
//!
//! The key is the rendered output line, so two different inputs that convert
//! to the same output count as duplicates.

use ahash::RandomState;
use hashbrown::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Statistics for deduplication operations
#[derive(Debug, Default)]
pub struct DedupStats {
    /// Lines claimed as unique
    pub claimed: AtomicU64,
    /// Repeats caught by a worker's own cache
    pub local_hits: AtomicU64,
    /// Repeats caught by the shared set
    pub global_hits: AtomicU64,
}

impl DedupStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_claimed(&self) -> u64 {
        self.claimed.load(Ordering::Relaxed)
    }

    pub fn get_local_hits(&self) -> u64 {
        self.local_hits.load(Ordering::Relaxed)
    }

    pub fn get_global_hits(&self) -> u64 {
        self.global_hits.load(Ordering::Relaxed)
    }

    pub fn get_duplicates(&self) -> u64 {
        self.get_local_hits() + self.get_global_hits()
    }

    fn reset(&self) {
        self.claimed.store(0, Ordering::Relaxed);
        self.local_hits.store(0, Ordering::Relaxed);
        self.global_hits.store(0, Ordering::Relaxed);
    }
}

/// Worker-private cache of lines this worker has already seen
#[derive(Debug, Default)]
pub struct LocalCache {
    seen: HashSet<String, RandomState>,
}

impl LocalCache {
    pub fn new() -> Self {
        Self {
            seen: HashSet::with_hasher(RandomState::new()),
        }
    }

    pub fn contains(&self, item: &str) -> bool {
        self.seen.contains(item)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Shared set of lines already emitted for the current input file
pub struct DedupSet {
    global: Mutex<HashSet<String, RandomState>>,
    stats: DedupStats,
}

impl DedupSet {
    pub fn new() -> Self {
        Self {
            global: Mutex::new(HashSet::with_hasher(RandomState::new())),
            stats: DedupStats::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            global: Mutex::new(HashSet::with_capacity_and_hasher(capacity, RandomState::new())),
            stats: DedupStats::new(),
        }
    }

    /// Claim `candidate` for emission
    ///
    /// Returns true iff no worker has emitted it before. The local cache is
    /// consulted first; the shared set is checked and updated under one lock.
    pub fn try_claim(&self, local: &mut LocalCache, candidate: &str) -> bool {
        if local.seen.contains(candidate) {
            self.stats.local_hits.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        local.seen.insert(candidate.to_string());

        let inserted = self
            .global
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(candidate.to_string());

        if inserted {
            self.stats.claimed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.stats.global_hits.fetch_add(1, Ordering::Relaxed);
        }

        inserted
    }

    pub fn contains(&self, item: &str) -> bool {
        self.global.lock().unwrap_or_else(|e| e.into_inner()).contains(item)
    }

    pub fn len(&self) -> usize {
        self.global.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget everything; called before each input file
    pub fn clear(&self) {
        self.global.lock().unwrap_or_else(|e| e.into_inner()).clear();
        self.stats.reset();
    }

    pub fn stats(&self) -> &DedupStats {
        &self.stats
    }
}

impl Default for DedupSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_claim_once() {
        let dedup = DedupSet::new();
        let mut local = LocalCache::new();

        assert!(dedup.try_claim(&mut local, "a@b.com:pw"));
        assert!(dedup.try_claim(&mut local, "c@d.com:pw"));
        assert!(!dedup.try_claim(&mut local, "a@b.com:pw"));

        assert_eq!(dedup.len(), 2);
        assert_eq!(local.len(), 2);
        assert_eq!(dedup.stats().get_claimed(), 2);
        assert_eq!(dedup.stats().get_local_hits(), 1);
    }

    #[test]
    fn test_global_set_wins_over_fresh_local_cache() {
        let dedup = DedupSet::new();
        let mut first = LocalCache::new();
        let mut second = LocalCache::new();

        assert!(dedup.try_claim(&mut first, "line"));
        assert!(!dedup.try_claim(&mut second, "line"));
        assert!(second.contains("line"));
        assert_eq!(dedup.stats().get_global_hits(), 1);
        assert_eq!(dedup.stats().get_duplicates(), 1);
    }

    #[test]
    fn test_clear() {
        let dedup = DedupSet::with_capacity(16);
        let mut local = LocalCache::new();
        dedup.try_claim(&mut local, "line");

        dedup.clear();
        assert!(dedup.is_empty());
        assert!(!dedup.contains("line"));
        assert_eq!(dedup.stats().get_claimed(), 0);

        let mut fresh = LocalCache::new();
        assert!(dedup.try_claim(&mut fresh, "line"));
    }

    #[test]
    fn test_concurrent_claims_are_exclusive() {
        let dedup = DedupSet::new();

        let winners: usize = thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        let mut local = LocalCache::new();
                        (0..500)
                            .filter(|i| dedup.try_claim(&mut local, &format!("line{}", i)))
                            .count()
                    })
                })
                .collect();

            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        assert_eq!(winners, 500);
        assert_eq!(dedup.len(), 500);
    }
}
