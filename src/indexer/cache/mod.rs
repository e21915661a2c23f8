#[cfg(test)]
mod tests;

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::database::SearchResult;

type CacheKey = (String, usize);

/// Bounded memo of search results keyed by `(query, n)`
///
/// Every clear of the index bumps the generation. Results computed under an
/// older generation are dropped on insert, so a search racing a clear can
/// never repopulate the cache with stale hits.
pub struct QueryCache {
    entries: Mutex<LruCache<CacheKey, Vec<SearchResult>>>,
    generation: AtomicU64,
}

impl QueryCache {
    /// A capacity of zero is treated as one
    #[inline]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            generation: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    #[inline]
    pub fn get(&self, query: &str, n: usize) -> Option<Vec<SearchResult>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(&(query.to_string(), n)).cloned()
    }

    /// Insert results computed under `generation`
    ///
    /// Returns false when the cache was invalidated in the meantime.
    #[inline]
    pub fn insert(
        &self,
        generation: u64,
        query: &str,
        n: usize,
        results: Vec<SearchResult>,
    ) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        // Checked under the lock so invalidate cannot interleave
        if self.generation() != generation {
            return false;
        }
        entries.put((query.to_string(), n), results);
        true
    }

    #[inline]
    pub fn invalidate(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        self.generation.fetch_add(1, Ordering::AcqRel);
        entries.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
