//! Memoization boundary for the highlight engine.
//!
//! Keyed by value over exactly `(annotations, document)`. A capacity of 1 gives the
//! single-slot behaviour (most recent result only); larger capacities act as an LRU.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lru::LruCache;
use serde::Serialize;
use tracing::debug;

use crate::highlight::engine::{highlight, Highlighted};
use crate::models::annotation::SkillAnnotation;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct HighlightKey {
    annotations: Vec<SkillAnnotation>,
    document: String,
}

/// Outcome of a cached computation.
#[derive(Debug, Clone)]
pub struct CachedHighlight {
    pub value: Arc<Highlighted>,
    /// True when the value came from the cache without recomputation.
    pub cached: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub capacity: usize,
    pub len: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Thread-safe memoization of [`highlight`].
///
/// A poisoned lock is recovered: the map is only touched by single `get`/`put`/`clear` calls.
pub struct HighlightCache {
    slots: Mutex<LruCache<HighlightKey, Arc<Highlighted>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl HighlightCache {
    /// A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            slots: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn single_slot() -> Self {
        Self::new(1)
    }

    /// Returns the highlighted document, recomputing only when either input changed by value.
    pub fn compute(&self, annotations: &[SkillAnnotation], document: &str) -> CachedHighlight {
        let key = HighlightKey {
            annotations: annotations.to_vec(),
            document: document.to_string(),
        };

        if let Some(hit) = self.lock_slots().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Highlight cache hit");
            return CachedHighlight {
                value: Arc::clone(hit),
                cached: true,
            };
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(
            annotations = annotations.len(),
            document_bytes = document.len(),
            "Highlight cache miss"
        );

        // Computed outside the lock; concurrent misses on the same key just race to insert.
        let value = Arc::new(highlight(annotations, document));
        self.lock_slots().put(key, Arc::clone(&value));

        CachedHighlight {
            value,
            cached: false,
        }
    }

    pub fn stats(&self) -> CacheStats {
        let (capacity, len) = {
            let slots = self.lock_slots();
            (slots.cap().get(), slots.len())
        };
        CacheStats {
            capacity,
            len,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    pub fn clear(&self) {
        self.lock_slots().clear();
    }

    fn lock_slots(&self) -> MutexGuard<'_, LruCache<HighlightKey, Arc<Highlighted>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for HighlightCache {
    fn default() -> Self {
        Self::single_slot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::ApprovalState;

    fn annotations() -> Vec<SkillAnnotation> {
        vec![SkillAnnotation {
            id: "a1".to_string(),
            name: "Rust".to_string(),
            category: "languages".to_string(),
            kind: Some("general".to_string()),
            confidence_score: 0.8,
            approval_state: ApprovalState::Approved,
        }]
    }

    #[test]
    fn test_repeat_call_returns_cached_instance() {
        let cache = HighlightCache::single_slot();
        let first = cache.compute(&annotations(), "We use Rust");
        // Equal by value, freshly allocated
        let second = cache.compute(&annotations(), &String::from("We use Rust"));

        assert!(second.cached);
        assert!(Arc::ptr_eq(&first.value, &second.value));
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_changed_document_recomputes() {
        let cache = HighlightCache::single_slot();
        let first = cache.compute(&annotations(), "We use Rust");
        let second = cache.compute(&annotations(), "We use Rust and Go");

        assert!(!first.cached);
        assert!(!second.cached);
        assert_ne!(first.value.html, second.value.html);
    }

    #[test]
    fn test_changed_annotations_recompute() {
        let cache = HighlightCache::single_slot();
        let before = cache.compute(&annotations(), "We use Rust");

        let mut rejected = annotations();
        rejected[0].approval_state = ApprovalState::Rejected;
        let after = cache.compute(&rejected, "We use Rust");

        assert!(!after.cached);
        assert_eq!(before.value.marker_count, 1);
        assert_eq!(after.value.marker_count, 0);
    }

    #[test]
    fn test_single_slot_keeps_only_latest() {
        let cache = HighlightCache::single_slot();
        cache.compute(&annotations(), "doc one Rust");
        cache.compute(&annotations(), "doc two Rust");
        let again = cache.compute(&annotations(), "doc one Rust");

        assert!(!again.cached);
        assert_eq!(cache.stats().len, 1);
        assert_eq!(cache.stats().capacity, 1);
    }

    #[test]
    fn test_multi_slot_keeps_several() {
        let cache = HighlightCache::new(4);
        cache.compute(&annotations(), "doc one Rust");
        cache.compute(&annotations(), "doc two Rust");
        let again = cache.compute(&annotations(), "doc one Rust");

        assert!(again.cached);
        assert_eq!(cache.stats().len, 2);
    }

    #[test]
    fn test_cached_result_matches_direct_computation() {
        let cache = HighlightCache::single_slot();
        let doc = "  Rust   everywhere  ";
        cache.compute(&annotations(), doc);
        let cached = cache.compute(&annotations(), doc);
        assert_eq!(*cached.value, highlight(&annotations(), doc));
    }

    #[test]
    fn test_zero_capacity_is_single_slot() {
        assert_eq!(HighlightCache::new(0).stats().capacity, 1);
    }

    #[test]
    fn test_clear_forces_recompute() {
        let cache = HighlightCache::default();
        cache.compute(&annotations(), "Rust");
        cache.clear();
        assert!(!cache.compute(&annotations(), "Rust").cached);
    }

    #[test]
    fn test_poisoned_lock_keeps_caching() {
        let cache = Arc::new(HighlightCache::single_slot());
        let poisoner = Arc::clone(&cache);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.slots.lock().unwrap();
            panic!("panic while holding the cache lock");
        })
        .join();
        assert!(cache.slots.is_poisoned());

        assert!(!cache.compute(&annotations(), "We use Rust").cached);
        assert!(cache.compute(&annotations(), "We use Rust").cached);
        let stats = cache.stats();
        assert_eq!(stats.capacity, 1);
        assert_eq!(stats.len, 1);
        assert_eq!(stats.hits, 1);

        cache.clear();
        assert_eq!(cache.stats().len, 0);
    }
}
