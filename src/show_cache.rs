//! LRU cache for `git show` output.

use lru::LruCache;
use parking_lot::RwLock;
use std::num::NonZeroUsize;

/// Thread-safe cache of rendered commit show text, keyed by SHA. Content for
/// a given SHA never changes, so entries only leave by eviction or an
/// explicit clear after history rewrites.
pub struct ShowCache {
    cache: RwLock<LruCache<String, String>>,
}

impl ShowCache {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(128).unwrap());
        Self {
            cache: RwLock::new(LruCache::new(cap)),
        }
    }

    pub fn get(&self, sha: &str) -> Option<String> {
        self.cache.write().get(sha).cloned()
    }

    pub fn insert(&self, sha: String, text: String) {
        self.cache.write().put(sha, text);
    }

    pub fn clear(&self) {
        self.cache.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_least_recently_used() {
        let cache = ShowCache::new(2);
        cache.insert("a".to_string(), "A".to_string());
        cache.insert("b".to_string(), "B".to_string());
        assert_eq!(cache.get("a").as_deref(), Some("A"));

        cache.insert("c".to_string(), "C".to_string());
        // "b" was least recently used
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("a").as_deref(), Some("A"));
        assert_eq!(cache.get("c").as_deref(), Some("C"));
    }
}
