use lru::LruCache;
use parking_lot::RwLock;
use std::num::NonZeroUsize;
use std::sync::Arc;
use xxhash_rust::xxh3::xxh3_64;

use crate::utils::Metrics;

/// In-memory LRU of successful translations for one image.
///
/// Keys are xxHash3 digests of (target language, source text). The pipeline
/// builds a fresh cache per request, so repeated texts on a page share one
/// backend call while nothing outlives the request. Fallbacks are never
/// stored.
#[derive(Clone)]
pub struct TranslationCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    cache: RwLock<LruCache<u64, String>>,
    metrics: Option<Metrics>,
}

impl TranslationCache {
    /// Create a cache holding at most `max_entries` translations (minimum 1)
    pub fn new(max_entries: usize, metrics: Option<Metrics>) -> Self {
        let max = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(CacheInner {
                cache: RwLock::new(LruCache::new(max)),
                metrics,
            }),
        }
    }

    /// Cache key for `text` translated into `target_lang`
    pub fn generate_key(target_lang: &str, text: &str) -> u64 {
        // Separator byte keeps ("ab", "c") and ("a", "bc") apart
        let mut hash_input = Vec::with_capacity(target_lang.len() + text.len() + 1);
        hash_input.extend_from_slice(target_lang.as_bytes());
        hash_input.push(0);
        hash_input.extend_from_slice(text.as_bytes());
        xxh3_64(&hash_input)
    }

    pub fn get(&self, target_lang: &str, text: &str) -> Option<String> {
        let key = Self::generate_key(target_lang, text);
        // LruCache::get updates recency, so it needs the write lock
        let hit = self.inner.cache.write().get(&key).cloned();

        if let Some(ref m) = self.inner.metrics {
            if hit.is_some() {
                m.record_cache_hit();
            } else {
                m.record_cache_miss();
            }
        }

        hit
    }

    pub fn put(&self, target_lang: &str, text: &str, translated: String) {
        let key = Self::generate_key(target_lang, text);
        self.inner.cache.write().put(key, translated);
    }

    /// (entries, capacity)
    pub fn stats(&self) -> (usize, usize) {
        let cache = self.inner.cache.read();
        (cache.len(), cache.cap().get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_put_get() {
        let cache = TranslationCache::new(16, None);
        cache.put("th", "HELLO", "สวัสดี".to_string());

        assert_eq!(cache.get("th", "HELLO").as_deref(), Some("สวัสดี"));
        assert!(cache.get("ja", "HELLO").is_none());
        assert_eq!(cache.stats(), (1, 16));
    }

    #[test]
    fn test_lru_eviction() {
        let cache = TranslationCache::new(2, None);
        cache.put("th", "a", "1".to_string());
        cache.put("th", "b", "2".to_string());
        // Touch "a" so "b" becomes least recently used
        assert!(cache.get("th", "a").is_some());
        cache.put("th", "c", "3".to_string());

        assert!(cache.get("th", "b").is_none());
        assert!(cache.get("th", "a").is_some());
        assert!(cache.get("th", "c").is_some());
    }

    #[test]
    fn test_key_generation() {
        let k1 = TranslationCache::generate_key("th", "HELLO");
        let k2 = TranslationCache::generate_key("th", "HELLO");
        let k3 = TranslationCache::generate_key("t", "hHELLO");

        assert_eq!(k1, k2);
        assert_ne!(k1, k3);
    }

    #[test]
    fn test_metrics_track_hits_and_misses() {
        let metrics = Metrics::new();
        let cache = TranslationCache::new(4, Some(metrics.clone()));
        assert!(cache.get("th", "x").is_none());
        cache.put("th", "x", "y".to_string());
        assert!(cache.get("th", "x").is_some());

        let snap = metrics.snapshot();
        assert_eq!(snap.cache_hits, 1);
        assert_eq!(snap.cache_misses, 1);
    }
}
