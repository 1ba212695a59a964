// Per-region translation with fallback to the original text

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::{TranslationBackend, TranslationCache};
use crate::core::config::TranslationConfig;
use crate::core::errors::TranslationError;
use crate::utils::Metrics;

/// Result of translating one region
#[derive(Debug)]
pub enum TranslationOutcome {
    Translated { text: String, cached: bool },
    Fallback { text: String, reason: TranslationError },
}

impl TranslationOutcome {
    /// Text to draw: the translation, or the original on fallback
    pub fn text(&self) -> &str {
        match self {
            Self::Translated { text, .. } | Self::Fallback { text, .. } => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Translated { text, .. } | Self::Fallback { text, .. } => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, Self::Translated { cached: true, .. })
    }

    pub fn fallback_reason(&self) -> Option<&TranslationError> {
        match self {
            Self::Fallback { reason, .. } => Some(reason),
            Self::Translated { .. } => None,
        }
    }

    /// Fallback for a region whose translation never got to run or finish
    pub fn fallback(original: &str, reason: TranslationError) -> Self {
        Self::Fallback {
            text: original.to_string(),
            reason,
        }
    }
}

/// Wraps a [`TranslationBackend`] with a timeout and per-request dedupe.
///
/// Exactly one backend attempt per call; every failure becomes
/// [`TranslationOutcome::Fallback`] carrying the original text. The
/// orchestrator itself holds no state between requests.
pub struct TranslationOrchestrator {
    backend: Arc<dyn TranslationBackend>,
    timeout: Duration,
    cache_entries: usize,
    metrics: Metrics,
}

impl TranslationOrchestrator {
    pub fn new(
        backend: Arc<dyn TranslationBackend>,
        config: &TranslationConfig,
        metrics: Metrics,
    ) -> Self {
        Self {
            backend,
            timeout: config.timeout,
            cache_entries: config.cache_entries,
            metrics,
        }
    }

    /// Fresh cache for the regions of one image
    pub fn request_cache(&self) -> TranslationCache {
        TranslationCache::new(self.cache_entries, Some(self.metrics.clone()))
    }

    pub async fn translate(
        &self,
        text: &str,
        target_lang: &str,
        cache: &TranslationCache,
    ) -> TranslationOutcome {
        // Nothing to translate; keep the region's text as-is
        if text.trim().is_empty() {
            return TranslationOutcome::Translated {
                text: text.to_string(),
                cached: false,
            };
        }

        if let Some(hit) = cache.get(target_lang, text) {
            debug!("Translation cache hit for {:?}", text);
            return TranslationOutcome::Translated {
                text: hit,
                cached: true,
            };
        }

        let start = Instant::now();
        let result = match tokio::time::timeout(self.timeout, self.backend.translate(text, target_lang)).await {
            Ok(result) => result,
            Err(_) => Err(TranslationError::Timeout(self.timeout)),
        };
        let elapsed = start.elapsed();

        match result {
            Ok(translated) => {
                self.metrics.record_translation_call(true, elapsed);
                cache.put(target_lang, text, translated.clone());
                TranslationOutcome::Translated {
                    text: translated,
                    cached: false,
                }
            }
            Err(reason) => {
                self.metrics.record_translation_call(false, elapsed);
                self.metrics.record_translation_fallback();
                warn!("Translation failed for {:?}, using original: {}", text, reason);
                TranslationOutcome::fallback(text, reason)
            }
        }
    }
}
