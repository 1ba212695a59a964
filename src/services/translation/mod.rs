pub mod cache;
pub mod libretranslate;
pub mod orchestrator;

use async_trait::async_trait;

use crate::core::errors::TranslationResult;

pub use cache::TranslationCache;
pub use libretranslate::LibreTranslateClient;
pub use orchestrator::{TranslationOrchestrator, TranslationOutcome};

/// A machine translation collaborator.
///
/// One call translates one text. Implementations report every failure as an
/// error; fallback policy lives in [`TranslationOrchestrator`].
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    async fn translate(&self, text: &str, target_lang: &str) -> TranslationResult<String>;
}
