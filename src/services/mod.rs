pub mod artifact_store;
pub mod detection;
pub mod font_manager;
pub mod image_source;
pub mod rendering;
pub mod translation;

// Re-export commonly used services
pub use artifact_store::ArtifactStore;
pub use detection::{HttpDetector, TextDetector};
pub use font_manager::FontManager;
pub use image_source::{HttpImageSource, ImageSource};
pub use rendering::{OverlayRenderer, RenderPath};
pub use translation::{
    LibreTranslateClient, TranslationBackend, TranslationCache, TranslationOrchestrator,
    TranslationOutcome,
};
