// Library exports for the image overlay translation workflow

// Core modules
pub mod core;
pub mod orchestration;
pub mod phases;
pub mod server;
pub mod services;
pub mod utils;

// Re-export commonly used types and functions
pub use core::{
    config::Config,
    errors::{
        ConfigError, DetectionError, FetchError, PersistenceError, PipelineError, RenderingError,
        TranslationError,
    },
    types::{AppState, BoundingBox, DetectedRegion, FillColor, TranslatedRegion},
};

pub use orchestration::{PipelineOutput, TranslationPipeline};

pub use services::{
    ArtifactStore, HttpDetector, HttpImageSource, LibreTranslateClient, OverlayRenderer,
    TextDetector, TranslationBackend, TranslationCache, TranslationOrchestrator,
    TranslationOutcome,
};

pub use utils::Metrics;
