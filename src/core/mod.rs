pub mod config;
pub mod errors;
pub mod types;

// Re-export commonly used items for convenience
pub use config::Config;
pub use errors::{
    ConfigError, DetectionError, FetchError, PersistenceError, PipelineError, RenderingError,
    TranslationError,
};
pub use types::{
    AppState, BoundingBox, DetectedRegion, FillColor, GenerationTime, OutputArtifact,
    TranslatedRegion,
};
