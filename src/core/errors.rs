// Error types for the overlay translation workflow
//
// One enum per external collaborator, plus PipelineError for the failures
// that abort a whole request. Per-region failures (translation, rendering)
// never reach PipelineError: they are absorbed into fallbacks.

use std::time::Duration;
use thiserror::Error;

/// Image fetch / decode errors (fatal to the request)
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Image request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Image source returned status {status} for {reference}")]
    BadStatus { reference: String, status: u16 },

    #[error("Image is too large: {size} bytes (limit {limit})")]
    TooLarge { size: usize, limit: usize },

    #[error("Image decode failed: {0}")]
    DecodeFailed(#[from] image::ImageError),

    #[error("Image decode task failed: {0}")]
    TaskFailed(String),
}

/// Detector collaborator errors (fatal to the request)
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("Detector request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Detector returned status {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("Invalid detector response: {0}")]
    InvalidResponse(String),

    #[error("Image encoding for detector failed: {0}")]
    EncodeFailed(String),
}

/// Translation collaborator errors (recovered per region)
#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("Translation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Translation request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Translation API returned status {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("Invalid translation response: {0}")]
    InvalidResponse(String),

    #[error("Request deadline exceeded before translation finished")]
    DeadlineExceeded,
}

/// Rendering errors (recovered per region with the bitmap font)
#[derive(Debug, Error)]
pub enum RenderingError {
    #[error("Font not available: {0}")]
    FontUnavailable(String),

    #[error("Font loading failed for {path}: {reason}")]
    FontLoadFailed { path: String, reason: String },

    #[error("Font has no glyphs for this text at {font_size:.1}px")]
    NoGlyphs { font_size: f32 },
}

/// Artifact persistence errors (fatal to the request)
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Artifact {id} already exists")]
    AlreadyExists { id: String },

    #[error("Failed to write artifact {id}: {source}")]
    WriteFailed {
        id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode artifact {id}: {source}")]
    EncodeFailed {
        id: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to prepare artifact directory {path}: {source}")]
    DirectoryFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Encode task failed: {0}")]
    TaskFailed(String),
}

/// Pipeline errors: the only failures surfaced to the caller
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to load source image: {0}")]
    Fetch(#[from] FetchError),

    #[error("Text detection failed: {0}")]
    Detection(#[from] DetectionError),

    #[error("Failed to store artifact: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Confidence threshold must be in [0.0, 1.0], got {0}")]
    InvalidConfidenceThreshold(f32),

    #[error("Invalid detection config: {0}")]
    InvalidDetectionConfig(String),

    #[error("Invalid translation config: {0}")]
    InvalidTranslationConfig(String),

    #[error("Invalid rendering config: {0}")]
    InvalidRenderingConfig(String),

    #[error("Invalid storage config: {0}")]
    InvalidStorageConfig(String),

    #[error("Invalid value for {key}: {value}")]
    EnvVarError { key: String, value: String },
}

pub type FetchResult<T> = Result<T, FetchError>;
pub type DetectionResult<T> = Result<T, DetectionError>;
pub type TranslationResult<T> = Result<T, TranslationError>;
pub type RenderingResult<T> = Result<T, RenderingError>;
pub type PersistenceResult<T> = Result<T, PersistenceError>;
pub type PipelineResult<T> = Result<T, PipelineError>;
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_error_keeps_collaborator_message() {
        let err: PipelineError = DetectionError::BadStatus {
            status: 503,
            body: "model loading".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Text detection failed: Detector returned status 503: model loading"
        );
    }

    #[test]
    fn fetch_error_names_reference() {
        let err = FetchError::BadStatus {
            reference: "http://example.com/a.png".to_string(),
            status: 404,
        };
        assert!(err.to_string().contains("http://example.com/a.png"));
        assert!(err.to_string().contains("404"));
    }
}
