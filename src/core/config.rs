use crate::core::errors::ConfigError;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// Noto Sans Thai, the font the service renders translations with by default
pub const DEFAULT_FONT_URL: &str =
    "https://github.com/googlefonts/noto-fonts/raw/main/unhinted/ttf/NotoSansThai/NotoSansThai-Regular.ttf";

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub log_level: Level,
    /// Base used for artifact references; derived from the Host header when unset
    pub public_base_url: Option<String>,
}

/// Detector collaborator configuration
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    pub detector_url: String,
    pub timeout: Duration,
    pub confidence_threshold: f32,
    pub box_padding: u32,
}

/// Image source configuration
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub fetch_timeout: Duration,
    pub max_image_bytes: usize,
}

/// Translation collaborator configuration
#[derive(Debug, Clone)]
pub struct TranslationConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    /// Maximum translation calls in flight for one image
    pub concurrency: usize,
    pub default_target_lang: String,
    /// Distinct texts remembered within one image
    pub cache_entries: usize,
}

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderingConfig {
    pub font_path: PathBuf,
    pub font_download_url: Option<String>,
    pub min_font_size: f32,
    pub font_height_ratio: f32,
}

/// Artifact storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub static_dir: PathBuf,
    pub jpeg_quality: u8,
}

/// Whole-request limits
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub request_timeout: Duration,
}

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub detection: DetectionConfig,
    pub source: SourceConfig,
    pub translation: TranslationConfig,
    pub rendering: RenderingConfig,
    pub storage: StorageConfig,
    pub pipeline: PipelineConfig,
}

impl Config {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let config = Self::load_from_env()?;
        config.validate()?;
        Ok(config)
    }

    fn load_from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let log_level = match env::var("LOG_LEVEL") {
            Ok(s) => parse_level(&s).ok_or_else(|| ConfigError::EnvVarError {
                key: "LOG_LEVEL".to_string(),
                value: s.clone(),
            })?,
            Err(_) => defaults.server.log_level,
        };

        Ok(Self {
            server: ServerConfig {
                port: parse_or("PORT", defaults.server.port)?,
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                log_level,
                public_base_url: optional("PUBLIC_BASE_URL")
                    .map(|s| s.trim_end_matches('/').to_string()),
            },
            detection: DetectionConfig {
                detector_url: env::var("DETECTOR_URL").unwrap_or(defaults.detection.detector_url),
                timeout: seconds_or("DETECTOR_TIMEOUT_SECONDS", defaults.detection.timeout)?,
                confidence_threshold: parse_or(
                    "CONFIDENCE_THRESHOLD",
                    defaults.detection.confidence_threshold,
                )?,
                box_padding: parse_or("BOX_PADDING", defaults.detection.box_padding)?,
            },
            source: SourceConfig {
                fetch_timeout: seconds_or("FETCH_TIMEOUT_SECONDS", defaults.source.fetch_timeout)?,
                max_image_bytes: parse_or("MAX_IMAGE_BYTES", defaults.source.max_image_bytes)?,
            },
            translation: TranslationConfig {
                api_url: env::var("TRANSLATE_API_URL").unwrap_or(defaults.translation.api_url),
                api_key: optional("TRANSLATE_API_KEY"),
                timeout: seconds_or("TRANSLATE_TIMEOUT_SECONDS", defaults.translation.timeout)?,
                concurrency: parse_or("TRANSLATE_CONCURRENCY", defaults.translation.concurrency)?,
                default_target_lang: env::var("DEFAULT_TARGET_LANG")
                    .unwrap_or(defaults.translation.default_target_lang),
                cache_entries: parse_or(
                    "TRANSLATION_CACHE_ENTRIES",
                    defaults.translation.cache_entries,
                )?,
            },
            rendering: RenderingConfig {
                font_path: env::var("FONT_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.rendering.font_path),
                // An empty FONT_DOWNLOAD_URL disables provisioning
                font_download_url: match env::var("FONT_DOWNLOAD_URL") {
                    Ok(s) if s.trim().is_empty() => None,
                    Ok(s) => Some(s),
                    Err(_) => defaults.rendering.font_download_url,
                },
                min_font_size: parse_or("MIN_FONT_SIZE", defaults.rendering.min_font_size)?,
                font_height_ratio: parse_or(
                    "FONT_HEIGHT_RATIO",
                    defaults.rendering.font_height_ratio,
                )?,
            },
            storage: StorageConfig {
                static_dir: env::var("STATIC_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.static_dir),
                jpeg_quality: parse_or("JPEG_QUALITY", defaults.storage.jpeg_quality)?,
            },
            pipeline: PipelineConfig {
                request_timeout: seconds_or(
                    "REQUEST_TIMEOUT_SECONDS",
                    defaults.pipeline.request_timeout,
                )?,
            },
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.detection.confidence_threshold) {
            return Err(ConfigError::InvalidConfidenceThreshold(
                self.detection.confidence_threshold,
            ));
        }

        if self.detection.timeout.is_zero() {
            return Err(ConfigError::InvalidDetectionConfig(
                "detector timeout must be > 0".to_string(),
            ));
        }

        if self.detection.box_padding > 64 {
            return Err(ConfigError::InvalidDetectionConfig(format!(
                "box_padding must be at most 64, got {}",
                self.detection.box_padding
            )));
        }

        if self.translation.timeout.is_zero() {
            return Err(ConfigError::InvalidTranslationConfig(
                "translation timeout must be > 0".to_string(),
            ));
        }

        if !(1..=32).contains(&self.translation.concurrency) {
            return Err(ConfigError::InvalidTranslationConfig(format!(
                "concurrency must be between 1 and 32, got {}",
                self.translation.concurrency
            )));
        }

        if self.translation.cache_entries == 0 {
            return Err(ConfigError::InvalidTranslationConfig(
                "cache_entries must be > 0".to_string(),
            ));
        }

        if self.translation.default_target_lang.trim().is_empty() {
            return Err(ConfigError::InvalidTranslationConfig(
                "default target language must not be empty".to_string(),
            ));
        }

        if self.rendering.min_font_size <= 0.0 {
            return Err(ConfigError::InvalidRenderingConfig(format!(
                "min_font_size must be > 0, got {}",
                self.rendering.min_font_size
            )));
        }

        if !(self.rendering.font_height_ratio > 0.0 && self.rendering.font_height_ratio <= 4.0) {
            return Err(ConfigError::InvalidRenderingConfig(format!(
                "font_height_ratio must be in (0, 4], got {}",
                self.rendering.font_height_ratio
            )));
        }

        if !(1..=100).contains(&self.storage.jpeg_quality) {
            return Err(ConfigError::InvalidStorageConfig(format!(
                "jpeg_quality must be between 1 and 100, got {}",
                self.storage.jpeg_quality
            )));
        }

        if self.source.fetch_timeout.is_zero() || self.pipeline.request_timeout.is_zero() {
            return Err(ConfigError::InvalidDetectionConfig(
                "fetch and request timeouts must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn server_port(&self) -> u16 {
        self.server.port
    }

    pub fn server_host(&self) -> &str {
        &self.server.host
    }

    pub fn log_level(&self) -> Level {
        self.server.log_level
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.detection.confidence_threshold
    }

    pub fn default_target_lang(&self) -> &str {
        &self.translation.default_target_lang
    }
}

/// Built-in defaults, before any environment overrides
impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: 5000,
                host: "0.0.0.0".to_string(),
                log_level: Level::INFO,
                public_base_url: None,
            },
            detection: DetectionConfig {
                detector_url: "http://127.0.0.1:8866/detect".to_string(),
                timeout: Duration::from_secs(60),
                confidence_threshold: 0.3,
                box_padding: 2,
            },
            source: SourceConfig {
                fetch_timeout: Duration::from_secs(15),
                max_image_bytes: 20 * 1024 * 1024,
            },
            translation: TranslationConfig {
                api_url: "https://libretranslate.com/translate".to_string(),
                api_key: None,
                timeout: Duration::from_secs(10),
                concurrency: 4,
                default_target_lang: "th".to_string(),
                cache_entries: 1024,
            },
            rendering: RenderingConfig {
                font_path: PathBuf::from("NotoSansThai-Regular.ttf"),
                font_download_url: Some(DEFAULT_FONT_URL.to_string()),
                min_font_size: 14.0,
                font_height_ratio: 0.8,
            },
            storage: StorageConfig {
                static_dir: PathBuf::from("static"),
                jpeg_quality: 90,
            },
            pipeline: PipelineConfig {
                request_timeout: Duration::from_secs(60),
            },
        }
    }
}

fn parse_level(s: &str) -> Option<Level> {
    match s.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

/// Parse an environment variable, keeping the default when it is unset
fn parse_or<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::EnvVarError {
            key: key.to_string(),
            value,
        }),
        Err(_) => Ok(default),
    }
}

fn seconds_or(key: &str, default: Duration) -> Result<Duration, ConfigError> {
    parse_or(key, default.as_secs()).map(Duration::from_secs)
}
