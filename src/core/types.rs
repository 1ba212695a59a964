// Data model for the overlay translation workflow

use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::config::Config;
use crate::orchestration::pipeline::TranslationPipeline;
use crate::utils::Metrics;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Arc<TranslationPipeline>,
    pub metrics: Metrics,
}

/// One text region reported by the detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedRegion {
    /// Four corner points, `[x, y]` each, in detector order
    pub quad: [[i32; 2]; 4],
    pub text: String,
    pub confidence: f32,
}

/// Axis-aligned box over `[x_min, x_max) × [y_min, y_max)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: u32,
    pub y_min: u32,
    pub x_max: u32,
    pub y_max: u32,
}

impl BoundingBox {
    /// Envelope of `quad`, grown by `padding` and clamped to the image.
    ///
    /// A quad lying fully outside the image collapses to a zero-area box.
    pub fn from_quad(quad: &[[i32; 2]; 4], padding: u32, width: u32, height: u32) -> Self {
        let pad = i64::from(padding);
        let (w, h) = (i64::from(width), i64::from(height));

        let xs = quad.iter().map(|p| i64::from(p[0]));
        let ys = quad.iter().map(|p| i64::from(p[1]));
        let x_lo = xs.clone().min().unwrap_or(0);
        let x_hi = xs.max().unwrap_or(0);
        let y_lo = ys.clone().min().unwrap_or(0);
        let y_hi = ys.max().unwrap_or(0);

        let x_min = (x_lo - pad).clamp(0, w);
        let y_min = (y_lo - pad).clamp(0, h);
        // Keep x_min <= x_max even when the whole quad is to the right of the image
        let x_max = (x_hi + pad).clamp(x_min, w);
        let y_max = (y_hi + pad).clamp(y_min, h);

        Self {
            x_min: x_min as u32,
            y_min: y_min as u32,
            x_max: x_max as u32,
            y_max: y_max as u32,
        }
    }

    pub fn width(&self) -> u32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> u32 {
        self.y_max - self.y_min
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }

    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{})-({},{})",
            self.x_min, self.y_min, self.x_max, self.y_max
        )
    }
}

/// Flat color used to paint over a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl FillColor {
    pub fn to_rgb(self) -> Rgb<u8> {
        Rgb([self.r, self.g, self.b])
    }
}

impl From<Rgb<u8>> for FillColor {
    fn from(px: Rgb<u8>) -> Self {
        Self {
            r: px[0],
            g: px[1],
            b: px[2],
        }
    }
}

/// A region after erasure, translation and drawing
#[derive(Debug, Clone, Serialize)]
pub struct TranslatedRegion {
    pub bbox: BoundingBox,
    pub original_text: String,
    /// Translation, or the original text when translation fell back
    pub rendered_text: String,
    pub confidence: f32,
    pub fill: FillColor,
    /// Why translation fell back, if it did
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    pub cached: bool,
}

impl TranslatedRegion {
    pub fn is_fallback(&self) -> bool {
        self.fallback_reason.is_some()
    }
}

/// Instant a pipeline run samples once for naming its artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GenerationTime {
    pub secs: u64,
    pub nanos: u32,
}

impl GenerationTime {
    pub fn now() -> Self {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self {
            secs: since_epoch.as_secs(),
            nanos: since_epoch.subsec_nanos(),
        }
    }

    pub fn from_unix(secs: u64, nanos: u32) -> Self {
        Self { secs, nanos }
    }
}

impl fmt::Display for GenerationTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.secs, self.nanos)
    }
}

/// Final raster plus its identity, handed to persistence
#[derive(Debug, Clone)]
pub struct OutputArtifact {
    pub id: String,
    pub raster: RgbImage,
}

/// Body of `POST /translate`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranslateRequest {
    #[serde(alias = "image_url")]
    pub image_reference: Option<String>,
    pub target_lang: Option<String>,
}

/// Successful response of `POST /translate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub artifact_reference: String,
    /// Same as `artifact_reference`, kept for older clients
    pub image_url: String,
    pub artifact_id: String,
    pub regions: usize,
    pub fallbacks: usize,
}

/// Error payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECT: [[i32; 2]; 4] = [[10, 10], [60, 10], [60, 30], [10, 30]];

    #[test]
    fn test_box_padding_and_clamp() {
        let bbox = BoundingBox::from_quad(&RECT, 2, 100, 50);
        assert_eq!(
            bbox,
            BoundingBox {
                x_min: 8,
                y_min: 8,
                x_max: 62,
                y_max: 32
            }
        );
        assert_eq!(bbox.height(), 24);

        let edge = BoundingBox::from_quad(&[[0, 1], [99, 1], [99, 49], [0, 49]], 2, 100, 50);
        assert_eq!((edge.x_min, edge.y_min, edge.x_max, edge.y_max), (0, 0, 100, 50));
    }

    #[test]
    fn test_quad_outside_image_is_empty() {
        let right = BoundingBox::from_quad(&[[200, 10], [260, 10], [260, 30], [200, 30]], 2, 100, 50);
        assert!(right.is_empty());
        assert!(right.x_min <= right.x_max);

        let above = BoundingBox::from_quad(&[[10, -90], [60, -90], [60, -40], [10, -40]], 2, 100, 50);
        assert!(above.is_empty());
        assert_eq!((above.y_min, above.y_max), (0, 0));
    }

    #[test]
    fn test_generation_time_display() {
        let t = GenerationTime::from_unix(1_700_000_000, 42);
        assert_eq!(t.to_string(), "1700000000.000000042");
    }

    #[test]
    fn test_request_accepts_image_url_alias() {
        let req: TranslateRequest =
            serde_json::from_str(r#"{"image_url":"http://a/b.png"}"#).unwrap();
        assert_eq!(req.image_reference.as_deref(), Some("http://a/b.png"));
        assert!(req.target_lang.is_none());
    }
}
