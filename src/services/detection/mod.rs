// Text detection collaborator

use async_trait::async_trait;
use image::RgbImage;
use serde::Deserialize;
use std::time::Instant;
use tracing::{debug, info, instrument};

use crate::core::config::DetectionConfig;
use crate::core::errors::{DetectionError, DetectionResult};
use crate::core::types::DetectedRegion;
use crate::utils::encode_png_async;

/// Locates text in a decoded image and recognizes it.
///
/// Called once per image. Regions come back in detector order.
#[async_trait]
pub trait TextDetector: Send + Sync {
    async fn detect(&self, image: &RgbImage) -> DetectionResult<Vec<DetectedRegion>>;
}

/// Detector backed by an OCR sidecar over HTTP.
///
/// The raster is POSTed as `image/png`; the sidecar answers with a JSON array
/// of regions, either as objects or as EasyOCR-style `[quad, text, confidence]`
/// triples.
pub struct HttpDetector {
    endpoint: String,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireRegion {
    Object {
        quad: [[f64; 2]; 4],
        text: String,
        confidence: f32,
    },
    Triple([[f64; 2]; 4], String, f32),
}

impl WireRegion {
    fn into_region(self) -> DetectedRegion {
        let (quad, text, confidence) = match self {
            Self::Object {
                quad,
                text,
                confidence,
            } => (quad, text, confidence),
            Self::Triple(quad, text, confidence) => (quad, text, confidence),
        };

        DetectedRegion {
            // Sub-pixel coordinates truncate toward zero
            quad: quad.map(|[x, y]| [x as i32, y as i32]),
            text,
            confidence,
        }
    }
}

impl HttpDetector {
    pub fn new(config: &DetectionConfig) -> DetectionResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        info!("Detector client ready ({})", config.detector_url);

        Ok(Self {
            endpoint: config.detector_url.clone(),
            http_client,
        })
    }

    fn parse_regions(body: &str) -> DetectionResult<Vec<DetectedRegion>> {
        let wire: Vec<WireRegion> = serde_json::from_str(body)
            .map_err(|e| DetectionError::InvalidResponse(e.to_string()))?;
        Ok(wire.into_iter().map(WireRegion::into_region).collect())
    }
}

#[async_trait]
impl TextDetector for HttpDetector {
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    async fn detect(&self, image: &RgbImage) -> DetectionResult<Vec<DetectedRegion>> {
        let start = Instant::now();

        let png = encode_png_async(image.clone())
            .await
            .map_err(|e| DetectionError::EncodeFailed(e.to_string()))?;

        let response = self
            .http_client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "image/png")
            .body(png)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(DetectionError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        let regions = Self::parse_regions(&body)?;
        debug!(
            "Detector returned {} regions in {:.0}ms",
            regions.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(regions)
    }
}
