// Source image fetch and decode

use async_trait::async_trait;
use image::RgbImage;
use tracing::{debug, info, instrument};

use crate::core::config::SourceConfig;
use crate::core::errors::{FetchError, FetchResult};
use crate::utils::{decode_rgb_async, ImageOpError};

/// Resolves an image reference to a decoded RGB raster
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn load(&self, reference: &str) -> FetchResult<RgbImage>;
}

/// Fetches images over HTTP(S)
pub struct HttpImageSource {
    http_client: reqwest::Client,
    max_bytes: usize,
}

impl HttpImageSource {
    pub fn new(config: &SourceConfig) -> FetchResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()?;

        info!(
            "Image source ready (timeout {:?}, limit {} bytes)",
            config.fetch_timeout, config.max_image_bytes
        );

        Ok(Self {
            http_client,
            max_bytes: config.max_image_bytes,
        })
    }

    /// Reads the body chunk by chunk, giving up as soon as it passes the limit
    async fn read_limited(&self, mut response: reqwest::Response) -> FetchResult<Vec<u8>> {
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(FetchError::TooLarge {
                    size: body.len() + chunk.len(),
                    limit: self.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    #[instrument(skip(self))]
    async fn load(&self, reference: &str) -> FetchResult<RgbImage> {
        let response = self.http_client.get(reference).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus {
                reference: reference.to_string(),
                status: status.as_u16(),
            });
        }

        if let Some(len) = response.content_length() {
            let len = usize::try_from(len).unwrap_or(usize::MAX);
            if len > self.max_bytes {
                return Err(FetchError::TooLarge {
                    size: len,
                    limit: self.max_bytes,
                });
            }
        }

        let bytes = self.read_limited(response).await?;

        let image = decode_rgb_async(bytes)
            .await
            .map_err(|e| match e {
                ImageOpError::Image(err) => FetchError::DecodeFailed(err),
                ImageOpError::Task(err) => FetchError::TaskFailed(err.to_string()),
            })?;

        debug!("Loaded {}x{} image from {}", image.width(), image.height(), reference);
        Ok(image)
    }
}
