// Font Manager - makes sure the scalable font is on disk before the renderer loads it

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::config::RenderingConfig;

/// Smallest body accepted as a font download; anything shorter is an error page
const MIN_FONT_BYTES: usize = 1024;

pub struct FontManager {
    font_path: PathBuf,
    download_url: Option<String>,
    client: reqwest::Client,
}

impl FontManager {
    pub fn new(config: &RenderingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create font download client")?;

        Ok(Self {
            font_path: config.font_path.clone(),
            download_url: config.font_download_url.clone(),
            client,
        })
    }

    pub fn font_path(&self) -> &Path {
        &self.font_path
    }

    /// Ensure the font file exists, downloading it once if needed.
    ///
    /// Returns whether the font is available afterwards. Failures are logged,
    /// not returned: the renderer can still run on its bitmap font.
    pub async fn provision(&self) -> bool {
        if self.font_path.exists() {
            debug!("Font found at {}", self.font_path.display());
            return true;
        }

        let Some(url) = self.download_url.as_deref() else {
            warn!(
                "Font {} missing and no download URL configured",
                self.font_path.display()
            );
            return false;
        };

        info!("Downloading font from {}...", url);
        match self.download(url).await {
            Ok(size) => {
                info!("Font saved to {} ({} bytes)", self.font_path.display(), size);
                true
            }
            Err(e) => {
                warn!("Font download failed: {:#}", e);
                false
            }
        }
    }

    async fn download(&self, url: &str) -> Result<usize> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to request font")?;

        if !response.status().is_success() {
            anyhow::bail!("Font download returned status: {}", response.status());
        }

        let font_data = response.bytes().await?.to_vec();
        if font_data.len() < MIN_FONT_BYTES {
            anyhow::bail!("Font download too small ({} bytes)", font_data.len());
        }

        if let Some(parent) = self.font_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create font directory")?;
        }

        // Write next to the target and rename, so a crash never leaves half a font
        let partial = self.font_path.with_file_name(format!(
            ".{}.part",
            sanitize_filename(&file_name(&self.font_path))
        ));
        tokio::fs::write(&partial, &font_data)
            .await
            .context("Failed to write font file")?;
        tokio::fs::rename(&partial, &self.font_path)
            .await
            .context("Failed to move font into place")?;

        Ok(font_data.len())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "font".to_string())
}

/// Sanitize filename to prevent path traversal
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c,
            ' ' => '_',
            _ => '-',
        })
        .collect()
}
