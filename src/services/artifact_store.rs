// Artifact persistence: JPEG files under the static directory

use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::core::config::StorageConfig;
use crate::core::errors::{PersistenceError, PersistenceResult};
use crate::core::types::OutputArtifact;
use crate::utils::{encode_jpeg, ImageOpError};

/// Writes artifacts once; an id that already exists is never overwritten.
pub struct ArtifactStore {
    root: PathBuf,
    jpeg_quality: u8,
}

impl ArtifactStore {
    /// Opens the store, creating its directory
    pub fn new(config: &StorageConfig) -> PersistenceResult<Self> {
        std::fs::create_dir_all(&config.static_dir).map_err(|source| {
            PersistenceError::DirectoryFailed {
                path: config.static_dir.display().to_string(),
                source,
            }
        })?;

        info!(
            "Artifact store at {} (JPEG quality {})",
            config.static_dir.display(),
            config.jpeg_quality
        );

        Ok(Self {
            root: config.static_dir.clone(),
            jpeg_quality: config.jpeg_quality,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }

    fn staging_path_for(&self, id: &str) -> PathBuf {
        self.root.join(format!(".{}.part", id))
    }

    fn classify(&self, id: &str, source: std::io::Error) -> PersistenceError {
        if source.kind() == std::io::ErrorKind::AlreadyExists {
            PersistenceError::AlreadyExists { id: id.to_string() }
        } else {
            PersistenceError::WriteFailed {
                id: id.to_string(),
                source,
            }
        }
    }

    /// Encodes and writes `artifact`, returning the stored size in bytes.
    pub async fn persist(&self, artifact: OutputArtifact) -> PersistenceResult<usize> {
        let OutputArtifact { id, raster } = artifact;
        let quality = self.jpeg_quality;

        let encoded = tokio::task::spawn_blocking(move || encode_jpeg(&raster, quality))
            .await
            .map_err(|e| PersistenceError::TaskFailed(ImageOpError::from(e).to_string()))?
            .map_err(|source| PersistenceError::EncodeFailed {
                id: id.clone(),
                source,
            })?;

        // Fully written under a staging name first; the id only ever
        // resolves to a complete file
        let staging = self.staging_path_for(&id);
        write_new(&staging, &encoded)
            .await
            .map_err(|source| self.classify(&id, source))?;

        // hard_link refuses an existing target, so publishing never overwrites
        let published = tokio::fs::hard_link(&staging, self.path_for(&id)).await;
        if let Err(e) = tokio::fs::remove_file(&staging).await {
            warn!("Could not remove staging file {}: {}", staging.display(), e);
        }
        published.map_err(|source| self.classify(&id, source))?;

        debug!("Stored artifact {} ({} bytes)", id, encoded.len());
        Ok(encoded.len())
    }
}

/// Creates `path` (which must not exist) and writes `bytes` to it.
///
/// A failed write removes the file again.
async fn write_new(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;

    let written = async {
        file.write_all(bytes).await?;
        file.sync_all().await
    }
    .await;

    if written.is_err() {
        drop(file);
        let _ = tokio::fs::remove_file(path).await;
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn store_in(dir: &Path) -> ArtifactStore {
        ArtifactStore::new(&StorageConfig {
            static_dir: dir.join("static"),
            jpeg_quality: 90,
        })
        .unwrap()
    }

    fn artifact(id: &str) -> OutputArtifact {
        OutputArtifact {
            id: id.to_string(),
            raster: RgbImage::from_pixel(8, 8, Rgb([120, 30, 200])),
        }
    }

    #[tokio::test]
    async fn test_persist_writes_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let size = store.persist(artifact("abc.jpg")).await.unwrap();
        let bytes = std::fs::read(store.path_for("abc.jpg")).unwrap();
        assert_eq!(bytes.len(), size);
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[tokio::test]
    async fn test_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        store.persist(artifact("same.jpg")).await.unwrap();
        let before = std::fs::read(store.path_for("same.jpg")).unwrap();

        let second = store.persist(artifact("same.jpg")).await;
        assert!(matches!(second, Err(PersistenceError::AlreadyExists { .. })));
        assert_eq!(std::fs::read(store.path_for("same.jpg")).unwrap(), before);
    }

    #[tokio::test]
    async fn test_leaves_only_the_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        store.persist(artifact("only.jpg")).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(store.root())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["only.jpg".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_write_publishes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        // A directory squatting on the staging name makes the write fail
        std::fs::create_dir(store.staging_path_for("broken.jpg")).unwrap();

        let result = store.persist(artifact("broken.jpg")).await;

        assert!(result.is_err());
        assert!(!store.path_for("broken.jpg").exists());
    }

    #[tokio::test]
    async fn test_failed_publish_cleans_staging() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        std::fs::create_dir(store.path_for("taken.jpg")).unwrap();

        let result = store.persist(artifact("taken.jpg")).await;

        assert!(matches!(result, Err(PersistenceError::AlreadyExists { .. })));
        assert!(!store.staging_path_for("taken.jpg").exists());
        assert!(store.path_for("taken.jpg").is_dir());
    }

    #[test]
    fn test_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(store.root().is_dir());
    }
}
