//! Uploaded media on the local filesystem
//!
//! Recipe images live at `<media_root>/uploads/recipe/<uuid>.<ext>` and are
//! served back under the configured media URL prefix. The database stores the
//! path relative to the media root.

use crate::core::config::StorageConfig;
use crate::core::error::{ApiError, ErrorContext, Result};
use image::ImageFormat;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

const RECIPE_IMAGE_DIR: &str = "uploads/recipe";

const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

pub struct MediaStore {
    root: PathBuf,
    url_prefix: String,
    max_upload_size: usize,
}

impl MediaStore {
    /// Create the store, making sure the upload directory exists
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let root = config.media_root.clone();
        std::fs::create_dir_all(root.join(RECIPE_IMAGE_DIR))
            .context(format!("Failed to prepare media root {}", root.display()))?;

        Ok(Self {
            root,
            url_prefix: config.media_url.trim_end_matches('/').to_string(),
            max_upload_size: config.max_upload_size,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    pub fn max_upload_size(&self) -> usize {
        self.max_upload_size
    }

    /// Public URL for a stored relative path
    pub fn public_url(&self, relative: &str) -> String {
        format!("{}/{}", self.url_prefix, relative.trim_start_matches('/'))
    }

    /// Validate `bytes` as a JPEG, PNG or WebP image and write it under a fresh
    /// name. Returns the path relative to the media root.
    pub async fn save_recipe_image(&self, bytes: Vec<u8>) -> Result<String> {
        if bytes.is_empty() {
            return Err(ApiError::field("image", "The submitted file is empty."));
        }
        if bytes.len() > self.max_upload_size {
            return Err(ApiError::field(
                "image",
                format!("Ensure the file is at most {} bytes.", self.max_upload_size),
            ));
        }

        let (bytes, extension) = tokio::task::spawn_blocking(move || {
            let extension = detect_image(&bytes)?;
            Ok::<_, ApiError>((bytes, extension))
        })
        .await
        .map_err(|e| ApiError::TaskError(format!("Image decoding task failed: {}", e)))??;

        let relative = format!("{}/{}.{}", RECIPE_IMAGE_DIR, Uuid::new_v4(), extension);
        let path = self.root.join(&relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &bytes).await?;

        tracing::debug!(path = %relative, size = bytes.len(), "Stored recipe image");
        Ok(relative)
    }

    /// Remove a stored file; a file that is already gone is not an error
    pub async fn delete(&self, relative: &str) -> Result<()> {
        let path = self.resolve(relative)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(path = %relative, "Removed media file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Absolute path for a stored relative path, refusing anything that
    /// escapes the media root
    pub fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let relative = Path::new(relative);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(ApiError::InvalidRequest(format!(
                "Invalid media path: {}",
                relative.display()
            )));
        }
        Ok(self.root.join(relative))
    }
}

/// File extension for a decodable image, or a field error
fn detect_image(bytes: &[u8]) -> Result<&'static str> {
    let invalid = || ApiError::field("image", INVALID_IMAGE);

    let format = image::guess_format(bytes).map_err(|_| invalid())?;
    let extension = match format {
        ImageFormat::Jpeg => "jpg",
        ImageFormat::Png => "png",
        ImageFormat::WebP => "webp",
        _ => return Err(invalid()),
    };

    image::load_from_memory_with_format(bytes, format).map_err(|e| {
        tracing::warn!("Failed to decode uploaded image: {}", e);
        invalid()
    })?;

    Ok(extension)
}

/// A small valid PNG for tests
#[cfg(test)]
pub(crate) fn sample_png() -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::new_rgb8(10, 10)
        .write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(max_upload_size: usize) -> (MediaStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = MediaStore::new(&StorageConfig {
            media_root: dir.path().to_path_buf(),
            media_url: "/media/".to_string(),
            max_upload_size,
        })
        .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_save_png() {
        let (store, dir) = store(1024 * 1024);
        let relative = store.save_recipe_image(sample_png()).await.unwrap();

        assert!(relative.starts_with("uploads/recipe/"));
        assert!(relative.ends_with(".png"));
        assert!(dir.path().join(&relative).exists());
        assert_eq!(store.public_url(&relative), format!("/media/{}", relative));
    }

    #[tokio::test]
    async fn test_rejects_non_image() {
        let (store, dir) = store(1024 * 1024);
        let err = store.save_recipe_image(b"notimage".to_vec()).await.unwrap_err();

        assert!(matches!(err, ApiError::InvalidField { ref field, .. } if field == "image"));
        let stored = std::fs::read_dir(dir.path().join(RECIPE_IMAGE_DIR)).unwrap().count();
        assert_eq!(stored, 0);
    }

    #[tokio::test]
    async fn test_rejects_truncated_png() {
        let (store, _dir) = store(1024 * 1024);
        let mut bytes = sample_png();
        bytes.truncate(bytes.len() / 2);

        assert!(store.save_recipe_image(bytes).await.is_err());
    }

    #[tokio::test]
    async fn test_rejects_oversized_upload() {
        let (store, _dir) = store(16);
        assert!(store.save_recipe_image(sample_png()).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (store, dir) = store(1024 * 1024);
        let relative = store.save_recipe_image(sample_png()).await.unwrap();

        store.delete(&relative).await.unwrap();
        assert!(!dir.path().join(&relative).exists());
        store.delete(&relative).await.unwrap();
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let (store, _dir) = store(1024);
        assert!(store.resolve("../etc/passwd").is_err());
        assert!(store.resolve("/etc/passwd").is_err());
        assert!(store.resolve("uploads/recipe/a.png").is_ok());
    }
}
