//! Upload Storage Service
//!
//! Disk-backed image storage for event images and profile photos.
//! Filenames follow `<epoch-ms>-<random-int><ext>`; only common image
//! extensions are accepted and files are capped at 10 MB. Deletion is
//! best-effort: a failed unlink is logged, never surfaced.

use std::path::{Path, PathBuf};

use rand::Rng;
use tracing::warn;

use crate::error::{GatherError, Result};

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

const ALLOWED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

/// A stored image: where it lives on disk and the relative path kept in
/// the document (e.g. `uploads/1700000000000-123456789.png`).
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub relative_path: String,
}

pub struct UploadService {
    public_dir: PathBuf,
}

impl UploadService {
    pub fn new(public_dir: impl Into<PathBuf>) -> Self {
        Self {
            public_dir: public_dir.into(),
        }
    }

    /// Create the served directories if missing.
    pub async fn ensure_directories(&self) -> Result<()> {
        for sub in ["uploads", "profiles"] {
            tokio::fs::create_dir_all(self.public_dir.join(sub))
                .await
                .map_err(|e| GatherError::internal(format!("Cannot create {} directory: {}", sub, e)))?;
        }
        Ok(())
    }

    /// Persist an event image under `uploads/`.
    pub async fn store_event_image(&self, original_filename: &str, bytes: &[u8]) -> Result<StoredImage> {
        self.store("uploads", original_filename, bytes).await
    }

    /// Persist a profile photo under `profiles/`.
    pub async fn store_profile_image(&self, original_filename: &str, bytes: &[u8]) -> Result<StoredImage> {
        self.store("profiles", original_filename, bytes).await
    }

    async fn store(&self, subdir: &str, original_filename: &str, bytes: &[u8]) -> Result<StoredImage> {
        let extension = Self::validated_extension(original_filename)?;
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(GatherError::validation("Image exceeds the 10MB size limit"));
        }

        let filename = Self::generate_filename(&extension);
        let relative_path = format!("{}/{}", subdir, filename);
        let full_path = self.public_dir.join(&relative_path);

        tokio::fs::write(&full_path, bytes)
            .await
            .map_err(|e| GatherError::internal(format!("Failed to store image: {}", e)))?;

        Ok(StoredImage { relative_path })
    }

    /// Best-effort removal of a stored image. Failures are logged and
    /// swallowed so cascades never fail on a missing file.
    pub async fn delete_image(&self, relative_path: &str) {
        let full_path = self.public_dir.join(relative_path);
        if let Err(e) = tokio::fs::remove_file(&full_path).await {
            warn!(path = %full_path.display(), error = %e, "failed to delete stored image");
        }
    }

    fn validated_extension(filename: &str) -> Result<String> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            Ok(extension)
        } else {
            Err(GatherError::validation("Only image files are allowed!"))
        }
    }

    fn generate_filename(extension: &str) -> String {
        let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
        format!(
            "{}-{}.{}",
            chrono::Utc::now().timestamp_millis(),
            suffix,
            extension
        )
    }
}
