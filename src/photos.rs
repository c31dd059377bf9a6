//! Blob storage for player photos: files in one directory, served publicly under [`PUBLIC_PREFIX`].

use crate::error::{AppError, Result};
use crate::models::PlayerId;
use chrono::Utc;
use std::path::{Path, PathBuf};

/// URL prefix the photo directory is mounted at.
pub const PUBLIC_PREFIX: &str = "/photos";

const ALLOWED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

#[derive(Clone, Debug)]
pub struct PhotoStorage {
    dir: PathBuf,
}

impl PhotoStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store a photo as `<player>-<millis>.<ext>` and return its public reference.
    pub async fn upload(&self, player_id: PlayerId, extension: &str, bytes: &[u8]) -> Result<String> {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(AppError::validation(format!("unsupported photo type: {extension}")));
        }
        if bytes.is_empty() {
            return Err(AppError::validation("photo is empty"));
        }
        let name = format!("{}-{}.{}", player_id, Utc::now().timestamp_millis(), ext);
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&name), bytes).await?;
        log::info!("Stored photo {} ({} bytes)", name, bytes.len());
        Ok(format!("{PUBLIC_PREFIX}/{name}"))
    }

    /// Delete a photo by the reference [`upload`](Self::upload) returned.
    pub async fn delete(&self, reference: &str) -> Result<()> {
        let name = Self::file_name(reference)
            .ok_or_else(|| AppError::validation(format!("not a photo reference: {reference}")))?;
        tokio::fs::remove_file(self.dir.join(name)).await?;
        Ok(())
    }

    /// File name inside the photo directory; rejects anything that could escape it.
    fn file_name(reference: &str) -> Option<&str> {
        let name = reference.rsplit_once(&format!("{PUBLIC_PREFIX}/")).map(|(_, n)| n)?;
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.starts_with('.') {
            return None;
        }
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_accepts_full_urls_and_rejects_traversal() {
        assert_eq!(PhotoStorage::file_name("/photos/a-1.jpg"), Some("a-1.jpg"));
        assert_eq!(
            PhotoStorage::file_name("https://example.org/photos/a-1.jpg"),
            Some("a-1.jpg")
        );
        assert_eq!(PhotoStorage::file_name("/photos/../secret"), None);
        assert_eq!(PhotoStorage::file_name("/elsewhere/a.jpg"), None);
    }

    #[tokio::test]
    async fn upload_then_delete() {
        let dir = std::env::temp_dir().join(format!("halisaha-photos-{}", uuid::Uuid::new_v4()));
        let storage = PhotoStorage::new(&dir);
        let id = uuid::Uuid::new_v4();
        let reference = storage.upload(id, "PNG", b"png-bytes").await.unwrap();
        assert!(reference.starts_with("/photos/"));
        assert!(reference.ends_with(".png"));
        storage.delete(&reference).await.unwrap();
        assert!(storage.delete(&reference).await.is_err());
        std::fs::remove_dir_all(dir).ok();
    }
}
