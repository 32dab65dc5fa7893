//! Image store
//!
//! Associates uploaded image files with users and listings:
//! - validates the filename extension against an allow-list
//! - generates collision-free storage names (uuid v4 + extension)
//! - persists bytes under a deterministic folder per owner kind
//! - resolves stored relative paths to absolute public URLs, with a
//!   placeholder fallback
//!
//! Stored paths are public paths ("uploads/<folder>/<name>") independent
//! of where the upload root lives on disk.

use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::config::UploadConfig;

/// Extensions accepted for image uploads
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// URL prefix under which the upload root is served
const PUBLIC_PREFIX: &str = "uploads";

/// Placeholder served when no image is stored
const DEFAULT_LISTING_IMAGE: &str = "uploads/listing_pictures/default-avatar.jpeg";
const DEFAULT_PROFILE_PICTURE: &str = "uploads/profile_pictures/default-avatar.jpeg";

/// Folder conventions per owner kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFolder {
    ListingPictures,
    ProfilePictures,
}

impl ImageFolder {
    fn dir(self) -> &'static str {
        match self {
            ImageFolder::ListingPictures => "listing_pictures",
            ImageFolder::ProfilePictures => "profile_pictures",
        }
    }
}

/// Error types for image store operations
#[derive(Debug, thiserror::Error)]
pub enum ImageStoreError {
    /// Extension not in the allow-list
    #[error("Invalid file type. Only .jpg, .jpeg, .png allowed.")]
    InvalidExtension,

    /// File exceeds the configured size limit
    #[error("File too large. Maximum size: {0} bytes")]
    FileTooLarge(u64),

    /// Filesystem failure
    #[error("Image storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// Filesystem-backed image store
pub struct ImageStore {
    root: PathBuf,
    max_file_size: u64,
    public_url: String,
}

impl ImageStore {
    /// Create an image store rooted at the configured upload directory.
    pub fn new(upload: &UploadConfig, public_url: &str) -> Self {
        Self {
            root: upload.path.clone(),
            max_file_size: upload.max_file_size,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Validate a filename extension against the allow-list, returning the
    /// normalized (lowercase) extension.
    pub fn validate_extension(filename: &str) -> Result<String, ImageStoreError> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or(ImageStoreError::InvalidExtension)?;

        if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            Ok(ext)
        } else {
            Err(ImageStoreError::InvalidExtension)
        }
    }

    /// Persist uploaded bytes under the folder convention and return the
    /// stored relative path ("uploads/<folder>/<uuid>.<ext>").
    pub async fn store(
        &self,
        folder: ImageFolder,
        filename: &str,
        bytes: &[u8],
    ) -> Result<String, ImageStoreError> {
        let ext = Self::validate_extension(filename)?;

        if bytes.len() as u64 > self.max_file_size {
            return Err(ImageStoreError::FileTooLarge(self.max_file_size));
        }

        let dir = self.root.join(folder.dir());
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
        }

        let stored_name = format!("{}.{}", Uuid::new_v4(), ext);
        fs::write(dir.join(&stored_name), bytes).await?;

        Ok(format!("{}/{}/{}", PUBLIC_PREFIX, folder.dir(), stored_name))
    }

    /// Persist a listing image.
    pub async fn store_listing_image(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<String, ImageStoreError> {
        self.store(ImageFolder::ListingPictures, filename, bytes).await
    }

    /// Persist a profile picture.
    pub async fn store_profile_picture(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<String, ImageStoreError> {
        self.store(ImageFolder::ProfilePictures, filename, bytes).await
    }

    /// Delete a stored file by its relative path. Missing files are not an
    /// error; replacement and deletion may race and the loser finds
    /// nothing to remove.
    pub async fn delete(&self, relative_path: &str) -> Result<(), ImageStoreError> {
        let Some(path) = self.file_path(relative_path) else {
            return Ok(());
        };

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Check whether a stored relative path resolves to an existing file.
    pub fn exists(&self, relative_path: &str) -> bool {
        self.file_path(relative_path)
            .map(|p| p.exists())
            .unwrap_or(false)
    }

    /// Absolute public URL for a stored relative path.
    pub fn absolute_url(&self, relative_path: &str) -> String {
        format!("{}/{}", self.public_url, relative_path.trim_start_matches('/'))
    }

    /// Resolve a listing's stored image path to an absolute URL, falling
    /// back to the default placeholder when none is stored.
    pub fn listing_image_url(&self, image: Option<&str>) -> String {
        match image {
            Some(path) if !path.trim().is_empty() => self.absolute_url(path),
            _ => self.absolute_url(DEFAULT_LISTING_IMAGE),
        }
    }

    /// Resolve a user's stored profile picture to an absolute URL,
    /// verifying the file exists on disk and falling back to the default
    /// placeholder otherwise.
    pub fn profile_picture_url(&self, picture: Option<&str>) -> String {
        match picture {
            Some(path) if !path.trim().is_empty() && self.exists(path) => self.absolute_url(path),
            _ => self.absolute_url(DEFAULT_PROFILE_PICTURE),
        }
    }

    /// Map a stored relative path back to its on-disk location.
    fn file_path(&self, relative_path: &str) -> Option<PathBuf> {
        let trimmed = relative_path.trim_start_matches('/');
        let rest = trimmed.strip_prefix(PUBLIC_PREFIX)?.trim_start_matches('/');
        if rest.is_empty() || rest.contains("..") {
            return None;
        }
        Some(self.root.join(rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store(dir: &Path) -> ImageStore {
        let upload = UploadConfig {
            path: dir.to_path_buf(),
            max_file_size: 1024,
        };
        ImageStore::new(&upload, "http://localhost:5067")
    }

    #[test]
    fn test_validate_extension_allowed() {
        assert_eq!(ImageStore::validate_extension("photo.jpg").unwrap(), "jpg");
        assert_eq!(ImageStore::validate_extension("photo.JPEG").unwrap(), "jpeg");
        assert_eq!(ImageStore::validate_extension("photo.PNG").unwrap(), "png");
    }

    #[test]
    fn test_validate_extension_rejected() {
        assert!(ImageStore::validate_extension("malware.exe").is_err());
        assert!(ImageStore::validate_extension("page.html").is_err());
        assert!(ImageStore::validate_extension("noextension").is_err());
        assert!(ImageStore::validate_extension("archive.tar.gz").is_err());
    }

    #[tokio::test]
    async fn test_store_writes_file_and_returns_public_path() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = test_store(dir.path());

        let path = store
            .store_listing_image("shoe.jpg", b"fake image bytes")
            .await
            .expect("Failed to store");

        assert!(path.starts_with("uploads/listing_pictures/"));
        assert!(path.ends_with(".jpg"));
        assert!(store.exists(&path));
    }

    #[tokio::test]
    async fn test_store_names_are_collision_free() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = test_store(dir.path());

        let a = store
            .store_listing_image("same.png", b"a")
            .await
            .expect("Failed to store");
        let b = store
            .store_listing_image("same.png", b"b")
            .await
            .expect("Failed to store");

        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_store_rejects_invalid_extension() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = test_store(dir.path());

        let result = store.store_listing_image("script.js", b"alert(1)").await;
        assert!(matches!(result, Err(ImageStoreError::InvalidExtension)));
    }

    #[tokio::test]
    async fn test_store_rejects_oversize_file() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = test_store(dir.path());

        let big = vec![0u8; 2048];
        let result = store.store_listing_image("big.jpg", &big).await;
        assert!(matches!(result, Err(ImageStoreError::FileTooLarge(_))));
    }

    #[tokio::test]
    async fn test_delete_removes_file() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = test_store(dir.path());

        let path = store
            .store_profile_picture("me.png", b"pixels")
            .await
            .expect("Failed to store");
        assert!(store.exists(&path));

        store.delete(&path).await.expect("Failed to delete");
        assert!(!store.exists(&path));
    }

    #[tokio::test]
    async fn test_delete_missing_file_is_ok() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = test_store(dir.path());

        store
            .delete("uploads/listing_pictures/ghost.jpg")
            .await
            .expect("Deleting a missing file should not error");
    }

    #[tokio::test]
    async fn test_replacement_leaves_only_new_file() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = test_store(dir.path());

        let old = store
            .store_listing_image("v1.jpg", b"old")
            .await
            .expect("Failed to store");
        let new = store
            .store_listing_image("v2.jpg", b"new")
            .await
            .expect("Failed to store");
        store.delete(&old).await.expect("Failed to delete old");

        assert!(!store.exists(&old));
        assert!(store.exists(&new));
    }

    #[test]
    fn test_listing_image_url_fallback() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = test_store(dir.path());

        assert_eq!(
            store.listing_image_url(None),
            "http://localhost:5067/uploads/listing_pictures/default-avatar.jpeg"
        );
        assert_eq!(
            store.listing_image_url(Some("")),
            "http://localhost:5067/uploads/listing_pictures/default-avatar.jpeg"
        );
        assert_eq!(
            store.listing_image_url(Some("uploads/listing_pictures/x.jpg")),
            "http://localhost:5067/uploads/listing_pictures/x.jpg"
        );
    }

    #[tokio::test]
    async fn test_profile_picture_url_checks_existence() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = test_store(dir.path());

        // Path recorded in the database but file is gone
        assert_eq!(
            store.profile_picture_url(Some("uploads/profile_pictures/gone.jpg")),
            "http://localhost:5067/uploads/profile_pictures/default-avatar.jpeg"
        );

        let stored = store
            .store_profile_picture("real.jpg", b"pixels")
            .await
            .expect("Failed to store");
        assert_eq!(
            store.profile_picture_url(Some(&stored)),
            format!("http://localhost:5067/{}", stored)
        );
    }

    #[test]
    fn test_file_path_rejects_traversal() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = test_store(dir.path());

        assert!(!store.exists("uploads/../../etc/passwd"));
        assert!(!store.exists("somewhere/else.jpg"));
    }
}
