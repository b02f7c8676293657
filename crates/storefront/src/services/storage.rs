//! Local file storage for avatars and gallery uploads.
//!
//! Files live under the configured media directory and are served read-only
//! at `/files/*`. The database stores storage-relative paths for media and the
//! public URL for avatars.
//!
//! ```text
//! <media_dir>/avatars/<user-id>-<uuid>.<ext>
//! <media_dir>/media/<uuid>.<ext>
//! ```

use std::path::{Component, Path, PathBuf};

use image::ImageFormat;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use gubre_core::{MediaKind, UserId};

/// URL prefix the media directory is mounted at.
pub const PUBLIC_PREFIX: &str = "/files";

const AVATAR_DIR: &str = "avatars";
const MEDIA_DIR: &str = "media";

/// Errors from the file store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Path escapes the media directory.
    #[error("invalid storage path: {0}")]
    InvalidPath(String),
}

/// Public URL of a storage-relative path.
#[must_use]
pub fn public_url(relative: &str) -> String {
    format!("{PUBLIC_PREFIX}/{}", relative.trim_start_matches('/'))
}

/// Storage-relative path of a public URL produced by [`public_url`].
#[must_use]
pub fn relative_from_url(url: &str) -> Option<&str> {
    url.strip_prefix(PUBLIC_PREFIX)?
        .strip_prefix('/')
        .filter(|rel| !rel.is_empty())
}

/// Why an upload was refused before it reached the disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UploadRejection {
    /// Declared type is not on the allowlist.
    #[error("unsupported content type")]
    UnsupportedType,

    /// File contents do not match the declared type.
    #[error("file contents do not match the declared type")]
    ContentMismatch,
}

/// An upload whose type was checked against its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedUpload {
    pub kind: MediaKind,
    /// Extension the file is stored under; never taken from the client.
    pub extension: &'static str,
}

/// Declared MIME type, stored extension and the container it must sniff as.
const UPLOAD_FORMATS: &[(&str, &str, Container)] = &[
    ("image/png", "png", Container::Image(ImageFormat::Png)),
    ("image/jpeg", "jpg", Container::Image(ImageFormat::Jpeg)),
    ("image/webp", "webp", Container::Image(ImageFormat::WebP)),
    ("video/mp4", "mp4", Container::Mp4),
    ("video/webm", "webm", Container::WebM),
];

const EBML_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];

#[derive(Debug, Clone, Copy)]
enum Container {
    Image(ImageFormat),
    Mp4,
    WebM,
}

impl Container {
    fn matches(self, bytes: &[u8]) -> bool {
        match self {
            Self::Image(format) => {
                image::guess_format(bytes).is_ok_and(|sniffed| sniffed == format)
                    && image::load_from_memory_with_format(bytes, format).is_ok()
            }
            Self::Mp4 => bytes.get(4..8) == Some(b"ftyp".as_slice()),
            Self::WebM => bytes.starts_with(&EBML_MAGIC),
        }
    }
}

/// Check an upload's declared MIME type against the allowlist and its bytes.
///
/// The stored extension comes from the allowlist entry, so a file is always
/// served back with the content type it was validated as.
///
/// # Errors
///
/// Returns `UploadRejection::UnsupportedType` for types outside the allowlist
/// and `UploadRejection::ContentMismatch` when the bytes are something else.
pub fn verify_upload(content_type: &str, bytes: &[u8]) -> Result<VerifiedUpload, UploadRejection> {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    let kind = MediaKind::from_mime(&mime).ok_or(UploadRejection::UnsupportedType)?;

    let &(_, extension, container) = UPLOAD_FORMATS
        .iter()
        .find(|(allowed, _, _)| *allowed == mime)
        .ok_or(UploadRejection::UnsupportedType)?;

    if !container.matches(bytes) {
        return Err(UploadRejection::ContentMismatch);
    }
    Ok(VerifiedUpload { kind, extension })
}

/// Disk-backed file store.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    /// Create a store rooted at `root`. Directories are created lazily.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory on disk.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write an avatar image and return its storage-relative path.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the file cannot be written.
    pub async fn save_avatar(
        &self,
        user_id: UserId,
        extension: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        let relative = format!("{AVATAR_DIR}/{user_id}-{}.{extension}", Uuid::new_v4());
        self.write(&relative, bytes).await?;
        Ok(relative)
    }

    /// Write a gallery upload and return its storage-relative path.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the file cannot be written.
    pub async fn save_media(&self, extension: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let relative = format!("{MEDIA_DIR}/{}.{extension}", Uuid::new_v4());
        self.write(&relative, bytes).await?;
        Ok(relative)
    }

    /// Delete a stored file. A file that is already gone is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidPath` for paths outside the store and
    /// `StorageError::Io` for other filesystem failures.
    pub async fn remove(&self, relative: &str) -> Result<(), StorageError> {
        let path = self.resolve(relative)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Removed stored file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the file behind a public URL; URLs not served by this store are
    /// ignored.
    ///
    /// # Errors
    ///
    /// See [`MediaStorage::remove`].
    pub async fn remove_by_url(&self, url: &str) -> Result<(), StorageError> {
        match relative_from_url(url) {
            Some(relative) => self.remove(relative).await,
            None => Ok(()),
        }
    }

    /// Best-effort cleanup of several files; failures are logged.
    pub async fn remove_all<'p>(&self, paths: impl IntoIterator<Item = &'p str>) {
        for relative in paths {
            if let Err(e) = self.remove(relative).await {
                warn!(path = relative, error = %e, "Failed to remove stored file");
            }
        }
    }

    async fn write(&self, relative: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), size = bytes.len(), "Stored file");
        Ok(())
    }

    /// Join a relative path onto the root, refusing anything that could
    /// escape it.
    fn resolve(&self, relative: &str) -> Result<PathBuf, StorageError> {
        let rel = Path::new(relative);
        let safe = !relative.is_empty()
            && rel
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(StorageError::InvalidPath(relative.to_string()));
        }
        Ok(self.root.join(rel))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url_roundtrip() {
        let url = public_url("media/abc.png");
        assert_eq!(url, "/files/media/abc.png");
        assert_eq!(relative_from_url(&url), Some("media/abc.png"));
        assert_eq!(relative_from_url("https://cdn.example.az/a.png"), None);
        assert_eq!(relative_from_url("/files/"), None);
    }

    fn png_bytes() -> Vec<u8> {
        let mut out = std::io::Cursor::new(Vec::new());
        image::RgbImage::new(2, 2)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_verify_upload_takes_extension_from_allowlist() {
        let png = png_bytes();
        assert_eq!(
            verify_upload("image/png", &png),
            Ok(VerifiedUpload {
                kind: MediaKind::Image,
                extension: "png",
            })
        );
        assert_eq!(verify_upload("IMAGE/PNG; q=1", &png).unwrap().extension, "png");

        let mut mp4 = vec![0, 0, 0, 0x18];
        mp4.extend_from_slice(b"ftypisom");
        assert_eq!(
            verify_upload("video/mp4", &mp4),
            Ok(VerifiedUpload {
                kind: MediaKind::Video,
                extension: "mp4",
            })
        );

        let mut webm = EBML_MAGIC.to_vec();
        webm.extend_from_slice(b"webm");
        assert_eq!(verify_upload("video/webm", &webm).unwrap().extension, "webm");
    }

    #[test]
    fn test_verify_upload_rejects_scriptable_types() {
        let script = b"alert(document.cookie)";
        for mime in [
            "application/javascript",
            "text/javascript",
            "text/html",
            "image/svg+xml",
            "application/octet-stream",
            "",
        ] {
            assert_eq!(
                verify_upload(mime, script),
                Err(UploadRejection::UnsupportedType),
                "{mime}"
            );
        }
    }

    #[test]
    fn test_verify_upload_rejects_mislabelled_content() {
        // A script declared as an image never reaches the disk.
        assert_eq!(
            verify_upload("image/png", b"alert(document.cookie)"),
            Err(UploadRejection::ContentMismatch)
        );
        // A real PNG declared as JPEG is refused too.
        assert_eq!(
            verify_upload("image/jpeg", &png_bytes()),
            Err(UploadRejection::ContentMismatch)
        );
        // Truncated image header.
        assert_eq!(
            verify_upload("image/png", b"\x89PNG\r\n\x1a\n"),
            Err(UploadRejection::ContentMismatch)
        );
        assert_eq!(
            verify_upload("video/mp4", b"<html></html>"),
            Err(UploadRejection::ContentMismatch)
        );
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let storage = MediaStorage::new("/srv/uploads");
        assert!(storage.resolve("media/a.png").is_ok());
        assert!(matches!(
            storage.resolve("../etc/passwd"),
            Err(StorageError::InvalidPath(_))
        ));
        assert!(storage.resolve("/etc/passwd").is_err());
        assert!(storage.resolve("media/../../x").is_err());
        assert!(storage.resolve("").is_err());
    }

    #[tokio::test]
    async fn test_save_and_remove_avatar() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(dir.path());
        let user = UserId::generate();

        let relative = storage.save_avatar(user, "png", b"\x89PNG").await.unwrap();
        assert!(relative.starts_with(&format!("avatars/{user}-")));
        assert!(relative.ends_with(".png"));
        assert_eq!(
            tokio::fs::read(dir.path().join(&relative)).await.unwrap(),
            b"\x89PNG"
        );

        storage.remove_by_url(&public_url(&relative)).await.unwrap();
        assert!(!dir.path().join(&relative).exists());

        // Removing twice is fine.
        storage.remove(&relative).await.unwrap();
    }

    #[tokio::test]
    async fn test_save_media_uses_random_names() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(dir.path());

        let a = storage.save_media("mp4", b"one").await.unwrap();
        let b = storage.save_media("mp4", b"two").await.unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("media/"));

        storage.remove_all([a.as_str(), b.as_str()]).await;
        assert!(!dir.path().join(&a).exists());
        assert!(!dir.path().join(&b).exists());
    }
}
