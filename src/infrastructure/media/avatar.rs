//! Avatar image storage

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::domain::account::AccountId;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// File extensions accepted for avatar uploads
pub const ALLOWED_AVATAR_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

pub const DEFAULT_MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// Relative storage path of an account's avatar
pub fn avatar_path(id: &AccountId, extension: &str) -> String {
    format!("avatars/user_{0}/avatar_{0}.{1}", id, extension)
}

/// Work out the stored extension of an upload from its file name or content type
///
/// The file name wins when it carries an extension; the content type is the
/// fallback. Anything outside the allowed image types is rejected.
pub fn avatar_extension(
    file_name: Option<&str>,
    content_type: Option<&str>,
) -> Result<String, DomainError> {
    let from_name = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);

    let extension = match from_name {
        Some(ext) => {
            let guessed = file_name.and_then(|name| mime_guess::from_path(name).first());
            if !guessed.is_some_and(|mime| mime.type_() == mime_guess::mime::IMAGE) {
                return Err(invalid_extension(&ext));
            }
            ext
        }
        None => content_type
            .and_then(mime_guess::get_mime_extensions_str)
            .and_then(|extensions| {
                extensions
                    .iter()
                    .find(|ext| ALLOWED_AVATAR_EXTENSIONS.contains(*ext))
            })
            .map(|ext| ext.to_string())
            .ok_or_else(|| DomainError::field("avatar", INVALID_IMAGE))?,
    };

    if !ALLOWED_AVATAR_EXTENSIONS.contains(&extension.as_str()) {
        return Err(invalid_extension(&extension));
    }

    Ok(extension)
}

fn invalid_extension(extension: &str) -> DomainError {
    DomainError::field(
        "avatar",
        format!(
            "File extension \"{}\" is not allowed. Allowed extensions are: {}.",
            extension,
            ALLOWED_AVATAR_EXTENSIONS.join(", ")
        ),
    )
}

/// Storage backend for avatar images
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AvatarStore: Send + Sync + Debug {
    /// Store the image and return its relative path
    async fn save(
        &self,
        id: &AccountId,
        extension: &str,
        bytes: &[u8],
    ) -> Result<String, DomainError>;

    /// Remove a previously stored image; missing files are ignored
    async fn remove(&self, path: &str) -> Result<(), DomainError>;

    /// Largest accepted upload in bytes
    fn max_bytes(&self) -> usize;
}

/// Avatar store writing below a media root on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalAvatarStore {
    root: PathBuf,
    max_bytes: usize,
}

impl LocalAvatarStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_bytes: DEFAULT_MAX_AVATAR_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a stored relative path, refusing anything that escapes the root
    fn resolve(&self, relative: &str) -> Result<PathBuf, DomainError> {
        let path = Path::new(relative);

        let escapes = path.components().any(|c| {
            !matches!(c, std::path::Component::Normal(_))
        });

        if escapes {
            return Err(DomainError::validation(format!(
                "Invalid media path '{}'",
                relative
            )));
        }

        Ok(self.root.join(path))
    }
}

#[async_trait]
impl AvatarStore for LocalAvatarStore {
    async fn save(
        &self,
        id: &AccountId,
        extension: &str,
        bytes: &[u8],
    ) -> Result<String, DomainError> {
        if bytes.is_empty() {
            return Err(DomainError::field("avatar", "The submitted file is empty."));
        }

        if bytes.len() > self.max_bytes {
            return Err(DomainError::field(
                "avatar",
                format!(
                    "The avatar must be at most {} bytes, got {}.",
                    self.max_bytes,
                    bytes.len()
                ),
            ));
        }

        let relative = avatar_path(id, extension);
        let target = self.resolve(&relative)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                DomainError::storage(format!("Failed to create avatar directory: {}", e))
            })?;
        }

        // Write to a temporary file first so readers never see a partial image
        let tmp = target.with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));
        let write = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
            tokio::fs::rename(&tmp, &target).await
        };

        if let Err(e) = write.await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(DomainError::storage(format!("Failed to store avatar: {}", e)));
        }

        debug!(account_id = %id, path = %relative, size = bytes.len(), "Stored avatar");
        Ok(relative)
    }

    async fn remove(&self, path: &str) -> Result<(), DomainError> {
        let target = self.resolve(path)?;

        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path, "Avatar to remove was already gone");
                Ok(())
            }
            Err(e) => Err(DomainError::storage(format!(
                "Failed to remove avatar '{}': {}",
                path, e
            ))),
        }
    }

    fn max_bytes(&self) -> usize {
        self.max_bytes
    }
}
