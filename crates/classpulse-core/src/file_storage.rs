//! File storage for user uploads (profile pictures).
//!
//! Business logic talks to the [`FileStorage`] trait; [`LocalFileStorage`] writes
//! under a base directory that the HTTP server exposes at a URL prefix
//! (`/uploads` by default).
//!
//! ```ignore
//! let storage = LocalFileStorage::new(PathBuf::from("./uploads"), "/uploads".to_string());
//! storage.validate_upload("image/png", bytes.len())?;
//! let key = storage.save("profile-pictures/abc.png", &bytes).await?;
//! let url = storage.get_url(&key)?; // "/uploads/profile-pictures/abc.png"
//! ```

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use tokio::fs;

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

pub trait FileStorage: Send + Sync {
    /// Stores `content` under `key` and returns the key.
    fn save<'a>(&'a self, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String>;

    /// Removes the file; a missing file is not an error.
    fn delete<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()>;

    /// Public URL for a stored key.
    fn get_url(&self, key: &str) -> Result<String, StorageError>;

    /// Inverse of [`FileStorage::get_url`]; `None` when the URL is not ours.
    fn key_from_url(&self, url: &str) -> Option<String>;

    /// Checks the declared MIME type and size before anything is written.
    fn validate_upload(&self, content_type: &str, len: usize) -> Result<(), StorageError>;
}

#[derive(Debug)]
pub enum StorageError {
    InvalidFileSize { max_bytes: usize },
    InvalidMimeType { received: String },
    IoError(std::io::Error),
    InvalidKey(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFileSize { max_bytes } => {
                write!(f, "File exceeds maximum size of {} MB", max_bytes / (1024 * 1024))
            }
            Self::InvalidMimeType { received } => {
                write!(f, "Only image files are allowed (received '{}')", received)
            }
            Self::IoError(e) => write!(f, "I/O error: {}", e),
            Self::InvalidKey(msg) => write!(f, "Invalid storage key: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e)
    }
}

impl StorageError {
    /// Whether the failure was caused by the client's file rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidFileSize { .. } | Self::InvalidMimeType { .. } | Self::InvalidKey(_)
        )
    }
}

#[derive(Clone, Debug)]
pub struct LocalFileStorage {
    base_dir: PathBuf,
    url_prefix: String,
    max_file_size: usize,
}

impl LocalFileStorage {
    pub fn new(base_dir: PathBuf, url_prefix: String) -> Self {
        Self::with_max_size(base_dir, url_prefix, MAX_UPLOAD_BYTES)
    }

    pub fn with_max_size(base_dir: PathBuf, url_prefix: String, max_file_size: usize) -> Self {
        Self {
            base_dir,
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
            max_file_size,
        }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    fn validate_key(key: &str) -> Result<(), StorageError> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') || key.starts_with('\\')
        {
            return Err(StorageError::InvalidKey(
                "Key must not be empty, contain '..', or start with a separator".to_string(),
            ));
        }

        if !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '/' || c == '.')
        {
            return Err(StorageError::InvalidKey(
                "Key contains invalid characters".to_string(),
            ));
        }

        Ok(())
    }
}

impl FileStorage for LocalFileStorage {
    fn save<'a>(&'a self, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String> {
        Box::pin(async move {
            Self::validate_key(key)?;

            if content.len() > self.max_file_size {
                return Err(StorageError::InvalidFileSize {
                    max_bytes: self.max_file_size,
                });
            }

            let file_path = self.base_dir.join(key);
            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&file_path, content).await?;

            Ok(key.to_string())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            Self::validate_key(key)?;

            match fs::remove_file(self.base_dir.join(key)).await {
                Ok(_) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn get_url(&self, key: &str) -> Result<String, StorageError> {
        Self::validate_key(key)?;
        Ok(format!("{}/{}", self.url_prefix, key))
    }

    fn key_from_url(&self, url: &str) -> Option<String> {
        let key = url.strip_prefix(&self.url_prefix)?.strip_prefix('/')?;
        Self::validate_key(key).ok()?;
        Some(key.to_string())
    }

    fn validate_upload(&self, content_type: &str, len: usize) -> Result<(), StorageError> {
        if !content_type.starts_with("image/") {
            return Err(StorageError::InvalidMimeType {
                received: content_type.to_string(),
            });
        }
        if len > self.max_file_size {
            return Err(StorageError::InvalidFileSize {
                max_bytes: self.max_file_size,
            });
        }
        Ok(())
    }
}

/// File extension for an upload, taken from the original name or the MIME subtype.
pub fn upload_extension(file_name: Option<&str>, content_type: &str) -> String {
    let from_name = file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    from_name.unwrap_or_else(|| match content_type {
        "image/jpeg" => "jpg".to_string(),
        "image/svg+xml" => "svg".to_string(),
        other => other
            .strip_prefix("image/")
            .filter(|s| s.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("bin")
            .to_string(),
    })
}
