//! Read-only access to post images stored on the local filesystem.

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum MediaStoreError {
    #[error("invalid media path")]
    InvalidPath,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MediaStoreError {
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::InvalidPath => true,
            Self::Io(err) => err.kind() == std::io::ErrorKind::NotFound,
        }
    }
}

/// Filesystem-backed media directory.
#[derive(Debug)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Read a stored file addressed relative to the media root.
    pub async fn read(&self, stored_path: &str) -> Result<Bytes, MediaStoreError> {
        let absolute = self.resolve(stored_path)?;
        let data = fs::read(absolute).await?;
        Ok(Bytes::from(data))
    }

    fn resolve(&self, stored_path: &str) -> Result<PathBuf, MediaStoreError> {
        let relative = Path::new(stored_path);
        if stored_path.is_empty()
            || relative.is_absolute()
            || relative
                .components()
                .any(|component| matches!(component, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(MediaStoreError::InvalidPath);
        }

        Ok(self.root.join(relative))
    }
}
