//! Media host used for course thumbnails.

mod cloudinary;

use async_trait::async_trait;
use thiserror::Error;

pub use cloudinary::Cloudinary;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Media host request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Media host rejected the upload with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait MediaHost: Send + Sync {
    /// Uploads an image given as a data URI or remote URL. Returns the secure URL to serve it from.
    async fn upload_image(&self, file: &str) -> Result<String, MediaError>;
}
