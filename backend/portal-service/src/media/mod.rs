/// Media store for post images
///
/// Uploads return a stable public id plus a delivery URL; deletion is by
/// public id. Calls are made once, with no retry.
pub mod cloudinary;
pub mod memory;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use cloudinary::CloudinaryMediaStore;
pub use memory::InMemoryMediaStore;

/// An image received from a client
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedAsset {
    pub public_id: String,
    pub url: String,
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(&self, file: MediaFile) -> Result<UploadedAsset>;

    /// Deleting an unknown id succeeds
    async fn delete(&self, public_id: &str) -> Result<()>;
}
