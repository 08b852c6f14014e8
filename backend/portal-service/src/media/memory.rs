use super::{MediaFile, MediaStore, UploadedAsset};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Keeps uploads in memory; failures can be switched on to exercise
/// the upload/delete error paths.
#[derive(Clone, Default)]
pub struct InMemoryMediaStore {
    assets: Arc<Mutex<HashMap<String, MediaFile>>>,
    fail_uploads: Arc<AtomicBool>,
    fail_deletes: Arc<AtomicBool>,
}

impl InMemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub async fn contains(&self, public_id: &str) -> bool {
        self.assets.lock().await.contains_key(public_id)
    }

    pub async fn asset_count(&self) -> usize {
        self.assets.lock().await.len()
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn upload(&self, file: MediaFile) -> Result<UploadedAsset> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(AppError::Upstream("media upload failed".to_string()));
        }

        let public_id = format!("memory/{}", Uuid::new_v4());
        let url = format!("memory://{}/{}", public_id, file.filename);
        self.assets.lock().await.insert(public_id.clone(), file);

        Ok(UploadedAsset { public_id, url })
    }

    async fn delete(&self, public_id: &str) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(AppError::Upstream("media delete failed".to_string()));
        }

        self.assets.lock().await.remove(public_id);
        Ok(())
    }
}
