use super::{MediaFile, MediaStore, UploadedAsset};
use crate::config::MediaConfig;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Cloudinary signed upload API client
///
/// Requests are authenticated with `signature = sha1(sorted_params + api_secret)`
/// where `sorted_params` is `k1=v1&k2=v2` over the signed parameters.
pub struct CloudinaryMediaStore {
    cloud_name: String,
    api_key: String,
    api_secret: String,
    folder: String,
    api_base_url: String,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CloudinaryMediaStore {
    pub fn from_config(config: &MediaConfig) -> Result<Self> {
        let (Some(cloud_name), Some(api_key), Some(api_secret)) = (
            config.cloud_name.clone(),
            config.api_key.clone(),
            config.api_secret.clone(),
        ) else {
            return Err(AppError::Internal(
                "Cloudinary credentials are not configured".to_string(),
            ));
        };

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            cloud_name,
            api_key,
            api_secret,
            folder: config.upload_folder.clone(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/{}/image/{}",
            self.api_base_url, self.cloud_name, action
        )
    }

    async fn read_error(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        format!("Cloudinary API error: {} - {}", status, body)
    }
}

/// Signature over the given params (any order) and the API secret
pub(crate) fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<_> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl MediaStore for CloudinaryMediaStore {
    async fn upload(&self, file: MediaFile) -> Result<UploadedAsset> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("folder", self.folder.as_str()), ("timestamp", timestamp.as_str())],
            &self.api_secret,
        );

        let mut part = Part::bytes(file.bytes).file_name(file.filename.clone());
        if let Some(content_type) = &file.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| AppError::InvalidInput(format!("Invalid content type: {}", e)))?;
        }

        let form = Form::new()
            .part("file", part)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", self.folder.clone())
            .text("signature", signature);

        let response = self
            .http_client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Cloudinary upload request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(Self::read_error(response).await));
        }

        let uploaded: UploadResponse = response.json().await.map_err(|e| {
            AppError::Upstream(format!("Failed to parse Cloudinary response: {}", e))
        })?;

        tracing::info!(
            public_id = %uploaded.public_id,
            filename = %file.filename,
            "image uploaded to Cloudinary"
        );

        Ok(UploadedAsset {
            public_id: uploaded.public_id,
            url: uploaded.secure_url,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<()> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("public_id", public_id), ("timestamp", timestamp.as_str())],
            &self.api_secret,
        );

        let response = self
            .http_client
            .post(self.endpoint("destroy"))
            .form(&[
                ("public_id", public_id),
                ("api_key", self.api_key.as_str()),
                ("timestamp", timestamp.as_str()),
                ("signature", signature.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Cloudinary destroy request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(Self::read_error(response).await));
        }

        let destroyed: DestroyResponse = response.json().await.map_err(|e| {
            AppError::Upstream(format!("Failed to parse Cloudinary response: {}", e))
        })?;

        match destroyed.result.as_str() {
            "ok" => Ok(()),
            "not found" => {
                tracing::warn!(%public_id, "image already absent from Cloudinary");
                Ok(())
            }
            other => Err(AppError::Upstream(format!(
                "Cloudinary destroy returned '{}'",
                other
            ))),
        }
    }
}
