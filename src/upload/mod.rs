//! Image upload client.
//!
//! Profile and group pictures are not stored locally; they are forwarded
//! to a third-party image host (an ImgBB-compatible API) as base64 form
//! data, and the returned hosted URL is stored verbatim in the picture
//! fields. The returned URL is not validated for reachability.

use serde_json::Value;

use crate::error::{ChatError, ChatResult};

/// Client for the image-hosting HTTP API.
#[derive(Clone)]
pub struct ImageUploader {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl ImageUploader {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    /// Upload a base64-encoded image and return its hosted URL.
    ///
    /// Transport failures, a non-success response flag, and a missing URL
    /// all map to `UploadFailed` with the host's message where available.
    pub async fn upload_base64(&self, image: &str) -> ChatResult<String> {
        if image.is_empty() {
            return Err(ChatError::invalid("image payload must not be empty"));
        }

        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("key", self.api_key.as_str()), ("image", image)])
            .send()
            .await
            .map_err(|e| ChatError::UploadFailed(e.to_string()))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| ChatError::UploadFailed(e.to_string()))?;

        if body["success"].as_bool() != Some(true) {
            let message = body["error"]["message"]
                .as_str()
                .unwrap_or("image host rejected the upload")
                .to_string();
            tracing::warn!("image upload rejected: {}", message);
            return Err(ChatError::UploadFailed(message));
        }

        body["data"]["url"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ChatError::UploadFailed("image host returned no URL".to_string()))
    }
}
