//! Image upload handler.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::ChatResult;
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    /// Base64-encoded image payload, without a data-URL prefix.
    pub image: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// POST /api/upload
///
/// Proxies the payload to the image host and returns the hosted URL. The
/// caller stores that URL in a profile or group picture field afterwards.
pub async fn image(
    State(state): State<AppState>,
    Json(request): Json<UploadRequest>,
) -> ChatResult<Json<UploadResponse>> {
    let url = state.uploader.upload_base64(&request.image).await?;
    Ok(Json(UploadResponse { url }))
}
