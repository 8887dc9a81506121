use crate::AppState;
use crate::config::MAX_PHOTO_URL_TTL_SECS;
use crate::error::ServerError;
use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
pub struct PhotoResponse {
    pub url: String,
}

pub async fn photo(State(state): State<Arc<AppState>>) -> Result<Json<PhotoResponse>, ServerError> {
    let binding = &state.config.photo;
    let bucket = binding
        .bucket
        .as_deref()
        .ok_or(ServerError::MissingBinding("PHOTO_BUCKET"))?;
    let key = binding
        .key
        .as_deref()
        .ok_or(ServerError::MissingBinding("PHOTO_KEY"))?;

    let ttl = binding.url_ttl_secs.min(MAX_PHOTO_URL_TTL_SECS);
    let url = state.signer.presign_get(bucket, key, ttl)?;
    tracing::debug!(bucket = %bucket, key = %key, ttl, "presigned photo url");
    Ok(Json(PhotoResponse { url }))
}
