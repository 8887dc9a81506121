//! Folio backend service.
//!
//! `GET /fortune`, `GET /photo` and `GET /healthz` behind a permissive CORS
//! policy.

pub mod config;
pub mod error;
pub mod fortune;
pub mod photo;
pub mod signer;

use axum::http::{Method, header};
use axum::{Json, Router, routing::get};
use config::AppConfig;
use serde_json::json;
use signer::{Credentials, PhotoSigner, SigV4Signer};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const SERVICE_NAME: &str = "folio-server";

/// Shared application state.
pub struct AppState {
    pub config: AppConfig,
    pub signer: Arc<dyn PhotoSigner>,
}

impl AppState {
    /// State with a SigV4 signer using credentials from the environment.
    pub fn from_config(config: AppConfig) -> Self {
        let credentials = Credentials::from_env();
        if credentials.is_none() {
            tracing::warn!("no AWS credentials in environment; /photo will fail");
        }
        let signer = SigV4Signer::new(config.photo.region.clone(), credentials)
            .with_endpoint_host(config.photo.endpoint_host.clone());
        Self {
            config,
            signer: Arc::new(signer),
        }
    }
}

pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/fortune", get(fortune::fortune))
        .route("/photo", get(photo::photo))
        .with_state(state)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "ok": true, "service": SERVICE_NAME }))
}
