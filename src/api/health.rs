//! Liveness and readiness probes

use axum::{extract::State, Json};
use serde::Serialize;

use crate::{config::StorageBackend, error::AppResult, AppState};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Backend answering the readiness ping
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<&'static str>,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        storage: None,
    })
}

/// Succeeds only when the store answers
pub async fn readiness_check(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    state.services.ping().await?;

    let storage = match state.config.database.backend {
        StorageBackend::Postgres => "postgres",
        StorageBackend::Memory => "memory",
    };

    Ok(Json(HealthResponse {
        status: "ready",
        version: env!("CARGO_PKG_VERSION"),
        storage: Some(storage),
    }))
}
