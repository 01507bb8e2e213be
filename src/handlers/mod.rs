//! HTTP endpoint handlers for the deployments API.

use crate::error::ApiError;
use crate::models::ServiceInfo;
use crate::server::AppState;
use axum::{extract::State, response::Json};
use serde_json::{Value, json};

pub mod deployments;

/// Service banner: name and version.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service information", body = ServiceInfo)),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Database-backed health probe
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service is healthy", body = Value, example = json!({"status": "ok"})),
        (status = 503, description = "Database unreachable", body = ApiError)
    ),
    tag = "root"
)]
pub async fn healthz(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    crate::db::health_check(&state.db).await?;
    Ok(Json(json!({ "status": "ok" })))
}
