//! Bearer-token authentication and owner scoping for protected endpoints.
//!
//! The middleware authenticates the caller against the configured API tokens
//! and resolves the `X-Owner-Id` header into an [`OwnerId`], which handlers
//! receive through [`OwnerExtension`] and pass explicitly into every store
//! call. Authentication failures are 401s; a missing or malformed owner
//! header is a 400, since the bearer token itself was fine.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{ApiError, unauthorized, unauthorized_with_trace_id, validation_error};
use crate::server::AppState;
use crate::telemetry::TraceContext;

/// Header naming the principal a request acts for.
pub const OWNER_ID_HEADER: &str = "X-Owner-Id";

/// The authenticated principal; every repository call is scoped by one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OwnerId(pub Uuid);

/// Request extension carrying the resolved [`OwnerId`].
#[derive(Debug, Clone)]
pub struct OwnerExtension(pub OwnerId);

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.config)
    }
}

/// Validates the bearer token and owner header, then stores the principal
/// in the request extensions for the handler to extract.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let trace_id = request
        .extensions()
        .get::<TraceContext>()
        .map(|ctx| ctx.trace_id.clone());

    let token = bearer_token(request.headers(), trace_id.as_deref())?;
    verify_token(&config, token)?;

    let owner = owner_from_headers(request.headers())?;
    tracing::info!(owner_id = %owner.0, "Authenticated request");

    request.extensions_mut().insert(OwnerExtension(owner));
    Ok(next.run(request).await)
}

fn bearer_token<'h>(headers: &'h HeaderMap, trace_id: Option<&str>) -> Result<&'h str, ApiError> {
    let reject = |message: &str| match trace_id {
        Some(id) => unauthorized_with_trace_id(Some(message), id.to_string()),
        None => unauthorized(Some(message)),
    };

    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| reject("Missing Authorization header"))?
        .to_str()
        .map_err(|_| reject("Invalid Authorization header"))?;

    value
        .strip_prefix("Bearer ")
        .ok_or_else(|| reject("Authorization header must use Bearer scheme"))
}

fn verify_token(config: &AppConfig, candidate: &str) -> Result<(), ApiError> {
    // Constant-time comparison against every configured token; no early
    // exit on length or prefix.
    let matched = config
        .api_tokens
        .iter()
        .any(|token| ConstantTimeEq::ct_eq(candidate.as_bytes(), token.as_bytes()).into());

    if matched {
        Ok(())
    } else {
        Err(unauthorized(Some("Invalid bearer token")))
    }
}

fn owner_from_headers(headers: &HeaderMap) -> Result<OwnerId, ApiError> {
    let raw = headers
        .get(OWNER_ID_HEADER)
        .ok_or_else(|| owner_id_rejection("Required header is missing"))?
        .to_str()
        .map_err(|_| owner_id_rejection("Header must be valid UTF-8"))?;

    raw.parse::<Uuid>()
        .map(OwnerId)
        .map_err(|_| owner_id_rejection("Must be a valid UUID"))
}

fn owner_id_rejection(reason: &str) -> ApiError {
    validation_error(
        "Invalid owner header",
        serde_json::json!({ "X-Owner-Id": reason }),
    )
}

/// OpenAPI parameter documentation for the owner header.
#[derive(Debug, Serialize, Deserialize, IntoParams, utoipa::ToSchema)]
#[into_params(parameter_in = Header)]
pub struct OwnerHeader {
    /// Owner identifier (UUID) that scopes the request to a single owner
    #[serde(rename = "X-Owner-Id")]
    #[param(rename = "X-Owner-Id", value_type = String)]
    pub owner_id: String,
}

impl<S> FromRequestParts<S> for OwnerExtension
where
    Arc<AppConfig>: FromRef<S>,
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<OwnerExtension>()
            .cloned()
            .ok_or_else(|| owner_id_rejection("Owner context not present"))
    }
}
