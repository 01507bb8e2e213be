//! # Deployments API Handlers
//!
//! This module contains handlers for the deployment record endpoints:
//! initiating a deployment, listing owner records (with demo seeding on first
//! read), patching the editable fields, and deletion.

use crate::auth::{OwnerExtension, OwnerHeader};
use crate::deployer::InitiateDeployment;
use crate::error::{ApiError, not_found};
use crate::invalidation::DEPLOYMENTS_PATH;
use crate::models::{DeploymentStatus, deployment};
use crate::repositories::{DeploymentPatch, DeploymentRepository, OwnerRepository};
use crate::seeds::seed_demo_deployments;
use crate::server::AppState;
use crate::validation::validate_project_name;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// Request payload for initiating a deployment
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateDeploymentRequest {
    /// Project name (alphanumeric start; dots, dashes, underscores allowed; max 100 characters)
    #[schema(example = "my-next-app")]
    pub project_name: String,
    /// Optional free-form description
    #[schema(example = "Customer portal rebuilt on the starter template")]
    pub description: Option<String>,
}

/// Request payload for updating a deployment record
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateDeploymentRequest {
    /// New project name; validated like the creation payload
    pub project_name: Option<String>,
    /// New description; blank values are ignored
    pub description: Option<String>,
}

/// Deployment record for API responses
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeploymentDto {
    /// Unique identifier for the deployment record
    #[schema(value_type = String)]
    pub id: Uuid,
    /// Project name
    pub project_name: String,
    /// Optional description
    pub description: Option<String>,
    /// Lifecycle status (`deploying`, `completed`, or `failed`)
    pub status: DeploymentStatus,
    /// Failure message; present exactly when status is `failed`
    pub error: Option<String>,
    /// URL of the generated GitHub repository
    pub github_repo_url: Option<String>,
    /// owner/name of the generated GitHub repository
    pub github_repo_name: Option<String>,
    /// Vercel project dashboard URL
    pub vercel_project_url: Option<String>,
    /// Live URL of the first deployment
    pub vercel_deployment_url: Option<String>,
    /// Creation timestamp (ISO 8601)
    pub created_at: String,
    /// Last mutation timestamp (ISO 8601)
    pub updated_at: String,
}

impl From<deployment::Model> for DeploymentDto {
    fn from(model: deployment::Model) -> Self {
        Self {
            id: model.id,
            project_name: model.project_name,
            description: model.description,
            status: model.status,
            error: model.error,
            github_repo_url: model.github_repo_url,
            github_repo_name: model.github_repo_name,
            vercel_project_url: model.vercel_project_url,
            vercel_deployment_url: model.vercel_deployment_url,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

/// Response envelope for deployment initiation
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateDeploymentResponse {
    /// Always true; failures are reported as problem+json errors
    pub success: bool,
    /// Human-readable confirmation
    #[schema(example = "Deployment started")]
    pub message: String,
    /// The freshly created record, still in the `deploying` state
    pub data: DeploymentDto,
}

/// Response wrapper for the deployments listing
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeploymentsResponse {
    /// The owner's deployment records, newest first
    pub deployments: Vec<DeploymentDto>,
}

/// Initiate a deployment
///
/// Creates the record in the `deploying` state and schedules the external job;
/// the response returns as soon as the record is durable, well before the job
/// finishes.
#[utoipa::path(
    post,
    path = "/api/v1/deployments",
    security(("bearer_auth" = [])),
    params(OwnerHeader),
    request_body = CreateDeploymentRequest,
    responses(
        (status = 201, description = "Deployment record created and job scheduled", body = CreateDeploymentResponse, example = json!({
            "success": true,
            "message": "Deployment started",
            "data": {
                "id": "550e8400-e29b-41d4-a716-446655440000",
                "project_name": "my-next-app",
                "description": "Customer portal",
                "status": "deploying",
                "error": null,
                "github_repo_url": null,
                "github_repo_name": null,
                "vercel_project_url": null,
                "vercel_deployment_url": null,
                "created_at": "2025-11-10T10:30:00+00:00",
                "updated_at": "2025-11-10T10:30:00+00:00"
            }
        })),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "deployments"
)]
pub async fn create_deployment(
    State(state): State<AppState>,
    OwnerExtension(owner): OwnerExtension,
    Json(request): Json<CreateDeploymentRequest>,
) -> Result<(StatusCode, Json<CreateDeploymentResponse>), ApiError> {
    let owners = OwnerRepository::new(Arc::new(state.db.clone()));
    owners.ensure(owner.0).await?;

    let record = state
        .deployer
        .initiate(
            owner,
            InitiateDeployment {
                project_name: request.project_name,
                description: request.description,
            },
        )
        .await?;

    state.invalidator.invalidate(DEPLOYMENTS_PATH);

    Ok((
        StatusCode::CREATED,
        Json(CreateDeploymentResponse {
            success: true,
            message: "Deployment started".to_string(),
            data: record.into(),
        }),
    ))
}

/// List the owner's deployments
///
/// Records are ordered newest first. When demo seeding is enabled and the
/// owner has no records at all, the fixed demo set is inserted and the listing
/// re-queried before responding.
#[utoipa::path(
    get,
    path = "/api/v1/deployments",
    security(("bearer_auth" = [])),
    params(OwnerHeader),
    responses(
        (status = 200, description = "The owner's deployment records", body = DeploymentsResponse),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "deployments"
)]
pub async fn list_deployments(
    State(state): State<AppState>,
    OwnerExtension(owner): OwnerExtension,
) -> Result<Json<DeploymentsResponse>, ApiError> {
    if state.config.demo_seed_enabled {
        // Seeding never signals view invalidation; the re-query below is the
        // only way the fresh records reach this response.
        seed_demo_deployments(&state.db, owner.0).await?;
    }

    let repo = DeploymentRepository::new(Arc::new(state.db.clone()));
    let records = repo.list_by_owner(owner.0).await?;

    Ok(Json(DeploymentsResponse {
        deployments: records.into_iter().map(DeploymentDto::from).collect(),
    }))
}

/// Update a deployment record
///
/// Only the project name and description are editable; absent fields are left
/// unchanged. A record owned by someone else is indistinguishable from a
/// missing one.
#[utoipa::path(
    patch,
    path = "/api/v1/deployments/{id}",
    security(("bearer_auth" = [])),
    params(
        OwnerHeader,
        ("id" = Uuid, Path, description = "Deployment record UUID")
    ),
    request_body = UpdateDeploymentRequest,
    responses(
        (status = 200, description = "Updated deployment record", body = DeploymentDto),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Deployment not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "deployments"
)]
pub async fn update_deployment(
    State(state): State<AppState>,
    OwnerExtension(owner): OwnerExtension,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateDeploymentRequest>,
) -> Result<Json<DeploymentDto>, ApiError> {
    let project_name = match request.project_name {
        Some(name) => {
            let name = name.trim().to_string();
            validate_project_name(&name)?;
            Some(name)
        }
        None => None,
    };
    let description = request
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    let repo = DeploymentRepository::new(Arc::new(state.db.clone()));
    let updated = repo
        .update(
            owner.0,
            id,
            DeploymentPatch {
                project_name,
                description,
            },
        )
        .await?
        .ok_or_else(|| not_found(Some("Deployment not found")))?;

    state.invalidator.invalidate(DEPLOYMENTS_PATH);

    Ok(Json(updated.into()))
}

/// Delete a deployment record
///
/// Removing an absent record (or another owner's record) yields 404 rather
/// than an error about ownership.
#[utoipa::path(
    delete,
    path = "/api/v1/deployments/{id}",
    security(("bearer_auth" = [])),
    params(
        OwnerHeader,
        ("id" = Uuid, Path, description = "Deployment record UUID")
    ),
    responses(
        (status = 204, description = "Deployment record removed"),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Deployment not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "deployments"
)]
pub async fn delete_deployment(
    State(state): State<AppState>,
    OwnerExtension(owner): OwnerExtension,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = DeploymentRepository::new(Arc::new(state.db.clone()));
    let removed = repo.delete(owner.0, id).await?;

    if !removed {
        return Err(not_found(Some("Deployment not found")));
    }

    state.invalidator.invalidate(DEPLOYMENTS_PATH);

    Ok(StatusCode::NO_CONTENT)
}
