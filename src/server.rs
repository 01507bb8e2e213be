//! # Server Configuration
//!
//! This module contains the server setup and configuration for the Launchpad
//! deployments API: shared application state, router construction, and the
//! startup sequence (telemetry, pool, migrations, graceful shutdown).

use axum::{
    Router, middleware,
    routing::{get, patch},
};
use migration::{Migrator, MigratorTrait};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::auth_middleware;
use crate::config::AppConfig;
use crate::deployer::{Deployer, TemplateDeployJob};
use crate::handlers;
use crate::invalidation::{LogInvalidator, ViewInvalidator};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub deployer: Arc<Deployer>,
    pub invalidator: Arc<dyn ViewInvalidator>,
}

impl AppState {
    /// Wire up the state from configuration and an established pool.
    pub fn new(config: AppConfig, db: DatabaseConnection) -> Self {
        let config = Arc::new(config);
        let invalidator: Arc<dyn ViewInvalidator> = Arc::new(LogInvalidator);
        let job = Arc::new(TemplateDeployJob::from_config(&config));
        let deployer = Arc::new(Deployer::new(
            Arc::new(db.clone()),
            job,
            config.deploy.template_repo.clone(),
            Arc::clone(&invalidator),
        ));

        Self {
            config,
            db,
            deployer,
            invalidator,
        }
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/api/v1/deployments",
            get(handlers::deployments::list_deployments)
                .post(handlers::deployments::create_deployment),
        )
        .route(
            "/api/v1/deployments/{id}",
            patch(handlers::deployments::update_deployment)
                .delete(handlers::deployments::delete_deployment),
        )
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state.config),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given configuration
///
/// Initializes telemetry, establishes the pool, applies pending migrations,
/// and serves until Ctrl+C.
pub async fn run_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    crate::telemetry::init_tracing(&config)?;

    let db = crate::db::init_pool(&config).await?;
    Migrator::up(&db, None).await?;

    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {e}"))?;

    let profile = config.profile.clone();
    let state = AppState::new(config, db);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "Server listening");

    let shutdown = CancellationToken::new();
    let shutdown_trigger = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested");
            shutdown_trigger.cancel();
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Builds an `AppState` for tests without a running server.
///
/// Identical wiring to [`AppState::new`]; tests that need to script the job
/// construct the state by hand instead.
pub fn create_test_app_state(config: AppConfig, db: DatabaseConnection) -> AppState {
    AppState::new(config, db)
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::deployments::create_deployment,
        crate::handlers::deployments::list_deployments,
        crate::handlers::deployments::update_deployment,
        crate::handlers::deployments::delete_deployment,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::models::DeploymentStatus,
            crate::handlers::deployments::CreateDeploymentRequest,
            crate::handlers::deployments::UpdateDeploymentRequest,
            crate::handlers::deployments::DeploymentDto,
            crate::handlers::deployments::CreateDeploymentResponse,
            crate::handlers::deployments::DeploymentsResponse,
        )
    ),
    info(
        title = "Launchpad Deployments API",
        description = "API for deploying projects from a starter template",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
