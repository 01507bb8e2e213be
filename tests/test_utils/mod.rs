//! Shared fixtures for database-backed integration tests: an in-memory
//! SQLite setup with migrations applied, plus owner and deployment row
//! builders with staged timestamps.

use anyhow::Result;
use chrono::{DateTime, Utc};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set, Statement};
use std::sync::Arc;
use uuid::Uuid;

use launchpad::models::deployment::{self, DeploymentStatus};
use launchpad::models::owner;

/// Fresh in-memory SQLite database with every migration applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;

    // SQLite enforces the owners foreign key on every deployment insert;
    // relax it so fixtures can write deployment rows without an owner row.
    let pragma = Statement::from_string(
        db.get_database_backend(),
        "PRAGMA foreign_keys = OFF".to_string(),
    );
    db.execute(pragma).await?;

    Ok(db)
}

/// Same as [`setup_test_db`], wrapped in an `Arc` for handler state.
#[allow(dead_code)]
pub async fn setup_test_db_arc() -> Result<Arc<DatabaseConnection>> {
    Ok(Arc::new(setup_test_db().await?))
}

/// Inserts an owner row, generating an id unless one is supplied.
#[allow(dead_code)]
pub async fn create_test_owner(db: &DatabaseConnection, owner_id: Option<Uuid>) -> Result<Uuid> {
    let id = owner_id.unwrap_or_else(Uuid::new_v4);
    owner::ActiveModel {
        id: Set(id),
        display_name: Set(Some("Test Owner".to_string())),
        created_at: Set(Utc::now().fixed_offset()),
    }
    .insert(db)
    .await?;
    Ok(id)
}

/// Inserts a deployment row directly, with an explicit creation time so
/// ordering tests can stage history.
#[allow(dead_code)]
pub async fn insert_deployment_at(
    db: &DatabaseConnection,
    id: Uuid,
    owner_id: Uuid,
    project_name: &str,
    status: DeploymentStatus,
    created_at: DateTime<Utc>,
) -> Result<deployment::Model> {
    let row = deployment::ActiveModel {
        id: Set(id),
        owner_id: Set(owner_id),
        project_name: Set(project_name.to_string()),
        description: Set(None),
        status: Set(status),
        error: Set(None),
        github_repo_url: Set(None),
        github_repo_name: Set(None),
        vercel_project_url: Set(None),
        vercel_deployment_url: Set(None),
        created_at: Set(created_at.fixed_offset()),
        updated_at: Set(created_at.fixed_offset()),
    };
    Ok(row.insert(db).await?)
}
