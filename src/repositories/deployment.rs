//! Deployment repository for database operations
//!
//! This module provides the DeploymentRepository struct which encapsulates
//! SeaORM operations for the deployments table. Every method takes the owner
//! id explicitly and filters on it, so no query can cross owner boundaries.

use anyhow::Result;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::deployment::{self, DeploymentLocators, DeploymentStatus, Entity as Deployment};

/// Fallback stored when a failed job reports no usable message.
const FALLBACK_ERROR_MESSAGE: &str = "Deployment failed for an unknown reason";

/// Input for inserting a deployment record.
///
/// API-driven inserts use [`NewDeployment::deploying`]; the demo seeder
/// builds records in terminal states directly.
#[derive(Debug, Clone, Default)]
pub struct NewDeployment {
    pub project_name: String,
    pub description: Option<String>,
    pub status: DeploymentStatus,
    pub error: Option<String>,
    pub locators: DeploymentLocators,
}

impl NewDeployment {
    /// A fresh record in the `deploying` state, as created by initiation.
    pub fn deploying(project_name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            project_name: project_name.into(),
            description,
            ..Self::default()
        }
    }
}

/// Owner-editable fields; absent fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct DeploymentPatch {
    pub project_name: Option<String>,
    pub description: Option<String>,
}

/// Repository for deployment database operations
#[derive(Debug, Clone)]
pub struct DeploymentRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl DeploymentRepository {
    /// Creates a new DeploymentRepository instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a single deployment record for the owner.
    ///
    /// Assigns the id and both timestamps; the stored record is returned.
    pub async fn insert(&self, owner_id: Uuid, new: NewDeployment) -> Result<deployment::Model> {
        let now = Utc::now().fixed_offset();

        let record = deployment::ActiveModel {
            id: Set(Uuid::new_v4()),
            owner_id: Set(owner_id),
            project_name: Set(new.project_name),
            description: Set(new.description),
            status: Set(new.status),
            error: Set(new.error),
            github_repo_url: Set(new.locators.github_repo_url),
            github_repo_name: Set(new.locators.github_repo_name),
            vercel_project_url: Set(new.locators.vercel_project_url),
            vercel_deployment_url: Set(new.locators.vercel_deployment_url),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = record.insert(&*self.db).await?;

        tracing::info!(
            owner_id = %owner_id,
            deployment_id = %model.id,
            status = model.status.as_str(),
            "Deployment record created"
        );

        Ok(model)
    }

    /// Insert several records for the owner in one statement.
    ///
    /// Used by the demo seeder; returns the number of rows written.
    pub async fn insert_many(&self, owner_id: Uuid, records: Vec<NewDeployment>) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let now = Utc::now().fixed_offset();
        let rows = records.into_iter().map(|new| deployment::ActiveModel {
            id: Set(Uuid::new_v4()),
            owner_id: Set(owner_id),
            project_name: Set(new.project_name),
            description: Set(new.description),
            status: Set(new.status),
            error: Set(new.error),
            github_repo_url: Set(new.locators.github_repo_url),
            github_repo_name: Set(new.locators.github_repo_name),
            vercel_project_url: Set(new.locators.vercel_project_url),
            vercel_deployment_url: Set(new.locators.vercel_deployment_url),
            created_at: Set(now),
            updated_at: Set(now),
        });

        let inserted = Deployment::insert_many(rows)
            .exec_without_returning(&*self.db)
            .await?;

        Ok(inserted)
    }

    /// Find a deployment by ID, ensuring it belongs to the specified owner
    pub async fn find_by_owner(
        &self,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<Option<deployment::Model>> {
        let record = Deployment::find_by_id(id)
            .filter(deployment::Column::OwnerId.eq(owner_id))
            .one(&*self.db)
            .await?;

        Ok(record)
    }

    /// List the owner's deployments, newest first.
    pub async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<deployment::Model>> {
        let records = Deployment::find()
            .filter(deployment::Column::OwnerId.eq(owner_id))
            .order_by_desc(deployment::Column::CreatedAt)
            .order_by_desc(deployment::Column::Id)
            .all(&*self.db)
            .await?;

        Ok(records)
    }

    /// Count the owner's deployment records.
    pub async fn count_by_owner(&self, owner_id: Uuid) -> Result<u64> {
        let count = Deployment::find()
            .filter(deployment::Column::OwnerId.eq(owner_id))
            .count(&*self.db)
            .await?;

        Ok(count)
    }

    /// Apply a patch to the owner's record.
    ///
    /// Only fields present in the patch change; `updated_at` is always
    /// refreshed. Returns `None` when no record with that id belongs to the
    /// owner, whether it is absent or owned by someone else.
    pub async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        patch: DeploymentPatch,
    ) -> Result<Option<deployment::Model>> {
        let Some(existing) = self.find_by_owner(owner_id, id).await? else {
            return Ok(None);
        };

        let mut model: deployment::ActiveModel = existing.into();

        if let Some(project_name) = patch.project_name {
            model.project_name = Set(project_name);
        }
        if let Some(description) = patch.description {
            model.description = Set(Some(description));
        }
        model.updated_at = Set(Utc::now().fixed_offset());

        Ok(Some(model.update(&*self.db).await?))
    }

    /// Delete the owner's record, reporting whether a row was removed.
    ///
    /// Absent ids and foreign owners both come back as `false`; deletion is
    /// never an error on a missing target.
    pub async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool> {
        let result = Deployment::delete_by_id(id)
            .filter(deployment::Column::OwnerId.eq(owner_id))
            .exec(&*self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Reconcile a finished job: move `deploying` to `completed` and copy the
    /// locators onto the record, clearing any stale error.
    ///
    /// The update is guarded on the current status so a record already in a
    /// terminal state is left untouched and `None` is returned.
    pub async fn mark_completed(
        &self,
        owner_id: Uuid,
        id: Uuid,
        locators: DeploymentLocators,
    ) -> Result<Option<deployment::Model>> {
        let now = Utc::now().fixed_offset();

        let result = Deployment::update_many()
            .col_expr(
                deployment::Column::Status,
                Expr::value(DeploymentStatus::Completed),
            )
            .col_expr(deployment::Column::Error, Expr::value(Option::<String>::None))
            .col_expr(
                deployment::Column::GithubRepoUrl,
                Expr::value(locators.github_repo_url),
            )
            .col_expr(
                deployment::Column::GithubRepoName,
                Expr::value(locators.github_repo_name),
            )
            .col_expr(
                deployment::Column::VercelProjectUrl,
                Expr::value(locators.vercel_project_url),
            )
            .col_expr(
                deployment::Column::VercelDeploymentUrl,
                Expr::value(locators.vercel_deployment_url),
            )
            .col_expr(deployment::Column::UpdatedAt, Expr::value(now))
            .filter(deployment::Column::Id.eq(id))
            .filter(deployment::Column::OwnerId.eq(owner_id))
            .filter(deployment::Column::Status.eq(DeploymentStatus::Deploying))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        tracing::info!(
            owner_id = %owner_id,
            deployment_id = %id,
            "Deployment marked completed"
        );

        self.find_by_owner(owner_id, id).await
    }

    /// Reconcile a failed job: move `deploying` to `failed` and store the
    /// failure message (a fallback is substituted for blank messages).
    ///
    /// Guarded on the current status like [`mark_completed`]; terminal
    /// records are left untouched and `None` is returned.
    ///
    /// [`mark_completed`]: DeploymentRepository::mark_completed
    pub async fn mark_failed(
        &self,
        owner_id: Uuid,
        id: Uuid,
        message: &str,
    ) -> Result<Option<deployment::Model>> {
        let message = if message.trim().is_empty() {
            FALLBACK_ERROR_MESSAGE
        } else {
            message
        };
        let now = Utc::now().fixed_offset();

        let result = Deployment::update_many()
            .col_expr(
                deployment::Column::Status,
                Expr::value(DeploymentStatus::Failed),
            )
            .col_expr(deployment::Column::Error, Expr::value(Some(message.to_string())))
            .col_expr(deployment::Column::UpdatedAt, Expr::value(now))
            .filter(deployment::Column::Id.eq(id))
            .filter(deployment::Column::OwnerId.eq(owner_id))
            .filter(deployment::Column::Status.eq(DeploymentStatus::Deploying))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        tracing::info!(
            owner_id = %owner_id,
            deployment_id = %id,
            error = message,
            "Deployment marked failed"
        );

        self.find_by_owner(owner_id, id).await
    }
}
