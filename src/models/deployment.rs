//! Deployment entity model
//!
//! This module contains the SeaORM entity model for the deployments table,
//! which records one template deployment per row, owner-scoped with status,
//! error, and the GitHub/Vercel locators filled in once the run concludes.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Deployment entity representing one deployment record
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "deployments")]
pub struct Model {
    /// Unique identifier for the deployment (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owner this record belongs to; immutable after insert
    pub owner_id: Uuid,

    /// Validated project name chosen by the owner
    pub project_name: String,

    /// Free-text description (optional)
    pub description: Option<String>,

    /// Current lifecycle state of the deployment
    pub status: DeploymentStatus,

    /// Human-readable failure message; present iff status is failed
    pub error: Option<String>,

    /// URL of the generated GitHub repository
    pub github_repo_url: Option<String>,

    /// owner/name of the generated GitHub repository
    pub github_repo_name: Option<String>,

    /// Vercel project dashboard URL
    pub vercel_project_url: Option<String>,

    /// Live URL of the first Vercel deployment
    pub vercel_deployment_url: Option<String>,

    /// Timestamp when the deployment record was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the deployment record was last updated
    pub updated_at: DateTimeWithTimeZone,
}

/// Lifecycle states a deployment record can be in.
///
/// Records are born `deploying` and move to exactly one of `completed` or
/// `failed`; terminal states never revert.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum DeploymentStatus {
    #[sea_orm(string_value = "deploying")]
    #[serde(rename = "deploying")]
    #[default]
    Deploying,

    #[sea_orm(string_value = "completed")]
    #[serde(rename = "completed")]
    Completed,

    #[sea_orm(string_value = "failed")]
    #[serde(rename = "failed")]
    Failed,
}

impl DeploymentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            DeploymentStatus::Deploying => "deploying",
            DeploymentStatus::Completed => "completed",
            DeploymentStatus::Failed => "failed",
        }
    }

    /// Whether the record has reached a terminal state.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            DeploymentStatus::Completed | DeploymentStatus::Failed
        )
    }
}

/// Locators produced by a successful deployment run.
///
/// All fields are optional because upstream responses can omit individual
/// URLs; whatever is present gets copied onto the record verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeploymentLocators {
    /// URL of the generated GitHub repository
    pub github_repo_url: Option<String>,
    /// owner/name of the generated GitHub repository
    pub github_repo_name: Option<String>,
    /// Vercel project dashboard URL
    pub vercel_project_url: Option<String>,
    /// Live URL of the first Vercel deployment
    pub vercel_deployment_url: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::owner::Entity",
        from = "Column::OwnerId",
        to = "super::owner::Column::Id"
    )]
    Owner,
}

impl Related<super::owner::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
