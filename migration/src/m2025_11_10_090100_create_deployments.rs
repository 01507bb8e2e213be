//! Deployments table: one template deployment per row, owner-scoped, with
//! status, error, and the GitHub/Vercel locators filled in when the job
//! concludes.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Deployments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Deployments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Deployments::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(Deployments::ProjectName).text().not_null())
                    .col(ColumnDef::new(Deployments::Description).text().null())
                    .col(
                        ColumnDef::new(Deployments::Status)
                            .text()
                            .not_null()
                            .default("deploying"),
                    )
                    .col(ColumnDef::new(Deployments::Error).text().null())
                    .col(ColumnDef::new(Deployments::GithubRepoUrl).text().null())
                    .col(ColumnDef::new(Deployments::GithubRepoName).text().null())
                    .col(ColumnDef::new(Deployments::VercelProjectUrl).text().null())
                    .col(
                        ColumnDef::new(Deployments::VercelDeploymentUrl)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Deployments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Deployments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deployments_owner_id")
                            .from(Deployments::Table, Deployments::OwnerId)
                            .to(Owners::Table, Owners::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Listing index, newest first. Raw SQL because sea-query cannot
        // express the per-column DESC.
        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE INDEX IF NOT EXISTS idx_deployments_owner_created ON deployments (owner_id, created_at DESC)".to_string(),
            ))
            .await?;

        // Status-guard index used by the reconciliation writers.
        manager
            .create_index(
                Index::create()
                    .name("idx_deployments_owner_status")
                    .table(Deployments::Table)
                    .col(Deployments::OwnerId)
                    .col(Deployments::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in ["idx_deployments_owner_created", "idx_deployments_owner_status"] {
            manager
                .drop_index(Index::drop().name(name).to_owned())
                .await?;
        }

        manager
            .drop_table(Table::drop().table(Deployments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Deployments {
    Table,
    Id,
    OwnerId,
    ProjectName,
    Description,
    Status,
    Error,
    GithubRepoUrl,
    GithubRepoName,
    VercelProjectUrl,
    VercelDeploymentUrl,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Owners {
    Table,
    Id,
}
