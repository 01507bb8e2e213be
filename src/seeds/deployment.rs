//! Demo deployment seeding functionality
//!
//! This module provides functionality to seed an owner's empty deployment
//! listing with a fixed set of illustrative records, so a first visit shows
//! realistic data instead of an empty table.

use anyhow::Result;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{DeploymentLocators, DeploymentStatus};
use crate::repositories::{DeploymentRepository, NewDeployment, OwnerRepository};

/// Seeds the owner's deployment listing with demo records
///
/// Checks whether the owner has any deployment records at all; if none, the
/// fixed demo set (two `completed`, one `failed`) is inserted in a single bulk
/// write. An owner with any existing record is left untouched, so the check is
/// idempotent at the "has any records" level rather than per record.
///
/// The caller re-fetches afterwards; this function never fires the view
/// invalidation signal.
///
/// # Arguments
///
/// * `db` - Database connection
/// * `owner_id` - Owner whose listing to seed
///
/// # Returns
///
/// Returns the number of records inserted (0 or 3)
pub async fn seed_demo_deployments(db: &DatabaseConnection, owner_id: Uuid) -> Result<usize> {
    let shared = Arc::new(db.clone());
    let owners = OwnerRepository::new(Arc::clone(&shared));
    let repo = DeploymentRepository::new(shared);

    owners.ensure(owner_id).await?;

    let existing = repo.count_by_owner(owner_id).await?;
    if existing > 0 {
        log::debug!(
            "Owner {} already has {} deployment records, skipping demo seed",
            owner_id,
            existing
        );
        return Ok(0);
    }

    log::info!("Seeding demo deployments for owner {}", owner_id);

    let records = demo_records();
    let expected = records.len();

    match repo.insert_many(owner_id, records).await {
        Ok(inserted) => {
            log::info!(
                "Seeded {} demo deployments for owner {}",
                inserted,
                owner_id
            );
            Ok(inserted as usize)
        }
        Err(e) => {
            log::error!("Failed to seed {} demo deployments: {}", expected, e);
            Err(e)
        }
    }
}

/// The fixed demo set: two successful deployments and one failure.
fn demo_records() -> Vec<NewDeployment> {
    vec![
        NewDeployment {
            project_name: "marketing-site".to_string(),
            description: Some("Corporate marketing site built from the starter template".to_string()),
            status: DeploymentStatus::Completed,
            error: None,
            locators: DeploymentLocators {
                github_repo_url: Some("https://github.com/acme-demo/marketing-site".to_string()),
                github_repo_name: Some("acme-demo/marketing-site".to_string()),
                vercel_project_url: Some("https://vercel.com/marketing-site".to_string()),
                vercel_deployment_url: Some("https://marketing-site-demo.vercel.app".to_string()),
            },
        },
        NewDeployment {
            project_name: "docs-portal".to_string(),
            description: Some("Product documentation portal".to_string()),
            status: DeploymentStatus::Completed,
            error: None,
            locators: DeploymentLocators {
                github_repo_url: Some("https://github.com/acme-demo/docs-portal".to_string()),
                github_repo_name: Some("acme-demo/docs-portal".to_string()),
                vercel_project_url: Some("https://vercel.com/docs-portal".to_string()),
                vercel_deployment_url: Some("https://docs-portal-demo.vercel.app".to_string()),
            },
        },
        NewDeployment {
            project_name: "checkout-prototype".to_string(),
            description: Some("Experimental checkout flow".to_string()),
            status: DeploymentStatus::Failed,
            error: Some(
                "Vercel request failed with status 402: project limit reached for the connected account"
                    .to_string(),
            ),
            locators: DeploymentLocators::default(),
        },
    ]
}
