//! Integration tests for DeploymentRepository CRUD and reconciliation writes.

use anyhow::Result;
use chrono::{Duration, Utc};
use launchpad::models::deployment::{DeploymentLocators, DeploymentStatus};
use launchpad::repositories::{DeploymentPatch, DeploymentRepository, NewDeployment};
use uuid::Uuid;

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{insert_deployment_at, setup_test_db_arc};

fn sample_locators() -> DeploymentLocators {
    DeploymentLocators {
        github_repo_url: Some("https://github.com/acme-user/my-app".to_string()),
        github_repo_name: Some("acme-user/my-app".to_string()),
        vercel_project_url: Some("https://vercel.com/my-app".to_string()),
        vercel_deployment_url: Some("https://my-app.vercel.app".to_string()),
    }
}

#[tokio::test]
async fn insert_assigns_id_and_deploying_defaults() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let repo = DeploymentRepository::new(db.clone());
    let owner = Uuid::new_v4();

    let record = repo
        .insert(
            owner,
            NewDeployment::deploying("my-app", Some("A demo app".to_string())),
        )
        .await?;

    assert_ne!(record.id, Uuid::nil());
    assert_eq!(record.owner_id, owner);
    assert_eq!(record.project_name, "my-app");
    assert_eq!(record.description.as_deref(), Some("A demo app"));
    assert_eq!(record.status, DeploymentStatus::Deploying);
    assert!(record.error.is_none());
    assert!(record.github_repo_url.is_none());
    assert!(record.vercel_deployment_url.is_none());
    assert_eq!(record.created_at, record.updated_at);
    Ok(())
}

#[tokio::test]
async fn find_by_owner_roundtrip() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let repo = DeploymentRepository::new(db.clone());
    let owner = Uuid::new_v4();

    let created = repo
        .insert(owner, NewDeployment::deploying("my-app", None))
        .await?;

    let found = repo.find_by_owner(owner, created.id).await?;
    assert_eq!(found, Some(created));

    let missing = repo.find_by_owner(owner, Uuid::new_v4()).await?;
    assert!(missing.is_none());
    Ok(())
}

#[tokio::test]
async fn list_orders_newest_first() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let repo = DeploymentRepository::new(db.clone());
    let owner = Uuid::new_v4();
    let base = Utc::now() - Duration::minutes(30);

    let oldest = insert_deployment_at(
        &db,
        Uuid::new_v4(),
        owner,
        "oldest",
        DeploymentStatus::Completed,
        base,
    )
    .await?;
    let newest = insert_deployment_at(
        &db,
        Uuid::new_v4(),
        owner,
        "newest",
        DeploymentStatus::Deploying,
        base + Duration::minutes(20),
    )
    .await?;
    let middle = insert_deployment_at(
        &db,
        Uuid::new_v4(),
        owner,
        "middle",
        DeploymentStatus::Failed,
        base + Duration::minutes(10),
    )
    .await?;

    let listed = repo.list_by_owner(owner).await?;
    let ids: Vec<Uuid> = listed.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![newest.id, middle.id, oldest.id]);
    Ok(())
}

#[tokio::test]
async fn list_breaks_created_at_ties_by_id() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let repo = DeploymentRepository::new(db.clone());
    let owner = Uuid::new_v4();
    let at = Utc::now();

    let low = Uuid::from_u128(1);
    let high = Uuid::from_u128(2);
    insert_deployment_at(&db, low, owner, "low", DeploymentStatus::Completed, at).await?;
    insert_deployment_at(&db, high, owner, "high", DeploymentStatus::Completed, at).await?;

    let listed = repo.list_by_owner(owner).await?;
    let ids: Vec<Uuid> = listed.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![high, low]);
    Ok(())
}

#[tokio::test]
async fn count_by_owner_tracks_inserts_and_deletes() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let repo = DeploymentRepository::new(db.clone());
    let owner = Uuid::new_v4();

    assert_eq!(repo.count_by_owner(owner).await?, 0);

    let first = repo
        .insert(owner, NewDeployment::deploying("first", None))
        .await?;
    repo.insert(owner, NewDeployment::deploying("second", None))
        .await?;
    assert_eq!(repo.count_by_owner(owner).await?, 2);

    repo.delete(owner, first.id).await?;
    assert_eq!(repo.count_by_owner(owner).await?, 1);
    Ok(())
}

#[tokio::test]
async fn insert_many_writes_all_records_at_once() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let repo = DeploymentRepository::new(db.clone());
    let owner = Uuid::new_v4();

    let records = vec![
        NewDeployment::deploying("one", None),
        NewDeployment {
            project_name: "two".to_string(),
            status: DeploymentStatus::Completed,
            locators: sample_locators(),
            ..NewDeployment::default()
        },
        NewDeployment {
            project_name: "three".to_string(),
            status: DeploymentStatus::Failed,
            error: Some("boom".to_string()),
            ..NewDeployment::default()
        },
    ];

    let written = repo.insert_many(owner, records).await?;
    assert_eq!(written, 3);
    assert_eq!(repo.count_by_owner(owner).await?, 3);

    let empty = repo.insert_many(owner, Vec::new()).await?;
    assert_eq!(empty, 0);
    Ok(())
}

#[tokio::test]
async fn update_patches_only_present_fields() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let repo = DeploymentRepository::new(db.clone());
    let owner = Uuid::new_v4();

    let created = repo
        .insert(
            owner,
            NewDeployment::deploying("my-app", Some("original".to_string())),
        )
        .await?;

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let renamed = repo
        .update(
            owner,
            created.id,
            DeploymentPatch {
                project_name: Some("renamed-app".to_string()),
                description: None,
            },
        )
        .await?
        .ok_or_else(|| anyhow::anyhow!("record disappeared during update"))?;

    assert_eq!(renamed.project_name, "renamed-app");
    assert_eq!(renamed.description.as_deref(), Some("original"));
    assert_eq!(renamed.status, DeploymentStatus::Deploying);
    assert!(renamed.updated_at > created.updated_at);
    assert_eq!(renamed.created_at, created.created_at);

    let described = repo
        .update(
            owner,
            created.id,
            DeploymentPatch {
                project_name: None,
                description: Some("rewritten".to_string()),
            },
        )
        .await?
        .ok_or_else(|| anyhow::anyhow!("record disappeared during update"))?;

    assert_eq!(described.project_name, "renamed-app");
    assert_eq!(described.description.as_deref(), Some("rewritten"));
    Ok(())
}

#[tokio::test]
async fn update_missing_record_returns_none() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let repo = DeploymentRepository::new(db.clone());

    let updated = repo
        .update(
            Uuid::new_v4(),
            Uuid::new_v4(),
            DeploymentPatch {
                project_name: Some("anything".to_string()),
                description: None,
            },
        )
        .await?;

    assert!(updated.is_none());
    Ok(())
}

#[tokio::test]
async fn delete_reports_whether_a_row_was_removed() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let repo = DeploymentRepository::new(db.clone());
    let owner = Uuid::new_v4();

    let created = repo
        .insert(owner, NewDeployment::deploying("short-lived", None))
        .await?;

    assert!(repo.delete(owner, created.id).await?);
    assert!(repo.find_by_owner(owner, created.id).await?.is_none());

    // Second delete finds nothing; that is a report, not an error.
    assert!(!repo.delete(owner, created.id).await?);
    Ok(())
}

#[tokio::test]
async fn mark_completed_copies_locators_and_clears_stale_error() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let repo = DeploymentRepository::new(db.clone());
    let owner = Uuid::new_v4();

    let created = repo
        .insert(
            owner,
            NewDeployment {
                project_name: "my-app".to_string(),
                error: Some("stale message".to_string()),
                ..NewDeployment::default()
            },
        )
        .await?;

    let completed = repo
        .mark_completed(owner, created.id, sample_locators())
        .await?
        .ok_or_else(|| anyhow::anyhow!("record was not reconcilable"))?;

    assert_eq!(completed.status, DeploymentStatus::Completed);
    assert!(completed.error.is_none());
    assert_eq!(
        completed.github_repo_url.as_deref(),
        Some("https://github.com/acme-user/my-app")
    );
    assert_eq!(
        completed.github_repo_name.as_deref(),
        Some("acme-user/my-app")
    );
    assert_eq!(
        completed.vercel_project_url.as_deref(),
        Some("https://vercel.com/my-app")
    );
    assert_eq!(
        completed.vercel_deployment_url.as_deref(),
        Some("https://my-app.vercel.app")
    );
    Ok(())
}

#[tokio::test]
async fn mark_failed_stores_the_message() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let repo = DeploymentRepository::new(db.clone());
    let owner = Uuid::new_v4();

    let created = repo
        .insert(owner, NewDeployment::deploying("my-app", None))
        .await?;

    let failed = repo
        .mark_failed(owner, created.id, "Vercel request failed with status 402: quota")
        .await?
        .ok_or_else(|| anyhow::anyhow!("record was not reconcilable"))?;

    assert_eq!(failed.status, DeploymentStatus::Failed);
    assert_eq!(
        failed.error.as_deref(),
        Some("Vercel request failed with status 402: quota")
    );
    assert!(failed.github_repo_url.is_none());
    Ok(())
}

#[tokio::test]
async fn mark_failed_substitutes_fallback_for_blank_message() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let repo = DeploymentRepository::new(db.clone());
    let owner = Uuid::new_v4();

    let created = repo
        .insert(owner, NewDeployment::deploying("my-app", None))
        .await?;

    let failed = repo
        .mark_failed(owner, created.id, "   ")
        .await?
        .ok_or_else(|| anyhow::anyhow!("record was not reconcilable"))?;

    assert_eq!(
        failed.error.as_deref(),
        Some("Deployment failed for an unknown reason")
    );
    Ok(())
}

#[tokio::test]
async fn terminal_records_are_never_reconciled_again() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let repo = DeploymentRepository::new(db.clone());
    let owner = Uuid::new_v4();

    let created = repo
        .insert(owner, NewDeployment::deploying("my-app", None))
        .await?;
    repo.mark_completed(owner, created.id, sample_locators())
        .await?;

    // A late failure report must not flip a completed record.
    let refused = repo.mark_failed(owner, created.id, "late failure").await?;
    assert!(refused.is_none());

    let record = repo
        .find_by_owner(owner, created.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("record disappeared"))?;
    assert_eq!(record.status, DeploymentStatus::Completed);
    assert!(record.error.is_none());

    // Completing twice is refused the same way.
    let again = repo
        .mark_completed(owner, created.id, DeploymentLocators::default())
        .await?;
    assert!(again.is_none());
    assert_eq!(
        record.github_repo_url.as_deref(),
        Some("https://github.com/acme-user/my-app")
    );
    Ok(())
}

#[tokio::test]
async fn mark_completed_on_deleted_record_returns_none() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let repo = DeploymentRepository::new(db.clone());
    let owner = Uuid::new_v4();

    let created = repo
        .insert(owner, NewDeployment::deploying("my-app", None))
        .await?;
    repo.delete(owner, created.id).await?;

    let reconciled = repo
        .mark_completed(owner, created.id, sample_locators())
        .await?;
    assert!(reconciled.is_none());
    assert_eq!(repo.count_by_owner(owner).await?, 0);
    Ok(())
}
