//! # Deployment Lifecycle Controller
//!
//! Orchestrates the create → execute → reconcile sequence for deployments.
//! `initiate` validates the request, writes the `deploying` record, and
//! schedules the external job on a detached task; the caller gets the record
//! back as soon as the insert commits. When the job finishes, the task
//! reconciles the record to `completed` or `failed`. A reconciliation write
//! that itself fails is logged and swallowed, leaving the record `deploying`.

pub mod job;

use metrics::{counter, histogram};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Instant;

use crate::auth::OwnerId;
use crate::error::ApiError;
use crate::invalidation::{DEPLOYMENTS_PATH, ViewInvalidator};
use crate::models::deployment;
use crate::repositories::{DeploymentRepository, NewDeployment};
use crate::validation::validate_project_name;

pub use job::{DeploymentJob, JobError, JobRequest, TemplateDeployJob};

/// Input for a deployment request, before validation.
#[derive(Debug, Clone)]
pub struct InitiateDeployment {
    pub project_name: String,
    pub description: Option<String>,
}

/// Deployment lifecycle controller
pub struct Deployer {
    repository: DeploymentRepository,
    job: Arc<dyn DeploymentJob>,
    template: String,
    invalidator: Arc<dyn ViewInvalidator>,
}

impl Deployer {
    /// Create a new deployer for the given job implementation and template.
    pub fn new(
        db: Arc<DatabaseConnection>,
        job: Arc<dyn DeploymentJob>,
        template: impl Into<String>,
        invalidator: Arc<dyn ViewInvalidator>,
    ) -> Self {
        Self {
            repository: DeploymentRepository::new(db),
            job,
            template: template.into(),
            invalidator,
        }
    }

    /// Start a deployment for the owner.
    ///
    /// Validates the project name first; nothing is written on a validation
    /// failure. The record is inserted synchronously, so it is visible to a
    /// listing made after this returns, then the job runs detached. Each call
    /// creates a new record; callers deduplicate submissions upstream.
    pub async fn initiate(
        &self,
        owner: OwnerId,
        input: InitiateDeployment,
    ) -> Result<deployment::Model, ApiError> {
        let project_name = input.project_name.trim().to_string();
        validate_project_name(&project_name)?;

        let description = input
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let record = self
            .repository
            .insert(owner.0, NewDeployment::deploying(project_name, description))
            .await?;

        counter!("deployments_initiated_total").increment(1);

        self.spawn_job(owner, record.clone());

        Ok(record)
    }

    /// Run the job on a detached task and reconcile the record afterwards.
    fn spawn_job(&self, owner: OwnerId, record: deployment::Model) {
        let repository = self.repository.clone();
        let job = Arc::clone(&self.job);
        let invalidator = Arc::clone(&self.invalidator);
        let request = JobRequest {
            deployment_id: record.id,
            template: self.template.clone(),
            project_name: record.project_name,
            description: record.description,
        };

        tokio::spawn(async move {
            let deployment_id = request.deployment_id;
            let job_start = Instant::now();
            let outcome = job.run(request).await;
            histogram!("deployment_job_duration_ms")
                .record(job_start.elapsed().as_secs_f64() * 1_000.0);

            let reconciled = match outcome {
                Ok(locators) => {
                    counter!("deployments_completed_total").increment(1);
                    repository
                        .mark_completed(owner.0, deployment_id, locators)
                        .await
                }
                Err(job_error) => {
                    counter!("deployments_failed_total").increment(1);
                    tracing::warn!(
                        owner_id = %owner.0,
                        deployment_id = %deployment_id,
                        error = %job_error,
                        "Deployment job failed"
                    );
                    repository
                        .mark_failed(owner.0, deployment_id, &job_error.to_string())
                        .await
                }
            };

            match reconciled {
                Ok(Some(_)) => {
                    invalidator.invalidate(DEPLOYMENTS_PATH);
                }
                Ok(None) => {
                    tracing::warn!(
                        owner_id = %owner.0,
                        deployment_id = %deployment_id,
                        "Deployment no longer reconcilable; record was deleted or already terminal"
                    );
                }
                Err(error) => {
                    // Swallowed: the record stays `deploying` and there is no
                    // retry. Operators find these through this log line.
                    tracing::error!(
                        owner_id = %owner.0,
                        deployment_id = %deployment_id,
                        error = ?error,
                        "Failed to record deployment outcome"
                    );
                }
            }
        });
    }
}
