//! External deployment job
//!
//! Defines the interface a deployment job must implement and the default
//! implementation that drives the GitHub and Vercel REST APIs: generate a
//! repository from the configured template, create a Vercel project linked to
//! it, and trigger the first deployment.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::models::DeploymentLocators;

const GITHUB_ACCEPT_HEADER: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = "Launchpad-Deployments/0.1";

/// Everything a job needs to run, captured at initiation time.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub deployment_id: Uuid,
    pub template: String,
    pub project_name: String,
    pub description: Option<String>,
}

/// Deployment job specific errors
#[derive(Debug, Error)]
pub enum JobError {
    #[error("{provider} request failed with status {status}: {message}")]
    Upstream {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed {provider} response: {details}")]
    MalformedResponse {
        provider: &'static str,
        details: String,
    },
}

/// A deployment job run to completion by the lifecycle controller.
///
/// Implementations report the external-system locators on success; the error
/// message on failure is stored on the deployment record verbatim.
#[async_trait]
pub trait DeploymentJob: Send + Sync {
    async fn run(&self, request: JobRequest) -> Result<DeploymentLocators, JobError>;
}

#[derive(Debug, Deserialize)]
struct GeneratedRepo {
    html_url: String,
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct VercelProject {
    name: String,
}

#[derive(Debug, Deserialize)]
struct VercelDeployment {
    url: String,
}

/// Default job implementation backed by the GitHub and Vercel REST APIs.
pub struct TemplateDeployJob {
    client: Client,
    github_api_base: String,
    vercel_api_base: String,
    github_token: String,
    vercel_token: String,
}

impl TemplateDeployJob {
    /// Build the job from application configuration.
    ///
    /// API base URLs come from `config.deploy` so tests can point them at a
    /// mock server.
    pub fn from_config(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.deploy.timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            github_api_base: config.deploy.github_api_base.clone(),
            vercel_api_base: config.deploy.vercel_api_base.clone(),
            github_token: config.github_token.clone().unwrap_or_default(),
            vercel_token: config.vercel_token.clone().unwrap_or_default(),
        }
    }

    /// Generate a new repository from the template.
    async fn generate_repository(&self, request: &JobRequest) -> Result<GeneratedRepo, JobError> {
        let payload = serde_json::json!({
            "name": request.project_name,
            "description": request.description.clone().unwrap_or_default(),
            "private": true,
            "include_all_branches": false,
        });

        let response = self
            .client
            .post(format!(
                "{}/repos/{}/generate",
                self.github_api_base, request.template
            ))
            .header("Authorization", format!("Bearer {}", self.github_token))
            .header("User-Agent", USER_AGENT)
            .header("Accept", GITHUB_ACCEPT_HEADER)
            .json(&payload)
            .send()
            .await?;

        if response.status().is_success() {
            let repo: GeneratedRepo = response
                .json()
                .await
                .map_err(|e| JobError::MalformedResponse {
                    provider: "GitHub",
                    details: e.to_string(),
                })?;
            Ok(repo)
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(JobError::Upstream {
                provider: "GitHub",
                status,
                message: body,
            })
        }
    }

    /// Create the Vercel project linked to the generated repository.
    async fn create_project(
        &self,
        request: &JobRequest,
        repo_full_name: &str,
    ) -> Result<VercelProject, JobError> {
        let payload = serde_json::json!({
            "name": request.project_name,
            "framework": "nextjs",
            "gitRepository": {
                "type": "github",
                "repo": repo_full_name,
            },
        });

        let response = self
            .client
            .post(format!("{}/v10/projects", self.vercel_api_base))
            .header("Authorization", format!("Bearer {}", self.vercel_token))
            .header("User-Agent", USER_AGENT)
            .json(&payload)
            .send()
            .await?;

        if response.status().is_success() {
            let project: VercelProject =
                response
                    .json()
                    .await
                    .map_err(|e| JobError::MalformedResponse {
                        provider: "Vercel",
                        details: e.to_string(),
                    })?;
            Ok(project)
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(JobError::Upstream {
                provider: "Vercel",
                status,
                message: body,
            })
        }
    }

    /// Trigger the first deployment of the project.
    async fn trigger_deployment(
        &self,
        request: &JobRequest,
        repo_full_name: &str,
    ) -> Result<VercelDeployment, JobError> {
        let payload = serde_json::json!({
            "name": request.project_name,
            "gitSource": {
                "type": "github",
                "repo": repo_full_name,
                "ref": "main",
            },
        });

        let response = self
            .client
            .post(format!("{}/v13/deployments", self.vercel_api_base))
            .header("Authorization", format!("Bearer {}", self.vercel_token))
            .header("User-Agent", USER_AGENT)
            .json(&payload)
            .send()
            .await?;

        if response.status().is_success() {
            let deployment: VercelDeployment =
                response
                    .json()
                    .await
                    .map_err(|e| JobError::MalformedResponse {
                        provider: "Vercel",
                        details: e.to_string(),
                    })?;
            Ok(deployment)
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(JobError::Upstream {
                provider: "Vercel",
                status,
                message: body,
            })
        }
    }
}

#[async_trait]
impl DeploymentJob for TemplateDeployJob {
    async fn run(&self, request: JobRequest) -> Result<DeploymentLocators, JobError> {
        info!(
            deployment_id = %request.deployment_id,
            template = %request.template,
            project_name = %request.project_name,
            "Generating repository from template"
        );
        let repo = self.generate_repository(&request).await?;

        info!(
            deployment_id = %request.deployment_id,
            repo = %repo.full_name,
            "Creating Vercel project"
        );
        let project = self.create_project(&request, &repo.full_name).await?;

        info!(
            deployment_id = %request.deployment_id,
            project = %project.name,
            "Triggering first deployment"
        );
        let deployment = self.trigger_deployment(&request, &repo.full_name).await?;

        Ok(DeploymentLocators {
            github_repo_url: Some(repo.html_url),
            github_repo_name: Some(repo.full_name),
            vercel_project_url: Some(format!("https://vercel.com/{}", project.name)),
            vercel_deployment_url: Some(format!("https://{}", deployment.url)),
        })
    }
}
