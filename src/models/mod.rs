//! Data models shared across the deployments API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod deployment;
pub mod owner;

pub use deployment::Entity as Deployment;
pub use deployment::{DeploymentLocators, DeploymentStatus};
pub use owner::Entity as Owner;

/// Service banner returned by the root endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// Service name
    pub service: String,
    /// Crate version at build time
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "launchpad-deployments".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
