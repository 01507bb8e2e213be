//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM operations
//! for database entities, providing a clean API for data access with owner-scoped methods.

pub mod deployment;
pub mod owner;

pub use deployment::{DeploymentPatch, DeploymentRepository, NewDeployment};
pub use owner::OwnerRepository;
