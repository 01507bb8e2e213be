//! # Launchpad Deployments API Library
//!
//! This library provides the core functionality for the Launchpad deployments
//! service: owner-scoped deployment records, the deployment lifecycle
//! controller, and the HTTP surface.

pub mod auth;
pub mod config;
pub mod db;
pub mod deployer;
pub mod error;
pub mod handlers;
pub mod invalidation;
pub mod models;
pub mod repositories;
pub mod seeds;
pub mod server;
pub mod telemetry;
pub mod validation;
pub use migration;
