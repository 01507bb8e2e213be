//! Database seeding functionality
//!
//! This module provides functionality to seed the database with demo data.
//! Seeding runs per owner on first read rather than at application start, so
//! a new owner's listing is populated lazily.

pub mod deployment;

pub use deployment::seed_demo_deployments;
