//! Database migrations for the Launchpad Deployments API.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_11_10_090000_create_owners;
mod m2025_11_10_090100_create_deployments;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_11_10_090000_create_owners::Migration),
            Box::new(m2025_11_10_090100_create_deployments::Migration),
        ]
    }
}
