//! Owner repository for database operations

use anyhow::Result;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::owner::{self, Entity as Owner};

/// Repository for owner database operations
#[derive(Debug, Clone)]
pub struct OwnerRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl OwnerRepository {
    /// Creates a new OwnerRepository instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an owner by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<owner::Model>> {
        let record = Owner::find_by_id(id).one(&*self.db).await?;
        Ok(record)
    }

    /// Make sure a row exists for the authenticated owner id.
    ///
    /// Owners are provisioned lazily on their first request. Two concurrent
    /// first requests can both attempt the insert; the loser's unique
    /// violation is treated as success.
    pub async fn ensure(&self, id: Uuid) -> Result<()> {
        if self.find_by_id(id).await?.is_some() {
            return Ok(());
        }

        let record = owner::ActiveModel {
            id: Set(id),
            display_name: Set(None),
            created_at: Set(Utc::now().fixed_offset()),
        };

        match record.insert(&*self.db).await {
            Ok(_) => {
                tracing::info!(owner_id = %id, "Owner record created");
                Ok(())
            }
            Err(err) if crate::error::is_unique_violation(&err) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
