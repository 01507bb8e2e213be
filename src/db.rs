//! SeaORM pool management for the Launchpad deployments API.
//!
//! Owns pool construction (with bounded retry on transient connect
//! failures) and the trivial-query probe behind `/healthz`.

use anyhow::{Context, Result};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement,
};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::AppConfig;

const MAX_CONNECT_ATTEMPTS: u32 = 5;

/// Errors that can occur while bringing up the database connection.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("failed to connect to the database: {source}")]
    ConnectionFailed {
        #[from]
        source: sea_orm::DbErr,
    },
    #[error("invalid database configuration: {message}")]
    InvalidConfiguration { message: String },
}

/// Connects a pool sized and timed per the configuration.
///
/// Transient connect errors back off exponentially from 100ms; the last
/// error is surfaced once the attempt limit is reached.
///
/// ```no_run
/// use launchpad::{config::AppConfig, db::init_pool};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let db = init_pool(&AppConfig::default()).await?;
///     drop(db);
///     Ok(())
/// }
/// ```
pub async fn init_pool(cfg: &AppConfig) -> Result<DatabaseConnection> {
    if cfg.database_url.is_empty() {
        return Err(DatabaseError::InvalidConfiguration {
            message: "database URL must not be empty".to_string(),
        }
        .into());
    }

    let mut options = ConnectOptions::new(&cfg.database_url);
    options
        .max_connections(cfg.db_max_connections)
        .acquire_timeout(Duration::from_millis(cfg.db_acquire_timeout_ms))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let mut delay = Duration::from_millis(100);
    let mut attempt = 1;
    loop {
        match Database::connect(options.clone()).await {
            Ok(conn) => {
                log::info!("Connected to database on attempt {attempt}");
                return Ok(conn);
            }
            Err(e) if attempt < MAX_CONNECT_ATTEMPTS => {
                log::warn!("Database connect attempt {attempt} failed ({e}); retrying in {delay:?}");
                sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(e) => {
                log::error!("Giving up on the database after {MAX_CONNECT_ATTEMPTS} attempts: {e}");
                return Err(DatabaseError::ConnectionFailed { source: e }.into());
            }
        }
    }
}

/// Runs a trivial query; an error means the pool has lost its backend.
pub async fn health_check(db: &DatabaseConnection) -> Result<()> {
    let probe = Statement::from_string(db.get_database_backend(), "SELECT 1".to_string());
    db.query_one(probe)
        .await
        .context("database health check query failed")?;
    Ok(())
}
