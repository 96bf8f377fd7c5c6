//! Database layer for gamerlink.

pub mod entities;
pub mod migrations;
pub mod repositories;
pub mod test_utils;

use gamerlink_common::{AppError, AppResult, Config};
use sea_orm::{
    AccessMode, ConnectOptions, Database, DatabaseConnection, DatabaseTransaction, IsolationLevel,
    TransactionTrait,
};
use std::time::Duration;
use tracing::log::LevelFilter;

/// Initialize database connection.
pub async fn init(config: &Config) -> Result<DatabaseConnection, AppError> {
    let mut opt = ConnectOptions::new(&config.database.url);

    opt.max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);

    Database::connect(opt)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Run pending migrations.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), AppError> {
    use sea_orm_migration::MigratorTrait;
    migrations::Migrator::up(db, None)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Begin a read-write transaction.
///
/// Dropping the returned transaction without calling [`commit`] rolls it back.
pub async fn begin(db: &DatabaseConnection) -> AppResult<DatabaseTransaction> {
    db.begin()
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Begin a read-only `REPEATABLE READ` transaction.
///
/// Every query issued through it sees the same snapshot.
pub async fn begin_snapshot(db: &DatabaseConnection) -> AppResult<DatabaseTransaction> {
    db.begin_with_config(
        Some(IsolationLevel::RepeatableRead),
        Some(AccessMode::ReadOnly),
    )
    .await
    .map_err(|e| AppError::Database(e.to_string()))
}

/// Commit a transaction.
pub async fn commit(txn: DatabaseTransaction) -> AppResult<()> {
    txn.commit()
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}
