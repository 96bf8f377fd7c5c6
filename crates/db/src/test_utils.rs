//! Helpers for tests that run against a real `PostgreSQL`.
//!
//! Connection settings come from `TEST_DB_*` environment variables so CI can
//! point the suite at a throwaway container.

use std::sync::Arc;

use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Statement};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::migrations::Migrator;

/// Application tables, children first.
const TABLES: [&str; 5] = [
    "follow_request",
    "following",
    "user_game",
    "user_profile",
    "user",
];

/// Test database configuration.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: env_or("TEST_DB_HOST", "localhost"),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: env_or("TEST_DB_USER", "gamerlink_test"),
            password: env_or("TEST_DB_PASSWORD", "gamerlink_test"),
            database: env_or("TEST_DB_NAME", "gamerlink_test"),
        }
    }
}

impl TestDbConfig {
    /// URL of the test database itself.
    #[must_use]
    pub fn database_url(&self) -> String {
        self.url_for(&self.database)
    }

    /// URL of the maintenance database, used to create and drop test databases.
    #[must_use]
    pub fn postgres_url(&self) -> String {
        self.url_for("postgres")
    }

    fn url_for(&self, database: &str) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{database}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// A connection to a test database.
pub struct TestDatabase {
    pub conn: Arc<DatabaseConnection>,
    pub config: TestDbConfig,
}

impl TestDatabase {
    /// Connect with the default configuration.
    pub async fn new() -> Result<Self, DbErr> {
        Self::with_config(TestDbConfig::default()).await
    }

    /// Connect with a custom configuration. The schema is left as is.
    pub async fn with_config(config: TestDbConfig) -> Result<Self, DbErr> {
        let conn = Database::connect(&config.database_url()).await?;
        info!(database = %config.database, "Connected to test database");
        Ok(Self {
            conn: Arc::new(conn),
            config,
        })
    }

    /// Connect, bring the schema up to date and empty every table.
    pub async fn migrated() -> Result<Self, DbErr> {
        let db = Self::new().await?;
        Migrator::up(db.connection(), None).await?;
        db.cleanup().await?;
        Ok(db)
    }

    /// Create a fresh, migrated database with a random name, for tests that
    /// must not share rows. Pair with [`Self::drop_database`].
    pub async fn create_unique() -> Result<Self, DbErr> {
        let mut config = TestDbConfig::default();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        config.database = format!("gamerlink_test_{}", &suffix[..8]);

        let admin = Database::connect(&config.postgres_url()).await?;
        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("CREATE DATABASE \"{}\"", config.database),
            ))
            .await?;
        admin.close().await?;

        let db = Self::with_config(config).await?;
        Migrator::up(db.connection(), None).await?;
        Ok(db)
    }

    /// Get the database connection.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// A handle on the connection for repositories and services.
    #[must_use]
    pub fn shared(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }

    /// Remove every row from the application tables.
    pub async fn cleanup(&self) -> Result<(), DbErr> {
        let tables = TABLES
            .iter()
            .map(|t| format!("\"{t}\""))
            .collect::<Vec<_>>()
            .join(", ");

        self.conn
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("TRUNCATE TABLE {tables} CASCADE"),
            ))
            .await?;
        Ok(())
    }

    /// Drop a database made by [`Self::create_unique`]. Every handle from
    /// [`Self::shared`] must be dropped first.
    pub async fn drop_database(self) -> Result<(), DbErr> {
        let conn = Arc::try_unwrap(self.conn).map_err(|conn| {
            DbErr::Custom(format!(
                "test database {} still has {} open handles",
                self.config.database,
                Arc::strong_count(&conn)
            ))
        })?;
        conn.close().await?;

        let admin = Database::connect(&self.config.postgres_url()).await?;
        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)", self.config.database),
            ))
            .await?;
        admin.close().await?;

        info!(database = %self.config.database, "Dropped test database");
        Ok(())
    }
}
