use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use monitor_core::{
    traits::{HealthProbe, HeartbeatStore, PartitionStore, TaskDirectory},
    DatabaseConfig, MonitorError, MonitorResult,
};
use tracing::info;

use super::postgres::{PostgresHeartbeatStore, PostgresPartitionStore, PostgresTaskDirectory};
use super::sqlite::{SqliteHeartbeatStore, SqlitePartitionStore, SqliteTaskDirectory};

/// Database type detection
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseType {
    PostgreSQL,
    SQLite,
}

impl DatabaseType {
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            DatabaseType::PostgreSQL
        } else {
            DatabaseType::SQLite
        }
    }
}

/// Database connection pool enum
pub enum DatabasePool {
    PostgreSQL(sqlx::PgPool),
    SQLite(sqlx::SqlitePool),
}

impl DatabasePool {
    /// Create a bounded pool from the configured URL with automatic type detection
    pub async fn new(config: &DatabaseConfig) -> MonitorResult<Self> {
        let acquire_timeout = Duration::from_secs(config.connection_timeout_seconds);
        let idle_timeout = Duration::from_secs(config.idle_timeout_seconds);

        match DatabaseType::from_url(&config.url) {
            DatabaseType::PostgreSQL => {
                let pool = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .min_connections(config.min_connections)
                    .acquire_timeout(acquire_timeout)
                    .idle_timeout(idle_timeout)
                    .connect(&config.url)
                    .await
                    .map_err(MonitorError::Database)?;
                Ok(DatabasePool::PostgreSQL(pool))
            }
            DatabaseType::SQLite => {
                let pool = sqlx::sqlite::SqlitePoolOptions::new()
                    .max_connections(config.max_connections)
                    .min_connections(config.min_connections)
                    .acquire_timeout(acquire_timeout)
                    .idle_timeout(idle_timeout)
                    .connect(&config.url)
                    .await
                    .map_err(MonitorError::Database)?;
                Ok(DatabasePool::SQLite(pool))
            }
        }
    }

    pub fn database_type(&self) -> DatabaseType {
        match self {
            DatabasePool::PostgreSQL(_) => DatabaseType::PostgreSQL,
            DatabasePool::SQLite(_) => DatabaseType::SQLite,
        }
    }

    pub async fn health_check(&self) -> MonitorResult<()> {
        match self {
            DatabasePool::PostgreSQL(pool) => {
                sqlx::query("SELECT 1")
                    .execute(pool)
                    .await
                    .map_err(MonitorError::Database)?;
            }
            DatabasePool::SQLite(pool) => {
                sqlx::query("SELECT 1")
                    .execute(pool)
                    .await
                    .map_err(MonitorError::Database)?;
            }
        }
        Ok(())
    }

    pub async fn close(&self) {
        match self {
            DatabasePool::PostgreSQL(pool) => pool.close().await,
            DatabasePool::SQLite(pool) => pool.close().await,
        }
    }
}

/// Unified database manager
pub struct DatabaseManager {
    pool: DatabasePool,
}

impl DatabaseManager {
    /// Create new database manager with automatic type detection
    pub async fn new(config: &DatabaseConfig) -> MonitorResult<Self> {
        let pool = DatabasePool::new(config).await?;
        info!("数据库连接池已建立: {:?}", pool.database_type());
        Ok(Self { pool })
    }

    /// Wrap an already opened pool
    pub fn from_pool(pool: DatabasePool) -> Self {
        Self { pool }
    }

    pub fn database_type(&self) -> DatabaseType {
        self.pool.database_type()
    }

    pub async fn health_check(&self) -> MonitorResult<()> {
        self.pool.health_check().await
    }

    pub async fn close(&self) {
        self.pool.close().await
    }

    /// Factory method for the task directory
    pub fn task_directory(&self) -> Arc<dyn TaskDirectory> {
        match &self.pool {
            DatabasePool::PostgreSQL(pool) => Arc::new(PostgresTaskDirectory::new(pool.clone())),
            DatabasePool::SQLite(pool) => Arc::new(SqliteTaskDirectory::new(pool.clone())),
        }
    }

    /// Factory method for the work-item partition store
    pub fn partition_store(&self) -> Arc<dyn PartitionStore> {
        match &self.pool {
            DatabasePool::PostgreSQL(pool) => Arc::new(PostgresPartitionStore::new(pool.clone())),
            DatabasePool::SQLite(pool) => Arc::new(SqlitePartitionStore::new(pool.clone())),
        }
    }

    /// Factory method for the heartbeat store
    pub fn heartbeat_store(&self) -> Arc<dyn HeartbeatStore> {
        match &self.pool {
            DatabasePool::PostgreSQL(pool) => Arc::new(PostgresHeartbeatStore::new(pool.clone())),
            DatabasePool::SQLite(pool) => Arc::new(SqliteHeartbeatStore::new(pool.clone())),
        }
    }
}

#[async_trait]
impl HealthProbe for DatabaseManager {
    async fn health_check(&self) -> MonitorResult<()> {
        self.pool.health_check().await
    }
}
