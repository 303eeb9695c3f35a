pub mod manager;
pub mod postgres;
pub mod query_builder;
pub mod sqlite;

pub use manager::{DatabaseManager, DatabasePool, DatabaseType};
pub use postgres::{PostgresHeartbeatStore, PostgresPartitionStore, PostgresTaskDirectory};
pub use query_builder::{MonitorQueryBuilder, SqlDialect};
pub use sqlite::{SqliteHeartbeatStore, SqlitePartitionStore, SqliteTaskDirectory};
