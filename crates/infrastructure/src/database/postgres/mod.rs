pub mod postgres_heartbeat_store;
pub mod postgres_partition_store;
pub mod postgres_task_directory;

pub use postgres_heartbeat_store::PostgresHeartbeatStore;
pub use postgres_partition_store::PostgresPartitionStore;
pub use postgres_task_directory::PostgresTaskDirectory;
