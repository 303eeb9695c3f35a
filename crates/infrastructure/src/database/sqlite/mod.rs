pub mod sqlite_heartbeat_store;
pub mod sqlite_partition_store;
pub mod sqlite_task_directory;

pub use sqlite_heartbeat_store::SqliteHeartbeatStore;
pub use sqlite_partition_store::SqlitePartitionStore;
pub use sqlite_task_directory::SqliteTaskDirectory;
