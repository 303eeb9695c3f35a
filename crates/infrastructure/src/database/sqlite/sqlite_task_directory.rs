use async_trait::async_trait;
use monitor_core::{models::Task, traits::TaskDirectory, MonitorError, MonitorResult};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::database::query_builder::{from_epoch, MonitorQueryBuilder, SqlDialect};

pub struct SqliteTaskDirectory {
    pool: SqlitePool,
    queries: MonitorQueryBuilder,
}

impl SqliteTaskDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            queries: MonitorQueryBuilder::new(SqlDialect::Sqlite),
        }
    }

    fn row_to_task(row: &sqlx::sqlite::SqliteRow) -> MonitorResult<Task> {
        let created_at = row
            .try_get::<Option<i64>, _>("created_epoch")?
            .map(from_epoch)
            .transpose()?;
        Ok(Task {
            id: row.try_get("id")?,
            status: row.try_get("status")?,
            created_at,
        })
    }
}

#[async_trait]
impl TaskDirectory for SqliteTaskDirectory {
    async fn list_tasks(&self) -> MonitorResult<Vec<Task>> {
        let rows = sqlx::query(&self.queries.list_tasks())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MonitorError::TaskDirectoryUnavailable(e.to_string()))?;

        let tasks = rows
            .iter()
            .map(Self::row_to_task)
            .collect::<MonitorResult<Vec<_>>>()?;
        debug!("读取任务目录: {} 个任务", tasks.len());
        Ok(tasks)
    }
}
