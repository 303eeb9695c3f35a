use async_trait::async_trait;
use chrono::{DateTime, Utc};
use monitor_core::{
    models::{BucketCount, DurationSummary, PartitionId, StatusCount},
    traits::PartitionStore,
    MonitorResult,
};
use sqlx::{PgPool, Row};
use tracing::debug;

use crate::database::query_builder::{partition_error, MonitorQueryBuilder, SqlDialect};

/// PostgreSQL工作项分区存储实现
///
/// 每个任务对应一张 `task_<id>_ligands` 表，表不存在时返回 `PartitionNotFound`。
pub struct PostgresPartitionStore {
    pool: PgPool,
    queries: MonitorQueryBuilder,
}

impl PostgresPartitionStore {
    /// 创建新的PostgreSQL分区存储
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            queries: MonitorQueryBuilder::new(SqlDialect::Postgres),
        }
    }
}

#[async_trait]
impl PartitionStore for PostgresPartitionStore {
    /// 按状态分组计数
    async fn status_histogram(&self, partition: &PartitionId) -> MonitorResult<Vec<StatusCount>> {
        let rows = sqlx::query(&self.queries.status_histogram(partition))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| partition_error(partition, e))?;

        let histogram = rows
            .iter()
            .map(|row| -> MonitorResult<StatusCount> {
                Ok(StatusCount {
                    status: row.try_get("status")?,
                    count: row.try_get("count")?,
                })
            })
            .collect::<MonitorResult<Vec<_>>>()?;
        debug!("分区 {} 状态分布: {:?}", partition, histogram);
        Ok(histogram)
    }

    /// 统计窗口内完成的工作项数量
    async fn completed_since(
        &self,
        partition: &PartitionId,
        since: DateTime<Utc>,
    ) -> MonitorResult<i64> {
        let row = sqlx::query(&self.queries.completed_since(partition))
            .bind(since.timestamp())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| partition_error(partition, e))?;

        Ok(row.try_get("count")?)
    }

    /// 按时间桶统计完成数量
    async fn completion_buckets(
        &self,
        partition: &PartitionId,
        since: DateTime<Utc>,
        width_seconds: i64,
    ) -> MonitorResult<Vec<BucketCount>> {
        let rows = sqlx::query(&self.queries.completion_buckets(partition))
            .bind(width_seconds)
            .bind(since.timestamp())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| partition_error(partition, e))?;

        rows.iter()
            .map(|row| -> MonitorResult<BucketCount> {
                Ok(BucketCount {
                    bucket: row.try_get("bucket")?,
                    count: row.try_get("count")?,
                })
            })
            .collect()
    }

    /// 汇总已完成工作项的处理耗时
    async fn duration_summary(&self, partition: &PartitionId) -> MonitorResult<DurationSummary> {
        let row = sqlx::query(&self.queries.duration_summary(partition))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| partition_error(partition, e))?;

        Ok(DurationSummary {
            total_minutes: row.try_get("total_minutes")?,
            samples: row.try_get("samples")?,
        })
    }
}
