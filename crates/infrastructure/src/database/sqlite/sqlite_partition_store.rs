use async_trait::async_trait;
use chrono::{DateTime, Utc};
use monitor_core::{
    models::{BucketCount, DurationSummary, PartitionId, StatusCount},
    traits::PartitionStore,
    MonitorResult,
};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::database::query_builder::{partition_error, MonitorQueryBuilder, SqlDialect};

pub struct SqlitePartitionStore {
    pool: SqlitePool,
    queries: MonitorQueryBuilder,
}

impl SqlitePartitionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            queries: MonitorQueryBuilder::new(SqlDialect::Sqlite),
        }
    }
}

#[async_trait]
impl PartitionStore for SqlitePartitionStore {
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
