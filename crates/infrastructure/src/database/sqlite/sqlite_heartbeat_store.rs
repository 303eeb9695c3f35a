use async_trait::async_trait;
use chrono::{DateTime, Utc};
use monitor_core::{
    models::{HeartbeatRecord, HeartbeatSummary},
    traits::HeartbeatStore,
    MonitorError, MonitorResult,
};
use sqlx::{Row, SqlitePool};

use crate::database::query_builder::{from_epoch, MonitorQueryBuilder, SqlDialect};

pub struct SqliteHeartbeatStore {
    pool: SqlitePool,
    queries: MonitorQueryBuilder,
}

impl SqliteHeartbeatStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            queries: MonitorQueryBuilder::new(SqlDialect::Sqlite),
        }
    }
}

#[async_trait]
impl HeartbeatStore for SqliteHeartbeatStore {
    async fn node_summary(&self, online_since: DateTime<Utc>) -> MonitorResult<HeartbeatSummary> {
        let row = sqlx::query(&self.queries.node_summary())
            .bind(online_since.timestamp())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| MonitorError::HeartbeatUnavailable(e.to_string()))?;

        Ok(HeartbeatSummary {
            total_nodes: row.try_get("total_nodes")?,
            online_nodes: row.try_get("online_nodes")?,
            avg_cpu_usage: row.try_get("avg_cpu_usage")?,
        })
    }

    async fn heartbeats_since(&self, since: DateTime<Utc>) -> MonitorResult<Vec<HeartbeatRecord>> {
        let rows = sqlx::query(&self.queries.heartbeats_since())
            .bind(since.timestamp())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MonitorError::HeartbeatUnavailable(e.to_string()))?;

        rows.iter()
            .map(|row| -> MonitorResult<HeartbeatRecord> {
                Ok(HeartbeatRecord {
                    client_addr: row.try_get("client_addr")?,
                    cpu_usage: row.try_get("cpu_usage")?,
                    last_heartbeat: from_epoch(row.try_get("heartbeat_epoch")?)?,
                })
            })
            .collect()
    }
}
