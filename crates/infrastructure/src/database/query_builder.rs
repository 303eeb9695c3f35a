// 监控查询构建，屏蔽 PostgreSQL 与 SQLite 的时间函数差异

use chrono::{DateTime, Utc};
use monitor_core::{models::PartitionId, MonitorError, MonitorResult};

/// SQL方言
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    Postgres,
    Sqlite,
}

/// 监控只读查询构建器
///
/// 所有时间过滤和分桶都基于 epoch 秒整数完成，时间戳按 UTC 解释。
/// 分区表名只来自已校验的 `PartitionId`，其余参数全部走绑定。
#[derive(Debug, Clone, Copy)]
pub struct MonitorQueryBuilder {
    dialect: SqlDialect,
}

impl MonitorQueryBuilder {
    pub fn new(dialect: SqlDialect) -> Self {
        Self { dialect }
    }

    /// 列的 epoch 秒表达式
    pub fn epoch(&self, column: &str) -> String {
        match self.dialect {
            SqlDialect::Postgres => format!("CAST(FLOOR(EXTRACT(EPOCH FROM {column})) AS BIGINT)"),
            SqlDialect::Sqlite => format!("CAST(strftime('%s', {column}) AS INTEGER)"),
        }
    }

    fn as_double(&self, column: &str) -> String {
        match self.dialect {
            SqlDialect::Postgres => format!("CAST({column} AS DOUBLE PRECISION)"),
            SqlDialect::Sqlite => format!("CAST({column} AS REAL)"),
        }
    }

    pub fn list_tasks(&self) -> String {
        format!(
            "SELECT CAST(id AS TEXT) AS id, status, {} AS created_epoch FROM tasks ORDER BY created_at DESC NULLS LAST",
            self.epoch("created_at")
        )
    }

    pub fn status_histogram(&self, partition: &PartitionId) -> String {
        format!(
            "SELECT status, COUNT(*) AS count FROM {} GROUP BY status",
            partition.quoted_table()
        )
    }

    /// $1 = since（epoch秒）
    pub fn completed_since(&self, partition: &PartitionId) -> String {
        format!(
            "SELECT COUNT(*) AS count FROM {} WHERE status = 'completed' AND {} >= $1",
            partition.quoted_table(),
            self.epoch("last_updated")
        )
    }

    /// $1 = 桶宽度（秒），$2 = since（epoch秒）
    pub fn completion_buckets(&self, partition: &PartitionId) -> String {
        let epoch = self.epoch("last_updated");
        format!(
            "SELECT {epoch} / $1 AS bucket, COUNT(*) AS count FROM {} \
             WHERE status = 'completed' AND {epoch} >= $2 \
             GROUP BY bucket ORDER BY bucket",
            partition.quoted_table()
        )
    }

    pub fn duration_summary(&self, partition: &PartitionId) -> String {
        format!(
            "SELECT COUNT(*) AS samples, CAST(COALESCE(SUM(minutes), 0) AS BIGINT) AS total_minutes \
             FROM (SELECT ({} - {}) / 60 AS minutes FROM {} WHERE status = 'completed') AS durations \
             WHERE minutes > 0",
            self.epoch("last_updated"),
            self.epoch("created_at"),
            partition.quoted_table()
        )
    }

    /// $1 = 在线判定起点（epoch秒）
    pub fn node_summary(&self) -> String {
        let epoch = self.epoch("last_heartbeat");
        format!(
            "SELECT COUNT(DISTINCT client_addr) AS total_nodes, \
             COUNT(DISTINCT CASE WHEN {epoch} >= $1 THEN client_addr END) AS online_nodes, \
             AVG(CASE WHEN {epoch} >= $1 THEN {} END) AS avg_cpu_usage \
             FROM node_heartbeats",
            self.as_double("cpu_usage")
        )
    }

    /// $1 = since（epoch秒）
    pub fn heartbeats_since(&self) -> String {
        let epoch = self.epoch("last_heartbeat");
        format!(
            "SELECT client_addr, {} AS cpu_usage, {epoch} AS heartbeat_epoch \
             FROM node_heartbeats WHERE {epoch} >= $1 ORDER BY heartbeat_epoch ASC, client_addr ASC",
            self.as_double("cpu_usage")
        )
    }
}

/// 缺表错误判定：SQLite `no such table`，PostgreSQL SQLSTATE 42P01
pub fn is_missing_relation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some("42P01") || db_err.message().contains("no such table")
        }
        _ => false,
    }
}

/// 分区查询错误映射，缺表视为分区不存在
pub fn partition_error(partition: &PartitionId, err: sqlx::Error) -> MonitorError {
    if is_missing_relation(&err) {
        MonitorError::partition_not_found(partition.task_id())
    } else {
        MonitorError::Database(err)
    }
}

/// epoch秒转换为UTC时间
pub fn from_epoch(seconds: i64) -> MonitorResult<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| MonitorError::database_error(format!("无效的时间戳: {seconds}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_table_is_quoted() {
        let partition = PartitionId::new("42").unwrap();
        let builder = MonitorQueryBuilder::new(SqlDialect::Sqlite);
        let sql = builder.status_histogram(&partition);
        assert!(sql.contains("FROM \"task_42_ligands\""));
    }

    #[test]
    fn test_dialect_epoch_expressions() {
        let pg = MonitorQueryBuilder::new(SqlDialect::Postgres);
        let lite = MonitorQueryBuilder::new(SqlDialect::Sqlite);
        assert_eq!(
            pg.epoch("last_updated"),
            "CAST(FLOOR(EXTRACT(EPOCH FROM last_updated)) AS BIGINT)"
        );
        assert_eq!(
            lite.epoch("last_updated"),
            "CAST(strftime('%s', last_updated) AS INTEGER)"
        );
    }

    #[test]
    fn test_bucket_query_binds_width_first() {
        let partition = PartitionId::new("7").unwrap();
        let sql = MonitorQueryBuilder::new(SqlDialect::Postgres).completion_buckets(&partition);
        let width_pos = sql.find("$1").unwrap();
        let since_pos = sql.find("$2").unwrap();
        assert!(width_pos < since_pos);
    }

    #[test]
    fn test_non_database_errors_are_not_missing_tables() {
        assert!(!is_missing_relation(&sqlx::Error::RowNotFound));
        assert!(!is_missing_relation(&sqlx::Error::PoolTimedOut));
    }
}
