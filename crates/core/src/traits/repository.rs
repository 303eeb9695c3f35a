//! 只读数据存储接口定义
//!
//! 监控引擎只依赖三个只读数据源：
//! - `TaskDirectory` - 任务目录
//! - `PartitionStore` - 按任务分区的工作项存储
//! - `HeartbeatStore` - 节点心跳流
//!
//! 聚合逻辑只面向这些 trait 编写，PostgreSQL / SQLite 实现位于
//! `monitor-infrastructure`，测试中可以换成内存实现。
//!
//! 时间窗口一律由调用方以 `since` 绝对时间传入，存储层不读取系统时钟。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    BucketCount, DurationSummary, HeartbeatRecord, HeartbeatSummary, PartitionId, StatusCount,
    Task,
};
use crate::MonitorResult;

/// 任务目录接口
#[async_trait]
pub trait TaskDirectory: Send + Sync {
    /// 列出所有任务，按创建时间倒序（最新在前）
    async fn list_tasks(&self) -> MonitorResult<Vec<Task>>;
}

/// 工作项分区存储接口
///
/// 分区不存在时必须返回 `MonitorError::PartitionNotFound`，
/// 调用方据此把该分区视为零贡献而不是失败。
#[async_trait]
pub trait PartitionStore: Send + Sync {
    /// 按状态分组计数，包含未知状态的行
    async fn status_histogram(&self, partition: &PartitionId) -> MonitorResult<Vec<StatusCount>>;

    /// `last_updated >= since` 的已完成工作项数量
    async fn completed_since(
        &self,
        partition: &PartitionId,
        since: DateTime<Utc>,
    ) -> MonitorResult<i64>;

    /// 按 floor(epoch / width_seconds) 分桶统计 `last_updated >= since` 的已完成工作项
    async fn completion_buckets(
        &self,
        partition: &PartitionId,
        since: DateTime<Utc>,
        width_seconds: i64,
    ) -> MonitorResult<Vec<BucketCount>>;

    /// 已完成工作项的处理耗时汇总（整分钟截断，只统计大于0的样本）
    async fn duration_summary(&self, partition: &PartitionId) -> MonitorResult<DurationSummary>;
}

/// 节点心跳存储接口
#[async_trait]
pub trait HeartbeatStore: Send + Sync {
    /// 节点汇总：`online_since` 之后有心跳的节点视为在线
    async fn node_summary(&self, online_since: DateTime<Utc>) -> MonitorResult<HeartbeatSummary>;

    /// `since` 之后的心跳记录，按心跳时间升序
    async fn heartbeats_since(&self, since: DateTime<Utc>) -> MonitorResult<Vec<HeartbeatRecord>>;
}

/// 数据源健康检查接口
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn health_check(&self) -> MonitorResult<()>;
}
