use chrono::{DateTime, Duration, Utc};
use monitor_core::{models::PartitionId, models::Task, MonitorConfig, MonitorResult};
use std::collections::HashMap;
use std::future::Future;
use tokio::sync::Semaphore;

use crate::fan_out::{fan_out, FanOut};

/// 单次轮询使用的时间窗口
#[derive(Debug, Clone)]
pub struct PollWindows {
    pub freshness: Duration,
    pub rate_window: Duration,
    pub daily_lookback: Duration,
    pub daily_limit: usize,
    pub hourly_lookback: Duration,
    pub minute_lookback: Duration,
    pub minute_bucket_seconds: i64,
    pub throughput_lookback: Duration,
    pub throughput_bucket_seconds: i64,
    pub cpu_trend_window: Duration,
}

impl From<&MonitorConfig> for PollWindows {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            freshness: Duration::seconds(config.freshness_window_seconds as i64),
            rate_window: Duration::seconds(config.rate_window_seconds as i64),
            daily_lookback: Duration::days(config.daily_lookback_days as i64),
            daily_limit: config.daily_lookback_days as usize,
            hourly_lookback: Duration::hours(config.hourly_lookback_hours as i64),
            minute_lookback: Duration::minutes(config.minute_lookback_minutes as i64),
            minute_bucket_seconds: config.minute_bucket_seconds as i64,
            throughput_lookback: Duration::hours(config.throughput_lookback_hours as i64),
            throughput_bucket_seconds: config.throughput_bucket_minutes as i64 * 60,
            cpu_trend_window: Duration::minutes(config.cpu_trend_window_minutes as i64),
        }
    }
}

impl Default for PollWindows {
    fn default() -> Self {
        Self::from(&MonitorConfig::default())
    }
}

impl PollWindows {
    /// 速率窗口长度（分钟）
    pub fn rate_window_minutes(&self) -> f64 {
        self.rate_window.num_seconds() as f64 / 60.0
    }
}

/// 需要查询的任务及其分区
#[derive(Debug, Clone, PartialEq)]
pub struct TaskPartition {
    pub task: Task,
    pub partition: PartitionId,
}

/// 单次轮询的上下文
///
/// 轮询内所有聚合器共享同一个 `now` 和同一组查询许可，
/// 分区查询的总并发不会超过 `max_in_flight`。
pub struct PollContext {
    pub now: DateTime<Utc>,
    pub targets: Vec<TaskPartition>,
    pub windows: PollWindows,
    max_in_flight: usize,
    permits: Semaphore,
}

impl PollContext {
    pub fn new(
        now: DateTime<Utc>,
        targets: Vec<TaskPartition>,
        windows: PollWindows,
        max_in_flight: usize,
    ) -> Self {
        let max_in_flight = max_in_flight.max(1);
        Self {
            now,
            targets,
            windows,
            max_in_flight,
            permits: Semaphore::new(max_in_flight),
        }
    }

    pub fn partitions(&self) -> Vec<PartitionId> {
        self.targets.iter().map(|t| t.partition.clone()).collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// 上一阶段查询成功的分区，保持任务目录顺序
    pub fn partitions_with<T>(&self, results: &HashMap<PartitionId, T>) -> Vec<PartitionId> {
        self.targets
            .iter()
            .filter(|t| results.contains_key(&t.partition))
            .map(|t| t.partition.clone())
            .collect()
    }

    /// 对所有分区执行 `op`，每个分区占用一个查询许可
    pub async fn fan_out<T, F, Fut>(&self, op: F) -> FanOut<T>
    where
        F: Fn(PartitionId) -> Fut,
        Fut: Future<Output = MonitorResult<T>>,
    {
        self.fan_out_to(self.partitions(), op).await
    }

    /// 只对给定分区执行 `op`
    pub async fn fan_out_to<T, F, Fut>(&self, partitions: Vec<PartitionId>, op: F) -> FanOut<T>
    where
        F: Fn(PartitionId) -> Fut,
        Fut: Future<Output = MonitorResult<T>>,
    {
        fan_out(partitions, &self.permits, self.max_in_flight, op).await
    }
}
