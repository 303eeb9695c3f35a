//! # Monitor Aggregator
//!
//! 从任务目录、工作项分区和节点心跳三类只读数据源计算看板快照。
//!
//! 每次轮询的流程：
//! 1. `PartitionRegistry` 读取任务目录并解析出需要查询的分区
//! 2. 在同一个 `PollContext` 下，先查询每个分区的状态分布（与节点存活并发），
//!    再用这份分布并发执行进度估算和吞吐量聚合；分区查询通过有界并发扇出
//! 3. `SnapshotAssembler` 组装为 `MonitorSnapshot`
//! 4. `SnapshotService` 施加截止时间，失败时回退到上一次成功的快照

pub mod context;
pub mod fan_out;
pub mod liveness;
pub mod progress;
pub mod queue_stats;
pub mod registry;
pub mod service;
pub mod snapshot;
pub mod throughput;

pub use context::{PollContext, PollWindows, TaskPartition};
pub use fan_out::{Aggregated, FanOut, PartitionCoverage};
pub use liveness::{LivenessReport, LivenessTracker, NodeCpuTrend, NodeStats};
pub use progress::{format_estimated_time, ProgressEstimate, ProgressEstimator, TaskProgress};
pub use queue_stats::{QueueStats, QueueStatusAggregator, StatusHistograms};
pub use registry::PartitionRegistry;
pub use service::{SnapshotOutcome, SnapshotService};
pub use snapshot::{MonitorSnapshot, SnapshotAssembler, SnapshotMeta, SnapshotState};
pub use throughput::{
    DailyPoint, HourlyPoint, MinutePoint, NodePerformance, PerformanceStats, ThroughputAggregator,
    ThroughputPoint, ThroughputReport,
};

/// 四舍五入到指定小数位
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
