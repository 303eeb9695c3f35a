use chrono::{DateTime, Utc};
use monitor_core::{
    traits::{HeartbeatStore, PartitionStore, TaskDirectory},
    MonitorConfig, MonitorResult,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::context::{PollContext, PollWindows};
use crate::fan_out::PartitionCoverage;
use crate::liveness::{LivenessTracker, NodeCpuTrend, NodeStats};
use crate::progress::{ProgressEstimator, TaskProgress};
use crate::queue_stats::{QueueStats, QueueStatusAggregator};
use crate::registry::PartitionRegistry;
use crate::throughput::{NodePerformance, PerformanceStats, ThroughputAggregator};

/// 快照状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotState {
    /// 所有分区都参与了聚合
    Complete,
    /// 部分分区查询失败，结果只覆盖可查询的子集
    Partial,
    /// 本轮计算失败，返回的是上一次成功的快照
    Stale,
}

/// 快照元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub state: SnapshotState,
    pub generated_at: DateTime<Utc>,
    pub partitions_total: usize,
    pub partitions_missing: Vec<String>,
    pub partitions_failed: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `/monitor-data` 返回的看板快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorSnapshot {
    pub tasks_progress: Vec<TaskProgress>,
    pub node_performance: NodePerformance,
    pub node_stats: NodeStats,
    pub queue_stats: QueueStats,
    pub performance_stats: PerformanceStats,
    pub node_cpu_trend: Vec<NodeCpuTrend>,
    pub meta: SnapshotMeta,
}

impl MonitorSnapshot {
    pub fn state(&self) -> SnapshotState {
        self.meta.state
    }

    /// 标记为过期快照并附带本轮失败原因
    pub fn into_stale(mut self, error: impl Into<String>) -> Self {
        self.meta.state = SnapshotState::Stale;
        self.meta.error = Some(error.into());
        self
    }
}

/// 快照组装器
///
/// 每次调用都重新读取任务目录并执行全部聚合，不做重试。
/// 任务目录或心跳流不可用时整体失败；单个分区的缺失或失败只影响覆盖范围。
pub struct SnapshotAssembler {
    registry: PartitionRegistry,
    queue_stats: QueueStatusAggregator,
    progress: ProgressEstimator,
    throughput: ThroughputAggregator,
    liveness: LivenessTracker,
    windows: PollWindows,
    max_in_flight: usize,
}

impl SnapshotAssembler {
    pub fn new(
        directory: Arc<dyn TaskDirectory>,
        partitions: Arc<dyn PartitionStore>,
        heartbeats: Arc<dyn HeartbeatStore>,
        config: &MonitorConfig,
    ) -> Self {
        Self {
            registry: PartitionRegistry::new(directory),
            queue_stats: QueueStatusAggregator::new(partitions.clone()),
            progress: ProgressEstimator::new(partitions.clone()),
            throughput: ThroughputAggregator::new(partitions),
            liveness: LivenessTracker::new(heartbeats),
            windows: PollWindows::from(config),
            max_in_flight: config.max_in_flight_queries,
        }
    }

    pub async fn assemble(&self, now: DateTime<Utc>) -> MonitorResult<MonitorSnapshot> {
        let resolved = self.registry.resolve().await?;
        let ctx = PollContext::new(
            now,
            resolved.targets,
            self.windows.clone(),
            self.max_in_flight,
        );

        // 状态分布每个分区只查一次，进度和吞吐量只查询已读到分布的分区
        let (histograms, liveness) = tokio::join!(
            self.queue_stats.collect(&ctx),
            self.liveness.track(now, &ctx.windows),
        );
        let liveness = liveness?;
        let queue_stats = QueueStats::from_histograms(histograms.value.values());

        let (progress, throughput) = tokio::join!(
            self.progress.estimate(&ctx, &histograms.value),
            self.throughput.aggregate(&ctx, &histograms.value),
        );

        let mut coverage = PartitionCoverage::default();
        coverage.merge(histograms.coverage);
        coverage.merge(progress.coverage);
        coverage.merge(throughput.coverage);

        let mut partitions_failed: Vec<String> = coverage
            .failed
            .iter()
            .map(|p| p.task_id().to_string())
            .collect();
        partitions_failed.extend(resolved.rejected);

        let state = if partitions_failed.is_empty() {
            SnapshotState::Complete
        } else {
            SnapshotState::Partial
        };

        let meta = SnapshotMeta {
            state,
            generated_at: now,
            partitions_total: ctx.targets.len(),
            partitions_missing: coverage
                .missing
                .iter()
                .map(|p| p.task_id().to_string())
                .collect(),
            partitions_failed,
            error: None,
        };

        info!(
            state = ?meta.state,
            partitions = meta.partitions_total,
            missing = meta.partitions_missing.len(),
            failed = meta.partitions_failed.len(),
            "监控快照已生成"
        );

        Ok(MonitorSnapshot {
            tasks_progress: progress.value,
            node_performance: throughput.value.node_performance,
            node_stats: liveness.node_stats,
            queue_stats,
            performance_stats: throughput.value.performance_stats,
            node_cpu_trend: liveness.node_cpu_trend,
            meta,
        })
    }
}
