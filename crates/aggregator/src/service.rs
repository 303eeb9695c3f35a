use chrono::Utc;
use monitor_core::{MonitorError, MonitorResult};
use monitor_infrastructure::{MetricsCollector, PollOutcome};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, error, info_span, warn, Instrument};

use crate::snapshot::{MonitorSnapshot, SnapshotAssembler, SnapshotState};

/// 一次轮询对外的结果
#[derive(Debug, Clone)]
pub enum SnapshotOutcome {
    /// 本轮计算成功（可能是 partial）
    Fresh(MonitorSnapshot),
    /// 本轮失败，返回上一次成功的快照
    Stale(MonitorSnapshot),
    /// 本轮失败且没有可用的历史快照
    Unavailable(String),
}

impl SnapshotOutcome {
    pub fn snapshot(&self) -> Option<&MonitorSnapshot> {
        match self {
            SnapshotOutcome::Fresh(s) | SnapshotOutcome::Stale(s) => Some(s),
            SnapshotOutcome::Unavailable(_) => None,
        }
    }

    pub fn into_result(self) -> Result<MonitorSnapshot, String> {
        match self {
            SnapshotOutcome::Fresh(s) | SnapshotOutcome::Stale(s) => Ok(s),
            SnapshotOutcome::Unavailable(reason) => Err(reason),
        }
    }
}

/// 快照服务
///
/// 每次请求都完整执行一次聚合，并施加截止时间。
/// 轮询之间只保留最近一次成功的快照，用于失败时降级。
pub struct SnapshotService {
    assembler: SnapshotAssembler,
    deadline: Duration,
    last_good: Arc<RwLock<Option<MonitorSnapshot>>>,
    metrics: Arc<MetricsCollector>,
}

impl SnapshotService {
    pub fn new(assembler: SnapshotAssembler, deadline: Duration) -> Self {
        Self {
            assembler,
            deadline,
            last_good: Arc::new(RwLock::new(None)),
            metrics: Arc::new(MetricsCollector::new()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// 最近一次成功的快照
    pub async fn last_good(&self) -> Option<MonitorSnapshot> {
        self.last_good.read().await.clone()
    }

    pub async fn poll(&self) -> SnapshotOutcome {
        let now = Utc::now();
        let span = info_span!("monitor_poll", generated_at = %now.to_rfc3339());
        let started = Instant::now();

        let result = self.run_with_deadline(now).instrument(span).await;
        let elapsed = started.elapsed().as_secs_f64();

        match result {
            Ok(snapshot) => {
                let outcome = match snapshot.state() {
                    SnapshotState::Partial => PollOutcome::Partial,
                    _ => PollOutcome::Complete,
                };
                self.metrics.record_poll(outcome, elapsed);
                self.metrics.record_partitions(
                    snapshot.meta.partitions_total,
                    snapshot.meta.partitions_missing.len(),
                    snapshot.meta.partitions_failed.len(),
                );
                self.metrics
                    .update_fleet(snapshot.node_stats.online, snapshot.queue_stats.pending);

                self.remember(&snapshot).await;
                SnapshotOutcome::Fresh(snapshot)
            }
            Err(e) => {
                let message = e.user_message();
                match self.last_good.read().await.clone() {
                    Some(previous) => {
                        warn!("监控快照计算失败，返回上一次的快照: {}", e);
                        self.metrics.record_poll(PollOutcome::Stale, elapsed);
                        SnapshotOutcome::Stale(previous.into_stale(message))
                    }
                    None => {
                        error!("监控快照计算失败且没有可用的历史快照: {}", e);
                        self.metrics.record_poll(PollOutcome::Unavailable, elapsed);
                        SnapshotOutcome::Unavailable(message)
                    }
                }
            }
        }
    }

    /// 保存成功的快照；并发轮询中较早开始的一轮不会覆盖较新的结果
    async fn remember(&self, snapshot: &MonitorSnapshot) {
        let mut last_good = self.last_good.write().await;
        match last_good.as_ref() {
            Some(existing) if existing.meta.generated_at > snapshot.meta.generated_at => {
                debug!(
                    "丢弃较旧的快照: {} 早于 {}",
                    snapshot.meta.generated_at, existing.meta.generated_at
                );
            }
            _ => *last_good = Some(snapshot.clone()),
        }
    }

    async fn run_with_deadline(
        &self,
        now: chrono::DateTime<Utc>,
    ) -> MonitorResult<MonitorSnapshot> {
        match tokio::time::timeout(self.deadline, self.assembler.assemble(now)).await {
            Ok(result) => result,
            Err(_) => Err(MonitorError::timeout(format!(
                "快照计算超过 {:?} 截止时间",
                self.deadline
            ))),
        }
    }
}
