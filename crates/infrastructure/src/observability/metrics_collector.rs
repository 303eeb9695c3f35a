//! Metrics collector for the fleet monitor
//!
//! 轮询结果和聚合规模通过 `metrics` 门面上报，是否导出由进程安装的 recorder 决定。

use metrics::{counter, gauge, histogram, Counter, Gauge, Histogram};
use tracing::debug;

/// 单次轮询的结果分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Complete,
    Partial,
    Stale,
    Unavailable,
}

impl PollOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PollOutcome::Complete => "complete",
            PollOutcome::Partial => "partial",
            PollOutcome::Stale => "stale",
            PollOutcome::Unavailable => "unavailable",
        }
    }
}

/// Metrics collector for the fleet monitor
pub struct MetricsCollector {
    polls_complete: Counter,
    polls_partial: Counter,
    polls_stale: Counter,
    polls_unavailable: Counter,
    poll_duration: Histogram,

    partitions_total: Gauge,
    partitions_missing: Counter,
    partitions_failed: Counter,

    online_nodes: Gauge,
    pending_items: Gauge,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            polls_complete: counter!("monitor_polls_total", "outcome" => "complete"),
            polls_partial: counter!("monitor_polls_total", "outcome" => "partial"),
            polls_stale: counter!("monitor_polls_total", "outcome" => "stale"),
            polls_unavailable: counter!("monitor_polls_total", "outcome" => "unavailable"),
            poll_duration: histogram!("monitor_poll_duration_seconds"),
            partitions_total: gauge!("monitor_partitions"),
            partitions_missing: counter!("monitor_partitions_missing_total"),
            partitions_failed: counter!("monitor_partitions_failed_total"),
            online_nodes: gauge!("monitor_online_nodes"),
            pending_items: gauge!("monitor_pending_work_items"),
        }
    }

    /// 记录一次轮询
    pub fn record_poll(&self, outcome: PollOutcome, duration_seconds: f64) {
        match outcome {
            PollOutcome::Complete => self.polls_complete.increment(1),
            PollOutcome::Partial => self.polls_partial.increment(1),
            PollOutcome::Stale => self.polls_stale.increment(1),
            PollOutcome::Unavailable => self.polls_unavailable.increment(1),
        }
        self.poll_duration.record(duration_seconds);

        debug!(
            outcome = outcome.as_str(),
            duration_seconds = duration_seconds,
            "监控轮询完成"
        );
    }

    /// 记录分区覆盖情况
    pub fn record_partitions(&self, total: usize, missing: usize, failed: usize) {
        self.partitions_total.set(total as f64);
        self.partitions_missing.increment(missing as u64);
        self.partitions_failed.increment(failed as u64);
    }

    pub fn update_fleet(&self, online_nodes: i64, pending_items: i64) {
        self.online_nodes.set(online_nodes as f64);
        self.pending_items.set(pending_items as f64);
    }
}
