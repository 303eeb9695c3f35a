use chrono::{DateTime, Utc};
use monitor_core::{
    models::{HeartbeatRecord, HeartbeatSummary},
    traits::HeartbeatStore,
    MonitorError, MonitorResult,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

use crate::context::PollWindows;
use crate::round_to;

/// 节点存活统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeStats {
    pub total: i64,
    pub online: i64,
    pub offline: i64,
    /// 在线窗口内心跳的平均CPU使用率，保留一位小数
    pub avg_cpu_usage: f64,
}

impl From<HeartbeatSummary> for NodeStats {
    fn from(summary: HeartbeatSummary) -> Self {
        let total = summary.total_nodes.max(0);
        let online = summary.online_nodes.clamp(0, total);
        Self {
            total,
            online,
            offline: total - online,
            avg_cpu_usage: summary.avg_cpu_usage.map(|v| round_to(v, 1)).unwrap_or(0.0),
        }
    }
}

/// 单个节点按分钟的CPU使用率
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeCpuTrend {
    pub node: String,
    /// `YYYY-MM-DD HH:MM` → CPU使用率
    pub points: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LivenessReport {
    pub node_stats: NodeStats,
    pub node_cpu_trend: Vec<NodeCpuTrend>,
}

/// 按节点和分钟归并心跳，同一分钟内以时间最晚的一条为准
///
/// 节点按首次出现的顺序输出。时间相同的心跳按节点地址、再按CPU值排序，
/// 输出与数据库返回的行顺序无关。
pub fn cpu_trend(records: &[HeartbeatRecord]) -> Vec<NodeCpuTrend> {
    let mut ordered: Vec<&HeartbeatRecord> = records.iter().collect();
    ordered.sort_by(|a, b| {
        a.last_heartbeat
            .cmp(&b.last_heartbeat)
            .then_with(|| a.client_addr.cmp(&b.client_addr))
            .then_with(|| a.cpu_usage.total_cmp(&b.cpu_usage))
    });

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut trends: Vec<NodeCpuTrend> = Vec::new();

    for record in ordered {
        let slot = *index.entry(record.client_addr.as_str()).or_insert_with(|| {
            trends.push(NodeCpuTrend {
                node: record.client_addr.clone(),
                points: BTreeMap::new(),
            });
            trends.len() - 1
        });
        let minute = record.last_heartbeat.format("%Y-%m-%d %H:%M").to_string();
        trends[slot].points.insert(minute, record.cpu_usage);
    }

    trends
}

/// 节点存活追踪器
pub struct LivenessTracker {
    store: Arc<dyn HeartbeatStore>,
}

impl LivenessTracker {
    pub fn new(store: Arc<dyn HeartbeatStore>) -> Self {
        Self { store }
    }

    /// 心跳流不可用时整体失败，不产生部分结果
    pub async fn track(
        &self,
        now: DateTime<Utc>,
        windows: &PollWindows,
    ) -> MonitorResult<LivenessReport> {
        let summary = self
            .store
            .node_summary(now - windows.freshness)
            .await
            .map_err(heartbeat_error)?;
        let records = self
            .store
            .heartbeats_since(now - windows.cpu_trend_window)
            .await
            .map_err(heartbeat_error)?;

        let report = LivenessReport {
            node_stats: NodeStats::from(summary),
            node_cpu_trend: cpu_trend(&records),
        };
        debug!(
            "节点存活统计: {} 在线 / {} 总数, {} 条心跳",
            report.node_stats.online,
            report.node_stats.total,
            records.len()
        );
        Ok(report)
    }
}

fn heartbeat_error(err: MonitorError) -> MonitorError {
    match err {
        MonitorError::HeartbeatUnavailable(_) => err,
        other => MonitorError::HeartbeatUnavailable(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use monitor_testing_utils::{heartbeat, MockHeartbeatStore};

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, m, s).unwrap()
    }

    #[tokio::test]
    async fn test_online_offline_split() {
        let now = at(12, 0, 0);
        let store = MockHeartbeatStore::with_records(vec![
            heartbeat("10.0.0.1", 50.0, now - Duration::minutes(1)),
            heartbeat("10.0.0.2", 30.0, now - Duration::minutes(2)),
            heartbeat("10.0.0.3", 70.0, now - Duration::minutes(10)),
        ]);
        let tracker = LivenessTracker::new(Arc::new(store));
        let report = tracker.track(now, &PollWindows::default()).await.unwrap();

        assert_eq!(
            report.node_stats,
            NodeStats {
                total: 3,
                online: 2,
                offline: 1,
                avg_cpu_usage: 40.0
            }
        );
    }

    #[tokio::test]
    async fn test_no_heartbeats() {
        let tracker = LivenessTracker::new(Arc::new(MockHeartbeatStore::new()));
        let report = tracker
            .track(at(12, 0, 0), &PollWindows::default())
            .await
            .unwrap();
        assert_eq!(report.node_stats, NodeStats::default());
        assert!(report.node_cpu_trend.is_empty());
    }

    #[tokio::test]
    async fn test_heartbeat_failure_is_fatal() {
        let store = MockHeartbeatStore::new();
        store.set_unavailable(true);
        let tracker = LivenessTracker::new(Arc::new(store));
        let err = tracker
            .track(at(12, 0, 0), &PollWindows::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MonitorError::HeartbeatUnavailable(_)));
    }

    #[test]
    fn test_cpu_trend_last_write_wins() {
        let records = vec![
            heartbeat("n1", 20.0, at(11, 30, 10)),
            heartbeat("n1", 35.0, at(11, 30, 50)),
            heartbeat("n2", 80.0, at(11, 30, 20)),
            heartbeat("n1", 40.0, at(11, 31, 5)),
        ];
        let trends = cpu_trend(&records);

        assert_eq!(trends.len(), 2);
        assert_eq!(trends[0].node, "n1");
        assert_eq!(trends[0].points["2024-03-01 11:30"], 35.0);
        assert_eq!(trends[0].points["2024-03-01 11:31"], 40.0);
        assert_eq!(trends[1].node, "n2");
        assert_eq!(trends[1].points.len(), 1);
    }

    #[test]
    fn test_cpu_trend_ignores_input_order() {
        let records = vec![
            heartbeat("n1", 35.0, at(11, 30, 50)),
            heartbeat("n1", 20.0, at(11, 30, 10)),
        ];
        let trends = cpu_trend(&records);
        assert_eq!(trends[0].points["2024-03-01 11:30"], 35.0);
    }

    #[test]
    fn test_cpu_trend_stable_under_timestamp_ties() {
        let records = vec![
            heartbeat("n2", 80.0, at(11, 30, 0)),
            heartbeat("n1", 20.0, at(11, 30, 0)),
            heartbeat("n1", 25.0, at(11, 30, 0)),
        ];
        let mut reversed = records.clone();
        reversed.reverse();

        let trends = cpu_trend(&records);
        assert_eq!(trends, cpu_trend(&reversed));
        assert_eq!(trends[0].node, "n1");
        assert_eq!(trends[1].node, "n2");
        assert_eq!(trends[0].points["2024-03-01 11:30"], 25.0);
    }

    #[test]
    fn test_node_stats_never_negative() {
        let stats = NodeStats::from(HeartbeatSummary {
            total_nodes: 2,
            online_nodes: 3,
            avg_cpu_usage: Some(12.345),
        });
        assert_eq!(stats.online, 2);
        assert_eq!(stats.offline, 0);
        assert_eq!(stats.avg_cpu_usage, 12.3);
    }
}
