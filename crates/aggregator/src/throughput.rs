use chrono::{DateTime, Utc};
use monitor_core::{
    models::{BucketCount, DurationSummary, PartitionId, StatusCount, WorkItemStatus},
    traits::PartitionStore,
    MonitorResult,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::context::{PollContext, PollWindows};
use crate::fan_out::Aggregated;
use crate::queue_stats::StatusHistograms;
use crate::round_to;

const DAY_SECONDS: i64 = 86_400;
const HOUR_SECONDS: i64 = 3_600;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    /// `MM-DD`
    pub date: String,
    pub bucket_start: DateTime<Utc>,
    pub completed_tasks: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyPoint {
    /// `HH:00`
    pub hour: String,
    pub bucket_start: DateTime<Utc>,
    pub completed_tasks: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinutePoint {
    /// `HH:MM`，桶起始时间
    pub minute: String,
    pub bucket_start: DateTime<Utc>,
    pub completed_tasks: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroughputPoint {
    /// `YYYY-MM-DD HH:MM:00`
    pub time_slot: String,
    pub bucket_start: DateTime<Utc>,
    pub total_count: i64,
}

/// 多粒度完成数序列
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePerformance {
    /// 按天，最新在前
    pub daily: Vec<DailyPoint>,
    /// 按小时，最早在前
    pub hourly: Vec<HourlyPoint>,
    /// 按分钟桶，最早在前
    pub minute: Vec<MinutePoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    /// 平均处理耗时（分钟），保留一位小数
    pub avg_processing_time: f64,
    /// 成功率（百分比），保留一位小数
    pub success_rate: f64,
    pub throughput: Vec<ThroughputPoint>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThroughputReport {
    pub node_performance: NodePerformance,
    pub performance_stats: PerformanceStats,
}

/// 单个分区的吞吐量原始数据
#[derive(Debug, Clone, Default)]
struct PartitionThroughput {
    daily: Vec<BucketCount>,
    hourly: Vec<BucketCount>,
    minute: Vec<BucketCount>,
    throughput: Vec<BucketCount>,
    durations: DurationSummary,
}

/// 按桶编号合并多个分区的计数，合计为 0 的桶不输出
pub fn merge_buckets<'a, I>(series: I) -> BTreeMap<i64, i64>
where
    I: IntoIterator<Item = &'a [BucketCount]>,
{
    let mut merged: BTreeMap<i64, i64> = BTreeMap::new();
    for buckets in series {
        for bucket in buckets {
            *merged.entry(bucket.bucket).or_default() += bucket.count;
        }
    }
    merged.retain(|_, count| *count > 0);
    merged
}

fn bucket_start(bucket: i64, width_seconds: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(bucket * width_seconds, 0)
}

fn daily_points(merged: &BTreeMap<i64, i64>, limit: usize) -> Vec<DailyPoint> {
    merged
        .iter()
        .rev()
        .take(limit)
        .filter_map(|(bucket, count)| {
            let start = bucket_start(*bucket, DAY_SECONDS)?;
            Some(DailyPoint {
                date: start.format("%m-%d").to_string(),
                bucket_start: start,
                completed_tasks: *count,
            })
        })
        .collect()
}

fn hourly_points(merged: &BTreeMap<i64, i64>) -> Vec<HourlyPoint> {
    merged
        .iter()
        .filter_map(|(bucket, count)| {
            let start = bucket_start(*bucket, HOUR_SECONDS)?;
            Some(HourlyPoint {
                hour: start.format("%H:00").to_string(),
                bucket_start: start,
                completed_tasks: *count,
            })
        })
        .collect()
}

fn minute_points(merged: &BTreeMap<i64, i64>, width_seconds: i64) -> Vec<MinutePoint> {
    merged
        .iter()
        .filter_map(|(bucket, count)| {
            let start = bucket_start(*bucket, width_seconds)?;
            Some(MinutePoint {
                minute: start.format("%H:%M").to_string(),
                bucket_start: start,
                completed_tasks: *count,
            })
        })
        .collect()
}

fn throughput_points(merged: &BTreeMap<i64, i64>, width_seconds: i64) -> Vec<ThroughputPoint> {
    merged
        .iter()
        .filter_map(|(bucket, count)| {
            let start = bucket_start(*bucket, width_seconds)?;
            Some(ThroughputPoint {
                time_slot: start.format("%Y-%m-%d %H:%M:00").to_string(),
                bucket_start: start,
                total_count: *count,
            })
        })
        .collect()
}

/// 平均处理耗时，没有样本时为 0
pub fn average_processing_time(summary: DurationSummary) -> f64 {
    if summary.samples > 0 {
        round_to(summary.total_minutes as f64 / summary.samples as f64, 1)
    } else {
        0.0
    }
}

/// 成功率 = completed / 全部工作项，没有工作项时为 0
pub fn success_rate<'a, I>(histograms: I) -> f64
where
    I: IntoIterator<Item = &'a [StatusCount]>,
{
    let (mut total, mut completed) = (0i64, 0i64);
    for histogram in histograms {
        for row in histogram {
            total += row.count;
            if row.work_item_status() == Some(WorkItemStatus::Completed) {
                completed += row.count;
            }
        }
    }
    if total > 0 {
        round_to(completed as f64 * 100.0 / total as f64, 1)
    } else {
        0.0
    }
}

/// 吞吐量聚合器
pub struct ThroughputAggregator {
    store: Arc<dyn PartitionStore>,
}

impl ThroughputAggregator {
    pub fn new(store: Arc<dyn PartitionStore>) -> Self {
        Self { store }
    }

    async fn collect_partition(
        store: &Arc<dyn PartitionStore>,
        partition: PartitionId,
        now: DateTime<Utc>,
        windows: &PollWindows,
    ) -> MonitorResult<PartitionThroughput> {
        Ok(PartitionThroughput {
            daily: store
                .completion_buckets(&partition, now - windows.daily_lookback, DAY_SECONDS)
                .await?,
            hourly: store
                .completion_buckets(&partition, now - windows.hourly_lookback, HOUR_SECONDS)
                .await?,
            minute: store
                .completion_buckets(
                    &partition,
                    now - windows.minute_lookback,
                    windows.minute_bucket_seconds,
                )
                .await?,
            throughput: store
                .completion_buckets(
                    &partition,
                    now - windows.throughput_lookback,
                    windows.throughput_bucket_seconds,
                )
                .await?,
            durations: store.duration_summary(&partition).await?,
        })
    }

    /// 成功率使用本轮已查询的状态分布，桶序列只查询状态分布成功的分区
    pub async fn aggregate(
        &self,
        ctx: &PollContext,
        histograms: &StatusHistograms,
    ) -> Aggregated<ThroughputReport> {
        let store = &self.store;
        let windows = &ctx.windows;
        let now = ctx.now;

        let fan_out = ctx
            .fan_out_to(ctx.partitions_with(histograms), move |partition| {
                Self::collect_partition(store, partition, now, windows)
            })
            .await;

        let parts: Vec<&PartitionThroughput> = fan_out.results.values().collect();

        let daily = merge_buckets(parts.iter().map(|p| p.daily.as_slice()));
        let hourly = merge_buckets(parts.iter().map(|p| p.hourly.as_slice()));
        let minute = merge_buckets(parts.iter().map(|p| p.minute.as_slice()));
        let throughput = merge_buckets(parts.iter().map(|p| p.throughput.as_slice()));
        let durations = parts
            .iter()
            .fold(DurationSummary::default(), |acc, p| acc.merge(p.durations));

        let report = ThroughputReport {
            node_performance: NodePerformance {
                daily: daily_points(&daily, windows.daily_limit),
                hourly: hourly_points(&hourly),
                minute: minute_points(&minute, windows.minute_bucket_seconds),
            },
            performance_stats: PerformanceStats {
                avg_processing_time: average_processing_time(durations),
                success_rate: success_rate(histograms.values().map(Vec::as_slice)),
                throughput: throughput_points(&throughput, windows.throughput_bucket_seconds),
            },
        };

        Aggregated {
            value: report,
            coverage: fan_out.coverage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue_stats::QueueStatusAggregator;
    use crate::registry::PartitionRegistry;
    use chrono::{Duration, TimeZone};
    use monitor_testing_utils::{task, work_items, MockPartitionStore, WorkItemBuilder};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, m, 0).unwrap()
    }

    fn context(now: DateTime<Utc>, ids: &[&str]) -> PollContext {
        let tasks = ids.iter().map(|id| task(id, "running", now)).collect();
        let resolved = PartitionRegistry::resolve_tasks(tasks);
        PollContext::new(now, resolved.targets, PollWindows::default(), 4)
    }

    async fn aggregate(
        store: MockPartitionStore,
        ctx: &PollContext,
    ) -> Aggregated<ThroughputReport> {
        let store: Arc<dyn PartitionStore> = Arc::new(store);
        let histograms = QueueStatusAggregator::new(store.clone()).collect(ctx).await;
        ThroughputAggregator::new(store)
            .aggregate(ctx, &histograms.value)
            .await
    }

    #[test]
    fn test_merge_buckets_groups_by_key() {
        // 两个分区在同一个30分钟桶内各完成若干个，合并后只有一个桶
        let p1 = vec![BucketCount { bucket: 100, count: 3 }];
        let p2 = vec![
            BucketCount { bucket: 100, count: 4 },
            BucketCount { bucket: 101, count: 1 },
        ];
        let merged = merge_buckets([p1.as_slice(), p2.as_slice()]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[&100], 7);
        assert_eq!(merged[&101], 1);
    }

    #[test]
    fn test_merge_drops_zero_buckets() {
        let p1 = vec![BucketCount { bucket: 5, count: 0 }];
        assert!(merge_buckets([p1.as_slice()]).is_empty());
    }

    #[test]
    fn test_throughput_labels() {
        let mut merged = BTreeMap::new();
        merged.insert(at(10, 30).timestamp() / 1800, 7);
        let points = throughput_points(&merged, 1800);
        assert_eq!(points[0].time_slot, "2024-03-01 10:30:00");
        assert_eq!(points[0].total_count, 7);
    }

    #[test]
    fn test_daily_points_newest_first_and_limited() {
        let mut merged = BTreeMap::new();
        for day in 0..9 {
            merged.insert(at(0, 0).timestamp() / DAY_SECONDS + day, day + 1);
        }
        let points = daily_points(&merged, 7);
        assert_eq!(points.len(), 7);
        assert_eq!(points[0].date, "03-09");
        assert_eq!(points[0].completed_tasks, 9);
        assert_eq!(points[6].date, "03-03");
    }

    #[test]
    fn test_success_rate_and_average() {
        let histogram = vec![
            StatusCount::new("completed", 3),
            StatusCount::new("failed", 1),
            StatusCount::new("pending", 2),
        ];
        assert_eq!(success_rate([histogram.as_slice()]), 50.0);
        assert_eq!(success_rate(std::iter::empty::<&[StatusCount]>()), 0.0);

        let summary = DurationSummary {
            total_minutes: 10,
            samples: 3,
        };
        assert_eq!(average_processing_time(summary), 3.3);
        assert_eq!(average_processing_time(DurationSummary::default()), 0.0);
    }

    #[tokio::test]
    async fn test_aggregate_merges_same_slot_across_partitions() {
        let now = at(11, 0);
        let store = MockPartitionStore::new();
        store.insert_partition(
            "1",
            vec![
                WorkItemBuilder::new("a", now).completed(at(10, 35), 4).build(),
                WorkItemBuilder::new("b", now).completed(at(10, 40), 2).build(),
                WorkItemBuilder::new("c", now).completed(at(10, 50), 6).build(),
            ],
        );
        store.insert_partition(
            "2",
            vec![
                WorkItemBuilder::new("d", now).completed(at(10, 31), 3).build(),
                WorkItemBuilder::new("e", now).completed(at(10, 59), 1).build(),
                WorkItemBuilder::new("f", now).completed(at(10, 45), 5).build(),
                WorkItemBuilder::new("g", now).completed(at(10, 32), 9).build(),
            ],
        );
        store.add_items("2", work_items("h", "failed", 1, now));

        let result = aggregate(store, &context(now, &["1", "2"])).await;
        let stats = &result.value.performance_stats;

        assert_eq!(stats.throughput.len(), 1);
        assert_eq!(stats.throughput[0].time_slot, "2024-03-01 10:30:00");
        assert_eq!(stats.throughput[0].total_count, 7);

        // 7个完成 / 8个工作项
        assert_eq!(stats.success_rate, 87.5);
        // (4+2+6+3+1+5+9)/7 = 4.28...
        assert_eq!(stats.avg_processing_time, 4.3);

        let perf = &result.value.node_performance;
        assert_eq!(perf.hourly.len(), 1);
        assert_eq!(perf.hourly[0].hour, "10:00");
        assert_eq!(perf.hourly[0].completed_tasks, 7);
        assert_eq!(perf.daily[0].date, "03-01");
        assert_eq!(perf.daily[0].completed_tasks, 7);

        let minutes: Vec<(&str, i64)> = perf
            .minute
            .iter()
            .map(|p| (p.minute.as_str(), p.completed_tasks))
            .collect();
        assert_eq!(
            minutes,
            vec![
                ("10:30", 2),
                ("10:35", 1),
                ("10:40", 1),
                ("10:45", 1),
                ("10:50", 1),
                ("10:55", 1)
            ]
        );
    }

    #[tokio::test]
    async fn test_completions_outside_window_excluded() {
        let now = at(11, 0);
        let store = MockPartitionStore::new();
        store.insert_partition(
            "1",
            vec![WorkItemBuilder::new("old", now)
                .completed(now - Duration::days(2), 10)
                .build()],
        );

        let result = aggregate(store, &context(now, &["1"])).await;

        assert!(result.value.performance_stats.throughput.is_empty());
        assert!(result.value.node_performance.hourly.is_empty());
        assert_eq!(result.value.node_performance.daily.len(), 1);
        assert_eq!(result.value.performance_stats.success_rate, 100.0);
    }
}
