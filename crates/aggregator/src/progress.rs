use chrono::{DateTime, Utc};
use monitor_core::{
    models::{StatusCount, WorkItemStatus},
    traits::PartitionStore,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::context::PollContext;
use crate::fan_out::Aggregated;
use crate::queue_stats::StatusHistograms;
use crate::round_to;

/// 单个任务的进度
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskProgress {
    pub id: String,
    pub status: Option<String>,
    /// 完成百分比，保留两位小数
    pub progress: f64,
    pub total: i64,
    pub completed: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub estimated_time: Option<String>,
}

/// 进度与剩余时间估算
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEstimate {
    pub progress: f64,
    /// 每分钟完成数
    pub rate_per_minute: f64,
    pub remaining: i64,
    pub eta_minutes: Option<i64>,
}

/// 根据总数、完成数和最近窗口内的完成数估算进度
///
/// 速率为 0 时没有剩余时间估算。
pub fn estimate_progress(
    total: i64,
    completed: i64,
    recent_completed: i64,
    rate_window_minutes: f64,
) -> ProgressEstimate {
    let progress = if total > 0 {
        round_to(completed as f64 / total as f64 * 100.0, 2).clamp(0.0, 100.0)
    } else {
        0.0
    };

    let rate_per_minute = if rate_window_minutes > 0.0 {
        recent_completed.max(0) as f64 / rate_window_minutes
    } else {
        0.0
    };

    let remaining = (total - completed).max(0);
    let eta_minutes = if rate_per_minute > 0.0 {
        Some((remaining as f64 / rate_per_minute).ceil() as i64)
    } else {
        None
    };

    ProgressEstimate {
        progress,
        rate_per_minute,
        remaining,
        eta_minutes,
    }
}

/// 格式化剩余时间，例如 `2小时5分钟`、`45分钟`
///
/// 没有估算或剩余为 0 时返回 None。
pub fn format_estimated_time(minutes: Option<i64>) -> Option<String> {
    let minutes = minutes.filter(|m| *m > 0)?;
    let hours = minutes / 60;
    let rest = minutes % 60;

    let mut parts = String::new();
    if hours > 0 {
        parts.push_str(&format!("{hours}小时"));
    }
    if rest > 0 {
        parts.push_str(&format!("{rest}分钟"));
    }
    Some(parts)
}

/// 分区的总数与完成数
fn totals(histogram: &[StatusCount]) -> (i64, i64) {
    let total = histogram.iter().map(|row| row.count).sum();
    let completed = histogram
        .iter()
        .filter(|row| row.work_item_status() == Some(WorkItemStatus::Completed))
        .map(|row| row.count)
        .sum();
    (total, completed)
}

/// 任务进度估算器
pub struct ProgressEstimator {
    store: Arc<dyn PartitionStore>,
}

impl ProgressEstimator {
    pub fn new(store: Arc<dyn PartitionStore>) -> Self {
        Self { store }
    }

    /// 计算每个任务的进度，输出顺序与任务目录一致（最新在前）
    ///
    /// 总数和完成数取自本轮已查询的状态分布，这里只补充最近窗口的完成数。
    /// 分区缺失或查询失败的任务不出现在结果中。
    pub async fn estimate(
        &self,
        ctx: &PollContext,
        histograms: &StatusHistograms,
    ) -> Aggregated<Vec<TaskProgress>> {
        let store = &self.store;
        let since = ctx.now - ctx.windows.rate_window;

        let mut recent = ctx
            .fan_out_to(ctx.partitions_with(histograms), move |partition| async move {
                store.completed_since(&partition, since).await
            })
            .await;

        let rate_window_minutes = ctx.windows.rate_window_minutes();
        let progress = ctx
            .targets
            .iter()
            .filter_map(|target| {
                let histogram = histograms.get(&target.partition)?;
                let recent = recent.results.remove(&target.partition)?;
                let (total, completed) = totals(histogram);
                let estimate = estimate_progress(total, completed, recent, rate_window_minutes);
                Some(TaskProgress {
                    id: target.task.id.clone(),
                    status: target.task.status.clone(),
                    progress: estimate.progress,
                    total,
                    completed,
                    created_at: target.task.created_at,
                    estimated_time: format_estimated_time(estimate.eta_minutes),
                })
            })
            .collect();

        Aggregated {
            value: progress,
            coverage: recent.coverage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PollWindows;
    use crate::queue_stats::QueueStatusAggregator;
    use crate::registry::PartitionRegistry;
    use chrono::Duration;
    use monitor_testing_utils::{task, work_items, MockPartitionStore, WorkItemBuilder};

    #[test]
    fn test_estimate_with_recent_activity() {
        // 200个工作项，已完成150，最近5分钟完成10 -> 每分钟2个，剩余50 -> 25分钟
        let estimate = estimate_progress(200, 150, 10, 5.0);
        assert_eq!(estimate.progress, 75.0);
        assert_eq!(estimate.rate_per_minute, 2.0);
        assert_eq!(estimate.remaining, 50);
        assert_eq!(estimate.eta_minutes, Some(25));
        assert_eq!(
            format_estimated_time(estimate.eta_minutes).as_deref(),
            Some("25分钟")
        );
    }

    #[test]
    fn test_estimate_without_recent_activity() {
        let estimate = estimate_progress(200, 150, 0, 5.0);
        assert_eq!(estimate.progress, 75.0);
        assert_eq!(estimate.eta_minutes, None);
        assert_eq!(format_estimated_time(estimate.eta_minutes), None);
    }

    #[test]
    fn test_estimate_empty_partition() {
        let estimate = estimate_progress(0, 0, 0, 5.0);
        assert_eq!(estimate.progress, 0.0);
        assert_eq!(estimate.remaining, 0);
        assert_eq!(estimate.eta_minutes, None);
    }

    #[test]
    fn test_eta_rounds_up() {
        // 剩余7个，每分钟0.6个 -> 11.67 -> 12分钟
        let estimate = estimate_progress(10, 3, 3, 5.0);
        assert_eq!(estimate.eta_minutes, Some(12));
    }

    #[test]
    fn test_progress_rounding_and_bounds() {
        assert_eq!(estimate_progress(3, 1, 0, 5.0).progress, 33.33);
        assert_eq!(estimate_progress(3, 2, 0, 5.0).progress, 66.67);
        assert_eq!(estimate_progress(5, 5, 1, 5.0).progress, 100.0);
        assert_eq!(estimate_progress(5, 5, 1, 5.0).eta_minutes, Some(0));
    }

    #[test]
    fn test_format_estimated_time() {
        assert_eq!(format_estimated_time(Some(125)).as_deref(), Some("2小时5分钟"));
        assert_eq!(format_estimated_time(Some(120)).as_deref(), Some("2小时"));
        assert_eq!(format_estimated_time(Some(45)).as_deref(), Some("45分钟"));
        assert_eq!(format_estimated_time(Some(0)), None);
        assert_eq!(format_estimated_time(None), None);
    }

    #[tokio::test]
    async fn test_estimator_orders_newest_first_and_skips_missing() {
        let now = Utc::now();
        let store = MockPartitionStore::new();

        let mut items = work_items("old", "completed", 1, now - Duration::hours(1));
        items.extend(work_items("wait", "pending", 1, now));
        store.insert_partition("10", items);

        let mut items = vec![
            WorkItemBuilder::new("r1", now)
                .completed(now - Duration::minutes(1), 3)
                .build(),
            WorkItemBuilder::new("r2", now)
                .completed(now - Duration::minutes(2), 3)
                .build(),
        ];
        items.extend(work_items("todo", "pending", 2, now));
        store.insert_partition("11", items);

        let resolved = PartitionRegistry::resolve_tasks(vec![
            task("12", "running", now),
            task("11", "running", now - Duration::hours(1)),
            task("10", "running", now - Duration::hours(3)),
        ]);
        let ctx = PollContext::new(now, resolved.targets, PollWindows::default(), 4);

        let store: Arc<dyn PartitionStore> = Arc::new(store);
        let histograms = QueueStatusAggregator::new(store.clone()).collect(&ctx).await;
        let estimator = ProgressEstimator::new(store);
        let result = estimator.estimate(&ctx, &histograms.value).await;

        let ids: Vec<&str> = result.value.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["11", "10"]);

        let newest = &result.value[0];
        assert_eq!(newest.total, 4);
        assert_eq!(newest.completed, 2);
        assert_eq!(newest.progress, 50.0);
        // 5分钟内完成2个 -> 每分钟0.4个，剩余2个 -> 5分钟
        assert_eq!(newest.estimated_time.as_deref(), Some("5分钟"));

        let oldest = &result.value[1];
        assert_eq!(oldest.progress, 50.0);
        assert_eq!(oldest.estimated_time, None);

        assert!(histograms
            .coverage
            .missing
            .iter()
            .any(|p| p.task_id() == "12"));
    }
}
