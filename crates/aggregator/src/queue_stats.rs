use monitor_core::{
    models::{PartitionId, StatusCount, WorkItemStatus},
    traits::PartitionStore,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::context::PollContext;
use crate::fan_out::Aggregated;

/// 单轮轮询中各分区的状态分布
pub type StatusHistograms = HashMap<PartitionId, Vec<StatusCount>>;

/// 全集群工作项状态计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub pending: i64,
    pub processing: i64,
    pub completed: i64,
    pub failed: i64,
}

impl QueueStats {
    /// 累加一个分区的状态分布，未知状态忽略
    pub fn add_histogram(&mut self, histogram: &[StatusCount]) {
        for row in histogram {
            match row.work_item_status() {
                Some(WorkItemStatus::Pending) => self.pending += row.count,
                Some(WorkItemStatus::Processing) => self.processing += row.count,
                Some(WorkItemStatus::Completed) => self.completed += row.count,
                Some(WorkItemStatus::Failed) => self.failed += row.count,
                None => {}
            }
        }
    }

    pub fn from_histograms<'a, I>(histograms: I) -> Self
    where
        I: IntoIterator<Item = &'a Vec<StatusCount>>,
    {
        let mut stats = QueueStats::default();
        for histogram in histograms {
            stats.add_histogram(histogram);
        }
        stats
    }

    pub fn total(&self) -> i64 {
        self.pending + self.processing + self.completed + self.failed
    }
}

/// 队列状态聚合器
pub struct QueueStatusAggregator {
    store: Arc<dyn PartitionStore>,
}

impl QueueStatusAggregator {
    pub fn new(store: Arc<dyn PartitionStore>) -> Self {
        Self { store }
    }

    /// 每个分区查询一次状态分布
    ///
    /// 结果同时供进度估算和成功率使用，同一快照内的计数保持一致。
    pub async fn collect(&self, ctx: &PollContext) -> Aggregated<StatusHistograms> {
        let store = &self.store;
        let fan_out = ctx
            .fan_out(move |partition| async move { store.status_histogram(&partition).await })
            .await;

        Aggregated {
            value: fan_out.results,
            coverage: fan_out.coverage,
        }
    }
}
