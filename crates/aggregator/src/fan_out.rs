use futures::stream::{self, StreamExt};
use monitor_core::{models::PartitionId, MonitorError, MonitorResult};
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// 分区覆盖情况
///
/// `missing` 为已不存在的分区（零贡献，不影响完整性），
/// `failed` 为查询失败的分区（快照标记为部分结果）。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionCoverage {
    pub missing: BTreeSet<PartitionId>,
    pub failed: BTreeSet<PartitionId>,
}

impl PartitionCoverage {
    pub fn merge(&mut self, other: PartitionCoverage) {
        self.missing.extend(other.missing);
        self.failed.extend(other.failed);
    }

    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }

    /// 分区是否在本轮有缺失或失败
    pub fn excludes(&self, partition: &PartitionId) -> bool {
        self.missing.contains(partition) || self.failed.contains(partition)
    }
}

/// 扇出查询结果
#[derive(Debug)]
pub struct FanOut<T> {
    pub results: HashMap<PartitionId, T>,
    pub coverage: PartitionCoverage,
}

/// 聚合值及其分区覆盖情况
#[derive(Debug, Clone)]
pub struct Aggregated<T> {
    pub value: T,
    pub coverage: PartitionCoverage,
}

/// 有界并发地对每个分区执行查询
///
/// 单个分区的失败只影响该分区：缺表归入 `missing`，其他错误归入 `failed`。
pub async fn fan_out<T, F, Fut>(
    partitions: Vec<PartitionId>,
    permits: &Semaphore,
    max_in_flight: usize,
    op: F,
) -> FanOut<T>
where
    F: Fn(PartitionId) -> Fut,
    Fut: Future<Output = MonitorResult<T>>,
{
    let total = partitions.len();
    let op = &op;

    let outcomes: Vec<(PartitionId, MonitorResult<T>)> = stream::iter(partitions)
        .map(|partition| async move {
            let result = match permits.acquire().await {
                Ok(_permit) => op(partition.clone()).await,
                Err(_) => Err(MonitorError::internal("查询许可已关闭")),
            };
            (partition, result)
        })
        .buffer_unordered(max_in_flight.max(1))
        .collect()
        .await;

    let mut fan_out = FanOut {
        results: HashMap::with_capacity(total),
        coverage: PartitionCoverage::default(),
    };

    for (partition, result) in outcomes {
        match result {
            Ok(value) => {
                fan_out.results.insert(partition, value);
            }
            Err(MonitorError::PartitionNotFound { .. }) => {
                warn!("分区不存在，按零贡献处理: {}", partition.table_name());
                fan_out.coverage.missing.insert(partition);
            }
            Err(e) => {
                warn!("分区查询失败: {} - {}", partition.table_name(), e);
                fan_out.coverage.failed.insert(partition);
            }
        }
    }

    debug!(
        "分区扇出完成: {} 成功, {} 缺失, {} 失败",
        fan_out.results.len(),
        fan_out.coverage.missing.len(),
        fan_out.coverage.failed.len()
    );
    fan_out
}
