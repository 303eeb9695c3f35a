use monitor_core::{models::PartitionId, models::Task, traits::TaskDirectory, MonitorResult};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::context::TaskPartition;

/// 分区注册表
///
/// 每次轮询重新读取任务目录，不缓存分区列表，新提交的任务下一轮即可见。
pub struct PartitionRegistry {
    directory: Arc<dyn TaskDirectory>,
}

/// 任务目录解析结果
#[derive(Debug, Clone, Default)]
pub struct ResolvedPartitions {
    /// 目录中的全部任务，最新在前
    pub tasks: Vec<Task>,
    /// 可查询的分区，顺序与 `tasks` 一致
    pub targets: Vec<TaskPartition>,
    /// 无法映射为分区名的任务标识
    pub rejected: Vec<String>,
}

impl PartitionRegistry {
    pub fn new(directory: Arc<dyn TaskDirectory>) -> Self {
        Self { directory }
    }

    /// 读取任务目录，目录不可用时返回错误
    pub async fn list_tasks(&self) -> MonitorResult<Vec<Task>> {
        self.directory.list_tasks().await
    }

    /// 读取任务目录并解析分区
    pub async fn resolve(&self) -> MonitorResult<ResolvedPartitions> {
        let tasks = self.list_tasks().await?;
        Ok(Self::resolve_tasks(tasks))
    }

    /// 将任务映射为分区，非法的任务标识跳过并记录
    pub fn resolve_tasks(tasks: Vec<Task>) -> ResolvedPartitions {
        let mut targets = Vec::with_capacity(tasks.len());
        let mut rejected = Vec::new();

        for task in &tasks {
            match PartitionId::new(&task.id) {
                Ok(partition) => targets.push(TaskPartition {
                    task: task.clone(),
                    partition,
                }),
                Err(e) => {
                    warn!("跳过无法映射分区的任务: {}", e);
                    rejected.push(task.id.clone());
                }
            }
        }

        debug!("解析分区: {} 个有效, {} 个跳过", targets.len(), rejected.len());
        ResolvedPartitions {
            tasks,
            targets,
            rejected,
        }
    }
}
