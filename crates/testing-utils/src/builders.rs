//! Test data builders for work items, tasks and heartbeats

use chrono::{DateTime, Duration, Utc};
use monitor_core::models::{HeartbeatRecord, Task};

/// 内存中的工作项记录，字段与 `task_<id>_ligands` 表一致
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub ligand_id: String,
    pub status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
}

/// Builder for creating test WorkItem records
pub struct WorkItemBuilder {
    item: WorkItem,
}

impl WorkItemBuilder {
    pub fn new(ligand_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            item: WorkItem {
                ligand_id: ligand_id.to_string(),
                status: Some("pending".to_string()),
                created_at: Some(now),
                last_updated: now,
            },
        }
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.item.status = Some(status.to_string());
        self
    }

    pub fn without_status(mut self) -> Self {
        self.item.status = None;
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.item.created_at = Some(at);
        self
    }

    pub fn updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.item.last_updated = at;
        self
    }

    /// 完成于 `at`，耗时 `minutes` 分钟
    pub fn completed(mut self, at: DateTime<Utc>, minutes: i64) -> Self {
        self.item.status = Some("completed".to_string());
        self.item.created_at = Some(at - Duration::minutes(minutes));
        self.item.last_updated = at;
        self
    }

    pub fn build(self) -> WorkItem {
        self.item
    }
}

/// 生成 `count` 个同状态的工作项，全部在 `at` 更新
pub fn work_items(prefix: &str, status: &str, count: usize, at: DateTime<Utc>) -> Vec<WorkItem> {
    (0..count)
        .map(|i| {
            WorkItemBuilder::new(&format!("{prefix}-{i}"), at)
                .with_status(status)
                .build()
        })
        .collect()
}

pub fn task(id: &str, status: &str, created_at: DateTime<Utc>) -> Task {
    Task::new(id, Some(status), Some(created_at))
}

pub fn heartbeat(addr: &str, cpu_usage: f64, at: DateTime<Utc>) -> HeartbeatRecord {
    HeartbeatRecord::new(addr, cpu_usage, at)
}
