use serde::{Deserialize, Serialize};

/// 工作项状态
///
/// 工作项只会在这四个状态之间流转，其他取值视为未知状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkItemStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl WorkItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkItemStatus::Pending => "pending",
            WorkItemStatus::Processing => "processing",
            WorkItemStatus::Completed => "completed",
            WorkItemStatus::Failed => "failed",
        }
    }

    /// 解析数据库中的状态字符串，未知状态返回 None
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(WorkItemStatus::Pending),
            "processing" => Some(WorkItemStatus::Processing),
            "completed" => Some(WorkItemStatus::Completed),
            "failed" => Some(WorkItemStatus::Failed),
            _ => None,
        }
    }
}

/// 单个分区按状态分组的计数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: Option<String>,
    pub count: i64,
}

impl StatusCount {
    pub fn new(status: &str, count: i64) -> Self {
        Self {
            status: Some(status.to_string()),
            count,
        }
    }

    pub fn work_item_status(&self) -> Option<WorkItemStatus> {
        self.status.as_deref().and_then(WorkItemStatus::parse)
    }
}

/// 时间桶计数，`bucket` 为 floor(epoch_seconds / width_seconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCount {
    pub bucket: i64,
    pub count: i64,
}

/// 已完成工作项的处理耗时汇总（只统计耗时为正的整分钟）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationSummary {
    pub total_minutes: i64,
    pub samples: i64,
}

impl DurationSummary {
    pub fn merge(self, other: DurationSummary) -> Self {
        Self {
            total_minutes: self.total_minutes + other.total_minutes,
            samples: self.samples + other.samples,
        }
    }
}
