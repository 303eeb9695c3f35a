use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{MonitorError, MonitorResult};

const MAX_TASK_ID_LEN: usize = 64;

/// 工作项分区标识
///
/// 分区名由任务标识派生（`task_<id>_ligands`），会被拼接进 SQL，
/// 所以构造时只接受 `[A-Za-z0-9_-]`，长度 1..=64。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PartitionId(String);

impl PartitionId {
    pub fn new(task_id: &str) -> MonitorResult<Self> {
        if task_id.is_empty() {
            return Err(MonitorError::invalid_partition(task_id, "任务标识为空"));
        }
        if task_id.len() > MAX_TASK_ID_LEN {
            return Err(MonitorError::invalid_partition(
                task_id,
                format!("任务标识长度超过{MAX_TASK_ID_LEN}"),
            ));
        }
        if let Some(c) = task_id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        {
            return Err(MonitorError::invalid_partition(
                task_id,
                format!("包含非法字符 {c:?}"),
            ));
        }
        Ok(Self(task_id.to_string()))
    }

    pub fn task_id(&self) -> &str {
        &self.0
    }

    /// 分区表名（未加引号）
    pub fn table_name(&self) -> String {
        format!("task_{}_ligands", self.0)
    }

    /// 加双引号的表标识符，可直接拼接进 SQL
    pub fn quoted_table(&self) -> String {
        format!("\"{}\"", self.table_name())
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for PartitionId {
    type Error = MonitorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PartitionId::new(&value)
    }
}

impl From<PartitionId> for String {
    fn from(value: PartitionId) -> Self {
        value.0
    }
}
