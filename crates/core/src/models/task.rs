use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 任务目录中的一条记录
///
/// `status` 是外部写入的粗粒度标签，这里不做解释，原样透传给看板。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new<S: Into<String>>(
        id: S,
        status: Option<&str>,
        created_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: id.into(),
            status: status.map(str::to_string),
            created_at,
        }
    }
}
