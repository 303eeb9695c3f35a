use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 节点心跳记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatRecord {
    pub client_addr: String,
    pub cpu_usage: f64,
    pub last_heartbeat: DateTime<Utc>,
}

impl HeartbeatRecord {
    pub fn new<S: Into<String>>(
        client_addr: S,
        cpu_usage: f64,
        last_heartbeat: DateTime<Utc>,
    ) -> Self {
        Self {
            client_addr: client_addr.into(),
            cpu_usage,
            last_heartbeat,
        }
    }
}

/// 心跳流的节点汇总
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatSummary {
    /// 历史上出现过的不同节点数
    pub total_nodes: i64,
    /// 新鲜窗口内有心跳的不同节点数
    pub online_nodes: i64,
    /// 新鲜窗口内心跳的平均CPU使用率，没有心跳时为 None
    pub avg_cpu_usage: Option<f64>,
}
