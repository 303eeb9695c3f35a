use thiserror::Error;

/// 监控引擎错误类型定义
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("数据库操作错误: {0}")]
    DatabaseOperation(String),

    #[error("分区未找到: {task_id}")]
    PartitionNotFound { task_id: String },

    #[error("无效的分区标识: {task_id} - {reason}")]
    InvalidPartitionId { task_id: String, reason: String },

    #[error("任务目录不可用: {0}")]
    TaskDirectoryUnavailable(String),

    #[error("心跳数据不可用: {0}")]
    HeartbeatUnavailable(String),

    #[error("操作超时: {0}")]
    Timeout(String),

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("序列化错误: {0}")]
    Serialization(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl MonitorError {
    pub fn database_error<S: Into<String>>(msg: S) -> Self {
        Self::DatabaseOperation(msg.into())
    }

    pub fn partition_not_found<S: Into<String>>(task_id: S) -> Self {
        Self::PartitionNotFound {
            task_id: task_id.into(),
        }
    }

    pub fn invalid_partition<S: Into<String>, R: Into<String>>(task_id: S, reason: R) -> Self {
        Self::InvalidPartitionId {
            task_id: task_id.into(),
            reason: reason.into(),
        }
    }

    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// 下一个轮询周期重试是否可能成功
    pub fn is_retryable(&self) -> bool {
        match self {
            MonitorError::Database(sqlx::Error::PoolTimedOut)
            | MonitorError::Database(sqlx::Error::Io(_))
            | MonitorError::Database(sqlx::Error::PoolClosed) => true,
            MonitorError::DatabaseOperation(_)
            | MonitorError::TaskDirectoryUnavailable(_)
            | MonitorError::HeartbeatUnavailable(_)
            | MonitorError::Timeout(_) => true,
            MonitorError::PartitionNotFound { .. }
            | MonitorError::InvalidPartitionId { .. }
            | MonitorError::Configuration(_)
            | MonitorError::Serialization(_)
            | MonitorError::Internal(_)
            | MonitorError::Database(_) => false,
        }
    }

    /// 整个快照依赖的数据源失败（任务目录或心跳流）
    pub fn is_dependency_failure(&self) -> bool {
        matches!(
            self,
            MonitorError::TaskDirectoryUnavailable(_)
                | MonitorError::HeartbeatUnavailable(_)
                | MonitorError::Timeout(_)
        )
    }

    /// 面向看板用户的错误描述，不暴露内部细节
    pub fn user_message(&self) -> String {
        match self {
            MonitorError::Database(_) | MonitorError::DatabaseOperation(_) => {
                "监控数据库暂时不可用".to_string()
            }
            MonitorError::PartitionNotFound { task_id } => {
                format!("任务 {task_id} 的工作项分区不存在")
            }
            MonitorError::InvalidPartitionId { task_id, .. } => {
                format!("任务标识 {task_id} 无法映射到工作项分区")
            }
            MonitorError::TaskDirectoryUnavailable(_) => "任务目录暂时不可用".to_string(),
            MonitorError::HeartbeatUnavailable(_) => "节点心跳数据暂时不可用".to_string(),
            MonitorError::Timeout(_) => "监控快照计算超时".to_string(),
            MonitorError::Configuration(msg) => format!("配置错误: {msg}"),
            MonitorError::Serialization(_) | MonitorError::Internal(_) => {
                "监控服务内部错误".to_string()
            }
        }
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(err: serde_json::Error) -> Self {
        MonitorError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for MonitorError {
    fn from(err: anyhow::Error) -> Self {
        MonitorError::Internal(err.to_string())
    }
}

/// 统一的Result类型
pub type MonitorResult<T> = std::result::Result<T, MonitorError>;
