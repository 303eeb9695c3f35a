use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use monitor_core::MonitorError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("监控快照不可用: {0}")]
    SnapshotUnavailable(String),

    #[error("监控错误: {0}")]
    Monitor(#[from] MonitorError),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("内部服务器错误: {0}")]
    Internal(String),

    #[error("未找到资源")]
    NotFound,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, error_type, suggestions) = match &self {
            ApiError::SnapshotUnavailable(reason) => (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("监控快照暂时不可用: {}", reason),
                "SNAPSHOT_UNAVAILABLE".to_string(),
                vec![
                    "监控数据源暂时无法访问，请稍后重试".to_string(),
                    "查看 GET /health 检查数据库连接状态".to_string(),
                ],
            ),
            ApiError::Monitor(err) if err.is_dependency_failure() => (
                StatusCode::SERVICE_UNAVAILABLE,
                err.user_message(),
                "DEPENDENCY_UNAVAILABLE".to_string(),
                vec![
                    "上游数据源暂时不可用，请稍后重试".to_string(),
                    "查看 GET /health 检查系统状态".to_string(),
                ],
            ),
            ApiError::Monitor(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                err.user_message(),
                "MONITOR_ERROR".to_string(),
                vec![
                    "系统遇到内部错误，请稍后重试".to_string(),
                    "如果问题持续存在，请联系系统管理员".to_string(),
                ],
            ),
            ApiError::Serialization(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "响应数据序列化失败".to_string(),
                "SERIALIZATION_ERROR".to_string(),
                vec![format!("详细错误: {}", err)],
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "系统内部错误".to_string(),
                "INTERNAL_ERROR".to_string(),
                vec![
                    "系统遇到内部错误，请稍后重试".to_string(),
                    format!("错误详情: {}", msg),
                ],
            ),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                "请求的资源不存在".to_string(),
                "NOT_FOUND".to_string(),
                vec![
                    "请检查请求URL是否正确".to_string(),
                    "监控数据接口为 GET /monitor-data".to_string(),
                ],
            ),
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "type": error_type,
                "code": status.as_u16(),
                "suggestions": suggestions,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
