use axum::{extract::State, http::header, response::IntoResponse};

use crate::{
    error::{ApiError, ApiResult},
    routes::AppState,
};

/// Prometheus 文本格式的指标导出
pub async fn prometheus_metrics(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let handle = state.prometheus.as_ref().ok_or(ApiError::NotFound)?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    ))
}
