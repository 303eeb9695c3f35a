use axum::{extract::State, http::header, response::IntoResponse, Json};
use tracing::debug;

use crate::{
    error::{ApiError, ApiResult},
    routes::AppState,
};

/// 返回最新的监控快照
///
/// 每次请求都重新计算；计算失败时返回上一次的快照（`meta.state = "stale"`），
/// 没有历史快照时返回 503。
pub async fn get_monitor_data(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let snapshot = state
        .snapshots
        .poll()
        .await
        .into_result()
        .map_err(ApiError::SnapshotUnavailable)?;

    debug!(
        "返回监控快照: {} 个任务, 状态 {:?}",
        snapshot.tasks_progress.len(),
        snapshot.meta.state
    );
    Ok(([(header::CACHE_CONTROL, "no-store")], Json(snapshot)))
}
