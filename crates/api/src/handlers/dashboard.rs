use axum::{extract::State, response::Html};
use monitor_aggregator::MonitorSnapshot;

use crate::{
    error::{ApiError, ApiResult},
    routes::AppState,
};

const DASHBOARD_TEMPLATE: &str = include_str!("../../templates/dashboard.html");

/// 渲染看板页面，首屏快照以 JSON 内嵌，之后由页面脚本轮询 `/monitor-data`
pub fn render_dashboard(
    snapshot: &MonitorSnapshot,
    poll_interval_seconds: u64,
) -> ApiResult<String> {
    // 内嵌在 <script> 中，不能出现结束标签
    let snapshot_json = serde_json::to_string(snapshot)?.replace("</", "<\\/");
    let poll_interval_ms = poll_interval_seconds.saturating_mul(1000);

    Ok(DASHBOARD_TEMPLATE
        .replace("{{SNAPSHOT_JSON}}", &snapshot_json)
        .replace("{{POLL_INTERVAL_MS}}", &poll_interval_ms.to_string()))
}

pub async fn dashboard(State(state): State<AppState>) -> ApiResult<Html<String>> {
    let snapshot = state
        .snapshots
        .poll()
        .await
        .into_result()
        .map_err(ApiError::SnapshotUnavailable)?;

    render_dashboard(&snapshot, state.client_poll_interval_seconds).map(Html)
}
