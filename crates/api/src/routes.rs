use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use monitor_aggregator::SnapshotService;
use monitor_core::traits::HealthProbe;
use std::sync::Arc;

use crate::handlers::{
    dashboard::dashboard, health::health_check, metrics::prometheus_metrics,
    monitor::get_monitor_data,
};

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub snapshots: Arc<SnapshotService>,
    pub health: Arc<dyn HealthProbe>,
    /// 未启用指标导出时为 None
    pub prometheus: Option<PrometheusHandle>,
    pub client_poll_interval_seconds: u64,
    pub metrics_endpoint: String,
}

/// 创建API路由
pub fn create_routes(state: AppState) -> Router {
    let metrics_endpoint = state.metrics_endpoint.clone();

    Router::new()
        // 看板页面，首屏数据内嵌
        .route("/", get(dashboard))
        // 轮询数据接口
        .route("/monitor-data", get(get_monitor_data))
        .route("/get_monitor_data", get(get_monitor_data))
        .route("/health", get(health_check))
        .route(&metrics_endpoint, get(prometheus_metrics))
        .with_state(state)
}
