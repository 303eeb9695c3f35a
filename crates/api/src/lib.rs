//! # Monitor API
//!
//! 集群监控看板的HTTP服务，基于Axum构建。
//!
//! ## API 端点
//!
//! - `GET /` - 看板页面，首屏快照内嵌在页面中，之后按固定间隔轮询
//! - `GET /monitor-data` - 监控快照JSON（`/get_monitor_data` 为兼容旧页面的别名）
//! - `GET /health` - 健康检查，包含数据库连通性
//! - `GET /metrics` - Prometheus指标（路径可配置）
//!
//! 快照每次请求都重新计算。计算失败时返回上一次成功的快照并标记为 `stale`，
//! 没有历史快照时返回 503。

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;

use axum::Router;
use monitor_core::ApiConfig;
use tower::ServiceBuilder;

use middleware::{cors_layer, request_logging, timeout_layer, trace_layer};
pub use routes::{create_routes, AppState};

/// 创建完整的API应用
pub fn create_app(state: AppState, api_config: &ApiConfig) -> Router {
    let mut router = create_routes(state);
    if api_config.cors_enabled {
        router = router.layer(cors_layer());
    }

    router.layer(
        ServiceBuilder::new()
            .layer(trace_layer())
            .layer(timeout_layer(api_config.request_timeout_seconds))
            .layer(axum::middleware::from_fn(request_logging)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use chrono::{Duration, Utc};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use monitor_aggregator::{SnapshotAssembler, SnapshotService};
    use monitor_core::MonitorConfig;
    use monitor_testing_utils::{
        heartbeat, task, work_items, MockHealthProbe, MockHeartbeatStore, MockPartitionStore,
        MockTaskDirectory,
    };
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct TestApp {
        directory: MockTaskDirectory,
        health: MockHealthProbe,
        router: Router,
    }

    fn test_app(with_metrics: bool) -> TestApp {
        let now = Utc::now();
        let directory =
            MockTaskDirectory::with_tasks(vec![task("7", "running", now - Duration::hours(1))]);
        let partitions = MockPartitionStore::new();
        let mut items = work_items("done", "completed", 3, now - Duration::minutes(30));
        items.extend(work_items("todo", "pending", 1, now));
        partitions.insert_partition("7", items);
        let heartbeats =
            MockHeartbeatStore::with_records(vec![heartbeat("10.0.0.1", 42.0, now)]);
        let health = MockHealthProbe::new();

        let assembler = SnapshotAssembler::new(
            Arc::new(directory.clone()),
            Arc::new(partitions),
            Arc::new(heartbeats),
            &MonitorConfig::default(),
        );
        let prometheus = with_metrics.then(|| PrometheusBuilder::new().build_recorder().handle());
        let state = AppState {
            snapshots: Arc::new(SnapshotService::new(
                assembler,
                std::time::Duration::from_secs(5),
            )),
            health: Arc::new(health.clone()),
            prometheus,
            client_poll_interval_seconds: 10,
            metrics_endpoint: "/metrics".to_string(),
        };

        TestApp {
            directory,
            health,
            router: create_app(state, &ApiConfig::default()),
        }
    }

    async fn get(router: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_monitor_data_endpoint() {
        let app = test_app(false);
        let (status, body) = get(&app.router, "/monitor-data").await;
        assert_eq!(status, StatusCode::OK);

        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["tasksProgress"][0]["id"], "7");
        assert_eq!(json["tasksProgress"][0]["progress"], 75.0);
        assert_eq!(json["queueStats"]["completed"], 3);
        assert_eq!(json["nodeStats"]["online"], 1);
        assert_eq!(json["meta"]["state"], "complete");
    }

    #[tokio::test]
    async fn test_legacy_alias() {
        let app = test_app(false);
        let (status, _) = get(&app.router, "/get_monitor_data").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stale_then_unavailable() {
        let app = test_app(false);
        assert_eq!(get(&app.router, "/monitor-data").await.0, StatusCode::OK);

        app.directory.set_unavailable(true);
        let (status, body) = get(&app.router, "/monitor-data").await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["meta"]["state"], "stale");
        assert_eq!(json["meta"]["error"], "任务目录暂时不可用");
    }

    #[tokio::test]
    async fn test_unavailable_without_history() {
        let app = test_app(false);
        app.directory.set_unavailable(true);

        let (status, body) = get(&app.router, "/monitor-data").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["type"], "SNAPSHOT_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_dashboard_embeds_snapshot() {
        let app = test_app(false);
        let (status, body) = get(&app.router, "/").await;
        assert_eq!(status, StatusCode::OK);

        let html = String::from_utf8(body).unwrap();
        assert!(html.contains("\"tasksProgress\""));
        assert!(html.contains("const POLL_INTERVAL_MS = 10000;"));
        assert!(!html.contains("{{SNAPSHOT_JSON}}"));
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = test_app(false);
        let (status, body) = get(&app.router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");

        app.health.set_unhealthy(true);
        let (status, body) = get(&app.router, "/health").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["database"], "unavailable");
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let app = test_app(true);
        let (status, _) = get(&app.router, "/metrics").await;
        assert_eq!(status, StatusCode::OK);

        let disabled = test_app(false);
        let (status, _) = get(&disabled.router, "/metrics").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = test_app(false);
        let (status, _) = get(&app.router, "/api/tasks").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
