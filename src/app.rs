use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use monitor_aggregator::{SnapshotAssembler, SnapshotService};
use monitor_api::{create_app, AppState};
use monitor_core::AppConfig;
use monitor_infrastructure::{DatabaseManager, MetricsCollector};
use tokio::{net::TcpListener, sync::broadcast};
use tracing::info;

/// 主应用程序
pub struct Application {
    config: AppConfig,
    database: Arc<DatabaseManager>,
    snapshots: Arc<SnapshotService>,
    prometheus: Option<PrometheusHandle>,
}

impl Application {
    /// 创建新的应用实例
    pub async fn new(config: AppConfig) -> Result<Self> {
        info!("连接数据库: {}", mask_database_url(&config.database.url));
        let database = Arc::new(
            DatabaseManager::new(&config.database)
                .await
                .context("连接数据库失败")?,
        );

        // recorder 必须先于指标句柄创建
        let prometheus = if config.observability.metrics_enabled {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .context("安装Prometheus指标导出器失败")?;
            Some(handle)
        } else {
            None
        };
        let metrics = Arc::new(MetricsCollector::new());

        let assembler = SnapshotAssembler::new(
            database.task_directory(),
            database.partition_store(),
            database.heartbeat_store(),
            &config.monitor,
        );
        let snapshots = Arc::new(
            SnapshotService::new(
                assembler,
                Duration::from_secs(config.monitor.poll_deadline_seconds),
            )
            .with_metrics(metrics),
        );

        Ok(Self {
            config,
            database,
            snapshots,
            prometheus,
        })
    }

    pub fn router(&self) -> axum::Router {
        let state = AppState {
            snapshots: Arc::clone(&self.snapshots),
            health: self.database.clone(),
            prometheus: self.prometheus.clone(),
            client_poll_interval_seconds: self.config.monitor.client_poll_interval_seconds,
            metrics_endpoint: self.config.observability.metrics_endpoint.clone(),
        };
        create_app(state, &self.config.api)
    }

    /// 运行HTTP服务直到收到关闭信号
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let listener = TcpListener::bind(&self.config.api.bind_address)
            .await
            .with_context(|| format!("绑定地址失败: {}", self.config.api.bind_address))?;
        self.serve(listener, async move {
            let _ = shutdown_rx.recv().await;
        })
        .await
    }

    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr().context("读取监听地址失败")?;
        info!("监控服务启动在 http://{}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP服务运行失败")?;

        info!("HTTP服务已停止");
        self.database.close().await;
        Ok(())
    }
}

/// 屏蔽数据库URL中的密码
fn mask_database_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            if url[colon_pos + 1..at_pos].contains('/') {
                return url.to_string();
            }
            let mut masked = url.to_string();
            masked.replace_range(colon_pos + 1..at_pos, "***");
            return masked;
        }
    }
    url.to_string()
}
