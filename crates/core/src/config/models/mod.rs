pub mod api_observability;
pub mod app_config;
pub mod database;
pub mod monitor;

pub use api_observability::{ApiConfig, ObservabilityConfig, RESERVED_ROUTES};
pub use app_config::AppConfig;
pub use database::DatabaseConfig;
pub use monitor::MonitorConfig;
