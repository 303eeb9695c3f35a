pub mod config;
pub mod errors;
pub mod models;
pub mod traits;

pub use config::{ApiConfig, AppConfig, DatabaseConfig, MonitorConfig, ObservabilityConfig};
pub use errors::*;
pub use models::*;
pub use traits::*;
