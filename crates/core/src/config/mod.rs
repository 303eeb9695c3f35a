//! 监控服务配置
//!
//! 配置按 默认值 → TOML 文件 → `MONITOR_` 环境变量 的顺序叠加，加载后统一校验。

pub mod models;

pub use models::*;
