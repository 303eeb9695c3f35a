//! # 数据模型
//!
//! 监控引擎读取的外部数据结构：任务目录、按任务分区的工作项、节点心跳。
//!
//! 这些数据由外部的提交流程和心跳上报流程写入，监控引擎只读。
//! 所有时间字段统一按 UTC 解释，使用 `DateTime<Utc>` 表示。
//!
//! ## 数据库映射
//!
//! ### tasks 表
//! - `id` - 任务标识（同时决定工作项分区名）
//! - `status` - 粗粒度任务状态
//! - `created_at` - 提交时间
//!
//! ### task_<id>_ligands 表（每个任务一个分区）
//! - `ligand_id` - 工作项标识
//! - `status` - pending / processing / completed / failed
//! - `created_at` / `last_updated` - 创建与最后更新时间
//!
//! ### node_heartbeats 表
//! - `client_addr` - 节点地址
//! - `cpu_usage` - CPU 使用率
//! - `last_heartbeat` - 心跳时间

pub mod heartbeat;
pub mod partition;
pub mod task;
pub mod work_item;

pub use heartbeat::*;
pub use partition::*;
pub use task::*;
pub use work_item::*;
