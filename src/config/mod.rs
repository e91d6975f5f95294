// ==========================================
// 船员轮换系统 - 配置层
// ==========================================
// 职责: 系统配置管理,缺省值兜底
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod rotation_config_trait;
pub mod settings;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use rotation_config_trait::RotationConfigReader;
pub use settings::{AggregationSettings, RotationSettings, WorkflowSettings};
