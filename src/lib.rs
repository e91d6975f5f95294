// ==========================================
// 船员轮换系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 决策支持系统 (人工选择待命/替班, 人工确认锁定)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 锁定持久化
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 适配层 - 外部载荷与文件
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 工作流
pub mod api;

// 应用层 - 资源组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{PersonId, SourceTag, WorkflowPhase};

// 领域实体
pub use domain::{
    CandidatePool, CandidateRecord, LockEntry, PlanRequest, PlanResult, RotationParams,
    ScheduleGrid, VesselGroup,
};

// 引擎
pub use engine::{
    CandidateAggregator, CandidateFeed, FirstRotationDeriver, LockLedger, LockStore,
    MonthNormalizer, PlanGenerator,
};

// API
pub use api::{ApiError, RotationWorkflow};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "船员轮换系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
