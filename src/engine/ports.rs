// ==========================================
// 船员轮换系统 - 外部协作方接口
// ==========================================
// 职责: 定义候选数据源、方案生成服务、锁定存储的 trait
// 说明: Engine 层定义 trait，传输/存储细节由实现方负责
// ==========================================

use crate::domain::lock::{LockAction, LockEntry};
use crate::domain::plan::PlanRequest;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use serde_json::Value;

/// 协作方返回的错误
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

// ==========================================
// 候选数据源 Trait
// ==========================================

/// 三个只读候选数据源
///
/// 返回原始载荷（字段命名不统一），由 importer 层的适配器统一映射为 CandidateRecord
#[async_trait]
pub trait CandidateFeed: Send + Sync {
    /// 历史任职记录
    async fn fetch_existing(
        &self,
        job: &str,
        group_ships: &[String],
    ) -> Result<Vec<Value>, CollaboratorError>;

    /// 潜在晋升记录
    async fn fetch_potential(
        &self,
        job: &str,
        group_ships: &[String],
    ) -> Result<Vec<Value>, CollaboratorError>;

    /// 晋升资格名册
    async fn fetch_eligible(&self, job: &str) -> Result<Vec<Value>, CollaboratorError>;
}

// ==========================================
// 方案生成服务 Trait
// ==========================================

/// 外部排班服务
///
/// 返回原始载荷: `{ schedule, assignments, relievers? }` 或 `{ error }`
#[async_trait]
pub trait PlanGenerator: Send + Sync {
    async fn generate_plan(&self, request: &PlanRequest) -> Result<Value, CollaboratorError>;
}

// ==========================================
// 锁定存储 Trait
// ==========================================

/// 锁定台账的持久化存储
pub trait LockStore: Send + Sync {
    /// 写入（替换）某船组的锁定条目
    fn persist_lock(&self, entry: &LockEntry) -> RepositoryResult<()>;

    /// 读取全部锁定条目
    fn load_locks(&self) -> RepositoryResult<Vec<LockEntry>>;

    /// 删除某船组的锁定条目，返回是否存在
    fn delete_lock(&self, group_key: &str) -> RepositoryResult<bool>;

    /// 记录锁定操作审计（默认不记录）
    fn record_action(&self, _action: &LockAction) -> RepositoryResult<()> {
        Ok(())
    }
}
