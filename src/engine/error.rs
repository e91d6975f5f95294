// ==========================================
// 船员轮换系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::types::{PersonId, SourceTag};
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 锁定台账错误类型
#[derive(Error, Debug)]
pub enum LedgerError {
    /// 人员已被其他船组锁定
    #[error("锁定冲突: group={group_key} 与 group={conflicting_group_key} 争用人员 {person_ids:?}")]
    Conflict {
        group_key: String,
        conflicting_group_key: String,
        person_ids: Vec<PersonId>,
    },

    /// 持久化存储中的条目互相重叠，无法恢复
    #[error("锁定台账恢复失败: group={group_key} 与 group={conflicting_group_key} 重叠")]
    Rehydrate {
        group_key: String,
        conflicting_group_key: String,
    },

    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

/// 候选来源获取错误（非致命，记录为警告）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceFetchError {
    #[error("候选来源 {source_tag} 获取失败: {message}")]
    Failed { source_tag: SourceTag, message: String },

    #[error("候选来源 {source_tag} 获取超时: {timeout_ms}ms")]
    TimedOut { source_tag: SourceTag, timeout_ms: u64 },

    #[error("候选来源 {source_tag} 数据格式错误 (第 {index} 条): {message}")]
    Malformed {
        source_tag: SourceTag,
        index: usize,
        message: String,
    },
}

impl SourceFetchError {
    pub fn source_tag(&self) -> SourceTag {
        match self {
            SourceFetchError::Failed { source_tag, .. }
            | SourceFetchError::TimedOut { source_tag, .. }
            | SourceFetchError::Malformed { source_tag, .. } => *source_tag,
        }
    }
}

/// Result 类型别名
pub type LedgerResult<T> = Result<T, LedgerError>;
