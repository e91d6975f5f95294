// ==========================================
// 船员轮换系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换台账/仓储错误为用户可读的错误消息
// ==========================================

use crate::domain::types::PersonId;
use crate::engine::error::LedgerError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    /// 输入不满足前置条件（如必备待命为空、船组无船舶），输入变更前不可重试
    #[error("数据验证失败: {0}")]
    ValidationError(String),

    /// 排班服务返回错误，消息原样透出
    #[error("{0}")]
    PlanGenerationError(String),

    /// 锁定与其他船组冲突，方案保留
    #[error("锁定冲突: 船组 {conflicting_group_key} 已锁定人员 {person_ids:?}")]
    LockConflict {
        group_key: String,
        conflicting_group_key: String,
        person_ids: Vec<PersonId>,
    },

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseConnectionError(msg)
            | RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::DatabaseError(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::DatabaseError(format!("外键约束违反: {}", msg))
            }
            RepositoryError::SerializationError(msg) => ApiError::InternalError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InternalError(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 LedgerError 转换
// ==========================================
impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Conflict {
                group_key,
                conflicting_group_key,
                person_ids,
            } => ApiError::LockConflict {
                group_key,
                conflicting_group_key,
                person_ids,
            },
            LedgerError::Rehydrate {
                group_key,
                conflicting_group_key,
            } => ApiError::InternalError(format!(
                "锁定记录重叠: {} 与 {}",
                group_key, conflicting_group_key
            )),
            LedgerError::Storage(e) => e.into(),
        }
    }
}

// ==========================================
// 从 ImportError 转换（方案载荷）
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::PlannerRejected(msg) => ApiError::PlanGenerationError(msg),
            ImportError::Other(err) => ApiError::Other(err),
            other => ApiError::PlanGenerationError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
