// ==========================================
// 船员轮换系统 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎,不拼 SQL
// 红线: Engine 不拼 SQL, 外部协作方只通过 ports 中的 trait 访问
// ==========================================

pub mod candidate_aggregator;
pub mod error;
pub mod first_rotation;
pub mod lock_ledger;
pub mod month_normalizer;
pub mod ports;

// 重导出核心引擎
pub use candidate_aggregator::{AggregationOutcome, CandidateAggregator, CandidateLoader, RawSources};
pub use error::{LedgerError, LedgerResult, SourceFetchError};
pub use first_rotation::FirstRotationDeriver;
pub use lock_ledger::LockLedger;
pub use month_normalizer::{MonthColumn, MonthNormalizer, MonthYear};
pub use ports::{CandidateFeed, CollaboratorError, LockStore, PlanGenerator};
