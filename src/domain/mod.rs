// ==========================================
// 船员轮换系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体与类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod candidate;
pub mod grid;
pub mod lock;
pub mod plan;
pub mod types;
pub mod vessel_group;

// 重导出核心类型
pub use candidate::{CandidatePool, CandidateRecord};
pub use grid::{cell_text, get_ci, GridRow, ScheduleGrid};
pub use lock::{LockAction, LockActionType, LockEntry};
pub use plan::{PlanRequest, PlanResult, RotationParams};
pub use types::{normalize_person_id, PersonId, SourceTag, WorkflowPhase};
pub use vessel_group::VesselGroup;
