// ==========================================
// 船员轮换系统 - API 层
// ==========================================
// 职责: 提供工作流操作,供界面层调用
// ==========================================

pub mod error;
pub mod rotation_workflow;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use rotation_workflow::{
    localize_warning, RotationWorkflow, SelectionOutcome, SelectionTicket, WorkflowWarning,
};
