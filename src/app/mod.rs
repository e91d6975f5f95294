// ==========================================
// 船员轮换系统 - 应用层
// ==========================================
// 职责: 组装共享资源，为会话提供工作流
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState, DB_PATH_ENV};
