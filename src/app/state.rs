// ==========================================
// 船员轮换系统 - 应用状态
// ==========================================
// 职责: 初始化共享资源（数据库、配置、锁定台账），构建工作流
// 红线: 锁定台账必须在任何候选聚合之前从存储恢复
// ==========================================

use crate::api::rotation_workflow::RotationWorkflow;
use crate::config::config_manager::ConfigManager;
use crate::config::settings::RotationSettings;
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::lock_ledger::LockLedger;
use crate::engine::ports::{CandidateFeed, LockStore, PlanGenerator};
use crate::repository::lock_repo::LockRepository;
use std::sync::{Arc, Mutex};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "CREW_ROTATION_DB_PATH";

/// 应用状态
///
/// 进程内共享；每个用户会话通过 `workflow()` 获得独立的工作流
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 锁定存储（含审计）
    pub lock_repo: Arc<LockRepository>,

    /// 锁定台账（已恢复）
    pub ledger: Arc<LockLedger>,

    /// 启动时的配置快照
    pub settings: RotationSettings,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开共享连接并建表
    /// 2. 加载配置
    /// 3. 从存储恢复锁定台账
    pub async fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("无法初始化表结构: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let settings = config_manager
            .load_settings()
            .await
            .map_err(|e| format!("无法加载配置: {}", e))?;

        let lock_repo = Arc::new(
            LockRepository::from_connection(conn)
                .map_err(|e| format!("无法创建LockRepository: {}", e))?,
        );
        let store: Arc<dyn LockStore> = lock_repo.clone();
        let ledger = Arc::new(
            LockLedger::rehydrate(store).map_err(|e| format!("无法恢复锁定台账: {}", e))?,
        );

        tracing::info!(locked_groups = ledger.entries().len(), "AppState初始化完成");

        Ok(Self {
            db_path,
            config_manager,
            lock_repo,
            ledger,
            settings,
        })
    }

    /// 为一个会话创建工作流（共享同一台账）
    pub fn workflow(
        &self,
        feed: Arc<dyn CandidateFeed>,
        planner: Arc<dyn PlanGenerator>,
    ) -> RotationWorkflow {
        RotationWorkflow::new(feed, planner, Arc::clone(&self.ledger), self.settings.clone())
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 CREW_ROTATION_DB_PATH（非空时）
/// - 开发环境: 用户数据目录/crew-rotation-dev/crew_rotation.db
/// - 生产环境: 用户数据目录/crew-rotation/crew_rotation.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./crew_rotation.db");

    if let Some(data_dir) = dirs::data_dir() {
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("crew-rotation-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("crew-rotation");
        }

        // 目录创建失败时由打开数据库时报错
        std::fs::create_dir_all(&path).ok();
        path = path.join("crew_rotation.db");
    }

    path.to_string_lossy().to_string()
}
