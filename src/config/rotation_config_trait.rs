// ==========================================
// 船员轮换系统 - 轮换配置读取 Trait
// ==========================================
// 职责: 定义候选聚合与工作流所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

// ==========================================
// RotationConfigReader Trait
// ==========================================
// 用途: 聚合引擎/工作流所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait RotationConfigReader: Send + Sync {
    /// 获取历史任职/潜在晋升候选的截取上限
    ///
    /// # 默认值
    /// - 10
    async fn get_candidate_cap(&self) -> Result<usize, Box<dyn Error + Send + Sync>>;

    /// 获取单个数据源的拉取超时（毫秒）
    ///
    /// # 默认值
    /// - 15000
    async fn get_source_fetch_timeout_ms(&self) -> Result<u64, Box<dyn Error + Send + Sync>>;

    /// 获取"岸上待命"状态标记
    ///
    /// # 默认值
    /// - "STANDBY DARAT"
    ///
    /// # 用途
    /// - 最近状态等于该标记的候选自动选为必备待命
    async fn get_standby_status_marker(&self) -> Result<String, Box<dyn Error + Send + Sync>>;

    /// 获取需剔除的历史标记（休假/班次等非轮换记录）
    ///
    /// # 默认值
    /// - ["CUTI", "SHIFT", "OFF", "IZIN"]
    async fn get_excluded_history_tokens(&self) -> Result<Vec<String>, Box<dyn Error + Send + Sync>>;

    /// 获取方案任命表中人员标识的候选字段名（按顺序尝试）
    ///
    /// # 默认值
    /// - ["person_id", "nrp", "seafarer_id", "crew_id", "id"]
    async fn get_person_id_fields(&self) -> Result<Vec<String>, Box<dyn Error + Send + Sync>>;
}
