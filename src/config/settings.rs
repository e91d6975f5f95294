// ==========================================
// 船员轮换系统 - 配置快照
// ==========================================
// 说明: 一次选择/生成流程内使用的配置值，避免流程中途读取到不同配置
// ==========================================

use serde::{Deserialize, Serialize};

pub const DEFAULT_CANDIDATE_CAP: usize = 10;
pub const DEFAULT_SOURCE_FETCH_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_STANDBY_STATUS_MARKER: &str = "STANDBY DARAT";
pub const DEFAULT_EXCLUDED_HISTORY_TOKENS: &[&str] = &["CUTI", "SHIFT", "OFF", "IZIN"];
pub const DEFAULT_PERSON_ID_FIELDS: &[&str] = &["person_id", "nrp", "seafarer_id", "crew_id", "id"];

/// 候选聚合配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationSettings {
    pub candidate_cap: usize,
    pub source_fetch_timeout_ms: u64,
    pub standby_status_marker: String,
    pub excluded_history_tokens: Vec<String>,
}

impl Default for AggregationSettings {
    fn default() -> Self {
        Self {
            candidate_cap: DEFAULT_CANDIDATE_CAP,
            source_fetch_timeout_ms: DEFAULT_SOURCE_FETCH_TIMEOUT_MS,
            standby_status_marker: DEFAULT_STANDBY_STATUS_MARKER.to_string(),
            excluded_history_tokens: DEFAULT_EXCLUDED_HISTORY_TOKENS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// 工作流配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSettings {
    pub person_id_fields: Vec<String>,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            person_id_fields: DEFAULT_PERSON_ID_FIELDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationSettings {
    pub aggregation: AggregationSettings,
    pub workflow: WorkflowSettings,
}

/// 解析逗号分隔的列表配置（去空白、去空项）
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
