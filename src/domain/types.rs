// ==========================================
// 船员轮换系统 - 领域类型定义
// ==========================================
// 职责: 候选来源标签、工作流阶段、人员标识归一化
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 人员标识（裁剪首尾空白，保留大小写）
pub type PersonId = String;

/// 归一化人员标识
///
/// 返回 None 表示标识为空（裁剪后无内容）
pub fn normalize_person_id(raw: &str) -> Option<PersonId> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// ==========================================
// 候选来源 (Source Tag)
// ==========================================
// 合并优先级: Existing > Potential > Eligible
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceTag {
    Existing,  // 历史任职记录
    Potential, // 潜在晋升记录
    Eligible,  // 晋升资格名册
}

impl SourceTag {
    pub fn as_str(&self) -> &str {
        match self {
            SourceTag::Existing => "EXISTING",
            SourceTag::Potential => "POTENTIAL",
            SourceTag::Eligible => "ELIGIBLE",
        }
    }

    /// 合并时的优先级（数值越小越靠前）
    pub fn priority(&self) -> u8 {
        match self {
            SourceTag::Existing => 0,
            SourceTag::Potential => 1,
            SourceTag::Eligible => 2,
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 工作流阶段 (Workflow Phase)
// ==========================================
// Idle → GroupSelected → CandidatesReady → PlanGenerated → Locked
// Locked --unlock--> CandidatesReady
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowPhase {
    Idle,
    GroupSelected,
    CandidatesReady,
    PlanGenerated,
    Locked,
}

impl fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowPhase::Idle => write!(f, "IDLE"),
            WorkflowPhase::GroupSelected => write!(f, "GROUP_SELECTED"),
            WorkflowPhase::CandidatesReady => write!(f, "CANDIDATES_READY"),
            WorkflowPhase::PlanGenerated => write!(f, "PLAN_GENERATED"),
            WorkflowPhase::Locked => write!(f, "LOCKED"),
        }
    }
}
