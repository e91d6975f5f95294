// ==========================================
// 船员轮换系统 - 候选人领域模型
// ==========================================
// 说明: 每次选择船组时重新计算，不持久化
// ==========================================

use crate::domain::types::{PersonId, SourceTag};
use serde::{Deserialize, Serialize};

// ==========================================
// CandidateRecord - 候选人记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub person_id: PersonId,           // 人员标识
    pub name: String,                  // 姓名
    pub source_tag: SourceTag,         // 来源
    pub match_count: u32,              // 船舶重合数 (Eligible 来源恒为 0)
    pub vessels: Vec<String>,          // 历史任职船舶
    pub history: Vec<String>,          // 轮换历史标记
    pub last_status: Option<String>,   // 最近位置/状态
}

impl CandidateRecord {
    pub fn new(person_id: impl Into<PersonId>, name: impl Into<String>, source_tag: SourceTag) -> Self {
        Self {
            person_id: person_id.into(),
            name: name.into(),
            source_tag,
            match_count: 0,
            vessels: Vec::new(),
            history: Vec::new(),
            last_status: None,
        }
    }

    pub fn with_vessels<I, S>(mut self, vessels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vessels = vessels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_history<I, S>(mut self, history: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.history = history.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_last_status(mut self, status: impl Into<String>) -> Self {
        self.last_status = Some(status.into());
        self
    }

    pub fn with_match_count(mut self, match_count: u32) -> Self {
        self.match_count = match_count;
        self
    }
}

// ==========================================
// CandidatePool - 候选池（聚合输出）
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidatePool {
    pub group_key: String,
    /// 合并后的候选（按来源优先级与匹配度排序，人员唯一）
    pub candidates: Vec<CandidateRecord>,
    /// 自动选为必备待命的人员（最近状态为"岸上待命"）
    pub auto_standby: Vec<PersonId>,
}

impl CandidatePool {
    pub fn contains(&self, person_id: &str) -> bool {
        self.candidates.iter().any(|c| c.person_id == person_id)
    }

    pub fn get(&self, person_id: &str) -> Option<&CandidateRecord> {
        self.candidates.iter().find(|c| c.person_id == person_id)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// 必备待命候选项（全部候选）
    pub fn standby_options(&self) -> Vec<&CandidateRecord> {
        self.candidates.iter().collect()
    }

    /// 可选替班候选项（排除当前已选为待命的人员）
    pub fn reliever_options(&self, standby: &[PersonId]) -> Vec<&CandidateRecord> {
        self.candidates
            .iter()
            .filter(|c| !standby.contains(&c.person_id))
            .collect()
    }
}
