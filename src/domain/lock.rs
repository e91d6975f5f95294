// ==========================================
// 船员轮换系统 - 锁定条目领域模型
// ==========================================
// 红线: 任一人员同一时刻最多出现在一个船组的锁定条目中
// ==========================================

use crate::domain::plan::PlanResult;
use crate::domain::types::PersonId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockEntry {
    pub lock_id: String,                // 锁定ID (UUID)
    pub group_key: String,              // 船组标识
    pub person_ids: BTreeSet<PersonId>, // 占用人员
    pub committed_plan: PlanResult,     // 已接受的方案
    pub locked_at: DateTime<Utc>,       // 锁定时间
}

impl LockEntry {
    pub fn new(group_key: impl Into<String>, person_ids: BTreeSet<PersonId>, plan: PlanResult) -> Self {
        Self {
            lock_id: uuid::Uuid::new_v4().to_string(),
            group_key: group_key.into(),
            person_ids,
            committed_plan: plan,
            locked_at: Utc::now(),
        }
    }

    /// 与给定人员集合的交集
    pub fn overlap<'a, I>(&self, person_ids: I) -> Vec<PersonId>
    where
        I: IntoIterator<Item = &'a PersonId>,
    {
        person_ids
            .into_iter()
            .filter(|p| self.person_ids.contains(*p))
            .cloned()
            .collect()
    }
}

// ==========================================
// LockAction - 锁定操作审计
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockActionType {
    Commit,
    Release,
    Conflict,
}

impl LockActionType {
    pub fn as_str(&self) -> &str {
        match self {
            LockActionType::Commit => "COMMIT",
            LockActionType::Release => "RELEASE",
            LockActionType::Conflict => "CONFLICT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "COMMIT" => Some(LockActionType::Commit),
            "RELEASE" => Some(LockActionType::Release),
            "CONFLICT" => Some(LockActionType::Conflict),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockAction {
    pub action_id: String,
    pub group_key: String,
    pub action_type: LockActionType,
    pub action_ts: DateTime<Utc>,
    pub payload_json: Option<serde_json::Value>,
}

impl LockAction {
    pub fn new(
        group_key: impl Into<String>,
        action_type: LockActionType,
        payload_json: Option<serde_json::Value>,
    ) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            group_key: group_key.into(),
            action_type,
            action_ts: Utc::now(),
            payload_json,
        }
    }
}
