// ==========================================
// 船员轮换系统 - 轮换方案领域模型
// ==========================================
// 说明: 方案由外部排班服务生成，引擎只消费其形状
// ==========================================

use crate::domain::grid::ScheduleGrid;
use crate::domain::types::PersonId;
use serde::{Deserialize, Serialize};

// ==========================================
// RotationParams - 轮换参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationParams {
    pub job: String,       // 岗位 (如 NAHKODA)
    pub plan_type: String, // 方案类型
    pub part: String,      // 部门/分段
}

impl Default for RotationParams {
    fn default() -> Self {
        Self {
            job: "NAHKODA".to_string(),
            plan_type: "ROTATION".to_string(),
            part: "DECK".to_string(),
        }
    }
}

// ==========================================
// PlanRequest - 生成请求
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub group_key: String,
    pub standby: Vec<PersonId>,   // 必备待命（非空）
    pub reliever: Vec<PersonId>,  // 可选替班
    pub plan_type: String,
    pub part: String,
}

// ==========================================
// PlanResult - 生成结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// 排班日历（行 × 月份列）
    pub schedule: ScheduleGrid,
    /// 船长/高级船员任命表
    pub assignments: ScheduleGrid,
    /// 替班表（可选）
    pub relievers: Option<ScheduleGrid>,
}

impl PlanResult {
    /// 参与锁定的人员表（任命表 + 替班表）
    pub fn assignment_tables(&self) -> Vec<&ScheduleGrid> {
        let mut tables = vec![&self.assignments];
        if let Some(relievers) = &self.relievers {
            tables.push(relievers);
        }
        tables
    }
}
