// ==========================================
// 船员轮换系统 - 方案载荷映射器
// ==========================================
// 职责: 排班服务原始载荷 → PlanResult；从任命表/替班表提取人员
// 载荷: { schedule, assignments, relievers? } 或 { error }
// 表格: { columns, rows } 或 对象数组
// ==========================================

use crate::domain::grid::{cell_text, get_ci, GridRow, ScheduleGrid};
use crate::domain::plan::PlanResult;
use crate::domain::types::{normalize_person_id, PersonId};
use crate::importer::error::{ImportError, ImportResult};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

const SCHEDULE_KEYS: &[&str] = &["schedule", "jadwal"];
const ASSIGNMENT_KEYS: &[&str] = &["assignments", "nahkoda", "officers"];
const RELIEVER_KEYS: &[&str] = &["relievers", "reliever"];

pub struct PlanMapper;

impl PlanMapper {
    /// 映射方案载荷
    ///
    /// # 返回
    /// - Err(PlannerRejected): 服务返回 `{ error }`，消息原样保留
    /// - Err(PlanPayloadError): 载荷结构不符
    pub fn map_plan(raw: &Value) -> ImportResult<PlanResult> {
        let obj = raw
            .as_object()
            .ok_or_else(|| ImportError::PlanPayloadError("载荷不是对象".to_string()))?;

        if let Some(error) = Self::find(obj, &["error"]) {
            match error {
                Value::Null | Value::Bool(false) => {}
                Value::String(s) => return Err(ImportError::PlannerRejected(s.clone())),
                other => return Err(ImportError::PlannerRejected(other.to_string())),
            }
        }

        let schedule = match Self::find(obj, SCHEDULE_KEYS) {
            Some(v) => Self::map_grid(v, "schedule")?,
            None => return Err(ImportError::PlanPayloadError("缺少 schedule 表".to_string())),
        };
        let assignments = match Self::find(obj, ASSIGNMENT_KEYS) {
            Some(v) => Self::map_grid(v, "assignments")?,
            None => ScheduleGrid::default(),
        };
        let relievers = match Self::find(obj, RELIEVER_KEYS) {
            None | Some(Value::Null) => None,
            Some(v) => Some(Self::map_grid(v, "relievers")?),
        };

        Ok(PlanResult {
            schedule,
            assignments,
            relievers,
        })
    }

    /// 映射单张表格
    ///
    /// 对象数组形式时，列顺序按首次出现顺序收集
    pub fn map_grid(raw: &Value, table: &str) -> ImportResult<ScheduleGrid> {
        match raw {
            Value::Array(items) => Self::rows_to_grid(None, items, table),
            Value::Object(obj) => {
                let rows = match obj.get("rows") {
                    Some(Value::Array(items)) => items,
                    Some(Value::Null) | None => {
                        return Err(ImportError::PlanPayloadError(format!("{} 缺少 rows", table)))
                    }
                    Some(_) => {
                        return Err(ImportError::PlanPayloadError(format!("{}.rows 不是数组", table)))
                    }
                };
                let columns = match obj.get("columns") {
                    Some(Value::Array(cols)) => Some(
                        cols.iter()
                            .filter_map(cell_text)
                            .collect::<Vec<String>>(),
                    ),
                    _ => None,
                };
                Self::rows_to_grid(columns, rows, table)
            }
            _ => Err(ImportError::PlanPayloadError(format!("{} 不是表格", table))),
        }
    }

    /// 从任命表与替班表提取人员标识
    ///
    /// 每行按 id_fields 顺序取首个非空值；无标识的行不参与锁定
    pub fn extract_person_ids(plan: &PlanResult, id_fields: &[String]) -> BTreeSet<PersonId> {
        plan.assignment_tables()
            .into_iter()
            .flat_map(|grid| grid.rows.iter())
            .filter_map(|row| Self::row_person_id(row, id_fields))
            .collect()
    }

    fn row_person_id(row: &GridRow, id_fields: &[String]) -> Option<PersonId> {
        id_fields
            .iter()
            .filter_map(|field| get_ci(row, field))
            .filter_map(cell_text)
            .find_map(|text| normalize_person_id(&text))
    }

    fn rows_to_grid(columns: Option<Vec<String>>, items: &[Value], table: &str) -> ImportResult<ScheduleGrid> {
        let mut rows = Vec::with_capacity(items.len());
        let mut seen_columns: Vec<String> = columns.unwrap_or_default();

        for (index, item) in items.iter().enumerate() {
            let row = item.as_object().ok_or_else(|| {
                ImportError::PlanPayloadError(format!("{} 第 {} 行不是对象", table, index))
            })?;
            for key in row.keys() {
                if !seen_columns.iter().any(|c| c == key) {
                    seen_columns.push(key.clone());
                }
            }
            rows.push(row.clone());
        }

        Ok(ScheduleGrid::new(seen_columns, rows))
    }

    fn find<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
        keys.iter().find_map(|key| {
            obj.iter()
                .find(|(k, _)| k.trim().eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
        })
    }
}
