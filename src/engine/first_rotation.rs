// ==========================================
// 船员轮换系统 - 首次轮换月份推导
// ==========================================
// 职责: 在排班日历中为每个行标识找出最早出现的月份
// 输入: ScheduleGrid + 已识别的月份列
// 输出: 每行追加/覆盖 first_rotation_date = "MM-YYYY" 或 "-"
// 红线: 幂等，重复推导只覆盖同一派生列
// ==========================================

use crate::domain::grid::{cell_text, get_ci, ScheduleGrid};
use crate::engine::month_normalizer::{MonthColumn, MonthNormalizer, MonthYear};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// 派生列名
pub const FIRST_ROTATION_COLUMN: &str = "first_rotation_date";

/// 未出现在任何月份列时的占位值
pub const NO_ROTATION: &str = "-";

/// 行标识列名（大小写不敏感）
pub const ROW_ID_COLUMN: &str = "index";

pub struct FirstRotationDeriver;

impl FirstRotationDeriver {
    /// 扫描所有月份列，求每个占位标记的最早月份
    ///
    /// 比较依据为线性月序号 year*12 + (month-1)，与列顺序无关
    pub fn earliest_by_marker(
        grid: &ScheduleGrid,
        month_columns: &[MonthColumn],
    ) -> HashMap<String, MonthYear> {
        let mut earliest: HashMap<String, MonthYear> = HashMap::new();

        for col in month_columns {
            for row in &grid.rows {
                let marker = match row.get(&col.column).and_then(cell_text) {
                    Some(text) => MonthNormalizer::normalize_token(&text),
                    None => continue,
                };
                if marker.is_empty() {
                    continue;
                }

                earliest
                    .entry(marker)
                    .and_modify(|current| {
                        if col.month_year.linear_index() < current.linear_index() {
                            *current = col.month_year;
                        }
                    })
                    .or_insert(col.month_year);
            }
        }

        earliest
    }

    /// 推导并写入派生列
    ///
    /// # 返回
    /// - usize: 得到具体月份（非 "-"）的行数
    pub fn derive(grid: &mut ScheduleGrid, month_columns: &[MonthColumn]) -> usize {
        let earliest = Self::earliest_by_marker(grid, month_columns);

        let mut resolved = 0;
        for row in grid.rows.iter_mut() {
            let row_marker = get_ci(row, ROW_ID_COLUMN)
                .and_then(cell_text)
                .map(|text| MonthNormalizer::normalize_token(&text))
                .filter(|m| !m.is_empty());

            let value = match row_marker.and_then(|m| earliest.get(&m)) {
                Some(month_year) => {
                    resolved += 1;
                    month_year.to_string()
                }
                None => NO_ROTATION.to_string(),
            };
            row.insert(FIRST_ROTATION_COLUMN.to_string(), Value::String(value));
        }

        grid.ensure_column(FIRST_ROTATION_COLUMN);

        debug!(
            month_columns = month_columns.len(),
            markers = earliest.len(),
            resolved_rows = resolved,
            "首次轮换月份推导完成"
        );
        resolved
    }

    /// 识别月份列并推导（便捷入口）
    pub fn annotate(grid: &mut ScheduleGrid) -> usize {
        let month_columns = MonthNormalizer::recognized_month_columns(grid);
        Self::derive(grid, &month_columns)
    }
}
