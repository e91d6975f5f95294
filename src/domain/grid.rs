// ==========================================
// 船员轮换系统 - 表格领域模型
// ==========================================
// 说明: 排班计划/任命表/替班表均为 列名序列 + 行映射
// 列名为自由文本（月份列形如 "JAN 2025"）
// ==========================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 表格行: 列名 → 单元格
pub type GridRow = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleGrid {
    pub columns: Vec<String>,
    pub rows: Vec<GridRow>,
}

impl ScheduleGrid {
    pub fn new(columns: Vec<String>, rows: Vec<GridRow>) -> Self {
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// 确保列存在（已存在则不重复追加）
    pub fn ensure_column(&mut self, column: &str) {
        if !self.has_column(column) {
            self.columns.push(column.to_string());
        }
    }
}

/// 单元格文本（空值/数组/对象视为无内容）
pub fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// 按列名读取单元格，列名比较不区分大小写（精确匹配优先）
pub fn get_ci<'a>(row: &'a GridRow, key: &str) -> Option<&'a Value> {
    if let Some(v) = row.get(key) {
        return Some(v);
    }
    row.iter()
        .find(|(k, _)| k.trim().eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&json!("A")), Some("A".to_string()));
        assert_eq!(cell_text(&json!(12)), Some("12".to_string()));
        assert_eq!(cell_text(&Value::Null), None);
        assert_eq!(cell_text(&json!(["A"])), None);
    }

    #[test]
    fn test_get_ci() {
        let mut row = GridRow::new();
        row.insert("INDEX".to_string(), json!("a"));
        assert_eq!(get_ci(&row, "index"), Some(&json!("a")));
        assert_eq!(get_ci(&row, "Index"), Some(&json!("a")));
        assert!(get_ci(&row, "name").is_none());
    }

    #[test]
    fn test_ensure_column_idempotent() {
        let mut grid = ScheduleGrid::new(vec!["index".to_string()], vec![]);
        grid.ensure_column("first_rotation_date");
        grid.ensure_column("first_rotation_date");
        assert_eq!(grid.columns.len(), 2);
    }
}
