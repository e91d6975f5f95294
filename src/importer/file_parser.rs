// ==========================================
// 船员轮换系统 - 排班表文件解析器
// ==========================================
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// 输出: ScheduleGrid（保留表头列顺序）
// ==========================================

use crate::domain::grid::{GridRow, ScheduleGrid};
use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use serde_json::Value;
use std::fs::File;
use std::path::Path;

/// 表格文件解析 Trait
pub trait GridFileParser {
    fn parse_grid(&self, file_path: &Path) -> ImportResult<ScheduleGrid>;
}

fn check_file(path: &Path, allowed: &[&str]) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if !allowed.contains(&ext.as_str()) {
        return Err(ImportError::UnsupportedFormat(ext));
    }
    Ok(())
}

/// 按表头组装行；空单元格记为 Null，完全空白的行跳过
fn build_row(headers: &[String], cells: impl Iterator<Item = String>) -> Option<GridRow> {
    let mut row = GridRow::new();
    let mut has_value = false;
    for (header, value) in headers.iter().zip(cells) {
        if header.is_empty() {
            continue;
        }
        let value = value.trim().to_string();
        if value.is_empty() {
            row.insert(header.clone(), Value::Null);
        } else {
            has_value = true;
            row.insert(header.clone(), Value::String(value));
        }
    }
    has_value.then_some(row)
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvGridParser;

impl GridFileParser for CsvGridParser {
    fn parse_grid(&self, file_path: &Path) -> ImportResult<ScheduleGrid> {
        check_file(file_path, &["csv"])?;

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            if let Some(row) = build_row(&headers, record.iter().map(|s| s.to_string())) {
                rows.push(row);
            }
        }

        let columns = headers.into_iter().filter(|h| !h.is_empty()).collect();
        Ok(ScheduleGrid::new(columns, rows))
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelGridParser;

impl GridFileParser for ExcelGridParser {
    fn parse_grid(&self, file_path: &Path) -> ImportResult<ScheduleGrid> {
        check_file(file_path, &["xlsx", "xls"])?;

        let mut workbook = open_workbook_auto(file_path)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        let mut data_rows = range.rows();
        let headers: Vec<String> = data_rows
            .next()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无数据行".to_string()))?
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let rows = data_rows
            .filter_map(|cells| build_row(&headers, cells.iter().map(|c| c.to_string())))
            .collect();

        let columns = headers.into_iter().filter(|h| !h.is_empty()).collect();
        Ok(ScheduleGrid::new(columns, rows))
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalGridParser;

impl UniversalGridParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<ScheduleGrid> {
        let path = file_path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvGridParser.parse_grid(path),
            "xlsx" | "xls" => ExcelGridParser.parse_grid(path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}
