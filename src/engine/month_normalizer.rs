// ==========================================
// 船员轮换系统 - 月份归一化纯函数库
// ==========================================
// 职责: 将自由文本 "月份 年份" 解析为 (月份数字, 年份)
// 支持: 英文/印尼文 全称与缩写 (JAN / JANUARI / Mar. / SEPT)
// 红线: 无法识别时静默返回 None，不得报错
// ==========================================

use crate::domain::grid::ScheduleGrid;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 月份全称/缩写表（英文 + 印尼文）
const MONTH_NAMES: &[(&str, u32)] = &[
    ("JANUARY", 1),
    ("JANUARI", 1),
    ("JAN", 1),
    ("FEBRUARY", 2),
    ("FEBRUARI", 2),
    ("PEBRUARI", 2),
    ("FEB", 2),
    ("PEB", 2),
    ("MARCH", 3),
    ("MARET", 3),
    ("MAR", 3),
    ("APRIL", 4),
    ("APR", 4),
    ("MAY", 5),
    ("MEI", 5),
    ("JUNE", 6),
    ("JUNI", 6),
    ("JUN", 6),
    ("JULY", 7),
    ("JULI", 7),
    ("JUL", 7),
    ("AUGUST", 8),
    ("AGUSTUS", 8),
    ("AUG", 8),
    ("AGU", 8),
    ("AGS", 8),
    ("AGT", 8),
    ("SEPTEMBER", 9),
    ("SEPT", 9),
    ("SEP", 9),
    ("OCTOBER", 10),
    ("OKTOBER", 10),
    ("OCT", 10),
    ("OKT", 10),
    ("NOVEMBER", 11),
    ("NOPEMBER", 11),
    ("NOV", 11),
    ("NOP", 11),
    ("DECEMBER", 12),
    ("DESEMBER", 12),
    ("DEC", 12),
    ("DES", 12),
];

/// 三字母前缀回退表
const MONTH_PREFIXES: &[(&str, u32)] = &[
    ("JAN", 1),
    ("FEB", 2),
    ("PEB", 2),
    ("MAR", 3),
    ("APR", 4),
    ("MAY", 5),
    ("MEI", 5),
    ("JUN", 6),
    ("JUL", 7),
    ("AUG", 8),
    ("AGU", 8),
    ("AGS", 8),
    ("AGT", 8),
    ("SEP", 9),
    ("OCT", 10),
    ("OKT", 10),
    ("NOV", 11),
    ("NOP", 11),
    ("DEC", 12),
    ("DES", 12),
];

// ==========================================
// MonthYear - 归一化结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonthYear {
    pub month: u32, // 1-12
    pub year: i32,  // 四位年份
}

impl MonthYear {
    /// 线性月序号 = year*12 + (month-1)，全序
    pub fn linear_index(&self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }
}

impl fmt::Display for MonthYear {
    /// 输出 "MM-YYYY"
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:04}", self.month, self.year)
    }
}

/// 已识别的月份列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthColumn {
    pub column: String,
    pub month_year: MonthYear,
}

// ==========================================
// MonthNormalizer - 纯函数工具类
// ==========================================
pub struct MonthNormalizer;

impl MonthNormalizer {
    /// 空白与大小写归一化
    ///
    /// - 不间断空格视为普通空格
    /// - 连续空白折叠为单个空格，去除首尾空白
    /// - 转为大写
    pub fn normalize_token(raw: &str) -> String {
        raw.replace('\u{00A0}', " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase()
    }

    /// 查找月份数字
    ///
    /// 先查全称/缩写表，未命中时按前三个字母回退查找。
    /// SEP 与 SEPT 均解析为 9。
    pub fn lookup_month(word: &str) -> Option<u32> {
        let word = Self::normalize_token(word);
        let word = word.trim_end_matches(|c: char| !c.is_alphanumeric());
        if word.is_empty() || !word.chars().all(|c| c.is_alphabetic()) {
            return None;
        }

        if let Some((_, month)) = MONTH_NAMES.iter().find(|(name, _)| *name == word) {
            return Some(*month);
        }

        let prefix: String = word.chars().take(3).collect();
        if prefix.chars().count() < 3 {
            return None;
        }
        MONTH_PREFIXES
            .iter()
            .find(|(p, _)| *p == prefix)
            .map(|(_, month)| *month)
    }

    /// 解析 "<月份词> <四位年份>"
    ///
    /// # 返回
    /// - Some(MonthYear): 识别成功
    /// - None: 无法识别（空串、纯数字、缺少年份等）
    pub fn parse(token: &str) -> Option<MonthYear> {
        let normalized = Self::normalize_token(token);
        let parts: Vec<&str> = normalized.split(' ').collect();
        if parts.len() != 2 {
            return None;
        }

        let year_str = parts[1].trim_end_matches(|c: char| !c.is_ascii_digit());
        if year_str.len() != 4 || !year_str.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let year = year_str.parse::<i32>().ok()?;
        let month = Self::lookup_month(parts[0])?;

        Some(MonthYear { month, year })
    }

    /// 预筛选表格中可识别为月份的列（保持列顺序）
    pub fn recognized_month_columns(grid: &ScheduleGrid) -> Vec<MonthColumn> {
        grid.columns
            .iter()
            .filter_map(|column| {
                Self::parse(column).map(|month_year| MonthColumn {
                    column: column.clone(),
                    month_year,
                })
            })
            .collect()
    }
}
