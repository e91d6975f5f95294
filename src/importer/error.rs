// ==========================================
// 船员轮换系统 - 适配/导入层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 适配/导入层错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 载荷映射错误 =====
    #[error("记录不是对象 (第 {0} 条)")]
    NotAnObject(usize),

    #[error("人员标识缺失 (第 {0} 条)")]
    PrimaryKeyMissing(usize),

    #[error("字段格式错误 (第 {index} 条, 字段 {field}): {message}")]
    FieldFormatError {
        index: usize,
        field: String,
        message: String,
    },

    #[error("方案载荷格式错误: {0}")]
    PlanPayloadError(String),

    /// 排班服务返回 { error }
    #[error("{0}")]
    PlannerRejected(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
