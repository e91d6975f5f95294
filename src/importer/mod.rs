// ==========================================
// 船员轮换系统 - 适配层
// ==========================================
// 职责: 外部载荷在边界处一次性映射为内部模型
// 支持: 候选来源载荷, 排班服务载荷, Excel/CSV 排班表
// ==========================================

pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod plan_mapper;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper;
pub use file_parser::{CsvGridParser, ExcelGridParser, GridFileParser, UniversalGridParser};
pub use plan_mapper::PlanMapper;
