// ==========================================
// 船员轮换系统 - 候选载荷字段映射器
// ==========================================
// 职责: 原始数据源载荷 → CandidateRecord
// 说明: 三个数据源的字段命名不统一，所有别名只在此处处理一次，
//       引擎层只接触规范化后的 CandidateRecord
// ==========================================

use crate::domain::candidate::CandidateRecord;
use crate::domain::types::{normalize_person_id, SourceTag};
use crate::importer::error::{ImportError, ImportResult};
use serde_json::{Map, Value};

/// 人员标识别名
const PERSON_ID_ALIASES: &[&str] = &["person_id", "personid", "nrp", "seafarer_id", "crew_id", "id"];
/// 姓名别名
const NAME_ALIASES: &[&str] = &["name", "nama", "crew_name", "full_name"];
/// 历史船舶别名
const VESSEL_ALIASES: &[&str] = &["vessel_list", "vessellist", "vessels", "ships", "kapal"];
/// 轮换历史别名
const HISTORY_ALIASES: &[&str] = &["history", "riwayat", "rotation_history"];
/// 最近状态别名
const STATUS_ALIASES: &[&str] = &[
    "last_status",
    "laststatus",
    "last_location",
    "lastlocation",
    "lokasi_terakhir",
    "status",
];
/// 匹配数别名
const MATCH_COUNT_ALIASES: &[&str] = &["match_count", "matchcount"];

pub struct FieldMapper;

impl FieldMapper {
    /// 映射单条记录
    ///
    /// # 参数
    /// - raw: 原始载荷（须为 JSON 对象）
    /// - source_tag: 数据来源
    /// - index: 记录序号（用于错误定位）
    pub fn map_candidate(raw: &Value, source_tag: SourceTag, index: usize) -> ImportResult<CandidateRecord> {
        let obj = raw.as_object().ok_or(ImportError::NotAnObject(index))?;

        let person_id = Self::get_string(obj, PERSON_ID_ALIASES)
            .and_then(|s| normalize_person_id(&s))
            .ok_or(ImportError::PrimaryKeyMissing(index))?;

        let name = Self::get_string(obj, NAME_ALIASES).unwrap_or_default();
        let vessels = Self::get_list(obj, VESSEL_ALIASES);
        let history = Self::get_list(obj, HISTORY_ALIASES);
        let last_status = Self::get_string(obj, STATUS_ALIASES);

        let match_count = match Self::find(obj, MATCH_COUNT_ALIASES) {
            None | Some(Value::Null) => 0,
            Some(Value::Number(n)) => n.as_u64().map(|v| v.min(u32::MAX as u64) as u32).ok_or_else(|| {
                ImportError::FieldFormatError {
                    index,
                    field: "match_count".to_string(),
                    message: format!("无法解析为非负整数: {}", n),
                }
            })?,
            Some(Value::String(s)) => s.trim().parse::<u32>().map_err(|_| ImportError::FieldFormatError {
                index,
                field: "match_count".to_string(),
                message: format!("无法解析为非负整数: {}", s),
            })?,
            Some(other) => {
                return Err(ImportError::FieldFormatError {
                    index,
                    field: "match_count".to_string(),
                    message: format!("类型不支持: {}", other),
                })
            }
        };

        let mut record = CandidateRecord::new(person_id, name, source_tag)
            .with_vessels(vessels)
            .with_history(history);
        record.last_status = last_status;
        // 资格名册不参与船舶匹配
        record.match_count = if source_tag == SourceTag::Eligible { 0 } else { match_count };

        Ok(record)
    }

    /// 批量映射，单条失败不影响其他记录
    pub fn map_batch(raws: &[Value], source_tag: SourceTag) -> (Vec<CandidateRecord>, Vec<ImportError>) {
        let mut records = Vec::with_capacity(raws.len());
        let mut errors = Vec::new();
        for (index, raw) in raws.iter().enumerate() {
            match Self::map_candidate(raw, source_tag, index) {
                Ok(record) => records.push(record),
                Err(e) => errors.push(e),
            }
        }
        (records, errors)
    }

    /// 按别名查找字段（大小写不敏感）
    fn find<'a>(obj: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
        for alias in aliases {
            if let Some((_, v)) = obj.iter().find(|(k, _)| k.trim().eq_ignore_ascii_case(alias)) {
                return Some(v);
            }
        }
        None
    }

    /// 提取字符串字段（裁剪后非空），数字按文本处理
    fn get_string(obj: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
        for alias in aliases {
            let value = obj
                .iter()
                .find(|(k, _)| k.trim().eq_ignore_ascii_case(alias))
                .map(|(_, v)| v);
            let text = match value {
                Some(Value::String(s)) => s.trim().to_string(),
                Some(Value::Number(n)) => n.to_string(),
                _ => continue,
            };
            if !text.is_empty() {
                return Some(text);
            }
        }
        None
    }

    /// 提取列表字段: 字符串数组，或以逗号/分号分隔的字符串
    fn get_list(obj: &Map<String, Value>, aliases: &[&str]) -> Vec<String> {
        let value = match Self::find(obj, aliases) {
            Some(v) => v,
            None => return Vec::new(),
        };

        let items: Vec<String> = match value {
            Value::Array(items) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            Value::String(s) => s.split([',', ';']).map(|p| p.to_string()).collect(),
            _ => Vec::new(),
        };

        items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}
