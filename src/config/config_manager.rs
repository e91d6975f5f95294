// ==========================================
// 船员轮换系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::rotation_config_trait::RotationConfigReader;
use crate::config::settings::{
    parse_list, AggregationSettings, RotationSettings, WorkflowSettings, DEFAULT_CANDIDATE_CAP,
    DEFAULT_EXCLUDED_HISTORY_TOKENS, DEFAULT_PERSON_ID_FIELDS, DEFAULT_SOURCE_FETCH_TIMEOUT_MS,
    DEFAULT_STANDBY_STATUS_MARKER,
};
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tracing::debug;

type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        crate::db::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有 global 配置的快照
    pub fn get_config_snapshot(&self) -> ConfigResult<HashMap<String, String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }
        Ok(config_map)
    }

    /// 一次性读取全部轮换配置
    pub async fn load_settings(&self) -> ConfigResult<RotationSettings> {
        let settings = RotationSettings {
            aggregation: AggregationSettings {
                candidate_cap: self.get_candidate_cap().await?,
                source_fetch_timeout_ms: self.get_source_fetch_timeout_ms().await?,
                standby_status_marker: self.get_standby_status_marker().await?,
                excluded_history_tokens: self.get_excluded_history_tokens().await?,
            },
            workflow: WorkflowSettings {
                person_id_fields: self.get_person_id_fields().await?,
            },
        };
        debug!(
            candidate_cap = settings.aggregation.candidate_cap,
            timeout_ms = settings.aggregation.source_fetch_timeout_ms,
            "轮换配置已加载"
        );
        Ok(settings)
    }
}

// ==========================================
// RotationConfigReader Trait 实现
// ==========================================
#[async_trait]
impl RotationConfigReader for ConfigManager {
    async fn get_candidate_cap(&self) -> ConfigResult<usize> {
        let value = self.get_config_or_default(
            config_keys::CANDIDATE_CAP,
            &DEFAULT_CANDIDATE_CAP.to_string(),
        )?;
        Ok(value
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|&cap| cap > 0)
            .unwrap_or(DEFAULT_CANDIDATE_CAP))
    }

    async fn get_source_fetch_timeout_ms(&self) -> ConfigResult<u64> {
        let value = self.get_config_or_default(
            config_keys::SOURCE_FETCH_TIMEOUT_MS,
            &DEFAULT_SOURCE_FETCH_TIMEOUT_MS.to_string(),
        )?;
        Ok(value
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|&ms| ms > 0)
            .unwrap_or(DEFAULT_SOURCE_FETCH_TIMEOUT_MS))
    }

    async fn get_standby_status_marker(&self) -> ConfigResult<String> {
        let value = self.get_config_or_default(
            config_keys::STANDBY_STATUS_MARKER,
            DEFAULT_STANDBY_STATUS_MARKER,
        )?;
        let value = value.trim();
        if value.is_empty() {
            Ok(DEFAULT_STANDBY_STATUS_MARKER.to_string())
        } else {
            Ok(value.to_string())
        }
    }

    async fn get_excluded_history_tokens(&self) -> ConfigResult<Vec<String>> {
        // 显式配置为空字符串表示不剔除任何标记
        match self.get_config_value(config_keys::EXCLUDED_HISTORY_TOKENS)? {
            Some(value) => Ok(parse_list(&value).into_iter().map(|s| s.to_uppercase()).collect()),
            None => Ok(DEFAULT_EXCLUDED_HISTORY_TOKENS.iter().map(|s| s.to_string()).collect()),
        }
    }

    async fn get_person_id_fields(&self) -> ConfigResult<Vec<String>> {
        let value = self.get_config_or_default(
            config_keys::PERSON_ID_FIELDS,
            &DEFAULT_PERSON_ID_FIELDS.join(","),
        )?;
        let fields = parse_list(&value);
        if fields.is_empty() {
            Ok(DEFAULT_PERSON_ID_FIELDS.iter().map(|s| s.to_string()).collect())
        } else {
            Ok(fields)
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 候选聚合
    pub const CANDIDATE_CAP: &str = "candidate_cap";
    pub const SOURCE_FETCH_TIMEOUT_MS: &str = "source_fetch_timeout_ms";
    pub const STANDBY_STATUS_MARKER: &str = "standby_status_marker";
    pub const EXCLUDED_HISTORY_TOKENS: &str = "excluded_history_tokens";

    // 方案锁定
    pub const PERSON_ID_FIELDS: &str = "person_id_fields";
}
