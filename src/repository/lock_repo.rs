// ==========================================
// 船员轮换系统 - 锁定台账仓储
// ==========================================
// 职责: 管理 crew_lock / crew_lock_person / crew_lock_action 表
// 红线: Repository 不含业务逻辑，不相交性由 LockLedger 保证，
//       crew_lock_person.person_id 主键作为存储层兜底
// ==========================================

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::lock::{LockAction, LockActionType, LockEntry};
use crate::domain::plan::PlanResult;
use crate::engine::ports::LockStore;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

// ==========================================
// LockRepository - SQLite 实现
// ==========================================
pub struct LockRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LockRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        repo.ensure_schema()?;
        Ok(repo)
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.ensure_schema()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_schema(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        init_schema(&conn)?;
        Ok(())
    }

    fn parse_ts(field: &str, raw: &str) -> RepositoryResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| RepositoryError::FieldValueError {
                field: field.to_string(),
                message: format!("无法解析时间 {}: {}", raw, e),
            })
    }

    /// 查询某船组的锁定操作审计（按时间升序）
    pub fn list_actions(&self, group_key: &str) -> RepositoryResult<Vec<LockAction>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT action_id, group_key, action_type, action_ts, payload_json
            FROM crew_lock_action
            WHERE group_key = ?1
            ORDER BY action_ts ASC, rowid ASC
            "#,
        )?;

        let rows = stmt
            .query_map(params![group_key], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut actions = Vec::with_capacity(rows.len());
        for (action_id, group_key, action_type, action_ts, payload) in rows {
            let action_type = LockActionType::from_str(&action_type).ok_or_else(|| {
                RepositoryError::FieldValueError {
                    field: "action_type".to_string(),
                    message: format!("未知操作类型: {}", action_type),
                }
            })?;
            let payload_json = match payload {
                Some(raw) => Some(serde_json::from_str(&raw)?),
                None => None,
            };
            actions.push(LockAction {
                action_id,
                group_key,
                action_type,
                action_ts: Self::parse_ts("action_ts", &action_ts)?,
                payload_json,
            });
        }
        Ok(actions)
    }
}

impl LockStore for LockRepository {
    fn persist_lock(&self, entry: &LockEntry) -> RepositoryResult<()> {
        let plan_json = serde_json::to_string(&entry.committed_plan)?;

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM crew_lock_person WHERE group_key = ?1",
            params![entry.group_key],
        )?;
        tx.execute(
            r#"
            INSERT INTO crew_lock (group_key, lock_id, plan_json, locked_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(group_key) DO UPDATE SET
                lock_id = excluded.lock_id,
                plan_json = excluded.plan_json,
                locked_at = excluded.locked_at
            "#,
            params![
                entry.group_key,
                entry.lock_id,
                plan_json,
                entry.locked_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            ],
        )?;
        for person_id in &entry.person_ids {
            tx.execute(
                "INSERT INTO crew_lock_person (person_id, group_key) VALUES (?1, ?2)",
                params![person_id, entry.group_key],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn load_locks(&self) -> RepositoryResult<Vec<LockEntry>> {
        let conn = self.get_conn()?;

        let mut persons: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        {
            let mut stmt =
                conn.prepare("SELECT group_key, person_id FROM crew_lock_person ORDER BY person_id")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
                .collect::<SqliteResult<Vec<_>>>()?;
            for (group_key, person_id) in rows {
                persons.entry(group_key).or_default().insert(person_id);
            }
        }

        let mut stmt = conn.prepare(
            r#"
            SELECT group_key, lock_id, plan_json, locked_at
            FROM crew_lock
            ORDER BY group_key ASC
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut entries = Vec::with_capacity(rows.len());
        for (group_key, lock_id, plan_json, locked_at) in rows {
            let committed_plan: PlanResult = serde_json::from_str(&plan_json)?;
            entries.push(LockEntry {
                person_ids: persons.remove(&group_key).unwrap_or_default(),
                lock_id,
                group_key,
                committed_plan,
                locked_at: Self::parse_ts("locked_at", &locked_at)?,
            });
        }
        Ok(entries)
    }

    fn delete_lock(&self, group_key: &str) -> RepositoryResult<bool> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM crew_lock_person WHERE group_key = ?1",
            params![group_key],
        )?;
        let affected = tx.execute("DELETE FROM crew_lock WHERE group_key = ?1", params![group_key])?;
        tx.commit()?;
        Ok(affected > 0)
    }

    fn record_action(&self, action: &LockAction) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO crew_lock_action (action_id, group_key, action_type, action_ts, payload_json)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                action.action_id,
                action.group_key,
                action.action_type.as_str(),
                action.action_ts.to_rfc3339_opts(SecondsFormat::Micros, true),
                action.payload_json.as_ref().map(|v| v.to_string()),
            ],
        )?;
        Ok(())
    }
}

// ==========================================
// InMemoryLockStore - 内存实现
// ==========================================
// 用途: 单元测试、无持久化会话
#[derive(Default)]
pub struct InMemoryLockStore {
    entries: Mutex<BTreeMap<String, LockEntry>>,
    actions: Mutex<Vec<LockAction>>,
}

impl InMemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置条目（模拟上一次会话留下的锁定）
    pub fn with_entries(entries: Vec<LockEntry>) -> Self {
        let store = Self::default();
        if let Ok(mut map) = store.entries.lock() {
            for entry in entries {
                map.insert(entry.group_key.clone(), entry);
            }
        }
        store
    }

    pub fn actions(&self) -> RepositoryResult<Vec<LockAction>> {
        let actions = self
            .actions
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        Ok(actions.clone())
    }
}

impl LockStore for InMemoryLockStore {
    fn persist_lock(&self, entry: &LockEntry) -> RepositoryResult<()> {
        let mut map = self
            .entries
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        map.insert(entry.group_key.clone(), entry.clone());
        Ok(())
    }

    fn load_locks(&self) -> RepositoryResult<Vec<LockEntry>> {
        let map = self
            .entries
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        Ok(map.values().cloned().collect())
    }

    fn delete_lock(&self, group_key: &str) -> RepositoryResult<bool> {
        let mut map = self
            .entries
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        Ok(map.remove(group_key).is_some())
    }

    fn record_action(&self, action: &LockAction) -> RepositoryResult<()> {
        let mut actions = self
            .actions
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        actions.push(action.clone());
        Ok(())
    }
}
