// ==========================================
// 船员轮换系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键、busy_timeout）
// - 统一建表入口，锁定台账恢复前保证表结构存在
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 打开内存数据库（测试/无持久化会话）
pub fn open_in_memory_connection() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化系统表结构（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS crew_lock (
            group_key TEXT PRIMARY KEY,
            lock_id TEXT NOT NULL,
            plan_json TEXT NOT NULL,
            locked_at TEXT NOT NULL
        );

        -- person_id 主键: 存储层同样保证一人只属于一个锁定条目
        CREATE TABLE IF NOT EXISTS crew_lock_person (
            person_id TEXT PRIMARY KEY,
            group_key TEXT NOT NULL REFERENCES crew_lock(group_key) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_crew_lock_person_group
            ON crew_lock_person(group_key);

        CREATE TABLE IF NOT EXISTS crew_lock_action (
            action_id TEXT PRIMARY KEY,
            group_key TEXT NOT NULL,
            action_type TEXT NOT NULL,
            action_ts TEXT NOT NULL,
            payload_json TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_crew_lock_action_group_ts
            ON crew_lock_action(group_key, action_ts);
        "#,
    )?;
    Ok(())
}
