// ==========================================
// 船员轮换系统 - 锁定台账
// ==========================================
// 职责: 维护 船组 → 锁定条目 的进程级映射
// 红线: 任意两个不同船组的锁定人员集合不相交
//       commit 是唯一的约束执行点，检查与写入在同一把锁内完成
// ==========================================

use crate::domain::lock::{LockAction, LockActionType, LockEntry};
use crate::domain::plan::PlanResult;
use crate::domain::types::{normalize_person_id, PersonId};
use crate::engine::error::{LedgerError, LedgerResult};
use crate::engine::ports::LockStore;
use crate::repository::lock_repo::InMemoryLockStore;
use serde_json::json;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

pub struct LockLedger {
    entries: Mutex<HashMap<String, LockEntry>>,
    store: Arc<dyn LockStore>,
}

impl LockLedger {
    /// 创建空台账
    pub fn new(store: Arc<dyn LockStore>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            store,
        }
    }

    /// 内存台账（不持久化）
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryLockStore::new()))
    }

    /// 从持久化存储恢复台账
    ///
    /// 必须在任何候选聚合之前调用，否则无法对历史会话的锁定执行排他约束。
    /// 存储中的条目互相重叠时拒绝恢复。
    pub fn rehydrate(store: Arc<dyn LockStore>) -> LedgerResult<Self> {
        let loaded = store.load_locks()?;

        let mut owner: HashMap<PersonId, String> = HashMap::new();
        let mut entries: HashMap<String, LockEntry> = HashMap::new();
        for entry in loaded {
            for person_id in &entry.person_ids {
                if let Some(other) = owner.get(person_id) {
                    if other != &entry.group_key {
                        return Err(LedgerError::Rehydrate {
                            group_key: entry.group_key.clone(),
                            conflicting_group_key: other.clone(),
                        });
                    }
                }
                owner.insert(person_id.clone(), entry.group_key.clone());
            }
            entries.insert(entry.group_key.clone(), entry);
        }

        info!(groups = entries.len(), persons = owner.len(), "锁定台账恢复完成");

        Ok(Self {
            entries: Mutex::new(entries),
            store,
        })
    }

    // 写入只在存储成功后一次性完成，中毒后的数据仍然一致
    fn guard(&self) -> MutexGuard<'_, HashMap<String, LockEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn audit(&self, action: LockAction) {
        if let Err(e) = self.store.record_action(&action) {
            warn!(
                group_key = %action.group_key,
                action_type = action.action_type.as_str(),
                error = %e,
                "锁定审计记录失败"
            );
        }
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 提交锁定（原子的 检查-写入）
    ///
    /// # 返回
    /// - Ok(LockEntry): 新建或替换后的条目
    /// - Err(Conflict): 有人员已被其他船组锁定，台账不变
    /// - Err(Storage): 持久化失败，台账不变
    pub fn commit<I, S>(&self, group_key: &str, plan: PlanResult, person_ids: I) -> LedgerResult<LockEntry>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let person_ids: BTreeSet<PersonId> = person_ids
            .into_iter()
            .filter_map(|p| normalize_person_id(p.as_ref()))
            .collect();

        let mut entries = self.guard();

        // 同船组的旧条目允许被替换，只与其他船组比较
        let conflict = entries
            .values()
            .filter(|e| e.group_key != group_key)
            .map(|e| (e.group_key.clone(), e.overlap(&person_ids)))
            .find(|(_, overlap)| !overlap.is_empty());

        if let Some((conflicting_group_key, overlap)) = conflict {
            warn!(
                group_key,
                conflicting_group_key = %conflicting_group_key,
                persons = ?overlap,
                "锁定冲突"
            );
            self.audit(LockAction::new(
                group_key,
                LockActionType::Conflict,
                Some(json!({
                    "conflicting_group_key": conflicting_group_key,
                    "person_ids": overlap,
                })),
            ));
            return Err(LedgerError::Conflict {
                group_key: group_key.to_string(),
                conflicting_group_key,
                person_ids: overlap,
            });
        }

        let entry = LockEntry::new(group_key, person_ids, plan);
        self.store.persist_lock(&entry)?;
        entries.insert(group_key.to_string(), entry.clone());

        info!(
            group_key,
            lock_id = %entry.lock_id,
            person_count = entry.person_ids.len(),
            "锁定提交成功"
        );
        self.audit(LockAction::new(
            group_key,
            LockActionType::Commit,
            Some(json!({
                "lock_id": entry.lock_id,
                "person_ids": entry.person_ids,
            })),
        ));

        Ok(entry)
    }

    /// 释放锁定（幂等）
    ///
    /// # 返回
    /// - Ok(Some(entry)): 被释放的条目
    /// - Ok(None): 该船组未锁定，无操作
    pub fn release(&self, group_key: &str) -> LedgerResult<Option<LockEntry>> {
        let mut entries = self.guard();

        if !entries.contains_key(group_key) {
            return Ok(None);
        }

        self.store.delete_lock(group_key)?;
        let removed = entries.remove(group_key);

        info!(group_key, "锁定已释放");
        self.audit(LockAction::new(group_key, LockActionType::Release, None));

        Ok(removed)
    }

    // ==========================================
    // 查询操作（不修改状态）
    // ==========================================

    pub fn is_locked(&self, group_key: &str) -> bool {
        self.guard().contains_key(group_key)
    }

    /// 已锁定人员集合，可排除某个船组（当前选中船组的人员需保持可见/可编辑）
    pub fn locked_persons(&self, excluding_group_key: Option<&str>) -> HashSet<PersonId> {
        self.guard()
            .values()
            .filter(|e| Some(e.group_key.as_str()) != excluding_group_key)
            .flat_map(|e| e.person_ids.iter().cloned())
            .collect()
    }

    /// 人员所属的锁定船组
    pub fn lock_owner(&self, person_id: &str) -> Option<String> {
        self.guard()
            .values()
            .find(|e| e.person_ids.contains(person_id))
            .map(|e| e.group_key.clone())
    }

    pub fn entry(&self, group_key: &str) -> Option<LockEntry> {
        self.guard().get(group_key).cloned()
    }

    /// 全部锁定条目（按船组排序）
    pub fn entries(&self) -> Vec<LockEntry> {
        let mut list: Vec<LockEntry> = self.guard().values().cloned().collect();
        list.sort_by(|a, b| a.group_key.cmp(&b.group_key));
        list
    }
}
