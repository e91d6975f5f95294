// ==========================================
// 船员轮换系统 - 轮换工作流控制器
// ==========================================
// 职责: 船组选择 → 候选聚合 → 方案生成 → 锁定/解锁
// 状态: Idle → GroupSelected → CandidatesReady → PlanGenerated → Locked
//       Locked --unlock--> CandidatesReady
// 红线: 状态只能通过命名操作转换；切换船组后旧的聚合结果一律丢弃
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::settings::RotationSettings;
use crate::domain::candidate::CandidatePool;
use crate::domain::lock::LockEntry;
use crate::domain::plan::{PlanRequest, PlanResult, RotationParams};
use crate::domain::types::{PersonId, WorkflowPhase};
use crate::domain::vessel_group::VesselGroup;
use crate::engine::candidate_aggregator::{AggregationOutcome, CandidateLoader};
use crate::engine::error::SourceFetchError;
use crate::engine::first_rotation::FirstRotationDeriver;
use crate::engine::lock_ledger::LockLedger;
use crate::engine::ports::{CandidateFeed, PlanGenerator};
use crate::i18n::{t, t_with_args};
use crate::importer::plan_mapper::PlanMapper;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, instrument, warn};

// ==========================================
// SelectionTicket - 单次选择的取消令牌
// ==========================================
/// 每次 select_group 生成新序号；序号落后即视为已取消
#[derive(Debug, Clone)]
pub struct SelectionTicket {
    seq: u64,
    group: VesselGroup,
    current: Arc<AtomicU64>,
}

impl SelectionTicket {
    pub fn group(&self) -> &VesselGroup {
        &self.group
    }

    pub fn group_key(&self) -> &str {
        &self.group.group_key
    }

    /// 之后是否已选择了其他船组（或重新选择）
    pub fn is_cancelled(&self) -> bool {
        self.current.load(Ordering::SeqCst) != self.seq
    }
}

/// select_group 的结果
#[derive(Debug, Clone)]
pub enum SelectionOutcome {
    /// 需要加载候选
    Pending(SelectionTicket),
    /// 船组已锁定，直接展示已提交的方案
    Locked(PlanResult),
}

/// 非阻塞警告
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowWarning {
    Source(SourceFetchError),
    StaleDiscarded { group_key: String },
}

#[derive(Debug)]
struct SessionState {
    phase: WorkflowPhase,
    group: Option<VesselGroup>,
    pool: Option<CandidatePool>,
    standby: Vec<PersonId>,
    relievers: Vec<PersonId>,
    plan: Option<PlanResult>,
    warnings: Vec<WorkflowWarning>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: WorkflowPhase::Idle,
            group: None,
            pool: None,
            standby: Vec::new(),
            relievers: Vec::new(),
            plan: None,
            warnings: Vec::new(),
        }
    }
}

impl SessionState {
    fn phase(&self) -> WorkflowPhase {
        self.phase
    }

    fn require(&self, expected: WorkflowPhase, target: WorkflowPhase) -> ApiResult<()> {
        if self.phase() == expected {
            Ok(())
        } else {
            Err(ApiError::InvalidStateTransition {
                from: self.phase().to_string(),
                to: target.to_string(),
            })
        }
    }

    fn group_key(&self) -> ApiResult<String> {
        self.group
            .as_ref()
            .map(|g| g.group_key.clone())
            .ok_or_else(|| ApiError::InternalError("未选择船组".to_string()))
    }

    fn pool_member(&self, person_id: &str) -> ApiResult<()> {
        match &self.pool {
            Some(pool) if pool.contains(person_id) => Ok(()),
            _ => Err(ApiError::ValidationError(format!(
                "人员 {} 不在当前候选池中",
                person_id
            ))),
        }
    }
}

// ==========================================
// RotationWorkflow - 工作流控制器
// ==========================================
pub struct RotationWorkflow {
    loader: CandidateLoader<dyn CandidateFeed>,
    planner: Arc<dyn PlanGenerator>,
    ledger: Arc<LockLedger>,
    settings: RotationSettings,
    params: RotationParams,
    selection_seq: Arc<AtomicU64>,
    session: Mutex<SessionState>,
}

impl RotationWorkflow {
    /// 创建工作流
    ///
    /// # 参数
    /// - feed: 候选数据源
    /// - planner: 排班服务
    /// - ledger: 已恢复的锁定台账（进程内共享）
    /// - settings: 配置快照
    pub fn new(
        feed: Arc<dyn CandidateFeed>,
        planner: Arc<dyn PlanGenerator>,
        ledger: Arc<LockLedger>,
        settings: RotationSettings,
    ) -> Self {
        Self {
            loader: CandidateLoader::new(feed),
            planner,
            ledger,
            settings,
            params: RotationParams::default(),
            selection_seq: Arc::new(AtomicU64::new(0)),
            session: Mutex::new(SessionState::default()),
        }
    }

    pub fn with_params(mut self, params: RotationParams) -> Self {
        self.params = params;
        self
    }

    // await 期间从不持有会话锁
    fn session(&self) -> MutexGuard<'_, SessionState> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn next_ticket(&self, group: VesselGroup) -> SelectionTicket {
        let seq = self.selection_seq.fetch_add(1, Ordering::SeqCst) + 1;
        SelectionTicket {
            seq,
            group,
            current: Arc::clone(&self.selection_seq),
        }
    }

    // ==========================================
    // 船组选择
    // ==========================================

    /// 选择船组（任意状态可调用）
    ///
    /// 取消前一次选择尚未完成的聚合；已锁定的船组直接进入 Locked 并返回已提交方案。
    #[instrument(skip(self, group), fields(group_key = %group.group_key))]
    pub fn select_group(&self, group: VesselGroup) -> ApiResult<SelectionOutcome> {
        let locked = self.ledger.entry(&group.group_key);
        if locked.is_none() && !group.has_ships() {
            return Err(ApiError::ValidationError(format!(
                "船组 {} 没有船舶",
                group.group_key
            )));
        }

        let ticket = self.next_ticket(group.clone());
        let mut session = self.session();
        *session = SessionState {
            group: Some(group),
            ..SessionState::default()
        };

        match locked {
            Some(entry) => {
                let mut plan = entry.committed_plan;
                FirstRotationDeriver::annotate(&mut plan.schedule);
                session.plan = Some(plan.clone());
                session.phase = WorkflowPhase::Locked;
                info!(lock_id = %entry.lock_id, "船组已锁定，展示已提交方案");
                Ok(SelectionOutcome::Locked(plan))
            }
            None => {
                session.phase = WorkflowPhase::GroupSelected;
                Ok(SelectionOutcome::Pending(ticket))
            }
        }
    }

    /// 为选择令牌加载候选（不修改会话状态）
    ///
    /// 当前船组自己的锁定人员保持可见，其他船组的锁定人员被排除。
    #[instrument(skip(self, ticket), fields(group_key = %ticket.group_key()))]
    pub async fn load_candidates(&self, ticket: &SelectionTicket) -> AggregationOutcome {
        let locked_elsewhere = self.ledger.locked_persons(Some(ticket.group_key()));
        self.loader
            .load(
                &self.params.job,
                ticket.group(),
                &locked_elsewhere,
                &self.settings.aggregation,
            )
            .await
    }

    /// 聚合完成 → CandidatesReady
    ///
    /// # 返回
    /// - Ok(true): 结果已采用
    /// - Ok(false): 令牌已过期，结果被丢弃
    pub fn complete_selection(&self, ticket: &SelectionTicket, outcome: AggregationOutcome) -> ApiResult<bool> {
        let mut session = self.session();

        if ticket.is_cancelled() {
            info!(group_key = %ticket.group_key(), "船组已切换，丢弃过期的候选结果");
            session.warnings.push(WorkflowWarning::StaleDiscarded {
                group_key: ticket.group_key().to_string(),
            });
            return Ok(false);
        }
        session.require(WorkflowPhase::GroupSelected, WorkflowPhase::CandidatesReady)?;

        let AggregationOutcome { pool, warnings } = outcome;

        // 自动待命只补充，不移除已有的人工选择
        for person_id in &pool.auto_standby {
            if !session.standby.contains(person_id) {
                session.standby.push(person_id.clone());
            }
        }
        let standby = session.standby.clone();
        session.relievers.retain(|p| !standby.contains(p));

        session
            .warnings
            .extend(warnings.into_iter().map(WorkflowWarning::Source));
        session.pool = Some(pool);
        session.phase = WorkflowPhase::CandidatesReady;
        Ok(true)
    }

    /// 选择船组并加载候选
    pub async fn select_group_and_load(&self, group: VesselGroup) -> ApiResult<WorkflowPhase> {
        if let SelectionOutcome::Pending(ticket) = self.select_group(group)? {
            let outcome = self.load_candidates(&ticket).await;
            self.complete_selection(&ticket, outcome)?;
        }
        Ok(self.phase())
    }

    // ==========================================
    // 待命/替班选择
    // ==========================================

    /// 设置必备待命（覆盖），同时从替班中移除
    pub fn set_standby(&self, person_ids: &[PersonId]) -> ApiResult<()> {
        let mut session = self.session();
        session.require(WorkflowPhase::CandidatesReady, WorkflowPhase::CandidatesReady)?;

        let mut standby: Vec<PersonId> = Vec::new();
        for person_id in person_ids {
            let person_id = person_id.trim();
            session.pool_member(person_id)?;
            if !standby.iter().any(|p| p == person_id) {
                standby.push(person_id.to_string());
            }
        }

        session.relievers.retain(|p| !standby.contains(p));
        session.standby = standby;
        Ok(())
    }

    /// 切换单个人员的待命状态
    ///
    /// # 返回
    /// - true: 切换后为待命
    pub fn toggle_standby(&self, person_id: &str) -> ApiResult<bool> {
        let mut session = self.session();
        session.require(WorkflowPhase::CandidatesReady, WorkflowPhase::CandidatesReady)?;
        let person_id = person_id.trim();
        session.pool_member(person_id)?;

        if let Some(pos) = session.standby.iter().position(|p| p == person_id) {
            session.standby.remove(pos);
            Ok(false)
        } else {
            session.standby.push(person_id.to_string());
            session.relievers.retain(|p| p != person_id);
            Ok(true)
        }
    }

    /// 设置可选替班（覆盖）；已是待命的人员不会进入替班
    pub fn set_relievers(&self, person_ids: &[PersonId]) -> ApiResult<()> {
        let mut session = self.session();
        session.require(WorkflowPhase::CandidatesReady, WorkflowPhase::CandidatesReady)?;

        let mut relievers: Vec<PersonId> = Vec::new();
        for person_id in person_ids {
            let person_id = person_id.trim();
            session.pool_member(person_id)?;
            if session.standby.iter().any(|p| p == person_id) {
                continue;
            }
            if !relievers.iter().any(|p| p == person_id) {
                relievers.push(person_id.to_string());
            }
        }

        session.relievers = relievers;
        Ok(())
    }

    // ==========================================
    // 方案生成
    // ==========================================

    /// 生成方案: CandidatesReady → PlanGenerated
    ///
    /// 必备待命为空时返回 ValidationError；排班服务失败时保持 CandidatesReady 并原样透出错误。
    #[instrument(skip(self))]
    pub async fn generate_plan(&self) -> ApiResult<PlanResult> {
        let (request, seq) = {
            let session = self.session();
            session.require(WorkflowPhase::CandidatesReady, WorkflowPhase::PlanGenerated)?;
            if session.standby.is_empty() {
                return Err(ApiError::ValidationError("必备待命名单不能为空".to_string()));
            }
            let request = PlanRequest {
                group_key: session.group_key()?,
                standby: session.standby.clone(),
                reliever: session.relievers.clone(),
                plan_type: self.params.plan_type.clone(),
                part: self.params.part.clone(),
            };
            (request, self.selection_seq.load(Ordering::SeqCst))
        };

        let raw = self.planner.generate_plan(&request).await.map_err(|e| {
            warn!(group_key = %request.group_key, error = %e, "排班服务调用失败");
            ApiError::PlanGenerationError(e.to_string())
        })?;
        let mut plan = PlanMapper::map_plan(&raw).map_err(|e| {
            warn!(group_key = %request.group_key, error = %e, "排班服务返回错误");
            ApiError::from(e)
        })?;
        let annotated = FirstRotationDeriver::annotate(&mut plan.schedule);

        let mut session = self.session();
        if self.selection_seq.load(Ordering::SeqCst) != seq {
            info!(group_key = %request.group_key, "船组已切换，丢弃过期的方案");
            return Err(ApiError::InvalidStateTransition {
                from: session.phase().to_string(),
                to: WorkflowPhase::PlanGenerated.to_string(),
            });
        }
        session.require(WorkflowPhase::CandidatesReady, WorkflowPhase::PlanGenerated)?;

        info!(
            group_key = %request.group_key,
            standby = request.standby.len(),
            reliever = request.reliever.len(),
            annotated_rows = annotated,
            "方案生成成功"
        );
        session.plan = Some(plan.clone());
        session.phase = WorkflowPhase::PlanGenerated;
        Ok(plan)
    }

    // ==========================================
    // 锁定/解锁
    // ==========================================

    /// 锁定方案: PlanGenerated → Locked
    ///
    /// 冲突时保持 PlanGenerated，方案保留以便处理冲突船组后重试。
    #[instrument(skip(self))]
    pub fn lock(&self) -> ApiResult<LockEntry> {
        let mut session = self.session();
        session.require(WorkflowPhase::PlanGenerated, WorkflowPhase::Locked)?;

        let group_key = session.group_key()?;
        let plan = session
            .plan
            .clone()
            .ok_or_else(|| ApiError::InternalError("PlanGenerated 状态下缺少方案".to_string()))?;
        let person_ids = PlanMapper::extract_person_ids(&plan, &self.settings.workflow.person_id_fields);
        if person_ids.is_empty() {
            warn!(group_key = %group_key, "方案任命表中没有可识别的人员标识");
        }

        let entry = self.ledger.commit(&group_key, plan, person_ids)?;
        session.phase = WorkflowPhase::Locked;
        Ok(entry)
    }

    /// 解锁（底层操作）: Locked → CandidatesReady，清除展示的方案
    ///
    /// 直接从选择进入 Locked 时没有候选池，此时回到 GroupSelected 并返回新的令牌；
    /// 调用方必须用该令牌执行 load_candidates + complete_selection。
    /// 界面层应调用 `unlock_and_reload`。
    #[instrument(skip(self))]
    pub fn unlock(&self) -> ApiResult<Option<SelectionTicket>> {
        let mut session = self.session();
        session.require(WorkflowPhase::Locked, WorkflowPhase::CandidatesReady)?;

        let group_key = session.group_key()?;
        self.ledger.release(&group_key)?;
        session.plan = None;

        if session.pool.is_some() {
            session.phase = WorkflowPhase::CandidatesReady;
            return Ok(None);
        }

        let group = session
            .group
            .clone()
            .ok_or_else(|| ApiError::InternalError("未选择船组".to_string()))?;
        session.phase = WorkflowPhase::GroupSelected;
        drop(session);
        Ok(Some(self.next_ticket(group)))
    }

    /// 解锁入口: Locked → CandidatesReady
    ///
    /// 已有候选池时直接回到 CandidatesReady；直接从选择进入 Locked 时重新加载候选后再进入。
    /// 返回前不会停留在 GroupSelected（除非加载期间切换了船组）。
    pub async fn unlock_and_reload(&self) -> ApiResult<WorkflowPhase> {
        if let Some(ticket) = self.unlock()? {
            let outcome = self.load_candidates(&ticket).await;
            self.complete_selection(&ticket, outcome)?;
        }
        Ok(self.phase())
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn phase(&self) -> WorkflowPhase {
        self.session().phase()
    }

    pub fn group_key(&self) -> Option<String> {
        self.session().group.as_ref().map(|g| g.group_key.clone())
    }

    pub fn pool(&self) -> Option<CandidatePool> {
        self.session().pool.clone()
    }

    pub fn standby(&self) -> Vec<PersonId> {
        self.session().standby.clone()
    }

    pub fn relievers(&self) -> Vec<PersonId> {
        self.session().relievers.clone()
    }

    pub fn plan(&self) -> Option<PlanResult> {
        self.session().plan.clone()
    }

    pub fn params(&self) -> &RotationParams {
        &self.params
    }

    pub fn ledger(&self) -> &Arc<LockLedger> {
        &self.ledger
    }

    /// 最近一次选择的非阻塞警告
    pub fn warnings(&self) -> Vec<WorkflowWarning> {
        self.session().warnings.clone()
    }

    /// 按当前语言渲染的警告
    pub fn localized_warnings(&self) -> Vec<String> {
        self.warnings().iter().map(localize_warning).collect()
    }
}

/// 渲染单条警告
pub fn localize_warning(warning: &WorkflowWarning) -> String {
    match warning {
        WorkflowWarning::StaleDiscarded { group_key } => {
            t_with_args("warning.stale_discarded", &[("group", group_key.as_str())])
        }
        WorkflowWarning::Source(err) => {
            let source = t(&format!("source.{}", err.source_tag().as_str()));
            match err {
                SourceFetchError::Failed { message, .. } => t_with_args(
                    "warning.source_failed",
                    &[("source", source.as_str()), ("message", message.as_str())],
                ),
                SourceFetchError::TimedOut { timeout_ms, .. } => t_with_args(
                    "warning.source_timed_out",
                    &[("source", source.as_str()), ("timeout_ms", timeout_ms.to_string().as_str())],
                ),
                SourceFetchError::Malformed { index, message, .. } => t_with_args(
                    "warning.source_malformed",
                    &[
                        ("source", source.as_str()),
                        ("index", index.to_string().as_str()),
                        ("message", message.as_str()),
                    ],
                ),
            }
        }
    }
}
