// ==========================================
// 轮换工作流集成测试
// ==========================================
// 场景: 选择船组 → 聚合候选 → 生成方案 → 锁定/冲突/解锁
// ==========================================


use crew_rotation::api::{ApiError, SelectionOutcome, WorkflowWarning};
use crew_rotation::config::RotationSettings;
use crew_rotation::domain::{SourceTag, WorkflowPhase};
use crew_rotation::engine::{LockLedger, SourceFetchError};
use crew_rotation::RotationWorkflow;
use serde_json::json;
use std::sync::Arc;
use test_helpers::*;

fn standard_feed() -> MockFeed {
    MockFeed::default()
        .with_existing(vec![
            person("X", &["S1", "S9"]),
            person("Y", &["S1", "S2"]),
        ])
        .with_potential(vec![person("P1", &["S2"]), person("P2", &["S1"])])
        .with_eligible(vec![
            json!({ "nrp": "P1" }),
            json!({ "nrp": "E1", "riwayat": ["CUTI", "KM Kelud"] }),
            json!({ "nrp": "X" }),
        ])
}

// ==========================================
// 候选聚合
// ==========================================

#[tokio::test]
async fn test_candidates_ordered_by_match_count_and_source() {
    let wf = workflow_with(
        Arc::new(standard_feed()),
        Arc::new(MockPlanner::echo()),
        Arc::new(LockLedger::in_memory()),
    );

    let phase = wf.select_group_and_load(group("G1", &["S1", "S2"])).await.unwrap();
    assert_eq!(phase, WorkflowPhase::CandidatesReady);

    let pool = wf.pool().unwrap();
    let ids: Vec<&str> = pool.candidates.iter().map(|c| c.person_id.as_str()).collect();
    // P2 不在资格名册中
    assert_eq!(ids, vec!["Y", "X", "P1", "E1"]);
    assert_eq!(pool.get("Y").unwrap().match_count, 2);
    assert_eq!(pool.get("X").unwrap().match_count, 1);
    assert_eq!(pool.get("X").unwrap().source_tag, SourceTag::Existing);
    assert_eq!(pool.get("E1").unwrap().history, vec!["KM Kelud"]);
    assert!(wf.warnings().is_empty());
}

#[tokio::test]
async fn test_failed_source_is_non_blocking() {
    let feed = standard_feed().failing_existing("HTTP 502");
    let wf = workflow_with(
        Arc::new(feed),
        Arc::new(MockPlanner::echo()),
        Arc::new(LockLedger::in_memory()),
    );

    let phase = wf.select_group_and_load(group("G1", &["S1", "S2"])).await.unwrap();
    assert_eq!(phase, WorkflowPhase::CandidatesReady);

    let pool = wf.pool().unwrap();
    assert!(!pool.contains("Y"));
    assert!(pool.contains("P1"));
    assert!(pool.contains("E1"));

    let warnings = wf.warnings();
    assert_eq!(warnings.len(), 1);
    match &warnings[0] {
        WorkflowWarning::Source(SourceFetchError::Failed { source_tag, message }) => {
            assert_eq!(*source_tag, SourceTag::Existing);
            assert!(message.contains("502"));
        }
        other => panic!("Expected source failure, got {:?}", other),
    }
    assert_eq!(wf.localized_warnings().len(), 1);
}

#[tokio::test]
async fn test_slow_source_times_out_without_stalling_others() {
    let feed = standard_feed().slow_eligible(2_000);
    let mut settings = RotationSettings::default();
    settings.aggregation.source_fetch_timeout_ms = 50;
    let wf = RotationWorkflow::new(
        Arc::new(feed),
        Arc::new(MockPlanner::echo()),
        Arc::new(LockLedger::in_memory()),
        settings,
    );

    wf.select_group_and_load(group("G1", &["S1", "S2"])).await.unwrap();

    let pool = wf.pool().unwrap();
    // 资格名册超时: 潜在晋升无法确认资格，贡献为空
    let ids: Vec<&str> = pool.candidates.iter().map(|c| c.person_id.as_str()).collect();
    assert_eq!(ids, vec!["Y", "X"]);
    assert!(matches!(
        wf.warnings()[0],
        WorkflowWarning::Source(SourceFetchError::TimedOut { source_tag: SourceTag::Eligible, .. })
    ));
}

#[tokio::test]
async fn test_auto_standby_seeded_from_last_status() {
    let feed = MockFeed::default().with_existing(vec![
        json!({ "nrp": "A", "vessels": ["S1"], "lokasi_terakhir": "Standby Darat" }),
        json!({ "nrp": "B", "vessels": ["S1"], "lokasi_terakhir": "KM Kelud" }),
    ]);
    let wf = workflow_with(
        Arc::new(feed),
        Arc::new(MockPlanner::echo()),
        Arc::new(LockLedger::in_memory()),
    );

    wf.select_group_and_load(group("G1", &["S1"])).await.unwrap();
    assert_eq!(wf.standby(), vec!["A"]);

    // 人工追加的待命不受影响
    assert!(wf.toggle_standby("B").unwrap());
    assert_eq!(wf.standby(), vec!["A", "B"]);
}

// ==========================================
// 选择切换与过期结果
// ==========================================

#[tokio::test]
async fn test_stale_aggregation_is_discarded() {
    let feed = Arc::new(standard_feed().slow_for_ship("S1", 200));
    let wf = Arc::new(workflow_with(
        feed,
        Arc::new(MockPlanner::echo()),
        Arc::new(LockLedger::in_memory()),
    ));

    let slow_ticket = match wf.select_group(group("G1", &["S1", "S2"])).unwrap() {
        SelectionOutcome::Pending(t) => t,
        other => panic!("Expected Pending, got {:?}", other),
    };

    let slow = {
        let wf = Arc::clone(&wf);
        let ticket = slow_ticket.clone();
        tokio::spawn(async move {
            let outcome = wf.load_candidates(&ticket).await;
            wf.complete_selection(&ticket, outcome).unwrap()
        })
    };

    // 慢请求尚未返回时切换到 G2
    let phase = wf.select_group_and_load(group("G2", &["S7"])).await.unwrap();
    assert_eq!(phase, WorkflowPhase::CandidatesReady);

    let adopted = slow.await.unwrap();
    assert!(!adopted);
    assert!(slow_ticket.is_cancelled());

    assert_eq!(wf.group_key().as_deref(), Some("G2"));
    let pool = wf.pool().unwrap();
    assert_eq!(pool.group_key, "G2");
    assert!(pool.candidates.iter().all(|c| c.match_count == 0));
    assert!(wf
        .warnings()
        .contains(&WorkflowWarning::StaleDiscarded { group_key: "G1".to_string() }));
}

#[tokio::test]
async fn test_reselecting_resets_selections() {
    let wf = workflow_with(
        Arc::new(standard_feed()),
        Arc::new(MockPlanner::echo()),
        Arc::new(LockLedger::in_memory()),
    );

    wf.select_group_and_load(group("G1", &["S1", "S2"])).await.unwrap();
    wf.set_standby(&["Y".to_string()]).unwrap();
    wf.set_relievers(&["X".to_string()]).unwrap();

    wf.select_group_and_load(group("G3", &["S1"])).await.unwrap();
    assert!(wf.standby().is_empty());
    assert!(wf.relievers().is_empty());
}

// ==========================================
// 方案生成
// ==========================================

#[tokio::test]
async fn test_generate_plan_rejects_empty_standby() {
    let planner = Arc::new(MockPlanner::echo());
    let wf = workflow_with(
        Arc::new(standard_feed()),
        Arc::clone(&planner),
        Arc::new(LockLedger::in_memory()),
    );
    wf.select_group_and_load(group("G1", &["S1", "S2"])).await.unwrap();
    assert!(wf.standby().is_empty());

    let err = wf.generate_plan().await.unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));
    assert_eq!(wf.phase(), WorkflowPhase::CandidatesReady);
    assert_eq!(planner.request_count(), 0);
}

#[tokio::test]
async fn test_generate_plan_annotates_first_rotation() {
    let planner = Arc::new(MockPlanner::echo());
    let wf = workflow_with(
        Arc::new(standard_feed()),
        Arc::clone(&planner),
        Arc::new(LockLedger::in_memory()),
    );
    wf.select_group_and_load(group("G1", &["S1", "S2"])).await.unwrap();
    wf.set_standby(&["Y".to_string(), "X".to_string()]).unwrap();
    wf.set_relievers(&["E1".to_string()]).unwrap();

    let plan = wf.generate_plan().await.unwrap();
    assert_eq!(wf.phase(), WorkflowPhase::PlanGenerated);

    let rows = &plan.schedule.rows;
    assert_eq!(rows[0]["first_rotation_date"], json!("09-2025"));
    assert_eq!(rows[1]["first_rotation_date"], json!("03-2025"));
    assert_eq!(rows[2]["first_rotation_date"], json!("-"));
    assert_eq!(
        plan.schedule.columns.iter().filter(|c| *c == "first_rotation_date").count(),
        1
    );

    let requests = planner.requests.lock().unwrap();
    assert_eq!(requests[0].group_key, "G1");
    assert_eq!(requests[0].standby, vec!["Y", "X"]);
    assert_eq!(requests[0].reliever, vec!["E1"]);
}

#[tokio::test]
async fn test_planner_error_surfaced_verbatim() {
    let wf = workflow_with(
        Arc::new(standard_feed()),
        Arc::new(MockPlanner::rejecting("Kapal S2 tidak memiliki jadwal")),
        Arc::new(LockLedger::in_memory()),
    );
    wf.select_group_and_load(group("G1", &["S1", "S2"])).await.unwrap();
    wf.set_standby(&["Y".to_string()]).unwrap();

    let err = wf.generate_plan().await.unwrap_err();
    assert!(matches!(err, ApiError::PlanGenerationError(_)));
    assert_eq!(err.to_string(), "Kapal S2 tidak memiliki jadwal");
    assert_eq!(wf.phase(), WorkflowPhase::CandidatesReady);
    assert!(wf.plan().is_none());
}

#[tokio::test]
async fn test_plan_arriving_after_reselection_is_discarded() {
    let wf = Arc::new(workflow_with(
        Arc::new(standard_feed()),
        Arc::new(MockPlanner::echo().with_delay(200)),
        Arc::new(LockLedger::in_memory()),
    ));
    wf.select_group_and_load(group("G1", &["S1", "S2"])).await.unwrap();
    wf.set_standby(&["Y".to_string()]).unwrap();

    let pending = {
        let wf = Arc::clone(&wf);
        tokio::spawn(async move { wf.generate_plan().await })
    };
    // 让方案请求先发出
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let outcome = wf.select_group(group("G2", &["S7"])).unwrap();
    assert!(matches!(outcome, SelectionOutcome::Pending(_)));

    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, ApiError::InvalidStateTransition { .. }));
    assert!(wf.plan().is_none());
    assert_eq!(wf.phase(), WorkflowPhase::GroupSelected);
    assert_eq!(wf.group_key().as_deref(), Some("G2"));
}

#[tokio::test]
async fn test_planner_transport_failure_keeps_state() {
    let wf = workflow_with(
        Arc::new(standard_feed()),
        Arc::new(MockPlanner::unreachable("connection reset")),
        Arc::new(LockLedger::in_memory()),
    );
    wf.select_group_and_load(group("G1", &["S1", "S2"])).await.unwrap();
    wf.set_standby(&["Y".to_string()]).unwrap();

    let err = wf.generate_plan().await.unwrap_err();
    assert_eq!(err.to_string(), "connection reset");
    assert_eq!(wf.phase(), WorkflowPhase::CandidatesReady);
}

// ==========================================
// 锁定
// ==========================================

#[tokio::test]
async fn test_lock_conflict_keeps_generated_plan() {
    let ledger = Arc::new(LockLedger::in_memory());
    let feed = Arc::new(standard_feed());

    let wf1 = workflow_with(Arc::clone(&feed), Arc::new(MockPlanner::echo()), Arc::clone(&ledger));
    wf1.select_group_and_load(group("G1", &["S1", "S2"])).await.unwrap();
    wf1.set_standby(&["Y".to_string()]).unwrap();
    wf1.generate_plan().await.unwrap();

    // 第二个会话在 G1 锁定前为 G2 选择了同一人员
    let wf2 = workflow_with(Arc::clone(&feed), Arc::new(MockPlanner::echo()), Arc::clone(&ledger));
    wf2.select_group_and_load(group("G2", &["S1"])).await.unwrap();
    wf2.set_standby(&["Y".to_string()]).unwrap();
    wf2.generate_plan().await.unwrap();

    wf1.lock().unwrap();
    assert_eq!(wf1.phase(), WorkflowPhase::Locked);

    let err = wf2.lock().unwrap_err();
    match err {
        ApiError::LockConflict {
            group_key,
            conflicting_group_key,
            person_ids,
        } => {
            assert_eq!(group_key, "G2");
            assert_eq!(conflicting_group_key, "G1");
            assert_eq!(person_ids, vec!["Y"]);
        }
        other => panic!("Expected LockConflict, got {:?}", other),
    }
    assert_eq!(wf2.phase(), WorkflowPhase::PlanGenerated);
    assert!(wf2.plan().is_some());
    assert!(!ledger.is_locked("G2"));
    assert_eq!(ledger.lock_owner("Y").as_deref(), Some("G1"));
}

#[tokio::test]
async fn test_locked_persons_hidden_from_other_groups() {
    let ledger = Arc::new(LockLedger::in_memory());
    let feed = Arc::new(standard_feed());

    let wf = workflow_with(Arc::clone(&feed), Arc::new(MockPlanner::echo()), Arc::clone(&ledger));
    wf.select_group_and_load(group("G1", &["S1", "S2"])).await.unwrap();
    wf.set_standby(&["Y".to_string()]).unwrap();
    wf.set_relievers(&["P1".to_string()]).unwrap();
    wf.generate_plan().await.unwrap();
    let entry = wf.lock().unwrap();
    assert_eq!(entry.person_ids.len(), 2);

    wf.select_group_and_load(group("G2", &["S1", "S2"])).await.unwrap();
    let pool = wf.pool().unwrap();
    assert!(!pool.contains("Y"));
    assert!(!pool.contains("P1"));
    assert!(pool.contains("X"));
}

#[tokio::test]
async fn test_selecting_locked_group_skips_to_locked() {
    let ledger = Arc::new(LockLedger::in_memory());
    let feed = Arc::new(standard_feed());

    let wf = workflow_with(Arc::clone(&feed), Arc::new(MockPlanner::echo()), Arc::clone(&ledger));
    wf.select_group_and_load(group("G1", &["S1", "S2"])).await.unwrap();
    wf.set_standby(&["Y".to_string()]).unwrap();
    wf.generate_plan().await.unwrap();
    wf.lock().unwrap();

    let calls_before = feed.calls.lock().unwrap().len();
    let outcome = wf.select_group(group("G1", &["S1", "S2"])).unwrap();
    let plan = match outcome {
        SelectionOutcome::Locked(plan) => plan,
        other => panic!("Expected Locked, got {:?}", other),
    };
    assert_eq!(wf.phase(), WorkflowPhase::Locked);
    assert_eq!(plan.schedule.rows[0]["first_rotation_date"], json!("09-2025"));
    assert_eq!(feed.calls.lock().unwrap().len(), calls_before);

    // 直接进入 Locked 没有候选池，解锁后需要重新加载
    let phase = wf.unlock_and_reload().await.unwrap();
    assert_eq!(phase, WorkflowPhase::CandidatesReady);
    assert!(!ledger.is_locked("G1"));
    assert!(wf.pool().unwrap().contains("Y"));
}

#[tokio::test]
async fn test_unlock_returns_to_candidates_ready() {
    let ledger = Arc::new(LockLedger::in_memory());
    let wf = workflow_with(
        Arc::new(standard_feed()),
        Arc::new(MockPlanner::echo()),
        Arc::clone(&ledger),
    );
    wf.select_group_and_load(group("G1", &["S1", "S2"])).await.unwrap();
    wf.set_standby(&["Y".to_string()]).unwrap();
    wf.generate_plan().await.unwrap();
    wf.lock().unwrap();

    assert!(wf.unlock().unwrap().is_none());
    assert_eq!(wf.phase(), WorkflowPhase::CandidatesReady);
    assert!(wf.plan().is_none());
    assert_eq!(wf.standby(), vec!["Y"]);

    // 解锁后不能再次解锁
    assert!(matches!(
        wf.unlock(),
        Err(ApiError::InvalidStateTransition { .. })
    ));
}

#[tokio::test]
async fn test_unlock_and_reload_keeps_existing_pool() {
    let feed = Arc::new(standard_feed());
    let wf = workflow_with(
        Arc::clone(&feed),
        Arc::new(MockPlanner::echo()),
        Arc::new(LockLedger::in_memory()),
    );
    wf.select_group_and_load(group("G1", &["S1", "S2"])).await.unwrap();
    wf.set_standby(&["Y".to_string()]).unwrap();
    wf.generate_plan().await.unwrap();
    wf.lock().unwrap();

    let calls_before = feed.calls.lock().unwrap().len();
    let phase = wf.unlock_and_reload().await.unwrap();
    assert_eq!(phase, WorkflowPhase::CandidatesReady);
    assert_eq!(feed.calls.lock().unwrap().len(), calls_before);
    assert_eq!(wf.standby(), vec!["Y"]);
    assert!(wf.plan().is_none());
}
