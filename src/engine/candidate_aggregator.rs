// ==========================================
// 船员轮换系统 - 候选聚合引擎
// ==========================================
// 职责: 三个候选来源 → 去重、按匹配度排序、截取上限的候选池
// 输入: 原始来源载荷 + 船组船名 + 其他船组已锁定人员
// 输出: CandidatePool + 非致命来源警告
// 红线: 已锁定到其他船组的人员不得进入候选池
// ==========================================
// 合并顺序: 历史任职 → 潜在晋升(未出现) → 资格名册(均未出现)
// ==========================================

use crate::config::settings::AggregationSettings;
use crate::domain::candidate::{CandidatePool, CandidateRecord};
use crate::domain::types::{PersonId, SourceTag};
use crate::domain::vessel_group::VesselGroup;
use crate::engine::error::SourceFetchError;
use crate::engine::month_normalizer::MonthNormalizer;
use crate::engine::ports::CandidateFeed;
use crate::importer::error::ImportError;
use crate::importer::field_mapper::FieldMapper;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// 单个来源的拉取结果
pub type SourceFetch = Result<Vec<Value>, SourceFetchError>;

/// 三个来源的原始拉取结果
#[derive(Debug, Clone)]
pub struct RawSources {
    pub existing: SourceFetch,
    pub potential: SourceFetch,
    pub eligible: SourceFetch,
}

impl RawSources {
    pub fn new(existing: Vec<Value>, potential: Vec<Value>, eligible: Vec<Value>) -> Self {
        Self {
            existing: Ok(existing),
            potential: Ok(potential),
            eligible: Ok(eligible),
        }
    }
}

/// 聚合结果
#[derive(Debug, Clone, Default)]
pub struct AggregationOutcome {
    pub pool: CandidatePool,
    /// 非致命警告（来源失败/超时/记录格式错误）
    pub warnings: Vec<SourceFetchError>,
}

// ==========================================
// CandidateAggregator - 纯计算核心
// ==========================================
pub struct CandidateAggregator;

impl CandidateAggregator {
    /// 聚合三个来源
    ///
    /// # 参数
    /// - group: 当前船组
    /// - sources: 原始来源结果（失败来源贡献为空）
    /// - locked_elsewhere: 已锁定到其他船组的人员（不含当前船组）
    /// - settings: 聚合配置
    pub fn aggregate(
        group: &VesselGroup,
        sources: RawSources,
        locked_elsewhere: &HashSet<PersonId>,
        settings: &AggregationSettings,
    ) -> AggregationOutcome {
        let mut warnings = Vec::new();

        let existing = Self::map_source(sources.existing, SourceTag::Existing, &mut warnings);
        let potential = Self::map_source(sources.potential, SourceTag::Potential, &mut warnings);
        let eligible = Self::map_source(sources.eligible, SourceTag::Eligible, &mut warnings);

        // 步骤 1: 历史任职
        let existing = Self::rank_and_cap(
            Self::score(existing, group),
            locked_elsewhere,
            settings.candidate_cap,
        );

        // 步骤 2: 潜在晋升，仅保留资格名册中的人员
        let roster: HashSet<&str> = eligible.iter().map(|c| c.person_id.as_str()).collect();
        let potential: Vec<CandidateRecord> = Self::score(potential, group)
            .into_iter()
            .filter(|c| roster.contains(c.person_id.as_str()))
            .collect();
        let potential = Self::rank_and_cap(potential, locked_elsewhere, settings.candidate_cap);

        // 步骤 3: 资格名册，剔除非轮换历史标记
        let eligible: Vec<CandidateRecord> = eligible
            .into_iter()
            .filter(|c| !locked_elsewhere.contains(&c.person_id))
            .map(|c| Self::strip_history(c, &settings.excluded_history_tokens))
            .collect();

        // 步骤 4: 按优先级合并
        let candidates = Self::merge(vec![existing, potential, eligible]);

        // 步骤 5: 自动待命
        let auto_standby = Self::auto_standby(&candidates, &settings.standby_status_marker);

        debug!(
            group_key = %group.group_key,
            candidate_count = candidates.len(),
            auto_standby = auto_standby.len(),
            warning_count = warnings.len(),
            "候选聚合完成"
        );

        AggregationOutcome {
            pool: CandidatePool {
                group_key: group.group_key.clone(),
                candidates,
                auto_standby,
            },
            warnings,
        }
    }

    /// 映射来源载荷；失败来源记录警告并贡献为空
    fn map_source(
        fetch: SourceFetch,
        source_tag: SourceTag,
        warnings: &mut Vec<SourceFetchError>,
    ) -> Vec<CandidateRecord> {
        let raws = match fetch {
            Ok(raws) => raws,
            Err(e) => {
                warnings.push(e);
                return Vec::new();
            }
        };

        let (records, errors) = FieldMapper::map_batch(&raws, source_tag);
        for error in errors {
            let index = match &error {
                ImportError::NotAnObject(i)
                | ImportError::PrimaryKeyMissing(i)
                | ImportError::FieldFormatError { index: i, .. } => *i,
                _ => 0,
            };
            warn!(source = %source_tag, index, error = %error, "候选记录格式错误，已跳过");
            warnings.push(SourceFetchError::Malformed {
                source_tag,
                index,
                message: error.to_string(),
            });
        }

        // 同一来源内重复人员，保留首次出现
        let mut seen = HashSet::new();
        records
            .into_iter()
            .filter(|c| seen.insert(c.person_id.clone()))
            .collect()
    }

    /// 计算船舶重合数
    ///
    /// 无船舶列表的记录保留来源自带的匹配数
    fn score(records: Vec<CandidateRecord>, group: &VesselGroup) -> Vec<CandidateRecord> {
        records
            .into_iter()
            .map(|mut c| {
                if !c.vessels.is_empty() {
                    let mut matched: Vec<String> = Vec::new();
                    for vessel in &c.vessels {
                        let key = vessel.trim().to_uppercase();
                        if group.contains_ship(vessel) && !matched.contains(&key) {
                            matched.push(key);
                        }
                    }
                    c.match_count = matched.len() as u32;
                }
                c
            })
            .collect()
    }

    /// 锁定过滤 → 按匹配数降序（稳定排序）→ 截取上限
    fn rank_and_cap(
        records: Vec<CandidateRecord>,
        locked_elsewhere: &HashSet<PersonId>,
        cap: usize,
    ) -> Vec<CandidateRecord> {
        let mut kept: Vec<CandidateRecord> = records
            .into_iter()
            .filter(|c| !locked_elsewhere.contains(&c.person_id))
            .collect();
        kept.sort_by(|a, b| b.match_count.cmp(&a.match_count));
        kept.truncate(cap);
        kept
    }

    fn strip_history(mut record: CandidateRecord, excluded: &[String]) -> CandidateRecord {
        record.history.retain(|entry| {
            let token = MonthNormalizer::normalize_token(entry);
            !excluded
                .iter()
                .any(|ex| MonthNormalizer::normalize_token(ex) == token)
        });
        record
    }

    /// 按来源顺序合并，人员唯一，先出现者保留
    pub fn merge(pools: Vec<Vec<CandidateRecord>>) -> Vec<CandidateRecord> {
        let mut seen: HashSet<PersonId> = HashSet::new();
        let mut merged = Vec::new();
        for pool in pools {
            for candidate in pool {
                if seen.insert(candidate.person_id.clone()) {
                    merged.push(candidate);
                }
            }
        }
        merged
    }

    /// 历史任职来源中最近状态为岸上待命的人员
    fn auto_standby(candidates: &[CandidateRecord], marker: &str) -> Vec<PersonId> {
        let marker = MonthNormalizer::normalize_token(marker);
        candidates
            .iter()
            .filter(|c| c.source_tag == SourceTag::Existing)
            .filter(|c| {
                c.last_status
                    .as_deref()
                    .map(|s| MonthNormalizer::normalize_token(s) == marker)
                    .unwrap_or(false)
            })
            .map(|c| c.person_id.clone())
            .collect()
    }
}

// ==========================================
// CandidateLoader - 并发拉取三个来源
// ==========================================
pub struct CandidateLoader<F>
where
    F: CandidateFeed + ?Sized,
{
    feed: Arc<F>,
}

impl<F> CandidateLoader<F>
where
    F: CandidateFeed + ?Sized,
{
    pub fn new(feed: Arc<F>) -> Self {
        Self { feed }
    }

    /// 并发拉取三个来源，每个来源独立超时
    ///
    /// 任一来源失败/超时不阻塞其他来源
    #[instrument(skip(self, group), fields(group_key = %group.group_key))]
    pub async fn fetch_sources(&self, job: &str, group: &VesselGroup, timeout_ms: u64) -> RawSources {
        let timeout = Duration::from_millis(timeout_ms);
        let ships = group.ship_names.as_slice();

        let (existing, potential, eligible) = futures::future::join3(
            tokio::time::timeout(timeout, self.feed.fetch_existing(job, ships)),
            tokio::time::timeout(timeout, self.feed.fetch_potential(job, ships)),
            tokio::time::timeout(timeout, self.feed.fetch_eligible(job)),
        )
        .await;

        let sources = RawSources {
            existing: Self::settle(existing, SourceTag::Existing, timeout_ms),
            potential: Self::settle(potential, SourceTag::Potential, timeout_ms),
            eligible: Self::settle(eligible, SourceTag::Eligible, timeout_ms),
        };

        for err in [&sources.existing, &sources.potential, &sources.eligible]
            .into_iter()
            .filter_map(|r| Result::as_ref(r).err())
        {
            warn!(source = %err.source_tag(), error = %err, "候选来源不可用，按空结果处理");
        }

        sources
    }

    /// 拉取并聚合
    #[instrument(skip(self, group, locked_elsewhere, settings), fields(group_key = %group.group_key))]
    pub async fn load(
        &self,
        job: &str,
        group: &VesselGroup,
        locked_elsewhere: &HashSet<PersonId>,
        settings: &AggregationSettings,
    ) -> AggregationOutcome {
        let sources = self
            .fetch_sources(job, group, settings.source_fetch_timeout_ms)
            .await;
        let outcome = CandidateAggregator::aggregate(group, sources, locked_elsewhere, settings);
        info!(
            candidate_count = outcome.pool.len(),
            warning_count = outcome.warnings.len(),
            "候选加载完成"
        );
        outcome
    }

    fn settle(
        result: Result<Result<Vec<Value>, crate::engine::ports::CollaboratorError>, tokio::time::error::Elapsed>,
        source_tag: SourceTag,
        timeout_ms: u64,
    ) -> SourceFetch {
        match result {
            Ok(Ok(raws)) => Ok(raws),
            Ok(Err(e)) => Err(SourceFetchError::Failed {
                source_tag,
                message: e.to_string(),
            }),
            Err(_) => Err(SourceFetchError::TimedOut {
                source_tag,
                timeout_ms,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn group() -> VesselGroup {
        VesselGroup::new("G1", ["S1", "S2"])
    }

    fn ids(pool: &CandidatePool) -> Vec<&str> {
        pool.candidates.iter().map(|c| c.person_id.as_str()).collect()
    }

    #[test]
    fn test_existing_ranked_by_match_count() {
        let sources = RawSources::new(
            vec![
                json!({ "nrp": "X", "vesselList": ["S1", "S9"] }),
                json!({ "nrp": "Y", "vesselList": ["S1", "S2"] }),
            ],
            vec![],
            vec![],
        );
        let outcome = CandidateAggregator::aggregate(
            &group(),
            sources,
            &HashSet::new(),
            &AggregationSettings::default(),
        );
        assert_eq!(ids(&outcome.pool), vec!["Y", "X"]);
        assert_eq!(outcome.pool.get("Y").map(|c| c.match_count), Some(2));
        assert_eq!(outcome.pool.get("X").map(|c| c.match_count), Some(1));
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_merge_priority_and_uniqueness() {
        let sources = RawSources::new(
            vec![json!({ "nrp": "A", "vessels": ["S1"] })],
            vec![
                json!({ "nrp": "A", "vessels": ["S1", "S2"] }),
                json!({ "nrp": "B", "vessels": ["S2"] }),
                json!({ "nrp": "Z", "vessels": ["S1", "S2"] }),
            ],
            vec![json!({ "nrp": "B" }), json!({ "nrp": "C" }), json!({ "nrp": "A" })],
        );
        let outcome = CandidateAggregator::aggregate(
            &group(),
            sources,
            &HashSet::new(),
            &AggregationSettings::default(),
        );
        // Z 不在资格名册中
        assert_eq!(ids(&outcome.pool), vec!["A", "B", "C"]);
        assert_eq!(outcome.pool.candidates[0].source_tag, SourceTag::Existing);
        assert_eq!(outcome.pool.candidates[1].source_tag, SourceTag::Potential);
        assert_eq!(outcome.pool.candidates[2].source_tag, SourceTag::Eligible);
    }

    #[test]
    fn test_locked_elsewhere_excluded_before_cap() {
        let existing: Vec<Value> = (0..12)
            .map(|i| json!({ "nrp": format!("P{:02}", i), "vessels": ["S1"] }))
            .collect();
        let locked: HashSet<PersonId> = ["P00".to_string(), "P01".to_string()].into_iter().collect();
        let outcome = CandidateAggregator::aggregate(
            &group(),
            RawSources::new(existing, vec![], vec![json!({ "nrp": "P00" })]),
            &locked,
            &AggregationSettings::default(),
        );
        assert_eq!(outcome.pool.len(), 10);
        assert!(!outcome.pool.contains("P00"));
        assert!(!outcome.pool.contains("P01"));
        assert!(outcome.pool.contains("P11"));
    }

    #[test]
    fn test_failed_source_does_not_block_others() {
        let sources = RawSources {
            existing: Err(SourceFetchError::Failed {
                source_tag: SourceTag::Existing,
                message: "503".to_string(),
            }),
            potential: Ok(vec![]),
            eligible: Ok(vec![json!({ "nrp": "E1" })]),
        };
        let outcome = CandidateAggregator::aggregate(
            &group(),
            sources,
            &HashSet::new(),
            &AggregationSettings::default(),
        );
        assert_eq!(ids(&outcome.pool), vec!["E1"]);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].source_tag(), SourceTag::Existing);
    }

    #[test]
    fn test_eligible_history_stripped() {
        let sources = RawSources::new(
            vec![],
            vec![],
            vec![json!({ "nrp": "E1", "history": ["cuti", "KM Kelud", " Off "] })],
        );
        let outcome = CandidateAggregator::aggregate(
            &group(),
            sources,
            &HashSet::new(),
            &AggregationSettings::default(),
        );
        assert_eq!(outcome.pool.candidates[0].history, vec!["KM Kelud"]);
        assert_eq!(outcome.pool.candidates[0].match_count, 0);
    }

    #[test]
    fn test_auto_standby_from_last_status() {
        let sources = RawSources::new(
            vec![
                json!({ "nrp": "A", "last_status": "standby  darat" }),
                json!({ "nrp": "B", "last_status": "ONBOARD" }),
            ],
            vec![],
            vec![],
        );
        let outcome = CandidateAggregator::aggregate(
            &group(),
            sources,
            &HashSet::new(),
            &AggregationSettings::default(),
        );
        assert_eq!(outcome.pool.auto_standby, vec!["A"]);
    }

    #[test]
    fn test_malformed_record_recorded_as_warning() {
        let sources = RawSources::new(vec![json!({ "name": "tanpa id" }), json!({ "nrp": "A" })], vec![], vec![]);
        let outcome = CandidateAggregator::aggregate(
            &group(),
            sources,
            &HashSet::new(),
            &AggregationSettings::default(),
        );
        assert_eq!(ids(&outcome.pool), vec!["A"]);
        assert!(matches!(
            outcome.warnings[0],
            SourceFetchError::Malformed { index: 0, .. }
        ));
    }

    // 捕获日志输出
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_malformed_record_logged_at_warn() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();

        let sources = RawSources::new(vec![], vec![json!({ "nama": "tanpa id" })], vec![]);
        let outcome = tracing::subscriber::with_default(subscriber, || {
            CandidateAggregator::aggregate(
                &group(),
                sources,
                &HashSet::new(),
                &AggregationSettings::default(),
            )
        });
        assert_eq!(outcome.warnings.len(), 1);

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"));
        assert!(output.contains("source=POTENTIAL"));
        assert!(output.contains("index=0"));
    }
}
