//! Planning orchestrator.
//!
//! Sequences question planning, candidate generation, and the policy engine
//! for `plan_day`, and drives the difficulty adjuster plus rollback monitor
//! for `adjust_for_next_cycle`. Both are total from the caller's view: they
//! return a result or a typed planning failure, never an uncaught error.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::adjust::{
    AdjustmentHistory, AdjustmentOutcome, DifficultyAdjuster, DifficultyAdjustment, MonitorReport,
};
use crate::candidates::{CandidateRequest, CandidateSource, fallback, validate_drafts};
use crate::config::PlannerConfig;
use crate::error::PlanningError;
use crate::policy::{PolicyEngine, QuestList, RationaleEntry};
use crate::profile::context::AdjustmentContext;
use crate::profile::model::CompletionRecord;
use crate::profile::{PlanningContext, Profile, SkillAtom};
use crate::questions::{PriorityHints, QuestionPlan, plan_questions};
use crate::quests::Quest;

/// Result of an adjustment cycle.
#[derive(Debug, Clone)]
pub struct AdjustmentReport {
    /// Modified quests and the adjustments behind them.
    pub outcome: AdjustmentOutcome,
    /// Rollbacks and recommendations from the monitoring pass.
    pub monitor: MonitorReport,
    /// Fraction of the user's retained history that is rollbacks.
    pub rollback_rate: f32,
}

/// The planning orchestrator.
///
/// Owns the only persistent mutable state in the core: the bounded per-user
/// adjustment history. Planning cycles for one user are serialized by the
/// caller; the lock here only guards the map across users.
pub struct Planner {
    source: Arc<dyn CandidateSource>,
    engine: PolicyEngine,
    adjuster: DifficultyAdjuster,
    config: PlannerConfig,
    histories: RwLock<HashMap<String, AdjustmentHistory>>,
}

impl Planner {
    pub fn new(source: Arc<dyn CandidateSource>, config: PlannerConfig) -> Self {
        Self {
            source,
            engine: PolicyEngine::new(config.clone()),
            adjuster: DifficultyAdjuster::new(),
            config,
            histories: RwLock::new(HashMap::new()),
        }
    }

    /// Select onboarding questions for the current profile.
    pub fn plan_questions(
        &self,
        goal_text: &str,
        profile: &Profile,
        hints: Option<&PriorityHints>,
    ) -> QuestionPlan {
        plan_questions(goal_text, profile, hints, &self.config)
    }

    /// Plan one day of quests.
    ///
    /// The candidate fetch is the sole suspension point; on failure, timeout,
    /// or unusable output the deterministic template generator takes over, so
    /// the user always receives a valid plan (or a typed
    /// [`PlanningError::InsufficientCandidates`]).
    pub async fn plan_day(
        &self,
        profile: &Profile,
        skill_atoms: &[SkillAtom],
        context: &PlanningContext,
    ) -> Result<QuestList, PlanningError> {
        let (candidates, fallback_reason) = self.gather_candidates(profile, skill_atoms, context).await;

        let mut list = self.engine.apply(
            candidates,
            profile,
            context.day_type,
            context.checkin_delta,
        )?;
        if let Some(reason) = fallback_reason {
            list.rationale
                .insert(0, RationaleEntry::FallbackCandidates { reason });
        }
        info!(
            quests = list.quests.len(),
            total_minutes = list.total_minutes(),
            "Planned day"
        );
        Ok(list)
    }

    /// Fetch candidates from the live source, or fall back to templates.
    async fn gather_candidates(
        &self,
        profile: &Profile,
        skill_atoms: &[SkillAtom],
        context: &PlanningContext,
    ) -> (Vec<Quest>, Option<String>) {
        let template_quests =
            || validate_drafts(fallback::generate_drafts(profile, &self.config));

        if !self.config.use_live_candidates {
            return (template_quests(), Some("live candidates disabled".into()));
        }

        let request = CandidateRequest::daily_quests(
            profile.clone(),
            skill_atoms.to_vec(),
            context.checkins.clone(),
        );
        let fetched = timeout(self.config.candidate_timeout, self.source.fetch(&request)).await;

        let reason = match fetched {
            Ok(Ok(drafts)) => {
                let quests = validate_drafts(drafts);
                if quests.is_empty() {
                    "no usable drafts in candidate response".to_string()
                } else {
                    return (quests, None);
                }
            }
            Ok(Err(e)) => format!("candidate source failed: {e}"),
            Err(_) => format!(
                "candidate source timed out after {:?}",
                self.config.candidate_timeout
            ),
        };

        warn!(
            source = self.source.name(),
            reason, "Falling back to template candidates"
        );
        (template_quests(), Some(reason))
    }

    /// Run the rollback monitor and adjust upcoming quests for one user.
    ///
    /// Always returns a report; a user with no history simply gets an empty
    /// monitoring section.
    pub async fn adjust_for_next_cycle(
        &self,
        user_id: &str,
        upcoming: Vec<Quest>,
        completions: &[CompletionRecord],
        context: &AdjustmentContext,
    ) -> AdjustmentReport {
        let mut histories = self.histories.write().await;
        let history = histories.entry(user_id.to_string()).or_default();

        let monitor = self.adjuster.monitor(history, completions);
        let outcome = self.adjuster.adjust(upcoming, completions, context);
        for adjustment in &outcome.adjustments {
            history.push(adjustment.clone());
        }
        let rollback_rate = history.rollback_rate();

        AdjustmentReport {
            outcome,
            monitor,
            rollback_rate,
        }
    }

    /// Snapshot of a user's retained adjustments (oldest first).
    pub async fn adjustment_history(&self, user_id: &str) -> Vec<DifficultyAdjustment> {
        self.histories
            .read()
            .await
            .get(user_id)
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::adjust::HISTORY_CAP;
    use crate::candidates::QuestDraft;
    use crate::error::CandidateError;
    use crate::profile::DayType;
    use crate::quests::Pattern;

    fn draft(title: &str, pattern: &str, minutes: u32) -> QuestDraft {
        QuestDraft {
            title: title.into(),
            pattern: pattern.into(),
            minutes,
            difficulty: 0.5,
            deliverable: "notes".into(),
            tags: vec!["study".into()],
            steps: vec!["a".into(), "b".into(), "c".into()],
            criteria: vec!["done".into()],
        }
    }

    struct StaticSource {
        drafts: Vec<QuestDraft>,
        calls: AtomicUsize,
    }

    impl StaticSource {
        fn new(drafts: Vec<QuestDraft>) -> Self {
            Self {
                drafts,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CandidateSource for StaticSource {
        fn name(&self) -> &str {
            "static"
        }
        async fn fetch(
            &self,
            _request: &CandidateRequest,
        ) -> Result<Vec<QuestDraft>, CandidateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.drafts.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl CandidateSource for FailingSource {
        fn name(&self) -> &str {
            "failing"
        }
        async fn fetch(
            &self,
            _request: &CandidateRequest,
        ) -> Result<Vec<QuestDraft>, CandidateError> {
            Err(CandidateError::RequestFailed {
                reason: "connection refused".into(),
            })
        }
    }

    struct SlowSource;

    #[async_trait]
    impl CandidateSource for SlowSource {
        fn name(&self) -> &str {
            "slow"
        }
        async fn fetch(
            &self,
            _request: &CandidateRequest,
        ) -> Result<Vec<QuestDraft>, CandidateError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(vec![])
        }
    }

    fn used_fallback(list: &QuestList) -> bool {
        list.rationale
            .iter()
            .any(|e| matches!(e, RationaleEntry::FallbackCandidates { .. }))
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    }

    #[tokio::test]
    async fn plan_day_uses_live_candidates() {
        init_tracing();
        let source = Arc::new(StaticSource::new(vec![
            draft("Read grammar notes", "read_note_q", 25),
            draft("Drill conjugations", "drill_set", 25),
            draft("Build a phrase deck", "flashcards", 25),
        ]));
        let planner = Planner::new(source, PlannerConfig::default());
        let list = planner
            .plan_day(&Profile::default(), &[], &PlanningContext::default())
            .await
            .unwrap();

        assert!(!used_fallback(&list));
        assert!(list.quests.iter().any(|q| q.title == "Read grammar notes"));
    }

    #[tokio::test]
    async fn plan_day_falls_back_on_source_failure() {
        init_tracing();
        let planner = Planner::new(Arc::new(FailingSource), PlannerConfig::default());
        let list = planner
            .plan_day(&Profile::default(), &[], &PlanningContext::default())
            .await
            .unwrap();

        assert!(used_fallback(&list));
        assert!(!list.quests.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn plan_day_falls_back_on_timeout() {
        let planner = Planner::new(Arc::new(SlowSource), PlannerConfig::default());
        let list = planner
            .plan_day(&Profile::default(), &[], &PlanningContext::default())
            .await
            .unwrap();

        assert!(used_fallback(&list));
        assert!(!list.quests.is_empty());
    }

    #[tokio::test]
    async fn plan_day_falls_back_when_all_drafts_invalid() {
        let source = Arc::new(StaticSource::new(vec![
            draft("Mystery", "interpretive_dance", 25),
            draft("", "flashcards", 25),
        ]));
        let planner = Planner::new(source, PlannerConfig::default());
        let list = planner
            .plan_day(&Profile::default(), &[], &PlanningContext::default())
            .await
            .unwrap();
        assert!(used_fallback(&list));
    }

    #[tokio::test]
    async fn offline_mode_never_calls_the_source() {
        let source = Arc::new(StaticSource::new(vec![draft("x", "flashcards", 20)]));
        let config = PlannerConfig {
            use_live_candidates: false,
            ..Default::default()
        };
        let planner = Planner::new(source.clone(), config);
        let list = planner
            .plan_day(&Profile::default(), &[], &PlanningContext::default())
            .await
            .unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        assert!(used_fallback(&list));
    }

    #[tokio::test]
    async fn planned_day_satisfies_budget_invariants() {
        let source = Arc::new(StaticSource::new(vec![
            draft("a", "read_note_q", 45),
            draft("b", "drill_set", 45),
            draft("c", "flashcards", 45),
            draft("d", "build_micro", 45),
        ]));
        let planner = Planner::new(source, PlannerConfig::default());
        let context = PlanningContext {
            day_type: Some(DayType::Busy),
            checkin_delta: 0,
            checkins: vec![],
        };
        let list = planner
            .plan_day(&Profile::default(), &[], &context)
            .await
            .unwrap();

        assert!(list.total_minutes() <= list.constraints.total_minutes_max);
        assert!(
            list.quests
                .iter()
                .all(|q| q.minutes <= list.constraints.max_session_minutes)
        );
    }

    #[tokio::test]
    async fn adjustment_history_is_per_user_and_capped() {
        let planner = Planner::new(Arc::new(FailingSource), PlannerConfig::default());
        let quests: Vec<Quest> = (0..(HISTORY_CAP + 5))
            .map(|i| Quest::new(format!("q{i}"), Pattern::DrillSet, 30, 0.5, "d"))
            .collect();

        let report = planner
            .adjust_for_next_cycle("alice", quests, &[], &AdjustmentContext::default())
            .await;
        assert_eq!(report.outcome.adjustments.len(), HISTORY_CAP + 5);

        let history = planner.adjustment_history("alice").await;
        assert_eq!(history.len(), HISTORY_CAP);
        assert!(planner.adjustment_history("bob").await.is_empty());
    }

    #[tokio::test]
    async fn rollbacks_flow_through_the_report() {
        let planner = Planner::new(Arc::new(FailingSource), PlannerConfig::default());

        // Cycle 1: a hot streak drives an increase.
        let streak: Vec<CompletionRecord> = (0..7)
            .map(|_| CompletionRecord::new(Pattern::DrillSet, true))
            .collect();
        let quest = Quest::new("drill", Pattern::DrillSet, 30, 0.5, "sheet");
        let first = planner
            .adjust_for_next_cycle("carol", vec![quest], &streak, &AdjustmentContext::default())
            .await;
        assert_eq!(
            first.outcome.adjustments[0].kind,
            crate::adjust::AdjustmentKind::Increase
        );

        // Cycle 2: three failures after the increase trigger its rollback.
        let mut outcomes = streak;
        outcomes.extend((0..3).map(|_| CompletionRecord::new(Pattern::DrillSet, false)));
        let second = planner
            .adjust_for_next_cycle("carol", vec![], &outcomes, &AdjustmentContext::default())
            .await;

        assert_eq!(second.monitor.rollbacks.len(), 1);
        assert!(second.rollback_rate > 0.0);
        let history = planner.adjustment_history("carol").await;
        assert!(history.iter().any(|a| a.is_rollback()));
    }
}
