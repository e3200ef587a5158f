//! Configuration types.

use std::time::Duration;

/// Planner configuration, passed explicitly into each planning call.
///
/// There is no process-wide toggle anywhere in the crate; whether live
/// candidate generation is used is a plain field here.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Maximum number of onboarding questions per planning cycle.
    pub question_budget: usize,
    /// Minimum score for a question to be admitted.
    pub question_score_threshold: f32,
    /// Maximum free-text questions per session.
    pub free_text_cap: usize,
    /// Maximum quests per day.
    pub max_quest_count: usize,
    /// Minimum viable quests per day (below this, planning fails).
    pub min_quest_count: usize,
    /// Hard cap on a single session, in minutes.
    pub max_session_minutes: u32,
    /// Floor for any single quest, in minutes.
    pub min_quest_minutes: u32,
    /// Timeout for the candidate-source call.
    pub candidate_timeout: Duration,
    /// Whether to call the live candidate source at all. When false the
    /// deterministic template generator is used directly.
    pub use_live_candidates: bool,
    /// Rubric gate thresholds.
    pub rubric: RubricThresholds,
}

/// Thresholds for the self-critique rubric gate.
#[derive(Debug, Clone, Copy)]
pub struct RubricThresholds {
    pub relevance: f32,
    pub feasibility: f32,
    pub specificity: f32,
    pub load_fit: f32,
}

impl Default for RubricThresholds {
    fn default() -> Self {
        Self {
            relevance: 0.85,
            feasibility: 0.80,
            specificity: 0.85,
            load_fit: 1.0,
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            question_budget: 5,
            question_score_threshold: 0.25,
            free_text_cap: 2,
            max_quest_count: 3,
            min_quest_count: 1,
            max_session_minutes: 45,
            min_quest_minutes: 15,
            candidate_timeout: Duration::from_secs(20),
            use_live_candidates: true,
            rubric: RubricThresholds::default(),
        }
    }
}
