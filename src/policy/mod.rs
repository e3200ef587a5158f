//! Constraint/policy engine — turns raw candidate quests into a validated,
//! budget-fitting, pattern-diverse day plan with a rationale trace.

pub mod budget;
pub mod engine;
pub mod rubric;
pub mod substitution;

pub use budget::Constraints;
pub use engine::PolicyEngine;
pub use rubric::{RubricDimension, RubricReport};

use serde::{Deserialize, Serialize};

use crate::quests::{Pattern, Quest};

// ── Rationale trace ─────────────────────────────────────────────────

/// One entry in the rationale trace: what the engine did and why.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum RationaleEntry {
    BudgetDerived {
        capacity: u32,
        checkin_delta: i32,
        total_minutes_max: u32,
    },
    PatternSubstituted {
        quest_title: String,
        from: Pattern,
        to: Pattern,
        constraint_tag: String,
    },
    QuestDropped {
        quest_title: String,
        reason: String,
    },
    CountCapped {
        kept: usize,
        dropped: usize,
    },
    SessionClamped {
        quest_title: String,
        from_minutes: u32,
        to_minutes: u32,
    },
    TimeRescaled {
        before_total: u32,
        after_total: u32,
        target: u32,
    },
    DiversitySwap {
        index: usize,
        from: Pattern,
        to: Pattern,
    },
    ContractBackfilled {
        quest_title: String,
    },
    RubricCorrection {
        dimension: RubricDimension,
    },
    FallbackCandidates {
        reason: String,
    },
}

// ── Output ──────────────────────────────────────────────────────────

/// A validated day plan: the quests, the constraints they satisfy, and the
/// trace of every transformation applied on the way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestList {
    pub quests: Vec<Quest>,
    pub constraints: Constraints,
    pub rationale: Vec<RationaleEntry>,
    pub rubric: RubricReport,
    /// True when the rubric gate still fails after its one corrective pass.
    /// The list is usable; the caller may decide to retry upstream.
    pub sub_threshold: bool,
}

impl QuestList {
    /// Total planned minutes.
    pub fn total_minutes(&self) -> u32 {
        self.quests.iter().map(|q| q.minutes).sum()
    }
}
