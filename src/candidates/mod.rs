//! Quest candidate source — the planner's only external seam.
//!
//! Candidates arrive as quest-shaped wire records from an out-of-process
//! generator. Requests carry an explicit [`RequestKind`] tag; behavior is
//! dispatched on the tag, never by inspecting prompt text.

pub mod fallback;
pub mod llm;

pub use fallback::TemplateCandidateSource;
pub use llm::{LlmBackend, LlmCandidateSource, LlmConfig, create_source};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CandidateError;
use crate::profile::{Checkin, Profile, SkillAtom};
use crate::quests::{Pattern, Quest};

// ── Request ─────────────────────────────────────────────────────────

/// What kind of completion is being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    SkillMap,
    DailyQuests,
    PolicyCheck,
    ClarityCheck,
}

/// A candidate-generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRequest {
    pub kind: RequestKind,
    pub profile: Profile,
    #[serde(default)]
    pub skill_atoms: Vec<SkillAtom>,
    #[serde(default)]
    pub checkins: Vec<Checkin>,
}

impl CandidateRequest {
    pub fn daily_quests(profile: Profile, skill_atoms: Vec<SkillAtom>, checkins: Vec<Checkin>) -> Self {
        Self {
            kind: RequestKind::DailyQuests,
            profile,
            skill_atoms,
            checkins,
        }
    }
}

// ── Wire record ─────────────────────────────────────────────────────

/// The quest-shaped record the candidate source produces.
///
/// Loosely typed on purpose: `pattern` is a string until validated, and
/// numeric fields are normalized rather than rejected when slightly out of
/// range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestDraft {
    pub title: String,
    pub pattern: String,
    pub minutes: u32,
    pub difficulty: f32,
    #[serde(default)]
    pub deliverable: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub criteria: Vec<String>,
}

impl QuestDraft {
    /// Validate and normalize into a [`Quest`].
    ///
    /// An unknown pattern or an empty title is a schema violation; minutes
    /// and difficulty are clamped into their resting ranges.
    pub fn into_quest(self) -> Result<Quest, CandidateError> {
        let pattern = Pattern::parse(&self.pattern).ok_or_else(|| {
            CandidateError::SchemaValidation {
                reason: format!("unknown pattern {:?}", self.pattern),
            }
        })?;
        if self.title.trim().is_empty() {
            return Err(CandidateError::SchemaValidation {
                reason: "empty quest title".into(),
            });
        }
        let minutes = self.minutes.clamp(10, 90);
        let difficulty = self.difficulty.clamp(0.0, 1.0);
        Ok(
            Quest::new(self.title, pattern, minutes, difficulty, self.deliverable)
                .with_steps(self.steps)
                .with_criteria(self.criteria)
                .with_tags(self.tags),
        )
    }
}

impl From<Quest> for QuestDraft {
    fn from(quest: Quest) -> Self {
        Self {
            title: quest.title,
            pattern: quest.pattern.to_string(),
            minutes: quest.minutes,
            difficulty: quest.difficulty,
            deliverable: quest.deliverable,
            tags: quest.tags,
            steps: quest.steps,
            criteria: quest.criteria,
        }
    }
}

/// Validate a batch of drafts, dropping the unusable ones.
pub fn validate_drafts(drafts: Vec<QuestDraft>) -> Vec<Quest> {
    let mut quests = Vec::with_capacity(drafts.len());
    for draft in drafts {
        match draft.into_quest() {
            Ok(quest) => quests.push(quest),
            Err(e) => debug!(error = %e, "Dropped invalid candidate draft"),
        }
    }
    quests
}

// ── Source trait ────────────────────────────────────────────────────

/// A producer of candidate quests — pure I/O, no planning logic.
///
/// The fetch is the planning pipeline's sole suspension point; it may fail
/// or time out, and the planner recovers with deterministic templates.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &str;

    /// Produce candidate drafts for a request.
    async fn fetch(&self, request: &CandidateRequest) -> Result<Vec<QuestDraft>, CandidateError>;
}
