//! Core quest types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Pattern ─────────────────────────────────────────────────────────

/// The ten learning-activity shapes.
///
/// Patterns are the unit of the diversity constraint: no two adjacent quests
/// in a final plan share one unless no substitute exists. Each pattern has a
/// fixed, ordered alternative list used by both the environment-substitution
/// and diversity passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    ReadNoteQ,
    Flashcards,
    BuildMicro,
    Shadowing,
    Retrospective,
    DrillSet,
    TeachBack,
    CaseStudy,
    TimedSprint,
    AudioImmersion,
}

impl Pattern {
    /// All patterns, in canonical order.
    pub const ALL: [Pattern; 10] = [
        Pattern::ReadNoteQ,
        Pattern::Flashcards,
        Pattern::BuildMicro,
        Pattern::Shadowing,
        Pattern::Retrospective,
        Pattern::DrillSet,
        Pattern::TeachBack,
        Pattern::CaseStudy,
        Pattern::TimedSprint,
        Pattern::AudioImmersion,
    ];

    /// Fixed alternative list for this pattern, most-preferred first.
    ///
    /// Used when a pattern is infeasible in the user's environment or clashes
    /// with an adjacent quest. The list never contains the pattern itself.
    pub fn alternatives(&self) -> &'static [Pattern] {
        use Pattern::*;
        match self {
            ReadNoteQ => &[Flashcards, CaseStudy, Retrospective],
            Flashcards => &[DrillSet, ReadNoteQ, TimedSprint],
            BuildMicro => &[DrillSet, CaseStudy, TimedSprint],
            Shadowing => &[ReadNoteQ, Flashcards, TeachBack],
            Retrospective => &[ReadNoteQ, TeachBack, CaseStudy],
            DrillSet => &[Flashcards, TimedSprint, BuildMicro],
            TeachBack => &[Retrospective, ReadNoteQ, CaseStudy],
            CaseStudy => &[ReadNoteQ, BuildMicro, Retrospective],
            TimedSprint => &[DrillSet, BuildMicro, Flashcards],
            AudioImmersion => &[Shadowing, ReadNoteQ, Flashcards],
        }
    }

    /// Parse the wire name used by the candidate source.
    pub fn parse(s: &str) -> Option<Pattern> {
        use Pattern::*;
        match s {
            "read_note_q" => Some(ReadNoteQ),
            "flashcards" => Some(Flashcards),
            "build_micro" => Some(BuildMicro),
            "shadowing" => Some(Shadowing),
            "retrospective" => Some(Retrospective),
            "drill_set" => Some(DrillSet),
            "teach_back" => Some(TeachBack),
            "case_study" => Some(CaseStudy),
            "timed_sprint" => Some(TimedSprint),
            "audio_immersion" => Some(AudioImmersion),
            _ => None,
        }
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ReadNoteQ => "read_note_q",
            Self::Flashcards => "flashcards",
            Self::BuildMicro => "build_micro",
            Self::Shadowing => "shadowing",
            Self::Retrospective => "retrospective",
            Self::DrillSet => "drill_set",
            Self::TeachBack => "teach_back",
            Self::CaseStudy => "case_study",
            Self::TimedSprint => "timed_sprint",
            Self::AudioImmersion => "audio_immersion",
        };
        write!(f, "{s}")
    }
}

// ── Quest ───────────────────────────────────────────────────────────

/// A single time-boxed learning task with a completion contract.
///
/// Quests are value objects: every pipeline stage that changes one produces
/// a new `Quest` via the `with_*` methods rather than mutating in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quest {
    pub id: Uuid,
    pub title: String,
    pub pattern: Pattern,
    /// Time box in minutes. Valid range at rest is 10..=90.
    pub minutes: u32,
    /// Difficulty in [0, 1].
    pub difficulty: f32,
    /// What the user produces when the quest is done.
    pub deliverable: String,
    pub steps: Vec<String>,
    pub criteria: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Completion contract — what "done" means.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_definition: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<String>,
    /// What to do instead if the quest can't be started as written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_plan: Option<String>,
    /// When to stop even if unfinished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_rule: Option<String>,
}

impl Quest {
    /// Create a quest with the required fields; contract fields start empty.
    pub fn new(
        title: impl Into<String>,
        pattern: Pattern,
        minutes: u32,
        difficulty: f32,
        deliverable: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            pattern,
            minutes,
            difficulty,
            deliverable: deliverable.into(),
            steps: Vec::new(),
            criteria: Vec::new(),
            tags: Vec::new(),
            done_definition: None,
            evidence: Vec::new(),
            alt_plan: None,
            stop_rule: None,
        }
    }

    pub fn with_pattern(mut self, pattern: Pattern) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn with_minutes(mut self, minutes: u32) -> Self {
        self.minutes = minutes;
        self
    }

    pub fn with_difficulty(mut self, difficulty: f32) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_steps(mut self, steps: Vec<String>) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_criteria(mut self, criteria: Vec<String>) -> Self {
        self.criteria = criteria;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_deliverable(mut self, deliverable: impl Into<String>) -> Self {
        self.deliverable = deliverable.into();
        self
    }

    /// Whether all four completion-contract fields are present.
    pub fn has_full_contract(&self) -> bool {
        self.done_definition.is_some()
            && !self.evidence.is_empty()
            && self.alt_plan.is_some()
            && self.stop_rule.is_some()
    }
}
