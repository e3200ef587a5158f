//! User profile — immutable per planning cycle.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::quests::Pattern;

// ── Profile fields ──────────────────────────────────────────────────

/// Profile fields the onboarding question engine can ask about.
///
/// Keys of the profile's `known_fields` map. A closed enum so that question
/// applicability is decided by match, never by inspecting free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    TimeBudget,
    SessionLength,
    DifficultyTolerance,
    NoveltyPreference,
    EnvConstraints,
    Modality,
    Deliverable,
    Schedule,
    Motivation,
    PriorKnowledge,
}

/// A profile field value with how confident we are in it.
///
/// Confidence comes from how the value was obtained: directly answered
/// questions carry high confidence, inferred values carry less.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnownField {
    pub value: String,
    /// Confidence in [0, 1].
    pub confidence: f32,
}

// ── Day type ────────────────────────────────────────────────────────

/// Coarse capacity bucket for a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayType {
    Busy,
    Normal,
    Deep,
}

impl DayType {
    /// Daily time capacity in minutes.
    pub fn capacity(&self) -> u32 {
        match self {
            Self::Busy => 45,
            Self::Normal => 90,
            Self::Deep => 150,
        }
    }
}

impl std::fmt::Display for DayType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Busy => "busy",
            Self::Normal => "normal",
            Self::Deep => "deep",
        };
        write!(f, "{s}")
    }
}

// ── Profile ─────────────────────────────────────────────────────────

/// User profile driving a planning cycle.
///
/// Immutable for the duration of one cycle; enrichment from question answers
/// happens between cycles, outside the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Free-text learning goal.
    pub goal: String,
    /// Total learning time per day, in minutes.
    pub time_budget_per_day: u32,
    /// Preferred length of a single session, in minutes.
    pub preferred_session_length: u32,
    /// Tolerance for hard material, in [0, 1].
    pub difficulty_tolerance: f32,
    /// Preference for novel activity shapes over familiar ones, in [0, 1].
    pub novelty_preference: f32,
    /// Free-text environment tags, e.g. "no_audio", "commute_only".
    #[serde(default)]
    pub env_constraints: Vec<String>,
    /// Preferred learning modalities, e.g. "reading", "listening".
    #[serde(default)]
    pub modality_preferences: Vec<String>,
    /// Preferred deliverable kinds, e.g. "notes", "artifact".
    #[serde(default)]
    pub deliverable_preferences: Vec<String>,
    /// What the question engine already knows, with confidence.
    #[serde(default)]
    pub known_fields: HashMap<ProfileField, KnownField>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            goal: String::new(),
            time_budget_per_day: 60,
            preferred_session_length: 30,
            difficulty_tolerance: 0.5,
            novelty_preference: 0.5,
            env_constraints: Vec::new(),
            modality_preferences: Vec::new(),
            deliverable_preferences: Vec::new(),
            known_fields: HashMap::new(),
        }
    }
}

impl Profile {
    /// Confidence for a field, if known.
    pub fn field_confidence(&self, field: ProfileField) -> Option<f32> {
        self.known_fields.get(&field).map(|k| k.confidence)
    }

    /// Known value for a field, if any.
    pub fn field_value(&self, field: ProfileField) -> Option<&str> {
        self.known_fields.get(&field).map(|k| k.value.as_str())
    }
}

// ── Completion records ──────────────────────────────────────────────

/// Outcome of one finished (or abandoned) quest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub quest_id: Uuid,
    pub pattern: Pattern,
    pub succeeded: bool,
    /// User rating 1–5, if given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<u8>,
    pub minutes_spent: u32,
    pub completed_at: DateTime<Utc>,
}

impl CompletionRecord {
    pub fn new(pattern: Pattern, succeeded: bool) -> Self {
        Self {
            quest_id: Uuid::new_v4(),
            pattern,
            succeeded,
            user_rating: None,
            minutes_spent: 0,
            completed_at: Utc::now(),
        }
    }

    pub fn with_rating(mut self, rating: u8) -> Self {
        self.user_rating = Some(rating);
        self
    }
}
