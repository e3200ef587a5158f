//! Adjustment result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::quests::{Pattern, Quest};

/// Direction of a difficulty adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    Increase,
    Decrease,
    Maintain,
}

impl AdjustmentKind {
    /// The opposite direction, used when rolling back.
    pub fn inverted(&self) -> AdjustmentKind {
        match self {
            Self::Increase => Self::Decrease,
            Self::Decrease => Self::Increase,
            Self::Maintain => Self::Maintain,
        }
    }
}

/// Size class of an adjustment, from the absolute factor sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Magnitude {
    Minor,
    Moderate,
    Significant,
}

impl Magnitude {
    pub fn classify(total_factor: f32) -> Magnitude {
        let abs = total_factor.abs();
        if abs < 0.10 {
            Self::Minor
        } else if abs < 0.20 {
            Self::Moderate
        } else {
            Self::Significant
        }
    }
}

/// One recorded difficulty adjustment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifficultyAdjustment {
    pub id: Uuid,
    /// Pattern of the quest that was adjusted.
    pub pattern: Pattern,
    pub original_difficulty: f32,
    pub adjusted_difficulty: f32,
    pub kind: AdjustmentKind,
    pub magnitude: Magnitude,
    /// Confidence in the adjustment, in [0.7, 0.95].
    pub confidence: f32,
    /// Textual conditions under which this adjustment should be reversed.
    pub rollback_triggers: Vec<String>,
    pub reasoning: String,
    /// Set when this entry reverses an earlier adjustment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollback_of: Option<Uuid>,
    /// Whether a later rollback has reversed this entry.
    #[serde(default)]
    pub rolled_back: bool,
    /// Completion count at creation time; gates rollback eligibility.
    pub completions_at_creation: usize,
    pub created_at: DateTime<Utc>,
}

impl DifficultyAdjustment {
    pub fn is_rollback(&self) -> bool {
        self.rollback_of.is_some()
    }
}

/// Result of an adjustment pass over upcoming quests.
#[derive(Debug, Clone)]
pub struct AdjustmentOutcome {
    pub modified: Vec<Quest>,
    pub adjustments: Vec<DifficultyAdjustment>,
}

/// Result of a monitoring pass over the adjustment history.
#[derive(Debug, Clone)]
pub struct MonitorReport {
    /// Ids of adjustments that were reversed this pass.
    pub rollbacks: Vec<Uuid>,
    /// The new inverted adjustments emitted for those reversals.
    pub new_adjustments: Vec<DifficultyAdjustment>,
    pub recommendations: Vec<String>,
}
