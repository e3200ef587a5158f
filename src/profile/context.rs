//! Per-cycle context — check-ins, moods, and external risk signals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::DayType;

// ── Mood ────────────────────────────────────────────────────────────

/// Mood indicator from a check-in.
///
/// A closed enum: mood arrives as structured data from the check-in form,
/// never as free text to be sniffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodSignal {
    Frustrated,
    Confident,
    Tired,
    Motivated,
    Neutral,
}

// ── Check-in ────────────────────────────────────────────────────────

/// A daily check-in record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkin {
    pub recorded_at: DateTime<Utc>,
    /// Minutes of capacity gained (+) or lost (−) versus the day-type baseline.
    pub delta_minutes: i32,
    #[serde(default)]
    pub moods: Vec<MoodSignal>,
}

impl Checkin {
    pub fn new(delta_minutes: i32) -> Self {
        Self {
            recorded_at: Utc::now(),
            delta_minutes,
            moods: Vec::new(),
        }
    }

    pub fn with_moods(mut self, moods: Vec<MoodSignal>) -> Self {
        self.moods = moods;
        self
    }
}

// ── Planning context ────────────────────────────────────────────────

/// Inputs that vary per planning request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanningContext {
    /// Coarse capacity bucket for today. `None` means no signal; the budget
    /// falls back to the profile's own time budget.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_type: Option<DayType>,
    /// Today's check-in delta in minutes.
    #[serde(default)]
    pub checkin_delta: i32,
    /// Recent check-ins, newest last. Forwarded to the candidate source.
    #[serde(default)]
    pub checkins: Vec<Checkin>,
}

// ── Risk signals ────────────────────────────────────────────────────

/// Severity of an externally reported risk factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A risk factor from the risk-analysis collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskFactor {
    pub label: String,
    pub severity: Severity,
}

/// Signals from the skill-graph/risk-analysis collaborator.
///
/// Optional everywhere it is consumed: absence means "no signal".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskSignals {
    /// Probability-like estimate that the learner has plateaued, in [0, 1].
    pub plateau_risk: f32,
    #[serde(default)]
    pub factors: Vec<RiskFactor>,
}

impl RiskSignals {
    /// Whether any factor is high severity.
    pub fn has_high_severity(&self) -> bool {
        self.factors.iter().any(|f| f.severity == Severity::High)
    }
}

// ── Adjustment context ──────────────────────────────────────────────

/// Inputs for a difficulty-adjustment pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdjustmentContext {
    /// Minutes actually available right now, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_minutes: Option<u32>,
    /// Consecutive days with at least one completed quest.
    #[serde(default)]
    pub consecutive_active_days: u32,
    /// Mood indicators from recent check-ins.
    #[serde(default)]
    pub recent_moods: Vec<MoodSignal>,
    /// External risk signals, if the collaborator supplied any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskSignals>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_high_severity_detection() {
        let signals = RiskSignals {
            plateau_risk: 0.2,
            factors: vec![
                RiskFactor {
                    label: "burnout".into(),
                    severity: Severity::Medium,
                },
                RiskFactor {
                    label: "overload".into(),
                    severity: Severity::High,
                },
            ],
        };
        assert!(signals.has_high_severity());

        let mild = RiskSignals {
            plateau_risk: 0.9,
            factors: vec![],
        };
        assert!(!mild.has_high_severity());
    }

    #[test]
    fn planning_context_defaults_to_no_signal() {
        let ctx = PlanningContext::default();
        assert!(ctx.day_type.is_none());
        assert_eq!(ctx.checkin_delta, 0);
        assert!(ctx.checkins.is_empty());
    }

    #[test]
    fn checkin_serde_roundtrip() {
        let checkin = Checkin::new(-15).with_moods(vec![MoodSignal::Tired, MoodSignal::Frustrated]);
        let json = serde_json::to_string(&checkin).unwrap();
        let parsed: Checkin = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.delta_minutes, -15);
        assert_eq!(parsed.moods.len(), 2);
    }
}
