//! Difficulty adjustment engine.
//!
//! Each contextual signal contributes an independent additive factor; the
//! summed factor moves the quest's difficulty, and the direction of the move
//! decides how the quest's time box, criteria, and scaffolding change.

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::profile::context::AdjustmentContext;
use crate::profile::model::CompletionRecord;
use crate::profile::MoodSignal;
use crate::quests::{Pattern, Quest};

use super::model::{AdjustmentKind, AdjustmentOutcome, DifficultyAdjustment, Magnitude};

/// Difficulty stays inside this band no matter how extreme the signals are.
const DIFFICULTY_FLOOR: f32 = 0.1;
const DIFFICULTY_CEIL: f32 = 0.9;
/// Deltas smaller than this are classified as maintain.
const MAINTAIN_BAND: f32 = 0.05;
/// Increased quests never grow past this time box.
const INCREASE_MINUTES_CAP: u32 = 60;

/// One contributing signal.
#[derive(Debug, Clone)]
struct Signal {
    label: &'static str,
    delta: f32,
    /// Strong signals accrue more confidence than weak ones.
    strong: bool,
}

/// Computes and applies difficulty adjustments.
#[derive(Debug, Default)]
pub struct DifficultyAdjuster;

impl DifficultyAdjuster {
    pub fn new() -> Self {
        Self
    }

    /// Adjust each upcoming quest from history and context.
    ///
    /// Pure function of its inputs; recording the resulting adjustments into
    /// the per-user history is the caller's concern.
    pub fn adjust(
        &self,
        upcoming: Vec<Quest>,
        history: &[CompletionRecord],
        context: &AdjustmentContext,
    ) -> AdjustmentOutcome {
        let mut modified = Vec::with_capacity(upcoming.len());
        let mut adjustments = Vec::with_capacity(upcoming.len());

        for quest in upcoming {
            let signals = compute_signals(quest.pattern, history, context);
            let factor: f32 = signals.iter().map(|s| s.delta).sum();
            let original = quest.difficulty;
            let adjusted = (original + factor).clamp(DIFFICULTY_FLOOR, DIFFICULTY_CEIL);
            let delta = adjusted - original;

            let kind = if delta.abs() < MAINTAIN_BAND {
                AdjustmentKind::Maintain
            } else if delta > 0.0 {
                AdjustmentKind::Increase
            } else {
                AdjustmentKind::Decrease
            };
            let magnitude = Magnitude::classify(factor);
            let confidence = confidence_of(&signals);
            let reasoning = reasoning_of(&signals, kind);

            debug!(
                quest = %quest.title,
                pattern = %quest.pattern,
                factor,
                original,
                adjusted,
                ?kind,
                "Computed difficulty adjustment"
            );

            adjustments.push(DifficultyAdjustment {
                id: Uuid::new_v4(),
                pattern: quest.pattern,
                original_difficulty: original,
                adjusted_difficulty: adjusted,
                kind,
                magnitude,
                confidence,
                rollback_triggers: rollback_triggers(kind),
                reasoning,
                rollback_of: None,
                rolled_back: false,
                completions_at_creation: history.len(),
                created_at: Utc::now(),
            });
            modified.push(apply_adjustment(quest, kind, adjusted, context.available_minutes));
        }

        AdjustmentOutcome {
            modified,
            adjustments,
        }
    }
}

/// Compute the independent additive signals for one quest.
fn compute_signals(
    pattern: Pattern,
    history: &[CompletionRecord],
    context: &AdjustmentContext,
) -> Vec<Signal> {
    let mut signals = Vec::new();

    // Overall success rate over the last 7 completions.
    let recent: Vec<&CompletionRecord> = history.iter().rev().take(7).collect();
    if !recent.is_empty() {
        let rate = recent.iter().filter(|r| r.succeeded).count() as f32 / recent.len() as f32;
        if rate > 0.85 {
            signals.push(Signal {
                label: "high recent success rate",
                delta: 0.15,
                strong: true,
            });
        } else if rate < 0.40 {
            signals.push(Signal {
                label: "low recent success rate",
                delta: -0.20,
                strong: true,
            });
        }
    }

    // Success rate on this quest's own pattern.
    let same_pattern: Vec<&CompletionRecord> =
        history.iter().filter(|r| r.pattern == pattern).collect();
    if !same_pattern.is_empty() {
        let rate = same_pattern.iter().filter(|r| r.succeeded).count() as f32
            / same_pattern.len() as f32;
        if rate > 0.80 {
            signals.push(Signal {
                label: "strong pattern-specific success",
                delta: 0.10,
                strong: false,
            });
        } else if rate < 0.50 {
            signals.push(Signal {
                label: "weak pattern-specific success",
                delta: -0.15,
                strong: false,
            });
        }
    }

    if context.consecutive_active_days > 5 {
        signals.push(Signal {
            label: "streak fatigue",
            delta: -0.05,
            strong: false,
        });
    }

    if matches!(context.available_minutes, Some(available) if available < 20) {
        signals.push(Signal {
            label: "time pressure",
            delta: -0.10,
            strong: false,
        });
    }

    if context.recent_moods.contains(&MoodSignal::Frustrated) {
        signals.push(Signal {
            label: "frustration reported",
            delta: -0.15,
            strong: false,
        });
    }
    if context.recent_moods.contains(&MoodSignal::Confident) {
        signals.push(Signal {
            label: "confidence reported",
            delta: 0.10,
            strong: false,
        });
    }

    if let Some(risk) = &context.risk {
        if risk.has_high_severity() {
            signals.push(Signal {
                label: "high-severity risk factor",
                delta: -0.20,
                strong: true,
            });
        }
        if risk.plateau_risk > 0.7 {
            signals.push(Signal {
                label: "plateau risk, introduce variety",
                delta: 0.10,
                strong: false,
            });
        }
    }

    signals
}

/// Confidence accrual: 0.7 base, +0.15 per strong signal, +0.10 per weak,
/// capped at 0.95.
fn confidence_of(signals: &[Signal]) -> f32 {
    let accrued: f32 = signals
        .iter()
        .map(|s| if s.strong { 0.15 } else { 0.10 })
        .sum();
    (0.7 + accrued).min(0.95)
}

fn reasoning_of(signals: &[Signal], kind: AdjustmentKind) -> String {
    if signals.is_empty() {
        return "no signals fired; difficulty maintained".into();
    }
    let labels: Vec<&str> = signals.iter().map(|s| s.label).collect();
    let verb = match kind {
        AdjustmentKind::Increase => "increasing",
        AdjustmentKind::Decrease => "decreasing",
        AdjustmentKind::Maintain => "maintaining",
    };
    format!("{verb} difficulty: {}", labels.join("; "))
}

fn rollback_triggers(kind: AdjustmentKind) -> Vec<String> {
    match kind {
        AdjustmentKind::Increase => vec![
            "success rate below 0.40 after three further completions".into(),
            "average rating below 3 of 5".into(),
        ],
        AdjustmentKind::Decrease => vec![
            "success rate above 0.90 after three further completions".into(),
            "average rating above 4 of 5".into(),
        ],
        AdjustmentKind::Maintain => Vec::new(),
    }
}

/// Apply an adjustment to the quest itself.
///
/// A decrease shortens and scaffolds the quest; an increase stretches it.
/// Either way, a shortage of actual available time clamps the time box to
/// 80% of what's available and marks the deliverable as shortened.
fn apply_adjustment(
    quest: Quest,
    kind: AdjustmentKind,
    adjusted_difficulty: f32,
    available_minutes: Option<u32>,
) -> Quest {
    let mut quest = quest.with_difficulty(adjusted_difficulty);

    match kind {
        AdjustmentKind::Decrease => {
            quest.minutes = ((quest.minutes as f32 * 0.9).round() as u32).max(10);
            quest.criteria.truncate(2);
            quest
                .criteria
                .push("Show basic understanding of the core idea".into());
            quest
                .steps
                .insert(0, "Confirm the basic concept first".into());
        }
        AdjustmentKind::Increase => {
            quest.minutes = ((quest.minutes as f32 * 1.1).round() as u32).min(INCREASE_MINUTES_CAP);
            quest
                .criteria
                .push("Extend the result one step beyond the base task".into());
            quest
                .criteria
                .push("Explain one non-obvious connection you found".into());
            for tag in ["challenge", "advanced"] {
                if !quest.tags.iter().any(|t| t == tag) {
                    quest.tags.push(tag.into());
                }
            }
        }
        AdjustmentKind::Maintain => {}
    }

    if let Some(available) = available_minutes {
        if available < quest.minutes {
            quest.minutes = ((available as f32 * 0.8).round() as u32).max(10);
            quest.deliverable = format!("{} (shortened scope)", quest.deliverable);
        }
    }

    quest
}
