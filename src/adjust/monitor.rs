//! Rollback monitoring.
//!
//! An adjustment becomes eligible for reversal only once three further
//! completions exist. A triggered rollback emits a new adjustment with the
//! inverted kind and the same magnitude, linked to the original so rollback
//! statistics can be read straight from history.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::profile::model::CompletionRecord;

use super::engine::DifficultyAdjuster;
use super::history::AdjustmentHistory;
use super::model::{AdjustmentKind, DifficultyAdjustment, MonitorReport};

/// Completions required after an adjustment before it can be rolled back.
const ROLLBACK_MIN_COMPLETIONS: usize = 3;
/// Rollback-rate level above which the monitor recommends gentler moves.
const ROLLBACK_RATE_WARNING: f32 = 0.3;

impl DifficultyAdjuster {
    /// Scan history for adjustments whose outcomes call for reversal.
    ///
    /// Triggered rollbacks are recorded into `history` (original marked,
    /// inverted entry appended) and reported back.
    pub fn monitor(
        &self,
        history: &mut AdjustmentHistory,
        completions: &[CompletionRecord],
    ) -> MonitorReport {
        let mut triggered: Vec<(Uuid, DifficultyAdjustment)> = Vec::new();

        for entry in history.iter() {
            if entry.rolled_back || entry.is_rollback() || entry.kind == AdjustmentKind::Maintain {
                continue;
            }
            let since = completions
                .get(entry.completions_at_creation..)
                .unwrap_or_default();
            if since.len() < ROLLBACK_MIN_COMPLETIONS {
                continue;
            }

            let success_rate =
                since.iter().filter(|r| r.succeeded).count() as f32 / since.len() as f32;
            let ratings: Vec<f32> = since
                .iter()
                .filter_map(|r| r.user_rating)
                .map(f32::from)
                .collect();
            let mean_rating = (!ratings.is_empty())
                .then(|| ratings.iter().sum::<f32>() / ratings.len() as f32);

            let should_roll_back = match entry.kind {
                AdjustmentKind::Increase => {
                    success_rate < 0.40 || mean_rating.is_some_and(|r| r < 3.0)
                }
                AdjustmentKind::Decrease => {
                    success_rate > 0.90 || mean_rating.is_some_and(|r| r > 4.0)
                }
                AdjustmentKind::Maintain => false,
            };
            if !should_roll_back {
                continue;
            }

            debug!(
                adjustment = %entry.id,
                ?entry.kind,
                success_rate,
                ?mean_rating,
                "Rollback triggered"
            );
            let inverted_kind = entry.kind.inverted();
            triggered.push((
                entry.id,
                DifficultyAdjustment {
                    id: Uuid::new_v4(),
                    pattern: entry.pattern,
                    original_difficulty: entry.adjusted_difficulty,
                    adjusted_difficulty: entry.original_difficulty,
                    kind: inverted_kind,
                    magnitude: entry.magnitude,
                    confidence: 0.7,
                    rollback_triggers: Vec::new(),
                    reasoning: format!(
                        "rollback of earlier {:?} (success rate {:.2} since adjustment)",
                        entry.kind, success_rate
                    ),
                    rollback_of: Some(entry.id),
                    rolled_back: false,
                    completions_at_creation: completions.len(),
                    created_at: Utc::now(),
                },
            ));
        }

        let mut rollbacks = Vec::with_capacity(triggered.len());
        let mut new_adjustments = Vec::with_capacity(triggered.len());
        for (original_id, rollback) in triggered {
            history.mark_rolled_back(original_id);
            history.push(rollback.clone());
            rollbacks.push(original_id);
            new_adjustments.push(rollback);
        }

        let mut recommendations = Vec::new();
        if history.rollback_rate() > ROLLBACK_RATE_WARNING {
            recommendations.push(
                "Rollback rate is high; prefer smaller adjustment magnitudes next cycle".into(),
            );
        }
        if !rollbacks.is_empty() {
            recommendations
                .push("Replan affected patterns with the restored difficulty".into());
        }

        if !rollbacks.is_empty() {
            info!(count = rollbacks.len(), "Applied difficulty rollbacks");
        }
        MonitorReport {
            rollbacks,
            new_adjustments,
            recommendations,
        }
    }
}
