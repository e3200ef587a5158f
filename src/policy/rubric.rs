//! Self-critique rubric — four normalized quality scores gating final output.

use serde::{Deserialize, Serialize};

use crate::config::RubricThresholds;
use crate::quests::Quest;

/// The four rubric dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RubricDimension {
    Relevance,
    Feasibility,
    Specificity,
    LoadFit,
}

/// Rubric scores for a quest list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RubricReport {
    /// Fraction of quests with non-empty tags and deliverable.
    pub relevance: f32,
    /// Fraction of quests with minutes in [15, 45] and difficulty ≤ 0.7.
    pub feasibility: f32,
    /// Fraction of quests with a full completion contract and ≥ 3 steps.
    pub specificity: f32,
    /// min(1, target / Σminutes); 1.0 when the plan fits the budget.
    pub load_fit: f32,
}

impl RubricReport {
    pub fn compute(quests: &[Quest], target_minutes: u32) -> Self {
        if quests.is_empty() {
            return Self {
                relevance: 0.0,
                feasibility: 0.0,
                specificity: 0.0,
                load_fit: 1.0,
            };
        }
        let n = quests.len() as f32;
        let relevance = quests
            .iter()
            .filter(|q| !q.tags.is_empty() && !q.deliverable.trim().is_empty())
            .count() as f32
            / n;
        let feasibility = quests
            .iter()
            .filter(|q| (15..=45).contains(&q.minutes) && q.difficulty <= 0.7)
            .count() as f32
            / n;
        let specificity = quests
            .iter()
            .filter(|q| q.has_full_contract() && q.steps.len() >= 3)
            .count() as f32
            / n;
        let total: u32 = quests.iter().map(|q| q.minutes).sum();
        let load_fit = if total == 0 {
            1.0
        } else {
            (target_minutes as f32 / total as f32).min(1.0)
        };
        Self {
            relevance,
            feasibility,
            specificity,
            load_fit,
        }
    }

    /// Dimensions below their thresholds, in fixed order.
    pub fn failing(&self, thresholds: &RubricThresholds) -> Vec<RubricDimension> {
        let mut failing = Vec::new();
        if self.relevance < thresholds.relevance {
            failing.push(RubricDimension::Relevance);
        }
        if self.feasibility < thresholds.feasibility {
            failing.push(RubricDimension::Feasibility);
        }
        if self.specificity < thresholds.specificity {
            failing.push(RubricDimension::Specificity);
        }
        if self.load_fit < thresholds.load_fit {
            failing.push(RubricDimension::LoadFit);
        }
        failing
    }

    pub fn passes(&self, thresholds: &RubricThresholds) -> bool {
        self.failing(thresholds).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quests::templates::backfill_contract;
    use crate::quests::Pattern;

    fn good_quest() -> Quest {
        let quest = Quest::new("Drill set", Pattern::DrillSet, 30, 0.5, "Score sheet")
            .with_steps(vec!["a".into(), "b".into(), "c".into()])
            .with_tags(vec!["practice".into()]);
        backfill_contract(quest)
    }

    #[test]
    fn perfect_list_passes() {
        let quests = vec![good_quest(), good_quest()];
        let report = RubricReport::compute(&quests, 90);
        assert_eq!(report.relevance, 1.0);
        assert_eq!(report.feasibility, 1.0);
        assert_eq!(report.specificity, 1.0);
        assert_eq!(report.load_fit, 1.0);
        assert!(report.passes(&RubricThresholds::default()));
    }

    #[test]
    fn overload_fails_load_fit_only() {
        let quests = vec![good_quest(), good_quest(), good_quest()];
        // 90 minutes planned against a 60-minute target
        let report = RubricReport::compute(&quests, 60);
        assert!(report.load_fit < 1.0);
        assert_eq!(
            report.failing(&RubricThresholds::default()),
            vec![RubricDimension::LoadFit]
        );
    }

    #[test]
    fn hard_quests_fail_feasibility() {
        let mut hard = good_quest();
        hard.difficulty = 0.9;
        let report = RubricReport::compute(&[hard], 90);
        assert_eq!(report.feasibility, 0.0);
        assert!(
            report
                .failing(&RubricThresholds::default())
                .contains(&RubricDimension::Feasibility)
        );
    }

    #[test]
    fn missing_contract_fails_specificity() {
        let bare = Quest::new("t", Pattern::Flashcards, 20, 0.5, "deck")
            .with_tags(vec!["review".into()]);
        let report = RubricReport::compute(&[bare], 90);
        assert_eq!(report.specificity, 0.0);
    }

    #[test]
    fn empty_list_scores_zero_but_fits() {
        let report = RubricReport::compute(&[], 90);
        assert_eq!(report.relevance, 0.0);
        assert_eq!(report.load_fit, 1.0);
    }
}
