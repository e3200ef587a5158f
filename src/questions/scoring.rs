//! Question scoring and selection.
//!
//! Pure function of its inputs: identical profiles and hints always produce
//! the identical plan (stable sort, catalogue-id tie-break, no randomness).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PlannerConfig;
use crate::profile::{Profile, ProfileField};

use super::catalog::{QuestionBankItem, QuestionCategory, QuestionFormat, question_bank};

/// Confidence at and above which a known field is confirmed instead of asked.
const CONFIRMATION_CONFIDENCE: f32 = 0.7;
/// Maximum score boost an external priority hint may contribute.
const MAX_HINT_BOOST: f32 = 0.3;
/// Relevance boost for one keyword hit in the goal text.
const KEYWORD_BOOST: f32 = 0.15;

// ── Output types ────────────────────────────────────────────────────

/// A question admitted into the session plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedQuestion {
    pub id: String,
    pub category: QuestionCategory,
    pub field: ProfileField,
    pub text: String,
    pub format: QuestionFormat,
    pub relevance: f32,
    pub info_gain: f32,
    pub score: f32,
    /// When set, this is a confirmation question: "is this still right?"
    /// asked about the known value, rather than a fresh question.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm_value: Option<String>,
}

impl PlannedQuestion {
    pub fn is_confirmation(&self) -> bool {
        self.confirm_value.is_some()
    }
}

/// Why a catalogue item was not asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotApplicable,
    ScoreBelowThreshold,
    BudgetExhausted,
    FreeTextCapped,
}

/// A skipped catalogue item, kept for the rationale trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedQuestion {
    pub id: String,
    pub reason: SkipReason,
    pub score: f32,
}

/// Result of question planning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionPlan {
    pub selected: Vec<PlannedQuestion>,
    pub skipped: Vec<SkippedQuestion>,
}

// ── External hints ──────────────────────────────────────────────────

/// Priority hints from the skill-graph/profile-analysis collaborator.
#[derive(Debug, Clone, Default)]
pub struct PriorityHints {
    /// Extra score per question id; clamped to +0.3 each.
    pub boosts: HashMap<String, f32>,
    /// When present, replaces the default format-based reordering with a
    /// domain-specific category order.
    pub category_priority: Option<Vec<QuestionCategory>>,
}

// ── Planning ────────────────────────────────────────────────────────

struct Scored {
    item: QuestionBankItem,
    relevance: f32,
    info_gain: f32,
    score: f32,
}

/// Select the onboarding questions for one session.
pub fn plan_questions(
    goal_text: &str,
    profile: &Profile,
    hints: Option<&PriorityHints>,
    config: &PlannerConfig,
) -> QuestionPlan {
    let mut skipped = Vec::new();
    let mut scored = Vec::new();

    for item in question_bank() {
        let relevance = relevance_of(&item, goal_text);
        let info_gain = info_gain_of(&item, profile);
        let base = relevance * info_gain - 0.5 * item.fatigue_weight;
        let boost = hints
            .and_then(|h| h.boosts.get(&item.id).copied())
            .map(|b| b.clamp(0.0, MAX_HINT_BOOST))
            .unwrap_or(0.0);
        let score = base + boost;

        if !item.applicable_when.holds(profile, goal_text) {
            skipped.push(SkippedQuestion {
                id: item.id.clone(),
                reason: SkipReason::NotApplicable,
                score,
            });
            continue;
        }

        debug!(
            id = %item.id,
            relevance,
            info_gain,
            score,
            "Scored question"
        );
        scored.push(Scored {
            item,
            relevance,
            info_gain,
            score,
        });
    }

    // Descending by score, stable tie-break by catalogue id.
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.item.id.cmp(&b.item.id))
    });

    let mut selected = Vec::new();
    for s in scored {
        if s.score < config.question_score_threshold {
            skipped.push(SkippedQuestion {
                id: s.item.id.clone(),
                reason: SkipReason::ScoreBelowThreshold,
                score: s.score,
            });
            continue;
        }
        if selected.len() >= config.question_budget {
            skipped.push(SkippedQuestion {
                id: s.item.id.clone(),
                reason: SkipReason::BudgetExhausted,
                score: s.score,
            });
            continue;
        }
        selected.push(to_planned(s, profile));
    }

    // Bound free-text fatigue: at most `free_text_cap` free-text questions.
    let mut free_text_seen = 0usize;
    let mut capped = Vec::with_capacity(selected.len());
    for q in selected {
        if q.format.is_free_text() && q.confirm_value.is_none() {
            free_text_seen += 1;
            if free_text_seen > config.free_text_cap {
                skipped.push(SkippedQuestion {
                    id: q.id,
                    reason: SkipReason::FreeTextCapped,
                    score: q.score,
                });
                continue;
            }
        }
        capped.push(q);
    }
    let mut selected = capped;

    reorder(&mut selected, hints);

    QuestionPlan { selected, skipped }
}

fn relevance_of(item: &QuestionBankItem, goal_text: &str) -> f32 {
    let hits = item.keyword_hits(goal_text);
    (item.category.weight() + KEYWORD_BOOST * hits as f32).clamp(0.0, 1.0)
}

/// Expected uncertainty reduction from asking this question.
///
/// Unknown fields use the catalogue's prior hint; known fields collapse to a
/// small residual that shrinks with confidence.
fn info_gain_of(item: &QuestionBankItem, profile: &Profile) -> f32 {
    match profile.field_confidence(item.field) {
        None => item.info_gain_hint,
        Some(c) if c >= 0.8 => 0.1,
        Some(c) if c >= 0.5 => 0.4,
        Some(_) => 0.8,
    }
}

fn to_planned(s: Scored, profile: &Profile) -> PlannedQuestion {
    let confirm_value = match profile.field_confidence(s.item.field) {
        Some(c) if c >= CONFIRMATION_CONFIDENCE => {
            profile.field_value(s.item.field).map(String::from)
        }
        _ => None,
    };
    let format = if confirm_value.is_some() {
        QuestionFormat::YesNo
    } else {
        s.item.format.clone()
    };
    PlannedQuestion {
        id: s.item.id,
        category: s.item.category,
        field: s.item.field,
        text: s.item.text,
        format,
        relevance: s.relevance,
        info_gain: s.info_gain,
        score: s.score,
        confirm_value,
    }
}

/// Order admitted questions for the session.
///
/// Default: fixed-choice and confirmation questions first, free-text last.
/// A category priority list from the collaborator overrides this entirely.
fn reorder(selected: &mut [PlannedQuestion], hints: Option<&PriorityHints>) {
    if let Some(priority) = hints.and_then(|h| h.category_priority.as_ref()) {
        let rank = |c: QuestionCategory| {
            priority
                .iter()
                .position(|p| *p == c)
                .unwrap_or(priority.len())
        };
        selected.sort_by_key(|q| rank(q.category));
        return;
    }
    selected.sort_by_key(|q| q.format.is_free_text() && !q.is_confirmation());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::KnownField;

    fn config() -> PlannerConfig {
        PlannerConfig::default()
    }

    fn known(profile: &mut Profile, field: ProfileField, value: &str, confidence: f32) {
        profile.known_fields.insert(
            field,
            KnownField {
                value: value.into(),
                confidence,
            },
        );
    }

    #[test]
    fn plan_is_deterministic() {
        let profile = Profile::default();
        let a = plan_questions("learn spanish for a trip", &profile, None, &config());
        let b = plan_questions("learn spanish for a trip", &profile, None, &config());
        let ids_a: Vec<_> = a.selected.iter().map(|q| q.id.clone()).collect();
        let ids_b: Vec<_> = b.selected.iter().map(|q| q.id.clone()).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn budget_is_respected() {
        let profile = Profile::default();
        let plan = plan_questions("learn rust", &profile, None, &config());
        assert!(plan.selected.len() <= 5);
        assert!(
            plan.skipped
                .iter()
                .all(|s| s.reason != SkipReason::BudgetExhausted)
                || plan.selected.len() == 5
        );
    }

    #[test]
    fn low_scores_are_skipped_with_reason() {
        let profile = Profile::default();
        let plan = plan_questions("", &profile, None, &config());
        // q_deliverable: 0.55 * 0.5 - 0.10 = 0.175 < 0.25
        let skip = plan
            .skipped
            .iter()
            .find(|s| s.id == "q_deliverable")
            .expect("deliverable question should be skipped");
        assert_eq!(skip.reason, SkipReason::ScoreBelowThreshold);
        assert!(skip.score < 0.25);
    }

    #[test]
    fn known_field_reduces_info_gain() {
        let mut profile = Profile::default();
        known(&mut profile, ProfileField::TimeBudget, "60", 0.9);
        let plan = plan_questions("", &profile, None, &config());
        // relevance 0.75 * info gain 0.1 - 0.05 = 0.025 — below threshold
        assert!(!plan.selected.iter().any(|q| q.id == "q_time_budget"));
    }

    #[test]
    fn confident_known_field_becomes_confirmation() {
        let mut profile = Profile::default();
        // Confidence in the confirmation band but with enough residual score:
        // boost it so it clears the threshold even at info gain 0.4.
        known(&mut profile, ProfileField::EnvConstraints, "commute", 0.7);
        let mut hints = PriorityHints::default();
        hints.boosts.insert("q_environment".into(), 0.3);
        let plan = plan_questions("", &profile, Some(&hints), &config());
        let q = plan
            .selected
            .iter()
            .find(|q| q.id == "q_environment")
            .expect("environment question should be admitted with boost");
        assert!(q.is_confirmation());
        assert_eq!(q.confirm_value.as_deref(), Some("commute"));
        assert_eq!(q.format, QuestionFormat::YesNo);
    }

    #[test]
    fn free_text_questions_come_last_and_are_capped() {
        let profile = Profile::default();
        let plan = plan_questions(
            "preparing for a certification exam, beginner, practicing on my commute",
            &profile,
            None,
            &config(),
        );
        let free_text: Vec<_> = plan
            .selected
            .iter()
            .filter(|q| q.format.is_free_text())
            .collect();
        assert!(free_text.len() <= 2);
        // All free-text questions must appear after all non-free-text ones.
        let first_free = plan
            .selected
            .iter()
            .position(|q| q.format.is_free_text());
        if let Some(pos) = first_free {
            assert!(
                plan.selected[pos..].iter().all(|q| q.format.is_free_text()),
                "free-text question ordered before a fixed-choice one"
            );
        }
    }

    #[test]
    fn keyword_hits_boost_relevance() {
        let profile = Profile::default();
        let without = plan_questions("improve myself", &profile, None, &config());
        let with = plan_questions("study during my commute to work", &profile, None, &config());
        let score = |plan: &QuestionPlan, id: &str| {
            plan.selected
                .iter()
                .map(|q| (q.id.clone(), q.score))
                .chain(plan.skipped.iter().map(|s| (s.id.clone(), s.score)))
                .find(|(i, _)| i == id)
                .map(|(_, s)| s)
                .unwrap()
        };
        assert!(score(&with, "q_environment") > score(&without, "q_environment"));
    }

    #[test]
    fn hint_boost_is_clamped() {
        let profile = Profile::default();
        let mut hints = PriorityHints::default();
        hints.boosts.insert("q_deliverable".into(), 5.0);
        let plan = plan_questions("", &profile, Some(&hints), &config());
        let all_scores: Vec<(String, f32)> = plan
            .selected
            .iter()
            .map(|q| (q.id.clone(), q.score))
            .chain(plan.skipped.iter().map(|s| (s.id.clone(), s.score)))
            .collect();
        let boosted = all_scores.iter().find(|(id, _)| id == "q_deliverable").unwrap();
        // base 0.175 + max boost 0.3
        assert!((boosted.1 - 0.475).abs() < 1e-6);
    }

    #[test]
    fn category_priority_overrides_reordering() {
        let profile = Profile::default();
        let hints = PriorityHints {
            boosts: HashMap::new(),
            category_priority: Some(vec![
                QuestionCategory::Background,
                QuestionCategory::Logistics,
            ]),
        };
        let plan = plan_questions(
            "beginner preparing for an exam",
            &profile,
            Some(&hints),
            &config(),
        );
        if let Some(first) = plan.selected.first() {
            assert_eq!(first.category, QuestionCategory::Background);
        }
    }

    #[test]
    fn score_monotone_in_info_gain_hint() {
        // Holding everything else fixed, a higher hint never lowers the score.
        let profile = Profile::default();
        let bank = question_bank();
        let item = bank.iter().find(|i| i.id == "q_novelty").unwrap();
        let rel = (item.category.weight()).clamp(0.0, 1.0);
        let score_at = |hint: f32| rel * hint - 0.5 * item.fatigue_weight;
        assert!(score_at(0.9) >= score_at(0.5));
        assert!(score_at(0.5) >= score_at(0.1));
        // And through the public API: unknown field uses the hint directly.
        let plan = plan_questions("", &profile, None, &config());
        let novelty_score = plan
            .selected
            .iter()
            .map(|q| (q.id.as_str(), q.score))
            .chain(plan.skipped.iter().map(|s| (s.id.as_str(), s.score)))
            .find(|(id, _)| *id == "q_novelty")
            .map(|(_, s)| s)
            .unwrap();
        assert!((novelty_score - score_at(item.info_gain_hint)).abs() < 1e-6);
    }
}
