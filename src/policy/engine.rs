//! The eight-step policy pipeline.
//!
//! Steps run in a fixed order, each on the output of the previous:
//! budget → substitution → count cap → session clamp → time reconciliation →
//! diversity → contract backfill → rubric gate. Every transformation is
//! recorded in the rationale trace.

use tracing::{debug, info, warn};

use crate::config::PlannerConfig;
use crate::error::PlanningError;
use crate::profile::{DayType, Profile};
use crate::quests::Quest;
use crate::quests::templates::{backfill_contract, fallback_quest};

use super::budget::Constraints;
use super::rubric::{RubricDimension, RubricReport};
use super::substitution::{self, Substitution};
use super::{QuestList, RationaleEntry};

/// Applies the daily constraint policy to candidate quests.
pub struct PolicyEngine {
    config: PlannerConfig,
}

impl PolicyEngine {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// Validate and shape candidates into a day plan.
    ///
    /// Returns `InsufficientCandidates` when fewer than the minimum viable
    /// number of quests survive filtering — never an empty success.
    pub fn apply(
        &self,
        candidates: Vec<Quest>,
        profile: &Profile,
        day_type: Option<DayType>,
        checkin_delta: i32,
    ) -> Result<QuestList, PlanningError> {
        let mut rationale = Vec::new();

        // Step 1: budget derivation.
        let constraints = Constraints::derive(profile, day_type, checkin_delta, &self.config);
        rationale.push(RationaleEntry::BudgetDerived {
            capacity: Constraints::capacity_of(profile, day_type),
            checkin_delta,
            total_minutes_max: constraints.total_minutes_max,
        });
        debug!(
            total_minutes_max = constraints.total_minutes_max,
            "Derived daily budget"
        );

        // Step 2: environment-constraint substitution.
        let mut quests = Vec::with_capacity(candidates.len());
        for quest in candidates {
            match substitution::substitute(quest.pattern, &profile.env_constraints) {
                Substitution::Kept => quests.push(quest),
                Substitution::Replaced { to } => {
                    let from = quest.pattern;
                    let tag = substitution::violated_tag(from, &profile.env_constraints)
                        .unwrap_or_default()
                        .to_string();
                    debug!(quest = %quest.title, %from, %to, tag, "Substituted pattern");
                    rationale.push(RationaleEntry::PatternSubstituted {
                        quest_title: quest.title.clone(),
                        from,
                        to,
                        constraint_tag: tag,
                    });
                    quests.push(quest.with_pattern(to));
                }
                Substitution::Dropped => {
                    debug!(quest = %quest.title, pattern = %quest.pattern, "Dropped infeasible quest");
                    rationale.push(RationaleEntry::QuestDropped {
                        quest_title: quest.title,
                        reason: "no feasible pattern under environment constraints".into(),
                    });
                }
            }
        }

        if quests.len() < self.config.min_quest_count {
            warn!(
                survivors = quests.len(),
                required = self.config.min_quest_count,
                "Too few candidates survived filtering"
            );
            return Err(PlanningError::InsufficientCandidates {
                survivors: quests.len(),
                required: self.config.min_quest_count,
            });
        }

        // Step 3: count cap, preserving priority order (earlier = more
        // foundational).
        if quests.len() > constraints.max_quest_count {
            let dropped = quests.len() - constraints.max_quest_count;
            quests.truncate(constraints.max_quest_count);
            rationale.push(RationaleEntry::CountCapped {
                kept: quests.len(),
                dropped,
            });
        }

        // Step 4: per-session clamp.
        let mut clamped = Vec::with_capacity(quests.len());
        for quest in quests {
            if quest.minutes > constraints.max_session_minutes {
                rationale.push(RationaleEntry::SessionClamped {
                    quest_title: quest.title.clone(),
                    from_minutes: quest.minutes,
                    to_minutes: constraints.max_session_minutes,
                });
                clamped.push(quest.with_minutes(constraints.max_session_minutes));
            } else {
                clamped.push(quest);
            }
        }
        let mut quests = clamped;

        // Step 5: total-time reconciliation.
        self.reconcile(&mut quests, &constraints, &mut rationale);

        // Step 6: pattern-diversity pass.
        self.diversify(&mut quests, &profile.env_constraints, &mut rationale);

        // Step 7: completion-contract backfill.
        let mut filled = Vec::with_capacity(quests.len());
        for quest in quests {
            if quest.has_full_contract() {
                filled.push(quest);
            } else {
                rationale.push(RationaleEntry::ContractBackfilled {
                    quest_title: quest.title.clone(),
                });
                filled.push(backfill_contract(quest));
            }
        }
        let mut quests = filled;

        // Step 8: rubric gate — one targeted corrective pass, then re-score.
        let mut rubric = RubricReport::compute(&quests, constraints.total_minutes_max);
        let failing = rubric.failing(&self.config.rubric);
        let mut sub_threshold = false;
        if !failing.is_empty() {
            debug!(?failing, "Rubric gate failed, applying corrective pass");
            for dimension in failing {
                self.correct(dimension, &mut quests, &constraints, &mut rationale);
            }
            // Corrections must not reintroduce a budget overrun.
            let total: u32 = quests.iter().map(|q| q.minutes).sum();
            if total > constraints.total_minutes_max {
                self.reconcile(&mut quests, &constraints, &mut rationale);
            }
            rubric = RubricReport::compute(&quests, constraints.total_minutes_max);
            sub_threshold = !rubric.passes(&self.config.rubric);
        }

        let total: u32 = quests.iter().map(|q| q.minutes).sum();
        info!(
            quests = quests.len(),
            total_minutes = total,
            sub_threshold,
            "Policy pass complete"
        );
        Ok(QuestList {
            quests,
            constraints,
            rationale,
            rubric,
            sub_threshold,
        })
    }

    /// Scale the plan down to the daily budget, exactly.
    ///
    /// No-op when the plan already fits. Otherwise: scale every quest by
    /// `target/total`, re-floor at the minimum, then settle rounding drift —
    /// taken from the largest quests when over, given to the earliest quests
    /// (within the session cap) when under — so the final sum equals the
    /// target exactly.
    fn reconcile(
        &self,
        quests: &mut Vec<Quest>,
        constraints: &Constraints,
        rationale: &mut Vec<RationaleEntry>,
    ) {
        let target = constraints.total_minutes_max;
        let min = self.config.min_quest_minutes;
        let before: u32 = quests.iter().map(|q| q.minutes).sum();
        if before <= target {
            return;
        }

        // A budget below quest_count × floor cannot be met; shed from the end.
        while quests.len() > 1 && (quests.len() as u32) * min > target {
            if let Some(dropped) = quests.pop() {
                rationale.push(RationaleEntry::QuestDropped {
                    quest_title: dropped.title,
                    reason: "daily budget below minimum for quest count".into(),
                });
            }
        }

        let current: u32 = quests.iter().map(|q| q.minutes).sum();
        if current <= target {
            return;
        }

        for quest in quests.iter_mut() {
            let scaled = (u64::from(quest.minutes) * u64::from(target) / u64::from(current)) as u32;
            quest.minutes = scaled.max(min);
        }

        let after: u32 = quests.iter().map(|q| q.minutes).sum();
        if after > target {
            let mut over = after - target;
            while over > 0 {
                let Some(idx) = largest_above_floor(quests, min) else {
                    break;
                };
                let take = (quests[idx].minutes - min).min(over);
                quests[idx].minutes -= take;
                over -= take;
            }
        } else if after < target {
            let mut give = target - after;
            for quest in quests.iter_mut() {
                let room = constraints.max_session_minutes.saturating_sub(quest.minutes);
                let add = room.min(give);
                quest.minutes += add;
                give -= add;
                if give == 0 {
                    break;
                }
            }
        }

        let final_total: u32 = quests.iter().map(|q| q.minutes).sum();
        rationale.push(RationaleEntry::TimeRescaled {
            before_total: before,
            after_total: final_total,
            target,
        });
    }

    /// Break up adjacent same-pattern runs.
    ///
    /// For each quest sharing its predecessor's pattern, take the first
    /// alternative that does not clash with the successor and stays feasible
    /// in the user's environment. With no such alternative the run stands.
    /// Running this on an already-diverse list changes nothing.
    fn diversify(
        &self,
        quests: &mut [Quest],
        env_constraints: &[String],
        rationale: &mut Vec<RationaleEntry>,
    ) {
        for i in 1..quests.len() {
            if quests[i].pattern != quests[i - 1].pattern {
                continue;
            }
            let next = quests.get(i + 1).map(|q| q.pattern);
            let replacement = quests[i]
                .pattern
                .alternatives()
                .iter()
                .copied()
                .find(|alt| Some(*alt) != next && substitution::is_feasible(*alt, env_constraints));
            if let Some(to) = replacement {
                let from = quests[i].pattern;
                debug!(index = i, %from, %to, "Diversity swap");
                quests[i] = quests[i].clone().with_pattern(to);
                rationale.push(RationaleEntry::DiversitySwap { index: i, from, to });
            }
        }
    }

    /// One targeted correction for a failing rubric dimension.
    fn correct(
        &self,
        dimension: RubricDimension,
        quests: &mut Vec<Quest>,
        constraints: &Constraints,
        rationale: &mut Vec<RationaleEntry>,
    ) {
        rationale.push(RationaleEntry::RubricCorrection { dimension });
        match dimension {
            RubricDimension::Relevance => {
                for quest in quests.iter_mut() {
                    if quest.tags.is_empty() {
                        quest.tags = vec![quest.pattern.to_string(), "daily_plan".into()];
                    }
                    if quest.deliverable.trim().is_empty() {
                        quest.deliverable =
                            fallback_quest(quest.pattern, quest.minutes, quest.difficulty)
                                .deliverable;
                    }
                }
            }
            RubricDimension::Feasibility => {
                for quest in quests.iter_mut() {
                    quest.difficulty = quest.difficulty.min(0.7);
                    quest.minutes = quest
                        .minutes
                        .clamp(self.config.min_quest_minutes, constraints.max_session_minutes);
                }
            }
            RubricDimension::Specificity => {
                let originals = std::mem::take(quests);
                for mut quest in originals {
                    if quest.steps.len() < 3 {
                        let template = fallback_quest(quest.pattern, quest.minutes, quest.difficulty);
                        let mut steps = quest.steps.clone();
                        steps.extend(
                            template
                                .steps
                                .into_iter()
                                .skip(steps.len())
                                .take(3 - steps.len().min(3)),
                        );
                        quest = quest.with_steps(steps);
                    }
                    quests.push(backfill_contract(quest));
                }
            }
            RubricDimension::LoadFit => {
                self.reconcile(quests, constraints, rationale);
            }
        }
    }
}

/// Index of the largest quest still above the floor.
fn largest_above_floor(quests: &[Quest], floor: u32) -> Option<usize> {
    quests
        .iter()
        .enumerate()
        .filter(|(_, q)| q.minutes > floor)
        .max_by_key(|(_, q)| q.minutes)
        .map(|(i, _)| i)
}
