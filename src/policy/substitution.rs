//! Environment-constraint substitution.
//!
//! A fixed table maps environment tags to the patterns they forbid. An
//! infeasible quest takes the first feasible entry of its pattern's
//! alternative list; with no feasible entry at all, the quest is dropped.
//! Tags not in the table impose no restriction.

use crate::quests::Pattern;

/// Patterns forbidden under a given environment tag.
fn forbidden_under(tag: &str) -> &'static [Pattern] {
    use Pattern::*;
    match tag {
        "no_audio" => &[Shadowing, AudioImmersion],
        "no_speaking" => &[Shadowing, TeachBack],
        "no_screen" => &[Flashcards, BuildMicro, TimedSprint],
        "no_reading" => &[ReadNoteQ, CaseStudy],
        "commute" => &[BuildMicro, DrillSet, TimedSprint],
        _ => &[],
    }
}

/// Whether a pattern is usable under all of the given environment tags.
pub fn is_feasible(pattern: Pattern, env_constraints: &[String]) -> bool {
    env_constraints
        .iter()
        .all(|tag| !forbidden_under(tag).contains(&pattern))
}

/// Outcome of the substitution check for one quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Substitution {
    /// The pattern is feasible as-is.
    Kept,
    /// Replaced with the first feasible alternative.
    Replaced { to: Pattern },
    /// Neither the pattern nor any alternative is feasible.
    Dropped,
}

/// Decide what to do with a pattern under the environment constraints.
pub fn substitute(pattern: Pattern, env_constraints: &[String]) -> Substitution {
    if is_feasible(pattern, env_constraints) {
        return Substitution::Kept;
    }
    match pattern
        .alternatives()
        .iter()
        .copied()
        .find(|alt| is_feasible(*alt, env_constraints))
    {
        Some(to) => Substitution::Replaced { to },
        None => Substitution::Dropped,
    }
}

/// The tag that makes a pattern infeasible (for the rationale trace).
pub fn violated_tag(pattern: Pattern, env_constraints: &[String]) -> Option<&str> {
    env_constraints
        .iter()
        .find(|tag| forbidden_under(tag).contains(&pattern))
        .map(|s| s.as_str())
}
