//! Per-pattern templates — completion-contract backfill and fallback quests.
//!
//! The wording here is replaceable data, not algorithm: the policy engine only
//! requires that backfill is deterministic and keyed by pattern.

use super::model::{Pattern, Quest};

/// Fill any missing completion-contract fields from the pattern's template.
///
/// Fields already present on the quest are left untouched. The stop rule is
/// parameterized by the quest's time box.
pub fn backfill_contract(mut quest: Quest) -> Quest {
    let minutes = quest.minutes;
    let pattern = quest.pattern;

    if quest.done_definition.is_none() {
        quest.done_definition = Some(done_definition(pattern).to_string());
    }
    if quest.evidence.is_empty() {
        quest.evidence = evidence(pattern).iter().map(|s| s.to_string()).collect();
    }
    if quest.alt_plan.is_none() {
        quest.alt_plan = Some(alt_plan(pattern).to_string());
    }
    if quest.stop_rule.is_none() {
        quest.stop_rule = Some(format!(
            "Stop at the {minutes}-minute mark even if unfinished; note where you left off."
        ));
    }
    quest
}

fn done_definition(pattern: Pattern) -> &'static str {
    use Pattern::*;
    match pattern {
        ReadNoteQ => "The material is read and a note with at least three self-test questions exists",
        Flashcards => "Every card in the deck has been reviewed at least once",
        BuildMicro => "A minimal working artifact exists and runs end to end",
        Shadowing => "The full passage has been shadowed aloud at least twice",
        Retrospective => "A written retrospective covers what worked, what didn't, and one change",
        DrillSet => "The drill set is completed and scored",
        TeachBack => "The concept has been explained aloud or in writing without notes",
        CaseStudy => "The case is summarized with at least two takeaways",
        TimedSprint => "The sprint ran for the full time box with output captured",
        AudioImmersion => "The audio has been listened through with new vocabulary noted",
    }
}

fn evidence(pattern: Pattern) -> &'static [&'static str] {
    use Pattern::*;
    match pattern {
        ReadNoteQ => &["note with self-test questions"],
        Flashcards => &["deck review count", "list of cards marked hard"],
        BuildMicro => &["the artifact itself", "a sentence on what broke"],
        Shadowing => &["recording of one shadowed pass"],
        Retrospective => &["the written retrospective"],
        DrillSet => &["score sheet"],
        TeachBack => &["outline or recording of the explanation"],
        CaseStudy => &["case summary with takeaways"],
        TimedSprint => &["sprint output", "count of items finished"],
        AudioImmersion => &["vocabulary notes"],
    }
}

fn alt_plan(pattern: Pattern) -> &'static str {
    use Pattern::*;
    match pattern {
        ReadNoteQ => "Skim headings only and write one question per section",
        Flashcards => "Review only the cards marked hard last time",
        BuildMicro => "Sketch the artifact on paper instead of building it",
        Shadowing => "Listen through once without speaking, marking hard segments",
        Retrospective => "Answer only: what is the one thing to change next time?",
        DrillSet => "Do the first half of the set untimed",
        TeachBack => "Write three bullet points you would teach from",
        CaseStudy => "Read the case and note a single takeaway",
        TimedSprint => "Run a half-length sprint",
        AudioImmersion => "Play the audio in the background while doing chores",
    }
}

/// Deterministic fallback quest for a pattern, used when the candidate
/// source is unavailable. Content is generic study material; the policy
/// engine will still substitute, clamp, and backfill it like any candidate.
pub fn fallback_quest(pattern: Pattern, minutes: u32, difficulty: f32) -> Quest {
    use Pattern::*;
    let (title, deliverable, steps) = match pattern {
        ReadNoteQ => (
            "Read one section of your current material and question it",
            "A note with three self-test questions",
            vec![
                "Pick the next unread section",
                "Read it once without notes",
                "Write a short note and three self-test questions",
            ],
        ),
        Flashcards => (
            "Review your active flashcard deck",
            "Updated deck with hard cards flagged",
            vec![
                "Shuffle the active deck",
                "Review every card once",
                "Flag cards you missed for tomorrow",
            ],
        ),
        BuildMicro => (
            "Build one tiny working example of today's topic",
            "A minimal artifact that runs",
            vec![
                "Choose the smallest example that exercises the idea",
                "Build it end to end",
                "Note the first thing that broke",
            ],
        ),
        Shadowing => (
            "Shadow a short native-speed passage",
            "One recorded shadowed pass",
            vec![
                "Pick a one-minute passage",
                "Listen once, then shadow it twice",
                "Record the final pass",
            ],
        ),
        Retrospective => (
            "Write a short retrospective on this week's practice",
            "A written retrospective",
            vec![
                "List what you practiced",
                "Note what worked and what didn't",
                "Pick one change for next week",
            ],
        ),
        DrillSet => (
            "Work through a focused drill set",
            "A scored drill sheet",
            vec![
                "Pick one weak area",
                "Do a fixed set of drills",
                "Score yourself and mark misses",
            ],
        ),
        TeachBack => (
            "Explain yesterday's topic as if teaching it",
            "An outline of your explanation",
            vec![
                "Outline the topic from memory",
                "Explain it aloud without notes",
                "Note where you got stuck",
            ],
        ),
        CaseStudy => (
            "Study one worked example in depth",
            "A summary with two takeaways",
            vec![
                "Pick a worked example or case",
                "Trace it step by step",
                "Write two takeaways",
            ],
        ),
        TimedSprint => (
            "Run a timed practice sprint",
            "Sprint output and a finished-item count",
            vec![
                "Pick a repeatable exercise",
                "Set a timer and work until it rings",
                "Count what you finished",
            ],
        ),
        AudioImmersion => (
            "Listen to target-language audio actively",
            "A list of new vocabulary",
            vec![
                "Pick an episode or track",
                "Listen without pausing",
                "Note unfamiliar words afterwards",
            ],
        ),
    };

    Quest::new(title, pattern, minutes, difficulty, deliverable)
        .with_steps(steps.into_iter().map(String::from).collect())
        .with_criteria(vec![
            "Deliverable exists".to_string(),
            "Time box respected".to_string(),
            "One note on what to adjust next time".to_string(),
        ])
        .with_tags(vec!["fallback".to_string(), format!("{pattern}")])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quests::model::Pattern;

    #[test]
    fn backfill_fills_all_missing_fields() {
        for pattern in Pattern::ALL {
            let quest = Quest::new("t", pattern, 25, 0.5, "d");
            let filled = backfill_contract(quest);
            assert!(filled.has_full_contract(), "{pattern} missing contract fields");
            assert!(filled.stop_rule.as_deref().unwrap().contains("25-minute"));
        }
    }

    #[test]
    fn backfill_preserves_existing_fields() {
        let mut quest = Quest::new("t", Pattern::Flashcards, 20, 0.5, "d");
        quest.done_definition = Some("my own definition".into());
        let filled = backfill_contract(quest);
        assert_eq!(filled.done_definition.as_deref(), Some("my own definition"));
        assert!(!filled.evidence.is_empty());
    }

    #[test]
    fn fallback_quests_are_complete_and_deterministic() {
        for pattern in Pattern::ALL {
            let a = fallback_quest(pattern, 30, 0.4);
            let b = fallback_quest(pattern, 30, 0.4);
            assert_eq!(a.title, b.title);
            assert_eq!(a.steps, b.steps);
            assert_eq!(a.pattern, pattern);
            assert!(a.steps.len() >= 3);
            assert!(!a.deliverable.is_empty());
            assert!(!a.criteria.is_empty());
        }
    }
}
