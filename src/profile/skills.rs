//! Skill-graph input types — produced externally, read-only here.

use serde::{Deserialize, Serialize};

use crate::quests::Pattern;

/// Kind of skill atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillKind {
    Concept,
    Procedure,
    Habit,
}

/// One node of the externally produced skill graph.
///
/// Prerequisites form a DAG by construction of the producer; the planner only
/// forwards atoms to the candidate source and never walks the graph itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillAtom {
    pub id: String,
    pub label: String,
    pub kind: SkillKind,
    /// Rough mastery level, 0 = untouched.
    pub level: u8,
    #[serde(default)]
    pub prereq_ids: Vec<String>,
    /// Patterns the producer suggests for practicing this atom.
    #[serde(default)]
    pub suggested_patterns: Vec<Pattern>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skill_atom_serde_roundtrip() {
        let atom = SkillAtom {
            id: "es.verbs.past".into(),
            label: "Past-tense verbs".into(),
            kind: SkillKind::Procedure,
            level: 1,
            prereq_ids: vec!["es.verbs.present".into()],
            suggested_patterns: vec![Pattern::DrillSet, Pattern::Flashcards],
        };
        let json = serde_json::to_string(&atom).unwrap();
        let parsed: SkillAtom = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, "es.verbs.past");
        assert_eq!(parsed.kind, SkillKind::Procedure);
        assert_eq!(parsed.suggested_patterns.len(), 2);
        assert_eq!(json.contains("\"procedure\""), true);
    }
}
