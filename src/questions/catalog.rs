//! Static question catalogue.
//!
//! Each entry declares when it applies and how it is asked; all selection
//! arithmetic lives in `scoring`. Applicability is a closed enum matched
//! against the profile — never decided by inspecting free text.

use regex::Regex;

use crate::profile::{Profile, ProfileField};

// ── Categories ──────────────────────────────────────────────────────

/// Question category, with a fixed relevance base weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCategory {
    GoalClarity,
    Logistics,
    Environment,
    Challenge,
    Preference,
    Background,
}

impl QuestionCategory {
    /// Base relevance weight for this category.
    pub fn weight(&self) -> f32 {
        match self {
            Self::GoalClarity => 0.80,
            Self::Logistics => 0.75,
            Self::Environment => 0.65,
            Self::Challenge => 0.60,
            Self::Preference => 0.55,
            Self::Background => 0.50,
        }
    }
}

// ── Format ──────────────────────────────────────────────────────────

/// How a question is asked.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionFormat {
    YesNo,
    FixedChoice { options: Vec<String> },
    Scale { min: u8, max: u8 },
    FreeText,
}

impl QuestionFormat {
    pub fn is_free_text(&self) -> bool {
        matches!(self, Self::FreeText)
    }
}

// ── Applicability ───────────────────────────────────────────────────

/// When a catalogue item applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applicability {
    /// Always a candidate.
    Always,
    /// Only while the named field is still unknown.
    FieldUnknown(ProfileField),
    /// Only when the user has stated a goal at all.
    GoalNonEmpty,
}

impl Applicability {
    pub fn holds(&self, profile: &Profile, goal_text: &str) -> bool {
        match self {
            Self::Always => true,
            Self::FieldUnknown(field) => profile.field_confidence(*field).is_none(),
            Self::GoalNonEmpty => !goal_text.trim().is_empty(),
        }
    }
}

// ── Bank item ───────────────────────────────────────────────────────

/// A catalogue entry with its compiled keyword matchers.
#[derive(Debug, Clone)]
pub struct QuestionBankItem {
    pub id: String,
    pub category: QuestionCategory,
    /// The profile field this question fills.
    pub field: ProfileField,
    pub text: String,
    pub applicable_when: Applicability,
    /// Prior estimate of information gain when the field is unknown.
    pub info_gain_hint: f32,
    /// How much asking this question tires the user, in [0, 1].
    pub fatigue_weight: f32,
    pub format: QuestionFormat,
    /// Compiled word-boundary matchers over the goal text.
    keyword_patterns: Vec<Regex>,
}

impl QuestionBankItem {
    fn new(
        id: &str,
        category: QuestionCategory,
        field: ProfileField,
        text: &str,
        applicable_when: Applicability,
        info_gain_hint: f32,
        fatigue_weight: f32,
        format: QuestionFormat,
        keywords: &[&str],
    ) -> Self {
        let keyword_patterns = keywords
            .iter()
            .map(|kw| {
                // Keyword lists are compiled-in constants; a bad pattern is a
                // programming error, caught by the catalogue test below.
                Regex::new(&format!(r"(?i)\b{}\b", regex::escape(kw)))
                    .unwrap_or_else(|e| panic!("bad keyword pattern {kw:?}: {e}"))
            })
            .collect();
        Self {
            id: id.into(),
            category,
            field,
            text: text.into(),
            applicable_when,
            info_gain_hint,
            fatigue_weight,
            format,
            keyword_patterns,
        }
    }

    /// Number of distinct keyword hits in the goal text.
    pub fn keyword_hits(&self, goal_text: &str) -> usize {
        self.keyword_patterns
            .iter()
            .filter(|re| re.is_match(goal_text))
            .count()
    }
}

fn choices(options: &[&str]) -> QuestionFormat {
    QuestionFormat::FixedChoice {
        options: options.iter().map(|s| s.to_string()).collect(),
    }
}

/// The full onboarding question bank.
pub fn question_bank() -> Vec<QuestionBankItem> {
    use Applicability::*;
    use QuestionCategory::*;
    vec![
        QuestionBankItem::new(
            "q_time_budget",
            Logistics,
            ProfileField::TimeBudget,
            "How much time can you give this on a typical day?",
            Always,
            0.90,
            0.10,
            choices(&["15 minutes", "30 minutes", "60 minutes", "90+ minutes"]),
            &["busy", "time", "schedule"],
        ),
        QuestionBankItem::new(
            "q_session_length",
            Logistics,
            ProfileField::SessionLength,
            "How long should a single sitting be?",
            Always,
            0.70,
            0.10,
            choices(&["10-15 minutes", "20-30 minutes", "45+ minutes"]),
            &[],
        ),
        QuestionBankItem::new(
            "q_difficulty",
            Challenge,
            ProfileField::DifficultyTolerance,
            "How hard do you like your practice to feel?",
            Always,
            0.75,
            0.15,
            QuestionFormat::Scale { min: 1, max: 5 },
            &["challenge", "advanced", "beginner", "struggling"],
        ),
        QuestionBankItem::new(
            "q_novelty",
            Preference,
            ProfileField::NoveltyPreference,
            "Do you prefer familiar routines or trying new activity types?",
            Always,
            0.50,
            0.15,
            QuestionFormat::Scale { min: 1, max: 5 },
            &[],
        ),
        QuestionBankItem::new(
            "q_environment",
            Environment,
            ProfileField::EnvConstraints,
            "Where will you usually be practicing?",
            Always,
            0.80,
            0.20,
            choices(&["quiet space", "commute", "shared space, no audio", "varies"]),
            &["commute", "work", "travel", "office"],
        ),
        QuestionBankItem::new(
            "q_modality",
            Preference,
            ProfileField::Modality,
            "Which ways of working suit you best?",
            Always,
            0.60,
            0.15,
            choices(&["reading", "listening", "speaking", "building things"]),
            &["listening", "speaking", "reading", "hands-on"],
        ),
        QuestionBankItem::new(
            "q_deliverable",
            Preference,
            ProfileField::Deliverable,
            "What kind of output do you want from each session?",
            Always,
            0.50,
            0.20,
            choices(&["notes", "flashcards", "a small artifact", "a recording"]),
            &[],
        ),
        QuestionBankItem::new(
            "q_schedule",
            Logistics,
            ProfileField::Schedule,
            "Walk me through when in your day practice could fit.",
            FieldUnknown(ProfileField::Schedule),
            0.55,
            0.35,
            QuestionFormat::FreeText,
            &["morning", "evening", "weekend"],
        ),
        QuestionBankItem::new(
            "q_motivation",
            Background,
            ProfileField::Motivation,
            "What's driving this goal right now?",
            GoalNonEmpty,
            0.60,
            0.40,
            QuestionFormat::FreeText,
            &["exam", "interview", "trip", "certification", "job"],
        ),
        QuestionBankItem::new(
            "q_prior_knowledge",
            Background,
            ProfileField::PriorKnowledge,
            "What have you already done toward this goal?",
            Always,
            0.70,
            0.30,
            QuestionFormat::FreeText,
            &["beginner", "refresh", "continue", "again"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::KnownField;

    #[test]
    fn bank_compiles_and_has_unique_ids() {
        let bank = question_bank();
        assert_eq!(bank.len(), 10);
        let mut ids: Vec<&str> = bank.iter().map(|i| i.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 10, "duplicate question ids");
    }

    #[test]
    fn keyword_hits_are_word_bounded() {
        let bank = question_bank();
        let env = bank.iter().find(|i| i.id == "q_environment").unwrap();
        assert_eq!(env.keyword_hits("learn spanish for my commute"), 1);
        assert_eq!(env.keyword_hits("pass the networking exam"), 0);
        // substring inside a longer word must not match
        assert_eq!(env.keyword_hits("telecommuter life"), 0);
    }

    #[test]
    fn applicability_field_unknown() {
        let mut profile = Profile::default();
        let when = Applicability::FieldUnknown(ProfileField::Schedule);
        assert!(when.holds(&profile, "goal"));

        profile.known_fields.insert(
            ProfileField::Schedule,
            KnownField {
                value: "mornings".into(),
                confidence: 0.9,
            },
        );
        assert!(!when.holds(&profile, "goal"));
    }

    #[test]
    fn applicability_goal_non_empty() {
        let profile = Profile::default();
        assert!(!Applicability::GoalNonEmpty.holds(&profile, "   "));
        assert!(Applicability::GoalNonEmpty.holds(&profile, "learn rust"));
    }
}
