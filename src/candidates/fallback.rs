//! Deterministic template-based candidate generation.
//!
//! The mandatory recovery path when the live source is unavailable, and a
//! usable offline source in its own right. No randomness: the same profile
//! always produces the same drafts.

use async_trait::async_trait;
use tracing::debug;

use crate::config::PlannerConfig;
use crate::error::CandidateError;
use crate::policy::substitution;
use crate::profile::Profile;
use crate::quests::Pattern;
use crate::quests::templates::fallback_quest;

use super::{CandidateRequest, CandidateSource, QuestDraft};

/// Fixed rotation of patterns for template generation, most broadly
/// applicable first.
const ROTATION: [Pattern; 10] = [
    Pattern::ReadNoteQ,
    Pattern::DrillSet,
    Pattern::BuildMicro,
    Pattern::Flashcards,
    Pattern::TeachBack,
    Pattern::CaseStudy,
    Pattern::TimedSprint,
    Pattern::Retrospective,
    Pattern::Shadowing,
    Pattern::AudioImmersion,
];

/// Generate deterministic fallback drafts from the profile alone.
///
/// Patterns come from a fixed rotation, skipping ones infeasible in the
/// user's environment; a high novelty preference shifts the starting point
/// so adventurous users see less of the same opener.
pub fn generate_drafts(profile: &Profile, config: &PlannerConfig) -> Vec<QuestDraft> {
    let offset = (profile.novelty_preference * 3.0) as usize % 3;
    let minutes = profile
        .preferred_session_length
        .clamp(config.min_quest_minutes, config.max_session_minutes);
    let difficulty = (profile.difficulty_tolerance * 0.8).clamp(0.2, 0.7);

    let drafts: Vec<QuestDraft> = ROTATION
        .iter()
        .cycle()
        .skip(offset)
        .take(ROTATION.len())
        .copied()
        .filter(|p| substitution::is_feasible(*p, &profile.env_constraints))
        .take(config.max_quest_count)
        .map(|pattern| QuestDraft::from(fallback_quest(pattern, minutes, difficulty)))
        .collect();

    debug!(count = drafts.len(), "Generated template fallback drafts");
    drafts
}

/// Candidate source backed entirely by the template catalogue.
#[derive(Debug, Clone)]
pub struct TemplateCandidateSource {
    config: PlannerConfig,
}

impl TemplateCandidateSource {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl CandidateSource for TemplateCandidateSource {
    fn name(&self) -> &str {
        "templates"
    }

    async fn fetch(&self, request: &CandidateRequest) -> Result<Vec<QuestDraft>, CandidateError> {
        Ok(generate_drafts(&request.profile, &self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic() {
        let profile = Profile::default();
        let config = PlannerConfig::default();
        let a = generate_drafts(&profile, &config);
        let b = generate_drafts(&profile, &config);
        let titles_a: Vec<_> = a.iter().map(|d| d.title.clone()).collect();
        let titles_b: Vec<_> = b.iter().map(|d| d.title.clone()).collect();
        assert_eq!(titles_a, titles_b);
        assert_eq!(a.len(), config.max_quest_count);
    }

    #[test]
    fn environment_constraints_are_respected() {
        let profile = Profile {
            env_constraints: vec!["no_screen".into(), "no_audio".into()],
            ..Default::default()
        };
        let config = PlannerConfig::default();
        let drafts = generate_drafts(&profile, &config);
        assert!(!drafts.is_empty());
        for draft in &drafts {
            let pattern = Pattern::parse(&draft.pattern).unwrap();
            assert!(substitution::is_feasible(pattern, &profile.env_constraints));
        }
    }

    #[test]
    fn session_length_is_clamped_into_valid_range() {
        let profile = Profile {
            preferred_session_length: 120,
            ..Default::default()
        };
        let config = PlannerConfig::default();
        let drafts = generate_drafts(&profile, &config);
        assert!(drafts.iter().all(|d| d.minutes == 45));

        let short = Profile {
            preferred_session_length: 5,
            ..Default::default()
        };
        let drafts = generate_drafts(&short, &config);
        assert!(drafts.iter().all(|d| d.minutes == 15));
    }

    #[test]
    fn novelty_preference_shifts_rotation() {
        let config = PlannerConfig::default();
        let tame = Profile {
            novelty_preference: 0.0,
            ..Default::default()
        };
        let adventurous = Profile {
            novelty_preference: 0.9,
            ..Default::default()
        };
        let first_tame = &generate_drafts(&tame, &config)[0];
        let first_adventurous = &generate_drafts(&adventurous, &config)[0];
        assert_ne!(first_tame.pattern, first_adventurous.pattern);
    }

    #[tokio::test]
    async fn template_source_implements_the_trait() {
        let source = TemplateCandidateSource::new(PlannerConfig::default());
        let request = CandidateRequest::daily_quests(Profile::default(), vec![], vec![]);
        let drafts = source.fetch(&request).await.unwrap();
        assert_eq!(drafts.len(), 3);
        assert_eq!(source.name(), "templates");
    }
}
