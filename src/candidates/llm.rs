//! LLM-backed candidate source.
//!
//! Supports:
//! - **Anthropic**: Direct API access via rig-core
//! - **OpenAI**: Direct API access via rig-core
//!
//! The model is asked for a JSON array of quest drafts; output wrapped in
//! markdown or prose is unwrapped before parsing. Any failure here becomes a
//! [`CandidateError`] that the planner recovers from with templates.

use std::sync::Arc;

use rig::agent::AgentBuilder;
use rig::client::CompletionClient;
use rig::completion::{CompletionModel, Prompt};
use secrecy::ExposeSecret;
use tracing::{debug, error};

use crate::error::CandidateError;

use super::{CandidateRequest, CandidateSource, QuestDraft, RequestKind};

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Anthropic,
    OpenAi,
}

/// Configuration for creating an LLM candidate source.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub api_key: secrecy::SecretString,
    pub model: String,
}

/// Create an LLM candidate source from configuration.
pub fn create_source(config: &LlmConfig) -> Result<Arc<dyn CandidateSource>, CandidateError> {
    match config.backend {
        LlmBackend::Anthropic => create_anthropic_source(config),
        LlmBackend::OpenAi => create_openai_source(config),
    }
}

fn create_anthropic_source(config: &LlmConfig) -> Result<Arc<dyn CandidateSource>, CandidateError> {
    use rig::providers::anthropic;

    let client: rig::client::Client<anthropic::client::AnthropicExt> =
        anthropic::Client::new(config.api_key.expose_secret()).map_err(|e| {
            CandidateError::RequestFailed {
                reason: format!("Failed to create Anthropic client: {}", e),
            }
        })?;

    let model = client.completion_model(&config.model);
    tracing::info!("Using Anthropic candidate source (model: {})", config.model);
    Ok(Arc::new(LlmCandidateSource::new(model, &config.model)))
}

fn create_openai_source(config: &LlmConfig) -> Result<Arc<dyn CandidateSource>, CandidateError> {
    use rig::providers::openai;

    let client: rig::client::Client<openai::client::OpenAIResponsesExt> =
        openai::Client::new(config.api_key.expose_secret()).map_err(|e| {
            CandidateError::RequestFailed {
                reason: format!("Failed to create OpenAI client: {}", e),
            }
        })?;

    let model = client.completion_model(&config.model);
    tracing::info!("Using OpenAI candidate source (model: {})", config.model);
    Ok(Arc::new(LlmCandidateSource::new(model, &config.model)))
}

/// Candidate source that prompts a completion model for quest drafts.
pub struct LlmCandidateSource<M: CompletionModel> {
    model: M,
    model_name: String,
    temperature: f64,
    /// Drafts beyond this count are discarded before validation.
    max_candidates: usize,
}

impl<M: CompletionModel> LlmCandidateSource<M> {
    pub fn new(model: M, model_name: &str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
            temperature: 0.3,
            max_candidates: 6,
        }
    }
}

#[async_trait::async_trait]
impl<M: CompletionModel + Clone + Send + Sync + 'static> CandidateSource
    for LlmCandidateSource<M>
{
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn fetch(&self, request: &CandidateRequest) -> Result<Vec<QuestDraft>, CandidateError> {
        let agent = AgentBuilder::new(self.model.clone())
            .preamble(&preamble(request.kind))
            .temperature(self.temperature)
            .build();

        let prompt = user_prompt(request)?;
        debug!(kind = ?request.kind, model = %self.model_name, "Requesting candidate drafts");

        let raw = agent
            .prompt(prompt)
            .await
            .map_err(|e| CandidateError::RequestFailed {
                reason: e.to_string(),
            })?;

        parse_drafts(&raw, self.max_candidates)
    }
}

/// System preamble per request kind — dispatch is on the tag alone.
fn preamble(kind: RequestKind) -> String {
    let task = match kind {
        RequestKind::SkillMap => {
            "Propose starter quests that map the learner's current skills: \
             one probe per skill area, easiest first."
        }
        RequestKind::DailyQuests => {
            "Propose today's learning quests for the learner: small, concrete, \
             time-boxed tasks ordered most-foundational first."
        }
        RequestKind::PolicyCheck => {
            "Review the supplied quests against the learner's constraints and \
             return the corrected quest list."
        }
        RequestKind::ClarityCheck => {
            "Rewrite the supplied quests so every title, step, and deliverable \
             is unambiguous, preserving their intent."
        }
    };
    format!(
        "You are a learning-quest generator. {task}\n\n\
         Respond with a JSON array of quest objects, each with:\n\
         - \"title\": short imperative task name\n\
         - \"pattern\": one of read_note_q, flashcards, build_micro, shadowing, \
         retrospective, drill_set, teach_back, case_study, timed_sprint, audio_immersion\n\
         - \"minutes\": integer 10-90\n\
         - \"difficulty\": number 0.0-1.0\n\
         - \"deliverable\": what the learner produces\n\
         - \"tags\": array of strings\n\
         - optional \"steps\" and \"criteria\" arrays\n\n\
         ONLY output the JSON array. No other text."
    )
}

/// Serialize the request payload for the model.
fn user_prompt(request: &CandidateRequest) -> Result<String, CandidateError> {
    let payload = serde_json::json!({
        "profile": request.profile,
        "skill_atoms": request.skill_atoms,
        "checkins": request.checkins,
    });
    Ok(format!(
        "Plan for this learner:\n{}",
        serde_json::to_string_pretty(&payload)?
    ))
}

/// Parse model output into drafts, unwrapping markdown if present.
fn parse_drafts(raw: &str, cap: usize) -> Result<Vec<QuestDraft>, CandidateError> {
    let json = extract_json_array(raw).ok_or_else(|| {
        error!(response = raw, "No JSON array found in candidate response");
        CandidateError::MalformedResponse {
            reason: "no JSON array in response".into(),
        }
    })?;
    let drafts: Vec<QuestDraft> = serde_json::from_str(&json)?;
    if drafts.is_empty() {
        return Err(CandidateError::EmptyResponse);
    }
    Ok(drafts.into_iter().take(cap).collect())
}

/// Extract a JSON array from output that may contain markdown or extra text.
fn extract_json_array(text: &str) -> Option<String> {
    let trimmed = text.trim();

    if trimmed.starts_with('[') {
        return Some(trimmed.to_string());
    }

    // Fenced code block, with or without a language tag.
    for fence in ["```json", "```"] {
        if let Some(start) = trimmed.find(fence) {
            let after = &trimmed[start + fence.len()..];
            if let Some(end) = after.find("```") {
                let inner = after[..end].trim();
                if inner.starts_with('[') {
                    return Some(inner.to_string());
                }
            }
        }
    }

    // Last resort: outermost bracket pair.
    let start = trimmed.find('[')?;
    let end = trimmed.rfind(']')?;
    (end > start).then(|| trimmed[start..=end].to_string())
}
