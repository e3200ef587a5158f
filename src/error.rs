//! Error types for the quest planner.

use std::time::Duration;

/// Top-level error type for the planning core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Candidate source error: {0}")]
    Candidate(#[from] CandidateError),

    #[error("Planning error: {0}")]
    Planning(#[from] PlanningError),
}

/// Errors from the external quest-candidate source.
///
/// These are always recovered inside the planner (deterministic template
/// fallback) — they never reach the caller of `plan_day`.
#[derive(Debug, thiserror::Error)]
pub enum CandidateError {
    #[error("Candidate request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Candidate request timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Malformed candidate response: {reason}")]
    MalformedResponse { reason: String },

    #[error("Candidate draft rejected: {reason}")]
    SchemaValidation { reason: String },

    #[error("Candidate source returned no usable drafts")]
    EmptyResponse,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Planning failures surfaced to the caller.
///
/// An empty-but-valid day does not exist: too few usable quests is an
/// explicit failure, not a zero-quest success.
#[derive(Debug, thiserror::Error)]
pub enum PlanningError {
    #[error("Insufficient candidates: {survivors} usable after constraint filtering, {required} required")]
    InsufficientCandidates { survivors: usize, required: usize },
}

/// Result type alias for the planning core.
pub type Result<T> = std::result::Result<T, Error>;
