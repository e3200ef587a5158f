//! Onboarding question selection — maximizes information gain under a
//! fatigue penalty and a hard question-count budget.

pub mod catalog;
pub mod scoring;

pub use catalog::{Applicability, QuestionBankItem, QuestionCategory, QuestionFormat};
pub use scoring::{
    PlannedQuestion, PriorityHints, QuestionPlan, SkipReason, SkippedQuestion, plan_questions,
};
