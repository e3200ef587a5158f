//! User profile, planning context, and skill-graph input types.

pub mod context;
pub mod model;
pub mod skills;

pub use context::{AdjustmentContext, Checkin, MoodSignal, PlanningContext, RiskSignals};
pub use model::{CompletionRecord, DayType, KnownField, Profile, ProfileField};
pub use skills::SkillAtom;
