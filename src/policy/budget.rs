//! Per-cycle constraint derivation.

use serde::{Deserialize, Serialize};

use crate::config::PlannerConfig;
use crate::profile::{DayType, Profile};

/// Floor for the daily budget regardless of check-in delta.
pub const MIN_DAY_MINUTES: u32 = 15;

/// Constraints for one planning cycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Constraints {
    /// Hard cap on the day's total minutes.
    pub total_minutes_max: u32,
    /// Hard cap on any single quest.
    pub max_session_minutes: u32,
    /// Hard cap on the number of quests.
    pub max_quest_count: usize,
}

impl Constraints {
    /// Derive today's constraints from day type and check-in delta.
    ///
    /// With no day-type signal the profile's own time budget stands in for
    /// the capacity table. The result is floored at 15 minutes no matter how
    /// negative the check-in delta is.
    pub fn derive(
        profile: &Profile,
        day_type: Option<DayType>,
        checkin_delta: i32,
        config: &PlannerConfig,
    ) -> Self {
        let capacity = day_type
            .map(|d| d.capacity())
            .unwrap_or(profile.time_budget_per_day);
        let total = (i64::from(capacity) + i64::from(checkin_delta))
            .max(i64::from(MIN_DAY_MINUTES)) as u32;
        Self {
            total_minutes_max: total,
            max_session_minutes: config.max_session_minutes,
            max_quest_count: config.max_quest_count,
        }
    }

    /// The capacity component used in derivation (for the rationale trace).
    pub fn capacity_of(profile: &Profile, day_type: Option<DayType>) -> u32 {
        day_type
            .map(|d| d.capacity())
            .unwrap_or(profile.time_budget_per_day)
    }
}
