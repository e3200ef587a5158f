//! Bounded per-user adjustment history.

use std::collections::VecDeque;

use uuid::Uuid;

use super::model::DifficultyAdjustment;

/// Maximum retained adjustments per user.
pub const HISTORY_CAP: usize = 20;

/// Append-only ring buffer of a user's difficulty adjustments.
///
/// Capped at [`HISTORY_CAP`] entries; pushing beyond the cap evicts the
/// oldest entry. This is the only mutable state the planning core owns.
#[derive(Debug, Clone, Default)]
pub struct AdjustmentHistory {
    entries: VecDeque<DifficultyAdjustment>,
}

impl AdjustmentHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an adjustment, evicting the oldest entry at capacity.
    pub fn push(&mut self, adjustment: DifficultyAdjustment) {
        if self.entries.len() == HISTORY_CAP {
            self.entries.pop_front();
        }
        self.entries.push_back(adjustment);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest-to-newest iteration.
    pub fn iter(&self) -> impl Iterator<Item = &DifficultyAdjustment> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&DifficultyAdjustment> {
        self.entries.back()
    }

    /// Mark an entry as reversed.
    pub fn mark_rolled_back(&mut self, id: Uuid) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
            entry.rolled_back = true;
        }
    }

    /// Fraction of entries that are rollbacks of earlier adjustments.
    pub fn rollback_rate(&self) -> f32 {
        if self.entries.is_empty() {
            return 0.0;
        }
        self.entries.iter().filter(|e| e.is_rollback()).count() as f32 / self.entries.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjust::model::{AdjustmentKind, Magnitude};
    use crate::quests::Pattern;
    use chrono::Utc;

    fn adjustment(rollback_of: Option<Uuid>) -> DifficultyAdjustment {
        DifficultyAdjustment {
            id: Uuid::new_v4(),
            pattern: Pattern::DrillSet,
            original_difficulty: 0.5,
            adjusted_difficulty: 0.6,
            kind: AdjustmentKind::Increase,
            magnitude: Magnitude::Minor,
            confidence: 0.7,
            rollback_triggers: Vec::new(),
            reasoning: "test".into(),
            rollback_of,
            rolled_back: false,
            completions_at_creation: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn cap_evicts_oldest() {
        let mut history = AdjustmentHistory::new();
        let mut first_id = None;
        for i in 0..25 {
            let adj = adjustment(None);
            if i == 0 {
                first_id = Some(adj.id);
            }
            history.push(adj);
        }
        assert_eq!(history.len(), HISTORY_CAP);
        assert!(history.iter().all(|e| Some(e.id) != first_id));
    }

    #[test]
    fn rollback_rate_counts_rollbacks() {
        let mut history = AdjustmentHistory::new();
        let original = adjustment(None);
        let original_id = original.id;
        history.push(original);
        history.push(adjustment(Some(original_id)));
        assert!((history.rollback_rate() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn mark_rolled_back_flags_entry() {
        let mut history = AdjustmentHistory::new();
        let adj = adjustment(None);
        let id = adj.id;
        history.push(adj);
        history.mark_rolled_back(id);
        assert!(history.latest().unwrap().rolled_back);
    }
}
