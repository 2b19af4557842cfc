use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::StudyPlan;

/// Per-day completion flags of one study plan.
///
/// Sparse: a day with no entry counts as not completed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanProgress(BTreeMap<u32, bool>);

impl PlanProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild progress for `plan`, dropping flags for days it does not have.
    #[must_use]
    pub fn for_plan(plan: &StudyPlan, flags: impl IntoIterator<Item = (u32, bool)>) -> Self {
        Self(
            flags
                .into_iter()
                .filter(|(day, _)| plan.has_day(*day))
                .collect(),
        )
    }

    #[must_use]
    pub fn is_complete(&self, day: u32) -> bool {
        self.0.get(&day).copied().unwrap_or(false)
    }

    pub fn set(&mut self, day: u32, completed: bool) {
        self.0.insert(day, completed);
    }

    /// Flip the flag for `day` and return the new value.
    pub fn toggle(&mut self, day: u32) -> bool {
        let next = !self.is_complete(day);
        self.set(day, next);
        next
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.0.values().filter(|done| **done).count()
    }

    /// Completed days over `total_days`; 0 when there are no days.
    #[must_use]
    pub fn completion_ratio(&self, total_days: usize) -> f64 {
        if total_days == 0 {
            return 0.0;
        }
        // Both counts are far below 2^52.
        #[allow(clippy::cast_precision_loss)]
        let ratio = self.completed_count() as f64 / total_days as f64;
        ratio.min(1.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, bool)> + '_ {
        self.0.iter().map(|(day, done)| (*day, *done))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Day, StudyPlanDraft};

    fn plan(days: &[u32]) -> StudyPlan {
        StudyPlan::try_from(StudyPlanDraft {
            title: "Plan".into(),
            overview: String::new(),
            days: days
                .iter()
                .map(|n| Day {
                    day: *n,
                    title: format!("Day {n}"),
                    topics: Vec::new(),
                    objectives: Vec::new(),
                    activities: Vec::new(),
                    duration: String::new(),
                })
                .collect(),
            tips: Vec::new(),
        })
        .unwrap()
    }

    #[test]
    fn toggling_twice_restores_state() {
        let mut progress = PlanProgress::new();
        let before = progress.completion_ratio(3);

        assert!(progress.toggle(3));
        assert!(progress.is_complete(3));
        assert!(!progress.toggle(3));

        assert!(!progress.is_complete(3));
        assert!((progress.completion_ratio(3) - before).abs() < f64::EPSILON);
    }

    #[test]
    fn ratio_is_zero_without_days() {
        let mut progress = PlanProgress::new();
        progress.toggle(1);
        assert!(progress.completion_ratio(0).abs() < f64::EPSILON);
    }

    #[test]
    fn ratio_counts_only_true_flags() {
        let mut progress = PlanProgress::new();
        progress.toggle(1);
        progress.toggle(2);
        progress.toggle(2);
        assert!((progress.completion_ratio(4) - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn stale_days_are_discarded() {
        let plan = plan(&[1, 2, 3]);
        let progress = PlanProgress::for_plan(&plan, [(1, true), (9, true)]);
        assert_eq!(progress.iter().collect::<Vec<_>>(), vec![(1, true)]);
    }
}
