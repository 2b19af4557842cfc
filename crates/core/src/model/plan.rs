use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::PlanId;

/// Smallest plan length accepted by the generator.
pub const MIN_PLAN_DAYS: u32 = 1;
/// Largest plan length accepted by the generator.
pub const MAX_PLAN_DAYS: u32 = 90;
/// Plan length offered before the user picks one.
pub const DEFAULT_PLAN_DAYS: u32 = 7;
/// Curated plan lengths offered to the user.
pub const PLAN_DAY_OPTIONS: [u32; 6] = [3, 5, 7, 14, 21, 30];

/// Clamp a requested plan length into `[MIN_PLAN_DAYS, MAX_PLAN_DAYS]`.
#[must_use]
pub fn clamp_plan_days(days: u32) -> u32 {
    days.clamp(MIN_PLAN_DAYS, MAX_PLAN_DAYS)
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlanError {
    #[error("day numbers must be positive")]
    ZeroDay,

    #[error("day {0} appears more than once")]
    DuplicateDay(u32),

    #[error("day {day} listed after day {previous}")]
    OutOfOrder { previous: u32, day: u32 },
}

/// One day of a study plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Day {
    pub day: u32,
    pub title: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(default)]
    pub duration: String,
}

/// Loosely-typed plan as it arrives from the generator, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct StudyPlanDraft {
    pub title: String,
    #[serde(default)]
    pub overview: String,
    pub days: Vec<Day>,
    #[serde(default)]
    pub tips: Vec<String>,
}

/// A validated multi-day study plan.
///
/// Day numbers are positive and strictly increasing, but gaps are allowed.
/// Deserializing goes through `StudyPlanDraft` so an invalid plan can never be
/// observed downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StudyPlanDraft")]
pub struct StudyPlan {
    #[serde(skip)]
    id: Option<PlanId>,
    title: String,
    overview: String,
    days: Vec<Day>,
    tips: Vec<String>,
}

impl TryFrom<StudyPlanDraft> for StudyPlan {
    type Error = PlanError;

    fn try_from(draft: StudyPlanDraft) -> Result<Self, Self::Error> {
        let mut previous: Option<u32> = None;
        for day in &draft.days {
            if day.day == 0 {
                return Err(PlanError::ZeroDay);
            }
            match previous {
                Some(prev) if prev == day.day => return Err(PlanError::DuplicateDay(day.day)),
                Some(prev) if prev > day.day => {
                    return Err(PlanError::OutOfOrder {
                        previous: prev,
                        day: day.day,
                    });
                }
                _ => {}
            }
            previous = Some(day.day);
        }

        Ok(Self {
            id: None,
            title: draft.title,
            overview: draft.overview,
            days: draft.days,
            tips: draft.tips,
        })
    }
}

impl StudyPlan {
    #[must_use]
    pub fn with_id(mut self, id: PlanId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn id(&self) -> Option<PlanId> {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn overview(&self) -> &str {
        &self.overview
    }

    #[must_use]
    pub fn days(&self) -> &[Day] {
        &self.days
    }

    #[must_use]
    pub fn tips(&self) -> &[String] {
        &self.tips
    }

    #[must_use]
    pub fn has_day(&self, day: u32) -> bool {
        self.days.binary_search_by_key(&day, |d| d.day).is_ok()
    }
}
