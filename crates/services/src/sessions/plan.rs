use std::fmt;
use std::sync::Arc;

use study_core::PlanProgress;
use study_core::model::plan::DEFAULT_PLAN_DAYS;
use study_core::model::{Material, StudyPlan, clamp_plan_days};
use tracing::{debug, info, warn};

use crate::Clock;
use crate::error::PlanTrackerError;
use crate::generation::ArtifactGenerator;
use crate::mirror::PersistenceMirror;

/// Study plan over one material plus the learner's per-day completion flags.
pub struct PlanTracker {
    material: Material,
    days: u32,
    plan: Option<StudyPlan>,
    progress: PlanProgress,
    generator: Arc<dyn ArtifactGenerator>,
    mirror: PersistenceMirror,
    clock: Clock,
}

impl PlanTracker {
    #[must_use]
    pub fn new(
        material: Material,
        generator: Arc<dyn ArtifactGenerator>,
        mirror: PersistenceMirror,
        clock: Clock,
    ) -> Self {
        Self {
            material,
            days: DEFAULT_PLAN_DAYS,
            plan: None,
            progress: PlanProgress::new(),
            generator,
            mirror,
            clock,
        }
    }

    #[must_use]
    pub fn material(&self) -> &Material {
        &self.material
    }

    pub(crate) fn into_material(self) -> Material {
        self.material
    }

    /// Plan length used by the next `generate` call.
    #[must_use]
    pub fn days(&self) -> u32 {
        self.days
    }

    /// Set the plan length, clamped into the supported range.
    pub fn set_days(&mut self, days: u32) -> u32 {
        self.days = clamp_plan_days(days);
        self.days
    }

    #[must_use]
    pub fn plan(&self) -> Option<&StudyPlan> {
        self.plan.as_ref()
    }

    #[must_use]
    pub fn progress(&self) -> &PlanProgress {
        &self.progress
    }

    #[must_use]
    pub fn mirror(&self) -> &PersistenceMirror {
        &self.mirror
    }

    pub async fn flush(&mut self) {
        self.mirror.flush().await;
    }

    /// Generate a plan spanning `days` days (clamped) and make it the active one.
    ///
    /// Success replaces any previous plan and clears progress. Failure leaves
    /// the previous plan and its progress untouched.
    ///
    /// # Errors
    ///
    /// Returns `PlanTrackerError::Generation` when the generator fails.
    pub async fn generate(&mut self, days: u32) -> Result<&StudyPlan, PlanTrackerError> {
        let days = self.set_days(days);
        debug!(days, "requesting study plan");

        let plan = match self
            .generator
            .generate_plan(self.material.content(), days)
            .await
        {
            Ok(plan) => plan,
            Err(err) => {
                warn!(error = %err, "plan generation failed");
                return Err(PlanTrackerError::Generation(err));
            }
        };

        let plan = match self
            .mirror
            .save_plan(self.material.id(), &plan, self.clock.now())
            .await
        {
            Some(id) => plan.with_id(id),
            None => plan,
        };
        info!(days = plan.days().len(), plan_id = ?plan.id(), "study plan ready");

        self.progress = PlanProgress::new();
        Ok(self.plan.insert(plan))
    }

    /// Flip the completion flag for `day` and return the new value.
    ///
    /// The flag is mirrored to the store in the background when the plan was saved.
    ///
    /// # Errors
    ///
    /// Returns `PlanTrackerError::NoPlan` before a plan exists and
    /// `PlanTrackerError::UnknownDay` for a day the plan does not contain.
    pub fn toggle_day(&mut self, day: u32) -> Result<bool, PlanTrackerError> {
        let plan = self.plan.as_ref().ok_or(PlanTrackerError::NoPlan)?;
        if !plan.has_day(day) {
            return Err(PlanTrackerError::UnknownDay(day));
        }
        let plan_id = plan.id();

        let completed = self.progress.toggle(day);
        debug!(day, completed, "toggled plan day");

        if let Some(plan_id) = plan_id {
            self.mirror.record_progress(plan_id, day, completed);
        }
        Ok(completed)
    }

    #[must_use]
    pub fn is_day_complete(&self, day: u32) -> bool {
        self.progress.is_complete(day)
    }

    /// Completed days over plan days; 0 without a plan or with an empty one.
    #[must_use]
    pub fn completion_ratio(&self) -> f64 {
        self.plan
            .as_ref()
            .map_or(0.0, |p| self.progress.completion_ratio(p.days().len()))
    }

    /// Drop the plan and its progress.
    pub fn reset(&mut self) {
        self.plan = None;
        self.progress = PlanProgress::new();
    }
}

impl fmt::Debug for PlanTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanTracker")
            .field("material", &self.material.title())
            .field("days", &self.days)
            .field("plan_id", &self.plan.as_ref().and_then(StudyPlan::id))
            .field("progress", &self.progress)
            .field("mirror", &self.mirror)
            .finish_non_exhaustive()
    }
}
