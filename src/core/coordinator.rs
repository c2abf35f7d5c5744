//! Fan-out assign / unassign / move against the persistence API.
//!
//! A single user action on one module applies to every sibling module of
//! the same course occurrence. Per-module calls run concurrently and each
//! outcome is recorded on its own; successes are never rolled back.

use crate::core::conflict::{Candidate, ConflictDetector, Rejection, Verdict};
use crate::core::events::{ChangeAction, ChangeNotification};
use crate::core::refresh::RefreshScheduler;
use crate::core::state::{EngineState, Shared};
use crate::core::warnings::Warning;
use crate::domain::model::{Assignment, Course, Lecturer, ModuleId, Role};
use crate::utils::error::{AssignError, Result};
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BatchStatus {
    Success,
    Partial,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleFailure {
    pub module_id: ModuleId,
    pub reason: String,
}

/// Aggregated outcome of one fan-out batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub status: BatchStatus,
    pub succeeded: Vec<ModuleId>,
    pub failed: Vec<ModuleFailure>,
    /// Targets needing no call (already bound / not bound).
    pub skipped: Vec<ModuleId>,
    pub warning: Option<String>,
}

impl BatchReport {
    fn new(succeeded: Vec<ModuleId>, failed: Vec<ModuleFailure>, skipped: Vec<ModuleId>) -> Self {
        let status = match (succeeded.is_empty(), failed.is_empty()) {
            (_, true) => BatchStatus::Success,
            (false, false) => BatchStatus::Partial,
            (true, false) => BatchStatus::Failure,
        };
        Self {
            status,
            succeeded,
            failed,
            skipped,
            warning: None,
        }
    }

    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn summary(&self) -> String {
        format!("{} of {} modules succeeded", self.succeeded.len(), self.attempted())
    }
}

/// Soft validation result: needs an explicit yes before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillMismatch {
    pub lecturer_name: String,
    pub course_code: String,
    pub lecturer_skills: BTreeSet<String>,
    pub required_skills: BTreeSet<String>,
}

impl fmt::Display for SkillMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} has skills [{}] but {} requires [{}]",
            self.lecturer_name,
            self.lecturer_skills.iter().cloned().collect::<Vec<_>>().join(", "),
            self.course_code,
            self.required_skills.iter().cloned().collect::<Vec<_>>().join(", ")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignAttempt {
    NeedsConfirmation(SkillMismatch),
    Completed(BatchReport),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Another move was still in flight.
    Dropped,
    NeedsConfirmation(SkillMismatch),
    Completed {
        unassigned: BatchReport,
        assigned: BatchReport,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignRequest {
    pub lecturer_id: String,
    pub module_id: ModuleId,
    pub confirm_mismatch: bool,
}

impl AssignRequest {
    pub fn new(lecturer_id: impl Into<String>, module_id: impl Into<ModuleId>) -> Self {
        Self {
            lecturer_id: lecturer_id.into(),
            module_id: module_id.into(),
            confirm_mismatch: false,
        }
    }

    pub fn confirmed(mut self) -> Self {
        self.confirm_mismatch = true;
        self
    }
}

/// Everything needed to dispatch an assign batch, captured under the read lock.
struct AssignPlan {
    lecturer: Lecturer,
    course: Course,
    role: Role,
    skill_mismatch: bool,
    siblings: Vec<ModuleId>,
    overload: Option<String>,
}

enum Screening {
    Ready(AssignPlan),
    NeedsConfirmation(SkillMismatch),
}

pub struct TransactionCoordinator {
    shared: Arc<Shared>,
    move_gate: Mutex<()>,
}

impl TransactionCoordinator {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            move_gate: Mutex::new(()),
        }
    }

    pub async fn assign(&self, request: &AssignRequest) -> Result<AssignAttempt> {
        let course = self.ensure_assignable(&request.module_id).await?;
        let screening = {
            let state = self.shared.state.read().await;
            self.screen(&state, request, &course, BTreeSet::new())?
        };

        match screening {
            Screening::NeedsConfirmation(mismatch) => {
                tracing::info!("Skill mismatch needs confirmation: {}", mismatch);
                Ok(AssignAttempt::NeedsConfirmation(mismatch))
            }
            Screening::Ready(plan) => Ok(AssignAttempt::Completed(self.execute_assign(plan).await)),
        }
    }

    pub async fn unassign(&self, lecturer_id: &str, module_id: &str) -> Result<BatchReport> {
        let (targets, skipped) = {
            let state = self.shared.state.read().await;
            state.ensure_loaded()?;
            // the lecturer may no longer be in the registry
            let siblings = sibling_ids(&state, module_id)?;
            siblings
                .into_iter()
                .partition::<Vec<_>, _>(|m| state.store.is_bound(m, lecturer_id))
        };
        Ok(self.execute_unassign(lecturer_id, targets, skipped).await)
    }

    /// Unassign from `from_module`'s course, then assign to `to_module`'s.
    ///
    /// Not atomic: if the second step fails the lecturer stays unbound.
    pub async fn move_lecturer(
        &self,
        lecturer_id: &str,
        from_module: &str,
        to_module: &str,
        confirm_mismatch: bool,
    ) -> Result<MoveOutcome> {
        let Ok(_in_flight) = self.move_gate.try_lock() else {
            tracing::warn!("Move of {} dropped: another move is still in flight", lecturer_id);
            return Ok(MoveOutcome::Dropped);
        };

        let course = self.ensure_assignable(to_module).await?;
        let request = AssignRequest {
            lecturer_id: lecturer_id.to_string(),
            module_id: to_module.to_string(),
            confirm_mismatch,
        };

        let (plan, source, skipped) = {
            let state = self.shared.state.read().await;
            let siblings = sibling_ids(&state, from_module)?;
            let (source, skipped): (Vec<_>, Vec<_>) = siblings
                .into_iter()
                .partition(|m| state.store.is_bound(m, lecturer_id));
            let released: BTreeSet<ModuleId> = source.iter().cloned().collect();

            match self.screen(&state, &request, &course, released)? {
                Screening::NeedsConfirmation(mismatch) => {
                    return Ok(MoveOutcome::NeedsConfirmation(mismatch));
                }
                Screening::Ready(plan) => (plan, source, skipped),
            }
        };

        let unassigned = self.execute_unassign(lecturer_id, source, skipped).await;
        let assigned = self.execute_assign(plan).await;

        if assigned.status == BatchStatus::Failure {
            tracing::warn!(
                "Move of {} to {} failed after release ({}); lecturer left without these bindings",
                lecturer_id,
                course.code,
                assigned.summary()
            );
        }

        Ok(MoveOutcome::Completed { unassigned, assigned })
    }

    /// Loaded data plus a generated block; no persistence call happens before this passes.
    async fn ensure_assignable(&self, module_id: &str) -> Result<Course> {
        let course = {
            let state = self.shared.state.read().await;
            state.ensure_loaded()?;
            state
                .catalog
                .course_of(module_id)
                .cloned()
                .ok_or_else(|| AssignError::not_found("Module", module_id))?
        };

        if !self.shared.status.is_generated(course.block).await? {
            return Err(AssignError::PreconditionError {
                message: format!(
                    "Block {} has not been generated yet; manual assignment is unavailable",
                    course.block
                ),
            });
        }
        Ok(course)
    }

    fn screen(
        &self,
        state: &EngineState,
        request: &AssignRequest,
        course: &Course,
        released: BTreeSet<ModuleId>,
    ) -> Result<Screening> {
        let lecturer = state.lecturer(&request.lecturer_id)?;
        let matching = &self.shared.matching;
        let role = matching.resolve_role(lecturer, course, course.semester, course.block);

        let detector = ConflictDetector::new(
            &state.catalog,
            &state.store,
            &state.lecturers,
            self.shared.settings.overload_threshold,
        )
        .excluding(released);

        let overload = match detector.evaluate(&Candidate::for_course(lecturer, course, role), &[]) {
            Verdict::Reject(rejection) => {
                tracing::info!("Assignment of {} to {} rejected: {}", lecturer.id, course.code, rejection);
                return Err(AssignError::ConflictError(rejection));
            }
            Verdict::AllowWithWarning(warning) => Some(warning),
            Verdict::Allow => None,
        };

        let skill_mismatch = !matching.skill_matches(lecturer, course);
        if skill_mismatch && !request.confirm_mismatch {
            return Ok(Screening::NeedsConfirmation(SkillMismatch {
                lecturer_name: lecturer.name.clone(),
                course_code: course.code.clone(),
                lecturer_skills: lecturer.skills.clone(),
                required_skills: course.required_skills.clone(),
            }));
        }

        Ok(Screening::Ready(AssignPlan {
            lecturer: lecturer.clone(),
            course: course.clone(),
            role,
            skill_mismatch,
            siblings: sibling_ids(state, &request.module_id)?,
            overload,
        }))
    }

    async fn execute_assign(&self, plan: AssignPlan) -> BatchReport {
        let lecturer_id = plan.lecturer.id.clone();

        let (staged, skipped) = {
            let mut state = self.shared.state.write().await;
            // bindings may have changed while earlier writes were in flight
            if let Some(rejection) = self.recheck(&state, &plan) {
                drop(state);
                tracing::info!(
                    "Assignment of {} to {} rejected at write time: {}",
                    lecturer_id,
                    plan.course.code,
                    rejection
                );
                let failed = plan
                    .siblings
                    .iter()
                    .map(|module_id| ModuleFailure {
                        module_id: module_id.clone(),
                        reason: rejection.reason.clone(),
                    })
                    .collect();
                let report = BatchReport::new(Vec::new(), failed, Vec::new());
                self.log_report(&format!("assign {} to {}", lecturer_id, plan.course.code), &report);
                RefreshScheduler::schedule(&self.shared, Vec::new());
                return report;
            }

            let mut staged = Vec::new();
            let mut skipped = Vec::new();
            for module_id in &plan.siblings {
                let draft = Assignment::new(module_id.clone(), lecturer_id.clone(), plan.role)
                    .with_skill_mismatch(plan.skill_mismatch);
                if state.store.stage(draft.clone()) {
                    staged.push(draft);
                } else {
                    skipped.push(module_id.clone());
                }
            }
            (staged, skipped)
        };

        let api = &self.shared.api;
        let outcomes = join_all(staged.iter().map(|draft| async move {
            tracing::debug!("Creating {} binding {} -> {}", draft.role, draft.lecturer_id, draft.module_id);
            (draft.module_id.clone(), api.assign(draft).await)
        }))
        .await;

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        {
            let mut state = self.shared.state.write().await;
            for (module_id, outcome) in outcomes {
                match outcome {
                    Ok(server) => {
                        state.store.confirm(&module_id, &lecturer_id, Some(server));
                        succeeded.push(module_id);
                    }
                    Err(e) => {
                        state.store.discard(&module_id, &lecturer_id);
                        failed.push(ModuleFailure {
                            module_id,
                            reason: e.to_string(),
                        });
                    }
                }
            }
            if let Some(warning) = &plan.overload {
                state
                    .warnings
                    .upsert(Warning::overload(lecturer_id.clone(), warning.clone()));
            }
        }

        let mut report = BatchReport::new(succeeded, failed, skipped);
        report.warning = plan.overload;
        self.log_report(&format!("assign {} to {}", lecturer_id, plan.course.code), &report);

        if !report.succeeded.is_empty() {
            self.shared.events.publish(ChangeNotification::new(
                lecturer_id,
                ChangeAction::Assigned,
                report.succeeded.clone(),
            ));
        }
        RefreshScheduler::schedule(&self.shared, report.succeeded.clone());
        report
    }

    fn recheck(&self, state: &EngineState, plan: &AssignPlan) -> Option<Rejection> {
        let lecturer = state.lecturers.get(&plan.lecturer.id).unwrap_or(&plan.lecturer);
        ConflictDetector::new(
            &state.catalog,
            &state.store,
            &state.lecturers,
            self.shared.settings.overload_threshold,
        )
        .is_blocked(&Candidate::for_course(lecturer, &plan.course, plan.role), &[])
    }

    async fn execute_unassign(&self, lecturer_id: &str, targets: Vec<ModuleId>, skipped: Vec<ModuleId>) -> BatchReport {
        let api = &self.shared.api;
        let outcomes = join_all(targets.iter().map(|module_id| async move {
            tracing::debug!("Deleting binding {} -> {}", lecturer_id, module_id);
            (module_id.clone(), api.unassign(module_id, lecturer_id).await)
        }))
        .await;

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        {
            let mut state = self.shared.state.write().await;
            for (module_id, outcome) in outcomes {
                match outcome {
                    Ok(()) => {
                        state.store.remove(&module_id, lecturer_id);
                        succeeded.push(module_id);
                    }
                    Err(e) => failed.push(ModuleFailure {
                        module_id,
                        reason: e.to_string(),
                    }),
                }
            }
        }

        let report = BatchReport::new(succeeded, failed, skipped);
        self.log_report(&format!("unassign {}", lecturer_id), &report);

        if !report.succeeded.is_empty() {
            self.shared.events.publish(ChangeNotification::new(
                lecturer_id.to_string(),
                ChangeAction::Unassigned,
                report.succeeded.clone(),
            ));
        }
        RefreshScheduler::schedule(&self.shared, report.succeeded.clone());
        report
    }

    fn log_report(&self, action: &str, report: &BatchReport) {
        match report.status {
            BatchStatus::Success => tracing::info!(
                "✅ {}: {} ({} skipped)",
                action,
                report.summary(),
                report.skipped.len()
            ),
            BatchStatus::Partial | BatchStatus::Failure => {
                tracing::warn!("❌ {}: {}", action, report.summary());
                for failure in &report.failed {
                    tracing::warn!("   module {}: {}", failure.module_id, failure.reason);
                }
            }
        }
    }
}

fn sibling_ids(state: &EngineState, module_id: &str) -> Result<Vec<ModuleId>> {
    let siblings = state.catalog.siblings(module_id);
    if siblings.is_empty() {
        return Err(AssignError::not_found("Module", module_id));
    }
    Ok(siblings.into_iter().map(|m| m.id.clone()).collect())
}
