use crate::config::EngineSettings;
use crate::core::catalog::Catalog;
use crate::core::events::ChangeBroadcaster;
use crate::core::matching::MatchingEngine;
use crate::core::refresh::RefreshScheduler;
use crate::core::shortage::ShortageCalculator;
use crate::core::store::AssignmentStore;
use crate::core::warnings::{WarningBoard, WarningDiff};
use crate::domain::model::{Lecturer, LecturerId};
use crate::domain::ports::{AssignmentApi, GenerationStatus};
use crate::utils::error::{AssignError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Everything the engine knows about the loaded block.
#[derive(Debug, Default)]
pub(crate) struct EngineState {
    pub catalog: Catalog,
    pub lecturers: HashMap<LecturerId, Lecturer>,
    pub store: AssignmentStore,
    pub warnings: WarningBoard,
    pub block: u32,
    pub loaded: bool,
}

impl EngineState {
    pub fn ensure_loaded(&self) -> Result<()> {
        if self.loaded {
            Ok(())
        } else {
            Err(AssignError::PreconditionError {
                message: "Assignment data has not been loaded yet".to_string(),
            })
        }
    }

    pub fn lecturer(&self, lecturer_id: &str) -> Result<&Lecturer> {
        self.lecturers
            .get(lecturer_id)
            .ok_or_else(|| AssignError::not_found("Lecturer", lecturer_id))
    }

    pub fn recompute_shortages(&mut self, matching: &MatchingEngine, semesters: &[u32]) -> WarningDiff {
        let fresh = ShortageCalculator::new(&self.catalog, &self.store, &self.lecturers, matching)
            .warnings(semesters, self.block);
        let diff = self.warnings.replace_shortages(fresh);
        for warning in &diff.added {
            tracing::info!("⚠️ {}", warning.message);
        }
        for warning in &diff.removed {
            tracing::debug!("Cleared shortage warning for semester {:?}", warning.key.semester);
        }
        diff
    }
}

/// State and collaborators shared by the coordinator and background refreshes.
pub(crate) struct Shared {
    pub state: RwLock<EngineState>,
    pub api: Arc<dyn AssignmentApi>,
    pub status: Arc<dyn GenerationStatus>,
    pub matching: MatchingEngine,
    pub settings: EngineSettings,
    pub events: ChangeBroadcaster,
    pub refresh: RefreshScheduler,
}
