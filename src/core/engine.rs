use crate::config::EngineSettings;
use crate::core::catalog::Catalog;
use crate::core::conflict::{Candidate, ConflictDetector, Rejection, RoleSelection};
use crate::core::coordinator::{AssignAttempt, AssignRequest, BatchReport, MoveOutcome, TransactionCoordinator};
use crate::core::events::{ChangeBroadcaster, ChangeNotification};
use crate::core::matching::{MatchingEngine, SkillMatcher};
use crate::core::refresh::RefreshScheduler;
use crate::core::shortage::{SemesterShortage, ShortageCalculator};
use crate::core::state::{EngineState, Shared};
use crate::core::warnings::Warning;
use crate::domain::model::{Assignment, Lecturer, ModuleId, Role};
use crate::domain::ports::{AssignmentApi, CatalogProvider, GenerationStatus, LecturerRegistry};
use crate::utils::error::{AssignError, Result};
use futures::future::join_all;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Entry point for loading a block and running assignment operations on it.
pub struct AssignmentEngine {
    catalog_provider: Arc<dyn CatalogProvider>,
    registry: Arc<dyn LecturerRegistry>,
    shared: Arc<Shared>,
    coordinator: TransactionCoordinator,
}

#[derive(Default)]
pub struct AssignmentEngineBuilder {
    catalog: Option<Arc<dyn CatalogProvider>>,
    registry: Option<Arc<dyn LecturerRegistry>>,
    api: Option<Arc<dyn AssignmentApi>>,
    status: Option<Arc<dyn GenerationStatus>>,
    settings: EngineSettings,
    matcher: Option<Box<dyn SkillMatcher>>,
}

impl AssignmentEngineBuilder {
    pub fn catalog(mut self, catalog: Arc<dyn CatalogProvider>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn registry(mut self, registry: Arc<dyn LecturerRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn api(mut self, api: Arc<dyn AssignmentApi>) -> Self {
        self.api = Some(api);
        self
    }

    pub fn status(mut self, status: Arc<dyn GenerationStatus>) -> Self {
        self.status = Some(status);
        self
    }

    pub fn settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Overrides the matcher selected by `settings.fuzzy_skill_matching`.
    pub fn matcher(mut self, matcher: Box<dyn SkillMatcher>) -> Self {
        self.matcher = Some(matcher);
        self
    }

    pub fn build(self) -> Result<AssignmentEngine> {
        let catalog = self.catalog.ok_or_else(|| missing("catalog"))?;
        let registry = self.registry.ok_or_else(|| missing("registry"))?;
        let api = self.api.ok_or_else(|| missing("api"))?;
        let status = self.status.ok_or_else(|| missing("status"))?;

        let matching = match self.matcher {
            Some(matcher) => MatchingEngine::new(matcher),
            None if self.settings.fuzzy_skill_matching => MatchingEngine::fuzzy(),
            None => MatchingEngine::exact(),
        };
        tracing::debug!("Using {} skill matching", matching.matcher_name());

        let shared = Arc::new(Shared {
            state: RwLock::new(EngineState::default()),
            api,
            status,
            matching,
            events: ChangeBroadcaster::new(self.settings.broadcast_capacity),
            refresh: RefreshScheduler::new(self.settings.settle_delay),
            settings: self.settings,
        });

        Ok(AssignmentEngine {
            catalog_provider: catalog,
            registry,
            coordinator: TransactionCoordinator::new(Arc::clone(&shared)),
            shared,
        })
    }
}

fn missing(field: &str) -> AssignError {
    AssignError::MissingConfigError {
        field: field.to_string(),
    }
}

impl AssignmentEngine {
    pub fn builder() -> AssignmentEngineBuilder {
        AssignmentEngineBuilder::default()
    }

    /// Full refresh: catalog, registry, groups and every binding are re-read
    /// and the store is rebuilt from scratch.
    pub async fn load(&self, block: u32) -> Result<()> {
        tracing::info!("Loading assignment data for block {}", block);

        let (courses, lecturers) = tokio::try_join!(
            self.catalog_provider.courses(),
            self.registry.lecturers()
        )?;

        let semesters = &self.shared.settings.semesters;
        let groups = join_all(semesters.iter().map(|s| self.catalog_provider.small_groups(*s)))
            .await
            .into_iter()
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect();

        let catalog = Catalog::new(courses).with_groups(groups);
        let module_ids = catalog.module_ids();
        let assignments = if module_ids.is_empty() {
            HashMap::new()
        } else {
            self.shared.api.batch_get_assignments(&module_ids).await?
        };

        let mut state = self.shared.state.write().await;
        state.store.rebuild(assignments);
        state.catalog = catalog;
        state.lecturers = lecturers.into_iter().map(|l| (l.id.clone(), l)).collect();
        state.block = block;
        state.loaded = true;
        tracing::info!(
            "Loaded {} courses, {} modules, {} lecturers, {} bindings",
            state.catalog.entries().len(),
            module_ids.len(),
            state.lecturers.len(),
            state.store.len()
        );
        // only shortages are replaced; overload warnings carry across reloads
        state.recompute_shortages(&self.shared.matching, semesters);
        Ok(())
    }

    /// Re-run [`load`](Self::load) for the block currently in scope.
    pub async fn reload(&self) -> Result<()> {
        let block = {
            let state = self.shared.state.read().await;
            state.ensure_loaded()?;
            state.block
        };
        self.load(block).await
    }

    pub async fn assign(&self, request: &AssignRequest) -> Result<AssignAttempt> {
        self.coordinator.assign(request).await
    }

    pub async fn unassign(&self, lecturer_id: &str, module_id: &str) -> Result<BatchReport> {
        self.coordinator.unassign(lecturer_id, module_id).await
    }

    pub async fn move_lecturer(
        &self,
        lecturer_id: &str,
        from_module: &str,
        to_module: &str,
        confirm_mismatch: bool,
    ) -> Result<MoveOutcome> {
        self.coordinator
            .move_lecturer(lecturer_id, from_module, to_module, confirm_mismatch)
            .await
    }

    /// Whether choosing `selection` should be disabled, given the user's
    /// other unsaved role choices.
    pub async fn is_blocked(
        &self,
        lecturer_id: &str,
        selection: &RoleSelection,
        pending: &[RoleSelection],
    ) -> Result<Option<Rejection>> {
        let state = self.shared.state.read().await;
        state.ensure_loaded()?;
        let lecturer = state.lecturer(lecturer_id)?;
        let course = state
            .catalog
            .find_course(&selection.course_code, selection.block, selection.semester)
            .ok_or_else(|| AssignError::not_found("Course", selection.course_code.clone()))?;

        let detector = ConflictDetector::new(
            &state.catalog,
            &state.store,
            &state.lecturers,
            self.shared.settings.overload_threshold,
        );
        let candidate = Candidate::for_course(lecturer, course, Role::from(selection.role_type));
        Ok(detector.is_blocked(&candidate, pending))
    }

    /// Confirmed bindings per module.
    pub async fn snapshot(&self) -> BTreeMap<ModuleId, Vec<Assignment>> {
        self.shared.state.read().await.store.snapshot()
    }

    pub async fn assignments_of(&self, lecturer_id: &str) -> Vec<Assignment> {
        let state = self.shared.state.read().await;
        state.store.for_lecturer(lecturer_id).into_iter().cloned().collect()
    }

    pub async fn warnings(&self) -> Vec<String> {
        self.shared.state.read().await.warnings.messages()
    }

    pub async fn warning_records(&self) -> Vec<Warning> {
        self.shared.state.read().await.warnings.warnings().to_vec()
    }

    pub async fn shortages(&self) -> Vec<SemesterShortage> {
        let state = self.shared.state.read().await;
        ShortageCalculator::new(&state.catalog, &state.store, &state.lecturers, &self.shared.matching)
            .compute(&self.shared.settings.semesters, state.block)
    }

    pub async fn catalog(&self) -> Catalog {
        self.shared.state.read().await.catalog.clone()
    }

    pub async fn lecturers(&self) -> Vec<Lecturer> {
        let state = self.shared.state.read().await;
        let mut list: Vec<Lecturer> = state.lecturers.values().cloned().collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        list
    }

    pub async fn block(&self) -> Option<u32> {
        let state = self.shared.state.read().await;
        state.loaded.then_some(state.block)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeNotification> {
        self.shared.events.subscribe()
    }

    /// Wait for debounced refreshes to finish.
    pub async fn settle(&self) {
        self.shared.refresh.settle().await;
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.shared.settings
    }
}
