use crate::domain::model::{Assignment, CourseEntry, Lecturer, ModuleId, SmallGroup};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Courses, their modules and small-group rosters.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// The whole catalog; block scoping happens in the engine.
    async fn courses(&self) -> Result<Vec<CourseEntry>>;
    async fn small_groups(&self, semester: u32) -> Result<Vec<SmallGroup>>;
}

#[async_trait]
pub trait LecturerRegistry: Send + Sync {
    async fn lecturers(&self) -> Result<Vec<Lecturer>>;
}

/// Remote store of module bindings.
#[async_trait]
pub trait AssignmentApi: Send + Sync {
    async fn assign(&self, assignment: &Assignment) -> Result<Assignment>;
    async fn unassign(&self, module_id: &str, lecturer_id: &str) -> Result<()>;
    async fn batch_get_assignments(
        &self,
        module_ids: &[ModuleId],
    ) -> Result<HashMap<ModuleId, Vec<Assignment>>>;
}

#[async_trait]
pub trait GenerationStatus: Send + Sync {
    async fn is_generated(&self, block: u32) -> Result<bool>;
}

pub trait ConfigProvider: Send + Sync {
    fn block(&self) -> Option<u32>;
    fn semesters(&self) -> &[u32];
    fn settle_delay_ms(&self) -> u64;
    fn overload_threshold(&self) -> u32;
    fn fuzzy_skill_matching(&self) -> bool;
    fn broadcast_capacity(&self) -> usize;
}
