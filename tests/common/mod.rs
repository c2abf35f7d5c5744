#![allow(dead_code)]

use async_trait::async_trait;
use lecturer_assign::domain::model::{
    Assignment, Course, CourseEntry, CourseType, Lecturer, Module, ModuleId, Role, RoleDeclaration, RoleType,
    SmallGroup,
};
use lecturer_assign::domain::ports::{AssignmentApi, CatalogProvider, GenerationStatus, LecturerRegistry};
use lecturer_assign::utils::error::{AssignError, Result};
use lecturer_assign::{AssignmentEngine, EngineSettings};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory backend that behaves like the remote store, with failure injection.
pub struct MockBackend {
    pub entries: Vec<CourseEntry>,
    pub groups: Vec<SmallGroup>,
    pub lecturers: Vec<Lecturer>,
    pub generated: AtomicBool,
    pub bound: Mutex<Vec<Assignment>>,
    pub fail_modules: Mutex<HashSet<ModuleId>>,
    pub writes: Mutex<Vec<String>>,
    pub write_delay: Duration,
}

impl MockBackend {
    pub fn new(entries: Vec<CourseEntry>, lecturers: Vec<Lecturer>) -> Self {
        Self {
            entries,
            groups: vec![],
            lecturers,
            generated: AtomicBool::new(true),
            bound: Mutex::new(vec![]),
            fail_modules: Mutex::new(HashSet::new()),
            writes: Mutex::new(vec![]),
            write_delay: Duration::ZERO,
        }
    }

    pub fn with_groups(mut self, groups: Vec<SmallGroup>) -> Self {
        self.groups.extend(groups);
        self
    }

    pub fn with_bindings(self, bindings: &[(&str, &str, Role)]) -> Self {
        {
            let mut bound = self.bound.lock().unwrap();
            for (module, lecturer, role) in bindings {
                bound.push(Assignment::new(*module, *lecturer, *role));
            }
        }
        self
    }

    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = delay;
        self
    }

    pub fn not_generated(self) -> Self {
        self.generated.store(false, Ordering::SeqCst);
        self
    }

    pub fn fail_on(&self, module_id: &str) {
        self.fail_modules.lock().unwrap().insert(module_id.to_string());
    }

    pub fn write_log(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    pub fn is_bound(&self, module_id: &str, lecturer_id: &str) -> bool {
        self.bound
            .lock()
            .unwrap()
            .iter()
            .any(|a| a.module_id == module_id && a.lecturer_id == lecturer_id)
    }

    fn count_for(&self, lecturer_id: &str) -> u32 {
        self.bound
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.lecturer_id == lecturer_id)
            .count() as u32
    }

    fn should_fail(&self, module_id: &str) -> bool {
        self.fail_modules.lock().unwrap().contains(module_id)
    }
}

#[async_trait]
impl CatalogProvider for MockBackend {
    async fn courses(&self) -> Result<Vec<CourseEntry>> {
        Ok(self.entries.clone())
    }

    async fn small_groups(&self, semester: u32) -> Result<Vec<SmallGroup>> {
        Ok(self.groups.iter().filter(|g| g.semester == semester).cloned().collect())
    }
}

#[async_trait]
impl LecturerRegistry for MockBackend {
    async fn lecturers(&self) -> Result<Vec<Lecturer>> {
        Ok(self.lecturers.clone())
    }
}

#[async_trait]
impl GenerationStatus for MockBackend {
    async fn is_generated(&self, _block: u32) -> Result<bool> {
        Ok(self.generated.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl AssignmentApi for MockBackend {
    async fn assign(&self, assignment: &Assignment) -> Result<Assignment> {
        if !self.write_delay.is_zero() {
            tokio::time::sleep(self.write_delay).await;
        }
        self.writes
            .lock()
            .unwrap()
            .push(format!("assign {} {}", assignment.module_id, assignment.lecturer_id));
        if self.should_fail(&assignment.module_id) {
            return Err(AssignError::PersistenceError {
                module_id: assignment.module_id.clone(),
                message: "create responded with status 500".to_string(),
            });
        }
        self.bound.lock().unwrap().push(assignment.clone());
        let mut created = assignment.clone();
        created.assignment_count = Some(self.count_for(&assignment.lecturer_id));
        Ok(created)
    }

    async fn unassign(&self, module_id: &str, lecturer_id: &str) -> Result<()> {
        if !self.write_delay.is_zero() {
            tokio::time::sleep(self.write_delay).await;
        }
        self.writes
            .lock()
            .unwrap()
            .push(format!("unassign {} {}", module_id, lecturer_id));
        if self.should_fail(module_id) {
            return Err(AssignError::PersistenceError {
                module_id: module_id.to_string(),
                message: "delete responded with status 500".to_string(),
            });
        }
        self.bound
            .lock()
            .unwrap()
            .retain(|a| !(a.module_id == module_id && a.lecturer_id == lecturer_id));
        Ok(())
    }

    async fn batch_get_assignments(&self, module_ids: &[ModuleId]) -> Result<HashMap<ModuleId, Vec<Assignment>>> {
        let bound = self.bound.lock().unwrap().clone();
        let mut fresh: HashMap<ModuleId, Vec<Assignment>> = HashMap::new();
        for a in bound {
            if module_ids.contains(&a.module_id) {
                let mut with_count = a.clone();
                with_count.assignment_count = Some(self.count_for(&a.lecturer_id));
                fresh.entry(a.module_id.clone()).or_default().push(with_count);
            }
        }
        Ok(fresh)
    }
}

pub fn course(code: &str, semester: u32, block: u32, skills: &[&str], modules: usize) -> CourseEntry {
    CourseEntry {
        course: Course {
            code: code.to_string(),
            name: format!("Course {}", code),
            semester,
            block,
            course_type: CourseType::Block,
            required_skills: skills.iter().map(|s| s.to_string()).collect(),
        },
        modules: (1..=modules)
            .map(|seq| Module {
                id: format!("{}-M{}", code, seq),
                course_code: code.to_string(),
                sequence: seq as u32,
                title: format!("{} module {}", code, seq),
            })
            .collect(),
    }
}

pub fn lecturer(id: &str, name: &str, skills: &[&str]) -> Lecturer {
    Lecturer {
        id: id.to_string(),
        name: name.to_string(),
        identifier: format!("NIP-{}", id),
        skills: skills.iter().map(|s| s.to_string()).collect(),
        standby: false,
        declared_roles: vec![],
        assignment_count: 0,
    }
}

pub fn standby(id: &str, name: &str) -> Lecturer {
    Lecturer {
        standby: true,
        ..lecturer(id, name, &[])
    }
}

pub fn declared(mut lecturer: Lecturer, course_code: &str, block: u32, semester: u32, role_type: RoleType) -> Lecturer {
    lecturer.declared_roles.push(RoleDeclaration {
        course_code: course_code.to_string(),
        block,
        semester,
        role_type,
    });
    lecturer
}

pub fn groups(semester: u32, names: &[&str]) -> Vec<SmallGroup> {
    names
        .iter()
        .map(|name| SmallGroup {
            semester,
            group_name: name.to_string(),
        })
        .collect()
}

pub fn engine_for(backend: &Arc<MockBackend>) -> AssignmentEngine {
    AssignmentEngine::builder()
        .catalog(backend.clone())
        .registry(backend.clone())
        .api(backend.clone())
        .status(backend.clone())
        .settings(EngineSettings::default().with_settle_delay(Duration::from_millis(10)))
        .build()
        .unwrap()
}

pub async fn loaded_engine(backend: MockBackend, block: u32) -> (Arc<MockBackend>, AssignmentEngine) {
    let backend = Arc::new(backend);
    let engine = engine_for(&backend);
    engine.load(block).await.unwrap();
    (backend, engine)
}
