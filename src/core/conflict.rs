use crate::core::catalog::Catalog;
use crate::core::store::AssignmentStore;
use crate::domain::model::{Course, Lecturer, LecturerId, ModuleId, Role, RoleType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// A role choice the user has made but not yet saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleSelection {
    pub course_code: String,
    pub block: u32,
    pub semester: u32,
    pub role_type: RoleType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    RoleExclusivity,
    CoordinatorTaken,
    BlockExclusivity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub kind: ConflictKind,
    pub reason: String,
    /// Name of the lecturer already holding the coordinator seat.
    pub holder: Option<String>,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    AllowWithWarning(String),
    Reject(Rejection),
}

impl Verdict {
    pub fn is_blocking(&self) -> bool {
        matches!(self, Verdict::Reject(_))
    }
}

/// A proposed binding of one lecturer to one course occurrence.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub lecturer: &'a Lecturer,
    pub course: &'a Course,
    pub block: u32,
    pub semester: u32,
    pub desired_role: Role,
}

impl<'a> Candidate<'a> {
    pub fn for_course(lecturer: &'a Lecturer, course: &'a Course, desired_role: Role) -> Self {
        Self {
            lecturer,
            course,
            block: course.block,
            semester: course.semester,
            desired_role,
        }
    }
}

pub struct ConflictDetector<'a> {
    catalog: &'a Catalog,
    store: &'a AssignmentStore,
    lecturers: &'a HashMap<LecturerId, Lecturer>,
    overload_threshold: u32,
    excluded: BTreeSet<ModuleId>,
}

impl<'a> ConflictDetector<'a> {
    pub fn new(
        catalog: &'a Catalog,
        store: &'a AssignmentStore,
        lecturers: &'a HashMap<LecturerId, Lecturer>,
        overload_threshold: u32,
    ) -> Self {
        Self {
            catalog,
            store,
            lecturers,
            overload_threshold,
            excluded: BTreeSet::new(),
        }
    }

    /// Treat bindings on these modules as already released.
    pub fn excluding(mut self, modules: impl IntoIterator<Item = ModuleId>) -> Self {
        self.excluded.extend(modules);
        self
    }

    /// Checks run in order and stop at the first rejection.
    pub fn evaluate(&self, candidate: &Candidate<'_>, pending: &[RoleSelection]) -> Verdict {
        if let Some(rejection) = self.check_role_exclusivity(candidate, pending) {
            return Verdict::Reject(rejection);
        }
        if let Some(rejection) = self.check_coordinator(candidate) {
            return Verdict::Reject(rejection);
        }
        if let Some(rejection) = self.check_block(candidate) {
            return Verdict::Reject(rejection);
        }
        match self.check_overload(candidate.lecturer) {
            Some(warning) => Verdict::AllowWithWarning(warning),
            None => Verdict::Allow,
        }
    }

    /// Rejection that should disable this choice in a picker, if any.
    pub fn is_blocked(&self, candidate: &Candidate<'_>, pending: &[RoleSelection]) -> Option<Rejection> {
        match self.evaluate(candidate, pending) {
            Verdict::Reject(rejection) => Some(rejection),
            _ => None,
        }
    }

    fn check_role_exclusivity(&self, candidate: &Candidate<'_>, pending: &[RoleSelection]) -> Option<Rejection> {
        let desired = match candidate.desired_role {
            Role::Coordinator => RoleType::Coordinator,
            Role::TeamMember => RoleType::TeamMember,
            Role::Instructor => return None,
        };
        let opposite = desired.opposite();

        pending
            .iter()
            .find(|sel| {
                sel.block == candidate.block
                    && sel.semester == candidate.semester
                    && sel.role_type == opposite
            })
            .map(|sel| Rejection {
                kind: ConflictKind::RoleExclusivity,
                reason: format!(
                    "{} is already selected as {:?} for {} in block {} semester {}",
                    candidate.lecturer.name, sel.role_type, sel.course_code, sel.block, sel.semester
                ),
                holder: None,
            })
    }

    fn check_coordinator(&self, candidate: &Candidate<'_>) -> Option<Rejection> {
        if candidate.desired_role != Role::Coordinator {
            return None;
        }
        let holder = self.other_coordinator(candidate)?;

        let name = self
            .lecturers
            .get(&holder)
            .map(|l| l.name.clone())
            .unwrap_or(holder);
        Some(Rejection {
            kind: ConflictKind::CoordinatorTaken,
            reason: format!(
                "{} already coordinates {} in block {} semester {}",
                name, candidate.course.code, candidate.block, candidate.semester
            ),
            holder: Some(name),
        })
    }

    /// Another lecturer holding the coordinator seat, by declaration first,
    /// then by binding.
    fn other_coordinator(&self, candidate: &Candidate<'_>) -> Option<LecturerId> {
        let (code, block, semester) = (&candidate.course.code, candidate.block, candidate.semester);
        let me = &candidate.lecturer.id;

        let mut declared: Vec<&LecturerId> = self
            .lecturers
            .values()
            .filter(|l| &l.id != me)
            .filter(|l| {
                l.declared_roles.iter().any(|decl| {
                    decl.role_type == RoleType::Coordinator
                        && &decl.course_code == code
                        && decl.block == block
                        && decl.semester == semester
                })
            })
            .map(|l| &l.id)
            .collect();
        declared.sort();
        if let Some(id) = declared.first() {
            return Some((*id).clone());
        }

        self.catalog
            .entries()
            .iter()
            .filter(|entry| {
                &entry.course.code == code
                    && entry.course.block == block
                    && entry.course.semester == semester
            })
            .flat_map(|entry| entry.modules.iter())
            .filter(|module| !self.excluded.contains(&module.id))
            .flat_map(|module| self.store.for_module(&module.id))
            .find(|a| a.role == Role::Coordinator && &a.lecturer_id != me)
            .map(|a| a.lecturer_id.clone())
    }

    fn check_block(&self, candidate: &Candidate<'_>) -> Option<Rejection> {
        if candidate.lecturer.standby {
            return None;
        }

        let other_block = self
            .store
            .for_lecturer(&candidate.lecturer.id)
            .into_iter()
            .filter(|a| !self.excluded.contains(&a.module_id))
            .filter_map(|a| self.catalog.block_of(&a.module_id))
            .find(|block| *block != candidate.block)?;

        Some(Rejection {
            kind: ConflictKind::BlockExclusivity,
            reason: format!(
                "{} is already assigned in block {} and cannot teach in block {}",
                candidate.lecturer.name, other_block, candidate.block
            ),
            holder: None,
        })
    }

    fn check_overload(&self, lecturer: &Lecturer) -> Option<String> {
        if lecturer.standby {
            return None;
        }
        let count = self
            .store
            .assignment_count(&lecturer.id)
            .unwrap_or(lecturer.assignment_count);
        (count > self.overload_threshold).then(|| {
            format!(
                "{} already holds {} assignments (more than {})",
                lecturer.name, count, self.overload_threshold
            )
        })
    }
}
