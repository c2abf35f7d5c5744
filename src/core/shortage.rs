use crate::core::catalog::Catalog;
use crate::core::matching::MatchingEngine;
use crate::core::store::AssignmentStore;
use crate::core::warnings::Warning;
use crate::domain::model::{Lecturer, LecturerId, Role};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Odd (ganjil) semesters tracked by default.
pub const ODD_SEMESTERS: [u32; 4] = [1, 3, 5, 7];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SemesterShortage {
    pub semester: u32,
    pub total_modules: usize,
    pub total_groups: usize,
    pub required_instructors: usize,
    pub assigned_instructors: usize,
    pub required_skills: BTreeSet<String>,
}

impl SemesterShortage {
    pub fn shortfall(&self) -> usize {
        self.required_instructors.saturating_sub(self.assigned_instructors)
    }

    pub fn is_short(&self) -> bool {
        self.assigned_instructors < self.required_instructors
    }

    pub fn message(&self) -> String {
        let skills = if self.required_skills.is_empty() {
            "any".to_string()
        } else {
            self.required_skills.iter().cloned().collect::<Vec<_>>().join(", ")
        };
        format!(
            "semester {} short of {} lecturers with skills {}; needs {} of {} total",
            self.semester,
            self.shortfall(),
            skills,
            self.required_instructors,
            self.required_instructors
        )
    }
}

/// Per-semester instructor capacity for one block.
pub struct ShortageCalculator<'a> {
    catalog: &'a Catalog,
    store: &'a AssignmentStore,
    lecturers: &'a HashMap<LecturerId, Lecturer>,
    matching: &'a MatchingEngine,
}

impl<'a> ShortageCalculator<'a> {
    pub fn new(
        catalog: &'a Catalog,
        store: &'a AssignmentStore,
        lecturers: &'a HashMap<LecturerId, Lecturer>,
        matching: &'a MatchingEngine,
    ) -> Self {
        Self {
            catalog,
            store,
            lecturers,
            matching,
        }
    }

    pub fn semester(&self, semester: u32, block: u32) -> SemesterShortage {
        let courses = self.catalog.courses_in(semester, block);
        let total_modules: usize = courses.iter().map(|entry| entry.modules.len()).sum();
        let total_groups = self.catalog.unique_groups(semester);

        let mut instructors: BTreeSet<&str> = BTreeSet::new();
        let mut required_skills = BTreeSet::new();
        for entry in &courses {
            required_skills.extend(entry.course.required_skills.iter().cloned());
            for module in &entry.modules {
                for assignment in self.store.for_module(&module.id) {
                    if assignment.role != Role::Instructor {
                        continue;
                    }
                    // a declared Coordinator/TeamMember is not instructor capacity
                    let declared_other = self
                        .lecturers
                        .get(&assignment.lecturer_id)
                        .map(|l| self.matching.resolve_role(l, &entry.course, semester, block) != Role::Instructor)
                        .unwrap_or(false);
                    if !declared_other {
                        instructors.insert(assignment.lecturer_id.as_str());
                    }
                }
            }
        }

        SemesterShortage {
            semester,
            total_modules,
            total_groups,
            required_instructors: total_groups * total_modules,
            assigned_instructors: instructors.len(),
            required_skills,
        }
    }

    pub fn compute(&self, semesters: &[u32], block: u32) -> Vec<SemesterShortage> {
        semesters.iter().map(|s| self.semester(*s, block)).collect()
    }

    pub fn warnings(&self, semesters: &[u32], block: u32) -> Vec<Warning> {
        self.compute(semesters, block)
            .into_iter()
            .filter(SemesterShortage::is_short)
            .map(|s| Warning::shortage(s.semester, s.message()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::fixtures::{course, groups};
    use crate::domain::model::{Assignment, RoleDeclaration, RoleType};

    fn lecturer(id: &str) -> Lecturer {
        Lecturer {
            id: id.to_string(),
            name: id.to_string(),
            identifier: String::new(),
            skills: BTreeSet::new(),
            standby: false,
            declared_roles: vec![],
            assignment_count: 0,
        }
    }

    fn bind(store: &mut AssignmentStore, module: &str, lecturer: &str) {
        store.stage(Assignment::new(module, lecturer, Role::Instructor));
        store.confirm(module, lecturer, None);
    }

    #[test]
    fn test_required_is_groups_times_modules() {
        let catalog = Catalog::new(vec![
            course("CARD", 3, 1, &["Cardiology"], 3),
            course("SURG", 3, 1, &["Surgery"], 1),
            course("LATE", 3, 2, &["Other"], 5),
        ])
        .with_groups(groups(3, &["A", "B"]));
        let store = AssignmentStore::new();
        let lecturers = HashMap::new();
        let matching = MatchingEngine::default();
        let calc = ShortageCalculator::new(&catalog, &store, &lecturers, &matching);

        let s3 = calc.semester(3, 1);
        assert_eq!(s3.total_modules, 4);
        assert_eq!(s3.total_groups, 2);
        assert_eq!(s3.required_instructors, 8);
        assert_eq!(s3.shortfall(), 8);
    }

    #[test]
    fn test_declared_roles_do_not_count_as_instructors() {
        let catalog = Catalog::new(vec![course("CARD", 3, 1, &["Cardiology"], 2)])
            .with_groups(groups(3, &["A"]));
        let mut store = AssignmentStore::new();
        bind(&mut store, "CARD-M1", "L1");
        bind(&mut store, "CARD-M2", "L1");
        bind(&mut store, "CARD-M2", "L2");

        let mut coordinator = lecturer("L2");
        coordinator.declared_roles.push(RoleDeclaration {
            course_code: "CARD".to_string(),
            block: 1,
            semester: 3,
            role_type: RoleType::Coordinator,
        });
        let lecturers: HashMap<_, _> = vec![lecturer("L1"), coordinator]
            .into_iter()
            .map(|l| (l.id.clone(), l))
            .collect();
        let matching = MatchingEngine::default();
        let calc = ShortageCalculator::new(&catalog, &store, &lecturers, &matching);

        let s3 = calc.semester(3, 1);
        assert_eq!(s3.assigned_instructors, 1);
        assert_eq!(s3.required_instructors, 2);
        assert!(s3.is_short());
    }

    #[test]
    fn test_no_warning_when_capacity_met_or_nothing_required() {
        let catalog = Catalog::new(vec![course("CARD", 1, 1, &[], 1)]).with_groups(groups(1, &["A"]));
        let mut store = AssignmentStore::new();
        bind(&mut store, "CARD-M1", "L1");
        let lecturers = HashMap::new();
        let matching = MatchingEngine::default();
        let calc = ShortageCalculator::new(&catalog, &store, &lecturers, &matching);

        assert!(calc.warnings(&ODD_SEMESTERS, 1).is_empty());
    }

    #[test]
    fn test_message_format() {
        let shortage = SemesterShortage {
            semester: 3,
            total_modules: 4,
            total_groups: 2,
            required_instructors: 8,
            assigned_instructors: 5,
            required_skills: ["Surgery", "Anatomy"].iter().map(|s| s.to_string()).collect(),
        };
        assert_eq!(
            shortage.message(),
            "semester 3 short of 3 lecturers with skills Anatomy, Surgery; needs 8 of 8 total"
        );
    }
}
