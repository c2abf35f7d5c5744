use crate::domain::model::{Course, CourseEntry, Module, ModuleId, SmallGroup};
use std::collections::{BTreeSet, HashMap};

/// Indexed view over every loaded course and its modules.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CourseEntry>,
    module_index: HashMap<ModuleId, usize>,
    groups: HashMap<u32, Vec<SmallGroup>>,
}

impl Catalog {
    pub fn new(entries: Vec<CourseEntry>) -> Self {
        let mut module_index = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            for module in &entry.modules {
                module_index.insert(module.id.clone(), idx);
            }
        }

        Self {
            entries,
            module_index,
            groups: HashMap::new(),
        }
    }

    pub fn with_groups(mut self, groups: Vec<SmallGroup>) -> Self {
        for group in groups {
            self.groups.entry(group.semester).or_default().push(group);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CourseEntry] {
        &self.entries
    }

    pub fn module_ids(&self) -> Vec<ModuleId> {
        self.entries
            .iter()
            .flat_map(|entry| entry.modules.iter().map(|m| m.id.clone()))
            .collect()
    }

    pub fn entry_of(&self, module_id: &str) -> Option<&CourseEntry> {
        self.module_index.get(module_id).map(|idx| &self.entries[*idx])
    }

    pub fn course_of(&self, module_id: &str) -> Option<&Course> {
        self.entry_of(module_id).map(|entry| &entry.course)
    }

    pub fn module(&self, module_id: &str) -> Option<&Module> {
        self.entry_of(module_id)?
            .modules
            .iter()
            .find(|m| m.id == module_id)
    }

    /// Every module of the same (course, block, semester) occurrence, the
    /// given module included, in sequence order.
    pub fn siblings(&self, module_id: &str) -> Vec<&Module> {
        let Some(entry) = self.entry_of(module_id) else {
            return Vec::new();
        };
        let mut modules: Vec<&Module> = self
            .entries
            .iter()
            .filter(|other| {
                other.course.code == entry.course.code
                    && other.course.block == entry.course.block
                    && other.course.semester == entry.course.semester
            })
            .flat_map(|other| other.modules.iter())
            .collect();
        modules.sort_by_key(|m| m.sequence);
        modules
    }

    pub fn find_course(&self, code: &str, block: u32, semester: u32) -> Option<&Course> {
        self.entries
            .iter()
            .map(|entry| &entry.course)
            .find(|c| c.code == code && c.block == block && c.semester == semester)
    }

    pub fn courses_in(&self, semester: u32, block: u32) -> Vec<&CourseEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.course.semester == semester && entry.course.block == block)
            .collect()
    }

    pub fn block_of(&self, module_id: &str) -> Option<u32> {
        self.course_of(module_id).map(|course| course.block)
    }

    pub fn unique_groups(&self, semester: u32) -> usize {
        self.groups
            .get(&semester)
            .map(|groups| {
                groups
                    .iter()
                    .map(|g| g.group_name.as_str())
                    .collect::<BTreeSet<_>>()
                    .len()
            })
            .unwrap_or(0)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::domain::model::CourseType;

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

    pub fn groups(semester: u32, names: &[&str]) -> Vec<SmallGroup> {
        names
            .iter()
            .map(|name| SmallGroup {
                semester,
                group_name: name.to_string(),
            })
            .collect()
    }
}
