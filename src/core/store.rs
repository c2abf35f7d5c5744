//! In-process index of module bindings.
//!
//! Entries are keyed by `(module, lecturer)` so a lecturer can hold at most
//! one binding per module. Local writes enter as [`Phase::Pending`] and are
//! promoted to [`Phase::Confirmed`] once the backend acknowledges them, or
//! discarded when it does not. Snapshots only ever show confirmed entries.

use crate::domain::model::{Assignment, LecturerId, ModuleId};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pending,
    Confirmed,
}

#[derive(Debug, Clone)]
struct Entry {
    assignment: Assignment,
    phase: Phase,
}

#[derive(Debug, Clone, Default)]
pub struct AssignmentStore {
    entries: HashMap<(ModuleId, LecturerId), Entry>,
    by_module: HashMap<ModuleId, BTreeSet<LecturerId>>,
    by_lecturer: HashMap<LecturerId, BTreeSet<ModuleId>>,
    counts: HashMap<LecturerId, u32>,
}

impl AssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole store with server state.
    pub fn rebuild(&mut self, assignments: HashMap<ModuleId, Vec<Assignment>>) {
        self.entries.clear();
        self.by_module.clear();
        self.by_lecturer.clear();
        self.counts.clear();
        for (module_id, list) in assignments {
            self.replace_module(&module_id, list);
        }
    }

    /// Overwrite one module's confirmed bindings with server state. Pending
    /// entries the server does not know about yet are kept.
    pub fn replace_module(&mut self, module_id: &str, assignments: Vec<Assignment>) {
        let mut pending = Vec::new();
        if let Some(lecturers) = self.by_module.remove(module_id) {
            for lecturer_id in lecturers {
                let was_pending = self.phase(module_id, &lecturer_id) == Some(Phase::Pending);
                if let Some(assignment) = self.unlink(module_id, &lecturer_id) {
                    if was_pending {
                        pending.push(assignment);
                    }
                }
            }
        }

        for assignment in assignments {
            if assignment.module_id != module_id {
                tracing::warn!(
                    "Ignoring assignment for module {} returned under {}",
                    assignment.module_id,
                    module_id
                );
                continue;
            }
            if let Some(count) = assignment.assignment_count {
                self.counts.insert(assignment.lecturer_id.clone(), count);
            }
            self.insert(assignment, Phase::Confirmed);
        }

        for assignment in pending {
            if !self.is_bound(&assignment.module_id, &assignment.lecturer_id) {
                self.insert(assignment, Phase::Pending);
            }
        }
    }

    /// Record a speculative binding. Returns `false` if the lecturer is
    /// already bound to the module in any phase.
    pub fn stage(&mut self, assignment: Assignment) -> bool {
        if self.is_bound(&assignment.module_id, &assignment.lecturer_id) {
            return false;
        }
        self.insert(assignment, Phase::Pending);
        true
    }

    pub fn confirm(&mut self, module_id: &str, lecturer_id: &str, server: Option<Assignment>) -> bool {
        let key = (module_id.to_string(), lecturer_id.to_string());
        match self.entries.get_mut(&key) {
            Some(entry) => {
                if let Some(server) = server {
                    if let Some(count) = server.assignment_count {
                        self.counts.insert(lecturer_id.to_string(), count);
                    }
                    entry.assignment.role = server.role;
                    entry.assignment.skill_mismatch = server.skill_mismatch;
                }
                entry.phase = Phase::Confirmed;
                true
            }
            None => false,
        }
    }

    /// Drop a pending entry. Confirmed entries are left untouched.
    pub fn discard(&mut self, module_id: &str, lecturer_id: &str) -> bool {
        match self.phase(module_id, lecturer_id) {
            Some(Phase::Pending) => {
                self.unlink(module_id, lecturer_id);
                true
            }
            _ => false,
        }
    }

    pub fn remove(&mut self, module_id: &str, lecturer_id: &str) -> Option<Assignment> {
        self.unlink(module_id, lecturer_id)
    }

    pub fn is_bound(&self, module_id: &str, lecturer_id: &str) -> bool {
        self.entries
            .contains_key(&(module_id.to_string(), lecturer_id.to_string()))
    }

    pub fn phase(&self, module_id: &str, lecturer_id: &str) -> Option<Phase> {
        self.entries
            .get(&(module_id.to_string(), lecturer_id.to_string()))
            .map(|entry| entry.phase)
    }

    pub fn for_module(&self, module_id: &str) -> Vec<&Assignment> {
        self.by_module
            .get(module_id)
            .into_iter()
            .flatten()
            .filter_map(|lecturer_id| self.entries.get(&(module_id.to_string(), lecturer_id.clone())))
            .filter(|entry| entry.phase == Phase::Confirmed)
            .map(|entry| &entry.assignment)
            .collect()
    }

    /// All bindings of a lecturer, pending ones included.
    pub fn for_lecturer(&self, lecturer_id: &str) -> Vec<&Assignment> {
        self.by_lecturer
            .get(lecturer_id)
            .into_iter()
            .flatten()
            .filter_map(|module_id| self.entries.get(&(module_id.clone(), lecturer_id.to_string())))
            .map(|entry| &entry.assignment)
            .collect()
    }

    pub fn modules_of(&self, lecturer_id: &str) -> BTreeSet<ModuleId> {
        self.by_lecturer.get(lecturer_id).cloned().unwrap_or_default()
    }

    /// Running count reported by the backend, if any read has carried one.
    pub fn assignment_count(&self, lecturer_id: &str) -> Option<u32> {
        self.counts.get(lecturer_id).copied()
    }

    pub fn snapshot(&self) -> BTreeMap<ModuleId, Vec<Assignment>> {
        let mut snapshot = BTreeMap::new();
        for module_id in self.by_module.keys() {
            let list: Vec<Assignment> = self.for_module(module_id).into_iter().cloned().collect();
            if !list.is_empty() {
                snapshot.insert(module_id.clone(), list);
            }
        }
        snapshot
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, assignment: Assignment, phase: Phase) {
        let module_id = assignment.module_id.clone();
        let lecturer_id = assignment.lecturer_id.clone();
        self.by_module
            .entry(module_id.clone())
            .or_default()
            .insert(lecturer_id.clone());
        self.by_lecturer
            .entry(lecturer_id.clone())
            .or_default()
            .insert(module_id.clone());
        self.entries
            .insert((module_id, lecturer_id), Entry { assignment, phase });
    }

    fn unlink(&mut self, module_id: &str, lecturer_id: &str) -> Option<Assignment> {
        let entry = self
            .entries
            .remove(&(module_id.to_string(), lecturer_id.to_string()))?;

        if let Some(lecturers) = self.by_module.get_mut(module_id) {
            lecturers.remove(lecturer_id);
            if lecturers.is_empty() {
                self.by_module.remove(module_id);
            }
        }
        if let Some(modules) = self.by_lecturer.get_mut(lecturer_id) {
            modules.remove(module_id);
            if modules.is_empty() {
                self.by_lecturer.remove(lecturer_id);
            }
        }
        Some(entry.assignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Role;

    fn bound(module: &str, lecturer: &str) -> Assignment {
        Assignment::new(module, lecturer, Role::Instructor)
    }

    #[test]
    fn test_stage_rejects_duplicate_binding() {
        let mut store = AssignmentStore::new();
        assert!(store.stage(bound("M1", "L1")));
        assert!(!store.stage(bound("M1", "L1")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_pending_entries_hidden_until_confirmed() {
        let mut store = AssignmentStore::new();
        store.stage(bound("M1", "L1"));

        assert!(store.snapshot().is_empty());
        assert_eq!(store.for_lecturer("L1").len(), 1);

        assert!(store.confirm("M1", "L1", None));
        assert_eq!(store.snapshot()["M1"].len(), 1);
        assert_eq!(store.phase("M1", "L1"), Some(Phase::Confirmed));
    }

    #[test]
    fn test_discard_only_drops_pending() {
        let mut store = AssignmentStore::new();
        store.stage(bound("M1", "L1"));
        assert!(store.discard("M1", "L1"));
        assert!(!store.is_bound("M1", "L1"));

        store.stage(bound("M2", "L1"));
        store.confirm("M2", "L1", None);
        assert!(!store.discard("M2", "L1"));
        assert!(store.is_bound("M2", "L1"));
    }

    #[test]
    fn test_indexes_stay_in_sync_on_remove() {
        let mut store = AssignmentStore::new();
        store.stage(bound("M1", "L1"));
        store.stage(bound("M2", "L1"));
        store.stage(bound("M1", "L2"));

        store.remove("M1", "L1");

        assert_eq!(store.modules_of("L1").into_iter().collect::<Vec<_>>(), vec!["M2"]);
        assert_eq!(store.for_lecturer("L2").len(), 1);
        assert!(store.for_lecturer("L3").is_empty());
    }

    #[test]
    fn test_replace_module_takes_server_truth_and_counts() {
        let mut store = AssignmentStore::new();
        store.stage(bound("M1", "L1"));
        store.confirm("M1", "L1", None);

        let mut server = bound("M1", "L2");
        server.assignment_count = Some(4);
        store.replace_module("M1", vec![server]);

        assert!(!store.is_bound("M1", "L1"));
        assert_eq!(store.phase("M1", "L2"), Some(Phase::Confirmed));
        assert_eq!(store.assignment_count("L2"), Some(4));
    }

    #[test]
    fn test_replace_module_keeps_unacknowledged_pending() {
        let mut store = AssignmentStore::new();
        store.stage(bound("M1", "L1"));
        store.stage(bound("M1", "L2"));

        store.replace_module("M1", vec![bound("M1", "L2")]);

        assert_eq!(store.phase("M1", "L1"), Some(Phase::Pending));
        assert_eq!(store.phase("M1", "L2"), Some(Phase::Confirmed));
        assert_eq!(store.modules_of("L1").len(), 1);
    }

    #[test]
    fn test_rebuild_wipes_previous_state() {
        let mut store = AssignmentStore::new();
        store.stage(bound("OLD", "L1"));

        let mut fresh = HashMap::new();
        fresh.insert("M9".to_string(), vec![bound("M9", "L3")]);
        store.rebuild(fresh);

        assert!(!store.is_bound("OLD", "L1"));
        assert!(store.is_bound("M9", "L3"));
        assert!(store.modules_of("L1").is_empty());
    }
}
