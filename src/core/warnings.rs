use crate::domain::model::LecturerId;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum WarningKind {
    Shortage,
    Overload { lecturer_id: LecturerId },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct WarningKey {
    pub semester: Option<u32>,
    pub kind: WarningKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub key: WarningKey,
    pub message: String,
}

impl Warning {
    pub fn shortage(semester: u32, message: String) -> Self {
        Self {
            key: WarningKey {
                semester: Some(semester),
                kind: WarningKind::Shortage,
            },
            message,
        }
    }

    pub fn overload(lecturer_id: LecturerId, message: String) -> Self {
        Self {
            key: WarningKey {
                semester: None,
                kind: WarningKind::Overload { lecturer_id },
            },
            message,
        }
    }

    fn is_shortage(&self) -> bool {
        self.key.kind == WarningKind::Shortage
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarningDiff {
    pub added: Vec<Warning>,
    pub removed: Vec<Warning>,
}

impl WarningDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Ordered warning list, at most one entry per key.
#[derive(Debug, Clone, Default)]
pub struct WarningBoard {
    warnings: Vec<Warning>,
}

impl WarningBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite by key, keeping the original position.
    pub fn upsert(&mut self, warning: Warning) {
        match self.warnings.iter_mut().find(|w| w.key == warning.key) {
            Some(existing) => existing.message = warning.message,
            None => self.warnings.push(warning),
        }
    }

    pub fn clear_key(&mut self, key: &WarningKey) -> Option<Warning> {
        let idx = self.warnings.iter().position(|w| &w.key == key)?;
        Some(self.warnings.remove(idx))
    }

    /// Swap the whole shortage set for `fresh`; other kinds are untouched.
    pub fn replace_shortages(&mut self, mut fresh: Vec<Warning>) -> WarningDiff {
        fresh.retain(|w| w.is_shortage());
        fresh.sort_by_key(|w| w.key.semester);

        let previous: Vec<Warning> = self.warnings.iter().filter(|w| w.is_shortage()).cloned().collect();
        let diff = WarningDiff {
            added: fresh.iter().filter(|w| !previous.contains(w)).cloned().collect(),
            removed: previous.iter().filter(|w| !fresh.contains(w)).cloned().collect(),
        };

        self.warnings.retain(|w| !w.is_shortage());
        self.warnings.extend(fresh);
        diff
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn messages(&self) -> Vec<String> {
        self.warnings.iter().map(|w| w.message.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_shortages_keeps_other_kinds() {
        let mut board = WarningBoard::new();
        board.upsert(Warning::overload("L1".to_string(), "L1 overloaded".to_string()));
        board.replace_shortages(vec![
            Warning::shortage(5, "semester 5 short".to_string()),
            Warning::shortage(3, "semester 3 short".to_string()),
        ]);

        assert_eq!(
            board.messages(),
            vec!["L1 overloaded", "semester 3 short", "semester 5 short"]
        );

        let diff = board.replace_shortages(vec![Warning::shortage(3, "semester 3 short".to_string())]);
        assert!(diff.added.is_empty());
        assert_eq!(diff.removed.len(), 1);
        assert_eq!(diff.removed[0].key.semester, Some(5));
        assert_eq!(board.messages(), vec!["L1 overloaded", "semester 3 short"]);
    }

    #[test]
    fn test_replace_with_changed_text_reports_both_sides() {
        let mut board = WarningBoard::new();
        board.replace_shortages(vec![Warning::shortage(1, "short of 4".to_string())]);
        let diff = board.replace_shortages(vec![Warning::shortage(1, "short of 2".to_string())]);

        assert_eq!(diff.added.len(), 1);
        assert_eq!(diff.removed.len(), 1);
        assert_eq!(board.warnings().len(), 1);
    }

    #[test]
    fn test_upsert_overwrites_same_key() {
        let mut board = WarningBoard::new();
        board.upsert(Warning::overload("L1".to_string(), "4 assignments".to_string()));
        board.upsert(Warning::overload("L1".to_string(), "5 assignments".to_string()));
        assert_eq!(board.messages(), vec!["5 assignments"]);

        let key = board.warnings()[0].key.clone();
        assert!(board.clear_key(&key).is_some());
        assert!(board.is_empty());
    }
}
