use crate::domain::model::{Course, Lecturer, Role};
use std::collections::BTreeSet;

/// Strategy deciding whether a lecturer's skills cover a course.
pub trait SkillMatcher: Send + Sync {
    fn matches(&self, lecturer_skills: &BTreeSet<String>, required: &BTreeSet<String>) -> bool;

    fn name(&self) -> &'static str;
}

/// Case-insensitive equality of at least one tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactTagMatcher;

impl SkillMatcher for ExactTagMatcher {
    fn matches(&self, lecturer_skills: &BTreeSet<String>, required: &BTreeSet<String>) -> bool {
        let required: BTreeSet<String> = required.iter().map(|s| normalize(s)).collect();
        lecturer_skills
            .iter()
            .any(|skill| required.contains(&normalize(skill)))
    }

    fn name(&self) -> &'static str {
        "exact"
    }
}

/// Substring containment in either direction, or any shared word.
///
/// Known to over-match: "Neurosurgery" satisfies "surgery".
#[derive(Debug, Clone, Copy, Default)]
pub struct FuzzyMatcher;

impl SkillMatcher for FuzzyMatcher {
    fn matches(&self, lecturer_skills: &BTreeSet<String>, required: &BTreeSet<String>) -> bool {
        lecturer_skills.iter().any(|skill| {
            let skill = normalize(skill);
            if skill.is_empty() {
                return false;
            }
            required.iter().any(|req| {
                let req = normalize(req);
                !req.is_empty()
                    && (skill.contains(&req) || req.contains(&skill) || shares_word(&skill, &req))
            })
        })
    }

    fn name(&self) -> &'static str {
        "fuzzy"
    }
}

fn normalize(token: &str) -> String {
    token.trim().to_lowercase()
}

fn shares_word(a: &str, b: &str) -> bool {
    let words: BTreeSet<&str> = a.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()).collect();
    b.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .any(|w| words.contains(w))
}

/// Skill compatibility and role resolution.
pub struct MatchingEngine {
    matcher: Box<dyn SkillMatcher>,
}

impl MatchingEngine {
    pub fn new(matcher: Box<dyn SkillMatcher>) -> Self {
        Self { matcher }
    }

    pub fn exact() -> Self {
        Self::new(Box::new(ExactTagMatcher))
    }

    pub fn fuzzy() -> Self {
        Self::new(Box::new(FuzzyMatcher))
    }

    pub fn matcher_name(&self) -> &'static str {
        self.matcher.name()
    }

    /// Standby lecturers match everything, as do courses without required skills.
    pub fn skill_matches(&self, lecturer: &Lecturer, course: &Course) -> bool {
        if lecturer.standby || course.required_skills.is_empty() {
            return true;
        }
        self.matcher.matches(&lecturer.skills, &course.required_skills)
    }

    /// Declared role for this exact course occurrence, or Instructor.
    pub fn resolve_role(&self, lecturer: &Lecturer, course: &Course, semester: u32, block: u32) -> Role {
        lecturer
            .declared_roles
            .iter()
            .find(|decl| {
                decl.course_code == course.code && decl.semester == semester && decl.block == block
            })
            .map(|decl| Role::from(decl.role_type))
            .unwrap_or(Role::Instructor)
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::exact()
    }
}
