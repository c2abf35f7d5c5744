use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub type LecturerId = String;
pub type ModuleId = String;

/// Role a lecturer may declare for a course occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RoleType {
    Coordinator,
    TeamMember,
}

impl RoleType {
    pub fn opposite(self) -> RoleType {
        match self {
            RoleType::Coordinator => RoleType::TeamMember,
            RoleType::TeamMember => RoleType::Coordinator,
        }
    }
}

/// Role carried by an assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Coordinator,
    TeamMember,
    #[default]
    Instructor,
}

impl From<RoleType> for Role {
    fn from(role_type: RoleType) -> Self {
        match role_type {
            RoleType::Coordinator => Role::Coordinator,
            RoleType::TeamMember => Role::TeamMember,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Coordinator => "Coordinator",
            Role::TeamMember => "TeamMember",
            Role::Instructor => "Instructor",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDeclaration {
    pub course_code: String,
    pub block: u32,
    pub semester: u32,
    pub role_type: RoleType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lecturer {
    pub id: LecturerId,
    pub name: String,
    /// Staff identifier (e.g. employee number).
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub skills: BTreeSet<String>,
    #[serde(default)]
    pub standby: bool,
    #[serde(default)]
    pub declared_roles: Vec<RoleDeclaration>,
    #[serde(default)]
    pub assignment_count: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CourseType {
    #[default]
    Block,
    NonBlock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub code: String,
    pub name: String,
    pub semester: u32,
    pub block: u32,
    #[serde(default)]
    pub course_type: CourseType,
    #[serde(default)]
    pub required_skills: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: ModuleId,
    pub course_code: String,
    pub sequence: u32,
    pub title: String,
}

/// A course together with the modules it owns, as supplied by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseEntry {
    pub course: Course,
    #[serde(default)]
    pub modules: Vec<Module>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub module_id: ModuleId,
    pub lecturer_id: LecturerId,
    pub role: Role,
    #[serde(default)]
    pub skill_mismatch: bool,
    /// Running total reported by the backend on reads; absent on writes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment_count: Option<u32>,
}

impl Assignment {
    pub fn new(module_id: impl Into<ModuleId>, lecturer_id: impl Into<LecturerId>, role: Role) -> Self {
        Self {
            module_id: module_id.into(),
            lecturer_id: lecturer_id.into(),
            role,
            skill_mismatch: false,
            assignment_count: None,
        }
    }

    pub fn with_skill_mismatch(mut self, skill_mismatch: bool) -> Self {
        self.skill_mismatch = skill_mismatch;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmallGroup {
    pub semester: u32,
    pub group_name: String,
}
