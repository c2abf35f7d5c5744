pub mod catalog;
pub mod conflict;
pub mod coordinator;
pub mod engine;
pub mod events;
pub mod matching;
pub(crate) mod refresh;
pub mod shortage;
pub(crate) mod state;
pub mod store;
pub mod warnings;

pub use catalog::Catalog;
pub use conflict::{ConflictKind, Rejection, RoleSelection, Verdict};
pub use coordinator::{AssignAttempt, AssignRequest, BatchReport, BatchStatus, ModuleFailure, MoveOutcome, SkillMismatch};
pub use engine::{AssignmentEngine, AssignmentEngineBuilder};
pub use events::{ChangeAction, ChangeNotification};
pub use matching::{ExactTagMatcher, FuzzyMatcher, MatchingEngine, SkillMatcher};
pub use shortage::SemesterShortage;
pub use store::AssignmentStore;
pub use warnings::{Warning, WarningKey, WarningKind};
