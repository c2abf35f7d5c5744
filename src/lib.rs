pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{Cli, Command};

pub use adapters::{FileCatalog, HttpBackend};
pub use config::{toml_config::TomlConfig, EngineSettings};
pub use core::{AssignAttempt, AssignRequest, AssignmentEngine, BatchReport, BatchStatus, MoveOutcome};
pub use utils::error::{AssignError, Result};
