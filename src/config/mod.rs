#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::shortage::ODD_SEMESTERS;
use crate::domain::ports::ConfigProvider;
use std::time::Duration;

pub const DEFAULT_BLOCK: u32 = 1;
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 500;
pub const DEFAULT_OVERLOAD_THRESHOLD: u32 = 3;
pub const DEFAULT_BROADCAST_CAPACITY: usize = 64;

/// Plain settings the engine runs with, whatever the configuration source.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub block: u32,
    pub semesters: Vec<u32>,
    pub settle_delay: Duration,
    pub overload_threshold: u32,
    pub fuzzy_skill_matching: bool,
    pub broadcast_capacity: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            block: DEFAULT_BLOCK,
            semesters: ODD_SEMESTERS.to_vec(),
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
            overload_threshold: DEFAULT_OVERLOAD_THRESHOLD,
            fuzzy_skill_matching: false,
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
        }
    }
}

impl EngineSettings {
    pub fn from_provider(provider: &dyn ConfigProvider) -> Self {
        Self {
            block: provider.block().unwrap_or(DEFAULT_BLOCK),
            semesters: provider.semesters().to_vec(),
            settle_delay: Duration::from_millis(provider.settle_delay_ms()),
            overload_threshold: provider.overload_threshold(),
            fuzzy_skill_matching: provider.fuzzy_skill_matching(),
            broadcast_capacity: provider.broadcast_capacity(),
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }
}
