use crate::core::shortage::ODD_SEMESTERS;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{AssignError, Result};
use crate::utils::logger::LogFormat;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::{DEFAULT_BROADCAST_CAPACITY, DEFAULT_OVERLOAD_THRESHOLD, DEFAULT_SETTLE_DELAY_MS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub backend: BackendConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    pub logging: Option<LoggingConfig>,
    pub fixtures: Option<FixturesConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_seconds: Option<u64>,
    pub headers: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub block: Option<u32>,
    pub semesters: Option<Vec<u32>>,
    pub settle_delay_ms: Option<u64>,
    pub overload_threshold: Option<u32>,
    /// "exact" (default) or "fuzzy"
    pub skill_matching: Option<String>,
    pub broadcast_capacity: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub format: Option<LogFormat>,
    pub verbose: Option<bool>,
}

/// Local JSON file standing in for the catalog and lecturer registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixturesConfig {
    pub catalog_file: String,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AssignError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AssignError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${API_TOKEN})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AssignError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("backend.base_url", &self.backend.base_url)?;

        if let Some(timeout) = self.backend.timeout_seconds {
            validation::validate_range("backend.timeout_seconds", timeout, 1, 300)?;
        }

        if let Some(block) = self.engine.block {
            validation::validate_positive_number("engine.block", block as usize, 1)?;
        }

        if let Some(semesters) = &self.engine.semesters {
            validation::validate_odd_semesters("engine.semesters", semesters)?;
        }

        if let Some(capacity) = self.engine.broadcast_capacity {
            validation::validate_positive_number("engine.broadcast_capacity", capacity, 1)?;
        }

        if let Some(mode) = &self.engine.skill_matching {
            let valid_modes = ["exact", "fuzzy"];
            if !valid_modes.contains(&mode.as_str()) {
                return Err(AssignError::InvalidConfigValueError {
                    field: "engine.skill_matching".to_string(),
                    value: mode.clone(),
                    reason: format!("Unsupported mode. Valid modes: {}", valid_modes.join(", ")),
                });
            }
        }

        if let Some(fixtures) = &self.fixtures {
            validation::validate_file_extension("fixtures.catalog_file", &fixtures.catalog_file, &["json"])?;
        }

        Ok(())
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.backend.timeout_seconds.unwrap_or(10)
    }

    pub fn log_format(&self) -> LogFormat {
        self.logging
            .as_ref()
            .and_then(|l| l.format)
            .unwrap_or_default()
    }

    pub fn verbose(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.verbose).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn block(&self) -> Option<u32> {
        self.engine.block
    }

    fn semesters(&self) -> &[u32] {
        self.engine.semesters.as_deref().unwrap_or(&ODD_SEMESTERS)
    }

    fn settle_delay_ms(&self) -> u64 {
        self.engine.settle_delay_ms.unwrap_or(DEFAULT_SETTLE_DELAY_MS)
    }

    fn overload_threshold(&self) -> u32 {
        self.engine.overload_threshold.unwrap_or(DEFAULT_OVERLOAD_THRESHOLD)
    }

    fn fuzzy_skill_matching(&self) -> bool {
        self.engine.skill_matching.as_deref() == Some("fuzzy")
    }

    fn broadcast_capacity(&self) -> usize {
        self.engine.broadcast_capacity.unwrap_or(DEFAULT_BROADCAST_CAPACITY)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
