// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::pool::SelectionPolicy;
use crate::core::types::BehaviorType;
use crate::infra::errors::{Result, SeqforgeError};
use crate::infra::paths;
use crate::output::OutputFormat;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub sandbox: SandboxConfig,

    #[serde(default)]
    pub classification: ClassificationConfig,

    #[serde(default)]
    pub contracts: ContractsConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub seed: u64,
    pub time_limit_secs: u64,
    /// Maximum candidate sequences to build. Unset means unlimited.
    pub input_limit: Option<u64>,
    /// Maximum tests to surface. Unset means unlimited.
    pub output_limit: Option<usize>,
    pub max_sequence_size: usize,
    /// Probability of passing `null` to a non-receiver reference slot.
    pub null_ratio: f64,
    /// Never fall back to `null` when the pool has no value of the type.
    pub forbid_null: bool,
    pub selection: SelectionPolicy,
    pub drop_nullary_after_use: bool,
    pub harvest_literals: bool,
    /// Longest string value fed back into the pool as a literal.
    pub max_string_length: usize,
    /// Stop after this many consecutive steps that add nothing to the pool.
    pub stall_limit: Option<u64>,
    pub include_expected_exceptions: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            time_limit_secs: 10,
            input_limit: None,
            output_limit: None,
            max_sequence_size: 100,
            null_ratio: 0.05,
            forbid_null: true,
            selection: SelectionPolicy::SizeBiased,
            drop_nullary_after_use: true,
            harvest_literals: true,
            max_string_length: 10_000,
            stall_limit: None,
            include_expected_exceptions: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Per-statement time box. Unset or 0 runs every call inline with no limit.
    pub statement_timeout_ms: Option<u64>,
}

impl SandboxConfig {
    pub fn statement_timeout(&self) -> Option<Duration> {
        self.statement_timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            statement_timeout_ms: Some(1000),
        }
    }
}

/// Behavior assigned to each exception family when no user rule matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    pub checked: BehaviorType,
    /// Also applies to panics.
    pub unchecked: BehaviorType,
    pub npe_on_null_input: BehaviorType,
    pub npe_on_non_null_input: BehaviorType,
    pub out_of_memory: BehaviorType,
    pub timeout: BehaviorType,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            checked: BehaviorType::Expected,
            unchecked: BehaviorType::Error,
            npe_on_null_input: BehaviorType::Expected,
            npe_on_non_null_input: BehaviorType::Error,
            out_of_memory: BehaviorType::Invalid,
            timeout: BehaviorType::Invalid,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractsConfig {
    pub enabled: Vec<String>,
    /// Cap on ordered object pairs checked by binary contracts per sequence.
    pub max_binary_pairs: usize,
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            enabled: crate::evaluator::contracts::BUILTIN_CONTRACTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_binary_pairs: 100,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: Option<PathBuf>,
    pub format: OutputFormat,
}

impl OutputConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(paths::default_output_dir)
    }
}

impl Config {
    /// Load config from the default location, falling back to defaults.
    pub fn load() -> Result<Self> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let g = &self.generation;
        if !(0.0..=1.0).contains(&g.null_ratio) {
            return Err(SeqforgeError::Config(format!(
                "generation.null_ratio must be within [0, 1], got {}",
                g.null_ratio
            )));
        }
        if g.max_sequence_size == 0 {
            return Err(SeqforgeError::Config(
                "generation.max_sequence_size must be at least 1".into(),
            ));
        }
        if g.max_string_length == 0 {
            return Err(SeqforgeError::Config(
                "generation.max_string_length must be at least 1".into(),
            ));
        }
        for name in &self.contracts.enabled {
            if !crate::evaluator::contracts::BUILTIN_CONTRACTS.contains(&name.as_str()) {
                return Err(SeqforgeError::Config(format!("unknown contract '{}'", name)));
            }
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| SeqforgeError::Config(e.to_string()))
    }
}
