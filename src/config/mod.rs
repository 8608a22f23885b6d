//! Configuration management for the resolver
//!
//! Handles configuration loading (TOML or JSON), environment overrides and
//! validation.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::utils::{ensure_range, env_int, env_opt};

/// Environment variable overriding `max_permutations`
pub const ENV_MAX_PERMUTATIONS: &str = "RESOLVER_MAX_PERMUTATIONS";
/// Environment variable overriding `singleton_policy`
pub const ENV_SINGLETON_POLICY: &str = "RESOLVER_SINGLETON_POLICY";

/// How a singleton collision is settled when no pinned resource is involved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SingletonPolicy {
    /// Highest version wins, earlier registration breaks ties
    #[default]
    HighestVersion,
    /// Earliest registered resource wins
    FirstRegistered,
}

impl std::str::FromStr for SingletonPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "highest_version" => Ok(SingletonPolicy::HighestVersion),
            "first_registered" => Ok(SingletonPolicy::FirstRegistered),
            other => Err(anyhow::anyhow!("unknown singleton policy: {}", other)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log filter (e.g. "info", "bllvm_resolver::resolver=debug")
    #[serde(default)]
    pub filter: Option<String>,

    /// Emit JSON log lines (requires the `json-logging` feature)
    #[serde(default)]
    pub json_format: bool,
}

/// Resolver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Upper bound on candidate permutations tried per uses conflict
    #[serde(default = "default_max_permutations")]
    pub max_permutations: usize,

    /// Singleton collision policy
    #[serde(default)]
    pub singleton_policy: SingletonPolicy,

    /// Logging configuration
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

fn default_max_permutations() -> usize {
    10_000
}

/// Largest accepted `max_permutations`
const MAX_PERMUTATIONS_LIMIT: usize = 10_000_000;

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_permutations: default_max_permutations(),
            singleton_policy: SingletonPolicy::default(),
            logging: None,
        }
    }
}

impl ResolverConfig {
    /// Load configuration from JSON file
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ResolverConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ResolverConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration, picking the format from the file extension
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// Save configuration to JSON file
    pub fn to_json_file(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `RESOLVER_*` environment overrides
    pub fn with_env_overrides(mut self) -> anyhow::Result<Self> {
        if let Some(max) = env_int::<usize>(ENV_MAX_PERMUTATIONS) {
            self.max_permutations = max;
        }
        if let Some(policy) = env_opt(ENV_SINGLETON_POLICY) {
            self.singleton_policy = policy.parse()?;
        }
        Ok(self)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure_range(self.max_permutations, 1, MAX_PERMUTATIONS_LIMIT, "max_permutations")
            .map_err(|e| anyhow::anyhow!(e))?;

        if let Some(ref logging) = self.logging {
            if logging.filter.as_deref().map_or(false, |f| f.trim().is_empty()) {
                return Err(anyhow::anyhow!("logging.filter must not be blank when set"));
            }
        }
        Ok(())
    }
}
