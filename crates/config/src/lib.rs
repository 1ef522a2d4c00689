//! Configuration loading, validation, and management for Tessera.
//!
//! Loads configuration from `~/.tessera/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tessera_core::context::{BudgetMode, TrimDirection, TrimType};

/// The root configuration structure.
///
/// Maps directly to `~/.tessera/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Context composition settings
    #[serde(default)]
    pub context: ContextConfig,

    /// Memory recall settings
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Conversational loop settings
    #[serde(default)]
    pub chatbot: ChatbotConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Global token ceiling for one composition pass
    #[serde(default = "default_token_budget")]
    pub token_budget: i64,

    /// How many hops cascading activation may follow. At 0 a cascading
    /// entry still activates the entries it mentions directly.
    #[serde(default = "default_max_cascade_depth")]
    pub max_cascade_depth: usize,

    /// Whether a negative running budget is tolerated
    #[serde(default)]
    pub budget_mode: BudgetMode,

    /// Shape of the entry that wraps the caller's input text
    #[serde(default)]
    pub input_entry: InputEntryConfig,
}

fn default_token_budget() -> i64 {
    1024
}
fn default_max_cascade_depth() -> usize {
    3
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            token_budget: default_token_budget(),
            max_cascade_depth: default_max_cascade_depth(),
            budget_mode: BudgetMode::default(),
            input_entry: InputEntryConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputEntryConfig {
    #[serde(default)]
    pub prefix: String,

    #[serde(default = "default_suffix")]
    pub suffix: String,

    #[serde(default = "default_input_reserved_tokens")]
    pub reserved_tokens: usize,

    #[serde(default = "default_entry_token_budget")]
    pub token_budget: usize,

    #[serde(default)]
    pub insertion_order: i64,

    #[serde(default = "default_insertion_position")]
    pub insertion_position: i64,

    #[serde(default = "default_input_trim_direction")]
    pub trim_direction: TrimDirection,

    #[serde(default)]
    pub trim_type: TrimType,
}

fn default_suffix() -> String {
    "\n".into()
}
fn default_input_reserved_tokens() -> usize {
    512
}
fn default_entry_token_budget() -> usize {
    2048
}
fn default_insertion_position() -> i64 {
    -1
}
fn default_input_trim_direction() -> TrimDirection {
    TrimDirection::Top
}

impl Default for InputEntryConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            suffix: default_suffix(),
            reserved_tokens: default_input_reserved_tokens(),
            token_budget: default_entry_token_budget(),
            insertion_order: 0,
            insertion_position: default_insertion_position(),
            trim_direction: default_input_trim_direction(),
            trim_type: TrimType::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Most recent records kept out of relevance ranking
    #[serde(default = "default_short_term")]
    pub short_term: usize,

    /// Number of relevant records folded into the context
    #[serde(default = "default_long_term")]
    pub long_term: usize,

    /// Most recent records always considered when sampling
    #[serde(default = "default_cutoff_recent")]
    pub cutoff_recent: usize,

    /// Older records sampled when the history is large
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,

    #[serde(default = "default_distance_scale")]
    pub distance_scale: f32,

    #[serde(default = "default_distance_epsilon")]
    pub distance_epsilon: f32,

    /// Similarity above which two texts count as duplicates
    #[serde(default = "default_duplicate_ratio")]
    pub duplicate_ratio: f64,
}

fn default_short_term() -> usize {
    20
}
fn default_long_term() -> usize {
    10
}
fn default_cutoff_recent() -> usize {
    64
}
fn default_max_samples() -> usize {
    256
}
fn default_distance_scale() -> f32 {
    1000.0
}
fn default_distance_epsilon() -> f32 {
    1e-6
}
fn default_duplicate_ratio() -> f64 {
    0.8
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            short_term: default_short_term(),
            long_term: default_long_term(),
            cutoff_recent: default_cutoff_recent(),
            max_samples: default_max_samples(),
            distance_scale: default_distance_scale(),
            distance_epsilon: default_distance_epsilon(),
            duplicate_ratio: default_duplicate_ratio(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatbotConfig {
    #[serde(default = "default_bot_name")]
    pub name: String,
}

fn default_bot_name() -> String {
    "tessera".into()
}

impl Default for ChatbotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.tessera/config.toml).
    ///
    /// Environment variables override file values:
    /// - `TESSERA_TOKEN_BUDGET`
    /// - `TESSERA_BUDGET_MODE` (`permissive` or `strict`)
    /// - `TESSERA_BOT_NAME`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(budget) = lookup("TESSERA_TOKEN_BUDGET") {
            self.context.token_budget = budget.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "TESSERA_TOKEN_BUDGET must be an integer, got '{budget}'"
                ))
            })?;
        }

        if let Some(mode) = lookup("TESSERA_BUDGET_MODE") {
            self.context.budget_mode = mode.parse().map_err(ConfigError::ValidationError)?;
        }

        if let Some(name) = lookup("TESSERA_BOT_NAME") {
            self.chatbot.name = name;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".tessera")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.context.token_budget <= 0 {
            return Err(ConfigError::ValidationError(
                "context.token_budget must be > 0".into(),
            ));
        }

        if !(self.memory.distance_scale.is_finite() && self.memory.distance_scale > 0.0) {
            return Err(ConfigError::ValidationError(
                "memory.distance_scale must be a finite number > 0".into(),
            ));
        }

        if !(self.memory.distance_epsilon.is_finite() && self.memory.distance_epsilon >= 0.0) {
            return Err(ConfigError::ValidationError(
                "memory.distance_epsilon must be a finite number >= 0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.memory.duplicate_ratio) {
            return Err(ConfigError::ValidationError(
                "memory.duplicate_ratio must be between 0.0 and 1.0".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.context.token_budget, 1024);
        assert_eq!(config.context.max_cascade_depth, 3);
        assert_eq!(config.context.input_entry.reserved_tokens, 512);
        assert_eq!(config.context.input_entry.trim_direction, TrimDirection::Top);
        assert_eq!(config.memory.short_term, 20);
        assert_eq!(config.memory.long_term, 10);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.context.token_budget, config.context.token_budget);
        assert_eq!(parsed.context.input_entry.suffix, "\n");
        assert_eq!(parsed.memory.max_samples, config.memory.max_samples);
    }

    #[test]
    fn zero_budget_rejected() {
        let mut config = AppConfig::default();
        config.context.token_budget = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_cascade_depth_is_valid() {
        // Depth 0 still activates direct mentions, it just never recurses.
        let mut config = AppConfig::default();
        config.context.max_cascade_depth = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn non_finite_distance_params_rejected() {
        for (scale, epsilon) in [
            (f32::NAN, 1e-6),
            (f32::INFINITY, 1e-6),
            (1000.0, f32::NAN),
            (1000.0, f32::INFINITY),
        ] {
            let mut config = AppConfig::default();
            config.memory.distance_scale = scale;
            config.memory.distance_epsilon = epsilon;
            assert!(config.validate().is_err(), "{scale} / {epsilon}");
        }
    }

    #[test]
    fn nan_duplicate_ratio_rejected() {
        let mut config = AppConfig::default();
        config.memory.duplicate_ratio = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn duplicate_ratio_out_of_range_rejected() {
        let mut config = AppConfig::default();
        config.memory.duplicate_ratio = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().chatbot.name, "tessera");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[context]
token_budget = 2048
budget_mode = "strict"

[context.input_entry]
trim_type = "newline"

[memory]
long_term = 4
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.context.token_budget, 2048);
        assert_eq!(config.context.budget_mode, BudgetMode::Strict);
        assert_eq!(config.context.input_entry.trim_type, TrimType::Newline);
        assert_eq!(config.context.input_entry.insertion_position, -1);
        assert_eq!(config.memory.long_term, 4);
        assert_eq!(config.memory.short_term, 20);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[context\ntoken_budget = ").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("TESSERA_TOKEN_BUDGET", "300"),
            ("TESSERA_BUDGET_MODE", "strict"),
            ("TESSERA_BOT_NAME", "Patchouli Knowledge"),
        ]);
        let mut config = AppConfig::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.context.token_budget, 300);
        assert_eq!(config.context.budget_mode, BudgetMode::Strict);
        assert_eq!(config.chatbot.name, "Patchouli Knowledge");
    }

    #[test]
    fn bad_env_budget_rejected() {
        let mut config = AppConfig::default();
        let result = config.apply_env(|key| {
            (key == "TESSERA_TOKEN_BUDGET").then(|| "lots".to_string())
        });
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("token_budget = 1024"));
        assert!(toml_str.contains("permissive"));
    }
}
