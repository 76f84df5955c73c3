//! Configuration for the experiment harness.
//!
//! Supports both environment variables and YAML config file.
//! Environment variables take precedence over config file values.

use crate::error::{ExperimentError, Result};
use crate::llm::PromptStyle;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// LLM configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL for the LLM API (e.g., "http://localhost:8000")
    pub api_base: String,

    /// API key for authentication
    pub api_key: String,

    /// Model name (e.g., "gemma-2-2b-it")
    pub model: String,

    /// Maximum tokens for the answer
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Temperature for generation; 0 means greedy
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_max_tokens() -> u32 {
    50
}

fn default_temperature() -> f32 {
    0.0
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            api_key: String::new(),
            model: "gemma-2-2b-it".to_string(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

/// Experiment grid settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// 1-indexed gold document positions to test.
    #[serde(default = "default_positions")]
    pub positions: Vec<usize>,

    /// Documents per context.
    #[serde(default = "default_total_docs")]
    pub total_docs: usize,

    /// Questions evaluated at each position.
    #[serde(default = "default_trials")]
    pub trials_per_position: usize,

    /// Prompt layout.
    #[serde(default)]
    pub prompt_style: PromptStyle,
}

fn default_positions() -> Vec<usize> {
    vec![1, 10, 25, 50, 75, 90, 100]
}

fn default_total_docs() -> usize {
    100
}

fn default_trials() -> usize {
    30
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            positions: default_positions(),
            total_docs: default_total_docs(),
            trials_per_position: default_trials(),
            prompt_style: PromptStyle::default(),
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// LLM settings
    pub llm: LlmConfig,
    /// Experiment settings
    pub experiment: ExperimentConfig,
}

/// Configuration file structure (YAML format).
#[derive(Debug, Deserialize)]
struct ConfigFile {
    llm: Option<LlmFileSection>,
    experiment: Option<ExperimentFileSection>,
}

#[derive(Debug, Deserialize)]
struct LlmFileSection {
    api_base: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ExperimentFileSection {
    positions: Option<Vec<usize>>,
    total_docs: Option<usize>,
    trials_per_position: Option<usize>,
    prompt_style: Option<PromptStyle>,
}

impl Config {
    /// Load configuration from environment variables and optional config file.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (LLM_API_BASE, LLM_API_KEY, LLM_MODEL, LIM_POSITIONS, ...)
    /// 2. Config file (~/.config/lost-in-middle/config.yaml)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                config = Self::load_from_file(&config_path)?;
            }
        }

        config.apply_env()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(api_base) = env::var("LLM_API_BASE") {
            self.llm.api_base = api_base;
        }

        if let Ok(api_key) = env::var("LLM_API_KEY") {
            self.llm.api_key = api_key;
        }

        if let Ok(model) = env::var("LLM_MODEL") {
            self.llm.model = model;
        }

        if let Ok(max_tokens) = env::var("LLM_MAX_TOKENS") {
            if let Ok(tokens) = max_tokens.parse() {
                self.llm.max_tokens = tokens;
            }
        }

        if let Ok(temperature) = env::var("LLM_TEMPERATURE") {
            if let Ok(temp) = temperature.parse() {
                self.llm.temperature = temp;
            }
        }

        if let Ok(positions) = env::var("LIM_POSITIONS") {
            self.experiment.positions = parse_positions(&positions)?;
        }

        if let Ok(total_docs) = env::var("LIM_TOTAL_DOCS") {
            if let Ok(total) = total_docs.parse() {
                self.experiment.total_docs = total;
            }
        }

        if let Ok(trials) = env::var("LIM_TRIALS") {
            if let Ok(n) = trials.parse() {
                self.experiment.trials_per_position = n;
            }
        }

        Ok(())
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ExperimentError::io(path, e))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text. Missing keys keep their defaults.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let file_config: ConfigFile = serde_yaml::from_str(content)
            .map_err(|e| ExperimentError::Config(format!("Failed to parse config file: {}", e)))?;

        let mut config = Config::default();

        if let Some(llm) = file_config.llm {
            if let Some(api_base) = llm.api_base {
                config.llm.api_base = api_base;
            }
            if let Some(api_key) = llm.api_key {
                config.llm.api_key = api_key;
            }
            if let Some(model) = llm.model {
                config.llm.model = model;
            }
            if let Some(max_tokens) = llm.max_tokens {
                config.llm.max_tokens = max_tokens;
            }
            if let Some(temperature) = llm.temperature {
                config.llm.temperature = temperature;
            }
        }

        if let Some(experiment) = file_config.experiment {
            if let Some(positions) = experiment.positions {
                config.experiment.positions = positions;
            }
            if let Some(total_docs) = experiment.total_docs {
                config.experiment.total_docs = total_docs;
            }
            if let Some(trials) = experiment.trials_per_position {
                config.experiment.trials_per_position = trials;
            }
            if let Some(style) = experiment.prompt_style {
                config.experiment.prompt_style = style;
            }
        }

        Ok(config)
    }

    /// Get the default config file path.
    pub fn config_file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "lost-in-middle")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Validate that the LLM settings needed for real inference are present.
    pub fn validate(&self) -> Result<()> {
        if self.llm.api_base.is_empty() {
            return Err(ExperimentError::Config(
                "LLM API base URL is required. Set LLM_API_BASE environment variable or add to config file.".to_string()
            ));
        }

        if self.llm.model.is_empty() {
            return Err(ExperimentError::Config(
                "LLM model is required. Set LLM_MODEL environment variable or add to config file."
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// Validate the experiment grid.
    pub fn validate_experiment(&self) -> Result<()> {
        let exp = &self.experiment;
        if exp.total_docs == 0 {
            return Err(ExperimentError::Config(
                "total_docs must be at least 1".to_string(),
            ));
        }
        if exp.positions.is_empty() {
            return Err(ExperimentError::Config(
                "At least one gold position is required".to_string(),
            ));
        }
        if let Some(&bad) = exp
            .positions
            .iter()
            .find(|&&p| p == 0 || p > exp.total_docs)
        {
            return Err(ExperimentError::Config(format!(
                "Position {} must be in 1..={}",
                bad, exp.total_docs
            )));
        }
        if exp.trials_per_position == 0 {
            return Err(ExperimentError::Config(
                "trials_per_position must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a config from explicit values (useful for testing).
    pub fn with_llm(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            llm: LlmConfig {
                api_base: api_base.into(),
                api_key: api_key.into(),
                model: model.into(),
                ..Default::default()
            },
            experiment: ExperimentConfig::default(),
        }
    }
}

/// Parse a comma-separated list of positions, e.g. `"1, 10, 25"`.
pub fn parse_positions(s: &str) -> Result<Vec<usize>> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            p.parse::<usize>()
                .map_err(|_| ExperimentError::Config(format!("Invalid position '{}'", p)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.llm.api_base.is_empty());
        assert!(config.llm.api_key.is_empty());
        assert_eq!(config.llm.max_tokens, 50);
        assert_eq!(config.llm.temperature, 0.0);
        assert_eq!(config.experiment.positions, vec![1, 10, 25, 50, 75, 90, 100]);
        assert_eq!(config.experiment.total_docs, 100);
        assert_eq!(config.experiment.trials_per_position, 30);
        assert_eq!(config.experiment.prompt_style, PromptStyle::Standard);
    }

    #[test]
    fn test_validate_fails_without_required_fields() {
        let config = Config::default();
        assert!(config.validate().is_err());
        assert!(config.validate_experiment().is_ok());
    }

    #[test]
    fn test_with_llm() {
        let config = Config::with_llm("https://api.example.com", "test-key", "gemma-2b");
        assert_eq!(config.llm.api_base, "https://api.example.com");
        assert_eq!(config.llm.api_key, "test-key");
        assert_eq!(config.llm.model, "gemma-2b");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml_partial() {
        let yaml = r#"
llm:
  model: llama-3.2-3b
experiment:
  positions: [1, 25, 50]
  total_docs: 50
  prompt_style: refresher
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.llm.model, "llama-3.2-3b");
        assert_eq!(config.llm.max_tokens, 50);
        assert_eq!(config.experiment.positions, vec![1, 25, 50]);
        assert_eq!(config.experiment.total_docs, 50);
        assert_eq!(config.experiment.trials_per_position, 30);
        assert_eq!(config.experiment.prompt_style, PromptStyle::Refresher);
    }

    #[test]
    fn test_validate_experiment_rejects_out_of_range_position() {
        let mut config = Config::default();
        config.experiment.total_docs = 50;
        assert!(config.validate_experiment().is_err());

        config.experiment.positions = vec![1, 50];
        assert!(config.validate_experiment().is_ok());

        config.experiment.positions = vec![0];
        assert!(config.validate_experiment().is_err());
    }

    #[test]
    fn test_parse_positions() {
        assert_eq!(parse_positions("1, 10,25").unwrap(), vec![1, 10, 25]);
        assert_eq!(parse_positions("5,").unwrap(), vec![5]);
        assert!(parse_positions("1,x").is_err());
    }
}
