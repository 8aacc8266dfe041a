//! Configuration management for the supervisor matcher

use crate::error::{MatcherError, Result};
use crate::processing::embedding_manager::BackendKind;
use crate::processing::scoring::DomainWeights;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub models: ModelConfig,
    pub processing: ProcessingConfig,
    pub scoring: ScoringConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub models_dir: PathBuf,
    pub default_embedding_model: String,
    pub backend: BackendKind,
    /// Extra models beyond the built-in catalogue
    #[serde(default)]
    pub available_models: Vec<AvailableModel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableModel {
    pub id: String,
    pub name: String,
    pub repo_id: String,
    pub backend: BackendKind,
    pub size_mb: u64,
    pub dimensions: u32,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub enable_caching: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub weights: DomainWeights,
    /// Matches below this final score are hidden from reports
    pub min_score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
    /// Number of matches shown; 0 shows all
    pub top_n: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Console,
    Text,
    Json,
    Markdown,
    Html,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Console => "console",
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "markdown",
            OutputFormat::Html => "html",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for OutputFormat {
    type Err = MatcherError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "console" => Ok(OutputFormat::Console),
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "html" => Ok(OutputFormat::Html),
            _ => Err(MatcherError::InvalidInput(format!(
                "Invalid output format: {}. Supported: console, text, json, markdown, html",
                s
            ))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let models_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".supervisor-matcher")
            .join("models");

        Self {
            models: ModelConfig {
                models_dir,
                default_embedding_model: "bert-base-uncased".to_string(),
                backend: BackendKind::Bert,
                available_models: Vec::new(),
            },
            processing: ProcessingConfig {
                enable_caching: true,
            },
            scoring: ScoringConfig {
                weights: DomainWeights::default(),
                min_score: 0.0,
            },
            output: OutputConfig {
                format: OutputFormat::Console,
                detailed: false,
                color_output: true,
                top_n: 3,
            },
        }
    }
}

impl Config {
    /// Load from `path`, creating it with defaults on first use
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content).map_err(|e| {
                MatcherError::Configuration(format!("Failed to parse {}: {}", path.display(), e))
            })?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| MatcherError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("supervisor-matcher")
            .join("config.toml")
    }

    pub fn validate(&self) -> Result<()> {
        self.scoring.weights.validate()?;
        if !(0.0..=1.0).contains(&self.scoring.min_score) {
            return Err(MatcherError::Configuration(format!(
                "scoring.min_score must be between 0 and 1, got {}",
                self.scoring.min_score
            )));
        }
        Ok(())
    }

    pub fn models_dir(&self) -> &Path {
        &self.models.models_dir
    }

    /// Set a value by dotted key, e.g. `scoring.weights.domain_knowledge` or `output.top_n`.
    ///
    /// `scoring.weights` takes all four weights at once as a comma-separated list.
    /// The whole configuration is validated before the change is kept.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut updated = self.clone();

        match key {
            "models.models_dir" => updated.models.models_dir = PathBuf::from(value),
            "models.default_embedding_model" => {
                updated.models.default_embedding_model = value.to_string()
            }
            "models.backend" => updated.models.backend = value.parse()?,
            "processing.enable_caching" => updated.processing.enable_caching = parse_value(key, value)?,
            "scoring.min_score" => updated.scoring.min_score = parse_value(key, value)?,
            "scoring.weights" => {
                let parts: Vec<f32> = value
                    .split(',')
                    .map(|part| parse_value(key, part.trim()))
                    .collect::<Result<_>>()?;
                let [research, methodology, technical, domain] = parts[..] else {
                    return Err(MatcherError::Configuration(format!(
                        "scoring.weights needs four comma-separated values, got {}",
                        parts.len()
                    )));
                };
                updated.scoring.weights = DomainWeights::new(research, methodology, technical, domain)?;
            }
            "output.format" => updated.output.format = value.parse()?,
            "output.detailed" => updated.output.detailed = parse_value(key, value)?,
            "output.color_output" => updated.output.color_output = parse_value(key, value)?,
            "output.top_n" => updated.output.top_n = parse_value(key, value)?,
            _ => match key.strip_prefix("scoring.weights.") {
                Some(weight) => updated.scoring.weights.set(weight, parse_value(key, value)?)?,
                None => {
                    return Err(MatcherError::Configuration(format!(
                        "Unknown configuration key: {}",
                        key
                    )))
                }
            },
        }

        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        MatcherError::Configuration(format!("Invalid value '{}' for {}", value, key))
    })
}
