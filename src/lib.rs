//! Offense preference learning
//!
//! Pairs NFL offenses by strength, asks a text judge which offense of each
//! pair is stronger, and trains a logistic classifier that reproduces the
//! judge's choice from team stat differentials alone.

pub mod data;
pub mod features;
pub mod judge;
pub mod pipeline;
pub mod training;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which side of a pair a judge picked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Choice {
    A,
    B,
    #[serde(rename = "unknown")]
    Unknown,
}

impl Choice {
    /// Binary target: 1 when Team A is preferred, 0 for Team B, None when unknown
    pub fn prefers_team_a(&self) -> Option<u8> {
        match self {
            Choice::A => Some(1),
            Choice::B => Some(0),
            Choice::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Choice::Unknown)
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::A => write!(f, "A"),
            Choice::B => write!(f, "B"),
            Choice::Unknown => write!(f, "unknown"),
        }
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum OffenseError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Integrity error: pair_id {pair_id} matched {matches} registry rows, expected exactly 1")]
    Integrity { pair_id: String, matches: usize },

    #[error("Lookup error: pair {pair_id} references team {team} with no statistics")]
    Lookup { pair_id: String, team: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Judge service error: {0}")]
    ExternalService(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, OffenseError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,
    pub labels: LabelConfig,
    pub judge: JudgeConfig,
    pub training: TrainingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub plays: String,
    pub team_summary: String,
    pub pairs: String,
    pub prompts: String,
    pub answers: String,
    pub labels: String,
    pub training_data: String,
    pub model_summary: String,
    pub model_artifact: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelConfig {
    /// Prompt type whose answers become preference labels
    pub question_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeConfig {
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the bearer key
    pub api_key_env: String,
    pub system_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Fixed pause between consecutive calls
    pub delay_ms: u64,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub test_fraction: f64,
    pub seed: u64,
    pub learning_rate: f64,
    pub epochs: usize,
    /// Inverse of sklearn's C: penalty on squared weights, intercept excluded
    pub l2: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            paths: PathsConfig {
                plays: "data/plays.csv".to_string(),
                team_summary: "data/team_summary.csv".to_string(),
                pairs: "results/team_pairs.csv".to_string(),
                prompts: "results/prompts_for_llm.jsonl".to_string(),
                answers: "results/llm_answers.jsonl".to_string(),
                labels: "results/llm_pair_labels.csv".to_string(),
                training_data: "results/training_data_for_model.csv".to_string(),
                model_summary: "results/model_summary.txt".to_string(),
                model_artifact: "results/model.json".to_string(),
            },
            labels: LabelConfig {
                question_type: "better_offense".to_string(),
            },
            judge: JudgeConfig {
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-4.1-mini".to_string(),
                api_key_env: "OPENAI_API_KEY".to_string(),
                system_prompt: "You are an expert NFL analytics writer. \
                    Write clear, concise football analysis using the stats provided, \
                    without inventing new statistics."
                    .to_string(),
                temperature: 0.7,
                max_tokens: 400,
                delay_ms: 200,
                timeout_secs: 60,
            },
            training: TrainingConfig {
                test_fraction: 0.25,
                seed: 42,
                learning_rate: 0.1,
                epochs: 1000,
                l2: 1.0,
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            OffenseError::Configuration(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| OffenseError::Configuration(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            OffenseError::Configuration(format!("Failed to serialize config: {}", e))
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
