use crate::prompts::Approach;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings for the chat-completion endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// OpenAI-compatible API base, e.g. `https://api.groq.com/openai/v1`
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,
    /// Environment variable name containing the API key
    #[serde(default = "default_env_var_api_key")]
    pub env_var_api_key: String,
    /// Model identifier sent with every request
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Output token cap
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u16,
    /// Upper bound on a single request, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Fixed pause between successive requests, in milliseconds
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Result<String> {
        std::env::var(&self.env_var_api_key)
            .with_context(|| format!("Environment variable {} not found", self.env_var_api_key))
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_endpoint: default_api_endpoint(),
            env_var_api_key: default_env_var_api_key(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            request_delay_ms: default_request_delay_ms(),
        }
    }
}

/// Where the reviews come from and how they are sampled
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatasetConfig {
    /// CSV file with a header row
    pub path: PathBuf,
    #[serde(default = "default_text_column")]
    pub text_column: String,
    #[serde(default = "default_stars_column")]
    pub stars_column: String,
    /// Total reviews to sample, split evenly across the five ratings
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

/// Report files written after the run
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Per-review detail table
    #[serde(default = "default_detail_csv")]
    pub detail_csv: Option<PathBuf>,
    /// Aggregated results as pretty JSON
    #[serde(default)]
    pub results_json: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            detail_csv: default_detail_csv(),
            results_json: None,
        }
    }
}

fn default_api_endpoint() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_env_var_api_key() -> String {
    "GROQ_API_KEY".to_string()
}

fn default_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_tokens() -> u16 {
    1000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_request_delay_ms() -> u64 {
    500
}

fn default_text_column() -> String {
    "text".to_string()
}

fn default_stars_column() -> String {
    "stars".to_string()
}

fn default_sample_size() -> usize {
    200
}

fn default_seed() -> u64 {
    42
}

fn default_detail_csv() -> Option<PathBuf> {
    Some(PathBuf::from("evaluation_results_detailed.csv"))
}

fn default_approaches() -> Vec<Approach> {
    Approach::ALL.to_vec()
}

/// Root configuration for a benchmark run
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Prompting approaches to compare, in run order
    #[serde(default = "default_approaches")]
    pub approaches: Vec<Approach>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
    }
}
