//! Configuration management.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Research run sizing
    #[serde(default)]
    pub research: ResearchConfig,

    /// LLM endpoint and sampling settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// Web search settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Document download settings
    #[serde(default)]
    pub downloads: DownloadConfig,
}

/// Sizing knobs for one research run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// How many search terms to generate per topic
    #[serde(default = "default_terms_per_research")]
    pub terms_per_research: usize,

    /// How many search results to process per term
    #[serde(default = "default_results_per_term")]
    pub results_per_term: usize,

    /// Emit a snapshot when a document starts processing even though the
    /// tree did not change
    #[serde(default)]
    pub emit_heartbeats: bool,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            terms_per_research: default_terms_per_research(),
            results_per_term: default_results_per_term(),
            emit_heartbeats: false,
        }
    }
}

fn default_terms_per_research() -> usize {
    3
}

fn default_results_per_term() -> usize {
    10
}

/// LLM endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key; defaults to the OPENAI_API_KEY environment variable
    #[serde(default = "default_api_key")]
    pub api_key: Option<String>,

    /// Base URL of an OpenAI-compatible chat completion API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// How many characters of document text to hand the summarizer
    #[serde(default = "default_paper_context_chars")]
    pub paper_context_chars: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: default_api_key(),
            base_url: default_base_url(),
            model: default_model(),
            paper_context_chars: default_paper_context_chars(),
        }
    }
}

fn default_api_key() -> Option<String> {
    std::env::var("OPENAI_API_KEY").ok()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_paper_context_chars() -> usize {
    5000
}

/// Web search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Seconds to pause between successive result-page fetches
    #[serde(default = "default_pause_seconds")]
    pub pause_seconds: f64,

    /// User agent sent to the search engine
    #[serde(default = "default_search_user_agent")]
    pub user_agent: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            pause_seconds: default_pause_seconds(),
            user_agent: default_search_user_agent(),
        }
    }
}

fn default_pause_seconds() -> f64 {
    4.0
}

fn default_search_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/123.0.0.0 Safari/537.36"
        .to_string()
}

/// Document download configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Per-document download timeout in seconds
    #[serde(default = "default_download_timeout")]
    pub timeout_seconds: u64,

    /// Maximum document size to accept (in MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size_mb: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_download_timeout(),
            max_file_size_mb: default_max_file_size(),
        }
    }
}

fn default_download_timeout() -> u64 {
    30
}

fn default_max_file_size() -> usize {
    100
}

/// Load configuration from a file, with RESEARCH_STREAM_* environment
/// variables layered on top.
pub fn load_config(path: &PathBuf) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path.as_path()))
        .add_source(config::Environment::with_prefix("RESEARCH_STREAM").separator("__"))
        .build()?;

    settings.try_deserialize()
}

/// Get the default configuration (from env vars or defaults)
pub fn get_config() -> Config {
    Config::default()
}

/// Look for a config file in the working directory, then the user config
/// directory.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("research-stream.toml");
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("research-stream").join("config.toml"))
        .filter(|path| path.is_file())
}
