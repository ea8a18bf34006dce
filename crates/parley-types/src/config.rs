//! Global configuration types for Parley.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls
//! context compaction, the LLM gateway, and per-user limits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Top-level configuration for Parley.
///
/// Loaded from `~/.parley/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub context: ContextConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Which size measure the context estimator uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    /// One unit per turn.
    #[default]
    TurnCount,
    /// Roughly four characters per token plus per-turn overhead.
    ApproxTokens,
}

impl fmt::Display for EstimatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EstimatorKind::TurnCount => write!(f, "turn_count"),
            EstimatorKind::ApproxTokens => write!(f, "approx_tokens"),
        }
    }
}

impl FromStr for EstimatorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "turn_count" => Ok(EstimatorKind::TurnCount),
            "approx_tokens" => Ok(EstimatorKind::ApproxTokens),
            other => Err(format!("invalid estimator: '{other}'")),
        }
    }
}

/// Context compaction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Live-history size above which the history is compacted.
    #[serde(default = "default_threshold")]
    pub threshold: usize,

    /// Number of most recent turns left verbatim after a threshold compaction.
    #[serde(default = "default_keep_recent")]
    pub keep_recent: usize,

    #[serde(default)]
    pub estimator: EstimatorKind,

    /// Model used to produce digests, independent of the chat model.
    #[serde(default = "default_summarizer_model")]
    pub summarizer_model: String,

    #[serde(default = "default_summarize_timeout_secs")]
    pub summarize_timeout_secs: u64,

    #[serde(default = "default_summary_max_tokens")]
    pub summary_max_tokens: u32,
}

fn default_threshold() -> usize {
    20
}

fn default_keep_recent() -> usize {
    10
}

fn default_summarizer_model() -> String {
    "anthropic/claude-sonnet-4".to_string()
}

fn default_summarize_timeout_secs() -> u64 {
    60
}

fn default_summary_max_tokens() -> u32 {
    1024
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            keep_recent: default_keep_recent(),
            estimator: EstimatorKind::default(),
            summarizer_model: default_summarizer_model(),
            summarize_timeout_secs: default_summarize_timeout_secs(),
            summary_max_tokens: default_summary_max_tokens(),
        }
    }
}

/// OpenAI-compatible gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Falls back to the `VSEGPT_API_KEY` environment variable when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub default_model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sent as the `X-Title` header.
    #[serde(default = "default_app_title")]
    pub app_title: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.vsegpt.ru/v1".to_string()
}

fn default_model() -> String {
    "openai/gpt-4.1-mini".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    3000
}

fn default_app_title() -> String {
    "Parley".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            default_model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            app_title: default_app_title(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Per-user limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_daily_message_limit")]
    pub default_daily_message_limit: u32,
}

fn default_daily_message_limit() -> u32 {
    100
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            default_daily_message_limit: default_daily_message_limit(),
        }
    }
}
