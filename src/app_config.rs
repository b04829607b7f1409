use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::time::Duration;

use crate::rewrite::contract::RewriteContract;
use crate::screenplay::{FirstHeadingPolicy, ParserOptions};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Document parsing config
    #[serde(default)]
    pub parser: ParserConfig,

    /// Rewrite config
    #[serde(default)]
    pub rewrite: RewriteConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Document parsing settings
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ParserConfig {
    /// Whether the first scene heading opens scene 1 or is a title marker
    #[serde(default)]
    pub first_heading: FirstHeadingPolicy,
}

impl ParserConfig {
    /// Parser options for the core.
    pub fn options(&self) -> ParserOptions {
        ParserOptions::with_first_heading(self.first_heading)
    }
}

/// Rewrite provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RewriteProvider {
    // @provider: Google Gemini
    #[default]
    Gemini,
    // @provider: Anthropic
    Anthropic,
    // @provider: Ollama
    Ollama,
}

impl RewriteProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Gemini => "Gemini",
            Self::Anthropic => "Anthropic",
            Self::Ollama => "Ollama",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Gemini => "gemini".to_string(),
            Self::Anthropic => "anthropic".to_string(),
            Self::Ollama => "ollama".to_string(),
        }
    }

    /// Environment variable holding the API key, for hosted providers
    pub fn api_key_env_var(&self) -> Option<&'static str> {
        match self {
            Self::Gemini => Some("GEMINI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Ollama => None,
        }
    }

    /// Whether the provider needs an API key
    pub fn requires_api_key(&self) -> bool {
        self.api_key_env_var().is_some()
    }

    /// All supported providers
    pub fn all() -> [Self; 3] {
        [Self::Gemini, Self::Anthropic, Self::Ollama]
    }
}

// Implement Display trait for RewriteProvider
impl std::fmt::Display for RewriteProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for RewriteProvider
impl std::str::FromStr for RewriteProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Max concurrent requests
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    // @field: Per-scene timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Rate limit (requests per minute)
    #[serde(default)]
    pub rate_limit: Option<u32>,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: RewriteProvider) -> Self {
        let profile = crate::rewrite::concurrency::ProviderProfile::for_provider(provider_type);
        Self {
            provider_type: provider_type.to_lowercase_string(),
            model: default_model(provider_type),
            api_key: String::new(),
            endpoint: default_endpoint(provider_type),
            concurrent_requests: profile.max_concurrent_requests,
            timeout_secs: default_timeout_secs(),
            rate_limit: profile.target_rpm,
        }
    }
}

/// Rewrite service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RewriteConfig {
    /// Rewrite provider to use
    #[serde(default)]
    pub provider: RewriteProvider,

    /// Available rewrite providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common rewrite settings
    #[serde(default)]
    pub common: RewriteCommonConfig,
}

/// Common rewrite settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RewriteCommonConfig {
    /// Payload contract with the provider
    #[serde(default)]
    pub contract: RewriteContract,

    /// Attempts per scene before accepting the longest candidate
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Rewrites shorter than this share of the original word count are retried
    #[serde(default = "default_min_length_ratio")]
    pub min_length_ratio: f64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Retry count for failed HTTP requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff multiplier for retries (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Output token budget per scene
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

impl Default for RewriteCommonConfig {
    fn default() -> Self {
        Self {
            contract: RewriteContract::default(),
            max_attempts: default_max_attempts(),
            min_length_ratio: default_min_length_ratio(),
            temperature: default_temperature(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching `log` filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(anyhow!("Invalid log level: {}", s)),
        }
    }
}

fn default_concurrent_requests() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    180 // Whole-scene generations are slow
}

fn default_max_attempts() -> u32 {
    2
}

fn default_min_length_ratio() -> f64 {
    0.85
}

fn default_retry_count() -> u32 {
    3 // Default to 3 retries
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_output_tokens() -> u32 {
    8000
}

fn default_endpoint(provider: RewriteProvider) -> String {
    match provider {
        RewriteProvider::Gemini => "https://generativelanguage.googleapis.com/v1beta".to_string(),
        RewriteProvider::Anthropic => "https://api.anthropic.com".to_string(),
        RewriteProvider::Ollama => "http://localhost:11434".to_string(),
    }
}

fn default_model(provider: RewriteProvider) -> String {
    match provider {
        RewriteProvider::Gemini => "gemini-2.5-pro".to_string(),
        RewriteProvider::Anthropic => "claude-3-5-sonnet-latest".to_string(),
        RewriteProvider::Ollama => "llama3".to_string(),
    }
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let provider = self.rewrite.provider;
        if provider.requires_api_key() && self.rewrite.get_api_key().is_empty() {
            return Err(anyhow!(
                "Rewrite API key is required for {} provider (set it in the config file or {})",
                provider.display_name(),
                provider.api_key_env_var().unwrap_or_default()
            ));
        }

        let common = &self.rewrite.common;
        if common.max_attempts == 0 {
            return Err(anyhow!("max_attempts must be at least 1"));
        }
        if !(0.0..=1.0).contains(&common.min_length_ratio) {
            return Err(anyhow!(
                "min_length_ratio must be between 0 and 1, got {}",
                common.min_length_ratio
            ));
        }
        if self.rewrite.optimal_concurrent_requests() == 0 {
            return Err(anyhow!("concurrent_requests must be at least 1"));
        }

        Ok(())
    }

    /// Fill an empty API key of the active provider from its environment variable.
    pub fn apply_env_credentials(&mut self) {
        self.apply_credentials_from(|name| std::env::var(name).ok());
    }

    /// Fill an empty API key of the active provider from a lookup function.
    pub fn apply_credentials_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let provider = self.rewrite.provider;
        let Some(var) = provider.api_key_env_var() else {
            return;
        };
        if !self.rewrite.get_api_key().is_empty() {
            return;
        }
        let Some(key) = lookup(var).filter(|k| !k.trim().is_empty()) else {
            return;
        };

        match self.rewrite.get_active_provider_config_mut() {
            Some(provider_config) => provider_config.api_key = key,
            None => {
                let mut provider_config = ProviderConfig::new(provider);
                provider_config.api_key = key;
                self.rewrite.available_providers.push(provider_config);
            }
        }
    }
}

impl RewriteConfig {
    pub fn optimal_concurrent_requests(&self) -> usize {
        // Check if the provider exists in the available_providers
        if let Some(provider_config) = self.get_active_provider_config() {
            return provider_config.concurrent_requests;
        }

        crate::rewrite::concurrency::ProviderProfile::for_provider(self.provider)
            .effective_concurrent_requests(None)
    }

    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    fn get_active_provider_config_mut(&mut self) -> Option<&mut ProviderConfig> {
        let provider_str = self.provider.to_lowercase_string();
        self.available_providers
            .iter_mut()
            .find(|p| p.provider_type == provider_str)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &RewriteProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers
            .iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        match self.get_active_provider_config() {
            Some(provider_config) if !provider_config.model.is_empty() => provider_config.model.clone(),
            _ => default_model(self.provider),
        }
    }

    /// Override the model of the active provider
    pub fn set_model(&mut self, model: &str) {
        match self.get_active_provider_config_mut() {
            Some(provider_config) => provider_config.model = model.to_string(),
            None => {
                let mut provider_config = ProviderConfig::new(self.provider);
                provider_config.model = model.to_string();
                self.available_providers.push(provider_config);
            }
        }
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.api_key.clone())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        match self.get_active_provider_config() {
            Some(provider_config) if !provider_config.endpoint.is_empty() => {
                provider_config.endpoint.clone()
            }
            _ => default_endpoint(self.provider),
        }
    }

    /// Get the per-scene timeout for the active provider
    pub fn get_timeout(&self) -> Duration {
        let secs = self
            .get_active_provider_config()
            .map(|p| p.timeout_secs)
            .filter(|secs| *secs > 0)
            .unwrap_or_else(default_timeout_secs);
        Duration::from_secs(secs)
    }

    /// Deadline for one scene across all of its attempts
    pub fn get_task_timeout(&self) -> Duration {
        self.get_timeout() * self.common.max_attempts.max(1)
    }

    /// Get the rate limit for the active provider
    pub fn get_rate_limit(&self) -> Option<u32> {
        if let Some(provider_config) = self.get_active_provider_config() {
            return provider_config.rate_limit;
        }

        crate::rewrite::concurrency::ProviderProfile::for_provider(self.provider).target_rpm
    }
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            provider: RewriteProvider::default(),
            available_providers: RewriteProvider::all()
                .into_iter()
                .map(ProviderConfig::new)
                .collect(),
            common: RewriteCommonConfig::default(),
        }
    }
}
