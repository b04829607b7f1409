use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use super::{Provider, RetryPolicy};
use crate::errors::ProviderError;

/// Ollama client for interacting with Ollama API
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Model name
    model: String,
    /// Retry and rate-limit settings
    retry: RetryPolicy,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Format to return a response in
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct GenerationOptions {
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Generation response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Model name
    #[serde(default)]
    pub model: String,
    /// Generated text
    #[serde(default)]
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
    /// Number of prompt tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    /// Number of generated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
}

impl GenerationRequest {
    /// Create a new generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            options: None,
            format: None,
            stream: Some(false),
        }
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).temperature = Some(temperature);
        self
    }

    /// Set the output token budget
    pub fn num_predict(mut self, num_predict: u32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).num_predict = Some(num_predict);
        self
    }

    /// Set the format
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

/// Normalize an endpoint into a base URL with scheme and port.
///
/// `localhost` becomes `http://localhost:11434`; an explicit port is kept.
pub fn normalize_base_url(endpoint: &str) -> Result<String, ProviderError> {
    let endpoint = endpoint.trim();
    let with_scheme = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("http://{}", endpoint)
    };

    let mut url = Url::parse(&with_scheme)
        .map_err(|e| ProviderError::ConnectionError(format!("Invalid Ollama endpoint '{}': {}", endpoint, e)))?;
    if url.port().is_none() && url.scheme() == "http" {
        let _ = url.set_port(Some(11434));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

impl Ollama {
    /// Create a new Ollama client with retry settings and a request timeout
    pub fn new_with_config(
        endpoint: &str,
        model: impl Into<String>,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            base_url: normalize_base_url(endpoint)?,
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            model: model.into(),
            retry,
        })
    }

    /// Model in use
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Base URL in use
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Provider for Ollama {
    type Request = GenerationRequest;
    type Response = GenerationResponse;

    async fn complete(&self, request: GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);
        let response: GenerationResponse = self
            .retry
            .send_json("Ollama", || self.client.post(&url).json(&request))
            .await?;

        if !response.done {
            error!("Ollama returned an unfinished generation for model {}", response.model);
        }
        debug!(
            "Ollama usage: {:?} prompt / {:?} output tokens",
            response.prompt_eval_count, response.eval_count
        );
        Ok(response)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let url = format!("{}/api/tags", self.base_url);
        let _: serde_json::Value = self
            .retry
            .send_json("Ollama", || self.client.get(&url))
            .await?;
        Ok(())
    }

    fn extract_text(response: &GenerationResponse) -> String {
        response.response.clone()
    }
}
