use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Provider, RetryPolicy};
use crate::errors::ProviderError;

/// Gemini client for the Generative Language REST API
#[derive(Debug)]
pub struct Gemini {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API base URL, e.g. "https://generativelanguage.googleapis.com/v1beta"
    endpoint: String,
    /// Model name
    model: String,
    /// Retry and rate-limit settings
    retry: RetryPolicy,
}

/// A text part
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiPart {
    #[serde(default)]
    pub text: String,
}

/// A content block with a role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

/// Generation settings
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

/// generateContent request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

/// A response candidate
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiCandidate {
    #[serde(default)]
    pub content: Option<GeminiContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token usage information
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u64,
    #[serde(default)]
    pub candidates_token_count: u64,
}

/// generateContent response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
}

impl GeminiRequest {
    /// Create a request with a single user turn
    pub fn new(user_prompt: impl Into<String>) -> Self {
        Self {
            system_instruction: None,
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: user_prompt.into(),
                }],
            }],
            generation_config: None,
        }
    }

    /// Set the system instruction
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system_instruction = Some(GeminiContent {
            role: None,
            parts: vec![GeminiPart { text: system.into() }],
        });
        self
    }

    fn config(&mut self) -> &mut GenerationConfig {
        self.generation_config.get_or_insert_with(GenerationConfig::default)
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config().temperature = Some(temperature);
        self
    }

    /// Set the output token budget
    pub fn max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.config().max_output_tokens = Some(max_output_tokens);
        self
    }

    /// Ask for a JSON response body
    pub fn json_response(mut self) -> Self {
        self.config().response_mime_type = Some("application/json".to_string());
        self
    }
}

impl Gemini {
    /// Create a new Gemini client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new_with_config(api_key, endpoint, model, RetryPolicy::default(), Duration::from_secs(180))
    }

    /// Create a new Gemini client with retry settings and a request timeout
    pub fn new_with_config(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Self {
        let endpoint = endpoint.into();
        let endpoint = if endpoint.is_empty() {
            "https://generativelanguage.googleapis.com/v1beta".to_string()
        } else {
            endpoint.trim_end_matches('/').to_string()
        };

        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint,
            model: model.into(),
            retry,
        }
    }

    /// Model in use
    pub fn model(&self) -> &str {
        &self.model
    }

    fn model_url(&self) -> String {
        format!("{}/models/{}", self.endpoint, self.model)
    }
}

#[async_trait]
impl Provider for Gemini {
    type Request = GeminiRequest;
    type Response = GeminiResponse;

    async fn complete(&self, request: GeminiRequest) -> Result<GeminiResponse, ProviderError> {
        let url = format!("{}:generateContent", self.model_url());
        let response: GeminiResponse = self
            .retry
            .send_json("Gemini", || {
                self.client
                    .post(&url)
                    .header("x-goog-api-key", &self.api_key)
                    .json(&request)
            })
            .await?;

        if let Some(usage) = &response.usage_metadata {
            debug!(
                "Gemini usage: {} prompt / {} output tokens",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }
        Ok(response)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let url = self.model_url();
        let _: serde_json::Value = self
            .retry
            .send_json("Gemini", || self.client.get(&url).header("x-goog-api-key", &self.api_key))
            .await?;
        Ok(())
    }

    fn extract_text(response: &GeminiResponse) -> String {
        response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}
