/*!
 * Config-driven rewrite service.
 *
 * Turns the application `Config` into a `SceneRewriter` backed by one of the
 * HTTP providers.
 */

use anyhow::Result;
use async_trait::async_trait;
use log::debug;

use super::capability::{RewriteRequest, SceneRewriter};
use super::contract::RewriteContract;
use super::prompts::build_prompts;
use crate::app_config::{RewriteCommonConfig, RewriteConfig, RewriteProvider};
use crate::errors::ProviderError;
use crate::providers::anthropic::{Anthropic, AnthropicRequest};
use crate::providers::gemini::{Gemini, GeminiRequest};
use crate::providers::ollama::{GenerationRequest, Ollama};
use crate::providers::{Provider, RetryPolicy};

/// Provider implementation
#[derive(Debug)]
enum RewriteProviderImpl {
    /// Google Gemini
    Gemini { client: Gemini },
    /// Anthropic API service
    Anthropic { client: Anthropic },
    /// Ollama LLM service
    Ollama { client: Ollama },
}

/// Rewrites scenes through the configured LLM provider
#[derive(Debug)]
pub struct RewriteService {
    provider: RewriteProviderImpl,
    provider_type: RewriteProvider,
    model: String,
    common: RewriteCommonConfig,
}

impl RewriteService {
    /// Create a new rewrite service from the rewrite configuration
    pub fn new(config: &RewriteConfig) -> Result<Self> {
        let retry = RetryPolicy::new(
            config.common.retry_count,
            config.common.retry_backoff_ms,
            config.get_rate_limit(),
        );
        let model = config.get_model();
        let timeout = config.get_timeout();

        let provider = match config.provider {
            RewriteProvider::Gemini => RewriteProviderImpl::Gemini {
                client: Gemini::new_with_config(
                    config.get_api_key(),
                    config.get_endpoint(),
                    model.clone(),
                    retry,
                    timeout,
                ),
            },
            RewriteProvider::Anthropic => RewriteProviderImpl::Anthropic {
                client: Anthropic::new_with_config(
                    config.get_api_key(),
                    config.get_endpoint(),
                    model.clone(),
                    retry,
                    timeout,
                ),
            },
            RewriteProvider::Ollama => RewriteProviderImpl::Ollama {
                client: Ollama::new_with_config(&config.get_endpoint(), model.clone(), retry, timeout)?,
            },
        };

        Ok(Self {
            provider,
            provider_type: config.provider,
            model,
            common: config.common.clone(),
        })
    }

    /// Model in use
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl SceneRewriter for RewriteService {
    async fn rewrite(&self, request: &RewriteRequest) -> Result<String, ProviderError> {
        let (system_prompt, user_prompt) = build_prompts(request);
        let wants_json = request.contract == RewriteContract::ElementAligned;
        debug!(
            "Sending scene {} to {} ({} instructions)",
            request.scene_id,
            self.provider_type,
            request.instructions.len()
        );

        match &self.provider {
            RewriteProviderImpl::Gemini { client } => {
                let mut gemini_request = GeminiRequest::new(user_prompt)
                    .system(system_prompt)
                    .temperature(self.common.temperature)
                    .max_output_tokens(self.common.max_output_tokens);
                if wants_json {
                    gemini_request = gemini_request.json_response();
                }
                let response = client.complete(gemini_request).await?;
                Ok(Gemini::extract_text(&response))
            }
            RewriteProviderImpl::Anthropic { client } => {
                let anthropic_request = AnthropicRequest::new(&self.model, self.common.max_output_tokens)
                    .system(system_prompt)
                    .temperature(self.common.temperature)
                    .add_message("user", user_prompt);
                let response = client.complete(anthropic_request).await?;
                Ok(Anthropic::extract_text(&response))
            }
            RewriteProviderImpl::Ollama { client } => {
                let mut ollama_request = GenerationRequest::new(&self.model, user_prompt)
                    .system(system_prompt)
                    .temperature(self.common.temperature)
                    .num_predict(self.common.max_output_tokens);
                if wants_json {
                    ollama_request = ollama_request.format("json");
                }
                let response = client.complete(ollama_request).await?;
                Ok(Ollama::extract_text(&response))
            }
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match &self.provider {
            RewriteProviderImpl::Gemini { client } => client.test_connection().await,
            RewriteProviderImpl::Anthropic { client } => client.test_connection().await,
            RewriteProviderImpl::Ollama { client } => client.test_connection().await,
        }
    }

    fn name(&self) -> &str {
        self.provider_type.display_name()
    }
}
