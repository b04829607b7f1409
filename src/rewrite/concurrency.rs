/*!
 * Provider-specific concurrency tuning.
 *
 * Defaults for how many scenes may be in flight at once and how many
 * requests per minute a provider tolerates.
 */

use crate::app_config::RewriteProvider;

/// Provider-specific concurrency profile with tuned defaults
#[derive(Debug, Clone)]
pub struct ProviderProfile {
    /// Maximum concurrent requests
    pub max_concurrent_requests: usize,
    /// Target requests per minute (for rate limiting)
    pub target_rpm: Option<u32>,
}

impl ProviderProfile {
    /// Get the profile for a given provider
    pub fn for_provider(provider: RewriteProvider) -> Self {
        match provider {
            RewriteProvider::Gemini => Self {
                // Long generations, moderate per-minute quota
                max_concurrent_requests: 4,
                target_rpm: Some(30),
            },
            RewriteProvider::Anthropic => Self {
                max_concurrent_requests: 5,
                target_rpm: Some(45),
            },
            RewriteProvider::Ollama => Self {
                // Local model, bounded by the host GPU
                max_concurrent_requests: 2,
                target_rpm: None,
            },
        }
    }

    /// Get effective concurrent requests, respecting any user override
    pub fn effective_concurrent_requests(&self, user_override: Option<usize>) -> usize {
        user_override
            .filter(|n| *n > 0)
            .unwrap_or(self.max_concurrent_requests)
    }
}
