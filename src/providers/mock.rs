/*!
 * Mock rewriter for testing.
 *
 * This module provides an in-process `SceneRewriter` that simulates different
 * behaviors:
 * - `MockRewriter::working()` - Always succeeds, marking every element
 * - `MockRewriter::appending(suffix)` - Appends a fixed suffix to every element
 * - `MockRewriter::failing()` - Always fails with an error
 * - `MockRewriter::failing_for(ids)` - Fails only for the given scenes
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::rewrite::capability::{RewriteRequest, SceneContent, SceneRewriter};
use crate::rewrite::contract::SUMMARY_SENTINEL;

/// Suffix added by the working behavior
pub const WORKING_SUFFIX: &str = " (revised)";

/// Behavior mode for the mock rewriter
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Always succeeds, appending `WORKING_SUFFIX`
    Working,
    /// Always succeeds, appending the given suffix
    Appending(String),
    /// Returns the content unchanged
    Echo,
    /// Response built by a function of the request
    Custom(fn(&RewriteRequest) -> String),
    /// Always fails with an error
    Failing,
    /// Fails every Nth request (1-based)
    Intermittent { fail_every: usize },
    /// Fails for the listed scene ids, works for the rest
    FailingForScenes(Vec<String>),
    /// Returns text that is not a valid payload
    Malformed,
    /// Returns an empty response
    Empty,
    /// Waits before answering like `Working` (for timeout testing)
    Slow(Duration),
}

/// Mock rewriter for testing orchestration behavior
#[derive(Debug)]
pub struct MockRewriter {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter
    request_count: Arc<AtomicUsize>,
    /// Scene ids in the order they were requested
    requested_scenes: Arc<Mutex<Vec<String>>>,
}

impl MockRewriter {
    /// Create a new mock rewriter with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            requested_scenes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a working mock rewriter that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a mock rewriter that appends `suffix` to every element
    pub fn appending(suffix: impl Into<String>) -> Self {
        Self::new(MockBehavior::Appending(suffix.into()))
    }

    /// Create a failing mock rewriter that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock rewriter that fails only for the given scenes
    pub fn failing_for<I, S>(scene_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(MockBehavior::FailingForScenes(
            scene_ids.into_iter().map(Into::into).collect(),
        ))
    }

    /// Shared request counter, usable after the mock is moved into an `Arc`
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.request_count.clone()
    }

    /// Shared log of requested scene ids
    pub fn request_log(&self) -> Arc<Mutex<Vec<String>>> {
        self.requested_scenes.clone()
    }

    /// Number of requests made so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Build a valid response that appends `suffix` to every element
    pub fn append_response(request: &RewriteRequest, suffix: &str) -> String {
        match &request.content {
            SceneContent::Elements(texts) => {
                let rewritten: Vec<String> = texts.iter().map(|t| format!("{}{}", t, suffix)).collect();
                serde_json::to_string(&rewritten).unwrap_or_else(|_| "[]".to_string())
            }
            SceneContent::Text(text) => {
                let blocks: Vec<String> = text
                    .trim()
                    .split("\n\n")
                    .enumerate()
                    .map(|(i, block)| {
                        // Heading and all-caps cues stay as they are
                        if i == 0 || !block.chars().any(char::is_lowercase) {
                            block.to_string()
                        } else {
                            format!("{}{}", block, suffix)
                        }
                    })
                    .collect();
                format!(
                    "{}\n\n{}\nAppended \"{}\" to every line.",
                    blocks.join("\n\n"),
                    SUMMARY_SENTINEL,
                    suffix.trim()
                )
            }
        }
    }

    /// Build a response that repeats the content unchanged
    pub fn echo_response(request: &RewriteRequest) -> String {
        match &request.content {
            SceneContent::Elements(texts) => serde_json::to_string(texts).unwrap_or_else(|_| "[]".to_string()),
            SceneContent::Text(text) => text.clone(),
        }
    }

    fn failure(request: &RewriteRequest) -> ProviderError {
        ProviderError::RequestFailed(format!("Simulated failure for scene {}", request.scene_id))
    }
}

#[async_trait]
impl SceneRewriter for MockRewriter {
    async fn rewrite(&self, request: &RewriteRequest) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.requested_scenes.lock().push(request.scene_id.clone());

        match &self.behavior {
            MockBehavior::Working => Ok(Self::append_response(request, WORKING_SUFFIX)),
            MockBehavior::Appending(suffix) => Ok(Self::append_response(request, suffix)),
            MockBehavior::Echo => Ok(Self::echo_response(request)),
            MockBehavior::Custom(generator) => Ok(generator(request)),
            MockBehavior::Failing => Err(Self::failure(request)),
            MockBehavior::Intermittent { fail_every } => {
                if *fail_every > 0 && count % fail_every == 0 {
                    Err(Self::failure(request))
                } else {
                    Ok(Self::append_response(request, WORKING_SUFFIX))
                }
            }
            MockBehavior::FailingForScenes(scene_ids) => {
                if scene_ids.iter().any(|id| *id == request.scene_id) {
                    Err(Self::failure(request))
                } else {
                    Ok(Self::append_response(request, WORKING_SUFFIX))
                }
            }
            MockBehavior::Malformed => Ok("I rewrote the scene, hope you like it!".to_string()),
            MockBehavior::Empty => Ok(String::new()),
            MockBehavior::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(Self::append_response(request, WORKING_SUFFIX))
            }
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
