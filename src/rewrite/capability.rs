/*!
 * The rewrite capability seam.
 *
 * The orchestrator only ever talks to a `SceneRewriter`. Production code plugs
 * in `RewriteService` (an LLM provider behind prompts); tests plug in
 * `MockRewriter`.
 */

use async_trait::async_trait;
use serde::Serialize;

use super::contract::RewriteContract;
use crate::errors::ProviderError;
use crate::plan::Change;
use crate::screenplay::{scene_to_fountain, Scene};

/// Scene content sent to the capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SceneContent {
    /// Element texts in order
    Elements(Vec<String>),
    /// Fountain text of the whole scene
    Text(String),
}

/// One rewrite call.
#[derive(Debug, Clone)]
pub struct RewriteRequest {
    /// 1-based position of the scene
    pub scene_index: usize,

    /// Stable scene id
    pub scene_id: String,

    /// Scene heading
    pub heading: String,

    /// Content to rewrite
    pub content: SceneContent,

    /// Instructions to apply
    pub instructions: Vec<Change>,

    /// Expected response shape
    pub contract: RewriteContract,
}

impl RewriteRequest {
    /// Build the request for a scene under the given contract.
    pub fn for_scene(
        scene_index: usize,
        scene: &Scene,
        instructions: Vec<Change>,
        contract: RewriteContract,
    ) -> Self {
        let content = match contract {
            RewriteContract::ElementAligned => SceneContent::Elements(scene.element_texts()),
            RewriteContract::WholeScene => SceneContent::Text(scene_to_fountain(scene)),
        };

        Self {
            scene_index,
            scene_id: scene.id.clone(),
            heading: scene.heading.clone(),
            content,
            instructions,
            contract,
        }
    }
}

/// Something that can rewrite a scene.
///
/// Implementations must be safe to call concurrently with independent
/// requests. The returned string is the raw payload; decoding and validation
/// happen in the orchestrator.
#[async_trait]
pub trait SceneRewriter: Send + Sync {
    /// Rewrite one scene.
    async fn rewrite(&self, request: &RewriteRequest) -> Result<String, ProviderError>;

    /// Check that the rewriter is reachable before any scene is sent.
    async fn test_connection(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Name used in logs.
    fn name(&self) -> &str {
        "rewriter"
    }
}
