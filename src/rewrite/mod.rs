/*!
 * Scene rewriting.
 *
 * - `capability`: the `SceneRewriter` seam and its request type
 * - `contract`: response shapes and their decoding
 * - `orchestrator`: bounded, failure-isolated concurrent rewriting
 * - `diff`: change records and the run report
 * - `prompts`: LLM prompt construction
 * - `service`: config-driven `SceneRewriter` over the HTTP providers
 * - `concurrency`: per-provider concurrency defaults
 */

pub mod capability;
pub mod concurrency;
pub mod contract;
pub mod diff;
pub mod orchestrator;
pub mod prompts;
pub mod service;

pub use self::capability::{RewriteRequest, SceneContent, SceneRewriter};
pub use self::contract::{decode_response, DecodedRewrite, RewriteContract, SUMMARY_SENTINEL};
pub use self::diff::{diff_elements, diff_whole_scene, DiffReport, ElementChange, SceneChanges, SceneDiff};
pub use self::orchestrator::{
    OrchestratorOptions, RewriteOrchestrator, RewriteOutcome, RewriteWarning, SceneRange,
};
pub use self::service::RewriteService;
