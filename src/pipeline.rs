/*!
 * End-to-end transformation.
 *
 * document -> canonical model -> acts -> scoped concurrent rewrite -> diff
 * report -> Fountain text. Parse, schema and scope errors abort the run with
 * no partial output; per-scene rewrite failures come back as warnings.
 */

use log::info;
use std::sync::Arc;

use crate::errors::PipelineError;
use crate::plan::{parse_change_plan, ChangePlan};
use crate::rewrite::{
    DiffReport, OrchestratorOptions, RewriteOrchestrator, RewriteWarning, SceneRange, SceneRewriter,
};
use crate::screenplay::{classify_acts, load_document, to_fountain, DocumentFormat, ParserOptions, Screenplay};

/// Options for a transformation run
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    /// Parser options
    pub parser: ParserOptions,
    /// Orchestrator options
    pub orchestrator: OrchestratorOptions,
}

/// Output of a transformation run
#[derive(Debug, Clone)]
pub struct TransformResult {
    /// Screenplay after rewriting
    pub screenplay: Screenplay,
    /// Fountain-style text of the whole screenplay
    pub fountain_text: String,
    /// Changed scenes
    pub report: DiffReport,
    /// Scenes that kept their original content
    pub warnings: Vec<RewriteWarning>,
}

/// Wires parser, act classifier, orchestrator and serializer together.
pub struct Pipeline {
    orchestrator: RewriteOrchestrator,
    parser: ParserOptions,
}

impl Pipeline {
    /// Create a new pipeline around a rewriter.
    pub fn new(rewriter: Arc<dyn SceneRewriter>, options: TransformOptions) -> Self {
        Self {
            orchestrator: RewriteOrchestrator::new(rewriter, options.orchestrator),
            parser: options.parser,
        }
    }

    /// Parse a document and classify its acts.
    pub fn load(&self, document: &str, format: DocumentFormat) -> Result<Screenplay, PipelineError> {
        let mut screenplay = load_document(document, format, &self.parser)?;
        classify_acts(&mut screenplay);
        Ok(screenplay)
    }

    /// Run the whole transformation.
    pub async fn transform(
        &self,
        document: &str,
        format: DocumentFormat,
        plan_json: &str,
        range: Option<SceneRange>,
    ) -> Result<TransformResult, PipelineError> {
        self.transform_with_progress(document, format, plan_json, range, |_, _| {})
            .await
    }

    /// Run the whole transformation, reporting `(completed, total)` scene tasks.
    pub async fn transform_with_progress<F>(
        &self,
        document: &str,
        format: DocumentFormat,
        plan_json: &str,
        range: Option<SceneRange>,
        progress: F,
    ) -> Result<TransformResult, PipelineError>
    where
        F: Fn(usize, usize) + Send + Sync,
    {
        let screenplay = self.load(document, format)?;
        let plan = parse_change_plan(plan_json)?;
        info!(
            "Loaded {} scenes ({} elements) and {} changes",
            screenplay.len(),
            screenplay.element_count(),
            plan.len()
        );

        self.transform_screenplay_with_progress(screenplay, &plan, range, progress)
            .await
    }

    /// Rewrite and serialize an already classified screenplay.
    pub async fn transform_screenplay(
        &self,
        screenplay: Screenplay,
        plan: &ChangePlan,
        range: Option<SceneRange>,
    ) -> Result<TransformResult, PipelineError> {
        self.transform_screenplay_with_progress(screenplay, plan, range, |_, _| {})
            .await
    }

    async fn transform_screenplay_with_progress<F>(
        &self,
        screenplay: Screenplay,
        plan: &ChangePlan,
        range: Option<SceneRange>,
        progress: F,
    ) -> Result<TransformResult, PipelineError>
    where
        F: Fn(usize, usize) + Send + Sync,
    {
        let outcome = self
            .orchestrator
            .rewrite_with_progress(screenplay, plan, range, progress)
            .await?;
        let fountain_text = to_fountain(&outcome.screenplay);

        Ok(TransformResult {
            screenplay: outcome.screenplay,
            fountain_text,
            report: outcome.report,
            warnings: outcome.warnings,
        })
    }
}
