/*!
 * Concurrent, failure-isolated scene rewriting.
 *
 * The orchestrator selects candidate scenes, dispatches one task per
 * candidate (bounded by a semaphore), waits for every task to settle and only
 * then merges successful results back into their scene slot. A failing or
 * timed-out scene keeps its original content and is reported as a warning.
 */

use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::{timeout_at, Instant};

use super::capability::{RewriteRequest, SceneRewriter};
use super::contract::{decode_response, DecodedRewrite, RewriteContract};
use super::diff::{diff_elements, diff_whole_scene, DiffReport, SceneDiff};
use crate::errors::{RewriteFailure, ScopeError};
use crate::plan::{relevant_changes, Change, ChangePlan};
use crate::screenplay::{Scene, Screenplay};

/// Inclusive, 1-based scene range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SceneRange {
    pub start: usize,
    pub end: usize,
}

impl SceneRange {
    /// Create a range; validation happens against a screenplay.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Check the range against the number of scenes.
    pub fn validate(&self, total: usize) -> Result<(), ScopeError> {
        if self.start > self.end {
            return Err(ScopeError::Reversed {
                start: self.start,
                end: self.end,
            });
        }
        if self.start < 1 || self.end > total {
            return Err(ScopeError::OutOfBounds {
                start: self.start,
                end: self.end,
                total,
            });
        }
        Ok(())
    }

    /// Whether the 1-based ordinal lies inside the range.
    pub fn contains(&self, ordinal: usize) -> bool {
        self.start <= ordinal && ordinal <= self.end
    }
}

/// Options for the rewrite orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Maximum number of rewrite calls in flight
    pub max_concurrent_requests: usize,

    /// Deadline for a single scene task, all attempts included.
    /// A valid candidate found before the deadline is kept.
    pub task_timeout: Duration,

    /// Payload contract
    pub contract: RewriteContract,

    /// Attempts per scene before accepting the best candidate
    pub max_attempts: u32,

    /// Minimum rewritten/original word ratio accepted without retrying
    pub min_length_ratio: f64,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 4,
            task_timeout: Duration::from_secs(180),
            contract: RewriteContract::ElementAligned,
            max_attempts: 2,
            min_length_ratio: 0.85,
        }
    }
}

impl OrchestratorOptions {
    /// Set the concurrency bound.
    pub fn with_max_concurrent_requests(mut self, max: usize) -> Self {
        self.max_concurrent_requests = max;
        self
    }

    /// Set the per-task deadline.
    pub fn with_task_timeout(mut self, task_timeout: Duration) -> Self {
        self.task_timeout = task_timeout;
        self
    }

    /// Set the payload contract.
    pub fn with_contract(mut self, contract: RewriteContract) -> Self {
        self.contract = contract;
        self
    }

    /// Set the attempt budget.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the length ratio threshold.
    pub fn with_min_length_ratio(mut self, ratio: f64) -> Self {
        self.min_length_ratio = ratio;
        self
    }
}

/// A scene that could not be rewritten.
#[derive(Debug, Clone, Serialize)]
pub struct RewriteWarning {
    /// 1-based scene position
    pub scene_index: usize,
    pub scene_id: String,
    pub heading: String,
    pub reason: String,
}

/// Result of a rewrite run.
#[derive(Debug, Clone)]
pub struct RewriteOutcome {
    /// Screenplay with successful rewrites merged in
    pub screenplay: Screenplay,

    /// Changed scenes
    pub report: DiffReport,

    /// Scenes that kept their original content because of a failure
    pub warnings: Vec<RewriteWarning>,
}

impl RewriteOutcome {
    /// Number of scenes that changed.
    pub fn rewritten_count(&self) -> usize {
        self.report.scene_diffs.len()
    }
}

struct Candidate {
    index: usize,
    scene: Scene,
    instructions: Vec<Change>,
}

/// Rewrites candidate scenes through an injected `SceneRewriter`.
pub struct RewriteOrchestrator {
    rewriter: Arc<dyn SceneRewriter>,
    options: OrchestratorOptions,
}

impl RewriteOrchestrator {
    /// Create a new orchestrator.
    pub fn new(rewriter: Arc<dyn SceneRewriter>, options: OrchestratorOptions) -> Self {
        Self { rewriter, options }
    }

    /// Options in use.
    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    /// Rewrite without progress reporting.
    pub async fn rewrite(
        &self,
        screenplay: Screenplay,
        plan: &ChangePlan,
        range: Option<SceneRange>,
    ) -> Result<RewriteOutcome, ScopeError> {
        self.rewrite_with_progress(screenplay, plan, range, |_, _| {}).await
    }

    /// Rewrite candidate scenes, calling `progress(completed, total)` as tasks settle.
    ///
    /// Fails only on an invalid range, before anything is dispatched.
    pub async fn rewrite_with_progress<F>(
        &self,
        mut screenplay: Screenplay,
        plan: &ChangePlan,
        range: Option<SceneRange>,
        progress: F,
    ) -> Result<RewriteOutcome, ScopeError>
    where
        F: Fn(usize, usize) + Send + Sync,
    {
        if let Some(range) = &range {
            range.validate(screenplay.len())?;
        }

        let contract = self.options.contract;
        let mut report = DiffReport::new(
            contract,
            range.map(|r| r.start),
            range.map(|r| r.end),
        );

        let candidates = select_candidates(&screenplay, plan, range.as_ref());
        let total = candidates.len();
        info!(
            "Rewriting {} of {} scenes with {} ({} concurrent)",
            total,
            screenplay.len(),
            self.rewriter.name(),
            self.options.max_concurrent_requests
        );

        if total == 0 {
            return Ok(RewriteOutcome {
                screenplay,
                report,
                warnings: Vec::new(),
            });
        }

        let concurrency = self.options.max_concurrent_requests.max(1);
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let completed = Arc::new(AtomicUsize::new(0));
        let progress = &progress;

        let mut results = stream::iter(candidates.into_iter())
            .map(|candidate| {
                let semaphore = semaphore.clone();
                let completed = completed.clone();

                async move {
                    let result = match semaphore.acquire().await {
                        Ok(_permit) => self.run_task(&candidate).await,
                        Err(e) => Err(RewriteFailure::MalformedResponse(format!(
                            "dispatch closed: {}",
                            e
                        ))),
                    };

                    let current = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress(current, total);

                    (candidate, result)
                }
            })
            .buffer_unordered(concurrency)
            .collect::<Vec<_>>()
            .await;

        // Barrier passed: merge in original order
        results.sort_by_key(|(candidate, _)| candidate.index);

        let mut warnings = Vec::new();
        for (candidate, result) in results {
            let ordinal = candidate.index + 1;
            match result {
                Ok(decoded) => {
                    if let Some(diff) = self.diff(ordinal, &candidate.scene, &decoded) {
                        debug!("Scene {} changed ({} changes)", candidate.scene.id, diff.change_count());
                        screenplay.scenes[candidate.index].elements = decoded.scene.elements;
                        report.scene_diffs.push(diff);
                    } else {
                        debug!("Scene {} came back unchanged", candidate.scene.id);
                    }
                }
                Err(failure) => {
                    warn!(
                        "Scene {} ({}) kept original content: {}",
                        candidate.scene.id, candidate.scene.heading, failure
                    );
                    warnings.push(RewriteWarning {
                        scene_index: ordinal,
                        scene_id: candidate.scene.id.clone(),
                        heading: candidate.scene.heading.clone(),
                        reason: failure.to_string(),
                    });
                }
            }
        }

        info!(
            "Rewrite finished: {} changed, {} unchanged, {} failed",
            report.scene_diffs.len(),
            total - report.scene_diffs.len() - warnings.len(),
            warnings.len()
        );

        Ok(RewriteOutcome {
            screenplay,
            report,
            warnings,
        })
    }

    fn diff(&self, ordinal: usize, original: &Scene, decoded: &DecodedRewrite) -> Option<SceneDiff> {
        match self.options.contract {
            RewriteContract::ElementAligned => diff_elements(ordinal, original, &decoded.scene),
            RewriteContract::WholeScene => {
                diff_whole_scene(ordinal, original, &decoded.scene, decoded.summary.as_deref())
            }
        }
    }

    async fn run_task(&self, candidate: &Candidate) -> Result<DecodedRewrite, RewriteFailure> {
        let start = Instant::now();
        let result = self.attempt_rewrite(candidate, start + self.options.task_timeout).await;

        debug!("Scene {} settled in {:?}", candidate.scene.id, start.elapsed());
        result
    }

    /// Bounded retry: short candidates trigger another attempt, and after the
    /// last attempt the longest valid candidate wins.
    ///
    /// Every attempt runs against the same task deadline. An attempt cut off by
    /// the deadline ends the loop; an earlier valid candidate is still accepted.
    async fn attempt_rewrite(
        &self,
        candidate: &Candidate,
        deadline: Instant,
    ) -> Result<DecodedRewrite, RewriteFailure> {
        let scene = &candidate.scene;
        let request = RewriteRequest::for_scene(
            candidate.index + 1,
            scene,
            candidate.instructions.clone(),
            self.options.contract,
        );

        let original_words: usize = scene.elements.iter().map(|e| e.word_count()).sum();
        let min_words = self.options.min_length_ratio * original_words as f64;
        let max_attempts = self.options.max_attempts.max(1);

        let mut best: Option<DecodedRewrite> = None;
        let mut last_error: Option<RewriteFailure> = None;
        let mut attempts = 0;

        for attempt in 1..=max_attempts {
            attempts = attempt;
            let response = match timeout_at(deadline, self.rewriter.rewrite(&request)).await {
                Ok(response) => response.map_err(RewriteFailure::from),
                Err(_) => {
                    debug!("Scene {} attempt {}/{} hit the task deadline", scene.id, attempt, max_attempts);
                    last_error = Some(RewriteFailure::Timeout(self.options.task_timeout));
                    break;
                }
            };
            match response.and_then(|raw| decode_response(self.options.contract, scene, &raw)) {
                Ok(decoded) => {
                    let words = decoded.word_count();
                    if words as f64 >= min_words {
                        return Ok(decoded);
                    }

                    debug!(
                        "Scene {} attempt {}/{}: {} words, below {:.0}",
                        scene.id, attempt, max_attempts, words, min_words
                    );
                    if best.as_ref().is_none_or(|b| words > b.word_count()) {
                        best = Some(decoded);
                    }
                }
                Err(failure) => {
                    debug!("Scene {} attempt {}/{} failed: {}", scene.id, attempt, max_attempts, failure);
                    let fatal = matches!(&failure, RewriteFailure::Provider(e) if !e.is_retryable());
                    last_error = Some(failure);
                    if fatal {
                        break;
                    }
                }
            }
        }

        match best {
            Some(decoded) => {
                info!("Scene {}: accepting shorter rewrite after {} attempts", scene.id, attempts);
                Ok(decoded)
            }
            None => Err(last_error.unwrap_or(RewriteFailure::EmptyResponse)),
        }
    }
}

fn select_candidates(
    screenplay: &Screenplay,
    plan: &ChangePlan,
    range: Option<&SceneRange>,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for (index, scene) in screenplay.scenes.iter().enumerate() {
        let relevant: Vec<Change> = relevant_changes(scene, plan).into_iter().cloned().collect();

        let instructions = match range {
            Some(range) if !range.contains(index + 1) => continue,
            Some(_) if relevant.is_empty() => plan.changes.clone(),
            Some(_) => relevant,
            None if relevant.is_empty() => continue,
            None => relevant,
        };

        candidates.push(Candidate {
            index,
            scene: scene.clone(),
            instructions,
        });
    }

    candidates
}
