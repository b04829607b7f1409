/*!
 * Integration tests for concurrent scene rewriting
 */

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use scriptwai::errors::{ProviderError, ScopeError};
use scriptwai::plan::parse_change_plan;
use scriptwai::providers::mock::{MockBehavior, MockRewriter, WORKING_SUFFIX};
use scriptwai::rewrite::{
    OrchestratorOptions, RewriteOrchestrator, RewriteRequest, SceneChanges, SceneRange, SceneRewriter,
};
use crate::common;

/// Rewriter that records how many calls overlap; later scenes answer faster
struct OverlapRecorder {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl OverlapRecorder {
    fn new() -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SceneRewriter for OverlapRecorder {
    async fn rewrite(&self, request: &RewriteRequest) -> Result<String, ProviderError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = 10 * (8usize.saturating_sub(request.scene_index)) as u64;
        tokio::time::sleep(Duration::from_millis(delay)).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(MockRewriter::append_response(request, WORKING_SUFFIX))
    }
}

/// Rewriter whose first answer is short and whose second never arrives in time
struct ShortThenStalled {
    calls: AtomicUsize,
}

#[async_trait]
impl SceneRewriter for ShortThenStalled {
    async fn rewrite(&self, _request: &RewriteRequest) -> Result<String, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(Duration::from_millis(150)).await;
        if call > 1 {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        Ok(r#"["Short."]"#.to_string())
    }
}

fn everywhere_plan() -> String {
    common::plan_json(&[("Make it rain", "Entire Screenplay")])
}

/// Failed scenes keep their content while the others are rewritten
#[tokio::test]
async fn test_rewrite_withFailingScenes_shouldIsolateFailures() -> Result<()> {
    common::init_test_logging();
    let screenplay = common::screenplay_with_scenes(4);
    let original = screenplay.clone();
    let plan = parse_change_plan(&everywhere_plan())?;
    let mock = MockRewriter::failing_for(["S002", "S003"]);
    let calls = mock.call_counter();
    let orchestrator = RewriteOrchestrator::new(Arc::new(mock), OrchestratorOptions::default());

    let outcome = orchestrator.rewrite(screenplay, &plan, None).await?;

    assert_eq!(outcome.screenplay.len(), 4);
    assert_eq!(outcome.warnings.len(), 2);
    assert_eq!(outcome.warnings[0].scene_id, "S002");
    assert_eq!(outcome.warnings[1].scene_id, "S003");
    assert_eq!(outcome.screenplay.scenes[1], original.scenes[1]);
    assert_eq!(outcome.screenplay.scenes[2], original.scenes[2]);
    assert!(outcome.screenplay.scenes[0].elements[0].text.ends_with(WORKING_SUFFIX));
    assert!(outcome.report.contains_scene("S001"));
    assert!(outcome.report.contains_scene("S004"));
    assert!(!outcome.report.contains_scene("S002"));
    // Two attempts for each failing scene
    assert_eq!(calls.load(Ordering::SeqCst), 6);

    Ok(())
}

/// A reversed range fails before anything is dispatched
#[tokio::test]
async fn test_rewrite_withReversedRange_shouldFailWithoutCalls() -> Result<()> {
    let plan = parse_change_plan(&everywhere_plan())?;
    let mock = MockRewriter::working();
    let calls = mock.call_counter();
    let orchestrator = RewriteOrchestrator::new(Arc::new(mock), OrchestratorOptions::default());

    let result = orchestrator
        .rewrite(common::screenplay_with_scenes(4), &plan, Some(SceneRange::new(5, 2)))
        .await;

    assert_eq!(result.unwrap_err(), ScopeError::Reversed { start: 5, end: 2 });
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    Ok(())
}

/// Scenes without relevant changes are neither sent nor reported
#[tokio::test]
async fn test_rewrite_withActOnePlan_shouldOnlyTouchActOne() -> Result<()> {
    let plan = parse_change_plan(&common::plan_json(&[("Open stronger", "Act I")]))?;
    let mock = MockRewriter::working();
    let log = mock.request_log();
    let orchestrator = RewriteOrchestrator::new(Arc::new(mock), OrchestratorOptions::default());

    let outcome = orchestrator.rewrite(common::screenplay_with_scenes(8), &plan, None).await?;

    let mut requested = log.lock().clone();
    requested.sort();
    assert_eq!(requested, ["S001".to_string(), "S002".to_string()]);
    let reported: Vec<&str> = outcome.report.scene_diffs.iter().map(|d| d.scene_id.as_str()).collect();
    assert_eq!(reported, ["S001", "S002"]);

    Ok(())
}

/// An unchanged response leaves the scene out of the report
#[tokio::test]
async fn test_rewrite_withEchoResponse_shouldReportNothing() -> Result<()> {
    let screenplay = common::screenplay_with_scenes(3);
    let plan = parse_change_plan(&everywhere_plan())?;
    let orchestrator = RewriteOrchestrator::new(
        Arc::new(MockRewriter::new(MockBehavior::Echo)),
        OrchestratorOptions::default(),
    );

    let outcome = orchestrator.rewrite(screenplay.clone(), &plan, None).await?;

    assert!(outcome.report.scene_diffs.is_empty());
    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.screenplay, screenplay);

    Ok(())
}

/// Undecodable responses become warnings after every attempt is spent
#[tokio::test]
async fn test_rewrite_withMalformedResponses_shouldWarnPerScene() -> Result<()> {
    let plan = parse_change_plan(&everywhere_plan())?;
    let mock = MockRewriter::new(MockBehavior::Malformed);
    let calls = mock.call_counter();
    let options = OrchestratorOptions::default().with_max_attempts(3);
    let orchestrator = RewriteOrchestrator::new(Arc::new(mock), options);

    let outcome = orchestrator.rewrite(common::screenplay_with_scenes(2), &plan, None).await?;

    assert_eq!(outcome.warnings.len(), 2);
    assert!(outcome.warnings[0].reason.contains("Malformed"));
    assert!(outcome.report.scene_diffs.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 6);

    Ok(())
}

/// Concurrency stays within the bound and results merge in screenplay order
#[tokio::test]
async fn test_rewrite_withConcurrencyBound_shouldNotExceedItAndKeepOrder() -> Result<()> {
    let plan = parse_change_plan(&everywhere_plan())?;
    let recorder = Arc::new(OverlapRecorder::new());
    let options = OrchestratorOptions::default().with_max_concurrent_requests(2);
    let orchestrator = RewriteOrchestrator::new(recorder.clone(), options);

    let outcome = orchestrator.rewrite(common::screenplay_with_scenes(6), &plan, None).await?;

    assert!(recorder.max_in_flight.load(Ordering::SeqCst) <= 2);
    let order: Vec<usize> = outcome.report.scene_diffs.iter().map(|d| d.scene_index).collect();
    assert_eq!(order, [1, 2, 3, 4, 5, 6]);

    Ok(())
}

/// In range mode a scene without relevant changes gets the whole plan
#[tokio::test]
async fn test_rewrite_withRangeAndNoRelevantChanges_shouldSendWholePlan() -> Result<()> {
    let plan = parse_change_plan(&common::plan_json(&[
        ("Tighten finale", "Act III"),
        ("Fix the diner", "Specific Scene"),
    ]))?;
    let mock = MockRewriter::new(MockBehavior::Custom(|request| {
        MockRewriter::append_response(request, &format!(" [{}]", request.instructions.len()))
    }));
    let orchestrator = RewriteOrchestrator::new(Arc::new(mock), OrchestratorOptions::default());

    let outcome = orchestrator
        .rewrite(common::screenplay_with_scenes(4), &plan, Some(SceneRange::new(1, 1)))
        .await?;

    assert_eq!(outcome.report.scene_diffs.len(), 1);
    match &outcome.report.scene_diffs[0].changes {
        SceneChanges::Elements(changes) => assert!(changes[0].after.ends_with(" [2]")),
        other => panic!("unexpected changes: {:?}", other),
    }

    Ok(())
}

/// A short rewrite survives when the retry runs into the task deadline
#[tokio::test]
async fn test_rewrite_withRetryPastDeadline_shouldKeepEarlierCandidate() -> Result<()> {
    common::init_test_logging();
    let plan = parse_change_plan(&everywhere_plan())?;
    let rewriter = Arc::new(ShortThenStalled { calls: AtomicUsize::new(0) });
    let options = OrchestratorOptions::default()
        .with_task_timeout(Duration::from_millis(200))
        .with_max_attempts(2);
    let orchestrator = RewriteOrchestrator::new(rewriter.clone(), options);

    let outcome = orchestrator.rewrite(common::screenplay_with_scenes(1), &plan, None).await?;

    assert!(outcome.warnings.is_empty(), "unexpected warnings: {:?}", outcome.warnings);
    assert_eq!(outcome.screenplay.scenes[0].elements[0].text, "Short.");
    assert_eq!(outcome.report.scene_diffs.len(), 1);
    assert_eq!(rewriter.calls.load(Ordering::SeqCst), 2);

    Ok(())
}
