/*!
 * Integration tests for the application workflow
 */

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use scriptwai::errors::ProviderError;
use scriptwai::app_config::Config;
use scriptwai::app_controller::{Controller, ISSUES_LOG_FILE};
use scriptwai::file_utils::FileManager;
use scriptwai::providers::mock::MockRewriter;
use scriptwai::rewrite::{DiffReport, RewriteRequest, SceneRange, SceneRewriter};
use scriptwai::screenplay::Act;
use crate::common;

/// Rewriter whose backend cannot be reached
struct Unreachable {
    calls: AtomicUsize,
}

#[async_trait]
impl SceneRewriter for Unreachable {
    async fn rewrite(&self, request: &RewriteRequest) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(MockRewriter::echo_response(request))
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        Err(ProviderError::ConnectionError("connection refused".to_string()))
    }

    fn name(&self) -> &str {
        "unreachable"
    }
}

/// A full run writes the Fountain text and a fingerprinted report
#[tokio::test]
async fn test_run_withParagraphDocument_shouldWriteOutputs() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let document = common::create_test_file(temp_dir.path(), "pilot.json", common::TWO_SCENE_PARAGRAPHS)?;
    let plan = common::create_test_file(temp_dir.path(), "notes.json", common::RAIN_PLAN)?;
    let output_dir = temp_dir.path().join("out");
    let controller = Controller::with_rewriter(Config::default(), Arc::new(MockRewriter::appending(" (raining)")));

    let summary = controller
        .run(&document, &plan, None, &output_dir, false)
        .await?
        .expect("run should not be skipped");

    assert_eq!(summary.fountain_path, output_dir.join("pilot_FULL.fountain"));
    assert_eq!(summary.rewritten_scenes, 2);
    let fountain = FileManager::read_to_string(&summary.fountain_path)?;
    assert!(fountain.contains("He sits. (raining)"));

    let report: DiffReport = serde_json::from_str(&FileManager::read_to_string(&summary.report_path)?)?;
    assert_eq!(report.source.as_deref(), Some("pilot.json"));
    assert_eq!(report.source_sha256.map(|h| h.len()), Some(64));
    assert_eq!(report.scene_diffs.len(), 2);
    assert!(!output_dir.join(ISSUES_LOG_FILE).exists());

    Ok(())
}

/// Existing outputs are kept unless overwriting is forced
#[tokio::test]
async fn test_run_withExistingOutput_shouldSkipUnlessForced() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let document = common::create_test_file(temp_dir.path(), "pilot.json", &common::paragraphs_json(4))?;
    let plan = common::create_test_file(temp_dir.path(), "notes.json", common::RAIN_PLAN)?;
    let range = Some(SceneRange::new(1, 2));
    let existing = FileManager::fountain_output_path(&document, temp_dir.path(), range);
    FileManager::write_to_file(&existing, "keep me\n")?;
    let controller = Controller::with_rewriter(Config::default(), Arc::new(MockRewriter::working()));

    let skipped = controller.run(&document, &plan, range, temp_dir.path(), false).await?;
    assert!(skipped.is_none());
    assert_eq!(FileManager::read_to_string(&existing)?, "keep me\n");

    let forced = controller.run(&document, &plan, range, temp_dir.path(), true).await?;
    assert!(forced.is_some());
    assert_ne!(FileManager::read_to_string(&existing)?, "keep me\n");

    Ok(())
}

/// Failed scenes are listed in the issues log
#[tokio::test]
async fn test_run_withFailingScene_shouldWriteIssuesLog() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let document = common::create_test_file(temp_dir.path(), "pilot.fdx", common::SAMPLE_FDX)?;
    let plan = common::create_test_file(temp_dir.path(), "notes.json", common::RAIN_PLAN)?;
    let controller = Controller::with_rewriter(Config::default(), Arc::new(MockRewriter::failing_for(["S002"])));

    let summary = controller
        .run(&document, &plan, None, temp_dir.path(), false)
        .await?
        .expect("run should not be skipped");

    assert_eq!(summary.rewritten_scenes, 1);
    assert_eq!(summary.warnings.len(), 1);
    let issues = FileManager::read_to_string(temp_dir.path().join(ISSUES_LOG_FILE))?;
    assert!(issues.contains("S002 (EXT. PARKING LOT - CONTINUOUS)"));

    Ok(())
}

/// A broken plan aborts the run without writing anything
#[test]
fn test_run_withInvalidPlan_shouldFailWithoutOutput() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let document = common::create_test_file(temp_dir.path(), "pilot.json", common::TWO_SCENE_PARAGRAPHS)?;
    let plan = common::create_test_file(temp_dir.path(), "notes.json", r#"{"changes": []}"#)?;
    let controller = Controller::with_rewriter(Config::default(), Arc::new(MockRewriter::working()));

    let result = tokio_test::block_on(async {
        controller.run(&document, &plan, None, temp_dir.path(), false).await
    });

    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("scene_level_changes"));
    assert!(!FileManager::fountain_output_path(&document, temp_dir.path(), None).exists());

    Ok(())
}

/// Scene listing shows ids, acts and element counts
#[test]
fn test_list_scenes_withFinalDraft_shouldDescribeScenes() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let document = common::create_test_file(temp_dir.path(), "pilot.fdx", common::SAMPLE_FDX)?;
    let controller = Controller::with_config(Config::default())?;

    let scenes = controller.list_scenes(&document)?;

    assert_eq!(scenes.len(), 2);
    assert_eq!(scenes[0].id, "S001");
    assert_eq!(scenes[0].act, Some(Act::ActI));
    assert_eq!(scenes[0].element_count, 4);
    assert_eq!(scenes[1].heading, "EXT. PARKING LOT - CONTINUOUS");
    assert_eq!(scenes[1].element_count, 2);

    Ok(())
}

/// Controller options follow the configuration
#[test]
fn test_transform_options_shouldFollowConfig() -> Result<()> {
    let mut config = Config::default();
    config.rewrite.common.max_attempts = 5;
    if let Some(provider) = config.rewrite.available_providers.first_mut() {
        provider.concurrent_requests = 7;
    }
    let controller = Controller::with_config(config)?;

    let options = controller.transform_options();

    assert_eq!(options.orchestrator.max_attempts, 5);
    assert_eq!(options.orchestrator.max_concurrent_requests, 7);
    assert_eq!(
        options.orchestrator.task_timeout,
        controller.config().rewrite.get_timeout() * 5
    );

    Ok(())
}

/// A failed connection test stops the run before any scene is sent
#[tokio::test]
async fn test_run_withUnreachableRewriter_shouldFailBeforeDispatch() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let document = common::create_test_file(temp_dir.path(), "pilot.json", common::TWO_SCENE_PARAGRAPHS)?;
    let plan = common::create_test_file(temp_dir.path(), "notes.json", common::RAIN_PLAN)?;
    let rewriter = Arc::new(Unreachable { calls: AtomicUsize::new(0) });
    let controller = Controller::with_rewriter(Config::default(), rewriter.clone());

    let result = controller.run(&document, &plan, None, temp_dir.path(), false).await;

    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("Connection test failed for unreachable"));
    assert!(message.contains("connection refused"));
    assert_eq!(rewriter.calls.load(Ordering::SeqCst), 0);
    assert!(!FileManager::fountain_output_path(&document, temp_dir.path(), None).exists());

    Ok(())
}
