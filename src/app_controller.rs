use anyhow::{Result, Context};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn, debug};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::pipeline::{Pipeline, TransformOptions};
use crate::rewrite::{OrchestratorOptions, RewriteService, RewriteWarning, SceneRange, SceneRewriter};
use crate::screenplay::{classify_acts, load_document, Act};

// @module: Application controller for screenplay rewriting

/// Name of the file collecting per-scene failures
pub const ISSUES_LOG_FILE: &str = "scriptwai.issues.log";

/// Files written by a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Rewritten screenplay
    pub fountain_path: PathBuf,
    /// Diff report
    pub report_path: PathBuf,
    /// Scenes whose content changed
    pub rewritten_scenes: usize,
    /// Changed elements (or summarized scenes)
    pub total_changes: usize,
    /// Scenes that kept their original content
    pub warnings: Vec<RewriteWarning>,
}

/// One line of the `scenes` listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneSummary {
    /// 1-based position
    pub index: usize,
    pub id: String,
    pub heading: String,
    pub act: Option<Act>,
    pub element_count: usize,
    pub word_count: usize,
}

/// Main application controller for screenplay rewriting
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Injected rewriter; built from the config when absent
    rewriter: Option<Arc<dyn SceneRewriter>>,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self {
            config,
            rewriter: None,
        })
    }

    /// Create a controller that uses the given rewriter instead of an HTTP provider
    pub fn with_rewriter(config: Config, rewriter: Arc<dyn SceneRewriter>) -> Self {
        Self {
            config,
            rewriter: Some(rewriter),
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Pipeline options derived from the configuration
    pub fn transform_options(&self) -> TransformOptions {
        let rewrite = &self.config.rewrite;
        TransformOptions {
            parser: self.config.parser.options(),
            orchestrator: OrchestratorOptions::default()
                .with_max_concurrent_requests(rewrite.optimal_concurrent_requests())
                .with_task_timeout(rewrite.get_task_timeout())
                .with_contract(rewrite.common.contract)
                .with_max_attempts(rewrite.common.max_attempts)
                .with_min_length_ratio(rewrite.common.min_length_ratio),
        }
    }

    fn rewriter(&self) -> Result<Arc<dyn SceneRewriter>> {
        match &self.rewriter {
            Some(rewriter) => Ok(Arc::clone(rewriter)),
            None => {
                let service = RewriteService::new(&self.config.rewrite)
                    .context("Failed to create rewrite service")?;
                Ok(Arc::new(service))
            }
        }
    }

    /// Run the rewrite workflow for one document.
    ///
    /// Returns `None` when the outputs already exist and `force_overwrite` is off.
    pub async fn run(
        &self,
        document_path: &Path,
        plan_path: &Path,
        range: Option<SceneRange>,
        output_dir: &Path,
        force_overwrite: bool,
    ) -> Result<Option<RunSummary>> {
        let start_time = std::time::Instant::now();

        if !FileManager::file_exists(document_path) {
            return Err(anyhow::anyhow!("Document does not exist: {:?}", document_path));
        }
        if !FileManager::file_exists(plan_path) {
            return Err(anyhow::anyhow!("Change plan does not exist: {:?}", plan_path));
        }

        let fountain_path = FileManager::fountain_output_path(document_path, output_dir, range);
        let report_path = FileManager::report_output_path(document_path, output_dir, range);
        if (fountain_path.exists() || report_path.exists()) && !force_overwrite {
            warn!(
                "Skipping, output already exists: {} (use -f to force overwrite)",
                fountain_path.display()
            );
            return Ok(None);
        }

        let format = FileManager::detect_format(document_path)?;
        let document = FileManager::read_to_string(document_path)?;
        let plan_json = FileManager::read_to_string(plan_path)?;

        let rewriter = self.rewriter()?;
        info!(
            "🚀 scriptwai: {} - {} ({})",
            rewriter.name(),
            self.config.rewrite.get_model(),
            self.config.rewrite.common.contract
        );
        rewriter
            .test_connection()
            .await
            .with_context(|| format!("Connection test failed for {}", rewriter.name()))?;
        debug!("Connection test passed for {}", rewriter.name());

        let pipeline = Pipeline::new(rewriter, self.transform_options());

        let progress_bar = ProgressBar::new(0);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} scenes ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar.set_message("Rewriting");

        let pb = progress_bar.clone();
        let result = pipeline
            .transform_with_progress(&document, format, &plan_json, range, move |completed, total| {
                pb.set_length(total as u64);
                pb.set_position(completed as u64);
            })
            .await;
        progress_bar.finish_and_clear();
        let result = result.context("Rewrite failed")?;

        let source_name = document_path
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let report = result.report.with_source(source_name, &document);
        let report_json = serde_json::to_string_pretty(&report)
            .context("Failed to serialize diff report")?;

        FileManager::write_to_file(&fountain_path, &result.fountain_text)?;
        FileManager::write_to_file(&report_path, &report_json)?;

        if !result.warnings.is_empty() {
            info!(
                "{} scene(s) kept their original content, see {}",
                result.warnings.len(),
                ISSUES_LOG_FILE
            );
            let log_file_path = output_dir.join(ISSUES_LOG_FILE);
            let context = format!(
                "{} - {} ({})",
                self.config.rewrite.provider.display_name(),
                self.config.rewrite.get_model(),
                report.run_id
            );
            if let Err(e) = Self::write_warnings_to_file(&result.warnings, &log_file_path, &context) {
                warn!("Failed to write issues log: {}", e);
            }
        }

        let summary = RunSummary {
            fountain_path,
            report_path,
            rewritten_scenes: report.scene_diffs.len(),
            total_changes: report.total_changes(),
            warnings: result.warnings,
        };

        info!(
            "Rewrote {} scene(s) with {} change(s) in {}",
            summary.rewritten_scenes,
            summary.total_changes,
            Self::format_duration(start_time.elapsed())
        );
        info!("Success: {}", summary.fountain_path.display());
        debug!("Report: {}", summary.report_path.display());

        Ok(Some(summary))
    }

    /// Parse a document and list its scenes with their acts
    pub fn list_scenes(&self, document_path: &Path) -> Result<Vec<SceneSummary>> {
        let format = FileManager::detect_format(document_path)?;
        let document = FileManager::read_to_string(document_path)?;

        let mut screenplay = load_document(&document, format, &self.config.parser.options())
            .with_context(|| format!("Failed to parse document: {:?}", document_path))?;
        classify_acts(&mut screenplay);

        Ok(screenplay
            .scenes
            .iter()
            .enumerate()
            .map(|(i, scene)| SceneSummary {
                index: i + 1,
                id: scene.id.clone(),
                heading: scene.heading.clone(),
                act: scene.act,
                element_count: scene.elements.len(),
                word_count: scene.word_count(),
            })
            .collect())
    }

    /// Write per-scene failures to the issues log
    fn write_warnings_to_file(warnings: &[RewriteWarning], file_path: &Path, run_context: &str) -> Result<()> {
        let mut log_content = String::new();

        log_content.push_str(&format!("Rewrite Log - {}\n", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")));
        log_content.push_str(&format!("Context: {}\n\n", run_context));

        for warning in warnings {
            log_content.push_str(&format!(
                "[WARN] {} ({}): {}\n",
                warning.scene_id, warning.heading, warning.reason
            ));
        }

        FileManager::write_to_file(file_path, &log_content)
    }

    // Format duration in a human-readable format (HH:MM:SS)
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
