/*!
 * Diff records for rewritten scenes.
 *
 * Element-aligned rewrites produce one `ElementChange` per element whose text
 * changed, with a line-level unified diff of the two texts. Whole-scene
 * rewrites are compared on their serialized text and carry the capability's
 * summary.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use similar::TextDiff;
use uuid::Uuid;

use super::contract::RewriteContract;
use crate::screenplay::{scene_to_fountain, ElementType, Scene};

/// Summary used when a whole-scene rewrite came back without one
pub const DEFAULT_SUMMARY: &str = "Scene rewritten";

/// One changed element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementChange {
    /// 0-based element position within the scene
    pub index: usize,

    /// Element type
    #[serde(rename = "type")]
    pub element_type: ElementType,

    /// Text before the rewrite
    pub before: String,

    /// Text after the rewrite
    pub after: String,

    /// Unified diff lines of `before` against `after`
    #[serde(default)]
    pub unified_diff: Vec<String>,
}

/// How a scene changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SceneChanges {
    #[serde(rename = "changed_elements")]
    Elements(Vec<ElementChange>),
    #[serde(rename = "summary")]
    Summary(String),
}

/// Change record for one scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneDiff {
    /// 1-based scene position
    pub scene_index: usize,
    pub scene_id: String,
    pub heading: String,
    #[serde(flatten)]
    pub changes: SceneChanges,
}

impl SceneDiff {
    /// Number of changed elements, or 1 for a summary.
    pub fn change_count(&self) -> usize {
        match &self.changes {
            SceneChanges::Elements(changes) => changes.len(),
            SceneChanges::Summary(_) => 1,
        }
    }
}

/// Index-aligned element comparison.
pub fn diff_elements(scene_index: usize, original: &Scene, rewritten: &Scene) -> Option<SceneDiff> {
    let changes: Vec<ElementChange> = original
        .elements
        .iter()
        .zip(&rewritten.elements)
        .enumerate()
        .filter(|(_, (before, after))| before.text != after.text)
        .map(|(index, (before, after))| ElementChange {
            index,
            element_type: before.element_type,
            before: before.text.clone(),
            after: after.text.clone(),
            unified_diff: unified_diff(&before.text, &after.text),
        })
        .collect();

    if changes.is_empty() {
        return None;
    }

    Some(SceneDiff {
        scene_index,
        scene_id: original.id.clone(),
        heading: original.heading.clone(),
        changes: SceneChanges::Elements(changes),
    })
}

/// Line-level unified diff with `before`/`after` headers and no trailing newlines.
pub fn unified_diff(before: &str, after: &str) -> Vec<String> {
    // Terminate both sides so the last line never gets a missing-newline marker
    let before = format!("{}\n", before);
    let after = format!("{}\n", after);

    TextDiff::from_lines(&before, &after)
        .unified_diff()
        .header("before", "after")
        .to_string()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Whole-scene comparison on serialized text.
pub fn diff_whole_scene(
    scene_index: usize,
    original: &Scene,
    rewritten: &Scene,
    summary: Option<&str>,
) -> Option<SceneDiff> {
    if scene_to_fountain(original) == scene_to_fountain(rewritten) {
        return None;
    }

    Some(SceneDiff {
        scene_index,
        scene_id: original.id.clone(),
        heading: original.heading.clone(),
        changes: SceneChanges::Summary(summary.unwrap_or(DEFAULT_SUMMARY).to_string()),
    })
}

/// Structured record of a transformation run.
///
/// Only scenes whose content actually changed appear in `scene_diffs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffReport {
    /// Unique id of the run
    pub run_id: String,

    /// When the report was produced
    pub generated_at: DateTime<Utc>,

    /// Source document name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// SHA-256 of the source document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_sha256: Option<String>,

    /// First scene of the requested range
    pub start_scene: Option<usize>,

    /// Last scene of the requested range
    pub end_scene: Option<usize>,

    /// Contract used for the run
    pub contract: RewriteContract,

    /// Changed scenes in screenplay order
    pub scene_diffs: Vec<SceneDiff>,
}

impl DiffReport {
    /// Create an empty report.
    pub fn new(contract: RewriteContract, start_scene: Option<usize>, end_scene: Option<usize>) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
            source: None,
            source_sha256: None,
            start_scene,
            end_scene,
            contract,
            scene_diffs: Vec::new(),
        }
    }

    /// Record the source document name and fingerprint.
    pub fn with_source(mut self, name: impl Into<String>, content: &str) -> Self {
        self.source = Some(name.into());
        self.source_sha256 = Some(fingerprint(content));
        self
    }

    /// Whether a scene appears in the report.
    pub fn contains_scene(&self, scene_id: &str) -> bool {
        self.scene_diffs.iter().any(|d| d.scene_id == scene_id)
    }

    /// Total element changes across scenes.
    pub fn total_changes(&self) -> usize {
        self.scene_diffs.iter().map(SceneDiff::change_count).sum()
    }
}

/// Hex SHA-256 of the content.
pub fn fingerprint(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
