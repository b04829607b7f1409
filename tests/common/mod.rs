/*!
 * Common test utilities for the scriptwai test suite
 */

use std::fs;
use std::path::{Path, PathBuf};
use anyhow::Result;
use tempfile::TempDir;
use scriptwai::screenplay::{classify_acts, ElementType, Scene, Screenplay};

/// Route `log` output through the test harness; safe to call from every test
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Two scenes as a JSON paragraph list
pub const TWO_SCENE_PARAGRAPHS: &str = r#"[
    {"type": "Scene Heading", "text": "INT. ROOM - DAY"},
    {"type": "Action", "text": "He sits."},
    {"type": "Scene Heading", "text": "EXT. STREET - NIGHT"},
    {"type": "Action", "text": "She walks."}
]"#;

/// A single change applying to every scene
pub const RAIN_PLAN: &str = r#"{
    "scene_level_changes": [
        {"change_id": "C1", "description": "Make it rain", "placement": "Entire Screenplay"}
    ]
}"#;

/// A small Final Draft document with a title heading, dialogue and entities
pub const SAMPLE_FDX: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no" ?>
<FinalDraft DocumentType="Script" Template="No" Version="5">
  <Content>
    <Paragraph Type="Scene Heading">
      <Text>INT. DINER - NIGHT</Text>
    </Paragraph>
    <Paragraph Type="Action">
      <Text>Rain streaks the window. MAYA stirs her coffee.</Text>
    </Paragraph>
    <Paragraph Type="Character">
      <Text>MAYA</Text>
    </Paragraph>
    <Paragraph Type="Parenthetical">
      <Text>(quietly)</Text>
    </Paragraph>
    <Paragraph Type="Dialogue">
      <Text>Salt &amp; pepper. Always both.</Text>
    </Paragraph>
    <Paragraph Type="Scene Heading">
      <Text>EXT. PARKING LOT - CONTINUOUS</Text>
    </Paragraph>
    <Paragraph Type="Action">
      <Text>She runs to the car.</Text>
    </Paragraph>
    <Paragraph Type="Transition">
      <Text>CUT TO:</Text>
    </Paragraph>
  </Content>
</FinalDraft>
"#;

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// JSON paragraph list with `count` scenes of one action line each
pub fn paragraphs_json(count: usize) -> String {
    let paragraphs: Vec<serde_json::Value> = (1..=count)
        .flat_map(|i| {
            vec![
                serde_json::json!({"type": "Scene Heading", "text": format!("INT. ROOM {} - DAY", i)}),
                serde_json::json!({"type": "Action", "text": format!("Something happens in room {}.", i)}),
            ]
        })
        .collect();
    serde_json::Value::Array(paragraphs).to_string()
}

/// Classified screenplay with `count` scenes of one action line each
pub fn screenplay_with_scenes(count: usize) -> Screenplay {
    let mut screenplay = Screenplay::new(
        (1..=count)
            .map(|i| {
                Scene::new(Scene::id_for_ordinal(i), format!("INT. ROOM {} - DAY", i))
                    .with_element(ElementType::Action, format!("Something happens in room {}.", i))
            })
            .collect(),
    );
    classify_acts(&mut screenplay);
    screenplay
}

/// Change plan JSON from `(description, placement)` pairs
pub fn plan_json(changes: &[(&str, &str)]) -> String {
    let entries: Vec<serde_json::Value> = changes
        .iter()
        .enumerate()
        .map(|(i, (description, placement))| {
            serde_json::json!({
                "change_id": format!("C{}", i + 1),
                "description": description,
                "placement": placement,
            })
        })
        .collect();
    serde_json::json!({ "scene_level_changes": entries }).to_string()
}
