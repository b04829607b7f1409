/*!
 * Fountain-style plain text serializer.
 *
 * This is a one-way projection: Dialogue and Action collapse to the same
 * visual form, so re-reading the output does not restore element types.
 */

use super::model::{Element, ElementType, Scene, Screenplay};

/// Serialize the whole screenplay.
///
/// Output has trailing whitespace trimmed and exactly one trailing newline.
pub fn to_fountain(screenplay: &Screenplay) -> String {
    let mut lines: Vec<String> = Vec::new();
    for scene in &screenplay.scenes {
        push_scene_lines(scene, &mut lines);
        lines.push(String::new());
    }
    finish(lines)
}

/// Serialize a single scene with the same rules.
pub fn scene_to_fountain(scene: &Scene) -> String {
    let mut lines = Vec::new();
    push_scene_lines(scene, &mut lines);
    finish(lines)
}

/// Render one element line.
pub fn format_element(element: &Element) -> String {
    let text = element.text.trim();
    match element.element_type {
        ElementType::Character | ElementType::SceneHeading => text.to_uppercase(),
        ElementType::Parenthetical => {
            if text.starts_with('(') && text.ends_with(')') {
                text.to_string()
            } else {
                format!("({})", text)
            }
        }
        _ => text.to_string(),
    }
}

fn push_scene_lines(scene: &Scene, lines: &mut Vec<String>) {
    lines.push(scene.heading.trim().to_uppercase());
    lines.push(String::new());

    for element in &scene.elements {
        lines.push(format_element(element));
        lines.push(String::new());
    }
}

fn finish(lines: Vec<String>) -> String {
    let mut text = lines.join("\n").trim_end().to_string();
    text.push('\n');
    text
}
