/*!
 * Payload contracts with the rewrite capability.
 *
 * Two shapes are supported:
 *
 * - `ElementAligned`: the capability receives the scene's element texts and
 *   must return a JSON array of strings of the same length. Element types are
 *   kept index by index, so diffs are per element.
 * - `WholeScene`: the capability receives the scene as Fountain text and
 *   returns rewritten Fountain text, optionally followed by a line holding
 *   `<<SUMMARY>>` and a short summary. The text is re-read into elements and
 *   diffs are per scene.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::errors::RewriteFailure;
use crate::screenplay::{Element, ElementType, Scene};

/// Sentinel separating rewritten text from its summary in whole-scene mode
pub const SUMMARY_SENTINEL: &str = "<<SUMMARY>>";

/// Payload shape agreed with the rewrite capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteContract {
    /// JSON list of element texts, same length as the input
    #[default]
    ElementAligned,
    /// Fountain text of the scene with an optional summary
    WholeScene,
}

impl fmt::Display for RewriteContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ElementAligned => write!(f, "element_aligned"),
            Self::WholeScene => write!(f, "whole_scene"),
        }
    }
}

impl FromStr for RewriteContract {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "element_aligned" | "elements" => Ok(Self::ElementAligned),
            "whole_scene" | "scene" => Ok(Self::WholeScene),
            _ => Err(format!("Invalid rewrite contract: {}", s)),
        }
    }
}

/// A response decoded into a replacement scene.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRewrite {
    /// Replacement scene, same id and heading as the original
    pub scene: Scene,

    /// Summary sent by the capability, whole-scene mode only
    pub summary: Option<String>,
}

impl DecodedRewrite {
    /// Word count of the replacement elements.
    pub fn word_count(&self) -> usize {
        self.scene.elements.iter().map(Element::word_count).sum()
    }
}

static CODE_FENCE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z]*\s*\n?(.*?)\n?\s*```$").unwrap());

/// Decode a raw capability response against the original scene.
pub fn decode_response(
    contract: RewriteContract,
    original: &Scene,
    raw: &str,
) -> Result<DecodedRewrite, RewriteFailure> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(RewriteFailure::EmptyResponse);
    }

    match contract {
        RewriteContract::ElementAligned => decode_element_list(original, raw),
        RewriteContract::WholeScene => decode_whole_scene(original, raw),
    }
}

/// Remove a surrounding markdown code fence, if any.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    CODE_FENCE_REGEX
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(trimmed)
}

fn decode_element_list(original: &Scene, raw: &str) -> Result<DecodedRewrite, RewriteFailure> {
    let payload = strip_code_fence(raw);
    let values: Vec<Value> = serde_json::from_str(payload)
        .map_err(|e| RewriteFailure::MalformedResponse(format!("expected a JSON list: {}", e)))?;

    if values.len() != original.elements.len() {
        return Err(RewriteFailure::ElementCountMismatch {
            expected: original.elements.len(),
            actual: values.len(),
        });
    }

    let mut texts = Vec::with_capacity(values.len());
    for (index, value) in values.iter().enumerate() {
        let text = value.as_str().ok_or_else(|| {
            RewriteFailure::MalformedResponse(format!("element {} is not a string", index))
        })?;
        if text.trim().is_empty() {
            return Err(RewriteFailure::MalformedResponse(format!(
                "element {} is empty",
                index
            )));
        }
        texts.push(text.to_string());
    }

    Ok(DecodedRewrite {
        scene: original.with_texts(&texts),
        summary: None,
    })
}

fn decode_whole_scene(original: &Scene, raw: &str) -> Result<DecodedRewrite, RewriteFailure> {
    let (text, summary) = match raw.split_once(SUMMARY_SENTINEL) {
        Some((text, summary)) => {
            let summary = summary.trim();
            (text, (!summary.is_empty()).then(|| summary.to_string()))
        }
        None => (raw, None),
    };

    let elements = read_fountain_elements(strip_code_fence(text), &original.heading);
    if elements.is_empty() {
        return Err(RewriteFailure::MalformedResponse(
            "rewritten scene has no content".to_string(),
        ));
    }

    let mut scene = original.clone();
    scene.elements = elements;
    Ok(DecodedRewrite { scene, summary })
}

static HEADING_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(INT|EXT|EST|INT\./EXT|I/E)[\.\s]").unwrap());

fn is_character_cue(line: &str) -> bool {
    let has_letters = line.chars().any(char::is_alphabetic);
    has_letters
        && !line.chars().any(char::is_lowercase)
        && !line.ends_with(['.', '!', '?', ':'])
        && line.split_whitespace().count() <= 4
}

fn is_parenthetical(line: &str) -> bool {
    line.starts_with('(') && line.ends_with(')')
}

/// Read Fountain-style text back into typed elements.
///
/// A leading heading (the scene's own, or anything shaped like one) is
/// dropped. Blocks are separated by blank lines. Within a block a cue line
/// followed by more lines is read as a dialogue block; single-line blocks
/// following a cue or parenthetical are dialogue; everything else is action.
pub fn read_fountain_elements(text: &str, heading: &str) -> Vec<Element> {
    let mut blocks: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    if let Some(first) = blocks.first_mut() {
        let line = first[0];
        if line.eq_ignore_ascii_case(heading.trim()) || HEADING_REGEX.is_match(line) {
            first.remove(0);
            if first.is_empty() {
                blocks.remove(0);
            }
        }
    }

    let mut elements = Vec::new();
    let mut in_dialogue = false;
    for block in blocks {
        if block.len() > 1 && is_character_cue(block[0]) {
            elements.push(Element::new(ElementType::Character, block[0]));
            let mut speech: Vec<&str> = Vec::new();
            for &line in &block[1..] {
                if is_parenthetical(line) {
                    if !speech.is_empty() {
                        elements.push(Element::new(ElementType::Dialogue, speech.join(" ")));
                        speech.clear();
                    }
                    elements.push(Element::new(ElementType::Parenthetical, line));
                } else {
                    speech.push(line);
                }
            }
            if !speech.is_empty() {
                elements.push(Element::new(ElementType::Dialogue, speech.join(" ")));
            }
            in_dialogue = false;
            continue;
        }

        let joined = block.join(" ");
        let element_type = if block.len() == 1 && is_character_cue(&joined) {
            in_dialogue = true;
            elements.push(Element::new(ElementType::Character, joined));
            continue;
        } else if in_dialogue && is_parenthetical(&joined) {
            ElementType::Parenthetical
        } else if in_dialogue {
            in_dialogue = false;
            ElementType::Dialogue
        } else {
            ElementType::Action
        };
        elements.push(Element::new(element_type, joined));
    }

    elements
}
