/*!
 * Canonical parser: tagged paragraphs to `Screenplay`.
 *
 * Also contains the readers that turn a Final Draft (`.fdx`) file or a JSON
 * paragraph list into the tagged paragraph stream.
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::ParseError;

use super::model::{Element, ElementType, Scene, Screenplay};

static TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(/?)(Paragraph|Text)\b([^>]*?)(/?)>").unwrap());

static TYPE_ATTR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bType\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());

static ENTITY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|amp|lt|gt|quot|apos);").unwrap());

/// One paragraph of the inbound document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Raw type tag, e.g. "Scene Heading"
    #[serde(rename = "type")]
    pub type_tag: String,

    /// Raw text, possibly empty
    #[serde(default)]
    pub text: String,
}

impl Paragraph {
    /// Create a new paragraph.
    pub fn new(type_tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            text: text.into(),
        }
    }
}

/// How the first scene heading of a document is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirstHeadingPolicy {
    /// The first heading opens scene 1
    #[default]
    StartsScene,
    /// The first heading is a title marker; scene 1 starts at the second heading
    Preamble,
}

/// Options for the canonical parser.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParserOptions {
    /// First heading policy
    #[serde(default)]
    pub first_heading: FirstHeadingPolicy,
}

impl ParserOptions {
    /// Options with the given first heading policy.
    pub fn with_first_heading(first_heading: FirstHeadingPolicy) -> Self {
        Self { first_heading }
    }
}

/// Inbound document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Final Draft XML
    FinalDraft,
    /// JSON array of `{"type", "text"}` objects
    ParagraphJson,
}

impl DocumentFormat {
    /// Pick the format from a file extension.
    pub fn from_extension(extension: &str) -> Result<Self, ParseError> {
        match extension.to_lowercase().as_str() {
            "fdx" | "xml" => Ok(Self::FinalDraft),
            "json" => Ok(Self::ParagraphJson),
            other => Err(ParseError::UnsupportedFormat(format!(
                "unknown document extension '.{}'",
                other
            ))),
        }
    }
}

/// Build the canonical screenplay from tagged paragraphs.
pub fn parse_paragraphs(paragraphs: &[Paragraph], options: &ParserOptions) -> Screenplay {
    let mut scenes = Vec::new();
    let mut current: Option<Scene> = None;
    let mut skip_heading = options.first_heading == FirstHeadingPolicy::Preamble;
    let mut dropped = 0usize;

    for paragraph in paragraphs {
        let text = paragraph.text.trim();
        if text.is_empty() {
            continue;
        }

        match ElementType::from_tag(&paragraph.type_tag) {
            ElementType::SceneHeading => {
                if skip_heading {
                    skip_heading = false;
                    debug!("Treating first heading '{}' as preamble", text);
                    continue;
                }

                if let Some(scene) = current.take() {
                    scenes.push(scene);
                }
                current = Some(Scene::new(Scene::id_for_ordinal(scenes.len() + 1), text));
            }
            element_type => match current.as_mut() {
                Some(scene) => scene.elements.push(Element::new(element_type, text)),
                None => dropped += 1,
            },
        }
    }

    if let Some(scene) = current.take() {
        scenes.push(scene);
    }

    if dropped > 0 {
        debug!("Dropped {} paragraphs before the first scene", dropped);
    }
    debug!("Scenes detected: {}", scenes.len());

    Screenplay::new(scenes)
}

/// Read the paragraph stream of a Final Draft document.
pub fn read_fdx(xml: &str) -> Result<Vec<Paragraph>, ParseError> {
    if !xml.contains("<FinalDraft") {
        return Err(malformed("missing <FinalDraft> root element"));
    }
    if !xml.contains("</FinalDraft>") {
        return Err(malformed("unterminated <FinalDraft> root element"));
    }

    let content_start = xml
        .find("<Content")
        .ok_or_else(|| malformed("missing <Content> section"))?;
    let content_end = xml[content_start..]
        .find("</Content>")
        .map(|pos| pos + content_start)
        .ok_or_else(|| malformed("unterminated <Content> section"))?;
    let content = &xml[content_start..content_end];

    // Paragraphs are recorded when opened so nested ones (dual dialogue)
    // keep document order.
    let mut paragraphs: Vec<Paragraph> = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    let mut text_start: Option<usize> = None;

    for captures in TAG_REGEX.captures_iter(content) {
        let tag = captures.get(0).map_or(0..0, |m| m.range());
        let closing = &captures[1] == "/";
        let self_closing = &captures[4] == "/";

        match (&captures[2], closing) {
            ("Paragraph", false) => {
                if text_start.is_some() {
                    return Err(malformed("paragraph opened inside <Text>"));
                }
                let type_tag = TYPE_ATTR_REGEX
                    .captures(&captures[3])
                    .and_then(|c| c.get(1).or_else(|| c.get(2)))
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default();
                paragraphs.push(Paragraph::new(type_tag, String::new()));
                if !self_closing {
                    open.push(paragraphs.len() - 1);
                }
            }
            ("Paragraph", true) => {
                if text_start.is_some() {
                    return Err(malformed("unterminated <Text> element"));
                }
                open.pop()
                    .ok_or_else(|| malformed("unexpected </Paragraph>"))?;
            }
            ("Text", false) => {
                if self_closing {
                    continue;
                }
                if open.is_empty() {
                    return Err(malformed("<Text> outside of a paragraph"));
                }
                if text_start.replace(tag.end).is_some() {
                    return Err(malformed("nested <Text> element"));
                }
            }
            ("Text", true) => {
                let start = text_start
                    .take()
                    .ok_or_else(|| malformed("unexpected </Text>"))?;
                let index = *open
                    .last()
                    .ok_or_else(|| malformed("</Text> outside of a paragraph"))?;
                paragraphs[index]
                    .text
                    .push_str(&decode_entities(&content[start..tag.start]));
            }
            _ => {}
        }
    }

    if text_start.is_some() {
        return Err(malformed("unterminated <Text> element"));
    }
    if !open.is_empty() {
        return Err(malformed(&format!("{} unterminated paragraph(s)", open.len())));
    }

    Ok(paragraphs)
}

/// Read a JSON paragraph list.
pub fn read_paragraph_json(json: &str) -> Result<Vec<Paragraph>, ParseError> {
    serde_json::from_str(json).map_err(|e| ParseError::InvalidParagraphList(e.to_string()))
}

/// Read and parse a document in the given format.
pub fn load_document(
    content: &str,
    format: DocumentFormat,
    options: &ParserOptions,
) -> Result<Screenplay, ParseError> {
    let paragraphs = match format {
        DocumentFormat::FinalDraft => read_fdx(content)?,
        DocumentFormat::ParagraphJson => read_paragraph_json(content)?,
    };
    Ok(parse_paragraphs(&paragraphs, options))
}

fn malformed(message: &str) -> ParseError {
    ParseError::MalformedDocument(message.to_string())
}

fn decode_entities(raw: &str) -> String {
    ENTITY_REGEX
        .replace_all(raw, |caps: &regex::Captures| {
            let entity = &caps[1];
            match entity {
                "amp" => "&".to_string(),
                "lt" => "<".to_string(),
                "gt" => ">".to_string(),
                "quot" => "\"".to_string(),
                "apos" => "'".to_string(),
                numeric => {
                    let code = match numeric.strip_prefix("#x") {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => numeric[1..].parse::<u32>().ok(),
                    };
                    code.and_then(char::from_u32)
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| caps[0].to_string())
                }
            }
        })
        .into_owned()
}
