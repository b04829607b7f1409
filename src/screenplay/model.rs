/*!
 * Canonical screenplay model.
 *
 * A `Screenplay` is an ordered list of `Scene`s, each an ordered list of typed
 * `Element`s. Scene ids are allocated once at parse time and never change;
 * rewriting replaces a scene's elements in place.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of a screenplay element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    #[serde(rename = "Scene Heading")]
    SceneHeading,
    Action,
    Character,
    Dialogue,
    Parenthetical,
    Other,
}

impl ElementType {
    /// Map a Final Draft paragraph type tag to an element type.
    ///
    /// Unknown tags (Transition, Shot, General, ...) become `Other`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim() {
            "Scene Heading" => Self::SceneHeading,
            "Action" => Self::Action,
            "Character" => Self::Character,
            "Dialogue" => Self::Dialogue,
            "Parenthetical" => Self::Parenthetical,
            _ => Self::Other,
        }
    }

    /// The Final Draft tag for this type.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::SceneHeading => "Scene Heading",
            Self::Action => "Action",
            Self::Character => "Character",
            Self::Dialogue => "Dialogue",
            Self::Parenthetical => "Parenthetical",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// One typed unit of scene content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Element type
    #[serde(rename = "type")]
    pub element_type: ElementType,

    /// Trimmed text
    pub text: String,
}

impl Element {
    /// Create a new element.
    pub fn new(element_type: ElementType, text: impl Into<String>) -> Self {
        Self {
            element_type,
            text: text.into(),
        }
    }

    /// Word count, used for length checks on rewrites.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Coarse three-act position of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Act {
    #[serde(rename = "Act I")]
    ActI,
    #[serde(rename = "Act II")]
    ActII,
    #[serde(rename = "Act III")]
    ActIII,
}

impl Act {
    /// Display label, e.g. "Act II".
    pub fn label(&self) -> &'static str {
        match self {
            Self::ActI => "Act I",
            Self::ActII => "Act II",
            Self::ActIII => "Act III",
        }
    }
}

impl fmt::Display for Act {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A contiguous run of content starting at a scene heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    /// Stable sequential identifier ("S001", "S002", ...)
    pub id: String,

    /// Heading text as written in the source
    pub heading: String,

    /// Ordered scene content
    pub elements: Vec<Element>,

    /// Act derived from position; unset until classified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub act: Option<Act>,
}

impl Scene {
    /// Create a new scene without elements.
    pub fn new(id: impl Into<String>, heading: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            heading: heading.into(),
            elements: Vec::new(),
            act: None,
        }
    }

    /// Format the id for a 1-based scene ordinal.
    pub fn id_for_ordinal(ordinal: usize) -> String {
        format!("S{:03}", ordinal)
    }

    /// Builder-style element append.
    pub fn with_element(mut self, element_type: ElementType, text: impl Into<String>) -> Self {
        self.elements.push(Element::new(element_type, text));
        self
    }

    /// Texts of all elements, in order.
    pub fn element_texts(&self) -> Vec<String> {
        self.elements.iter().map(|e| e.text.clone()).collect()
    }

    /// Total word count of heading and elements.
    pub fn word_count(&self) -> usize {
        self.heading.split_whitespace().count()
            + self.elements.iter().map(Element::word_count).sum::<usize>()
    }

    /// Copy of this scene with replaced element texts.
    ///
    /// Types are kept index by index; the caller guarantees equal length.
    pub fn with_texts(&self, texts: &[String]) -> Self {
        let elements = self
            .elements
            .iter()
            .zip(texts)
            .map(|(element, text)| Element::new(element.element_type, text.trim()))
            .collect();

        Self {
            id: self.id.clone(),
            heading: self.heading.clone(),
            elements,
            act: self.act,
        }
    }
}

/// The canonical model: an ordered list of scenes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screenplay {
    pub scenes: Vec<Scene>,
}

impl Screenplay {
    /// Create a screenplay from scenes.
    pub fn new(scenes: Vec<Scene>) -> Self {
        Self { scenes }
    }

    /// Number of scenes.
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    /// Whether there are no scenes.
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Total number of elements across scenes.
    pub fn element_count(&self) -> usize {
        self.scenes.iter().map(|s| s.elements.len()).sum()
    }
}
