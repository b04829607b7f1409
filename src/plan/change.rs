/*!
 * Change plan types and decoding.
 *
 * The plan arrives as JSON:
 *
 * ```json
 * {"scene_level_changes": [
 *   {"change_id": "C1", "description": "Make it rain", "placement": "Entire Screenplay"}
 * ]}
 * ```
 *
 * Structural problems with the root are fatal (`SchemaError`); individual
 * malformed entries are skipped with a warning.
 */

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::errors::SchemaError;
use crate::screenplay::Act;

/// Key holding the list of changes in a plan document
pub const CHANGES_KEY: &str = "scene_level_changes";

/// Where in the screenplay a change applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Placement {
    #[serde(rename = "Act I")]
    ActI,
    #[serde(rename = "Act II")]
    ActII,
    #[serde(rename = "Act III")]
    ActIII,
    #[serde(rename = "Entire Screenplay")]
    EntireScreenplay,
    #[serde(rename = "Specific Scene")]
    SpecificScene,
}

impl Placement {
    /// Canonical label as it appears in plan documents.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ActI => "Act I",
            Self::ActII => "Act II",
            Self::ActIII => "Act III",
            Self::EntireScreenplay => "Entire Screenplay",
            Self::SpecificScene => "Specific Scene",
        }
    }

    /// The act this placement targets, if it targets one.
    pub fn act(&self) -> Option<Act> {
        match self {
            Self::ActI => Some(Act::ActI),
            Self::ActII => Some(Act::ActII),
            Self::ActIII => Some(Act::ActIII),
            Self::EntireScreenplay | Self::SpecificScene => None,
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Placement {
    type Err = String;

    /// Strict parse of a canonical label (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "act i" => Ok(Self::ActI),
            "act ii" => Ok(Self::ActII),
            "act iii" => Ok(Self::ActIII),
            "entire screenplay" => Ok(Self::EntireScreenplay),
            "specific scene" => Ok(Self::SpecificScene),
            _ => Err(format!("Unknown placement: {}", s)),
        }
    }
}

static ACT_III_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bact\s+(iii|3)\b").unwrap());
static ACT_II_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bact\s+(ii|2)\b").unwrap());
static ACT_I_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bact\s+(i|1)\b").unwrap());
static WHOLE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(entire|whole|throughout)\b").unwrap());
static SCENE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bscene\b").unwrap());

/// Normalize free-form placement text from upstream note extraction.
///
/// Rules are tried in order: Act III, Act II, Act I, whole-screenplay words,
/// "scene". Anything else, including empty text, falls back to
/// `EntireScreenplay`, which broadens the scope of the change.
pub fn normalize_placement(text: &str) -> Placement {
    let rules: [(&Lazy<Regex>, Placement); 5] = [
        (&ACT_III_REGEX, Placement::ActIII),
        (&ACT_II_REGEX, Placement::ActII),
        (&ACT_I_REGEX, Placement::ActI),
        (&WHOLE_REGEX, Placement::EntireScreenplay),
        (&SCENE_REGEX, Placement::SpecificScene),
    ];

    rules
        .iter()
        .find(|(regex, _)| regex.is_match(text))
        .map(|(_, placement)| *placement)
        .unwrap_or(Placement::EntireScreenplay)
}

/// A single revision instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    /// Identifier ("C1", ...)
    #[serde(rename = "change_id")]
    pub id: String,

    /// What to change
    pub description: String,

    /// Where it applies
    pub placement: Placement,
}

impl Change {
    /// Create a new change.
    pub fn new(id: impl Into<String>, description: impl Into<String>, placement: Placement) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            placement,
        }
    }

    fn fallback_id(position: usize) -> String {
        format!("C{}", position)
    }
}

/// Ordered list of revision instructions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangePlan {
    #[serde(rename = "scene_level_changes")]
    pub changes: Vec<Change>,
}

impl ChangePlan {
    /// Create a plan from changes.
    pub fn new(changes: Vec<Change>) -> Self {
        Self { changes }
    }

    /// Number of changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Whether the plan has no changes.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Build a plan from raw upstream notes.
    ///
    /// Accepts either a bare array or a plan-shaped object whose entries carry
    /// free-form `placement` text; placements go through `normalize_placement`.
    /// An object without a change list is an empty plan. Ids follow the
    /// entry's position in the source, so skipped entries leave gaps.
    pub fn from_raw_notes(json: &str) -> Result<Self, SchemaError> {
        let root: Value =
            serde_json::from_str(json).map_err(|e| SchemaError::InvalidJson(e.to_string()))?;

        let no_entries = Vec::new();
        let entries = match &root {
            Value::Array(entries) => entries,
            Value::Object(object) => match object.get(CHANGES_KEY) {
                Some(changes) => changes.as_array().ok_or(SchemaError::ChangesNotASequence)?,
                None => &no_entries,
            },
            _ => return Err(SchemaError::NotAnObject),
        };

        let mut changes = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let Some(description) = entry_description(entry) else {
                warn!("Skipping raw note without a description: {}", entry);
                continue;
            };
            let placement_text = entry.get("placement").and_then(Value::as_str).unwrap_or("");
            let placement = normalize_placement(placement_text);
            changes.push(Change::new(
                Change::fallback_id(index + 1),
                description,
                placement,
            ));
        }

        debug!("Normalized {} raw notes into a change plan", changes.len());
        Ok(Self { changes })
    }
}

/// Decode and validate a change plan document.
pub fn parse_change_plan(json: &str) -> Result<ChangePlan, SchemaError> {
    let root: Value =
        serde_json::from_str(json).map_err(|e| SchemaError::InvalidJson(e.to_string()))?;
    let entries = changes_array(&root)?;

    let mut changes = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let position = index + 1;

        if !entry.is_object() {
            warn!("Skipping change #{}: entry is not an object", position);
            continue;
        }

        let Some(description) = entry_description(entry) else {
            warn!("Skipping change #{}: missing or empty description", position);
            continue;
        };

        let placement = match entry.get("placement").and_then(Value::as_str) {
            Some(text) => match text.parse::<Placement>() {
                Ok(placement) => placement,
                Err(e) => {
                    warn!("Skipping change #{}: {}", position, e);
                    continue;
                }
            },
            None => {
                warn!("Skipping change #{}: missing placement", position);
                continue;
            }
        };

        let id = entry
            .get("change_id")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Change::fallback_id(position));

        changes.push(Change::new(id, description, placement));
    }

    Ok(ChangePlan { changes })
}

fn changes_array(root: &Value) -> Result<&Vec<Value>, SchemaError> {
    let object = root.as_object().ok_or(SchemaError::NotAnObject)?;
    let changes = object.get(CHANGES_KEY).ok_or(SchemaError::MissingChanges)?;
    changes.as_array().ok_or(SchemaError::ChangesNotASequence)
}

fn entry_description(entry: &Value) -> Option<String> {
    entry
        .get("description")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}
