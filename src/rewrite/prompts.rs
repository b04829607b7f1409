/*!
 * Prompt templates for scene rewriting.
 *
 * One system prompt per contract; the user prompt carries the instructions
 * and the scene content as JSON or Fountain text.
 */

use serde::Serialize;

use super::capability::{RewriteRequest, SceneContent};
use super::contract::{RewriteContract, SUMMARY_SENTINEL};
use crate::plan::Change;

/// System prompt template for scene rewriting.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// System prompt for the element-aligned contract.
    pub const ELEMENT_EDITOR: &'static str = r#"You are a professional screenplay editor.

You will receive:
- A list of paragraph texts from ONE scene
- The revision instructions that apply to it

Rules:
- Return a JSON list of strings
- SAME length as the input list, one string per paragraph
- Modify text only where the instructions call for it
- Do NOT add, remove, merge or reorder items
- Keep character cues as character cues
- Output JSON only"#;

    /// System prompt for the whole-scene contract.
    pub const SCENE_REWRITER: &'static str = r#"You are a professional screenplay rewrite engine.

Rewrite the provided scene according to the revision instructions.

STRICT RULES:
- Preserve Fountain formatting exactly.
- Maintain approximately the same length.
- Do NOT summarize or condense.
- Do NOT remove content unless the instructions require it.
- Output ONLY the rewritten scene, then a line containing {sentinel} followed by one sentence describing what changed."#;

    /// Create a new prompt template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Template for the given contract.
    pub fn for_contract(contract: RewriteContract) -> Self {
        match contract {
            RewriteContract::ElementAligned => Self::new(Self::ELEMENT_EDITOR),
            RewriteContract::WholeScene => Self::new(Self::SCENE_REWRITER),
        }
    }

    /// Render the template.
    pub fn render(&self) -> String {
        self.template.replace("{sentinel}", SUMMARY_SENTINEL)
    }
}

#[derive(Debug, Serialize)]
struct InstructionContext<'a> {
    change_id: &'a str,
    description: &'a str,
    placement: String,
}

/// Build the system and user prompts for a request.
pub fn build_prompts(request: &RewriteRequest) -> (String, String) {
    let system = PromptTemplate::for_contract(request.contract).render();

    let instructions: Vec<InstructionContext<'_>> = request
        .instructions
        .iter()
        .map(|c: &Change| InstructionContext {
            change_id: &c.id,
            description: &c.description,
            placement: c.placement.to_string(),
        })
        .collect();
    let instructions = serde_json::to_string_pretty(&instructions).unwrap_or_else(|_| "[]".to_string());

    let user = match &request.content {
        SceneContent::Elements(texts) => format!(
            "REVISION INSTRUCTIONS:\n{}\n\nSCENE {} ({})\nSCENE TEXT LIST:\n{}\n",
            instructions,
            request.scene_id,
            request.heading,
            serde_json::to_string_pretty(texts).unwrap_or_else(|_| "[]".to_string())
        ),
        SceneContent::Text(text) => format!(
            "REVISION INSTRUCTIONS:\n{}\n\n--------------------------------\nSCENE TO REWRITE (FOUNTAIN):\n{}",
            instructions, text
        ),
    };

    (system, user)
}
