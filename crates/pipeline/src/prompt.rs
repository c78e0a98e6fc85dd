//! Grounding prompt assembly.
//!
//! Renders the synthesis prompt from a Handlebars template: recent session
//! turns, numbered context passages, the user question, and per-kind
//! instruction blocks. The completion is told to stay within the numbered
//! passages; the system instruction carries the anti-fabrication rules.

use crate::intent::QueryKind;
use crate::session::Turn;
use handlebars::Handlebars;
use sahayak_core::{AppError, AppResult};
use sahayak_retrieval::RetrievedPassage;
use serde_json::json;

/// Maximum characters of passage text included per passage.
const MAX_PASSAGE_CHARS: usize = 800;

/// Maximum characters of a prior answer replayed into the prompt.
const MAX_HISTORY_ANSWER_CHARS: usize = 400;

/// Grounding prompt template.
const GROUNDING_TEMPLATE: &str = "\
{{#if history}}Recent conversation:
{{#each history}}User: {{query}}
Assistant: {{answer}}
{{/each}}
{{/if}}Context passages:

{{#each passages}}[Passage {{number}}] {{title}}
{{text}}

{{/each}}User question: {{query}}

Guidelines:
- Answer based ONLY on the numbered passages above
- Be specific, detailed, and helpful
- Do not cite passage numbers or mention that you were given passages
- If the passages do not fully answer the question, say so clearly
{{kind_instructions}}
Answer:";

/// Prompt builder holding the registered template.
pub struct PromptBuilder {
    handlebars: Handlebars<'static>,
}

impl PromptBuilder {
    /// Create a builder with the grounding template registered.
    pub fn new() -> AppResult<Self> {
        let mut handlebars = Handlebars::new();

        // Plain text output; HTML escaping would mangle the passages
        handlebars.register_escape_fn(handlebars::no_escape);

        handlebars
            .register_template_string("grounding", GROUNDING_TEMPLATE)
            .map_err(|e| AppError::Other(format!("Failed to register template: {}", e)))?;

        Ok(Self { handlebars })
    }

    /// Render the user prompt for a synthesis call.
    pub fn build(
        &self,
        query: &str,
        kind: QueryKind,
        passages: &[RetrievedPassage],
        history: &[Turn],
    ) -> AppResult<String> {
        let passage_entries: Vec<serde_json::Value> = passages
            .iter()
            .enumerate()
            .map(|(i, retrieved)| {
                json!({
                    "number": i + 1,
                    "title": retrieved.passage.title,
                    "text": truncate_chars(&retrieved.passage.text, MAX_PASSAGE_CHARS),
                })
            })
            .collect();

        let history_entries: Vec<serde_json::Value> = history
            .iter()
            .map(|turn| {
                json!({
                    "query": turn.query,
                    "answer": truncate_chars(&turn.answer, MAX_HISTORY_ANSWER_CHARS),
                })
            })
            .collect();

        let data = json!({
            "query": query,
            "passages": passage_entries,
            "history": history_entries,
            "kind_instructions": kind_instructions(kind),
        });

        self.handlebars
            .render("grounding", &data)
            .map_err(|e| AppError::Other(format!("Failed to render prompt: {}", e)))
    }
}

/// System instruction for the completion service.
///
/// The hedged variant tells the model to express uncertainty and point the
/// user at an official source.
pub fn system_instruction(hedged: bool) -> String {
    let mut prompt = String::from(
        "You are Sahayak, an assistant for Startup India policies and procedures. \
         Answer using ONLY the context passages supplied with the question. \
         Never add facts that are not in the passages, and never invent passages \
         beyond those supplied. If the passages do not contain the answer, say so \
         plainly instead of guessing.\n",
    );

    if hedged {
        prompt.push_str(
            "\nThe retrieved material may not fully answer this question. State your \
             uncertainty clearly, describe only what the passages support, and recommend \
             that the user verify the details with an official Startup India source.\n",
        );
    }

    prompt
}

/// Per-kind instruction block appended to the guidelines.
fn kind_instructions(kind: QueryKind) -> &'static str {
    match kind {
        QueryKind::Definition => {
            "- Provide a clear definition and explanation\n\
             - Include any relevant categories or types\n\
             - Mention key characteristics or features\n"
        }
        QueryKind::Process => {
            "- Provide step-by-step instructions\n\
             - Include required documents or prerequisites\n\
             - Mention timeframes, deadlines, or conditions when stated\n"
        }
        QueryKind::Criteria => {
            "- List all eligibility criteria clearly\n\
             - Include any exclusions or special conditions\n\
             - Mention verification requirements\n"
        }
        QueryKind::Listing => {
            "- Provide a comprehensive list\n\
             - Include brief descriptions for each item\n\
             - Mention application procedures when relevant\n"
        }
        QueryKind::General => {
            "- Provide a comprehensive answer\n\
             - Include all relevant details from the passages\n"
        }
    }
}

/// Truncate to a character budget, cutting at a word boundary when possible.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let truncated: String = text.chars().take(max_chars).collect();
    match truncated.rfind(char::is_whitespace) {
        Some(last_space) => format!("{}...", &truncated[..last_space]),
        None => format!("{}...", truncated),
    }
}
