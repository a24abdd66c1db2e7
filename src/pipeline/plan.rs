//! Caption planner stage.
use crate::catalog::{self, TemplateCatalog};
use crate::error::Result;
use crate::llm::{self, ChatMessage, ChatModel, GenerationConfig};
use crate::pipeline::{decode_output, PipelineConfig, Stage, UserInput};
use crate::templates::CAPTION_PLANNER_PROMPT_MD;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Planner output: the structural outline and the facts it needs fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerOutput {
    pub caption_plan: String,
    /// Fact-finding queries; empty when the caption needs no external
    /// facts, and defaulted to empty when the model omits the key.
    #[serde(default)]
    pub query: Vec<String>,
}

/// Plan the caption structure and the retrieval queries for one post.
///
/// The template lookup here is also the validation point for selector
/// output: an unknown name fails before any planner model call is made.
pub fn run_planner(
    model: &dyn ChatModel,
    user_input: &UserInput,
    selected_template: &str,
    catalog: &TemplateCatalog,
    config: &PipelineConfig,
) -> Result<PlannerOutput> {
    let template = catalog::lookup(catalog, selected_template)?;
    let system_prompt = CAPTION_PLANNER_PROMPT_MD.replace(
        "{TEMPLATE}",
        &serde_json::to_string_pretty(template).expect("serialize template"),
    );

    let mut payload = serde_json::to_value(user_input).expect("serialize user input");
    payload["selected_template"] = Value::String(selected_template.to_string());

    let value = llm::generate_json(
        model,
        &payload.to_string(),
        &[ChatMessage::system(system_prompt)],
        &GenerationConfig::json().with_model(&config.model),
    )?;
    decode_output(value, Stage::Plan)
}
