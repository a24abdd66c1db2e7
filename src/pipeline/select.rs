//! Template selector stage.
use crate::catalog::{self, TemplateCatalog, TemplateField};
use crate::error::Result;
use crate::llm::{self, ChatMessage, ChatModel, GenerationConfig};
use crate::pipeline::{decode_output, PipelineConfig, Stage, UserInput};
use crate::templates::TEMPLATE_SELECTOR_PROMPT_MD;
use serde::{Deserialize, Serialize};

/// Selector output: the chosen template name. The name is validated
/// against the catalog by the planner's lookup, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorOutput {
    pub selected_template: String,
}

/// Choose the best-fitting template for this post.
///
/// The prompt only sees `{name, caption_structure}` per template; the full
/// records stay out of the context window.
pub fn run_selector(
    model: &dyn ChatModel,
    user_input: &UserInput,
    catalog: &TemplateCatalog,
    config: &PipelineConfig,
) -> Result<SelectorOutput> {
    let reduced = catalog::reduce(
        catalog,
        &[TemplateField::Name, TemplateField::CaptionStructure],
    )?;
    let system_prompt = TEMPLATE_SELECTOR_PROMPT_MD.replace(
        "{TEMPLATES}",
        &serde_json::to_string_pretty(&reduced).expect("serialize reduced catalog"),
    );
    let payload = serde_json::to_string(user_input).expect("serialize user input");

    let value = llm::generate_json(
        model,
        &payload,
        &[ChatMessage::system(system_prompt)],
        &GenerationConfig::json().with_model(&config.model),
    )?;
    decode_output(value, Stage::Select)
}
