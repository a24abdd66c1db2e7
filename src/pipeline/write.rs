//! Caption writer stage.
use crate::catalog::{self, TemplateCatalog};
use crate::error::Result;
use crate::llm::{self, ChatMessage, ChatModel, GenerationConfig};
use crate::pipeline::{PipelineConfig, RagRecord, UserInput};
use crate::templates::CAPTION_WRITER_PROMPT_MD;
use serde_json::json;

/// Write the final caption from the plan, the retrieved snippets, and the
/// selected template's writing style.
///
/// Snippets are source material for the model to paraphrase; the no-verbatim
/// rule lives in the prompt, not in code. The reply is plain text with
/// hashtags in the closing lines.
pub fn run_writer(
    model: &dyn ChatModel,
    user_input: &UserInput,
    selected_template: &str,
    catalog: &TemplateCatalog,
    caption_plan: &str,
    rag_results: &[RagRecord],
    config: &PipelineConfig,
) -> Result<String> {
    let template = catalog::lookup(catalog, selected_template)?;
    let system_prompt = CAPTION_WRITER_PROMPT_MD.replace(
        "{WRITING_STYLE}",
        &serde_json::to_string_pretty(&template.writing_style).expect("serialize writing style"),
    );

    let payload = json!({
        "business_type": user_input.business_type,
        "title": user_input.title,
        "direction": user_input.direction,
        "caption_plan": caption_plan,
        "rag_results": rag_results,
    });

    llm::generate_text(
        model,
        &payload.to_string(),
        &[ChatMessage::system(system_prompt)],
        &GenerationConfig::text().with_model(&config.model),
    )
}
