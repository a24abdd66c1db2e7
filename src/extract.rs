//! Template extraction: turn an example caption into a reusable template.
//!
//! A single-shot transform, not a pipeline stage. Existing catalog entries
//! ride along as few-shot examples so new templates keep the established
//! shape.
use crate::catalog::{Template, TemplateCatalog};
use crate::error::{Error, Result};
use crate::llm::{self, ChatMessage, ChatModel, GenerationConfig};
use crate::templates::TEMPLATE_EXTRACTION_PROMPT_MD;

const EXTRACTION_MAX_OUTPUT_TOKENS: u32 = 2048;

/// Extract a generalized template from one example caption.
pub fn extract_template(
    model: &dyn ChatModel,
    caption_text: &str,
    examples: &TemplateCatalog,
) -> Result<Template> {
    let few_shot =
        serde_json::to_string_pretty(&examples.categories).expect("serialize template examples");
    let system_prompt = TEMPLATE_EXTRACTION_PROMPT_MD.replace("{TEMPLATE_EXAMPLES}", &few_shot);

    let value = llm::generate_json(
        model,
        caption_text,
        &[ChatMessage::system(system_prompt)],
        &GenerationConfig::json().with_max_output_tokens(EXTRACTION_MAX_OUTPUT_TOKENS),
    )?;
    let template: Template = serde_json::from_value(value)
        .map_err(|err| Error::Schema(format!("extracted template: {err}")))?;
    validate_template(&template)?;
    Ok(template)
}

/// Reject extracted templates that are missing the fields a catalog entry
/// needs to be usable for later posts.
fn validate_template(template: &Template) -> Result<()> {
    if template.name.trim().is_empty() {
        return Err(Error::Schema(
            "extracted template has an empty name".to_string(),
        ));
    }
    if template.caption_structure.is_empty() {
        return Err(Error::Schema(format!(
            "extracted template {:?} has no caption_structure",
            template.name
        )));
    }
    if template.hashtag_pattern.is_empty() {
        return Err(Error::Schema(format!(
            "extracted template {:?} has no hashtag_pattern",
            template.name
        )));
    }
    if template.example_caption.trim().is_empty() {
        return Err(Error::Schema(format!(
            "extracted template {:?} has no example_caption",
            template.name
        )));
    }
    Ok(())
}
