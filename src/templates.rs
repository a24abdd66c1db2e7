pub const TEMPLATE_SELECTOR_PROMPT_MD: &str = include_str!("../prompts/template_selector.md");
pub const CAPTION_PLANNER_PROMPT_MD: &str = include_str!("../prompts/caption_planner.md");
pub const CAPTION_WRITER_PROMPT_MD: &str = include_str!("../prompts/caption_writer.md");
pub const TEMPLATE_EXTRACTION_PROMPT_MD: &str =
    include_str!("../prompts/template_extraction.md");
