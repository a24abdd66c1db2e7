//! Template catalog access.
//!
//! The catalog is a caller-owned JSON file of named caption templates.
//! Stages only ever read it: `reduce` produces the trimmed view embedded in
//! prompts and `lookup` resolves a selected name back to the full record.
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Writing style descriptor guiding final text generation. Values are free
/// text; nothing here is enumerated by the generator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WritingStyle {
    #[serde(default)]
    pub tone: String,
    #[serde(default)]
    pub emoji_usage: String,
    #[serde(default)]
    pub sentence_length: String,
    #[serde(default)]
    pub formatting: String,
    #[serde(default)]
    pub punctuation: String,
}

/// A reusable structural/stylistic pattern for one kind of post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    #[serde(default)]
    pub caption_structure: Vec<String>,
    #[serde(default)]
    pub writing_style: WritingStyle,
    #[serde(default)]
    pub hashtag_pattern: Vec<String>,
    #[serde(default)]
    pub example_structure: Vec<String>,
    #[serde(default)]
    pub example_caption: String,
}

/// The full template catalog, as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateCatalog {
    pub categories: Vec<Template>,
}

/// Fields a reduced catalog view can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateField {
    Name,
    CaptionStructure,
    WritingStyle,
    HashtagPattern,
    ExampleStructure,
    ExampleCaption,
}

impl TemplateField {
    /// JSON key for this field in the catalog file format.
    pub fn key(self) -> &'static str {
        match self {
            TemplateField::Name => "name",
            TemplateField::CaptionStructure => "caption_structure",
            TemplateField::WritingStyle => "writing_style",
            TemplateField::HashtagPattern => "hashtag_pattern",
            TemplateField::ExampleStructure => "example_structure",
            TemplateField::ExampleCaption => "example_caption",
        }
    }
}

/// Check the catalog invariant: every entry carries a non-empty name.
/// Later stages look templates up by name, so a nameless entry is fatal.
pub fn validate(catalog: &TemplateCatalog) -> Result<()> {
    for (index, template) in catalog.categories.iter().enumerate() {
        if template.name.trim().is_empty() {
            return Err(Error::Schema(format!(
                "catalog entry {index} has an empty name"
            )));
        }
    }
    Ok(())
}

/// Build a lightweight catalog view containing only the requested fields,
/// for prompt embedding. The view must keep `name` or later lookup by name
/// becomes impossible, so dropping it is an error.
pub fn reduce(catalog: &TemplateCatalog, fields: &[TemplateField]) -> Result<Value> {
    let mut categories = Vec::with_capacity(catalog.categories.len());
    for template in &catalog.categories {
        let full = serde_json::to_value(template).expect("serialize template");
        let mut reduced = Map::new();
        if let Value::Object(map) = full {
            for field in fields {
                if let Some(value) = map.get(field.key()) {
                    reduced.insert(field.key().to_string(), value.clone());
                }
            }
        }
        if !reduced.contains_key(TemplateField::Name.key()) {
            return Err(Error::Schema(format!(
                "reduced view of template {:?} lacks 'name'",
                template.name
            )));
        }
        categories.push(Value::Object(reduced));
    }
    Ok(json!({ "categories": categories }))
}

/// Find the template with the given name, scanning in catalog order and
/// returning the first match. Names are expected, not required, to be
/// unique.
pub fn lookup<'a>(catalog: &'a TemplateCatalog, name: &str) -> Result<&'a Template> {
    catalog
        .categories
        .iter()
        .find(|template| template.name == name)
        .ok_or_else(|| Error::Schema(format!("template {name:?} not found in catalog")))
}
