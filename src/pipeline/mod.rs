//! Caption pipeline orchestration.
//!
//! A linear state machine: SELECT -> PLAN -> RETRIEVE -> WRITE. Each stage
//! consumes the previous stage's output; any failure aborts the run with
//! the failing stage attached, and no partial bundle is ever returned.
mod plan;
mod retrieve;
mod select;
mod write;

pub use plan::{run_planner, PlannerOutput};
pub use retrieve::{run_retrieval, RagRecord};
pub use select::{run_selector, SelectorOutput};
pub use write::run_writer;

use crate::catalog::TemplateCatalog;
use crate::error::Error;
use crate::llm::{ChatModel, DEFAULT_MODEL};
use crate::search::SearchProvider;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single job's request. Immutable for the duration of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInput {
    pub business_type: String,
    pub title: String,
    pub direction: String,
}

/// Per-run knobs shared by every stage.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Model identifier used for all stage calls.
    pub model: String,
    /// Result cap passed to the search provider per query.
    pub results_per_query: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            model: DEFAULT_MODEL.to_string(),
            results_per_query: retrieve::DEFAULT_RESULTS_PER_QUERY,
        }
    }
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Select,
    Plan,
    Retrieve,
    Write,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Select => "select",
            Stage::Plan => "plan",
            Stage::Retrieve => "retrieve",
            Stage::Write => "write",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stage failure, identifying which stage aborted the run and why.
#[derive(Debug, thiserror::Error)]
#[error("caption pipeline failed at {stage}: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: Error,
}

/// All four stage outputs, surfaced together so callers can inspect the
/// intermediate artifacts and not just the final caption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionBundle {
    pub template_selector: SelectorOutput,
    pub caption_planner: PlannerOutput,
    pub rag_results: Vec<RagRecord>,
    pub final_caption: String,
}

/// Run the full caption pipeline for one job.
pub fn run_pipeline(
    model: &dyn ChatModel,
    search: &dyn SearchProvider,
    user_input: &UserInput,
    catalog: &TemplateCatalog,
    config: &PipelineConfig,
) -> std::result::Result<CaptionBundle, PipelineError> {
    let template_selector = run_selector(model, user_input, catalog, config)
        .map_err(|source| PipelineError {
            stage: Stage::Select,
            source,
        })?;
    tracing::info!(template = %template_selector.selected_template, "template selected");

    let caption_planner = run_planner(
        model,
        user_input,
        &template_selector.selected_template,
        catalog,
        config,
    )
    .map_err(|source| PipelineError {
        stage: Stage::Plan,
        source,
    })?;
    tracing::info!(queries = caption_planner.query.len(), "caption planned");

    let rag_results = run_retrieval(search, &caption_planner.query, config.results_per_query)
        .map_err(|source| PipelineError {
            stage: Stage::Retrieve,
            source,
        })?;

    let final_caption = run_writer(
        model,
        user_input,
        &template_selector.selected_template,
        catalog,
        &caption_planner.caption_plan,
        &rag_results,
        config,
    )
    .map_err(|source| PipelineError {
        stage: Stage::Write,
        source,
    })?;
    tracing::info!(caption_bytes = final_caption.len(), "caption written");

    Ok(CaptionBundle {
        template_selector,
        caption_planner,
        rag_results,
        final_caption,
    })
}

/// Decode a stage's parsed JSON reply into its typed output shape. A
/// missing required key surfaces as a schema error naming the stage, not as
/// a later null dereference.
pub(crate) fn decode_output<T: serde::de::DeserializeOwned>(
    value: serde_json::Value,
    stage: Stage,
) -> crate::error::Result<T> {
    serde_json::from_value(value)
        .map_err(|err| Error::Schema(format!("{stage} stage output: {err}")))
}
