//! Error taxonomy for catalog access, generation, retrieval, and publishing.
use thiserror::Error;

/// Failures a pipeline run can surface. Every variant is fatal to the
/// current run; nothing is silently defaulted.
#[derive(Debug, Error)]
pub enum Error {
    /// A required field or key is missing: a catalog entry without a name,
    /// model output lacking a required key, or a template name that does
    /// not exist in the catalog.
    #[error("schema error: {0}")]
    Schema(String),

    /// A JSON-mode model reply failed to parse. Carries the raw reply text
    /// for diagnosis.
    #[error("model reply is not valid JSON ({message}); raw reply: {raw}")]
    ModelOutput { message: String, raw: String },

    /// Transport-level failure from an external service.
    #[error("{service} request failed: {message}")]
    ExternalService {
        service: &'static str,
        message: String,
    },

    /// A required credential or environment value is absent at startup.
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
