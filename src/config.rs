//! Credential loading for the model, search, and publishing services.
//!
//! Credentials are read once at startup, before any pipeline stage runs, so
//! a missing value fails the job up front instead of mid-chain.
use crate::error::{Error, Result};
use std::env;

/// Chat model service credentials.
#[derive(Debug, Clone)]
pub struct ModelCredentials {
    pub api_key: String,
}

/// Web search service credentials.
#[derive(Debug, Clone)]
pub struct SearchCredentials {
    pub api_key: String,
    pub engine_id: String,
}

/// Instagram Graph API credentials.
#[derive(Debug, Clone)]
pub struct PublishCredentials {
    pub ig_user_id: String,
    pub ig_access_token: String,
}

/// Load `.env` so local runs pick up credentials without exporting them.
/// A missing `.env` file is fine; the environment may already be populated.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

pub fn model_credentials() -> Result<ModelCredentials> {
    Ok(ModelCredentials {
        api_key: required("OPENAI_API_KEY")?,
    })
}

pub fn search_credentials() -> Result<SearchCredentials> {
    Ok(SearchCredentials {
        api_key: required("GOOGLE_SEARCH_API_KEY")?,
        engine_id: required("GOOGLE_SEARCH_ENGINE_ID")?,
    })
}

pub fn publish_credentials() -> Result<PublishCredentials> {
    Ok(PublishCredentials {
        ig_user_id: required("IG_USER_ID")?,
        ig_access_token: required("IG_ACCESS_TOKEN")?,
    })
}

fn required(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::Config(format!("{name} must be set"))),
    }
}
