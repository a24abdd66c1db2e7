//! Web search access for retrieval augmentation.
//!
//! One request per query; providers sit behind the [`SearchProvider`] trait
//! so retrieval can run against a stub. The production implementation is the
//! Google Programmable Search JSON API, whose result items carry exactly the
//! `{title, snippet, link}` triple the pipeline records.
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SEARCH_BASE_URL: &str = "https://www.googleapis.com/customsearch/v1";
const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

/// One ranked result extracted from a provider response. Fields the
/// provider omits default to empty strings; a sparse item never fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub link: String,
}

/// Ranked web search, one request per query.
///
/// `Sync` so the retrieval stage can fan per-query calls out across scoped
/// threads.
pub trait SearchProvider: Sync {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>>;
}

/// Google Programmable Search JSON API client.
pub struct GoogleSearch {
    agent: ureq::Agent,
    api_key: String,
    engine_id: String,
    base_url: String,
}

impl GoogleSearch {
    pub fn new(api_key: String, engine_id: String) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(SEARCH_TIMEOUT))
            .build()
            .into();
        GoogleSearch {
            agent,
            api_key,
            engine_id,
            base_url: SEARCH_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different endpoint (test double).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Deserialize)]
struct SearchReply {
    /// Absent entirely when a query has no results.
    #[serde(default)]
    items: Vec<SearchHit>,
}

impl SearchProvider for GoogleSearch {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let mut response = self
            .agent
            .get(self.base_url.as_str())
            .query("key", &self.api_key)
            .query("cx", &self.engine_id)
            .query("q", query)
            .query("num", &limit.to_string())
            .call()
            .map_err(|err| Error::ExternalService {
                service: "search",
                message: err.to_string(),
            })?;
        let reply: SearchReply =
            response
                .body_mut()
                .read_json()
                .map_err(|err| Error::ExternalService {
                    service: "search",
                    message: format!("decode search reply: {err}"),
                })?;
        tracing::debug!(query, hits = reply.items.len(), "search finished");
        Ok(reply.items)
    }
}
