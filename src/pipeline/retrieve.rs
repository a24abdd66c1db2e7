//! Retrieval stage: fan planner queries out to the search provider.
use crate::error::Result;
use crate::search::{SearchHit, SearchProvider};
use serde::{Deserialize, Serialize};
use std::thread;

/// Default result cap per query.
pub(crate) const DEFAULT_RESULTS_PER_QUERY: usize = 3;

/// Attempts per query before falling back to an empty result list.
const MAX_SEARCH_ATTEMPTS: usize = 2;

/// Snippets retrieved for one planner query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagRecord {
    pub query: String,
    pub results: Vec<SearchHit>,
}

/// Run every query against the provider and return one record per query,
/// in input order.
///
/// The queries are independent, so they fan out across scoped threads; the
/// fan-out is bounded by the planner's query count, which is small by
/// construction. Joining the handles in spawn order keeps records aligned
/// with input order regardless of completion order. An empty query list
/// returns immediately without touching the provider.
pub fn run_retrieval(
    provider: &dyn SearchProvider,
    queries: &[String],
    limit: usize,
) -> Result<Vec<RagRecord>> {
    if queries.is_empty() {
        return Ok(Vec::new());
    }

    let records = thread::scope(|scope| {
        let handles: Vec<_> = queries
            .iter()
            .map(|query| {
                scope.spawn(move || RagRecord {
                    query: query.clone(),
                    results: search_with_retry(provider, query, limit),
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("retrieval thread panicked"))
            .collect()
    });

    Ok(records)
}

/// Search one query, retrying transport failures a bounded number of times.
/// A query that keeps failing yields an empty result list instead of
/// aborting the stage.
fn search_with_retry(provider: &dyn SearchProvider, query: &str, limit: usize) -> Vec<SearchHit> {
    for attempt in 1..=MAX_SEARCH_ATTEMPTS {
        match provider.search(query, limit) {
            Ok(results) => {
                if attempt > 1 {
                    tracing::info!(query, attempt, "search retry succeeded");
                }
                return results;
            }
            Err(err) => {
                tracing::warn!(query, attempt, error = %err, "search attempt failed");
            }
        }
    }
    tracing::warn!(query, "search gave up; continuing with empty results");
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Answers each query with one hit echoing the query text, after an
    /// optional per-query delay keyed by position.
    struct EchoSearch {
        calls: AtomicUsize,
        delays: Vec<Duration>,
    }

    impl EchoSearch {
        fn new() -> Self {
            EchoSearch {
                calls: AtomicUsize::new(0),
                delays: Vec::new(),
            }
        }

        fn with_delays(delays: Vec<Duration>) -> Self {
            EchoSearch {
                calls: AtomicUsize::new(0),
                delays,
            }
        }
    }

    impl SearchProvider for EchoSearch {
        fn search(&self, query: &str, _limit: usize) -> Result<Vec<SearchHit>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delays.get(call) {
                thread::sleep(*delay);
            }
            Ok(vec![SearchHit {
                title: format!("about {query}"),
                snippet: format!("snippet for {query}"),
                link: String::new(),
            }])
        }
    }

    /// Fails every query whose text contains "broken".
    struct FlakySearch {
        calls: AtomicUsize,
    }

    impl SearchProvider for FlakySearch {
        fn search(&self, query: &str, _limit: usize) -> Result<Vec<SearchHit>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if query.contains("broken") {
                return Err(Error::ExternalService {
                    service: "search",
                    message: "connection reset".to_string(),
                });
            }
            Ok(vec![SearchHit::default()])
        }
    }

    #[test]
    fn records_keep_input_order_despite_uneven_latency() {
        // The first query finishes last; order must still match the input.
        let provider = EchoSearch::with_delays(vec![
            Duration::from_millis(50),
            Duration::from_millis(10),
            Duration::ZERO,
        ]);
        let queries = vec![
            "first".to_string(),
            "second".to_string(),
            "third".to_string(),
        ];

        let records = run_retrieval(&provider, &queries, 3).unwrap();

        let order: Vec<&str> = records.iter().map(|r| r.query.as_str()).collect();
        assert_eq!(order, ["first", "second", "third"]);
        assert_eq!(records[0].results[0].title, "about first");
    }

    #[test]
    fn empty_query_list_short_circuits_without_calls() {
        let provider = EchoSearch::new();
        let records = run_retrieval(&provider, &[], 3).unwrap();
        assert!(records.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn failing_query_falls_back_to_an_empty_record() {
        let provider = FlakySearch {
            calls: AtomicUsize::new(0),
        };
        let queries = vec!["fine".to_string(), "broken one".to_string()];

        let records = run_retrieval(&provider, &queries, 3).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].results.len(), 1);
        assert!(records[1].results.is_empty());
        // One call for the good query, MAX_SEARCH_ATTEMPTS for the bad one.
        assert_eq!(
            provider.calls.load(Ordering::SeqCst),
            1 + MAX_SEARCH_ATTEMPTS
        );
    }
}
