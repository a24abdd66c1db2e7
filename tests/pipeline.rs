//! End-to-end pipeline scenarios driven through stub model and search
//! backends. Stage logic, ordering, and failure propagation are exercised
//! here; the HTTP clients themselves are not.

use caption_gen::catalog::{Template, TemplateCatalog, WritingStyle};
use caption_gen::error::Error;
use caption_gen::llm::{ChatMessage, ChatModel, GenerationConfig, OutputMode};
use caption_gen::pipeline::{run_pipeline, PipelineConfig, Stage, UserInput};
use caption_gen::search::{SearchHit, SearchProvider};
use std::cell::RefCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

type CapturedCall = (Vec<ChatMessage>, OutputMode);

/// Replays canned replies in order and records every call.
struct ScriptedModel {
    replies: RefCell<Vec<String>>,
    calls: RefCell<Vec<CapturedCall>>,
}

impl ScriptedModel {
    fn new(replies: &[&str]) -> Self {
        ScriptedModel {
            replies: RefCell::new(replies.iter().rev().map(|s| s.to_string()).collect()),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl ChatModel for ScriptedModel {
    fn complete(
        &self,
        messages: &[ChatMessage],
        _config: &GenerationConfig,
        mode: OutputMode,
    ) -> caption_gen::error::Result<String> {
        self.calls.borrow_mut().push((messages.to_vec(), mode));
        Ok(self
            .replies
            .borrow_mut()
            .pop()
            .expect("model called more times than scripted"))
    }
}

/// Serves one fixed hit per query and records every request.
struct StubSearch {
    calls: AtomicUsize,
    requests: Mutex<Vec<(String, usize)>>,
}

impl StubSearch {
    fn new() -> Self {
        StubSearch {
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SearchProvider for StubSearch {
    fn search(&self, query: &str, limit: usize) -> caption_gen::error::Result<Vec<SearchHit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push((query.to_string(), limit));
        Ok(vec![SearchHit {
            title: format!("result for {query}"),
            snippet: "snippet text".to_string(),
            link: "https://example.com".to_string(),
        }])
    }
}

fn product_catalog() -> TemplateCatalog {
    TemplateCatalog {
        categories: vec![Template {
            name: "product".to_string(),
            caption_structure: vec![
                "intro".to_string(),
                "features".to_string(),
                "cta".to_string(),
            ],
            writing_style: WritingStyle {
                tone: "casual".to_string(),
                ..WritingStyle::default()
            },
            hashtag_pattern: vec!["#業種名".to_string()],
            example_structure: Vec::new(),
            example_caption: String::new(),
        }],
    }
}

fn latte_input() -> UserInput {
    UserInput {
        business_type: "cafe".to_string(),
        title: "New Latte".to_string(),
        direction: "introduce a new product".to_string(),
    }
}

#[test]
fn happy_path_returns_all_four_stage_outputs() {
    let writer_reply = "Our new latte just landed!\nCome try it this week.\n\n#cafe #newlatte";
    let model = ScriptedModel::new(&[
        r#"{"selected_template": "product"}"#,
        r#"{"caption_plan": "intro about new latte, features, cta", "query": ["seasonal latte flavor trends"]}"#,
        writer_reply,
    ]);
    let search = StubSearch::new();

    let bundle = run_pipeline(
        &model,
        &search,
        &latte_input(),
        &product_catalog(),
        &PipelineConfig::default(),
    )
    .unwrap();

    assert_eq!(bundle.template_selector.selected_template, "product");
    assert_eq!(
        bundle.caption_planner.caption_plan,
        "intro about new latte, features, cta"
    );
    assert_eq!(bundle.rag_results.len(), 1);
    assert_eq!(bundle.rag_results[0].query, "seasonal latte flavor trends");
    assert_eq!(bundle.rag_results[0].results.len(), 1);
    assert_eq!(bundle.final_caption, writer_reply);
    // Hashtags land in the caption's closing line.
    assert!(bundle.final_caption.lines().last().unwrap().contains('#'));

    // Three model calls (select, plan, write), one search per query.
    assert_eq!(model.call_count(), 3);
    assert_eq!(search.call_count(), 1);
    assert_eq!(
        search.requests.lock().unwrap()[0],
        ("seasonal latte flavor trends".to_string(), 3)
    );

    // Selector and planner run in JSON mode, the writer in text mode.
    let calls = model.calls.borrow();
    assert_eq!(calls[0].1, OutputMode::JsonObject);
    assert_eq!(calls[1].1, OutputMode::JsonObject);
    assert_eq!(calls[2].1, OutputMode::Text);
}

#[test]
fn unknown_selected_template_fails_before_planner_model_call() {
    let model = ScriptedModel::new(&[r#"{"selected_template": "nonexistent"}"#]);
    let search = StubSearch::new();

    let err = run_pipeline(
        &model,
        &search,
        &latte_input(),
        &product_catalog(),
        &PipelineConfig::default(),
    )
    .unwrap_err();

    assert_eq!(err.stage, Stage::Plan);
    assert!(matches!(err.source, Error::Schema(_)));
    assert!(err.to_string().contains("nonexistent"));
    // Only the selector call happened; the planner never reached the model.
    assert_eq!(model.call_count(), 1);
    assert_eq!(search.call_count(), 0);
}

#[test]
fn selector_reply_without_key_aborts_before_plan() {
    let model = ScriptedModel::new(&[r#"{"note": "forgot the key"}"#]);
    let search = StubSearch::new();

    let err = run_pipeline(
        &model,
        &search,
        &latte_input(),
        &product_catalog(),
        &PipelineConfig::default(),
    )
    .unwrap_err();

    assert_eq!(err.stage, Stage::Select);
    assert!(matches!(err.source, Error::Schema(_)));
    assert_eq!(model.call_count(), 1);
    assert_eq!(search.call_count(), 0);
}

#[test]
fn non_json_selector_reply_surfaces_the_raw_text() {
    let model = ScriptedModel::new(&["not json"]);
    let search = StubSearch::new();

    let err = run_pipeline(
        &model,
        &search,
        &latte_input(),
        &product_catalog(),
        &PipelineConfig::default(),
    )
    .unwrap_err();

    assert_eq!(err.stage, Stage::Select);
    match err.source {
        Error::ModelOutput { raw, .. } => assert_eq!(raw, "not json"),
        other => panic!("expected ModelOutput, got {other:?}"),
    }
}

#[test]
fn plan_without_queries_skips_retrieval_entirely() {
    let model = ScriptedModel::new(&[
        r#"{"selected_template": "product"}"#,
        r#"{"caption_plan": "no facts needed"}"#,
        "A caption with no research.\n\n#cafe",
    ]);
    let search = StubSearch::new();

    let bundle = run_pipeline(
        &model,
        &search,
        &latte_input(),
        &product_catalog(),
        &PipelineConfig::default(),
    )
    .unwrap();

    assert!(bundle.caption_planner.query.is_empty());
    assert!(bundle.rag_results.is_empty());
    assert_eq!(search.call_count(), 0);
}

#[test]
fn catalog_files_load_and_validate_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("templates.json");
    let catalog = product_catalog();
    std::fs::write(&path, serde_json::to_string_pretty(&catalog).unwrap()).unwrap();

    let loaded: TemplateCatalog =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    caption_gen::catalog::validate(&loaded).unwrap();
    assert_eq!(loaded.categories[0].name, "product");
}
