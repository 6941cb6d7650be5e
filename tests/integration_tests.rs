//! Integration tests for the recap pipeline
//!
//! These tests drive `Recap::run` end to end with mock components.

use async_trait::async_trait;
use recap_rs::adk::error::{ConfigurationError, RecapError};
use recap_rs::adk::model::{Content, GenerationConfig, Model, Part};
use recap_rs::recap::actions::{AppendLog, FileAppendLog, Notifier};
use recap_rs::recap::config::{ConfigLoader, RecapConfig};
use recap_rs::recap::extract::{Extraction, Extractor, LlmExtractor, StaticExtractor};
use recap_rs::recap::pipeline::{Collaborators, Recap};
use recap_rs::recap::steps::{ActionRouter, FOLLOWUP, SUMMARIZE, TODO};
use recap_rs::recap::workflow::graph::{
    ExecutionMode, FailurePolicy, FnRouter, GraphBuilder, Route, Router, Step,
};
use recap_rs::recap::workflow::state::{PartialState, RecapState, StateField};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Mock Components
// ============================================================================

/// Mock model that returns predefined responses
struct MockModel {
    responses: Vec<Content>,
    response_index: AtomicUsize,
}

impl MockModel {
    fn new(responses: Vec<Content>) -> Self {
        Self {
            responses,
            response_index: AtomicUsize::new(0),
        }
    }

    fn text_response(text: &str) -> Content {
        Content {
            role: "model".to_string(),
            parts: vec![Part::Text(text.to_string())],
        }
    }
}

#[async_trait]
impl Model for MockModel {
    async fn generate_content(
        &self,
        _history: &[Content],
        _config: Option<&GenerationConfig>,
    ) -> Result<Content, RecapError> {
        let idx = self.response_index.fetch_add(1, Ordering::SeqCst);
        self.responses
            .get(idx)
            .cloned()
            .ok_or_else(|| RecapError::api("mock", "no responses left"))
    }
}

/// Append log that keeps entries in memory, optionally after a delay
#[derive(Default)]
struct RecordingLog {
    entries: Mutex<Vec<String>>,
    delay: Option<Duration>,
    fail: bool,
}

impl RecordingLog {
    fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl AppendLog for RecordingLog {
    fn target(&self) -> String {
        "memory".to_string()
    }

    async fn append(&self, entry: &str) -> Result<(), RecapError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(RecapError::api("memory", "disk full"));
        }
        self.entries.lock().unwrap().push(entry.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingNotifier {
    fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<(), RecapError> {
        if self.fail {
            return Err(RecapError::api("notifier", "no display"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
        Ok(())
    }
}

/// Extractor that counts its calls
struct CountingExtractor {
    inner: StaticExtractor,
    calls: AtomicUsize,
}

#[async_trait]
impl Extractor for CountingExtractor {
    async fn extract(&self, text: &str) -> Result<Extraction, RecapError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.extract(text).await
    }
}

struct Harness {
    recap: Recap,
    task_log: Arc<RecordingLog>,
    reminders: Arc<RecordingLog>,
    notifier: Arc<RecordingNotifier>,
}

fn extraction(summary: &str, tasks: &[&str], followup: &str) -> Extraction {
    Extraction {
        summary: summary.to_string(),
        tasks: tasks.iter().map(|t| t.to_string()).collect(),
        followup: followup.to_string(),
    }
}

fn harness_with(
    extractor: Arc<dyn Extractor>,
    task_log: RecordingLog,
    notifier: RecordingNotifier,
    config: &RecapConfig,
) -> Harness {
    harness_full(
        extractor,
        task_log,
        RecordingLog::default(),
        notifier,
        config,
    )
}

fn harness_full(
    extractor: Arc<dyn Extractor>,
    task_log: RecordingLog,
    reminders: RecordingLog,
    notifier: RecordingNotifier,
    config: &RecapConfig,
) -> Harness {
    let task_log = Arc::new(task_log);
    let reminders = Arc::new(reminders);
    let notifier = Arc::new(notifier);

    let recap = Recap::new(
        Collaborators {
            extractor,
            task_log: task_log.clone(),
            reminders: reminders.clone(),
            notifier: notifier.clone(),
        },
        config,
    )
    .unwrap();

    Harness {
        recap,
        task_log,
        reminders,
        notifier,
    }
}

fn harness(extraction: Extraction) -> Harness {
    harness_with(
        Arc::new(StaticExtractor::new(extraction)),
        RecordingLog::default(),
        RecordingNotifier::default(),
        &RecapConfig::default(),
    )
}

// ============================================================================
// Pipeline Scenarios
// ============================================================================

#[tokio::test]
async fn test_no_markers_runs_only_summarize() {
    let h = harness(extraction("Just a chat", &[], ""));

    let outcome = h.recap.run("No action items here").await.unwrap();

    assert_eq!(outcome.summary, "Just a chat");
    assert!(outcome.results.is_empty());
    assert!(h.task_log.entries().is_empty());
    assert!(h.notifier.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_single_task_is_logged() {
    let h = harness(extraction("Shopping", &["Buy milk"], ""));

    let outcome = h.recap.run("TODO: Buy milk").await.unwrap();

    assert_eq!(outcome.results, vec!["Logged 1 tasks.".to_string()]);
    let entries = h.task_log.entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].starts_with("\n--- New Tasks ("));
    assert!(entries[0].ends_with(") ---\n* Buy milk\n"));
    assert!(h.reminders.entries().is_empty());
}

#[tokio::test]
async fn test_results_follow_registration_order() {
    // The task log finishes last, its result still comes first
    let h = harness_with(
        Arc::new(StaticExtractor::new(extraction(
            "Planning",
            &["Send deck", "Book room"],
            "Tuesday 10am",
        ))),
        RecordingLog::slow(Duration::from_millis(50)),
        RecordingNotifier::default(),
        &RecapConfig::default(),
    );

    let outcome = h.recap.run("notes").await.unwrap();

    assert_eq!(
        outcome.results,
        vec![
            "Logged 2 tasks.".to_string(),
            "Created desktop reminder.".to_string()
        ]
    );
    assert_eq!(
        h.reminders.entries(),
        vec!["REMINDER: Tuesday 10am\n".to_string()]
    );
    assert_eq!(
        h.notifier.sent.lock().unwrap().as_slice(),
        &[("Meeting Followup".to_string(), "Tuesday 10am".to_string())]
    );
}

#[tokio::test]
async fn test_sequential_mode_same_results() {
    let mut config = RecapConfig::default();
    config.execution = ExecutionMode::Sequential;
    let h = harness_with(
        Arc::new(StaticExtractor::new(extraction("Planning", &["a"], "Friday"))),
        RecordingLog::default(),
        RecordingNotifier::default(),
        &config,
    );

    let outcome = h.recap.run("notes").await.unwrap();

    assert_eq!(h.recap.engine().execution_mode(), ExecutionMode::Sequential);
    assert_eq!(
        outcome.results,
        vec![
            "Logged 1 tasks.".to_string(),
            "Created desktop reminder.".to_string()
        ]
    );
}

#[tokio::test]
async fn test_extraction_failure_names_summarize() {
    let h = harness_with(
        Arc::new(StaticExtractor::failing("model unavailable")),
        RecordingLog::default(),
        RecordingNotifier::default(),
        &RecapConfig::default(),
    );

    let err = h.recap.run("notes").await.unwrap_err();

    assert_eq!(err.failed_step(), Some(SUMMARIZE));
    assert_eq!(err.kind(), "step_execution");
    assert!(err.to_string().contains("model unavailable"));
    assert!(h.task_log.entries().is_empty());
}

#[tokio::test]
async fn test_repeated_runs_are_identical() {
    let h = harness(extraction("Planning", &["a", "b"], "Friday"));

    let first = h.recap.run("notes").await.unwrap();
    let second = h.recap.run("notes").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(h.task_log.entries().len(), 2);
}

#[tokio::test]
async fn test_degraded_followup_keeps_other_results() {
    let mut config = RecapConfig::default();
    config.failure.followup = FailurePolicy::Degrade;
    let h = harness_full(
        Arc::new(StaticExtractor::new(extraction("Planning", &["a"], "Friday"))),
        RecordingLog::default(),
        RecordingLog::failing(),
        RecordingNotifier::default(),
        &config,
    );

    let outcome = h.recap.run("notes").await.unwrap();

    assert_eq!(outcome.summary, "Planning");
    assert_eq!(outcome.results, vec!["Logged 1 tasks.".to_string()]);
    assert!(h.reminders.entries().is_empty());
}

#[tokio::test]
async fn test_failing_followup_fails_fast_by_default() {
    let h = harness_full(
        Arc::new(StaticExtractor::new(extraction("Planning", &["a"], "Friday"))),
        RecordingLog::default(),
        RecordingLog::failing(),
        RecordingNotifier::default(),
        &RecapConfig::default(),
    );

    let err = h.recap.run("notes").await.unwrap_err();
    assert_eq!(err.failed_step(), Some(FOLLOWUP));
}

#[tokio::test]
async fn test_notification_failure_keeps_run_and_reminder() {
    let h = harness_with(
        Arc::new(StaticExtractor::new(extraction("Planning", &["a"], "Friday"))),
        RecordingLog::default(),
        RecordingNotifier::failing(),
        &RecapConfig::default(),
    );

    let outcome = h.recap.run("notes").await.unwrap();

    assert_eq!(outcome.summary, "Planning");
    assert_eq!(
        outcome.results,
        vec![
            "Logged 1 tasks.".to_string(),
            "Created desktop reminder.".to_string()
        ]
    );
    assert_eq!(
        h.reminders.entries(),
        vec!["REMINDER: Friday\n".to_string()]
    );
    assert!(h.notifier.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_input_is_rejected_before_running() {
    let extractor = Arc::new(CountingExtractor {
        inner: StaticExtractor::new(extraction("s", &[], "")),
        calls: AtomicUsize::new(0),
    });
    let h = harness_with(
        extractor.clone(),
        RecordingLog::default(),
        RecordingNotifier::default(),
        &RecapConfig::default(),
    );

    let err = h.recap.run(" \n\t").await.unwrap_err();

    assert!(matches!(err, RecapError::Validation(_)));
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_llm_extractor_end_to_end() {
    let reply = r#"```json
{"summary": "Roadmap review", "tasks": ["Draft Q3 plan"], "followup": ""}
```"#;
    let model = Arc::new(MockModel::new(vec![MockModel::text_response(reply)]));
    let h = harness_with(
        Arc::new(LlmExtractor::new(model)),
        RecordingLog::default(),
        RecordingNotifier::default(),
        &RecapConfig::default(),
    );

    let outcome = h.recap.run("We reviewed the roadmap").await.unwrap();

    assert_eq!(outcome.summary, "Roadmap review");
    assert_eq!(outcome.results, vec!["Logged 1 tasks.".to_string()]);
    assert!(h.task_log.entries()[0].contains("* Draft Q3 plan\n"));
}

#[tokio::test]
async fn test_file_logs_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = format!(
        "outputs:\n  task_log: {}\n  reminders: {}\nnotifications:\n  enabled: false\n",
        dir.path().join("todo_list.txt").display(),
        dir.path().join("reminders.txt").display()
    );
    let config = ConfigLoader::parse_yaml(&yaml).unwrap();
    let recap = Recap::from_config(
        Arc::new(StaticExtractor::new(extraction("Sync", &["Buy milk"], "Friday"))),
        &config,
    )
    .unwrap();

    recap.run("notes").await.unwrap();
    recap.run("notes").await.unwrap();

    let tasks = std::fs::read_to_string(dir.path().join("todo_list.txt")).unwrap();
    assert_eq!(tasks.matches("* Buy milk\n").count(), 2);
    let reminders = std::fs::read_to_string(dir.path().join("reminders.txt")).unwrap();
    assert_eq!(reminders, "REMINDER: Friday\nREMINDER: Friday\n");

    // The log is append-only
    let log = FileAppendLog::new(dir.path().join("reminders.txt"));
    log.append("REMINDER: extra\n").await.unwrap();
    let reminders = std::fs::read_to_string(dir.path().join("reminders.txt")).unwrap();
    assert!(reminders.starts_with("REMINDER: Friday\n"));
}

// ============================================================================
// Routing and Graph Wiring
// ============================================================================

#[test]
fn test_action_router_is_pure() {
    let state = RecapState::new("notes")
        .merge(
            SUMMARIZE,
            PartialState::new()
                .with_summary("s")
                .with_action(TODO)
                .with_action(FOLLOWUP),
        )
        .unwrap();
    let router = ActionRouter::new();

    let first = router.route(&state);
    assert_eq!(first, router.route(&state));
    assert_eq!(first, vec![Route::step(TODO), Route::step(FOLLOWUP)]);
}

/// Step that appends its own name to `results`
struct NamedStep(&'static str);

#[async_trait]
impl Step for NamedStep {
    fn name(&self) -> &str {
        self.0
    }

    fn writes(&self) -> &[StateField] {
        &[StateField::Results]
    }

    async fn run(&self, _state: &RecapState) -> Result<PartialState, RecapError> {
        Ok(PartialState::new().with_result(self.0))
    }
}

#[test]
fn test_builder_rejects_bad_wiring() {
    let mut builder = GraphBuilder::new();
    builder
        .add_step(Arc::new(NamedStep("a")))
        .unwrap()
        .add_step(Arc::new(NamedStep("b")))
        .unwrap();

    let err = builder
        .add_router(
            "a",
            Arc::new(FnRouter::new(&["a"], |_: &RecapState| vec![])),
        )
        .err();
    assert_eq!(err, Some(ConfigurationError::SelfLoop("a".to_string())));

    builder
        .add_router(
            "a",
            Arc::new(FnRouter::new(&["b"], |_: &RecapState| vec![])),
        )
        .unwrap()
        .add_router(
            "b",
            Arc::new(FnRouter::new(&["a"], |_: &RecapState| vec![])),
        )
        .unwrap();
    assert!(matches!(builder.build(), Err(ConfigurationError::Cycle(_))));

    let mut builder = GraphBuilder::new();
    builder
        .add_step(Arc::new(NamedStep("a")))
        .unwrap()
        .add_router(
            "a",
            Arc::new(FnRouter::new(&["missing"], |_: &RecapState| vec![])),
        )
        .unwrap();
    assert!(matches!(
        builder.build(),
        Err(ConfigurationError::UnknownRouteTarget { .. })
    ));
}

#[tokio::test]
async fn test_router_returning_unregistered_step_fails_run() {
    let mut builder = GraphBuilder::new();
    builder
        .add_step(Arc::new(NamedStep("a")))
        .unwrap()
        .add_step(Arc::new(NamedStep("b")))
        .unwrap()
        .add_router(
            "a",
            Arc::new(FnRouter::new(&["b"], |_: &RecapState| vec![Route::step("ghost")])),
        )
        .unwrap();
    let engine = builder.build().unwrap();

    let err = engine.run("a", "text").await.unwrap_err();
    let RecapError::Configuration(config_err) = err else {
        panic!("expected a configuration error");
    };
    assert_eq!(
        config_err,
        ConfigurationError::UnknownRouteTarget {
            router: "a".to_string(),
            target: "ghost".to_string()
        }
    );
}

/// Step that writes the summary, which only one step per round may do
struct SummaryWriter(&'static str);

#[async_trait]
impl Step for SummaryWriter {
    fn name(&self) -> &str {
        self.0
    }

    fn writes(&self) -> &[StateField] {
        &[StateField::Summary]
    }

    async fn run(&self, _state: &RecapState) -> Result<PartialState, RecapError> {
        Ok(PartialState::new().with_summary(self.0))
    }
}

#[test]
fn test_sibling_scalar_writers_are_rejected() {
    let mut builder = GraphBuilder::new();
    builder
        .add_step(Arc::new(NamedStep("entry")))
        .unwrap()
        .add_step(Arc::new(SummaryWriter("left")))
        .unwrap()
        .add_step(Arc::new(SummaryWriter("right")))
        .unwrap()
        .add_router(
            "entry",
            Arc::new(FnRouter::new(&["left", "right"], |_: &RecapState| {
                vec![Route::step("left"), Route::step("right")]
            })),
        )
        .unwrap();

    match builder.build() {
        Err(ConfigurationError::ConflictingWrite { field, .. }) => assert_eq!(field, "summary"),
        _ => panic!("expected a conflicting write"),
    }
}
