/// Integration tests for query sessions with synchronous and asynchronous candidates
use async_trait::async_trait;
use placeholder_autocomplete::{
    AutoComplete, AutoCompleteConfig, Candidate, CandidateFetcher, EditorHost, FetchMode,
    ListContainer, ListEntry, ListPlacement, MemoryHost, NavKey, Selection, SessionObserver,
    StaticSource, SuggestError, SuggestResult,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Fetcher answering from a fixed table and recording every query it sees
#[derive(Clone, Default)]
struct TableFetcher {
    table: Arc<HashMap<String, Vec<Candidate>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl TableFetcher {
    fn new(entries: &[(&str, &[&str])]) -> Self {
        let table = entries
            .iter()
            .map(|(query, labels)| (query.to_string(), candidates(labels)))
            .collect();
        Self {
            table: Arc::new(table),
            calls: Arc::default(),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CandidateFetcher for TableFetcher {
    async fn fetch(&self, query: &str) -> SuggestResult<Vec<Candidate>> {
        self.calls.lock().unwrap().push(query.to_string());
        Ok(self.table.get(query).cloned().unwrap_or_default())
    }
}

struct FailingFetcher;

#[async_trait]
impl CandidateFetcher for FailingFetcher {
    async fn fetch(&self, _query: &str) -> SuggestResult<Vec<Candidate>> {
        Err(SuggestError::fetch_error("backend unavailable"))
    }
}

#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl SessionObserver for RecordingObserver {
    fn on_open(&self) {
        self.events.lock().unwrap().push("open".to_string());
    }

    fn on_close(&self, chosen: Option<&Candidate>) {
        let label = chosen.map_or("none", |c| c.label.as_str());
        self.events.lock().unwrap().push(format!("close:{}", label));
    }

    fn on_fetch_started(&self, query: &str) {
        self.events.lock().unwrap().push(format!("started:{}", query));
    }

    fn on_fetch_finished(&self, query: &str, result: Result<&[Candidate], &SuggestError>) {
        let status = if result.is_ok() { "ok" } else { "err" };
        self.events
            .lock()
            .unwrap()
            .push(format!("finished:{}:{}", query, status));
    }
}

#[derive(Clone, Default)]
struct RecordingContainer {
    renders: Arc<Mutex<Vec<Vec<String>>>>,
    hides: Arc<Mutex<usize>>,
    placement: Arc<Mutex<Option<ListPlacement>>>,
}

impl ListContainer for RecordingContainer {
    fn render(&mut self, entries: &[ListEntry]) {
        let labels = entries.iter().map(|e| e.candidate.label.clone()).collect();
        self.renders.lock().unwrap().push(labels);
    }

    fn hide(&mut self) {
        *self.hides.lock().unwrap() += 1;
    }

    fn place(&mut self, placement: ListPlacement) {
        *self.placement.lock().unwrap() = Some(placement);
    }
}

fn candidates(labels: &[&str]) -> Vec<Candidate> {
    labels.iter().map(|l| Candidate::labelled(*l)).collect()
}

fn labels(candidates: &[Candidate]) -> Vec<String> {
    candidates.iter().map(|c| c.label.clone()).collect()
}

#[tokio::test]
async fn test_after_fetch_renders_only_after_merge() {
    let fetcher = TableFetcher::new(&[("", &["Foo", "Bar"])]);
    let mut ac = AutoComplete::builder(MemoryHost::with_text("#"), StaticSource::new(candidates(&["Foo"])))
        .fetcher(fetcher)
        .build()
        .unwrap();

    let request = ac.open(0).into_fetch().expect("fetch requested");
    assert!(ac.ranked().is_empty());
    assert!(!ac.list().is_visible());
    assert!(ac.session().unwrap().is_fetching());

    assert!(ac.complete_fetch(request.run().await));
    assert_eq!(labels(ac.ranked()), vec!["Foo", "Bar"]);
    assert!(ac.list().is_visible());
    assert!(!ac.session().unwrap().is_fetching());
}

#[tokio::test]
async fn test_eager_renders_sync_candidates_first() {
    let config = AutoCompleteConfig {
        fetch_mode: FetchMode::Eager,
        ..AutoCompleteConfig::default()
    };
    let fetcher = TableFetcher::new(&[("", &["Foo", "Bar"])]);
    let mut ac = AutoComplete::builder(MemoryHost::with_text("#"), StaticSource::new(candidates(&["Foo"])))
        .config(config)
        .fetcher(fetcher)
        .build()
        .unwrap();

    let request = ac.open(0).into_fetch().unwrap();
    assert_eq!(labels(ac.ranked()), vec!["Foo"]);

    ac.complete_fetch(request.run().await);
    assert_eq!(labels(ac.ranked()), vec!["Foo", "Bar"]);
}

#[tokio::test]
async fn test_stale_result_resolving_last_is_discarded() {
    let fetcher = TableFetcher::new(&[("a", &["Alpha"]), ("ab", &["Abbot"])]);
    let mut ac = AutoComplete::builder(MemoryHost::with_text("#"), StaticSource::default())
        .fetcher(fetcher)
        .build()
        .unwrap();

    let first = ac.open(0).into_fetch().unwrap();
    ac.host_mut().type_text("a");
    let for_a = ac.refresh().unwrap();
    ac.host_mut().type_text("b");
    let for_ab = ac.refresh().unwrap();

    assert!(ac.complete_fetch(for_ab.run().await));
    assert_eq!(labels(ac.ranked()), vec!["Abbot"]);

    assert!(!ac.complete_fetch(for_a.run().await));
    assert!(!ac.complete_fetch(first.run().await));
    assert_eq!(labels(ac.ranked()), vec!["Abbot"]);
}

#[tokio::test]
async fn test_stale_result_resolving_first_is_discarded() {
    let fetcher = TableFetcher::new(&[("a", &["Alpha"]), ("ab", &["Abbot"])]);
    let mut ac = AutoComplete::builder(MemoryHost::with_text("#a"), StaticSource::default())
        .fetcher(fetcher)
        .build()
        .unwrap();

    let for_a = ac.open(0).into_fetch().unwrap();
    ac.host_mut().type_text("b");
    let for_ab = ac.refresh().unwrap();

    assert!(!ac.complete_fetch(for_a.run().await));
    assert!(ac.ranked().is_empty());
    assert!(ac.session().unwrap().is_fetching());

    assert!(ac.complete_fetch(for_ab.run().await));
    assert_eq!(labels(ac.ranked()), vec!["Abbot"]);
}

#[tokio::test]
async fn test_result_after_close_is_discarded() {
    let observer = Arc::new(RecordingObserver::default());
    let fetcher = TableFetcher::new(&[("", &["Foo"])]);
    let mut ac = AutoComplete::builder(MemoryHost::with_text("#"), StaticSource::default())
        .fetcher(fetcher)
        .observer(observer.clone())
        .build()
        .unwrap();

    let request = ac.open(0).into_fetch().unwrap();
    ac.close(None);

    assert!(!ac.complete_fetch(request.run().await));
    assert!(!ac.is_open());
    assert!(ac.ranked().is_empty());
    assert_eq!(
        observer.events(),
        vec!["open", "started:", "close:none", "finished::ok"]
    );
}

#[tokio::test]
async fn test_fetch_failure_still_renders_sync_candidates() {
    let observer = Arc::new(RecordingObserver::default());
    let mut ac = AutoComplete::builder(
        MemoryHost::with_text("#na"),
        StaticSource::new(candidates(&["Name", "Email"])),
    )
    .fetcher(FailingFetcher)
    .observer(observer.clone())
    .build()
    .unwrap();

    let request = ac.open(0).into_fetch().unwrap();
    assert!(ac.complete_fetch(request.run().await));

    assert_eq!(labels(ac.ranked()), vec!["Name"]);
    assert!(observer.events().contains(&"finished:na:err".to_string()));
}

#[tokio::test]
async fn test_fetcher_receives_raw_query() {
    let fetcher = TableFetcher::new(&[]);
    let mut ac = AutoComplete::builder(MemoryHost::with_text("#EmA"), StaticSource::default())
        .fetcher(fetcher.clone())
        .build()
        .unwrap();

    let request = ac.open(0).into_fetch().unwrap();
    assert_eq!(request.query(), "EmA");
    request.run().await;

    assert_eq!(fetcher.calls(), vec!["EmA"]);
    assert_eq!(ac.session().unwrap().normalized_query(), "ema");
}

#[test]
fn test_min_fetch_query_len_gates_fetch() {
    let config = AutoCompleteConfig {
        min_fetch_query_len: 2,
        ..AutoCompleteConfig::default()
    };
    let mut ac = AutoComplete::builder(
        MemoryHost::with_text("#"),
        StaticSource::new(candidates(&["Abbot", "Alpha"])),
    )
    .config(config)
    .fetcher(TableFetcher::new(&[]))
    .build()
    .unwrap();

    assert!(ac.open(0).into_fetch().is_none());
    assert_eq!(labels(ac.ranked()), vec!["Abbot", "Alpha"]);

    ac.host_mut().type_text("a");
    assert!(ac.refresh().is_none());

    ac.host_mut().type_text("b");
    let request = ac.refresh().unwrap();
    assert_eq!(request.query(), "ab");
}

#[tokio::test]
async fn test_duplicate_fetched_labels_are_merged_once() {
    let fetcher = TableFetcher::new(&[("", &["Foo", "Bar", "Bar"])]);
    let mut ac = AutoComplete::builder(MemoryHost::with_text("#"), StaticSource::new(candidates(&["Foo"])))
        .fetcher(fetcher)
        .build()
        .unwrap();

    let request = ac.open(0).into_fetch().unwrap();
    ac.complete_fetch(request.run().await);

    assert_eq!(labels(ac.ranked()), vec!["Foo", "Bar"]);
}

#[test]
fn test_source_is_read_on_every_refresh() {
    let universe = Arc::new(Mutex::new(candidates(&["Name"])));
    let reader = Arc::clone(&universe);
    let source = move || reader.lock().unwrap().clone();

    let mut ac = AutoComplete::builder(MemoryHost::with_text("#"), source)
        .build()
        .unwrap();
    ac.open(0);
    assert_eq!(labels(ac.ranked()), vec!["Name"]);

    universe.lock().unwrap().push(Candidate::labelled("Nickname"));
    ac.refresh();
    assert_eq!(labels(ac.ranked()), vec!["Name", "Nickname"]);
}

#[tokio::test]
async fn test_observer_lifecycle_on_commit() {
    let observer = Arc::new(RecordingObserver::default());
    let fetcher = TableFetcher::new(&[("f", &["Foo"])]);
    let mut ac = AutoComplete::builder(MemoryHost::with_text("#f"), StaticSource::default())
        .fetcher(fetcher)
        .observer(observer.clone())
        .build()
        .unwrap();

    let request = ac.open(0).into_fetch().unwrap();
    ac.complete_fetch(request.run().await);
    assert!(ac.handle_editor_key(NavKey::Enter));

    assert_eq!(
        observer.events(),
        vec!["open", "started:f", "finished:f:ok", "close:Foo"]
    );
}

#[test]
fn test_container_mirrors_list() {
    let container = RecordingContainer::default();
    let mut ac = AutoComplete::builder(
        MemoryHost::with_text("Hi "),
        StaticSource::new(candidates(&["Name", "Email"])),
    )
    .container(container.clone())
    .build()
    .unwrap();

    ac.on_trigger_key(Selection::caret(3));
    assert_eq!(
        *container.placement.lock().unwrap(),
        Some(ListPlacement { left: 24.0, top: 18.0 })
    );

    ac.host_mut().type_text("em");
    ac.on_document_change();
    assert_eq!(
        *container.renders.lock().unwrap(),
        vec![vec!["Name".to_string(), "Email".to_string()], vec!["Email".to_string()]]
    );

    ac.handle_editor_key(NavKey::Escape);
    assert_eq!(*container.hides.lock().unwrap(), 1);
    assert_eq!(ac.host().plain_text(), "Hi ");
}

#[test]
fn test_trigger_replaces_selected_text() {
    let mut ac = AutoComplete::builder(
        MemoryHost::with_text("Hello world"),
        StaticSource::new(candidates(&["Name"])),
    )
    .build()
    .unwrap();

    ac.on_trigger_key(Selection::new(6, 5));

    assert_eq!(ac.host().plain_text(), "Hello #");
    assert_eq!(ac.host().caret_position(), Some(7));
    assert_eq!(ac.session().unwrap().trigger_offset(), 6);
}

#[test]
fn test_commit_uses_caret_at_close_time() {
    let mut ac = AutoComplete::builder(
        MemoryHost::with_text("#"),
        StaticSource::new(vec![Candidate::new("Name", json!({ "field": "name" }))]),
    )
    .build()
    .unwrap();
    ac.open(0);

    // typed but not yet refreshed
    ac.host_mut().type_text("nam");
    ac.close(Some(Candidate::new("Name", json!({ "field": "name" }))));

    assert_eq!(ac.host().len(), 1);
    assert_eq!(ac.host().embeds(), vec![&json!({ "field": "name" })]);
    assert_eq!(ac.host().history()[0].deleted_len(), 4);
}

#[test]
fn test_custom_trigger_character() {
    let config = AutoCompleteConfig {
        trigger_character: '@',
        ..AutoCompleteConfig::default()
    };
    let mut ac = AutoComplete::builder(MemoryHost::new(), StaticSource::default())
        .config(config)
        .build()
        .unwrap();

    ac.on_trigger_key(Selection::caret(0));
    assert_eq!(ac.host().plain_text(), "@");
}

#[test]
fn test_builder_rejects_invalid_config() {
    let config = AutoCompleteConfig {
        trigger_character: '\n',
        ..AutoCompleteConfig::default()
    };
    let result = AutoComplete::builder(MemoryHost::new(), StaticSource::default())
        .config(config)
        .build();

    assert!(matches!(result, Err(SuggestError::ConfigError(_))));
}
