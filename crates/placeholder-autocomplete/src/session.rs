//! Query session state machine
//!
//! [`AutoComplete`] is attached to one editor and owns at most one
//! [`QuerySession`] at a time. A session opens when the trigger character is
//! accepted, follows the typed query on every document change, and closes on
//! commit or cancel by applying a single transaction to the host.
//!
//! # Refresh
//!
//! Every refresh re-derives the query from the fixed trigger offset and the
//! live caret, so duplicate or out-of-order change notifications cannot drift
//! the state. Each refresh bumps a generation counter; asynchronous fetches
//! carry the generation they were started under and their results are dropped
//! unless it is still current.
//!
//! # Async fetches
//!
//! [`AutoComplete::refresh`] never awaits. When a fetcher is configured it
//! returns a [`FetchRequest`] that owns everything it needs; the caller awaits
//! [`FetchRequest::run`] without holding the session and hands the
//! [`FetchOutcome`] back to [`AutoComplete::complete_fetch`]. The
//! [`crate::driver`] module wires this up on a tokio event loop.

use crate::commit::CommitEngine;
use crate::config::{AutoCompleteConfig, ConfigLoader, FetchMode};
use crate::error::SuggestResult;
use crate::host::{EditorHost, HostEvent, SubscriptionId};
use crate::list::{ListAction, ListContainer, ListPlacement, NavKey, SuggestionList};
use crate::observer::SessionObserver;
use crate::source::{CandidateFetcher, CandidatePool, CandidateSource};
use crate::types::{Candidate, Selection};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Whether a query session is in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Closed,
    Open,
}

/// Synchronous candidates waiting for an asynchronous fetch to merge into
#[derive(Debug)]
struct PendingMerge {
    generation: u64,
    pool: CandidatePool,
}

/// State of one open query
#[derive(Debug)]
pub struct QuerySession {
    trigger_offset: usize,
    raw_query: String,
    normalized_query: String,
    ranked: Vec<Candidate>,
    document_watch: Option<SubscriptionId>,
    selection_watch: Option<SubscriptionId>,
    pending: Option<PendingMerge>,
}

impl QuerySession {
    fn new(
        trigger_offset: usize,
        document_watch: SubscriptionId,
        selection_watch: SubscriptionId,
    ) -> Self {
        Self {
            trigger_offset,
            raw_query: String::new(),
            normalized_query: String::new(),
            ranked: Vec::new(),
            document_watch: Some(document_watch),
            selection_watch: Some(selection_watch),
            pending: None,
        }
    }

    /// Document offset of the trigger character, fixed for the session
    pub fn trigger_offset(&self) -> usize {
        self.trigger_offset
    }

    /// Query text as typed
    pub fn raw_query(&self) -> &str {
        &self.raw_query
    }

    /// Lower-cased query used for matching
    pub fn normalized_query(&self) -> &str {
        &self.normalized_query
    }

    pub fn ranked(&self) -> &[Candidate] {
        &self.ranked
    }

    /// Whether an asynchronous fetch for the current query is outstanding
    pub fn is_fetching(&self) -> bool {
        self.pending.is_some()
    }
}

/// An asynchronous fetch detached from the session
pub struct FetchRequest {
    generation: u64,
    query: String,
    fetcher: Arc<dyn CandidateFetcher>,
}

impl FetchRequest {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Raw query the fetcher is called with
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Call the fetcher and tag its result with this request's generation
    pub async fn run(self) -> FetchOutcome {
        let result = self.fetcher.fetch(&self.query).await;
        FetchOutcome {
            generation: self.generation,
            query: self.query,
            result,
        }
    }
}

impl fmt::Debug for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchRequest")
            .field("generation", &self.generation)
            .field("query", &self.query)
            .finish()
    }
}

/// Result of a [`FetchRequest`]
#[derive(Debug)]
pub struct FetchOutcome {
    pub generation: u64,
    pub query: String,
    pub result: SuggestResult<Vec<Candidate>>,
}

/// Result of trying to open a session
#[derive(Debug)]
pub enum OpenOutcome {
    /// A new session was opened; its first refresh may need a fetch
    Opened(Option<FetchRequest>),
    /// A session was already open and nothing changed
    ///
    /// The key that asked for it should still be swallowed.
    AlreadyOpen,
}

impl OpenOutcome {
    pub fn is_opened(&self) -> bool {
        matches!(self, OpenOutcome::Opened(_))
    }

    pub fn into_fetch(self) -> Option<FetchRequest> {
        match self {
            OpenOutcome::Opened(fetch) => fetch,
            OpenOutcome::AlreadyOpen => None,
        }
    }
}

/// Builder for [`AutoComplete`]
pub struct AutoCompleteBuilder<H: EditorHost> {
    host: H,
    source: Arc<dyn CandidateSource>,
    config: AutoCompleteConfig,
    fetcher: Option<Arc<dyn CandidateFetcher>>,
    observers: Vec<Arc<dyn SessionObserver>>,
    container: Option<Box<dyn ListContainer>>,
}

impl<H: EditorHost> AutoCompleteBuilder<H> {
    pub fn new(host: H, source: impl CandidateSource + 'static) -> Self {
        Self {
            host,
            source: Arc::new(source),
            config: AutoCompleteConfig::default(),
            fetcher: None,
            observers: Vec::new(),
            container: None,
        }
    }

    pub fn config(mut self, config: AutoCompleteConfig) -> Self {
        self.config = config;
        self
    }

    /// Asynchronous candidates keyed by the typed query
    pub fn fetcher(mut self, fetcher: impl CandidateFetcher + 'static) -> Self {
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    pub fn observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// External render target mirroring the list
    pub fn container(mut self, container: impl ListContainer + 'static) -> Self {
        self.container = Some(Box::new(container));
        self
    }

    /// Validate the configuration and build
    pub fn build(self) -> SuggestResult<AutoComplete<H>> {
        ConfigLoader::validate_config(&self.config)?;
        Ok(AutoComplete {
            host: self.host,
            config: self.config,
            source: self.source,
            fetcher: self.fetcher,
            observers: self.observers,
            list: SuggestionList::new(),
            container: self.container,
            session: None,
            generation: 0,
        })
    }
}

/// Session manager attached to a single editor
pub struct AutoComplete<H: EditorHost> {
    host: H,
    config: AutoCompleteConfig,
    source: Arc<dyn CandidateSource>,
    fetcher: Option<Arc<dyn CandidateFetcher>>,
    observers: Vec<Arc<dyn SessionObserver>>,
    list: SuggestionList,
    container: Option<Box<dyn ListContainer>>,
    session: Option<QuerySession>,
    generation: u64,
}

impl<H: EditorHost> AutoComplete<H> {
    pub fn builder(host: H, source: impl CandidateSource + 'static) -> AutoCompleteBuilder<H> {
        AutoCompleteBuilder::new(host, source)
    }

    pub fn state(&self) -> SessionState {
        if self.session.is_some() {
            SessionState::Open
        } else {
            SessionState::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&QuerySession> {
        self.session.as_ref()
    }

    /// Ranked candidates of the open session, empty when closed
    pub fn ranked(&self) -> &[Candidate] {
        self.session.as_ref().map_or(&[], |s| s.ranked())
    }

    /// Current refresh generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> &AutoCompleteConfig {
        &self.config
    }

    pub fn list(&self) -> &SuggestionList {
        &self.list
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    /// Insert the trigger over `selection` and open a session on it
    ///
    /// Does nothing to the document when a session is already open.
    pub fn on_trigger_key(&mut self, selection: Selection) -> OpenOutcome {
        if self.is_open() {
            debug!("Trigger key ignored, session already open");
            return OpenOutcome::AlreadyOpen;
        }

        self.host.apply(CommitEngine::insert_trigger(
            selection,
            self.config.trigger_character,
        ));

        if let Some(bounds) = self.host.bounds(selection.index) {
            let placement = ListPlacement::below(bounds, self.config.list_offset);
            self.list.place(placement);
            if let Some(container) = self.container.as_mut() {
                container.place(placement);
            }
        }

        self.open(selection.index)
    }

    /// Open a session anchored on the trigger at `trigger_offset`
    pub fn open(&mut self, trigger_offset: usize) -> OpenOutcome {
        if self.is_open() {
            debug!(trigger_offset, "Session already open, ignoring");
            return OpenOutcome::AlreadyOpen;
        }

        let document_watch = self.host.subscribe(HostEvent::DocumentChange);
        let selection_watch = self.host.subscribe(HostEvent::SelectionChangeOnce);
        self.session = Some(QuerySession::new(
            trigger_offset,
            document_watch,
            selection_watch,
        ));
        info!(trigger_offset, "Opened placeholder session");

        for observer in &self.observers {
            observer.on_open();
        }

        OpenOutcome::Opened(self.refresh())
    }

    /// Document changed while subscribed
    pub fn on_document_change(&mut self) -> Option<FetchRequest> {
        let subscribed = self
            .session
            .as_ref()
            .is_some_and(|s| s.document_watch.is_some());
        if subscribed {
            self.refresh()
        } else {
            None
        }
    }

    /// Selection changed; only the first change after opening is observed
    pub fn on_selection_change(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.selection_watch.take().is_none() {
            return;
        }
        self.focus_lost();
    }

    /// Re-derive the query from the caret and re-rank
    ///
    /// Closes the session when the editor has no caret or the caret sits at
    /// or before the trigger. Returns a fetch request when the fetcher should
    /// be consulted for this query.
    pub fn refresh(&mut self) -> Option<FetchRequest> {
        let trigger_offset = self.session.as_ref()?.trigger_offset;
        self.generation += 1;
        let generation = self.generation;

        let Some(caret) = self.host.caret_position() else {
            debug!("Editor has no selection, closing session");
            self.close(None);
            return None;
        };

        if caret <= trigger_offset {
            debug!(caret, trigger_offset, "Trigger removed, closing session");
            self.finish(None, None);
            return None;
        }

        let raw_query = self.host.text(trigger_offset + 1, caret - trigger_offset - 1);
        let normalized_query = raw_query.to_lowercase();
        let mut pool = CandidatePool::build(self.source.candidates(), self.config.min_match_score);
        let request = self.fetch_request(&raw_query, generation);

        debug!(
            generation,
            query = %raw_query,
            candidates = pool.len(),
            fetching = request.is_some(),
            "Refreshing session"
        );

        let session = self.session.as_mut()?;
        session.raw_query = raw_query;
        session.normalized_query = normalized_query.clone();
        session.pending = None;

        let Some(request) = request else {
            let ranked = pool.rank(&normalized_query);
            self.present(ranked);
            return None;
        };

        for observer in &self.observers {
            observer.on_fetch_started(request.query());
        }

        if self.config.fetch_mode == FetchMode::Eager {
            let ranked = pool.rank(&normalized_query);
            self.present(ranked);
        }

        if let Some(session) = self.session.as_mut() {
            session.pending = Some(PendingMerge { generation, pool });
        }
        Some(request)
    }

    fn fetch_request(&self, raw_query: &str, generation: u64) -> Option<FetchRequest> {
        let fetcher = self.fetcher.as_ref()?;
        if raw_query.chars().count() < self.config.min_fetch_query_len {
            return None;
        }
        Some(FetchRequest {
            generation,
            query: raw_query.to_string(),
            fetcher: Arc::clone(fetcher),
        })
    }

    /// Merge an asynchronous result if it belongs to the current refresh
    ///
    /// Returns `false` when the result was stale and discarded. Observers are
    /// told the fetch finished either way. A failed fetch still renders the
    /// synchronous candidates.
    pub fn complete_fetch(&mut self, outcome: FetchOutcome) -> bool {
        let FetchOutcome {
            generation,
            query,
            result,
        } = outcome;

        for observer in &self.observers {
            observer.on_fetch_finished(&query, result.as_ref().map(|c| c.as_slice()));
        }

        if generation != self.generation {
            debug!(
                generation,
                current = self.generation,
                query = %query,
                "Discarding stale fetch result"
            );
            return false;
        }

        let Some(session) = self.session.as_mut() else {
            return false;
        };
        match session.pending.as_ref() {
            Some(pending) if pending.generation == generation => {}
            Some(pending) => {
                debug!(
                    generation,
                    pending = pending.generation,
                    "Fetch result does not belong to the pending merge"
                );
                return false;
            }
            None => return false,
        }
        let Some(PendingMerge { mut pool, .. }) = session.pending.take() else {
            return false;
        };

        match result {
            Ok(fetched) => {
                let added = pool.merge(fetched);
                debug!(added, query = %query, "Merged fetched candidates");
            }
            Err(e) => warn!("Candidate fetch for {:?} failed: {}", query, e),
        }

        let ranked = pool.rank(&session.normalized_query);
        self.present(ranked);
        true
    }

    fn present(&mut self, ranked: Vec<Candidate>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        self.list.render(&ranked, &session.normalized_query);
        session.ranked = ranked;
        if let Some(container) = self.container.as_mut() {
            container.render(self.list.entries());
        }
    }

    /// Selection left both the editor and the list
    pub fn focus_lost(&mut self) {
        if !self.is_open() {
            return;
        }
        if self.list.has_focus() {
            debug!("Focus moved into the suggestion list, keeping session");
            return;
        }
        self.close(None);
    }

    pub fn select_candidate(&mut self, candidate: Option<Candidate>) {
        self.close(candidate);
    }

    /// Close the session, committing `chosen` in place of the query
    ///
    /// The span removed is measured from the caret at the time of closing, not
    /// from the last refresh. Closing a closed session does nothing.
    pub fn close(&mut self, chosen: Option<Candidate>) {
        let Some(session) = self.session.as_ref() else {
            debug!("Close on closed session ignored");
            return;
        };

        let query_len = match self.host.caret_position() {
            Some(caret) if caret > session.trigger_offset => {
                Some(caret - session.trigger_offset - 1)
            }
            Some(_) => None,
            None => Some(session.raw_query.chars().count()),
        };

        if query_len.is_none() && chosen.is_some() {
            warn!("Trigger is gone, dropping selected placeholder");
        }
        let chosen = chosen.filter(|_| query_len.is_some());
        self.finish(chosen, query_len);
    }

    /// Tear the session down; `query_len` of `None` leaves the document alone
    fn finish(&mut self, chosen: Option<Candidate>, query_len: Option<usize>) {
        let Some(session) = self.session.take() else {
            return;
        };

        for id in [session.document_watch, session.selection_watch]
            .into_iter()
            .flatten()
        {
            self.host.unsubscribe(id);
        }

        if let Some(query_len) = query_len {
            self.host.apply(CommitEngine::commit(
                session.trigger_offset,
                query_len,
                chosen.as_ref(),
            ));
        }

        self.list.hide();
        if let Some(container) = self.container.as_mut() {
            container.hide();
        }
        self.host.focus();
        self.generation += 1;

        info!(
            trigger_offset = session.trigger_offset,
            chosen = chosen.as_ref().map(|c| c.label.as_str()),
            "Closed placeholder session"
        );

        for observer in &self.observers {
            observer.on_close(chosen.as_ref());
        }
    }

    /// Key pressed in the editor while the list does not hold focus
    ///
    /// Enter commits the top-ranked candidate, Down moves focus into the list,
    /// Escape cancels. Returns `true` when the key was consumed.
    pub fn handle_editor_key(&mut self, key: NavKey) -> bool {
        if !self.is_open() {
            return false;
        }

        match key {
            NavKey::Enter => {
                let top = self.ranked().first().cloned();
                self.close(top);
                true
            }
            NavKey::Down => {
                let focused = self.list.focus_first();
                if let Some(container) = self.container.as_mut() {
                    container.focus(focused);
                }
                true
            }
            NavKey::Escape => {
                self.close(None);
                true
            }
            _ => false,
        }
    }

    /// Key pressed while an entry of the list holds focus
    pub fn handle_list_key(&mut self, key: NavKey) -> bool {
        if !self.is_open() {
            return false;
        }

        match self.list.handle_key(key) {
            ListAction::Select(candidate) => {
                self.select_candidate(Some(candidate));
                true
            }
            ListAction::Cancel => {
                self.select_candidate(None);
                true
            }
            ListAction::Focus(index) => {
                if let Some(container) = self.container.as_mut() {
                    container.focus(Some(index));
                }
                true
            }
            ListAction::Ignored => false,
        }
    }

    /// Pointer pressed on entry `index`
    pub fn pointer_down(&mut self, index: usize) -> bool {
        if !self.is_open() {
            return false;
        }
        match self.list.activate(index) {
            Some(candidate) => {
                self.select_candidate(Some(candidate));
                true
            }
            None => false,
        }
    }
}
