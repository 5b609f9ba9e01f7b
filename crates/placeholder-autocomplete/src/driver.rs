//! Async event loop around [`AutoComplete`]
//!
//! [`SessionDriver`] owns the session manager and serializes every editor
//! event through one channel, so no two events ever touch the session at once.
//! Document changes are debounced on the trailing edge; fetches run on spawned
//! tasks and report back through a second channel, where the generation check
//! in [`AutoComplete::complete_fetch`] drops anything a newer refresh
//! superseded.
//!
//! ```rust
//! use placeholder_autocomplete::{
//!     AutoComplete, Candidate, DriverEvent, MemoryHost, Selection, SessionDriver, StaticSource,
//! };
//!
//! # tokio_test::block_on(async {
//! let source = StaticSource::new(vec![Candidate::labelled("Name")]);
//! let autocomplete = AutoComplete::builder(MemoryHost::new(), source).build().unwrap();
//! let (driver, handle) = SessionDriver::new(autocomplete);
//!
//! handle.send(DriverEvent::TriggerKey(Selection::caret(0))).unwrap();
//! handle.shutdown().unwrap();
//!
//! // queued events are processed before the shutdown
//! let autocomplete = driver.run().await;
//! assert!(autocomplete.is_open());
//! assert_eq!(autocomplete.ranked().len(), 1);
//! # });
//! ```

use crate::error::{SuggestError, SuggestResult};
use crate::host::EditorHost;
use crate::list::NavKey;
use crate::session::{AutoComplete, FetchOutcome, FetchRequest};
use crate::types::{Candidate, Selection};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

/// Editor events fed to the driver
#[derive(Debug, Clone, PartialEq)]
pub enum DriverEvent {
    /// The trigger key was pressed over this selection
    TriggerKey(Selection),
    /// The document changed
    DocumentChanged,
    /// The selection changed
    SelectionChanged,
    /// Focus left the editor and the list
    FocusLost,
    /// Key pressed in the editor
    EditorKey(NavKey),
    /// Key pressed on a focused list entry
    ListKey(NavKey),
    /// Pointer pressed on a list entry
    PointerDown(usize),
    /// Close programmatically
    Close(Option<Candidate>),
    /// Stop the loop and hand the session manager back
    Shutdown,
}

/// Cloneable sender side of a [`SessionDriver`]
#[derive(Debug, Clone)]
pub struct DriverHandle {
    tx: mpsc::UnboundedSender<DriverEvent>,
}

impl DriverHandle {
    pub fn send(&self, event: DriverEvent) -> SuggestResult<()> {
        self.tx.send(event).map_err(|_| SuggestError::DriverClosed)
    }

    pub fn shutdown(&self) -> SuggestResult<()> {
        self.send(DriverEvent::Shutdown)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Runs an [`AutoComplete`] on the current tokio runtime
pub struct SessionDriver<H: EditorHost> {
    autocomplete: AutoComplete<H>,
    events: mpsc::UnboundedReceiver<DriverEvent>,
    outcome_tx: mpsc::UnboundedSender<FetchOutcome>,
    outcomes: mpsc::UnboundedReceiver<FetchOutcome>,
    debounce: Duration,
    refresh_at: Option<Instant>,
}

impl<H: EditorHost> SessionDriver<H> {
    pub fn new(autocomplete: AutoComplete<H>) -> (Self, DriverHandle) {
        let (tx, events) = mpsc::unbounded_channel();
        let (outcome_tx, outcomes) = mpsc::unbounded_channel();
        let debounce = autocomplete.config().debounce();

        let driver = Self {
            autocomplete,
            events,
            outcome_tx,
            outcomes,
            debounce,
            refresh_at: None,
        };
        (driver, DriverHandle { tx })
    }

    /// Process events until shutdown or until every handle is dropped
    ///
    /// Returns the session manager in whatever state it was left; an open
    /// session stays open.
    pub async fn run(mut self) -> AutoComplete<H> {
        info!(debounce_ms = self.debounce.as_millis() as u64, "Session driver started");

        loop {
            let refresh_at = self.refresh_at;

            tokio::select! {
                event = self.events.recv() => match event {
                    Some(DriverEvent::Shutdown) | None => break,
                    Some(event) => self.handle_event(event),
                },

                Some(outcome) = self.outcomes.recv() => {
                    self.autocomplete.complete_fetch(outcome);
                }

                _ = sleep_until(refresh_at.unwrap_or_else(Instant::now)), if refresh_at.is_some() => {
                    self.flush_refresh();
                }
            }
        }

        info!("Session driver stopped");
        self.autocomplete
    }

    fn handle_event(&mut self, event: DriverEvent) {
        debug!(?event, "Driver event");

        match event {
            DriverEvent::TriggerKey(selection) => {
                self.refresh_at = None;
                let fetch = self.autocomplete.on_trigger_key(selection).into_fetch();
                self.spawn_fetch(fetch);
            }
            DriverEvent::DocumentChanged => {
                if self.debounce.is_zero() {
                    let fetch = self.autocomplete.on_document_change();
                    self.spawn_fetch(fetch);
                } else if self.autocomplete.is_open() {
                    self.refresh_at = Some(Instant::now() + self.debounce);
                }
            }
            DriverEvent::SelectionChanged => self.autocomplete.on_selection_change(),
            DriverEvent::FocusLost => self.autocomplete.focus_lost(),
            DriverEvent::EditorKey(key) => {
                // commit against the query as typed, not as last debounced
                self.flush_refresh();
                self.autocomplete.handle_editor_key(key);
            }
            DriverEvent::ListKey(key) => {
                self.autocomplete.handle_list_key(key);
            }
            DriverEvent::PointerDown(index) => {
                self.autocomplete.pointer_down(index);
            }
            DriverEvent::Close(chosen) => self.autocomplete.close(chosen),
            DriverEvent::Shutdown => {}
        }

        if !self.autocomplete.is_open() {
            self.refresh_at = None;
        }
    }

    fn flush_refresh(&mut self) {
        if self.refresh_at.take().is_some() {
            let fetch = self.autocomplete.on_document_change();
            self.spawn_fetch(fetch);
        }
    }

    fn spawn_fetch(&self, request: Option<FetchRequest>) {
        let Some(request) = request else {
            return;
        };

        debug!(generation = request.generation(), query = %request.query(), "Spawning fetch");
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let outcome = request.run().await;
            if tx.send(outcome).is_err() {
                debug!("Driver stopped before fetch completed");
            }
        });
    }
}
