//! Session lifecycle callbacks
//!
//! Embedders register observers to learn when the list opens and closes and
//! when an asynchronous fetch starts and finishes. All methods default to
//! no-ops so an observer only implements what it cares about.

use crate::error::SuggestError;
use crate::types::Candidate;

/// Receives session lifecycle notifications
pub trait SessionObserver: Send + Sync {
    /// A session was opened
    fn on_open(&self) {}

    /// The session closed with the committed candidate, or `None` on cancel
    fn on_close(&self, _chosen: Option<&Candidate>) {}

    /// An asynchronous fetch was requested for `query`
    fn on_fetch_started(&self, _query: &str) {}

    /// An asynchronous fetch for `query` resolved
    ///
    /// Called for every fetch that was started, including ones whose result is
    /// discarded because a newer refresh superseded it.
    fn on_fetch_finished(&self, _query: &str, _result: Result<&[Candidate], &SuggestError>) {}
}
