//! Trigger-character placeholder autocomplete for rich-text editors
//!
//! Typing the trigger character (`#` by default) opens a query session. The
//! text typed after the trigger is fuzzy-matched against a synchronous
//! candidate list, optionally merged with asynchronously fetched candidates,
//! and shown in a suggestion list. Choosing an entry replaces the trigger and
//! query with a single `placeholder` embed in one atomic edit.
//!
//! The editor itself is abstracted behind [`EditorHost`]; [`MemoryHost`] is an
//! in-memory implementation used by the tests.
//!
//! # Example
//!
//! ```
//! use placeholder_autocomplete::{AutoComplete, Candidate, MemoryHost, NavKey, Selection, StaticSource};
//!
//! let source = StaticSource::new(vec![
//!     Candidate::labelled("First Name"),
//!     Candidate::labelled("Email"),
//! ]);
//! let mut autocomplete = AutoComplete::builder(MemoryHost::with_text("Dear "), source)
//!     .build()
//!     .unwrap();
//!
//! autocomplete.on_trigger_key(Selection::caret(5));
//! autocomplete.host_mut().type_text("fir");
//! autocomplete.on_document_change();
//! assert_eq!(autocomplete.ranked()[0].label, "First Name");
//!
//! autocomplete.handle_editor_key(NavKey::Enter);
//! assert!(!autocomplete.is_open());
//! assert_eq!(autocomplete.host().plain_text(), "Dear \u{FFFC}");
//! ```

pub mod commit;
pub mod config;
pub mod driver;
pub mod error;
pub mod host;
pub mod list;
pub mod matcher;
pub mod observer;
pub mod session;
pub mod source;
pub mod types;
pub mod widget;

pub use commit::{CommitEngine, EditOp, Transaction, PLACEHOLDER_EMBED, SUGGEST_MARK};
pub use config::{AutoCompleteConfig, ConfigFormat, ConfigLoader, FetchMode};
pub use driver::{DriverEvent, DriverHandle, SessionDriver};
pub use error::{SuggestError, SuggestResult};
pub use host::{DocNode, EditorHost, HostEvent, MemoryHost, SubscriptionId, OBJECT_REPLACEMENT};
pub use list::{
    split_label, LabelSegment, ListAction, ListContainer, ListEntry, ListPlacement, NavKey,
    SegmentKind, SuggestionList,
};
pub use matcher::{FuzzyIndex, ScoredMatch};
pub use observer::SessionObserver;
pub use session::{
    AutoComplete, AutoCompleteBuilder, FetchOutcome, FetchRequest, OpenOutcome, QuerySession,
    SessionState,
};
pub use source::{CandidateFetcher, CandidatePool, CandidateSource, StaticSource};
pub use types::{Bounds, Candidate, EditSource, Selection};
pub use widget::{SuggestionListWidget, SuggestionListWidgetConfig};
