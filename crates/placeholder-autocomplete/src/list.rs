//! Suggestion list state and navigation
//!
//! [`SuggestionList`] holds the rendered entries and the focused index. It knows
//! nothing about the document: key presses and pointer activation turn into
//! [`ListAction`]s that the session manager resolves into a commit or a cancel.
//!
//! Rendering targets plug in through [`ListContainer`]; the ratatui widget in
//! [`crate::widget`] draws the list state directly.

use crate::types::{Bounds, Candidate};
use regex::RegexBuilder;
use tracing::warn;

/// Whether a label segment matched the query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Matched,
    Unmatched,
}

/// A contiguous piece of a label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSegment {
    pub text: String,
    pub kind: SegmentKind,
}

impl LabelSegment {
    fn new(text: &str, kind: SegmentKind) -> Self {
        Self {
            text: text.to_string(),
            kind,
        }
    }
}

/// Split `label` into `(prefix)(query)(suffix)` for highlighting
///
/// Matching is case-insensitive and uses `^(.*)(query)(.*)$`, so with several
/// occurrences the greedy prefix picks the last one. When the query is not a
/// contiguous substring the whole label is a single unmatched segment. Empty
/// segments are dropped.
pub fn split_label(label: &str, query: &str) -> Vec<LabelSegment> {
    let unmatched = || vec![LabelSegment::new(label, SegmentKind::Unmatched)];

    if query.is_empty() || label.is_empty() {
        return if label.is_empty() { Vec::new() } else { unmatched() };
    }

    let pattern = format!("^(.*)({})(.*)$", regex::escape(query));
    let regex = match RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
    {
        Ok(regex) => regex,
        Err(e) => {
            warn!("Failed to build highlight pattern for {:?}: {}", query, e);
            return unmatched();
        }
    };

    let Some(caps) = regex.captures(label) else {
        return unmatched();
    };

    [
        (1, SegmentKind::Unmatched),
        (2, SegmentKind::Matched),
        (3, SegmentKind::Unmatched),
    ]
    .into_iter()
    .filter_map(|(group, kind)| {
        caps.get(group)
            .map(|m| m.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| LabelSegment::new(s, kind))
    })
    .collect()
}

/// One rendered row of the list
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    pub candidate: Candidate,
    pub segments: Vec<LabelSegment>,
}

impl ListEntry {
    pub fn new(candidate: Candidate, query: &str) -> Self {
        let segments = split_label(&candidate.label, query);
        Self {
            candidate,
            segments,
        }
    }

    /// The matched part of the label, if any
    pub fn matched_text(&self) -> Option<&str> {
        self.segments
            .iter()
            .find(|s| s.kind == SegmentKind::Matched)
            .map(|s| s.text.as_str())
    }
}

/// Where the floating list is anchored, just below the trigger character
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ListPlacement {
    pub left: f32,
    pub top: f32,
}

impl ListPlacement {
    /// Place below `bounds`, leaving `offset` extra space
    pub fn below(bounds: Bounds, offset: f32) -> Self {
        Self {
            left: bounds.left,
            top: bounds.top + bounds.height + offset,
        }
    }
}

/// Keys the list and the editor react to while a session is open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Up,
    Down,
    Enter,
    Space,
    Tab,
    Escape,
    Other,
}

impl NavKey {
    /// Keys that commit the focused entry
    pub fn is_confirm(&self) -> bool {
        matches!(self, NavKey::Enter | NavKey::Space | NavKey::Tab)
    }
}

/// Outcome of a key press or pointer event on the list
#[derive(Debug, Clone, PartialEq)]
pub enum ListAction {
    /// Commit this candidate
    Select(Candidate),
    /// Close without committing
    Cancel,
    /// Focus moved to this entry
    Focus(usize),
    /// The event was not for the list
    Ignored,
}

/// Externally supplied render target for the list
///
/// Every render replaces all previous entries; implementations need not keep
/// any per-entry state across calls.
pub trait ListContainer: Send {
    fn render(&mut self, entries: &[ListEntry]);

    fn hide(&mut self);

    fn place(&mut self, _placement: ListPlacement) {}

    fn focus(&mut self, _index: Option<usize>) {}
}

/// Focus-navigable list of ranked candidates
#[derive(Debug, Clone, Default)]
pub struct SuggestionList {
    entries: Vec<ListEntry>,
    focused: Option<usize>,
    visible: bool,
    placement: ListPlacement,
}

impl SuggestionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every entry and show the list
    ///
    /// Focus is dropped: entries from a previous render are gone.
    pub fn render(&mut self, candidates: &[Candidate], query: &str) {
        self.entries = candidates
            .iter()
            .cloned()
            .map(|candidate| ListEntry::new(candidate, query))
            .collect();
        self.focused = None;
        self.visible = true;
    }

    /// Empty and hide the list
    pub fn hide(&mut self) {
        self.entries.clear();
        self.focused = None;
        self.visible = false;
    }

    pub fn place(&mut self, placement: ListPlacement) {
        self.placement = placement;
    }

    pub fn placement(&self) -> ListPlacement {
        self.placement
    }

    pub fn entries(&self) -> &[ListEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn focused(&self) -> Option<usize> {
        self.focused
    }

    /// Whether an entry holds keyboard focus
    pub fn has_focus(&self) -> bool {
        self.focused.is_some()
    }

    /// Focus entry `index`, clamped to the last entry
    pub fn focus(&mut self, index: usize) -> Option<usize> {
        if self.entries.is_empty() {
            self.focused = None;
        } else {
            self.focused = Some(index.min(self.entries.len() - 1));
        }
        self.focused
    }

    pub fn focus_first(&mut self) -> Option<usize> {
        self.focus(0)
    }

    /// Give focus back to the editor
    pub fn blur(&mut self) {
        self.focused = None;
    }

    /// Move focus down one entry, stopping at the last
    pub fn focus_next(&mut self) -> Option<usize> {
        let index = self.focused?;
        self.focus(index + 1)
    }

    /// Move focus up one entry, stopping at the first
    pub fn focus_prev(&mut self) -> Option<usize> {
        let index = self.focused?;
        self.focus(index.saturating_sub(1))
    }

    /// Candidate behind entry `index`
    pub fn activate(&self, index: usize) -> Option<Candidate> {
        self.entries.get(index).map(|e| e.candidate.clone())
    }

    /// React to a key pressed while an entry holds focus
    pub fn handle_key(&mut self, key: NavKey) -> ListAction {
        let Some(index) = self.focused else {
            return ListAction::Ignored;
        };

        match key {
            NavKey::Down => self.focus_next().map_or(ListAction::Ignored, ListAction::Focus),
            NavKey::Up => self.focus_prev().map_or(ListAction::Ignored, ListAction::Focus),
            key if key.is_confirm() => self
                .activate(index)
                .map_or(ListAction::Ignored, ListAction::Select),
            NavKey::Escape => ListAction::Cancel,
            _ => ListAction::Ignored,
        }
    }
}
