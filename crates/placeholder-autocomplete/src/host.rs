//! Host editor interface
//!
//! The autocomplete never owns the document. It reads the caret and text
//! through [`EditorHost`], writes through whole [`Transaction`]s, and asks the
//! host to route change notifications while a session is open.
//!
//! [`MemoryHost`] is a small in-memory document implementing the trait. It is
//! what the test suites drive and doubles as a reference for embedders.

use crate::commit::{EditOp, Transaction};
use crate::types::Bounds;
use std::collections::HashMap;

/// Embedded tokens show up as this character in [`EditorHost::text`]
pub const OBJECT_REPLACEMENT: char = '\u{FFFC}';

/// Notifications a session subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostEvent {
    /// Every document mutation
    DocumentChange,
    /// The next selection change only; the host drops it after firing once
    SelectionChangeOnce,
}

/// Handle returned by [`EditorHost::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Document model the autocomplete is attached to
pub trait EditorHost {
    /// Apply an edit as a single undoable step
    fn apply(&mut self, tx: Transaction);

    /// Caret offset, or `None` when the editor has no selection
    fn caret_position(&self) -> Option<usize>;

    /// Text of `len` positions starting at `start`
    fn text(&self, start: usize, len: usize) -> String;

    /// Bounding box of the position at `pos`
    fn bounds(&self, pos: usize) -> Option<Bounds>;

    /// Start routing `event` to the autocomplete
    fn subscribe(&mut self, event: HostEvent) -> SubscriptionId;

    /// Stop routing a previously subscribed event
    fn unsubscribe(&mut self, id: SubscriptionId);

    /// Return keyboard focus to the editable region
    fn focus(&mut self) {}
}

/// A single document position
#[derive(Debug, Clone, PartialEq)]
pub enum DocNode {
    Text { ch: char, mark: Option<String> },
    Embed { kind: String, payload: serde_json::Value },
}

/// In-memory document with caret, subscriptions, and an edit log
#[derive(Debug, Default)]
pub struct MemoryHost {
    nodes: Vec<DocNode>,
    caret: Option<usize>,
    history: Vec<Transaction>,
    subscriptions: HashMap<SubscriptionId, HostEvent>,
    next_subscription: u64,
    focus_requests: usize,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Document holding `text` with the caret at its end
    pub fn with_text(text: &str) -> Self {
        let nodes: Vec<DocNode> = text
            .chars()
            .map(|ch| DocNode::Text { ch, mark: None })
            .collect();
        let caret = Some(nodes.len());
        Self {
            nodes,
            caret,
            ..Self::default()
        }
    }

    /// Insert `text` at the caret as user typing
    pub fn type_text(&mut self, text: &str) {
        let mut caret = self.caret.unwrap_or(self.nodes.len()).min(self.nodes.len());
        for ch in text.chars() {
            self.nodes.insert(caret, DocNode::Text { ch, mark: None });
            caret += 1;
        }
        self.caret = Some(caret);
    }

    /// Delete the position before the caret
    pub fn backspace(&mut self) {
        if let Some(caret) = self.caret {
            if caret > 0 && caret <= self.nodes.len() {
                self.nodes.remove(caret - 1);
                self.caret = Some(caret - 1);
            }
        }
    }

    pub fn set_caret(&mut self, caret: Option<usize>) {
        self.caret = caret.map(|c| c.min(self.nodes.len()));
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[DocNode] {
        &self.nodes
    }

    /// Whole document with embeds rendered as U+FFFC
    pub fn plain_text(&self) -> String {
        self.text(0, self.nodes.len())
    }

    /// Payloads of every embed in document order
    pub fn embeds(&self) -> Vec<&serde_json::Value> {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                DocNode::Embed { payload, .. } => Some(payload),
                DocNode::Text { .. } => None,
            })
            .collect()
    }

    /// Transactions applied through [`EditorHost::apply`], oldest first
    pub fn history(&self) -> &[Transaction] {
        &self.history
    }

    pub fn is_subscribed(&self, event: HostEvent) -> bool {
        self.subscriptions.values().any(|e| *e == event)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Consume the one-shot selection subscriptions
    ///
    /// Returns `true` when at least one was registered, meaning the
    /// autocomplete should be told about the selection change.
    pub fn fire_selection_change(&mut self) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions
            .retain(|_, event| *event != HostEvent::SelectionChangeOnce);
        self.subscriptions.len() != before
    }

    pub fn focus_requests(&self) -> usize {
        self.focus_requests
    }
}

impl EditorHost for MemoryHost {
    fn apply(&mut self, tx: Transaction) {
        let mut cursor = 0usize;
        for op in &tx.ops {
            match op {
                EditOp::Retain(n) => cursor = (cursor + n).min(self.nodes.len()),
                EditOp::Delete(n) => {
                    let end = (cursor + n).min(self.nodes.len());
                    self.nodes.drain(cursor..end);
                }
                EditOp::InsertText { text, mark } => {
                    for ch in text.chars() {
                        self.nodes.insert(
                            cursor,
                            DocNode::Text {
                                ch,
                                mark: mark.clone(),
                            },
                        );
                        cursor += 1;
                    }
                }
                EditOp::InsertEmbed { kind, payload } => {
                    self.nodes.insert(
                        cursor,
                        DocNode::Embed {
                            kind: kind.clone(),
                            payload: payload.clone(),
                        },
                    );
                    cursor += 1;
                }
            }
        }
        if let Some(caret) = tx.caret {
            self.caret = Some(caret.min(self.nodes.len()));
        }
        self.history.push(tx);
    }

    fn caret_position(&self) -> Option<usize> {
        self.caret
    }

    fn text(&self, start: usize, len: usize) -> String {
        self.nodes
            .iter()
            .skip(start)
            .take(len)
            .map(|node| match node {
                DocNode::Text { ch, .. } => *ch,
                DocNode::Embed { .. } => OBJECT_REPLACEMENT,
            })
            .collect()
    }

    fn bounds(&self, pos: usize) -> Option<Bounds> {
        if pos > self.nodes.len() {
            return None;
        }
        // fixed-width cells, one line
        Some(Bounds::new(pos as f32 * 8.0, 0.0, 16.0))
    }

    fn subscribe(&mut self, event: HostEvent) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.subscriptions.insert(id, event);
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscriptions.remove(&id);
    }

    fn focus(&mut self) {
        self.focus_requests += 1;
    }
}
