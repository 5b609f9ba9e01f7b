//! Document edits produced by the autocomplete
//!
//! Every change the autocomplete makes to the host document is expressed as a
//! single [`Transaction`] so the host can apply it atomically and record it as
//! one undo step.

use crate::types::{Candidate, EditSource, Selection};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Embed kind inserted when a candidate is committed
pub const PLACEHOLDER_EMBED: &str = "placeholder";

/// Mark applied to the inserted trigger character while a session is open
pub const SUGGEST_MARK: &str = "suggest";

/// One operation of a transaction, applied left to right from offset zero
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditOp {
    /// Skip over `n` positions
    Retain(usize),
    /// Remove `n` positions at the cursor
    Delete(usize),
    /// Insert text at the cursor, optionally marked
    InsertText { text: String, mark: Option<String> },
    /// Insert a single embedded token at the cursor
    InsertEmbed {
        kind: String,
        payload: serde_json::Value,
    },
}

/// An atomic edit plus the caret position that follows it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub ops: Vec<EditOp>,
    /// Caret after the edit, if it should move
    pub caret: Option<usize>,
    pub source: EditSource,
}

impl Transaction {
    pub fn new(source: EditSource) -> Self {
        Self {
            ops: Vec::new(),
            caret: None,
            source,
        }
    }

    pub fn retain(mut self, n: usize) -> Self {
        if n > 0 {
            self.ops.push(EditOp::Retain(n));
        }
        self
    }

    pub fn delete(mut self, n: usize) -> Self {
        if n > 0 {
            self.ops.push(EditOp::Delete(n));
        }
        self
    }

    pub fn insert_text(mut self, text: impl Into<String>, mark: Option<&str>) -> Self {
        self.ops.push(EditOp::InsertText {
            text: text.into(),
            mark: mark.map(str::to_string),
        });
        self
    }

    pub fn insert_embed(mut self, kind: impl Into<String>, payload: serde_json::Value) -> Self {
        self.ops.push(EditOp::InsertEmbed {
            kind: kind.into(),
            payload,
        });
        self
    }

    pub fn with_caret(mut self, caret: usize) -> Self {
        self.caret = Some(caret);
        self
    }

    /// Total number of positions removed
    pub fn deleted_len(&self) -> usize {
        self.ops
            .iter()
            .map(|op| match op {
                EditOp::Delete(n) => *n,
                _ => 0,
            })
            .sum()
    }

    /// Number of embeds inserted
    pub fn embed_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, EditOp::InsertEmbed { .. }))
            .count()
    }
}

/// Builds the edits that bracket a query session
pub struct CommitEngine;

impl CommitEngine {
    /// Replace the trigger and typed query with the chosen candidate
    ///
    /// Deletes `query_len + 1` positions at `trigger_offset` (the extra one is
    /// the trigger itself), then embeds the candidate's payload in their place.
    /// The caret lands right after the embed, or on the trigger offset when no
    /// candidate was chosen.
    pub fn commit(
        trigger_offset: usize,
        query_len: usize,
        candidate: Option<&Candidate>,
    ) -> Transaction {
        let tx = Transaction::new(EditSource::User)
            .retain(trigger_offset)
            .delete(query_len + 1);

        match candidate {
            Some(candidate) => {
                debug!(
                    label = %candidate.label,
                    trigger_offset, query_len, "Committing placeholder"
                );
                tx.insert_embed(PLACEHOLDER_EMBED, candidate.payload.clone())
                    .with_caret(trigger_offset + 1)
            }
            None => {
                debug!(trigger_offset, query_len, "Removing cancelled query");
                tx.with_caret(trigger_offset)
            }
        }
    }

    /// Insert the trigger character over the current selection
    ///
    /// The trigger is marked so the host can style the pending query, and the
    /// caret moves silently past it.
    pub fn insert_trigger(selection: Selection, trigger: char) -> Transaction {
        Transaction::new(EditSource::Api)
            .retain(selection.index)
            .delete(selection.length)
            .insert_text(trigger.to_string(), Some(SUGGEST_MARK))
            .with_caret(selection.index + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_commit_with_candidate() {
        let candidate = Candidate::new("Name", json!({ "id": 1 }));
        let tx = CommitEngine::commit(10, 2, Some(&candidate));

        assert_eq!(
            tx.ops,
            vec![
                EditOp::Retain(10),
                EditOp::Delete(3),
                EditOp::InsertEmbed {
                    kind: PLACEHOLDER_EMBED.to_string(),
                    payload: json!({ "id": 1 }),
                },
            ]
        );
        assert_eq!(tx.caret, Some(11));
        assert_eq!(tx.source, EditSource::User);
    }

    #[test]
    fn test_commit_cancel_removes_span_only() {
        let tx = CommitEngine::commit(10, 2, None);

        assert_eq!(tx.ops, vec![EditOp::Retain(10), EditOp::Delete(3)]);
        assert_eq!(tx.caret, Some(10));
        assert_eq!(tx.embed_count(), 0);
    }

    #[test]
    fn test_commit_at_document_start_skips_retain() {
        let tx = CommitEngine::commit(0, 0, None);
        assert_eq!(tx.ops, vec![EditOp::Delete(1)]);
    }

    #[test]
    fn test_insert_trigger_replaces_selection() {
        let tx = CommitEngine::insert_trigger(Selection::new(4, 3), '#');

        assert_eq!(
            tx.ops,
            vec![
                EditOp::Retain(4),
                EditOp::Delete(3),
                EditOp::InsertText {
                    text: "#".to_string(),
                    mark: Some(SUGGEST_MARK.to_string()),
                },
            ]
        );
        assert_eq!(tx.caret, Some(5));
    }

    #[test]
    fn test_insert_trigger_collapsed_selection() {
        let tx = CommitEngine::insert_trigger(Selection::caret(0), '@');
        assert_eq!(tx.deleted_len(), 0);
        assert_eq!(tx.caret, Some(1));
    }
}
