/// Core data types shared across the autocomplete modules
use serde::{Deserialize, Serialize};
use std::fmt;

/// A labelled suggestion carrying opaque data back to the host on commit
///
/// The label is both the fuzzy-match key and the display text. The payload is
/// never inspected by the autocomplete; it travels untouched into the embed
/// inserted on selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Match key and display text
    pub label: String,
    /// Data handed to the host when this candidate is committed
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Candidate {
    pub fn new(label: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            label: label.into(),
            payload,
        }
    }

    /// Candidate with a `null` payload
    pub fn labelled(label: impl Into<String>) -> Self {
        Self::new(label, serde_json::Value::Null)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// Document selection as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    /// Start of the selection
    pub index: usize,
    /// Selected length, zero for a collapsed caret
    pub length: usize,
}

impl Selection {
    pub fn new(index: usize, length: usize) -> Self {
        Self { index, length }
    }

    /// Collapsed selection at `index`
    pub fn caret(index: usize) -> Self {
        Self::new(index, 0)
    }

    pub fn is_collapsed(&self) -> bool {
        self.length == 0
    }
}

/// Bounding box of a document position, used to place the floating list
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub left: f32,
    pub top: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(left: f32, top: f32, height: f32) -> Self {
        Self { left, top, height }
    }
}

/// Origin tag attached to every edit the autocomplete applies
///
/// Hosts use it to tell autocomplete-internal edits apart from user typing in
/// their own change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditSource {
    /// Edit stands for a user action and belongs in undo history
    #[default]
    User,
    /// Programmatic edit
    Api,
}

impl fmt::Display for EditSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditSource::User => write!(f, "user"),
            EditSource::Api => write!(f, "api"),
        }
    }
}
