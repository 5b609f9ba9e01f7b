//! Fuzzy label index
//!
//! Wraps nucleo's matcher behind a small index that owns the normalized labels
//! of one candidate pool. Labels can be appended incrementally as asynchronous
//! results arrive; querying returns positions into the label list so callers can
//! map matches back onto their candidates without a second lookup.

use nucleo::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
use nucleo::{Config, Matcher, Utf32Str};
use std::fmt;

/// One label that met the similarity floor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredMatch {
    /// Position of the label in insertion order
    pub index: usize,
    /// Raw nucleo score, higher is better
    pub score: u32,
}

/// Approximate matching index over normalized labels
pub struct FuzzyIndex {
    labels: Vec<String>,
    matcher: Matcher,
    min_score: u32,
}

impl FuzzyIndex {
    /// Create an empty index
    ///
    /// `min_score` is the similarity floor: labels scoring below it are treated
    /// as non-matches.
    pub fn new(min_score: u32) -> Self {
        Self {
            labels: Vec::new(),
            matcher: Matcher::new(Config::DEFAULT),
            min_score,
        }
    }

    /// Build an index over `labels` in order
    pub fn from_labels<I, S>(labels: I, min_score: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = Self::new(min_score);
        for label in labels {
            index.add(label.as_ref());
        }
        index
    }

    /// Append a label, returning its position
    pub fn add(&mut self, label: &str) -> usize {
        self.labels.push(label.to_lowercase());
        self.labels.len() - 1
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Normalized label at `index`
    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Score every label against `query`
    ///
    /// Returns `None` when no label meets the similarity floor, so a failed
    /// match cannot be confused with an empty index or an empty query. Matches
    /// come back in descending score order; equal scores keep insertion order.
    pub fn query(&mut self, query: &str) -> Option<Vec<ScoredMatch>> {
        let pattern = Pattern::new(
            query,
            CaseMatching::Ignore,
            Normalization::Smart,
            AtomKind::Fuzzy,
        );

        // whitespace-only queries parse to no atoms, which nucleo scores as a match
        if pattern.atoms.is_empty() {
            return None;
        }

        let mut buf = Vec::new();
        let mut matches: Vec<ScoredMatch> = self
            .labels
            .iter()
            .enumerate()
            .filter_map(|(index, label)| {
                let haystack = Utf32Str::new(label, &mut buf);
                pattern
                    .score(haystack, &mut self.matcher)
                    .filter(|score| *score >= self.min_score)
                    .map(|score| ScoredMatch { index, score })
            })
            .collect();

        if matches.is_empty() {
            return None;
        }

        // sort_by is stable: ties stay in insertion order
        matches.sort_by(|a, b| b.score.cmp(&a.score));
        Some(matches)
    }
}

impl fmt::Debug for FuzzyIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuzzyIndex")
            .field("labels", &self.labels)
            .field("min_score", &self.min_score)
            .finish()
    }
}
