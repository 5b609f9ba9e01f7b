//! Candidate sources and the per-refresh candidate pool
//!
//! Candidates come from two places: a synchronous getter that is the source of
//! truth and is asked again on every refresh, and an optional asynchronous
//! fetcher keyed by the partially typed query. [`CandidatePool`] merges both
//! and ranks the result against the normalized query.

use crate::error::SuggestResult;
use crate::matcher::FuzzyIndex;
use crate::types::Candidate;
use async_trait::async_trait;
use std::collections::HashSet;

/// Synchronous provider of the full candidate list
pub trait CandidateSource: Send + Sync {
    /// Current candidates in display order
    fn candidates(&self) -> Vec<Candidate>;
}

impl<F> CandidateSource for F
where
    F: Fn() -> Vec<Candidate> + Send + Sync,
{
    fn candidates(&self) -> Vec<Candidate> {
        self()
    }
}

/// Fixed in-memory candidate list
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    candidates: Vec<Candidate>,
}

impl StaticSource {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self { candidates }
    }
}

impl CandidateSource for StaticSource {
    fn candidates(&self) -> Vec<Candidate> {
        self.candidates.clone()
    }
}

/// Asynchronous provider queried with the raw (non-normalized) query text
#[async_trait]
pub trait CandidateFetcher: Send + Sync {
    /// Fetch candidates for `query`
    ///
    /// Errors are not fatal to the session: synchronous candidates still
    /// render and the failure is reported to observers.
    async fn fetch(&self, query: &str) -> SuggestResult<Vec<Candidate>>;
}

/// Candidates gathered for one refresh, with their label index
///
/// Rebuilt from the synchronous source on every refresh and discarded with the
/// session; nothing is cached across sessions.
#[derive(Debug)]
pub struct CandidatePool {
    candidates: Vec<Candidate>,
    labels: HashSet<String>,
    index: FuzzyIndex,
}

impl CandidatePool {
    /// Index the synchronous candidates
    pub fn build(candidates: Vec<Candidate>, min_score: u32) -> Self {
        let labels = candidates.iter().map(|c| c.label.clone()).collect();
        let index = FuzzyIndex::from_labels(candidates.iter().map(|c| c.label.as_str()), min_score);
        Self {
            candidates,
            labels,
            index,
        }
    }

    /// Append fetched candidates whose label is not already present
    ///
    /// Labels are compared exactly (case-sensitive). New labels are added to the
    /// fuzzy index incrementally. Returns how many candidates were appended.
    pub fn merge(&mut self, fetched: Vec<Candidate>) -> usize {
        let mut added = 0;
        for candidate in fetched {
            if !self.labels.insert(candidate.label.clone()) {
                continue;
            }
            self.index.add(&candidate.label);
            self.candidates.push(candidate);
            added += 1;
        }
        added
    }

    /// Rank candidates against an already normalized query
    ///
    /// An empty query yields every candidate in source order. A query nothing
    /// matches yields an empty list.
    pub fn rank(&mut self, normalized_query: &str) -> Vec<Candidate> {
        if normalized_query.is_empty() {
            return self.candidates.clone();
        }

        match self.index.query(normalized_query) {
            Some(matches) => matches
                .into_iter()
                .filter_map(|m| self.candidates.get(m.index).cloned())
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn contains_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
