//! Scenario tests driving the placeholder autocomplete end to end.
//!
//! The tests live in `tests/`; this crate has no public API of its own.
