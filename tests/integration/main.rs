//! Integration tests.
//!
//! Exercise the public API end to end with in-memory slates and mock
//! enrichment sources; no network access.

mod enrichment;
mod fixtures;
mod mock_source;
mod pipeline;
mod scenarios;
