//! Core engine: enrichment coordination and the slate pipeline.

pub mod cache;
pub mod enricher;
pub mod pipeline;

pub use cache::EnrichmentCache;
pub use enricher::{Enricher, EnricherSettings, EnrichmentReport};
pub use pipeline::{Pipeline, PreparedSlate, SlateRequest, SlateThresholds};
