//! Strategy layer: named profiles and the scoring engine they drive.

pub mod profile;
pub mod scoring;

pub use profile::{NeutralDefaults, ProfileRegistry, ScoringParams, StrategyProfile};
pub use scoring::{score, score_pool, ScoredCandidate};
