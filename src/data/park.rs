//! Static park factors.
//!
//! Multi-season run factors per home ballpark; 1.00 is league average.
//! The table changes at most once a season, so it lives in code rather
//! than behind a request.

use anyhow::Result;
use async_trait::async_trait;

use super::{Attributes, EnrichmentSource, IdentityHints};
use crate::identity::teams;

const PARK_FACTORS: &[(&str, f64)] = &[
    ("COL", 1.20),
    ("CIN", 1.12),
    ("TEX", 1.10),
    ("PHI", 1.08),
    ("MIL", 1.06),
    ("BAL", 1.05),
    ("HOU", 1.04),
    ("TOR", 1.03),
    ("BOS", 1.03),
    ("NYY", 1.02),
    ("CHC", 1.01),
    ("ARI", 1.00),
    ("ATL", 1.00),
    ("MIN", 0.99),
    ("WSH", 0.98),
    ("LAD", 0.98),
    ("NYM", 0.97),
    ("LAA", 0.96),
    ("CWS", 0.96),
    ("STL", 0.95),
    ("CLE", 0.94),
    ("TB", 0.93),
    ("KC", 0.92),
    ("DET", 0.91),
    ("SEA", 0.90),
    ("OAK", 0.89),
    ("SF", 0.88),
    ("SD", 0.87),
    ("MIA", 0.86),
    ("PIT", 0.85),
];

/// Park factor for a venue code, if known.
pub fn factor_for(venue: &str) -> Option<f64> {
    let code = teams::canonical(venue);
    PARK_FACTORS.iter().find(|(team, _)| *team == code).map(|(_, f)| *f)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ParkFactorSource;

#[async_trait]
impl EnrichmentSource for ParkFactorSource {
    async fn fetch(&self, hints: &IdentityHints) -> Result<Option<Attributes>> {
        Ok(factor_for(&hints.venue).map(|f| Attributes { park_factor: Some(f), ..Default::default() }))
    }
}
