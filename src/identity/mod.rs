//! Identity resolution.
//!
//! Reconciles confirmed-starter entries, spelled however their feed spells
//! them, with the candidate pool. A successful match only touches the
//! candidate's confirmation fields; an unmatched or malformed entry is
//! reported, never treated as an error.

pub mod matching;
pub mod normalize;
pub mod teams;

use tracing::{debug, info, warn};

use crate::types::{Candidate, ConfirmedLineupEntry, StarterRole};

pub use matching::{best_match, name_confidence, DEFAULT_FLOOR};

/// One accepted entry → candidate match.
#[derive(Debug, Clone)]
pub struct ResolvedMatch {
    pub entry_name: String,
    pub candidate_id: String,
    pub confidence: f64,
}

/// Summary of a resolution pass.
#[derive(Debug, Default)]
pub struct ResolutionReport {
    pub matched: usize,
    pub matches: Vec<ResolvedMatch>,
    pub unmatched: Vec<ConfirmedLineupEntry>,
    /// Entries with a batting slot outside 1–9, applied to no candidate.
    pub invalid: Vec<ConfirmedLineupEntry>,
}

/// Matches confirmed-lineup entries to candidates by team and fuzzy name.
#[derive(Debug, Clone)]
pub struct Resolver {
    floor: f64,
}

impl Default for Resolver {
    fn default() -> Self {
        Self { floor: DEFAULT_FLOOR }
    }
}

impl Resolver {
    pub fn new(floor: f64) -> Self {
        Self { floor }
    }

    pub fn floor(&self) -> f64 {
        self.floor
    }

    /// Apply every entry to the best-matching candidate on the same team.
    pub fn resolve(
        &self,
        entries: &[ConfirmedLineupEntry],
        candidates: &mut [Candidate],
    ) -> ResolutionReport {
        let mut report = ResolutionReport::default();

        for entry in entries {
            if !entry.spot.is_valid() {
                warn!(
                    entry = %entry.name,
                    team = %entry.team,
                    spot = %entry.spot,
                    "Invalid lineup slot, entry ignored"
                );
                report.invalid.push(entry.clone());
                continue;
            }

            let team_members: Vec<usize> = candidates
                .iter()
                .enumerate()
                .filter(|(_, c)| teams::same_team(&c.team, &entry.team))
                .map(|(i, _)| i)
                .collect();

            let names = team_members.iter().map(|&i| candidates[i].name.as_str());
            match best_match(&entry.name, names, self.floor) {
                Some((pos, confidence)) => {
                    let candidate = &mut candidates[team_members[pos]];
                    confirm(candidate, entry.spot);
                    debug!(
                        entry = %entry.name,
                        candidate = %candidate.name,
                        team = %candidate.team,
                        confidence,
                        spot = %entry.spot,
                        "Confirmed starter"
                    );
                    report.matches.push(ResolvedMatch {
                        entry_name: entry.name.clone(),
                        candidate_id: candidate.id.clone(),
                        confidence,
                    });
                    report.matched += 1;
                }
                None => {
                    debug!(entry = %entry.name, team = %entry.team, "No candidate matched");
                    report.unmatched.push(entry.clone());
                }
            }
        }

        info!(
            entries = entries.len(),
            matched = report.matched,
            unmatched = report.unmatched.len(),
            invalid = report.invalid.len(),
            "Confirmed lineups resolved"
        );
        report
    }
}

/// Resolve with the default confidence floor.
pub fn resolve(entries: &[ConfirmedLineupEntry], candidates: &mut [Candidate]) -> ResolutionReport {
    Resolver::default().resolve(entries, candidates)
}

fn confirm(candidate: &mut Candidate, spot: StarterRole) {
    candidate.starter = Some(spot);
    match spot {
        StarterRole::Batting(slot) => candidate.enrichment.batting_order = Some(slot),
        StarterRole::StartingPitcher => candidate.enrichment.batting_order = None,
    }
}
