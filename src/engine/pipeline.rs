//! Slate pipeline.
//!
//! One request in, one prepared slate out: ingest → resolve → enrich.
//! Scoring and optimization run against the prepared slate, which owns the
//! candidates that lineups borrow from.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

use super::enricher::{Enricher, EnrichmentReport};
use crate::identity::{ResolutionReport, Resolver};
use crate::optimizer::{self, OptimizationOutcome};
use crate::strategy::{score_pool, ProfileRegistry, ScoredCandidate, StrategyProfile};
use crate::types::{
    ingest, Candidate, ConfirmedLineupEntry, ContestConfig, ContestFormat, RawCandidate, Rejection,
    SlateSize, StackerError,
};

/// Upper bounds (inclusive) on game count for small and medium slates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SlateThresholds {
    pub small_max: usize,
    pub medium_max: usize,
}

impl Default for SlateThresholds {
    fn default() -> Self {
        Self { small_max: 3, medium_max: 7 }
    }
}

impl SlateThresholds {
    pub fn classify(&self, games: usize) -> SlateSize {
        SlateSize::from_games(games, self.small_max, self.medium_max)
    }
}

fn default_lineups() -> usize {
    1
}

/// A slate as submitted by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct SlateRequest {
    pub format: ContestFormat,
    /// Strategy name; the recommended one for the slate when absent.
    #[serde(default)]
    pub strategy: Option<String>,
    /// Game count; derived from the candidates' ballparks when absent.
    #[serde(default)]
    pub games: Option<usize>,
    #[serde(default = "default_lineups")]
    pub lineups: usize,
    /// Drop candidates not named in the confirmed lineups.
    #[serde(default)]
    pub confirmed_only: bool,
    pub candidates: Vec<RawCandidate>,
    #[serde(default)]
    pub confirmed: Vec<ConfirmedLineupEntry>,
}

/// Everything known about a slate once it is ready to optimize.
#[derive(Debug)]
pub struct PreparedSlate {
    pub contest: ContestConfig,
    pub profile: StrategyProfile,
    pub size: SlateSize,
    pub games: usize,
    pub requested_lineups: usize,
    pub candidates: Vec<Candidate>,
    pub rejected: Vec<Rejection>,
    pub resolution: ResolutionReport,
    pub enrichment: EnrichmentReport,
}

impl PreparedSlate {
    pub fn scored(&self) -> Vec<ScoredCandidate<'_>> {
        score_pool(&self.candidates, &self.profile)
    }

    pub fn optimize(&self, num_lineups: usize) -> Result<OptimizationOutcome<'_>, StackerError> {
        optimizer::optimize(&self.scored(), &self.contest, num_lineups)
    }
}

pub struct Pipeline {
    registry: Arc<ProfileRegistry>,
    resolver: Resolver,
    enricher: Enricher,
    cash: ContestConfig,
    tournament: ContestConfig,
    slate: SlateThresholds,
}

impl Pipeline {
    pub fn new(registry: Arc<ProfileRegistry>, enricher: Enricher) -> Self {
        Self {
            registry,
            resolver: Resolver::default(),
            enricher,
            cash: ContestConfig::classic(ContestFormat::Cash),
            tournament: ContestConfig::classic(ContestFormat::Tournament),
            slate: SlateThresholds::default(),
        }
    }

    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replace the rules for the contest's format.
    pub fn with_contest(mut self, contest: ContestConfig) -> Self {
        match contest.format {
            ContestFormat::Cash => self.cash = contest,
            ContestFormat::Tournament => self.tournament = contest,
        }
        self
    }

    pub fn with_slate_thresholds(mut self, slate: SlateThresholds) -> Self {
        self.slate = slate;
        self
    }

    pub fn contest(&self, format: ContestFormat) -> &ContestConfig {
        match format {
            ContestFormat::Cash => &self.cash,
            ContestFormat::Tournament => &self.tournament,
        }
    }

    pub fn enricher(&self) -> &Enricher {
        &self.enricher
    }

    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    /// Ingest, resolve and enrich a slate.
    pub async fn prepare(&mut self, request: SlateRequest) -> Result<PreparedSlate, StackerError> {
        if request.lineups == 0 {
            return Err(StackerError::InvalidRequest("at least one lineup must be requested".into()));
        }
        let contest = self.contest(request.format).clone();
        contest.validate()?;

        let report = ingest(request.candidates, contest.min_player_salary);
        let mut candidates = report.candidates;

        let resolution = self.resolver.resolve(&request.confirmed, &mut candidates);
        if request.confirmed_only {
            let before = candidates.len();
            candidates.retain(Candidate::is_confirmed);
            info!(kept = candidates.len(), dropped = before - candidates.len(), "Kept confirmed starters only");
        }

        let games = request.games.unwrap_or_else(|| count_games(&candidates));
        let size = self.slate.classify(games);
        let strategy = match &request.strategy {
            Some(name) => name.clone(),
            None => self.registry.recommended(request.format, size).to_string(),
        };
        let profile = self.registry.lookup(request.format, size, &strategy);

        info!(
            format = %request.format,
            games,
            slate = %size,
            strategy = %profile.name,
            candidates = candidates.len(),
            rejected = report.rejected.len(),
            "Slate prepared for enrichment"
        );

        let enrichment = self.enricher.enrich_with_profile(&mut candidates, &profile).await;

        Ok(PreparedSlate {
            contest,
            profile,
            size,
            games,
            requested_lineups: request.lineups,
            candidates,
            rejected: report.rejected,
            resolution,
            enrichment,
        })
    }
}

/// Distinct ballparks on the slate, or half the teams when no candidate
/// carries game info.
fn count_games(candidates: &[Candidate]) -> usize {
    let venues: BTreeSet<String> = candidates
        .iter()
        .filter_map(|c| c.home_team.as_deref())
        .map(crate::identity::teams::canonical)
        .collect();
    if !venues.is_empty() {
        return venues.len();
    }
    let teams: BTreeSet<String> = candidates.iter().map(|c| crate::identity::teams::canonical(&c.team)).collect();
    teams.len().div_ceil(2)
}
