//! Enrichment sources.
//!
//! Defines the `EnrichmentSource` trait and thin adapters over the feeds
//! that supply enrichment signals. A source knows nothing about strategies,
//! caching or concurrency; it answers one identity lookup at a time.

pub mod http;
pub mod park;
pub mod table;
pub mod weather;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identity::teams::canonical;
use crate::types::{Candidate, Enrichment, Position, Signal, SignalScope};

// ---------------------------------------------------------------------------
// Lookup keys
// ---------------------------------------------------------------------------

/// The thing a signal describes: a team, a ballpark or one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Subject {
    /// Canonical team code.
    Team(String),
    /// Canonical code of the home team whose park hosts the game.
    Venue(String),
    /// Candidate id.
    Player(String),
}

impl Subject {
    /// `None` when the candidate has nothing to look up for `signal`: a
    /// pitcher with no known opponent has no opposing implied total.
    pub fn for_signal(signal: Signal, candidate: &Candidate) -> Option<Self> {
        let subject = match signal.scope() {
            SignalScope::Team => Subject::Team(canonical(subject_team(signal, candidate)?)),
            SignalScope::Venue => Subject::Venue(canonical(candidate.venue())),
            SignalScope::Player => Subject::Player(candidate.id.clone()),
        };
        Some(subject)
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Team(team) => write!(f, "team:{team}"),
            Subject::Venue(park) => write!(f, "venue:{park}"),
            Subject::Player(id) => write!(f, "player:{id}"),
        }
    }
}

/// The team a team-scoped signal is looked up for. A pitcher's implied
/// total is the opposing offense's.
fn subject_team(signal: Signal, candidate: &Candidate) -> Option<&str> {
    if signal == Signal::ImpliedTotal && candidate.is_pitcher_only() {
        candidate.opponent.as_deref()
    } else {
        Some(&candidate.team)
    }
}

/// Everything a source may use to identify what is being asked for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentityHints {
    pub signal: Signal,
    /// Display name; absent for team-scoped lookups.
    pub name: Option<String>,
    pub team: String,
    pub opponent: Option<String>,
    /// Ballpark (home team code) of the game.
    pub venue: String,
    pub positions: Vec<Position>,
    pub salary: Option<u32>,
}

impl IdentityHints {
    /// Hints for the lookup [`Subject::for_signal`] keys. Team and venue
    /// lookups carry only what every candidate sharing the subject shares:
    /// a venue lookup names the home team and no opponent.
    pub fn for_signal(signal: Signal, candidate: &Candidate) -> Self {
        let venue = candidate.venue().to_string();
        let (team, opponent) = match signal.scope() {
            SignalScope::Team => match subject_team(signal, candidate) {
                Some(team) if team != candidate.team => (team.to_string(), Some(candidate.team.clone())),
                _ => (candidate.team.clone(), candidate.opponent.clone()),
            },
            SignalScope::Venue => (venue.clone(), None),
            SignalScope::Player => (candidate.team.clone(), candidate.opponent.clone()),
        };
        let player = signal.scope() == SignalScope::Player;
        Self {
            signal,
            name: player.then(|| candidate.name.clone()),
            team,
            opponent,
            venue,
            positions: if player { candidate.positions.clone() } else { Vec::new() },
            salary: player.then_some(candidate.salary),
        }
    }
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// A partial enrichment record returned by a source. Any field may be
/// absent; only the fields backing the requested signal are used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attributes {
    #[serde(alias = "implied_total", alias = "team_total")]
    pub implied_team_runs: Option<f64>,
    pub recent_form: Option<f64>,
    pub consistency: Option<f64>,
    pub barrel_rate: Option<f64>,
    pub hard_hit_rate: Option<f64>,
    #[serde(alias = "k_pct")]
    pub k_rate: Option<f64>,
    #[serde(alias = "projected_ownership")]
    pub ownership: Option<f64>,
    pub park_factor: Option<f64>,
    pub weather: Option<f64>,
}

impl Attributes {
    /// Whether the record carries a value for `signal`.
    pub fn has(&self, signal: Signal) -> bool {
        match signal {
            Signal::ImpliedTotal => self.implied_team_runs.is_some(),
            Signal::RecentForm => self.recent_form.is_some(),
            Signal::Consistency => self.consistency.is_some(),
            Signal::ContactQuality => self.barrel_rate.is_some() || self.hard_hit_rate.is_some(),
            Signal::StrikeoutRate => self.k_rate.is_some(),
            Signal::Ownership => self.ownership.is_some(),
            Signal::ParkFactor => self.park_factor.is_some(),
            Signal::Weather => self.weather.is_some(),
        }
    }

    /// Copy the fields backing `signal` into an enrichment bag. Values
    /// that are not finite are ignored.
    pub fn apply(&self, signal: Signal, enrichment: &mut Enrichment) {
        let set = |slot: &mut Option<f64>, value: Option<f64>| {
            if let Some(v) = value.filter(|v| v.is_finite()) {
                *slot = Some(v);
            }
        };
        match signal {
            Signal::ImpliedTotal => set(&mut enrichment.implied_team_runs, self.implied_team_runs),
            Signal::RecentForm => set(&mut enrichment.recent_form, self.recent_form),
            Signal::Consistency => set(&mut enrichment.consistency, self.consistency),
            Signal::ContactQuality => {
                set(&mut enrichment.barrel_rate, self.barrel_rate);
                set(&mut enrichment.hard_hit_rate, self.hard_hit_rate);
            }
            Signal::StrikeoutRate => set(&mut enrichment.k_rate, self.k_rate),
            Signal::Ownership => set(&mut enrichment.ownership, self.ownership),
            Signal::ParkFactor => set(&mut enrichment.park_factor, self.park_factor),
            Signal::Weather => set(&mut enrichment.weather, self.weather),
        }
    }

    /// Like [`apply`](Self::apply), except that a pitcher's implied total
    /// is the opponent's and lands in `opponent_implied_runs`.
    pub fn apply_to(&self, signal: Signal, candidate: &mut Candidate) {
        if signal == Signal::ImpliedTotal && candidate.is_pitcher_only() {
            if let Some(runs) = self.implied_team_runs.filter(|r| r.is_finite()) {
                candidate.enrichment.opponent_implied_runs = Some(runs);
            }
        } else {
            self.apply(signal, &mut candidate.enrichment);
        }
    }
}

// ---------------------------------------------------------------------------
// Source trait
// ---------------------------------------------------------------------------

/// Abstraction over one external enrichment feed.
///
/// `Ok(None)` means the feed has nothing for this identity; `Err` means
/// the lookup itself failed. Both degrade to neutral defaults upstream.
#[async_trait]
pub trait EnrichmentSource: Send + Sync {
    async fn fetch(&self, hints: &IdentityHints) -> Result<Option<Attributes>>;
}
