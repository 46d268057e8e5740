//! Shared types for the STACKER optimizer.
//!
//! These types form the data model used across all modules: positions,
//! contest rules, candidates and their enrichment bag, confirmed-lineup
//! entries, and the domain error enum. They are designed to be stable so
//! that the identity, strategy, engine and optimizer modules can depend on
//! them without circular references.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::time::Duration;

use crate::identity::teams;

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// A fielding position a candidate can be rostered at.
///
/// `SP`/`RP` fold into [`Position::Pitcher`]; the three outfield spots fold
/// into [`Position::Outfield`]. `DH` is recognised so that designated
/// hitters are not rejected, but no classic slot accepts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "P", alias = "SP", alias = "RP")]
    Pitcher,
    #[serde(rename = "C")]
    Catcher,
    #[serde(rename = "1B")]
    FirstBase,
    #[serde(rename = "2B")]
    SecondBase,
    #[serde(rename = "3B")]
    ThirdBase,
    #[serde(rename = "SS")]
    Shortstop,
    #[serde(rename = "OF", alias = "LF", alias = "CF", alias = "RF")]
    Outfield,
    #[serde(rename = "DH")]
    DesignatedHitter,
}

impl Position {
    pub fn is_pitcher(&self) -> bool {
        matches!(self, Position::Pitcher)
    }

    /// Parse a position list such as `"3B/SS"` or `"SP"`.
    ///
    /// Unknown tokens are skipped; duplicates collapse. The result is
    /// sorted so that two spellings of the same eligibility compare equal.
    pub fn parse_list(s: &str) -> Vec<Position> {
        let set: BTreeSet<Position> = s
            .split(|c: char| c == '/' || c == ',' || c.is_whitespace())
            .filter(|tok| !tok.is_empty())
            .filter_map(|tok| tok.parse().ok())
            .collect();
        set.into_iter().collect()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Position::Pitcher => "P",
            Position::Catcher => "C",
            Position::FirstBase => "1B",
            Position::SecondBase => "2B",
            Position::ThirdBase => "3B",
            Position::Shortstop => "SS",
            Position::Outfield => "OF",
            Position::DesignatedHitter => "DH",
        };
        write!(f, "{s}")
    }
}

/// Parse a single position token (case-insensitive).
impl std::str::FromStr for Position {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "P" | "SP" | "RP" => Ok(Position::Pitcher),
            "C" => Ok(Position::Catcher),
            "1B" => Ok(Position::FirstBase),
            "2B" => Ok(Position::SecondBase),
            "3B" => Ok(Position::ThirdBase),
            "SS" => Ok(Position::Shortstop),
            "OF" | "LF" | "CF" | "RF" => Ok(Position::Outfield),
            "DH" => Ok(Position::DesignatedHitter),
            _ => Err(anyhow::anyhow!("Unknown position: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Contest format & slate size
// ---------------------------------------------------------------------------

/// Contest format. Cash contests reward a safe floor; tournaments reward
/// ceiling and differentiation from the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContestFormat {
    Cash,
    #[serde(alias = "gpp")]
    Tournament,
}

impl ContestFormat {
    pub const ALL: &'static [ContestFormat] = &[ContestFormat::Cash, ContestFormat::Tournament];
}

impl fmt::Display for ContestFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContestFormat::Cash => write!(f, "cash"),
            ContestFormat::Tournament => write!(f, "tournament"),
        }
    }
}

impl std::str::FromStr for ContestFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cash" | "50/50" | "double-up" => Ok(ContestFormat::Cash),
            "tournament" | "gpp" => Ok(ContestFormat::Tournament),
            _ => Err(anyhow::anyhow!("Unknown contest format: {s}")),
        }
    }
}

/// Slate size, derived from the number of games on the slate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlateSize {
    Small,
    Medium,
    Large,
}

impl SlateSize {
    pub const ALL: &'static [SlateSize] = &[SlateSize::Small, SlateSize::Medium, SlateSize::Large];

    /// Classify a slate by game count against inclusive upper bounds.
    pub fn from_games(games: usize, small_max: usize, medium_max: usize) -> Self {
        if games <= small_max {
            SlateSize::Small
        } else if games <= medium_max {
            SlateSize::Medium
        } else {
            SlateSize::Large
        }
    }
}

impl fmt::Display for SlateSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlateSize::Small => write!(f, "small"),
            SlateSize::Medium => write!(f, "medium"),
            SlateSize::Large => write!(f, "large"),
        }
    }
}

// ---------------------------------------------------------------------------
// Enrichment signals
// ---------------------------------------------------------------------------

/// One independently-sourced enrichment signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    ImpliedTotal,
    RecentForm,
    Consistency,
    ContactQuality,
    StrikeoutRate,
    Ownership,
    ParkFactor,
    Weather,
}

/// What a signal is a property of, and so how often it is fetched: once
/// per team, once per ballpark, or once per player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalScope {
    Team,
    Venue,
    Player,
}

impl Signal {
    pub const ALL: &'static [Signal] = &[
        Signal::ImpliedTotal,
        Signal::RecentForm,
        Signal::Consistency,
        Signal::ContactQuality,
        Signal::StrikeoutRate,
        Signal::Ownership,
        Signal::ParkFactor,
        Signal::Weather,
    ];

    pub fn scope(&self) -> SignalScope {
        match self {
            Signal::ImpliedTotal => SignalScope::Team,
            Signal::ParkFactor | Signal::Weather => SignalScope::Venue,
            _ => SignalScope::Player,
        }
    }

    /// Signals backed by expensive, quota-limited feeds. These are only
    /// fetched for the top candidates of a slate.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Signal::ContactQuality | Signal::StrikeoutRate)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Signal::ImpliedTotal => "implied_total",
            Signal::RecentForm => "recent_form",
            Signal::Consistency => "consistency",
            Signal::ContactQuality => "contact_quality",
            Signal::StrikeoutRate => "strikeout_rate",
            Signal::Ownership => "ownership",
            Signal::ParkFactor => "park_factor",
            Signal::Weather => "weather",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Enrichment bag
// ---------------------------------------------------------------------------

/// Confirmed starting role from a lineup feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StarterRole {
    /// Confirmed in the batting order at the given slot (1–9).
    Batting(u8),
    StartingPitcher,
}

impl StarterRole {
    /// Batting slots run 1–9; anything else is a malformed feed entry.
    pub fn is_valid(&self) -> bool {
        match self {
            StarterRole::Batting(slot) => (1..=9).contains(slot),
            StarterRole::StartingPitcher => true,
        }
    }
}

impl fmt::Display for StarterRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StarterRole::Batting(n) => write!(f, "batting #{n}"),
            StarterRole::StartingPitcher => write!(f, "starting pitcher"),
        }
    }
}

/// Per-candidate record of how the enrichment pass went.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentQuality {
    pub requested: u32,
    pub resolved: u32,
    pub defaulted: u32,
    pub failed: u32,
}

impl EnrichmentQuality {
    /// Fraction of requested signals that were resolved from a source.
    /// A candidate nothing was requested for is considered fully enriched.
    pub fn score(&self) -> f64 {
        if self.requested == 0 {
            1.0
        } else {
            self.resolved as f64 / self.requested as f64
        }
    }
}

/// Optional enrichment values attached to a candidate.
///
/// Every field is independently present or absent. Scoring treats an
/// absent value as neutral.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    /// Vegas implied runs for the candidate's team.
    pub implied_team_runs: Option<f64>,
    /// Vegas implied runs for the opposing team; set for pitchers only.
    pub opponent_implied_runs: Option<f64>,
    /// Recent-form multiplier (1.0 = neutral).
    pub recent_form: Option<f64>,
    /// Consistency index, 0–100 (50 = neutral).
    pub consistency: Option<f64>,
    /// Barrel rate, percent.
    pub barrel_rate: Option<f64>,
    /// Hard-hit rate, percent.
    pub hard_hit_rate: Option<f64>,
    /// Strikeout rate, percent (pitchers).
    pub k_rate: Option<f64>,
    /// Batting-order slot 1–9.
    pub batting_order: Option<u8>,
    /// Projected ownership, percent.
    pub ownership: Option<f64>,
    /// Run-scoring park factor (1.0 = neutral).
    pub park_factor: Option<f64>,
    /// Weather multiplier (1.0 = neutral).
    pub weather: Option<f64>,
    pub quality: EnrichmentQuality,
}

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// One salary-feed record as received, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCandidate {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub team: String,
    #[serde(default)]
    pub opponent: Option<String>,
    /// Game descriptor such as `"NYY@BOS"` or `"NYY@BOS 07:05PM ET"`.
    #[serde(default, alias = "game_info")]
    pub game: Option<String>,
    pub salary: f64,
    #[serde(alias = "positions")]
    pub position: String,
    #[serde(default, alias = "points")]
    pub projection: f64,
}

/// Why a raw record was not turned into a [`Candidate`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RejectReason {
    #[error("missing name")]
    MissingName,

    #[error("missing team")]
    MissingTeam,

    #[error("no recognised position in {0:?}")]
    NoEligiblePosition(String),

    #[error("invalid salary {0}")]
    InvalidSalary(f64),

    #[error("salary {salary} below contest minimum {minimum}")]
    BelowMinimumSalary { salary: u32, minimum: u32 },

    #[error("invalid projection {0}")]
    InvalidProjection(f64),
}

/// A rejected record with enough context to report it.
#[derive(Debug, Clone)]
pub struct Rejection {
    pub name: String,
    pub team: String,
    pub reason: RejectReason,
}

/// The canonical representation of one rosterable athlete on a slate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    /// Uppercase team code.
    pub team: String,
    pub opponent: Option<String>,
    /// Home team of the candidate's game, when known.
    pub home_team: Option<String>,
    /// Eligible positions, sorted and deduplicated. Never empty.
    pub positions: Vec<Position>,
    /// Salary in contest dollars. Always positive.
    pub salary: u32,
    /// Raw projected fantasy points. Non-negative and finite.
    pub projection: f64,
    pub enrichment: Enrichment,
    pub starter: Option<StarterRole>,
}

impl Candidate {
    /// Validate a raw record into a candidate.
    pub fn from_raw(raw: RawCandidate, min_salary: u32) -> Result<Self, RejectReason> {
        let name = raw.name.trim().to_string();
        if name.is_empty() {
            return Err(RejectReason::MissingName);
        }
        let team = teams::normalize_code(&raw.team);
        if team.is_empty() {
            return Err(RejectReason::MissingTeam);
        }

        let positions = Position::parse_list(&raw.position);
        if positions.is_empty() {
            return Err(RejectReason::NoEligiblePosition(raw.position));
        }

        if !raw.salary.is_finite() || raw.salary <= 0.0 || raw.salary.fract() != 0.0
            || raw.salary > u32::MAX as f64
        {
            return Err(RejectReason::InvalidSalary(raw.salary));
        }
        let salary = raw.salary as u32;
        if salary < min_salary {
            return Err(RejectReason::BelowMinimumSalary { salary, minimum: min_salary });
        }

        if !raw.projection.is_finite() || raw.projection < 0.0 {
            return Err(RejectReason::InvalidProjection(raw.projection));
        }

        let (mut opponent, home_team) = match raw.game.as_deref().and_then(parse_game) {
            Some((away, home)) if teams::same_team(&team, &away) => (Some(home.clone()), Some(home)),
            Some((away, home)) if teams::same_team(&team, &home) => (Some(away), Some(home)),
            Some((_, home)) => (None, Some(home)),
            None => (None, None),
        };
        if let Some(explicit) = raw.opponent.as_deref().map(teams::normalize_code) {
            if !explicit.is_empty() {
                opponent = Some(explicit);
            }
        }

        let id = match raw.id.map(|s| s.trim().to_string()) {
            Some(id) if !id.is_empty() => id,
            _ => default_id(&name, &team),
        };

        Ok(Candidate {
            id,
            name,
            team,
            opponent,
            home_team,
            positions,
            salary,
            projection: raw.projection,
            enrichment: Enrichment::default(),
            starter: None,
        })
    }

    /// Whether the candidate can be rostered as a pitcher.
    pub fn is_pitcher(&self) -> bool {
        self.positions.iter().any(Position::is_pitcher)
    }

    /// Whether the candidate has any non-pitching eligibility.
    pub fn is_hitter(&self) -> bool {
        self.positions.iter().any(|p| !p.is_pitcher())
    }

    /// Pitching is the candidate's only eligibility.
    pub fn is_pitcher_only(&self) -> bool {
        self.is_pitcher() && !self.is_hitter()
    }

    /// Whether the candidate can fill a slot accepting any of `accepts`.
    pub fn eligible_for(&self, accepts: &[Position]) -> bool {
        self.positions.iter().any(|p| accepts.contains(p))
    }

    /// Whether a confirmed-lineup feed has placed this candidate.
    pub fn is_confirmed(&self) -> bool {
        self.starter.is_some()
    }

    /// Ballpark the game is played in: the home team when known.
    pub fn venue(&self) -> &str {
        self.home_team.as_deref().unwrap_or(&self.team)
    }

    pub fn position_label(&self) -> String {
        self.positions
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {}, ${}, {:.1} pts)",
            self.name,
            self.team,
            self.position_label(),
            self.salary,
            self.projection,
        )
    }
}

/// Split a game descriptor into `(away, home)` team codes.
fn parse_game(game: &str) -> Option<(String, String)> {
    let matchup = game.split_whitespace().next()?;
    let (away, home) = matchup.split_once('@')?;
    let (away, home) = (teams::normalize_code(away), teams::normalize_code(home));
    if away.is_empty() || home.is_empty() {
        return None;
    }
    Some((away, home))
}

fn default_id(name: &str, team: &str) -> String {
    let slug: String = crate::identity::normalize::fold(name).replace(' ', "_");
    format!("{slug}_{}", team.to_lowercase())
}

/// Result of validating a batch of raw records.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub candidates: Vec<Candidate>,
    pub rejected: Vec<Rejection>,
}

/// Validate raw records independently. A bad record never affects the
/// others, and records that look alike are kept as separate candidates.
pub fn ingest(raw: Vec<RawCandidate>, min_salary: u32) -> IngestReport {
    let mut report = IngestReport::default();
    let mut seen: HashSet<String> = HashSet::new();
    for record in raw {
        let (name, team) = (record.name.clone(), record.team.clone());
        match Candidate::from_raw(record, min_salary) {
            Ok(mut candidate) => {
                // Repeated ids get a numeric suffix so each record stays distinct.
                if !seen.insert(candidate.id.clone()) {
                    let base = candidate.id.clone();
                    let mut n = 2;
                    while !seen.insert(format!("{base}-{n}")) {
                        n += 1;
                    }
                    candidate.id = format!("{base}-{n}");
                    tracing::debug!(id = %base, renamed = %candidate.id, "Duplicate candidate id");
                }
                report.candidates.push(candidate);
            }
            Err(reason) => {
                tracing::debug!(name = %name, team = %team, reason = %reason, "Rejected candidate");
                report.rejected.push(Rejection { name, team, reason });
            }
        }
    }
    report
}

// ---------------------------------------------------------------------------
// Confirmed lineups
// ---------------------------------------------------------------------------

/// One row of a confirmed-starters feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmedLineupEntry {
    pub team: String,
    /// Name as spelled by the feed.
    pub name: String,
    pub spot: StarterRole,
    #[serde(default)]
    pub source: String,
}

// ---------------------------------------------------------------------------
// Contest rules
// ---------------------------------------------------------------------------

/// A group of interchangeable roster slots, e.g. three `OF` slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotGroup {
    pub name: String,
    pub accepts: Vec<Position>,
    pub count: usize,
}

impl SlotGroup {
    pub fn new(name: &str, accepts: &[Position], count: usize) -> Self {
        Self { name: name.to_string(), accepts: accepts.to_vec(), count }
    }

    pub fn accepts(&self, candidate: &Candidate) -> bool {
        candidate.eligible_for(&self.accepts)
    }

    /// A group that only takes pitchers. Candidates placed here count as
    /// pitchers for correlation purposes; everyone else counts as a hitter.
    pub fn is_pitching(&self) -> bool {
        !self.accepts.is_empty() && self.accepts.iter().all(Position::is_pitcher)
    }

    /// Slot labels for this group: `P1`, `P2` for multi-slot groups,
    /// the bare group name otherwise.
    pub fn slot_names(&self) -> Vec<String> {
        if self.count == 1 {
            vec![self.name.clone()]
        } else {
            (1..=self.count).map(|i| format!("{}{i}", self.name)).collect()
        }
    }
}

/// Correlation terms applied in the optimizer objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationRules {
    /// Hitters from one team needed before the stack bonus applies.
    pub stack_min_hitters: usize,
    /// Added once per team that reaches `stack_min_hitters`.
    pub stack_bonus: f64,
    /// Subtracted for every (pitcher, hitter facing that pitcher) pair.
    pub opposing_pitcher_penalty: f64,
}

impl Default for CorrelationRules {
    fn default() -> Self {
        Self { stack_min_hitters: 3, stack_bonus: 0.0, opposing_pitcher_penalty: 0.0 }
    }
}

/// Rules of one contest as seen by the optimizer.
#[derive(Debug, Clone)]
pub struct ContestConfig {
    pub format: ContestFormat,
    pub salary_cap: u32,
    pub salary_floor: u32,
    pub min_player_salary: u32,
    pub slots: Vec<SlotGroup>,
    pub max_per_team: usize,
    pub time_limit: Duration,
    pub correlation: CorrelationRules,
}

impl ContestConfig {
    /// The MLB classic layout: P×2, C, 1B, 2B, 3B, SS, OF×3 under $50,000.
    pub fn classic(format: ContestFormat) -> Self {
        let slots = vec![
            SlotGroup::new("P", &[Position::Pitcher], 2),
            SlotGroup::new("C", &[Position::Catcher], 1),
            SlotGroup::new("1B", &[Position::FirstBase], 1),
            SlotGroup::new("2B", &[Position::SecondBase], 1),
            SlotGroup::new("3B", &[Position::ThirdBase], 1),
            SlotGroup::new("SS", &[Position::Shortstop], 1),
            SlotGroup::new("OF", &[Position::Outfield], 3),
        ];
        let (salary_floor, max_per_team, correlation) = match format {
            ContestFormat::Cash => (
                47_500,
                3,
                CorrelationRules { stack_min_hitters: 3, stack_bonus: 0.0, opposing_pitcher_penalty: 2.0 },
            ),
            ContestFormat::Tournament => (
                45_000,
                5,
                CorrelationRules { stack_min_hitters: 3, stack_bonus: 3.0, opposing_pitcher_penalty: 1.5 },
            ),
        };
        Self {
            format,
            salary_cap: 50_000,
            salary_floor,
            min_player_salary: 2_000,
            slots,
            max_per_team,
            time_limit: Duration::from_secs(30),
            correlation,
        }
    }

    /// Total number of roster slots.
    pub fn roster_size(&self) -> usize {
        self.slots.iter().map(|g| g.count).sum()
    }

    /// Reject configurations no lineup could ever satisfy.
    pub fn validate(&self) -> Result<(), StackerError> {
        if self.slots.is_empty() || self.roster_size() == 0 {
            return Err(StackerError::InvalidContest("no roster slots configured".into()));
        }
        if let Some(group) = self.slots.iter().find(|g| g.accepts.is_empty()) {
            return Err(StackerError::InvalidContest(format!(
                "slot group {} accepts no positions",
                group.name
            )));
        }
        if self.salary_floor > self.salary_cap {
            return Err(StackerError::InvalidContest(format!(
                "salary floor {} above cap {}",
                self.salary_floor, self.salary_cap
            )));
        }
        if self.max_per_team == 0 {
            return Err(StackerError::InvalidContest("max_per_team must be at least 1".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for STACKER.
#[derive(Debug, thiserror::Error)]
pub enum StackerError {
    #[error("Invalid contest configuration: {0}")]
    InvalidContest(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Strategy error: {0}")]
    Strategy(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, team: &str, position: &str, salary: f64, projection: f64) -> RawCandidate {
        RawCandidate {
            id: None,
            name: name.to_string(),
            team: team.to_string(),
            opponent: None,
            game: None,
            salary,
            position: position.to_string(),
            projection,
        }
    }

    // -- Position tests --

    #[test]
    fn test_parse_position_list() {
        assert_eq!(
            Position::parse_list("3B/SS"),
            vec![Position::ThirdBase, Position::Shortstop]
        );
        assert_eq!(Position::parse_list("SP"), vec![Position::Pitcher]);
        assert_eq!(Position::parse_list("LF/RF"), vec![Position::Outfield]);
        assert!(Position::parse_list("XX").is_empty());
    }

    #[test]
    fn test_position_display_roundtrip() {
        for p in ["P", "C", "1B", "2B", "3B", "SS", "OF", "DH"] {
            let parsed: Position = p.parse().unwrap();
            assert_eq!(parsed.to_string(), p);
        }
    }

    #[test]
    fn test_position_deserialize_alias() {
        let p: Vec<Position> = serde_json::from_str(r#"["SP","RP","CF","1B"]"#).unwrap();
        assert_eq!(
            p,
            vec![Position::Pitcher, Position::Pitcher, Position::Outfield, Position::FirstBase]
        );
    }

    // -- Format / slate tests --

    #[test]
    fn test_contest_format_from_str() {
        assert_eq!("gpp".parse::<ContestFormat>().unwrap(), ContestFormat::Tournament);
        assert_eq!("CASH".parse::<ContestFormat>().unwrap(), ContestFormat::Cash);
        assert!("bogus".parse::<ContestFormat>().is_err());
    }

    #[test]
    fn test_slate_size_thresholds() {
        assert_eq!(SlateSize::from_games(3, 4, 9), SlateSize::Small);
        assert_eq!(SlateSize::from_games(4, 4, 9), SlateSize::Small);
        assert_eq!(SlateSize::from_games(5, 4, 9), SlateSize::Medium);
        assert_eq!(SlateSize::from_games(9, 4, 9), SlateSize::Medium);
        assert_eq!(SlateSize::from_games(15, 4, 9), SlateSize::Large);
    }

    #[test]
    fn test_signal_scope() {
        assert_eq!(Signal::ImpliedTotal.scope(), SignalScope::Team);
        assert_eq!(Signal::ParkFactor.scope(), SignalScope::Venue);
        assert_eq!(Signal::Weather.scope(), SignalScope::Venue);
        assert_eq!(Signal::Ownership.scope(), SignalScope::Player);
        assert!(Signal::ContactQuality.is_rate_limited());
        assert!(!Signal::RecentForm.is_rate_limited());
    }

    // -- Candidate tests --

    #[test]
    fn test_candidate_from_raw() {
        let mut r = raw("Aaron Judge", "nyy", "OF", 6200.0, 11.4);
        r.game = Some("NYY@BOS 07:10PM ET".to_string());
        let c = Candidate::from_raw(r, 2000).unwrap();
        assert_eq!(c.team, "NYY");
        assert_eq!(c.opponent.as_deref(), Some("BOS"));
        assert_eq!(c.home_team.as_deref(), Some("BOS"));
        assert_eq!(c.venue(), "BOS");
        assert_eq!(c.id, "aaron_judge_nyy");
        assert!(c.is_hitter());
        assert!(!c.is_pitcher());
        assert!(!c.is_confirmed());
    }

    #[test]
    fn test_candidate_home_game_opponent() {
        let mut r = raw("Rafael Devers", "BOS", "3B", 5100.0, 9.0);
        r.game = Some("NYY@BOS".to_string());
        let c = Candidate::from_raw(r, 2000).unwrap();
        assert_eq!(c.opponent.as_deref(), Some("NYY"));
        assert_eq!(c.venue(), "BOS");
    }

    #[test]
    fn test_candidate_rejections() {
        assert_eq!(
            Candidate::from_raw(raw("A", "NYY", "OF", 0.0, 5.0), 2000).unwrap_err(),
            RejectReason::InvalidSalary(0.0)
        );
        assert_eq!(
            Candidate::from_raw(raw("A", "NYY", "OF", -100.0, 5.0), 2000).unwrap_err(),
            RejectReason::InvalidSalary(-100.0)
        );
        assert_eq!(
            Candidate::from_raw(raw("A", "NYY", "OF", 1500.0, 5.0), 2000).unwrap_err(),
            RejectReason::BelowMinimumSalary { salary: 1500, minimum: 2000 }
        );
        assert!(matches!(
            Candidate::from_raw(raw("A", "NYY", "", 3000.0, 5.0), 2000).unwrap_err(),
            RejectReason::NoEligiblePosition(_)
        ));
        assert_eq!(
            Candidate::from_raw(raw("A", "NYY", "OF", 3000.0, -1.0), 2000).unwrap_err(),
            RejectReason::InvalidProjection(-1.0)
        );
        assert_eq!(
            Candidate::from_raw(raw("  ", "NYY", "OF", 3000.0, 1.0), 2000).unwrap_err(),
            RejectReason::MissingName
        );
    }

    #[test]
    fn test_ingest_isolates_bad_records() {
        let report = ingest(
            vec![
                raw("Good One", "NYY", "OF", 4000.0, 8.0),
                raw("Bad Salary", "NYY", "OF", -5.0, 8.0),
                raw("Good Two", "BOS", "C", 3000.0, 6.0),
            ],
            2000,
        );
        assert_eq!(report.candidates.len(), 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].name, "Bad Salary");
    }

    #[test]
    fn test_ingest_never_merges_lookalikes() {
        let report = ingest(
            vec![
                raw("Will Smith", "LAD", "C", 4500.0, 8.0),
                raw("Will Smith", "LAD", "C", 4700.0, 8.0),
            ],
            2000,
        );
        assert_eq!(report.candidates.len(), 2);
        assert_ne!(report.candidates[0].id, report.candidates[1].id);
        assert_eq!(report.candidates[1].id, "will_smith_lad-2");
    }

    // -- Contest tests --

    #[test]
    fn test_classic_contest_layout() {
        let contest = ContestConfig::classic(ContestFormat::Cash);
        assert_eq!(contest.roster_size(), 10);
        assert_eq!(contest.salary_cap, 50_000);
        assert_eq!(contest.salary_floor, 47_500);
        assert_eq!(contest.max_per_team, 3);
        assert!(contest.validate().is_ok());

        let gpp = ContestConfig::classic(ContestFormat::Tournament);
        assert_eq!(gpp.salary_floor, 45_000);
        assert_eq!(gpp.max_per_team, 5);
    }

    #[test]
    fn test_slot_names() {
        let of = SlotGroup::new("OF", &[Position::Outfield], 3);
        assert_eq!(of.slot_names(), vec!["OF1", "OF2", "OF3"]);
        let c = SlotGroup::new("C", &[Position::Catcher], 1);
        assert_eq!(c.slot_names(), vec!["C"]);
        assert!(SlotGroup::new("P", &[Position::Pitcher], 2).is_pitching());
        assert!(!c.is_pitching());
    }

    #[test]
    fn test_contest_validate_rejects_floor_above_cap() {
        let mut contest = ContestConfig::classic(ContestFormat::Cash);
        contest.salary_floor = 60_000;
        assert!(matches!(contest.validate(), Err(StackerError::InvalidContest(_))));
    }

    #[test]
    fn test_starter_role_validity() {
        assert!(StarterRole::Batting(1).is_valid());
        assert!(StarterRole::Batting(9).is_valid());
        assert!(!StarterRole::Batting(0).is_valid());
        assert!(!StarterRole::Batting(12).is_valid());
        assert!(StarterRole::StartingPitcher.is_valid());
    }

    #[test]
    fn test_quality_score() {
        let q = EnrichmentQuality { requested: 4, resolved: 3, defaulted: 1, failed: 1 };
        assert!((q.score() - 0.75).abs() < 1e-12);
        assert_eq!(EnrichmentQuality::default().score(), 1.0);
    }

    // -- Error tests --

    #[test]
    fn test_error_display() {
        let e = StackerError::InvalidContest("no roster slots configured".into());
        assert_eq!(e.to_string(), "Invalid contest configuration: no roster slots configured");
        let e = StackerError::Strategy("duplicate profile x".into());
        assert_eq!(e.to_string(), "Strategy error: duplicate profile x");
    }
}
