//! Strategy profiles.
//!
//! A profile is a read-only bundle of: the enrichment signals a strategy
//! needs, how many candidates deserve a rate-limited lookup, the scoring
//! parameters, and the neutral values written when a signal cannot be
//! fetched. Profiles are data, loaded from TOML; the built-in set lives in
//! `strategies.toml` at the crate root.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use tracing::{debug, warn};

use crate::types::{Candidate, ContestFormat, Signal, SlateSize, StackerError};

const BUILTIN_PROFILES: &str = include_str!("../../strategies.toml");

// ---------------------------------------------------------------------------
// Scoring parameters
// ---------------------------------------------------------------------------

/// Every threshold and multiplier the scoring engine uses.
///
/// Defaults are neutral: a parameter set that sets nothing leaves the raw
/// projection untouched.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScoringParams {
    /// Implied runs at which the continuous adjustment is exactly 1.0.
    pub implied_baseline: f64,
    /// Below this, the low-total penalty applies.
    pub implied_low: f64,
    /// At or above this, the mid-tier boost applies.
    pub implied_mid: f64,
    /// At or above this, the high-tier boost applies.
    pub implied_high: f64,
    pub implied_low_penalty: f64,
    pub implied_mid_boost: f64,
    pub implied_high_boost: f64,
    /// Slope of `exp(slope × (runs − baseline))`.
    pub implied_slope: f64,
    /// Implied totals outside `implied_valid_min..=implied_valid_max` are
    /// treated as bad feed data and ignored.
    pub implied_valid_min: f64,
    pub implied_valid_max: f64,
    /// How strongly a pitcher's opponent implied total moves the score;
    /// 0 ignores it, 1 applies the full matchup tiers.
    pub opponent_implied_weight: f64,

    /// Batting slots `1..=order_top_max` are boosted.
    pub order_top_max: u8,
    pub order_top_boost: f64,
    /// Batting slots `order_bottom_min..=9` are penalized.
    pub order_bottom_min: u8,
    pub order_bottom_penalty: f64,

    pub form_min: f64,
    pub form_max: f64,
    /// Consistency 100 maps to `1 + consistency_scale`, 0 to `1 − consistency_scale`.
    pub consistency_scale: f64,
    /// Weight of consistency when blending with recent form, 0–1.
    pub consistency_weight: f64,

    pub park_weight: f64,
    pub weather_weight: f64,
    pub confirmed_boost: f64,

    pub ownership_high: f64,
    pub ownership_high_penalty: f64,
    pub ownership_low: f64,
    pub ownership_low_boost: f64,
    pub barrel_baseline: f64,
    pub barrel_scale: f64,
    pub hard_hit_baseline: f64,
    pub hard_hit_scale: f64,
    pub k_rate_baseline: f64,
    pub k_rate_scale: f64,
    /// Pitchers striking out fewer than this, in percent, are penalized.
    pub k_rate_low: f64,
    pub k_rate_low_penalty: f64,
    /// Cap on the upside multiplier.
    pub upside_max: f64,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            implied_baseline: 4.5,
            implied_low: 3.5,
            implied_mid: 4.5,
            implied_high: 5.0,
            implied_low_penalty: 1.0,
            implied_mid_boost: 1.0,
            implied_high_boost: 1.0,
            implied_slope: 0.0,
            implied_valid_min: 2.0,
            implied_valid_max: 15.0,
            opponent_implied_weight: 0.0,
            order_top_max: 3,
            order_top_boost: 1.0,
            order_bottom_min: 9,
            order_bottom_penalty: 1.0,
            form_min: 0.5,
            form_max: 2.0,
            consistency_scale: 0.0,
            consistency_weight: 0.5,
            park_weight: 0.0,
            weather_weight: 0.0,
            confirmed_boost: 1.0,
            ownership_high: 100.0,
            ownership_high_penalty: 1.0,
            ownership_low: 0.0,
            ownership_low_boost: 1.0,
            barrel_baseline: 8.0,
            barrel_scale: 0.0,
            hard_hit_baseline: 40.0,
            hard_hit_scale: 0.0,
            k_rate_baseline: 22.0,
            k_rate_scale: 0.0,
            k_rate_low: 0.0,
            k_rate_low_penalty: 1.0,
            upside_max: 1.0,
        }
    }
}

impl ScoringParams {
    fn validate(&self, name: &str) -> Result<(), StackerError> {
        let bad = |what: &str| StackerError::Strategy(format!("scoring set {name}: {what}"));

        if !(self.implied_low <= self.implied_mid && self.implied_mid <= self.implied_high) {
            return Err(bad("implied thresholds must satisfy low <= mid <= high"));
        }
        if !(self.implied_low_penalty > 0.0
            && self.implied_low_penalty <= 1.0
            && 1.0 <= self.implied_mid_boost
            && self.implied_mid_boost <= self.implied_high_boost)
        {
            return Err(bad("implied multipliers must satisfy 0 < low <= 1 <= mid <= high"));
        }
        if self.implied_slope < 0.0 {
            return Err(bad("implied_slope must not be negative"));
        }
        if self.implied_valid_min >= self.implied_valid_max {
            return Err(bad("implied_valid_min must be below implied_valid_max"));
        }
        if !(0.0..=1.0).contains(&self.opponent_implied_weight) {
            return Err(bad("opponent_implied_weight must be within 0..=1"));
        }
        if !(self.k_rate_low_penalty > 0.0 && self.k_rate_low_penalty <= 1.0) {
            return Err(bad("k_rate_low_penalty must be within (0, 1]"));
        }
        if self.form_min > self.form_max {
            return Err(bad("form_min above form_max"));
        }
        if !(0.0..=1.0).contains(&self.consistency_weight) {
            return Err(bad("consistency_weight must be within 0..=1"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Neutral defaults
// ---------------------------------------------------------------------------

/// Values written for signals that were not fetched or could not be fetched.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NeutralDefaults {
    pub implied_team_runs: Option<f64>,
    pub recent_form: Option<f64>,
    pub consistency: Option<f64>,
    pub park_factor: Option<f64>,
    pub weather: Option<f64>,
    /// Estimate ownership from salary tier instead of leaving it absent.
    pub ownership_from_salary: bool,
}

impl Default for NeutralDefaults {
    fn default() -> Self {
        Self {
            implied_team_runs: None,
            recent_form: Some(1.0),
            consistency: Some(50.0),
            park_factor: Some(1.0),
            weather: Some(1.0),
            ownership_from_salary: false,
        }
    }
}

impl NeutralDefaults {
    /// Fill the fields backing `signal` that are still absent.
    pub fn apply(&self, signal: Signal, candidate: &mut Candidate) {
        let salary = candidate.salary;
        let pitcher = candidate.is_pitcher_only();
        let e = &mut candidate.enrichment;
        match signal {
            Signal::ImpliedTotal if pitcher => fill(&mut e.opponent_implied_runs, self.implied_team_runs),
            Signal::ImpliedTotal => fill(&mut e.implied_team_runs, self.implied_team_runs),
            Signal::RecentForm => fill(&mut e.recent_form, self.recent_form),
            Signal::Consistency => fill(&mut e.consistency, self.consistency),
            Signal::ParkFactor => fill(&mut e.park_factor, self.park_factor),
            Signal::Weather => fill(&mut e.weather, self.weather),
            Signal::Ownership if self.ownership_from_salary => {
                fill(&mut e.ownership, Some(ownership_by_salary(salary)))
            }
            // Contact quality and strikeout rate stay absent, which scores neutral.
            _ => {}
        }
    }
}

fn fill(slot: &mut Option<f64>, value: Option<f64>) {
    if slot.is_none() {
        *slot = value;
    }
}

/// Rough ownership estimate by salary tier, in percent.
pub fn ownership_by_salary(salary: u32) -> f64 {
    match salary {
        s if s > 9_000 => 20.0,
        s if s > 7_000 => 15.0,
        s if s > 5_000 => 10.0,
        _ => 5.0,
    }
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

/// A named, read-only strategy bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyProfile {
    pub name: String,
    pub format: ContestFormat,
    pub signals: BTreeSet<Signal>,
    /// How many candidates receive rate-limited lookups.
    pub lookup_limit: usize,
    pub scoring: ScoringParams,
    pub defaults: NeutralDefaults,
}

impl StrategyProfile {
    pub fn requires(&self, signal: Signal) -> bool {
        self.signals.contains(&signal)
    }
}

#[derive(Debug, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    defaults: NeutralDefaults,
    scoring: std::collections::HashMap<String, ScoringParams>,
    #[serde(rename = "profile")]
    profiles: Vec<ProfileEntry>,
    recommended: Recommended,
    fallback: PerFormat<String>,
    #[serde(default, rename = "adjustment")]
    adjustments: Vec<SlateAdjustment>,
}

#[derive(Debug, Deserialize)]
struct ProfileEntry {
    name: String,
    format: ContestFormat,
    scoring: String,
    #[serde(default)]
    signals: Vec<Signal>,
    #[serde(default)]
    lookup_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
struct PerFormat<T> {
    cash: T,
    tournament: T,
}

impl<T> PerFormat<T> {
    fn get(&self, format: ContestFormat) -> &T {
        match format {
            ContestFormat::Cash => &self.cash,
            ContestFormat::Tournament => &self.tournament,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct BySize {
    small: String,
    medium: String,
    large: String,
}

impl BySize {
    fn get(&self, size: SlateSize) -> &str {
        match size {
            SlateSize::Small => &self.small,
            SlateSize::Medium => &self.medium,
            SlateSize::Large => &self.large,
        }
    }
}

type Recommended = PerFormat<BySize>;

/// Per-slate-size tweak to a profile's signal set and lookup limit.
#[derive(Debug, Clone, Deserialize)]
pub struct SlateAdjustment {
    pub slate: SlateSize,
    /// Restrict to one format; applies to both when absent.
    #[serde(default)]
    pub format: Option<ContestFormat>,
    #[serde(default)]
    pub add: Vec<Signal>,
    #[serde(default)]
    pub remove: Vec<Signal>,
    #[serde(default)]
    pub lookup_scale: Option<f64>,
    #[serde(default)]
    pub lookup_cap: Option<usize>,
}

impl SlateAdjustment {
    fn applies(&self, format: ContestFormat, size: SlateSize) -> bool {
        self.slate == size && self.format.map_or(true, |f| f == format)
    }

    fn apply(&self, profile: &mut StrategyProfile) {
        for signal in &self.remove {
            profile.signals.remove(signal);
        }
        profile.signals.extend(self.add.iter().copied());
        if let Some(scale) = self.lookup_scale {
            profile.lookup_limit = (profile.lookup_limit as f64 * scale).round() as usize;
        }
        if let Some(cap) = self.lookup_cap {
            profile.lookup_limit = profile.lookup_limit.min(cap);
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// All known profiles plus the per-format selection tables.
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: Vec<StrategyProfile>,
    recommended: Recommended,
    /// Index into `profiles` of each format's fallback.
    fallback: PerFormat<usize>,
    adjustments: Vec<SlateAdjustment>,
}

impl ProfileRegistry {
    /// The profiles shipped with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_PROFILES).context("Failed to parse built-in strategies")
    }

    /// Load profiles from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read strategies file: {path}"))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse strategies file: {path}"))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: ProfileFile = toml::from_str(contents)?;

        for (name, params) in &file.scoring {
            params.validate(name)?;
        }

        let mut profiles = Vec::with_capacity(file.profiles.len());
        for entry in file.profiles {
            let scoring = file.scoring.get(&entry.scoring).cloned().ok_or_else(|| {
                StackerError::Strategy(format!(
                    "profile {} references unknown scoring set {}",
                    entry.name, entry.scoring
                ))
            })?;
            if entry.format == ContestFormat::Tournament && scoring.implied_slope <= 0.0 {
                return Err(StackerError::Strategy(format!(
                    "tournament profile {} needs a positive implied_slope",
                    entry.name
                ))
                .into());
            }
            if profiles.iter().any(|p: &StrategyProfile| p.name == entry.name) {
                return Err(StackerError::Strategy(format!("duplicate profile {}", entry.name)).into());
            }

            let mut signals: BTreeSet<Signal> = entry.signals.into_iter().collect();
            if entry.format == ContestFormat::Tournament {
                signals.insert(Signal::Ownership);
            }

            profiles.push(StrategyProfile {
                name: entry.name,
                format: entry.format,
                signals,
                lookup_limit: entry.lookup_limit,
                scoring,
                defaults: file.defaults.clone(),
            });
        }

        let fallback = PerFormat {
            cash: fallback_index(&profiles, &file.fallback, ContestFormat::Cash)?,
            tournament: fallback_index(&profiles, &file.fallback, ContestFormat::Tournament)?,
        };
        let registry = Self {
            profiles,
            recommended: file.recommended,
            fallback,
            adjustments: file.adjustments,
        };
        registry.check_recommended()?;
        Ok(registry)
    }

    fn check_recommended(&self) -> Result<(), StackerError> {
        for &format in ContestFormat::ALL {
            for &size in SlateSize::ALL {
                let name = self.recommended.get(format).get(size);
                match self.get(name) {
                    Some(p) if p.format == format => {}
                    _ => {
                        return Err(StackerError::Strategy(format!(
                            "recommended {format}/{size} strategy {name} is not a {format} profile"
                        )))
                    }
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&StrategyProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.name.as_str())
    }

    /// Strategy to use for a format and slate size when none is requested.
    pub fn recommended(&self, format: ContestFormat, size: SlateSize) -> &str {
        self.recommended.get(format).get(size)
    }

    /// Resolve the profile for a (format, slate size, strategy) triple.
    ///
    /// Unknown names, and names belonging to the other format, fall back
    /// to the format's default profile. Slate adjustments are applied to
    /// the returned copy.
    pub fn lookup(&self, format: ContestFormat, size: SlateSize, name: &str) -> StrategyProfile {
        let base = match self.get(name) {
            Some(p) if p.format == format => p,
            Some(p) => {
                warn!(
                    strategy = name,
                    strategy_format = %p.format,
                    requested_format = %format,
                    "Strategy belongs to another format, using fallback"
                );
                self.fallback_profile(format)
            }
            None => {
                warn!(strategy = name, format = %format, "Unknown strategy, using fallback");
                self.fallback_profile(format)
            }
        };

        let mut profile = base.clone();
        for adjustment in self.adjustments.iter().filter(|a| a.applies(format, size)) {
            adjustment.apply(&mut profile);
        }
        if format == ContestFormat::Tournament {
            profile.signals.insert(Signal::Ownership);
        }

        debug!(
            strategy = %profile.name,
            format = %format,
            slate = %size,
            signals = ?profile.signals,
            lookup_limit = profile.lookup_limit,
            "Strategy profile resolved"
        );
        profile
    }

    fn fallback_profile(&self, format: ContestFormat) -> &StrategyProfile {
        &self.profiles[*self.fallback.get(format)]
    }
}

/// Position of the format's fallback profile, which must exist and belong
/// to that format.
fn fallback_index(
    profiles: &[StrategyProfile],
    names: &PerFormat<String>,
    format: ContestFormat,
) -> Result<usize, StackerError> {
    let name = names.get(format);
    profiles
        .iter()
        .position(|p| &p.name == name && p.format == format)
        .ok_or_else(|| StackerError::Strategy(format!("fallback {name} is not a {format} profile")))
}
