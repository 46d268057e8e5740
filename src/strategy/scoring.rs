//! Scoring engine.
//!
//! Maps an enriched candidate and a strategy profile to the single score
//! the optimizer maximizes. Scoring is pure: the same candidate and
//! profile always produce the same score, and the candidate is never
//! modified. Every adjustment is a multiplier gated on the presence of its
//! input; an absent value contributes exactly 1.0.

use serde::Serialize;
use tracing::debug;

use super::profile::{ScoringParams, StrategyProfile};
use crate::types::{Candidate, ContestFormat};

/// A candidate paired with its derived optimization score.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScoredCandidate<'a> {
    pub candidate: &'a Candidate,
    pub score: f64,
}

/// Score one candidate under a profile. Never negative.
pub fn score(candidate: &Candidate, profile: &StrategyProfile) -> f64 {
    let p = &profile.scoring;
    let e = &candidate.enrichment;
    let pitcher = candidate.is_pitcher_only();
    let implied = |runs: Option<f64>| runs.filter(|r| (p.implied_valid_min..=p.implied_valid_max).contains(r));

    let base = candidate.projection.max(0.0);
    if base == 0.0 {
        return 0.0;
    }

    let mut multiplier = 1.0;

    if pitcher {
        if let Some(runs) = implied(e.opponent_implied_runs) {
            multiplier *= opponent_factor(runs, p);
        }
    } else {
        if let Some(runs) = implied(e.implied_team_runs) {
            multiplier *= implied_factor(runs, p);
        }
        if let Some(order) = e.batting_order {
            multiplier *= order_factor(order, p);
        }
    }

    multiplier *= form_factor(e.recent_form, e.consistency, p);

    if let Some(park) = e.park_factor {
        multiplier *= park_factor(park, pitcher, p);
    }
    if let Some(weather) = e.weather {
        multiplier *= (1.0 + (weather - 1.0) * p.weather_weight).max(0.0);
    }

    if candidate.is_confirmed() {
        multiplier *= p.confirmed_boost;
    }

    if profile.format == ContestFormat::Tournament {
        if let Some(ownership) = e.ownership {
            multiplier *= leverage_factor(ownership, p);
        }
        multiplier *= if pitcher {
            pitcher_upside(e.k_rate, p)
        } else {
            hitter_upside(e.barrel_rate, e.hard_hit_rate, p)
        };
    }

    (base * multiplier).max(0.0)
}

/// Score a whole pool, preserving input order.
pub fn score_pool<'a>(candidates: &'a [Candidate], profile: &StrategyProfile) -> Vec<ScoredCandidate<'a>> {
    let scored: Vec<ScoredCandidate<'a>> = candidates
        .iter()
        .map(|candidate| ScoredCandidate { candidate, score: score(candidate, profile) })
        .collect();

    debug!(
        strategy = %profile.name,
        candidates = scored.len(),
        total = scored.iter().map(|s| s.score).sum::<f64>(),
        "Pool scored"
    );
    scored
}

// ---------------------------------------------------------------------------
// Factors
// ---------------------------------------------------------------------------

/// Tier multiplier times `exp(slope × (runs − baseline))`.
///
/// With `low_penalty <= 1 <= mid_boost <= high_boost` the tier term never
/// decreases as runs rise, so any positive slope makes the whole factor
/// strictly increasing.
pub fn implied_factor(runs: f64, p: &ScoringParams) -> f64 {
    let tier = if runs >= p.implied_high {
        p.implied_high_boost
    } else if runs >= p.implied_mid {
        p.implied_mid_boost
    } else if runs < p.implied_low {
        p.implied_low_penalty
    } else {
        1.0
    };
    tier * (p.implied_slope * (runs - p.implied_baseline)).exp()
}

/// Matchup tiers on the opposing offense's implied runs, weakest first.
const OPPONENT_TIERS: &[(f64, f64)] = &[(3.5, 1.20), (4.0, 1.15), (4.5, 1.05), (5.0, 0.95), (5.5, 0.90)];
const OPPONENT_TOP_TIER: f64 = 0.85;

/// Pitchers want weak offenses. The tier multiplier is pulled toward 1.0
/// by `opponent_implied_weight`.
pub fn opponent_factor(runs: f64, p: &ScoringParams) -> f64 {
    let tier = OPPONENT_TIERS
        .iter()
        .find(|(below, _)| runs < *below)
        .map_or(OPPONENT_TOP_TIER, |&(_, factor)| factor);
    1.0 + (tier - 1.0) * p.opponent_implied_weight
}

pub fn order_factor(order: u8, p: &ScoringParams) -> f64 {
    if (1..=p.order_top_max).contains(&order) {
        p.order_top_boost
    } else if order >= p.order_bottom_min && order <= 9 {
        p.order_bottom_penalty
    } else {
        1.0
    }
}

/// Blend of recent form and consistency; either alone when the other is
/// missing.
pub fn form_factor(form: Option<f64>, consistency: Option<f64>, p: &ScoringParams) -> f64 {
    let form = form.map(|f| f.clamp(p.form_min, p.form_max));
    let consistency =
        consistency.map(|c| 1.0 + (c.clamp(0.0, 100.0) - 50.0) / 50.0 * p.consistency_scale);

    match (form, consistency) {
        (Some(f), Some(c)) => (1.0 - p.consistency_weight) * f + p.consistency_weight * c,
        (Some(f), None) => f,
        (None, Some(c)) => c,
        (None, None) => 1.0,
    }
}

/// Hitter-friendly parks help hitters and hurt pitchers by the same amount.
pub fn park_factor(park: f64, pitcher: bool, p: &ScoringParams) -> f64 {
    let delta = (park - 1.0) * p.park_weight;
    let factor = if pitcher { 1.0 - delta } else { 1.0 + delta };
    factor.max(0.0)
}

pub fn leverage_factor(ownership: f64, p: &ScoringParams) -> f64 {
    if ownership > p.ownership_high {
        p.ownership_high_penalty
    } else if ownership < p.ownership_low {
        p.ownership_low_boost
    } else {
        1.0
    }
}

pub fn hitter_upside(barrel: Option<f64>, hard_hit: Option<f64>, p: &ScoringParams) -> f64 {
    let barrel = barrel.map_or(0.0, |b| (b - p.barrel_baseline).max(0.0) * p.barrel_scale);
    let hard_hit = hard_hit.map_or(0.0, |h| (h - p.hard_hit_baseline).max(0.0) * p.hard_hit_scale);
    (1.0 + barrel + hard_hit).min(p.upside_max.max(1.0))
}

pub fn pitcher_upside(k_rate: Option<f64>, p: &ScoringParams) -> f64 {
    let Some(k) = k_rate else {
        return 1.0;
    };
    if k < p.k_rate_low {
        return p.k_rate_low_penalty;
    }
    (1.0 + (k - p.k_rate_baseline).max(0.0) * p.k_rate_scale).min(p.upside_max.max(1.0))
}
