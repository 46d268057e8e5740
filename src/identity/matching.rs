//! Fuzzy name-matching rules.
//!
//! Each rule yields a fixed confidence; the best applicable rule wins.
//! The same rules back the confirmed-lineup resolver and any enrichment
//! source that keys its records by a free-text name.

use super::normalize::{fold, formal_given_name, given_and_rest, initial_and_last, strip_suffix};

/// Folded names are identical.
pub const EXACT: f64 = 1.0;
/// One folded name contains the other on token boundaries.
pub const CONTAINS: f64 = 0.95;
/// Names are identical once generational suffixes are dropped.
pub const SUFFIX_INSENSITIVE: f64 = 0.9;
/// Given names are a nickname pair ("Mike"/"Michael") and the rest matches.
pub const NICKNAME: f64 = 0.88;
/// Same last name and same first initial.
pub const LAST_NAME_INITIAL: f64 = 0.85;

/// Minimum confidence for a match to be accepted.
pub const DEFAULT_FLOOR: f64 = 0.75;

/// Confidence that two display names refer to the same person, 0.0 if no
/// rule applies.
pub fn name_confidence(a: &str, b: &str) -> f64 {
    folded_confidence(&fold(a), &fold(b))
}

/// [`name_confidence`] over names that are already folded.
pub fn folded_confidence(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return EXACT;
    }

    // Pad with spaces so "ian happ" does not match inside "brian happ".
    let (pa, pb) = (format!(" {a} "), format!(" {b} "));
    if pa.contains(&pb) || pb.contains(&pa) {
        return CONTAINS;
    }

    let (sa, sb) = (strip_suffix(a), strip_suffix(b));
    if sa == sb {
        return SUFFIX_INSENSITIVE;
    }

    if let (Some((ga, ra)), Some((gb, rb))) = (given_and_rest(&sa), given_and_rest(&sb)) {
        if ra == rb && formal_given_name(ga) == formal_given_name(gb) {
            return NICKNAME;
        }
    }

    match (initial_and_last(&sa), initial_and_last(&sb)) {
        (Some((ia, la)), Some((ib, lb))) if ia == ib && la == lb => LAST_NAME_INITIAL,
        _ => 0.0,
    }
}

/// Pick the best-matching item for `target`.
///
/// Returns the index into `names` and the confidence of the winner. Only a
/// strictly better score replaces the current best, so ties go to the
/// earliest item.
pub fn best_match<'n, I>(target: &str, names: I, floor: f64) -> Option<(usize, f64)>
where
    I: IntoIterator<Item = &'n str>,
{
    let target = fold(target);
    let mut best: Option<(usize, f64)> = None;

    for (idx, name) in names.into_iter().enumerate() {
        let confidence = folded_confidence(&target, &fold(name));
        if confidence < floor {
            continue;
        }
        if best.map_or(true, |(_, b)| confidence > b) {
            best = Some((idx, confidence));
        }
    }

    best
}
