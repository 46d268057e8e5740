//! Team code normalization.
//!
//! Feeds disagree on a handful of franchise abbreviations (`CWS` vs `CHW`,
//! `OAK` vs `ATH`, ...). Every comparison of team codes goes through this
//! module so that alternates are treated as the same club.

/// Pairs of interchangeable codes. The left code is canonical.
const ALTERNATES: &[(&str, &str)] = &[
    ("OAK", "ATH"),
    ("CWS", "CHW"),
    ("WSH", "WAS"),
    ("KC", "KCR"),
    ("SD", "SDP"),
    ("SF", "SFG"),
    ("TB", "TBR"),
    ("ARI", "AZ"),
];

/// Trim and uppercase a raw team code.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Map a code to its canonical spelling.
pub fn canonical(code: &str) -> String {
    let code = normalize_code(code);
    ALTERNATES
        .iter()
        .find(|(primary, alt)| *primary == code || *alt == code)
        .map(|(primary, _)| primary.to_string())
        .unwrap_or(code)
}

/// Whether two codes name the same club.
pub fn same_team(a: &str, b: &str) -> bool {
    let (a, b) = (canonical(a), canonical(b));
    !a.is_empty() && a == b
}
