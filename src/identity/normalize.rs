//! Name folding for cross-feed comparison.
//!
//! Different feeds spell the same athlete differently: accents
//! ("José Ramírez"), punctuation ("J.D. Martinez"), generational suffixes
//! ("Vladimir Guerrero Jr."). Folding reduces a display name to a
//! lowercase ASCII token sequence that can be compared directly.

use deunicode::deunicode;

/// Generational suffixes dropped by [`strip_suffix`].
const SUFFIXES: &[&str] = &["jr", "sr", "ii", "iii", "iv"];

/// Fold a display name: transliterate to ASCII, lowercase, turn hyphens and
/// underscores into spaces, drop any other punctuation, and collapse
/// whitespace.
pub fn fold(name: &str) -> String {
    let ascii = deunicode(name).to_lowercase();
    let cleaned: String = ascii
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() {
                Some(c)
            } else if c.is_whitespace() || c == '-' || c == '_' {
                Some(' ')
            } else {
                None
            }
        })
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop trailing generational suffixes from an already-folded name.
/// A name consisting only of a suffix is returned unchanged.
pub fn strip_suffix(folded: &str) -> String {
    let mut tokens: Vec<&str> = folded.split(' ').filter(|t| !t.is_empty()).collect();
    while tokens.len() > 1 && tokens.last().is_some_and(|t| SUFFIXES.contains(t)) {
        tokens.pop();
    }
    tokens.join(" ")
}

/// Common short forms of given names, mapped to the formal name.
const NICKNAMES: &[(&str, &str)] = &[
    ("mike", "michael"),
    ("mikey", "michael"),
    ("chris", "christopher"),
    ("alex", "alexander"),
    ("xander", "alexander"),
    ("matt", "matthew"),
    ("dave", "david"),
    ("steve", "steven"),
    ("tom", "thomas"),
    ("tommy", "thomas"),
    ("bob", "robert"),
    ("rob", "robert"),
    ("bobby", "robert"),
    ("bill", "william"),
    ("will", "william"),
    ("dan", "daniel"),
    ("danny", "daniel"),
    ("jim", "james"),
    ("jimmy", "james"),
    ("joe", "joseph"),
    ("joey", "joseph"),
    ("tony", "anthony"),
    ("rick", "richard"),
    ("tim", "timothy"),
    ("ben", "benjamin"),
    ("sam", "samuel"),
    ("nick", "nicholas"),
    ("pat", "patrick"),
    ("ed", "edward"),
    ("eddie", "edward"),
    ("chas", "charles"),
    ("charlie", "charles"),
    ("zach", "zachary"),
    ("josh", "joshua"),
    ("jake", "jacob"),
    ("andy", "andrew"),
    ("drew", "andrew"),
    ("greg", "gregory"),
    ("jon", "jonathan"),
];

/// Formal form of a folded given name; the name itself when it is not a
/// known short form.
pub fn formal_given_name(given: &str) -> &str {
    NICKNAMES
        .iter()
        .find(|(short, _)| *short == given)
        .map_or(given, |&(_, formal)| formal)
}

/// Split a folded, suffix-stripped name into given name and the rest.
/// Single-token names have no rest.
pub fn given_and_rest(folded: &str) -> Option<(&str, &str)> {
    let (given, rest) = folded.split_once(' ')?;
    (!given.is_empty() && !rest.is_empty()).then_some((given, rest))
}

/// First initial and last name of a folded, suffix-stripped name.
/// Single-token names have no usable initial.
pub fn initial_and_last(folded: &str) -> Option<(char, &str)> {
    let mut tokens = folded.split(' ').filter(|t| !t.is_empty());
    let first = tokens.next()?;
    let last = tokens.last()?;
    Some((first.chars().next()?, last))
}
