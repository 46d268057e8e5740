//! Slate fixtures shared by the integration tests.

use stacker::types::{ConfirmedLineupEntry, RawCandidate, StarterRole};

pub fn raw(name: &str, team: &str, game: &str, position: &str, salary: f64, projection: f64) -> RawCandidate {
    RawCandidate {
        id: None,
        name: name.to_string(),
        team: team.to_string(),
        opponent: None,
        game: Some(game.to_string()),
        salary,
        position: position.to_string(),
        projection,
    }
}

/// Twenty records on two games: two pitchers, one player per infield slot,
/// a SS/3B flex, three outfielders and nine designated hitters that no
/// classic slot accepts.
pub fn scenario_a() -> Vec<RawCandidate> {
    let mut pool = vec![
        raw("Gerrit Cole", "NYY", "NYY@BOS", "SP", 9500.0, 20.0),
        raw("Logan Webb", "SF", "LAD@SF", "SP", 8800.0, 18.0),
        raw("Will Smith", "LAD", "LAD@SF", "C", 3800.0, 8.0),
        raw("Freddie Freeman", "LAD", "LAD@SF", "1B", 4200.0, 9.0),
        raw("Tyler Fitzgerald", "SF", "LAD@SF", "2B", 4000.0, 7.5),
        raw("Rafael Devers", "BOS", "NYY@BOS", "3B", 4300.0, 9.5),
        raw("Anthony Volpe", "NYY", "NYY@BOS", "SS", 4100.0, 7.5),
        raw("Mookie Betts", "LAD", "LAD@SF", "SS/3B", 5200.0, 10.5),
        raw("Aaron Judge", "NYY", "NYY@BOS", "OF", 4800.0, 11.0),
        raw("Jarren Duran", "BOS", "NYY@BOS", "OF", 4500.0, 9.0),
        raw("Heliot Ramos", "SF", "LAD@SF", "OF", 3900.0, 7.0),
    ];
    let teams = [("NYY", "NYY@BOS"), ("BOS", "NYY@BOS"), ("LAD", "LAD@SF"), ("SF", "LAD@SF")];
    for i in 0..9 {
        let (team, game) = teams[i % teams.len()];
        pool.push(raw(&format!("Bench Bat {}", i + 1), team, game, "DH", 3000.0, 12.0));
    }
    pool
}

/// The ten starters of scenario A; the flex and the bench bats are not
/// confirmed.
pub fn scenario_a_confirmed() -> Vec<ConfirmedLineupEntry> {
    let entry = |team: &str, name: &str, spot: StarterRole| ConfirmedLineupEntry {
        team: team.to_string(),
        name: name.to_string(),
        spot,
        source: "test".to_string(),
    };
    vec![
        entry("NYY", "Gerrit Cole", StarterRole::StartingPitcher),
        entry("SF", "Logan Webb", StarterRole::StartingPitcher),
        entry("LAD", "Will Smith", StarterRole::Batting(5)),
        entry("LAD", "Freddie Freeman", StarterRole::Batting(3)),
        entry("SF", "Tyler Fitzgerald", StarterRole::Batting(6)),
        entry("BOS", "Rafael Devers", StarterRole::Batting(4)),
        entry("NYY", "Anthony Volpe", StarterRole::Batting(8)),
        entry("NYY", "Aaron Judge", StarterRole::Batting(2)),
        entry("BOS", "Jarren Duran", StarterRole::Batting(1)),
        entry("SF", "Heliot Ramos", StarterRole::Batting(7)),
    ]
}
