//! Slate scenarios run through ingest → resolve → score → optimize.

use std::collections::BTreeSet;

use stacker::identity;
use stacker::optimizer::{optimize, Infeasibility, StopReason};
use stacker::strategy::{score_pool, ProfileRegistry, StrategyProfile};
use stacker::types::{
    ingest, Candidate, ConfirmedLineupEntry, ContestConfig, ContestFormat, SlateSize, StarterRole,
};

use crate::fixtures::{raw, scenario_a};

fn cash_profile() -> StrategyProfile {
    ProfileRegistry::builtin()
        .unwrap()
        .lookup(ContestFormat::Cash, SlateSize::Small, "pure_projection")
}

fn pool_from(records: Vec<stacker::types::RawCandidate>) -> Vec<Candidate> {
    let report = ingest(records, 2_000);
    assert!(report.rejected.is_empty());
    report.candidates
}

#[test]
fn test_scenario_a_fills_classic_lineup() {
    let pool = pool_from(scenario_a());
    assert_eq!(pool.len(), 20);

    let profile = cash_profile();
    let scored = score_pool(&pool, &profile);
    let contest = ContestConfig::classic(ContestFormat::Cash);
    let outcome = optimize(&scored, &contest, 1).unwrap();

    assert!(outcome.is_complete());
    let lineup = &outcome.lineups[0];
    assert_eq!(lineup.len(), 10);
    assert!(lineup.total_salary <= 50_000);
    assert!(lineup.total_salary >= contest.salary_floor);
    assert!(lineup.validate(&contest).is_ok());
    assert!(lineup.proven_optimal);
    assert!(lineup.slots.iter().all(|s| !s.candidate.name.starts_with("Bench Bat")));
    assert_eq!(lineup.get("C").map(|c| c.name.as_str()), Some("Will Smith"));

    // The flex outscores whoever it replaces, whichever slot it takes.
    let names: BTreeSet<&str> = lineup.slots.iter().map(|s| s.candidate.name.as_str()).collect();
    assert!(names.contains("Mookie Betts"));
}

#[test]
fn test_scenario_b_without_catcher_is_infeasible() {
    let records: Vec<_> = scenario_a().into_iter().filter(|r| r.position != "C").collect();
    let pool = pool_from(records);

    let scored = score_pool(&pool, &cash_profile());
    let contest = ContestConfig::classic(ContestFormat::Cash);
    let outcome = optimize(&scored, &contest, 1).unwrap();

    assert!(outcome.lineups.is_empty());
    assert_eq!(
        outcome.stop,
        Some(StopReason::Infeasible(Infeasibility::NotEnoughEligible {
            slot: "C".into(),
            needed: 1,
            available: 0,
        }))
    );
}

#[test]
fn test_scenario_c_lookalikes_stay_distinct() {
    let mut records = scenario_a();
    records.push(raw("Will Smith", "LAD", "LAD@SF", "C", 3600.0, 7.0));
    let pool = pool_from(records);

    let smiths: Vec<&Candidate> = pool.iter().filter(|c| c.name == "Will Smith").collect();
    assert_eq!(smiths.len(), 2);
    assert_ne!(smiths[0].id, smiths[1].id);
    assert_ne!(smiths[0].salary, smiths[1].salary);

    let scored = score_pool(&pool, &cash_profile());
    let contest = ContestConfig::classic(ContestFormat::Cash);
    let outcome = optimize(&scored, &contest, 2).unwrap();
    assert_eq!(outcome.lineups.len(), 2);

    let catchers: BTreeSet<&str> = outcome
        .lineups
        .iter()
        .filter_map(|l| l.get("C"))
        .map(|c| c.id.as_str())
        .collect();
    for lineup in &outcome.lineups {
        assert!(lineup.validate(&contest).is_ok());
        assert_eq!(lineup.slots.iter().filter(|s| s.candidate.name == "Will Smith").count(), 1);
    }
    assert!(!catchers.is_empty());
}

#[test]
fn test_single_lineup_is_idempotent() {
    let pool = pool_from(scenario_a());
    let scored = score_pool(&pool, &cash_profile());
    let contest = ContestConfig::classic(ContestFormat::Cash);

    let first = optimize(&scored, &contest, 1).unwrap();
    let second = optimize(&scored, &contest, 1).unwrap();
    assert_eq!(first.lineups[0].candidate_ids(), second.lineups[0].candidate_ids());
    assert_eq!(first.lineups[0].objective, second.lineups[0].objective);
}

#[test]
fn test_multiple_lineups_are_diverse_until_exhausted() {
    let pool = pool_from(scenario_a());
    let scored = score_pool(&pool, &cash_profile());
    let contest = ContestConfig::classic(ContestFormat::Cash);

    // Only the flex position varies: three rosters exist.
    let outcome = optimize(&scored, &contest, 4).unwrap();
    assert_eq!(outcome.lineups.len(), 3);
    assert_eq!(outcome.stop, Some(StopReason::Infeasible(Infeasibility::NoFeasibleAssignment)));

    let sets: Vec<BTreeSet<&str>> = outcome.lineups.iter().map(|l| l.candidate_ids()).collect();
    for i in 0..sets.len() {
        for j in (i + 1)..sets.len() {
            assert_ne!(sets[i], sets[j]);
        }
    }
    assert!(outcome.lineups.windows(2).all(|w| w[0].objective >= w[1].objective - 1e-9));
}

#[test]
fn test_accented_names_resolve_to_same_candidate() {
    let mut pool = pool_from(vec![
        raw("José Ramírez", "CLE", "CLE@DET", "3B", 5800.0, 10.0),
        raw("Josh Naylor", "CLE", "CLE@DET", "1B", 4400.0, 8.0),
    ]);
    let entries = vec![ConfirmedLineupEntry {
        team: "CLE".into(),
        name: "Jose Ramirez Jr.".into(),
        spot: StarterRole::Batting(3),
        source: "feed".into(),
    }];

    let report = identity::resolve(&entries, &mut pool);
    assert_eq!(report.matched, 1);
    assert_eq!(report.matches[0].candidate_id, pool[0].id);
    assert!(pool[0].is_confirmed());
    assert_eq!(pool[0].enrichment.batting_order, Some(3));
    assert!(!pool[1].is_confirmed());
}

#[test]
fn test_unmatched_entry_is_reported_not_fatal() {
    let mut pool = pool_from(scenario_a());
    let entries = vec![ConfirmedLineupEntry {
        team: "NYY".into(),
        name: "Juan Soto".into(),
        spot: StarterRole::Batting(2),
        source: "feed".into(),
    }];
    let report = identity::resolve(&entries, &mut pool);
    assert_eq!(report.matched, 0);
    assert_eq!(report.unmatched.len(), 1);
    assert!(pool.iter().all(|c| !c.is_confirmed()));
}
