//! Full slate runs: request → prepared slate → lineups.

use std::sync::Arc;

use stacker::data::park::ParkFactorSource;
use stacker::data::Attributes;
use stacker::engine::{Enricher, EnricherSettings, Pipeline, SlateRequest};
use stacker::strategy::ProfileRegistry;
use stacker::types::{ContestFormat, Signal, SlateSize, StackerError};

use crate::fixtures::{scenario_a, scenario_a_confirmed};
use crate::mock_source::MockSource;

fn vegas() -> MockSource {
    MockSource::new()
        .with_team("NYY", Attributes { implied_team_runs: Some(5.8), ..Default::default() })
        .with_team("BOS", Attributes { implied_team_runs: Some(4.9), ..Default::default() })
        .with_team("LAD", Attributes { implied_team_runs: Some(5.2), ..Default::default() })
        .with_team("SF", Attributes { implied_team_runs: Some(3.4), ..Default::default() })
}

fn pipeline(vegas: MockSource) -> Pipeline {
    let registry = Arc::new(ProfileRegistry::builtin().unwrap());
    let enricher = Enricher::new(registry.clone(), EnricherSettings::default())
        .with_source("vegas", &[Signal::ImpliedTotal], Arc::new(vegas))
        .with_source("parks", &[Signal::ParkFactor], Arc::new(ParkFactorSource));
    Pipeline::new(registry, enricher)
}

fn request(format: ContestFormat) -> SlateRequest {
    SlateRequest {
        format,
        strategy: None,
        games: None,
        lineups: 1,
        confirmed_only: false,
        candidates: scenario_a(),
        confirmed: scenario_a_confirmed(),
    }
}

#[tokio::test]
async fn test_tournament_slate_end_to_end() {
    let source = vegas();
    let mut pipeline = pipeline(source.clone());

    let slate = pipeline.prepare(request(ContestFormat::Tournament)).await.unwrap();

    assert_eq!(slate.games, 2);
    assert_eq!(slate.size, SlateSize::Small);
    assert_eq!(slate.profile.name, "tournament_winner_gpp");
    assert!(slate.rejected.is_empty());
    assert_eq!(slate.resolution.matched, 10);
    assert!(slate.enrichment.resolved > 0);
    assert_eq!(source.call_count(), 4);

    let judge = slate.candidates.iter().find(|c| c.name == "Aaron Judge").unwrap();
    assert_eq!(judge.enrichment.implied_team_runs, Some(5.8));
    assert_eq!(judge.enrichment.park_factor, Some(1.03));
    assert!(judge.enrichment.ownership.is_some());

    let outcome = slate.optimize(3).unwrap();
    assert_eq!(outcome.lineups.len(), 3);
    for lineup in &outcome.lineups {
        assert!(lineup.validate(&slate.contest).is_ok());
        assert!(lineup.total_salary <= 50_000);
    }
}

#[tokio::test]
async fn test_higher_implied_total_scores_higher() {
    let mut pipeline = pipeline(vegas());
    let mut req = request(ContestFormat::Tournament);
    req.confirmed.clear();
    let slate = pipeline.prepare(req).await.unwrap();
    let scored = slate.scored();

    // Bench bats share salary and projection; only the team differs.
    let score_of = |team: &str| {
        scored
            .iter()
            .find(|s| s.candidate.name.starts_with("Bench Bat") && s.candidate.team == team)
            .map(|s| s.score)
            .unwrap()
    };
    assert!(score_of("NYY") > score_of("SF"));
}

#[tokio::test]
async fn test_confirmed_only_keeps_starters() {
    let mut pipeline = pipeline(vegas());
    let mut req = request(ContestFormat::Tournament);
    req.confirmed_only = true;

    let slate = pipeline.prepare(req).await.unwrap();
    assert_eq!(slate.candidates.len(), 10);
    assert!(slate.candidates.iter().all(|c| c.is_confirmed()));

    let outcome = slate.optimize(1).unwrap();
    assert_eq!(outcome.lineups[0].len(), 10);
    assert!(outcome.lineups[0].slots.iter().all(|s| s.candidate.name != "Mookie Betts"));
}

#[tokio::test]
async fn test_explicit_strategy_and_game_count() {
    let mut pipeline = pipeline(vegas());
    let mut req = request(ContestFormat::Cash);
    req.strategy = Some("pure_projection".into());
    req.games = Some(12);

    let slate = pipeline.prepare(req).await.unwrap();
    assert_eq!(slate.size, SlateSize::Large);
    assert_eq!(slate.profile.name, "pure_projection");
    assert_eq!(slate.enrichment.fetched, 0);
    assert!(slate.candidates.iter().all(|c| c.enrichment.implied_team_runs.is_none()));

    let outcome = slate.optimize(1).unwrap();
    assert!(outcome.is_complete());
}

#[tokio::test]
async fn test_invalid_contest_is_an_error() {
    let registry = Arc::new(ProfileRegistry::builtin().unwrap());
    let enricher = Enricher::new(registry.clone(), EnricherSettings::default());
    let mut contest = stacker::types::ContestConfig::classic(ContestFormat::Cash);
    contest.salary_floor = 60_000;
    let mut pipeline = Pipeline::new(registry, enricher).with_contest(contest);

    let err = pipeline.prepare(request(ContestFormat::Cash)).await.unwrap_err();
    assert!(matches!(err, StackerError::InvalidContest(_)));
}

#[tokio::test]
async fn test_rejected_records_are_reported() {
    let mut pipeline = pipeline(vegas());
    let mut req = request(ContestFormat::Cash);
    req.candidates.push(crate::fixtures::raw("", "NYY", "NYY@BOS", "OF", 3000.0, 5.0));
    req.candidates.push(crate::fixtures::raw("Cheap Guy", "NYY", "NYY@BOS", "OF", 1500.0, 5.0));

    let slate = pipeline.prepare(req).await.unwrap();
    assert_eq!(slate.rejected.len(), 2);
    assert_eq!(slate.candidates.len(), 20);
}
