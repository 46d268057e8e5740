//! Enrichment coordinator behaviour against mock sources.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use stacker::data::{Attributes, IdentityHints};
use stacker::engine::{Enricher, EnricherSettings};
use stacker::strategy::{ProfileRegistry, StrategyProfile};
use stacker::types::{ingest, Candidate, ContestFormat, Signal, SlateSize};

use crate::fixtures::scenario_a;
use crate::mock_source::{MockFeed, MockSource};

fn registry() -> Arc<ProfileRegistry> {
    Arc::new(ProfileRegistry::builtin().unwrap())
}

fn pool() -> Vec<Candidate> {
    ingest(scenario_a(), 2_000).candidates
}

fn profile_with(signals: &[Signal], lookup_limit: usize) -> StrategyProfile {
    let mut profile = registry().lookup(ContestFormat::Cash, SlateSize::Medium, "pure_projection");
    profile.signals = signals.iter().copied().collect::<BTreeSet<_>>();
    profile.lookup_limit = lookup_limit;
    profile
}

#[tokio::test]
async fn test_team_signals_fetched_once_per_team() {
    let source = MockSource::new()
        .with_team("NYY", Attributes { implied_team_runs: Some(5.8), ..Default::default() })
        .with_team("BOS", Attributes { implied_team_runs: Some(4.9), ..Default::default() })
        .with_team("LAD", Attributes { implied_team_runs: Some(5.2), ..Default::default() })
        .with_team("SF", Attributes { implied_team_runs: Some(3.4), ..Default::default() });
    let mut enricher = Enricher::new(registry(), EnricherSettings::default()).with_source(
        "vegas",
        &[Signal::ImpliedTotal],
        Arc::new(source.clone()),
    );

    let mut cands = pool();
    let report = enricher.enrich_with_profile(&mut cands, &profile_with(&[Signal::ImpliedTotal], 0)).await;

    assert_eq!(source.call_count(), 4);
    assert!(source.calls().iter().all(|h| h.name.is_none()));
    assert_eq!(report.fetched, 4);
    assert_eq!(report.resolved, cands.len());
    let judge = cands.iter().find(|c| c.name == "Aaron Judge").unwrap();
    assert_eq!(judge.enrichment.implied_team_runs, Some(5.8));
    assert_eq!(judge.enrichment.quality.score(), 1.0);

    // Pitchers carry the opposing offense's total.
    let cole = cands.iter().find(|c| c.name == "Gerrit Cole").unwrap();
    assert_eq!(cole.enrichment.opponent_implied_runs, Some(4.9));
    assert_eq!(cole.enrichment.implied_team_runs, None);
}

#[tokio::test]
async fn test_player_signals_use_player_hints() {
    let source = MockSource::new()
        .with_player("NYY", "Aaron Judge", Attributes { recent_form: Some(1.12), ..Default::default() });
    let mut enricher = Enricher::new(registry(), EnricherSettings::default()).with_source(
        "form",
        &[Signal::RecentForm],
        Arc::new(source.clone()),
    );

    let mut cands = pool();
    let report = enricher.enrich_with_profile(&mut cands, &profile_with(&[Signal::RecentForm], 0)).await;

    assert_eq!(source.call_count(), cands.len());
    assert_eq!(report.resolved, 1);
    assert_eq!(report.defaulted, cands.len() - 1);
    for c in &cands {
        let expected = if c.name == "Aaron Judge" { 1.12 } else { 1.0 };
        assert_eq!(c.enrichment.recent_form, Some(expected));
    }
}

#[tokio::test]
async fn test_failing_source_degrades_to_defaults() {
    let source = MockSource::new();
    source.set_error("feed unavailable");
    let mut enricher = Enricher::new(registry(), EnricherSettings::default()).with_source(
        "broken",
        &[Signal::ParkFactor, Signal::Consistency],
        Arc::new(source.clone()),
    );

    let mut cands = pool();
    let profile = profile_with(&[Signal::ParkFactor, Signal::Consistency], 0);
    let report = enricher.enrich_with_profile(&mut cands, &profile).await;

    assert_eq!(report.resolved, 0);
    assert_eq!(report.failed, report.fetched);
    assert_eq!(report.defaulted, cands.len() * 2);
    for c in &cands {
        assert_eq!(c.enrichment.park_factor, Some(1.0));
        assert_eq!(c.enrichment.consistency, Some(50.0));
        assert_eq!(c.enrichment.quality.failed, 2);
        assert_eq!(c.enrichment.quality.score(), 0.0);
    }

    // Failures are not cached: a recovered feed is asked again.
    source.clear_error();
    let before = source.call_count();
    let report = enricher.enrich_with_profile(&mut cands, &profile).await;
    assert_eq!(report.failed, 0);
    assert!(source.call_count() > before);
}

#[tokio::test]
async fn test_slow_source_times_out() {
    let source = MockSource::new()
        .with_team("NYY", Attributes { weather: Some(1.05), ..Default::default() })
        .with_delay(Duration::from_millis(500));
    let settings = EnricherSettings {
        request_timeout: Duration::from_millis(20),
        ..EnricherSettings::default()
    };
    let mut enricher =
        Enricher::new(registry(), settings).with_source("slow", &[Signal::Weather], Arc::new(source.clone()));

    let mut cands = pool();
    let report = enricher.enrich_with_profile(&mut cands, &profile_with(&[Signal::Weather], 0)).await;

    // One lookup per ballpark: BOS and SF.
    assert_eq!(report.timed_out, 2);
    assert_eq!(report.resolved, 0);
    assert!(cands.iter().all(|c| c.enrichment.weather == Some(1.0)));
}

#[tokio::test]
async fn test_rate_limited_signal_only_for_top_candidates() {
    let mut feed = MockFeed::new();
    feed.expect_fetch()
        .times(3)
        .returning(|_hints: &IdentityHints| Ok(Some(Attributes { barrel_rate: Some(15.0), ..Default::default() })));
    let mut enricher = Enricher::new(registry(), EnricherSettings::default()).with_source(
        "statcast",
        &[Signal::ContactQuality],
        Arc::new(feed),
    );

    let mut cands = pool();
    let report = enricher.enrich_with_profile(&mut cands, &profile_with(&[Signal::ContactQuality], 3)).await;

    assert_eq!(report.fetched, 3);
    assert_eq!(report.skipped_by_limit, cands.len() - 3);

    // Highest salaries: Cole, Webb, Betts.
    let enriched: BTreeSet<&str> = cands
        .iter()
        .filter(|c| c.enrichment.barrel_rate.is_some())
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(enriched, BTreeSet::from(["Gerrit Cole", "Logan Webb", "Mookie Betts"]));
}

#[tokio::test]
async fn test_cache_serves_repeat_lookups() {
    let mut feed = MockFeed::new();
    feed.expect_fetch()
        .times(2)
        .returning(|_hints: &IdentityHints| Ok(Some(Attributes { park_factor: Some(1.03), ..Default::default() })));
    let mut enricher =
        Enricher::new(registry(), EnricherSettings::default()).with_source("parks", &[Signal::ParkFactor], Arc::new(feed));
    let profile = profile_with(&[Signal::ParkFactor], 0);

    let mut cands = pool();
    let first = enricher.enrich_with_profile(&mut cands, &profile).await;
    let second = enricher.enrich_with_profile(&mut cands, &profile).await;

    assert_eq!(first.fetched, 2);
    assert_eq!(second.fetched, 0);
    assert_eq!(second.cache_hits, 2);
    assert_eq!(second.resolved, cands.len());
    assert_eq!(enricher.total_calls(), 2);
    assert!((enricher.cache_hit_rate() - 0.5).abs() < 1e-9);
}

#[tokio::test]
async fn test_cleared_cache_fetches_again() {
    let source = MockSource::new().with_team("NYY", Attributes { park_factor: Some(1.02), ..Default::default() });
    let mut enricher = Enricher::new(registry(), EnricherSettings::default()).with_source(
        "parks",
        &[Signal::ParkFactor],
        Arc::new(source.clone()),
    );
    let profile = profile_with(&[Signal::ParkFactor], 0);

    let mut cands = pool();
    enricher.enrich_with_profile(&mut cands, &profile).await;
    assert_eq!(source.call_count(), 2);
    assert!(!enricher.cache().is_empty());

    enricher.cache().clear();
    enricher.enrich_with_profile(&mut cands, &profile).await;
    assert_eq!(source.call_count(), 4);
}

#[tokio::test]
async fn test_venue_signals_keyed_by_ballpark() {
    let source = MockSource::new()
        .with_team("BOS", Attributes { weather: Some(0.97), ..Default::default() })
        .with_team("SF", Attributes { weather: Some(0.92), ..Default::default() });
    let mut enricher = Enricher::new(registry(), EnricherSettings::default()).with_source(
        "weather",
        &[Signal::Weather],
        Arc::new(source.clone()),
    );

    let mut cands = pool();
    enricher.enrich_with_profile(&mut cands, &profile_with(&[Signal::Weather], 0)).await;

    assert_eq!(source.call_count(), 2);
    assert!(source.calls().iter().all(|h| h.team == h.venue && h.opponent.is_none()));
    for c in &cands {
        let expected = if c.venue() == "BOS" { 0.97 } else { 0.92 };
        assert_eq!(c.enrichment.weather, Some(expected), "{}", c.name);
    }
}

#[tokio::test]
async fn test_enrich_by_strategy_name() {
    let source = MockSource::new();
    let mut enricher = Enricher::new(registry(), EnricherSettings::default()).with_source(
        "own",
        Signal::ALL,
        Arc::new(source.clone()),
    );

    let mut cands = pool();
    let report = enricher
        .enrich(&mut cands, SlateSize::Medium, "no_such_strategy", ContestFormat::Tournament)
        .await;

    // Unknown names fall back to the format default, which needs ownership.
    assert_eq!(report.strategy, "tournament_default");
    assert!(report.signals.contains(&Signal::Ownership));
    assert!(cands.iter().all(|c| c.enrichment.ownership.is_some()));
}
