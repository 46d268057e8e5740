//! Enrichment coordinator.
//!
//! Decides which signals a strategy needs, fetches each one once per
//! subject (team, ballpark or player) through the registered sources, and
//! writes the results, or the strategy's neutral defaults, into the
//! candidates.
//! Fetches run on a bounded worker pool with a per-request timeout;
//! quota-limited signals are restricted to the top of the slate and pass
//! through a shared rate limiter. Results are cached with per-signal TTL.

use chrono::Duration;
use futures::stream::{self, StreamExt};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::cache::EnrichmentCache;
use crate::data::{Attributes, EnrichmentSource, IdentityHints, Subject};
use crate::strategy::{ProfileRegistry, StrategyProfile};
use crate::types::{Candidate, ContestFormat, EnrichmentQuality, Signal, SlateSize};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Default TTL for cached lookups.
const DEFAULT_CACHE_TTL_MINS: i64 = 30;

/// Park factors barely change within a season.
const PARK_CACHE_TTL_MINS: i64 = 24 * 60;

/// Ownership projections move quickly before lock.
const OWNERSHIP_CACHE_TTL_MINS: i64 = 15;

#[derive(Debug, Clone)]
pub struct EnricherSettings {
    /// Maximum concurrent fetches.
    pub workers: usize,
    pub request_timeout: std::time::Duration,
    /// Rate for quota-limited signals.
    pub lookups_per_second: u32,
    pub default_ttl: Duration,
    pub ttl: HashMap<Signal, Duration>,
}

impl Default for EnricherSettings {
    fn default() -> Self {
        let ttl = HashMap::from([
            (Signal::ParkFactor, Duration::minutes(PARK_CACHE_TTL_MINS)),
            (Signal::Ownership, Duration::minutes(OWNERSHIP_CACHE_TTL_MINS)),
        ]);
        Self {
            workers: 8,
            request_timeout: std::time::Duration::from_secs(5),
            lookups_per_second: 5,
            default_ttl: Duration::minutes(DEFAULT_CACHE_TTL_MINS),
            ttl,
        }
    }
}

impl EnricherSettings {
    pub fn ttl_for(&self, signal: Signal) -> Duration {
        self.ttl.get(&signal).copied().unwrap_or(self.default_ttl)
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Counts from one enrichment pass. Lookup counts are per (subject,
/// signal); resolved/defaulted counts are per (candidate, signal).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnrichmentReport {
    pub strategy: String,
    pub signals: Vec<Signal>,
    /// Lookups sent to sources.
    pub fetched: usize,
    pub cache_hits: usize,
    pub resolved: usize,
    pub defaulted: usize,
    /// Lookups where a source returned an error.
    pub failed: usize,
    /// Lookups where a source exceeded the request timeout.
    pub timed_out: usize,
    /// Candidates outside the lookup limit for a quota-limited signal.
    pub skipped_by_limit: usize,
}

#[derive(Debug, Clone)]
enum FetchOutcome {
    Found(Attributes),
    Absent,
    Failed,
    TimedOut,
}

impl FetchOutcome {
    fn from_cached(value: Option<Attributes>) -> Self {
        value.map_or(FetchOutcome::Absent, FetchOutcome::Found)
    }
}

// ---------------------------------------------------------------------------
// Enricher
// ---------------------------------------------------------------------------

struct RegisteredSource {
    name: String,
    signals: BTreeSet<Signal>,
    source: Arc<dyn EnrichmentSource>,
}

pub struct Enricher {
    registry: Arc<ProfileRegistry>,
    sources: Vec<RegisteredSource>,
    cache: EnrichmentCache,
    limiter: DefaultDirectRateLimiter,
    settings: EnricherSettings,
    total_calls: u64,
    cache_hits: u64,
}

type Key = (Subject, Signal);

impl Enricher {
    pub fn new(registry: Arc<ProfileRegistry>, settings: EnricherSettings) -> Self {
        let rate = NonZeroU32::new(settings.lookups_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            registry,
            sources: Vec::new(),
            cache: EnrichmentCache::new(),
            limiter: RateLimiter::direct(Quota::per_second(rate)),
            settings,
            total_calls: 0,
            cache_hits: 0,
        }
    }

    /// Register a source for the given signals. Sources are tried in
    /// registration order until one has data.
    pub fn with_source(mut self, name: &str, signals: &[Signal], source: Arc<dyn EnrichmentSource>) -> Self {
        self.register(name, signals, source);
        self
    }

    pub fn register(&mut self, name: &str, signals: &[Signal], source: Arc<dyn EnrichmentSource>) {
        debug!(source = name, signals = ?signals, "Enrichment source registered");
        self.sources.push(RegisteredSource {
            name: name.to_string(),
            signals: signals.iter().copied().collect(),
            source,
        });
    }

    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.name.as_str())
    }

    pub fn cache(&self) -> &EnrichmentCache {
        &self.cache
    }

    pub fn total_calls(&self) -> u64 {
        self.total_calls
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits
    }

    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.total_calls + self.cache_hits;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    /// Enrich candidates in place for a (slate size, strategy, format)
    /// triple.
    pub async fn enrich(
        &mut self,
        candidates: &mut [Candidate],
        size: SlateSize,
        strategy: &str,
        format: ContestFormat,
    ) -> EnrichmentReport {
        let profile = self.registry.lookup(format, size, strategy);
        self.enrich_with_profile(candidates, &profile).await
    }

    /// Enrich candidates in place for an already-resolved profile.
    pub async fn enrich_with_profile(
        &mut self,
        candidates: &mut [Candidate],
        profile: &StrategyProfile,
    ) -> EnrichmentReport {
        info!(
            strategy = %profile.name,
            candidates = candidates.len(),
            signals = profile.signals.len(),
            "Starting enrichment"
        );

        self.cache.evict_expired();

        let mut report = EnrichmentReport {
            strategy: profile.name.clone(),
            signals: profile.signals.iter().copied().collect(),
            ..Default::default()
        };

        for candidate in candidates.iter_mut() {
            candidate.enrichment.quality = EnrichmentQuality::default();
        }

        let top = top_candidates(candidates, profile.lookup_limit);

        // Group candidates by lookup key so each subject is fetched once.
        let mut groups: BTreeMap<Key, Vec<usize>> = BTreeMap::new();
        let mut skipped: Vec<(usize, Signal)> = Vec::new();
        let mut unkeyed: Vec<(usize, Signal)> = Vec::new();
        for &signal in &profile.signals {
            for (i, candidate) in candidates.iter().enumerate() {
                if signal.is_rate_limited() && !top.contains(&i) {
                    skipped.push((i, signal));
                    continue;
                }
                match Subject::for_signal(signal, candidate) {
                    Some(subject) => groups.entry((subject, signal)).or_default().push(i),
                    None => unkeyed.push((i, signal)),
                }
            }
        }

        let mut outcomes: HashMap<Key, FetchOutcome> = HashMap::new();
        let mut jobs: Vec<(Key, IdentityHints)> = Vec::new();
        for (key, members) in &groups {
            if let Some(cached) = self.cache.get(&key.0, key.1) {
                debug!(subject = %key.0, signal = %key.1, "Cache hit");
                report.cache_hits += 1;
                outcomes.insert(key.clone(), FetchOutcome::from_cached(cached));
            } else if !self.has_source(key.1) {
                outcomes.insert(key.clone(), FetchOutcome::Absent);
            } else {
                let hints = IdentityHints::for_signal(key.1, &candidates[members[0]]);
                jobs.push((key.clone(), hints));
            }
        }

        report.fetched = jobs.len();
        let fetched = self.fetch_all(jobs).await;

        for (key, outcome) in fetched {
            match &outcome {
                FetchOutcome::Found(attrs) => {
                    self.cache.insert(key.0.clone(), key.1, Some(attrs.clone()), self.settings.ttl_for(key.1))
                }
                FetchOutcome::Absent => self.cache.insert(key.0.clone(), key.1, None, self.settings.ttl_for(key.1)),
                FetchOutcome::Failed => report.failed += 1,
                FetchOutcome::TimedOut => report.timed_out += 1,
            }
            outcomes.insert(key, outcome);
        }

        self.total_calls += report.fetched as u64;
        self.cache_hits += report.cache_hits as u64;

        for (key, members) in &groups {
            let outcome = outcomes.get(key).cloned().unwrap_or(FetchOutcome::Absent);
            for &i in members {
                let candidate = &mut candidates[i];
                candidate.enrichment.quality.requested += 1;
                match &outcome {
                    FetchOutcome::Found(attrs) => {
                        attrs.apply_to(key.1, candidate);
                        candidate.enrichment.quality.resolved += 1;
                        report.resolved += 1;
                    }
                    other => {
                        profile.defaults.apply(key.1, candidate);
                        candidate.enrichment.quality.defaulted += 1;
                        if matches!(other, FetchOutcome::Failed | FetchOutcome::TimedOut) {
                            candidate.enrichment.quality.failed += 1;
                        }
                        report.defaulted += 1;
                    }
                }
            }
        }

        report.skipped_by_limit = skipped.len();
        for (i, signal) in skipped.into_iter().chain(unkeyed) {
            let candidate = &mut candidates[i];
            candidate.enrichment.quality.requested += 1;
            candidate.enrichment.quality.defaulted += 1;
            profile.defaults.apply(signal, candidate);
            report.defaulted += 1;
        }

        if report.failed + report.timed_out > 0 {
            warn!(
                failed = report.failed,
                timed_out = report.timed_out,
                "Some enrichment lookups failed, neutral defaults used"
            );
        }
        info!(
            fetched = report.fetched,
            cache_hits = report.cache_hits,
            resolved = report.resolved,
            defaulted = report.defaulted,
            skipped_by_limit = report.skipped_by_limit,
            cache_size = self.cache.len(),
            "Enrichment complete"
        );

        report
    }

    fn has_source(&self, signal: Signal) -> bool {
        self.sources.iter().any(|s| s.signals.contains(&signal))
    }

    async fn fetch_all(&self, jobs: Vec<(Key, IdentityHints)>) -> Vec<(Key, FetchOutcome)> {
        stream::iter(jobs)
            .map(|(key, hints)| async move {
                let outcome = self.fetch_one(key.1, &hints).await;
                (key, outcome)
            })
            .buffer_unordered(self.settings.workers.max(1))
            .collect()
            .await
    }

    /// Try each source for `signal` in order. Errors and timeouts are
    /// logged and the next source is tried.
    async fn fetch_one(&self, signal: Signal, hints: &IdentityHints) -> FetchOutcome {
        let mut outcome = FetchOutcome::Absent;
        for registered in self.sources.iter().filter(|s| s.signals.contains(&signal)) {
            if signal.is_rate_limited() {
                self.limiter.until_ready().await;
            }
            let call = registered.source.fetch(hints);
            match tokio::time::timeout(self.settings.request_timeout, call).await {
                Ok(Ok(Some(attrs))) if attrs.has(signal) => {
                    debug!(source = %registered.name, signal = %signal, team = %hints.team, name = ?hints.name, "Resolved");
                    return FetchOutcome::Found(attrs);
                }
                Ok(Ok(_)) => {
                    debug!(source = %registered.name, signal = %signal, team = %hints.team, name = ?hints.name, "No data");
                }
                Ok(Err(e)) => {
                    warn!(source = %registered.name, signal = %signal, error = %e, "Enrichment lookup failed");
                    outcome = FetchOutcome::Failed;
                }
                Err(_) => {
                    warn!(
                        source = %registered.name,
                        signal = %signal,
                        timeout_ms = self.settings.request_timeout.as_millis() as u64,
                        "Enrichment lookup timed out"
                    );
                    outcome = FetchOutcome::TimedOut;
                }
            }
        }
        outcome
    }
}

/// Indices of the `limit` candidates that get quota-limited lookups:
/// highest salary, then highest projection, then id.
fn top_candidates(candidates: &[Candidate], limit: usize) -> HashSet<usize> {
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        let (ca, cb) = (&candidates[a], &candidates[b]);
        cb.salary
            .cmp(&ca.salary)
            .then(cb.projection.total_cmp(&ca.projection))
            .then(ca.id.cmp(&cb.id))
    });
    order.into_iter().take(limit).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
