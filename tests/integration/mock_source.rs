//! Mock enrichment sources for integration testing.
//!
//! `MockSource` is a deterministic, in-memory `EnrichmentSource` whose
//! records, latency and failures are controllable from test code.
//! `MockFeed` is a mockall mock for call-count expectations.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use mockall::mock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stacker::data::{Attributes, EnrichmentSource, IdentityHints};

/// A mock enrichment feed.
///
/// Records are keyed by team code for team-scoped lookups and by
/// `TEAM/Name` for player lookups. Every call is recorded.
#[derive(Clone, Default)]
pub struct MockSource {
    records: HashMap<String, Attributes>,
    calls: Arc<Mutex<Vec<IdentityHints>>>,
    /// If set, every fetch returns this error.
    force_error: Arc<Mutex<Option<String>>>,
    delay: Option<Duration>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_team(mut self, team: &str, attrs: Attributes) -> Self {
        self.records.insert(team.to_string(), attrs);
        self
    }

    pub fn with_player(mut self, team: &str, name: &str, attrs: Attributes) -> Self {
        self.records.insert(format!("{team}/{name}"), attrs);
        self
    }

    /// Sleep this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Force all subsequent fetches to return an error.
    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    pub fn clear_error(&self) {
        *self.force_error.lock().unwrap() = None;
    }

    pub fn calls(&self) -> Vec<IdentityHints> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl EnrichmentSource for MockSource {
    async fn fetch(&self, hints: &IdentityHints) -> Result<Option<Attributes>> {
        self.calls.lock().unwrap().push(hints.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let forced = self.force_error.lock().unwrap().clone();
        if let Some(msg) = forced {
            return Err(anyhow!(msg));
        }

        let key = match &hints.name {
            Some(name) => format!("{}/{}", hints.team, name),
            None => hints.team.clone(),
        };
        Ok(self.records.get(&key).cloned())
    }
}

mock! {
    pub Feed {}

    #[async_trait]
    impl EnrichmentSource for Feed {
        async fn fetch(&self, hints: &IdentityHints) -> Result<Option<Attributes>>;
    }
}
