//! Table source: a static set of records keyed by team and, optionally,
//! player name.
//!
//! Used for feeds delivered as files (ownership projections, recent-form
//! exports, Vegas totals snapshots). Player names in such files rarely
//! match the salary feed exactly, so lookups go through the same fuzzy
//! rules as confirmed-lineup resolution.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::fs;
use tracing::debug;

use super::{Attributes, EnrichmentSource, IdentityHints};
use crate::identity::{best_match, teams, DEFAULT_FLOOR};

/// One row of a table feed. Rows without a name describe the whole team.
#[derive(Debug, Clone, Deserialize)]
pub struct TableRecord {
    #[serde(default)]
    pub name: Option<String>,
    pub team: String,
    #[serde(flatten)]
    pub attributes: Attributes,
}

pub struct TableSource {
    label: String,
    records: Vec<TableRecord>,
    floor: f64,
}

impl TableSource {
    pub fn new(label: &str, records: Vec<TableRecord>) -> Self {
        Self { label: label.to_string(), records, floor: DEFAULT_FLOOR }
    }

    /// Load records from a JSON array file.
    pub fn from_json_file(label: &str, path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read table source {label}: {path}"))?;
        let records: Vec<TableRecord> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse table source {label}: {path}"))?;
        debug!(source = label, records = records.len(), "Table source loaded");
        Ok(Self::new(label, records))
    }

    pub fn with_floor(mut self, floor: f64) -> Self {
        self.floor = floor;
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn lookup(&self, hints: &IdentityHints) -> Option<&TableRecord> {
        let same_team = self.records.iter().filter(|r| teams::same_team(&r.team, &hints.team));

        match hints.name.as_deref() {
            None => same_team.into_iter().find(|r| r.name.is_none()),
            Some(name) => {
                let named: Vec<&TableRecord> = same_team.filter(|r| r.name.is_some()).collect();
                let names = named.iter().map(|r| r.name.as_deref().unwrap_or_default());
                best_match(name, names, self.floor).map(|(idx, _)| named[idx])
            }
        }
    }
}

#[async_trait]
impl EnrichmentSource for TableSource {
    async fn fetch(&self, hints: &IdentityHints) -> Result<Option<Attributes>> {
        let found = self.lookup(hints).map(|r| r.attributes.clone());
        if found.is_none() {
            debug!(
                source = %self.label,
                team = %hints.team,
                name = ?hints.name,
                signal = %hints.signal,
                "No table record"
            );
        }
        Ok(found)
    }
}
