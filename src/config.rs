//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (API keys) are referenced by env-var name in the config and
//! resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use std::time::Duration;

use crate::data::http::HttpSource;
use crate::data::park::ParkFactorSource;
use crate::data::table::TableSource;
use crate::data::weather::WeatherSource;
use crate::data::EnrichmentSource;
use crate::engine::{EnricherSettings, SlateThresholds};
use crate::types::{ContestConfig, ContestFormat, CorrelationRules, Signal, SlotGroup};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub app: AppSection,
    pub contest: ContestSection,
    #[serde(default)]
    pub slate: SlateThresholds,
    #[serde(default)]
    pub identity: IdentitySection,
    pub enrichment: EnrichmentSection,
    #[serde(default)]
    pub strategies: StrategiesSection,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
    /// Slate file read when none is given on the command line.
    pub slate_file: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContestSection {
    pub salary_cap: u32,
    pub min_player_salary: u32,
    pub time_limit_secs: u64,
    /// Roster layout; the classic layout when empty.
    #[serde(default)]
    pub slots: Vec<SlotGroup>,
    pub cash: FormatRules,
    pub tournament: FormatRules,
}

/// Rules that differ between cash and tournament contests.
#[derive(Debug, Deserialize, Clone)]
pub struct FormatRules {
    pub salary_floor: u32,
    pub max_per_team: usize,
    #[serde(default)]
    pub stack_min_hitters: Option<usize>,
    #[serde(default)]
    pub stack_bonus: f64,
    #[serde(default)]
    pub opposing_pitcher_penalty: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IdentitySection {
    pub match_floor: f64,
}

impl Default for IdentitySection {
    fn default() -> Self {
        Self { match_floor: crate::identity::DEFAULT_FLOOR }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EnrichmentSection {
    pub workers: usize,
    pub request_timeout_secs: u64,
    pub lookups_per_second: u32,
    pub default_ttl_mins: i64,
    /// Per-signal TTL overrides in minutes, keyed by signal name.
    #[serde(default)]
    pub ttl_mins: HashMap<String, i64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StrategiesSection {
    /// Strategy file replacing the built-in profiles.
    #[serde(default)]
    pub file: Option<String>,
}

/// One enrichment feed.
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    Http {
        name: String,
        url: String,
        signals: Vec<Signal>,
        #[serde(default)]
        api_key_env: Option<String>,
        #[serde(default = "enabled")]
        enabled: bool,
    },
    Table {
        name: String,
        path: String,
        signals: Vec<Signal>,
        #[serde(default = "enabled")]
        enabled: bool,
    },
    ParkFactors {
        name: String,
        #[serde(default = "enabled")]
        enabled: bool,
    },
    Weather {
        name: String,
        #[serde(default)]
        url: Option<String>,
        #[serde(default = "enabled")]
        enabled: bool,
    },
}

fn enabled() -> bool {
    true
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// Contest rules for one format.
    pub fn contest_for(&self, format: ContestFormat) -> ContestConfig {
        let mut contest = ContestConfig::classic(format);
        let rules = match format {
            ContestFormat::Cash => &self.contest.cash,
            ContestFormat::Tournament => &self.contest.tournament,
        };

        contest.salary_cap = self.contest.salary_cap;
        contest.min_player_salary = self.contest.min_player_salary;
        contest.time_limit = Duration::from_secs(self.contest.time_limit_secs);
        if !self.contest.slots.is_empty() {
            contest.slots = self.contest.slots.clone();
        }
        contest.salary_floor = rules.salary_floor;
        contest.max_per_team = rules.max_per_team;
        contest.correlation = CorrelationRules {
            stack_min_hitters: rules.stack_min_hitters.unwrap_or(contest.correlation.stack_min_hitters),
            stack_bonus: rules.stack_bonus,
            opposing_pitcher_penalty: rules.opposing_pitcher_penalty,
        };
        contest
    }

    pub fn enricher_settings(&self) -> EnricherSettings {
        let e = &self.enrichment;
        EnricherSettings {
            workers: e.workers,
            request_timeout: Duration::from_secs(e.request_timeout_secs),
            lookups_per_second: e.lookups_per_second,
            default_ttl: chrono::Duration::minutes(e.default_ttl_mins),
            ttl: Signal::ALL
                .iter()
                .filter_map(|s| e.ttl_mins.get(&s.to_string()).map(|m| (*s, chrono::Duration::minutes(*m))))
                .collect(),
        }
    }
}

impl SourceConfig {
    pub fn name(&self) -> &str {
        match self {
            SourceConfig::Http { name, .. }
            | SourceConfig::Table { name, .. }
            | SourceConfig::ParkFactors { name, .. }
            | SourceConfig::Weather { name, .. } => name,
        }
    }

    pub fn enabled(&self) -> bool {
        match self {
            SourceConfig::Http { enabled, .. }
            | SourceConfig::Table { enabled, .. }
            | SourceConfig::ParkFactors { enabled, .. }
            | SourceConfig::Weather { enabled, .. } => *enabled,
        }
    }

    /// Signals the source answers for.
    pub fn signals(&self) -> Vec<Signal> {
        match self {
            SourceConfig::Http { signals, .. } | SourceConfig::Table { signals, .. } => signals.clone(),
            SourceConfig::ParkFactors { .. } => vec![Signal::ParkFactor],
            SourceConfig::Weather { .. } => vec![Signal::Weather],
        }
    }

    /// Construct the adapter. A missing API key env var is an error.
    /// Name-keyed tables match player rows at `match_floor` or better.
    pub fn build(&self, timeout: Duration, match_floor: f64) -> Result<Arc<dyn EnrichmentSource>> {
        let source: Arc<dyn EnrichmentSource> = match self {
            SourceConfig::Http { name, url, api_key_env, .. } => {
                let api_key = api_key_env
                    .as_deref()
                    .map(AppConfig::resolve_env)
                    .transpose()?
                    .map(SecretString::new);
                Arc::new(HttpSource::new(name, url, api_key, timeout)?)
            }
            SourceConfig::Table { name, path, .. } => {
                Arc::new(TableSource::from_json_file(name, path)?.with_floor(match_floor))
            }
            SourceConfig::ParkFactors { .. } => Arc::new(ParkFactorSource),
            SourceConfig::Weather { url, .. } => {
                let source = WeatherSource::new(timeout)?;
                Arc::new(match url {
                    Some(url) => source.with_base_url(url),
                    None => source,
                })
            }
        };
        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::IdentityHints;
    use crate::identity::DEFAULT_FLOOR;

    const SAMPLE: &str = r#"
        [app]
        name = "STACKER-TEST"
        slate_file = "slate.json"

        [contest]
        salary_cap = 50000
        min_player_salary = 2000
        time_limit_secs = 10

        [contest.cash]
        salary_floor = 48000
        max_per_team = 3
        opposing_pitcher_penalty = 2.0

        [contest.tournament]
        salary_floor = 45000
        max_per_team = 5
        stack_min_hitters = 4
        stack_bonus = 3.0

        [slate]
        small_max = 2
        medium_max = 6

        [enrichment]
        workers = 4
        request_timeout_secs = 3
        lookups_per_second = 2
        default_ttl_mins = 20

        [enrichment.ttl_mins]
        park_factor = 1440

        [[sources]]
        kind = "park_factors"
        name = "parks"

        [[sources]]
        kind = "http"
        name = "vegas"
        url = "https://feed.test/totals"
        signals = ["implied_total"]
        enabled = false
    "#;

    #[test]
    fn test_parse_sample() {
        let cfg: AppConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(cfg.app.name, "STACKER-TEST");
        assert_eq!(cfg.slate.small_max, 2);
        assert_eq!(cfg.identity.match_floor, crate::identity::DEFAULT_FLOOR);
        assert!(cfg.strategies.file.is_none());
        assert_eq!(cfg.sources.len(), 2);
        assert_eq!(cfg.sources[0].signals(), vec![Signal::ParkFactor]);
        assert!(cfg.sources[0].enabled());
        assert!(!cfg.sources[1].enabled());
        assert_eq!(cfg.sources[1].name(), "vegas");
    }

    #[test]
    fn test_contest_for_format() {
        let cfg: AppConfig = toml::from_str(SAMPLE).unwrap();
        let cash = cfg.contest_for(ContestFormat::Cash);
        assert_eq!(cash.salary_floor, 48_000);
        assert_eq!(cash.max_per_team, 3);
        assert_eq!(cash.roster_size(), 10);
        assert_eq!(cash.correlation.stack_min_hitters, 3);
        assert_eq!(cash.time_limit, Duration::from_secs(10));

        let gpp = cfg.contest_for(ContestFormat::Tournament);
        assert_eq!(gpp.correlation.stack_min_hitters, 4);
        assert_eq!(gpp.correlation.stack_bonus, 3.0);
        assert!(gpp.validate().is_ok());
    }

    #[test]
    fn test_enricher_settings() {
        let cfg: AppConfig = toml::from_str(SAMPLE).unwrap();
        let settings = cfg.enricher_settings();
        assert_eq!(settings.workers, 4);
        assert_eq!(settings.ttl_for(Signal::ParkFactor), chrono::Duration::minutes(1440));
        assert_eq!(settings.ttl_for(Signal::Ownership), chrono::Duration::minutes(20));
    }

    #[test]
    fn test_missing_api_key_env_is_error() {
        let source = SourceConfig::Http {
            name: "vegas".into(),
            url: "https://feed.test".into(),
            signals: vec![Signal::ImpliedTotal],
            api_key_env: Some("STACKER_TEST_KEY_THAT_IS_NOT_SET".into()),
            enabled: true,
        };
        assert!(source.build(Duration::from_secs(1), DEFAULT_FLOOR).is_err());
    }

    #[test]
    fn test_table_source_uses_configured_floor() {
        let path = std::env::temp_dir().join(format!("stacker-table-{}.json", std::process::id()));
        fs::write(&path, r#"[{"name": "M. Trout", "team": "LAA", "ownership": 9.0}]"#).unwrap();
        let source = |floor: f64| SourceConfig::Table {
            name: "own".into(),
            path: path.to_string_lossy().into_owned(),
            signals: vec![Signal::Ownership],
            enabled: true,
        }
        .build(Duration::from_secs(1), floor)
        .unwrap();
        let hints = IdentityHints {
            signal: Signal::Ownership,
            name: Some("Mike Trout".into()),
            team: "LAA".into(),
            opponent: None,
            venue: "LAA".into(),
            positions: Vec::new(),
            salary: None,
        };

        // Initial plus last name scores 0.85.
        let loose = tokio_test::block_on(source(0.80).fetch(&hints)).unwrap();
        let strict = tokio_test::block_on(source(0.90).fetch(&hints)).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loose.and_then(|a| a.ownership), Some(9.0));
        assert!(strict.is_none());
    }

    #[test]
    fn test_load_config() {
        // Requires config.toml in the working directory.
        let result = AppConfig::load("config.toml");
        if let Ok(cfg) = result {
            assert_eq!(cfg.app.name, "STACKER-001");
            assert_eq!(cfg.contest.salary_cap, 50_000);
            assert!(cfg.enrichment.workers > 0);
            assert!(cfg.contest_for(ContestFormat::Cash).validate().is_ok());
        }
    }
}
