//! STACKER: MLB daily fantasy roster optimizer
//!
//! Entry point. Loads configuration, initialises structured logging,
//! registers the configured enrichment sources, then prepares the slate
//! file given on the command line and prints the optimized lineups.

use anyhow::{Context, Result};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use stacker::config;
use stacker::engine::{Enricher, Pipeline, SlateRequest};
use stacker::identity::Resolver;
use stacker::strategy::ProfileRegistry;
use stacker::types::ContestFormat;

const BANNER: &str = r#"
 ____ _____  _    ____ _  _______ ____
/ ___|_   _|/ \  / ___| |/ / ____|  _ \
\___ \ | | / _ \| |   | ' /|  _| | |_) |
 ___) || |/ ___ \ |___| . \| |___|  _ <
|____/ |_/_/   \_\____|_|\_\_____|_| \_\

  MLB daily fantasy roster optimizer
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = config::AppConfig::load("config.toml")?;

    init_logging();

    println!("{BANNER}");
    info!(
        name = %cfg.app.name,
        sources = cfg.sources.len(),
        salary_cap = cfg.contest.salary_cap,
        "STACKER starting up"
    );

    // -- Strategies --------------------------------------------------------

    let registry = Arc::new(match &cfg.strategies.file {
        Some(path) => ProfileRegistry::load(path)?,
        None => ProfileRegistry::builtin()?,
    });
    info!(strategies = registry.names().count(), "Strategy profiles loaded");

    // -- Enrichment sources ------------------------------------------------

    let timeout = Duration::from_secs(cfg.enrichment.request_timeout_secs);
    let mut enricher = Enricher::new(registry.clone(), cfg.enricher_settings());
    for source in cfg.sources.iter().filter(|s| s.enabled()) {
        match source.build(timeout, cfg.identity.match_floor) {
            Ok(adapter) => enricher.register(source.name(), &source.signals(), adapter),
            Err(e) => warn!(source = source.name(), error = %e, "Source unavailable, skipping"),
        }
    }

    let mut pipeline = Pipeline::new(registry, enricher)
        .with_resolver(Resolver::new(cfg.identity.match_floor))
        .with_contest(cfg.contest_for(ContestFormat::Cash))
        .with_contest(cfg.contest_for(ContestFormat::Tournament))
        .with_slate_thresholds(cfg.slate);

    // -- Slate -------------------------------------------------------------

    let slate_path = std::env::args().nth(1).unwrap_or_else(|| cfg.app.slate_file.clone());
    let contents = fs::read_to_string(&slate_path)
        .with_context(|| format!("Failed to read slate file: {slate_path}"))?;
    let request: SlateRequest = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse slate file: {slate_path}"))?;

    let slate = pipeline.prepare(request).await?;

    for rejection in &slate.rejected {
        warn!(name = %rejection.name, team = %rejection.team, reason = %rejection.reason, "Candidate rejected");
    }
    for entry in &slate.resolution.unmatched {
        warn!(name = %entry.name, team = %entry.team, "Confirmed starter not in pool");
    }
    info!(
        strategy = %slate.profile.name,
        slate = %slate.size,
        games = slate.games,
        candidates = slate.candidates.len(),
        resolved = slate.enrichment.resolved,
        defaulted = slate.enrichment.defaulted,
        "Slate ready"
    );

    // -- Optimize ----------------------------------------------------------

    let outcome = slate.optimize(slate.requested_lineups)?;

    for (i, lineup) in outcome.lineups.iter().enumerate() {
        println!("\nLineup {} ({})", i + 1, slate.contest.format);
        println!("{lineup}");
    }

    match &outcome.stop {
        Some(reason) => warn!(
            produced = outcome.lineups.len(),
            requested = slate.requested_lineups,
            reason = %reason,
            "Stopped before producing every lineup"
        ),
        None => info!(produced = outcome.lineups.len(), "Done"),
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("stacker=info"));

    let json_logging = std::env::var("STACKER_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
