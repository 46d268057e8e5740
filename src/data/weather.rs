//! Ballpark weather source.
//!
//! Uses the free Open-Meteo API (no key required) for current conditions
//! at each ballpark and converts them into a run-environment multiplier.
//! Domed and retractable-roof parks are treated as neutral without a
//! request.
//!
//! API: `https://api.open-meteo.com/v1/forecast`
//! Auth: None required.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{Attributes, EnrichmentSource, IdentityHints};
use crate::identity::teams;

/// Multiplier floor and ceiling.
pub const MIN_MULTIPLIER: f64 = 0.92;
pub const MAX_MULTIPLIER: f64 = 1.08;
/// Temperature at which weather is neutral.
const NEUTRAL_TEMP_F: f64 = 70.0;
const PER_DEGREE: f64 = 0.004;
/// Precipitation above this (mm) damps scoring.
const RAIN_THRESHOLD_MM: f64 = 2.0;
const RAIN_DAMPING: f64 = 0.97;

// ---------------------------------------------------------------------------
// Ballparks
// ---------------------------------------------------------------------------

struct Ballpark {
    team: &'static str,
    lat: f64,
    lon: f64,
    roof: bool,
}

const BALLPARKS: &[Ballpark] = &[
    Ballpark { team: "ARI", lat: 33.45, lon: -112.07, roof: true },
    Ballpark { team: "ATL", lat: 33.89, lon: -84.47, roof: false },
    Ballpark { team: "BAL", lat: 39.28, lon: -76.62, roof: false },
    Ballpark { team: "BOS", lat: 42.35, lon: -71.10, roof: false },
    Ballpark { team: "CHC", lat: 41.95, lon: -87.66, roof: false },
    Ballpark { team: "CWS", lat: 41.83, lon: -87.63, roof: false },
    Ballpark { team: "CIN", lat: 39.10, lon: -84.51, roof: false },
    Ballpark { team: "CLE", lat: 41.50, lon: -81.69, roof: false },
    Ballpark { team: "COL", lat: 39.76, lon: -104.99, roof: false },
    Ballpark { team: "DET", lat: 42.34, lon: -83.05, roof: false },
    Ballpark { team: "HOU", lat: 29.76, lon: -95.36, roof: true },
    Ballpark { team: "KC", lat: 39.05, lon: -94.48, roof: false },
    Ballpark { team: "LAA", lat: 33.80, lon: -117.88, roof: false },
    Ballpark { team: "LAD", lat: 34.07, lon: -118.24, roof: false },
    Ballpark { team: "MIA", lat: 25.78, lon: -80.22, roof: true },
    Ballpark { team: "MIL", lat: 43.03, lon: -87.97, roof: true },
    Ballpark { team: "MIN", lat: 44.98, lon: -93.28, roof: false },
    Ballpark { team: "NYM", lat: 40.76, lon: -73.85, roof: false },
    Ballpark { team: "NYY", lat: 40.83, lon: -73.93, roof: false },
    Ballpark { team: "OAK", lat: 38.58, lon: -121.51, roof: false },
    Ballpark { team: "PHI", lat: 39.91, lon: -75.17, roof: false },
    Ballpark { team: "PIT", lat: 40.45, lon: -80.01, roof: false },
    Ballpark { team: "SD", lat: 32.71, lon: -117.16, roof: false },
    Ballpark { team: "SF", lat: 37.78, lon: -122.39, roof: false },
    Ballpark { team: "SEA", lat: 47.59, lon: -122.33, roof: true },
    Ballpark { team: "STL", lat: 38.62, lon: -90.19, roof: false },
    Ballpark { team: "TB", lat: 27.77, lon: -82.65, roof: true },
    Ballpark { team: "TEX", lat: 32.75, lon: -97.08, roof: true },
    Ballpark { team: "TOR", lat: 43.64, lon: -79.39, roof: true },
    Ballpark { team: "WSH", lat: 38.87, lon: -77.01, roof: false },
];

fn ballpark(venue: &str) -> Option<&'static Ballpark> {
    let code = teams::canonical(venue);
    BALLPARKS.iter().find(|b| b.team == code)
}

// ---------------------------------------------------------------------------
// Open-Meteo response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Serialize)]
struct OpenMeteoResponse {
    #[serde(default)]
    current: Option<OpenMeteoCurrent>,
}

#[derive(Debug, Deserialize, Serialize)]
struct OpenMeteoCurrent {
    /// Degrees Fahrenheit (requested via `temperature_unit`).
    #[serde(default)]
    temperature_2m: Option<f64>,
    #[serde(default)]
    precipitation: Option<f64>,
    #[serde(default)]
    wind_speed_10m: Option<f64>,
}

/// Run-environment multiplier for the given conditions.
pub fn multiplier(temp_f: f64, precipitation_mm: f64) -> f64 {
    let base = (1.0 + PER_DEGREE * (temp_f - NEUTRAL_TEMP_F)).clamp(MIN_MULTIPLIER, MAX_MULTIPLIER);
    if precipitation_mm > RAIN_THRESHOLD_MM {
        base * RAIN_DAMPING
    } else {
        base
    }
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

pub struct WeatherSource {
    http: Client,
    base_url: String,
}

impl WeatherSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("STACKER/0.1.0")
            .build()
            .context("Failed to build weather HTTP client")?;
        Ok(Self { http, base_url: "https://api.open-meteo.com/v1/forecast".to_string() })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn url(&self, lat: f64, lon: f64) -> String {
        format!(
            "{}?latitude={lat}&longitude={lon}\
             &current=temperature_2m,precipitation,wind_speed_10m\
             &temperature_unit=fahrenheit&timezone=auto",
            self.base_url
        )
    }

    fn summarise(resp: &OpenMeteoResponse) -> Option<f64> {
        let current = resp.current.as_ref()?;
        let temp = current.temperature_2m?;
        Some(multiplier(temp, current.precipitation.unwrap_or(0.0)))
    }
}

#[async_trait]
impl EnrichmentSource for WeatherSource {
    async fn fetch(&self, hints: &IdentityHints) -> Result<Option<Attributes>> {
        let Some(park) = ballpark(&hints.venue) else {
            debug!(venue = %hints.venue, "Unknown ballpark, no weather");
            return Ok(None);
        };

        if park.roof {
            return Ok(Some(Attributes { weather: Some(1.0), ..Default::default() }));
        }

        let url = self.url(park.lat, park.lon);
        let resp = self.http.get(&url).send().await.context("Open-Meteo request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            anyhow::bail!("Open-Meteo API error: {status}");
        }

        let data: OpenMeteoResponse = resp.json().await.context("Failed to parse Open-Meteo response")?;

        let weather = Self::summarise(&data);
        debug!(venue = park.team, ?weather, "Ballpark weather");
        Ok(weather.map(|w| Attributes { weather: Some(w), ..Default::default() }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
