//! Observations recorded in a JSON file.

use std::path::Path;

use aqi::{PollutantReading, SatelliteEstimate, WeatherSnapshot};
use serde::{Deserialize, Serialize};

use super::{GroundSource, Location, SatelliteSource, SourceError, WeatherSource};

/// The contents of a fixture file. Every section is optional;
/// a missing section makes that source unavailable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub readings: Vec<PollutantReading>,
    pub weather: Option<WeatherSnapshot>,
    pub hourly: Vec<WeatherSnapshot>,
    pub satellite: Option<SatelliteEstimate>,
}

/// Serves ground, weather and satellite data from a [`Fixture`],
/// whatever the requested location.
#[derive(Debug, Clone)]
pub struct FixtureSources {
    fixture: Fixture,
}

impl FixtureSources {
    pub fn new(fixture: Fixture) -> Self {
        FixtureSources { fixture }
    }

    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            SourceError::unavailable("fixture", format!("reading {}: {e}", path.display()))
        })?;
        let fixture: Fixture = serde_json::from_str(&text).map_err(|e| {
            SourceError::unavailable("fixture", format!("parsing {}: {e}", path.display()))
        })?;
        tracing::info!(
            "loaded fixture {}: {} readings, {} forecast hours",
            path.display(),
            fixture.readings.len(),
            fixture.hourly.len()
        );
        Ok(Self::new(fixture))
    }
}

impl GroundSource for FixtureSources {
    fn readings(&mut self, _: &Location) -> Result<Vec<PollutantReading>, SourceError> {
        if self.fixture.readings.is_empty() {
            return Err(SourceError::unavailable("ground", "fixture has no readings"));
        }
        Ok(self.fixture.readings.clone())
    }
}

impl WeatherSource for FixtureSources {
    fn current(&mut self, _: &Location) -> Result<WeatherSnapshot, SourceError> {
        self.fixture
            .weather
            .ok_or_else(|| SourceError::unavailable("weather", "fixture has no current weather"))
    }

    fn hourly(&mut self, _: &Location, hours: u32) -> Result<Vec<WeatherSnapshot>, SourceError> {
        if self.fixture.hourly.is_empty() {
            return Err(SourceError::unavailable("weather", "fixture has no hourly forecast"));
        }
        Ok(self.fixture.hourly.iter().take(hours as usize).copied().collect())
    }
}

impl SatelliteSource for FixtureSources {
    fn estimate(&mut self, _: &Location) -> Result<SatelliteEstimate, SourceError> {
        self.fixture
            .satellite
            .ok_or_else(|| SourceError::unavailable("satellite", "fixture has no satellite estimate"))
    }
}
