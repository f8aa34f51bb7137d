//! Where observations come from.
//!
//! Each kind of data has its own trait so that the [`Assessor`](crate::service::Assessor)
//! can be assembled from any mix of real, fixture and fake sources.
//! A source that can't answer says so with [`SourceError::Unavailable`];
//! it never makes up data.

use aqi::{PollutantReading, SatelliteEstimate, WeatherSnapshot};
use serde::{Deserialize, Serialize};

mod fixture;
pub use fixture::{Fixture, FixtureSources};

/// The area to assess.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Ground stations within this distance are considered.
    pub radius_km: f64,
}

impl Default for Location {
    /// Washington, DC, approximately.
    fn default() -> Self {
        Location {
            latitude: 38.9,
            longitude: -77.0,
            radius_km: 25.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SourceError {
    #[error("{source_name} data unavailable: {reason}")]
    Unavailable {
        source_name: &'static str,
        reason: String,
    },
}

impl SourceError {
    pub fn unavailable(source_name: &'static str, reason: impl Into<String>) -> Self {
        SourceError::Unavailable {
            source_name,
            reason: reason.into(),
        }
    }
}

/// A type that can report ground-station pollutant readings.
pub trait GroundSource {
    /// Latest readings from stations near `location`.
    fn readings(&mut self, location: &Location) -> Result<Vec<PollutantReading>, SourceError>;
}

/// A type that can report current and forecast weather.
pub trait WeatherSource {
    fn current(&mut self, location: &Location) -> Result<WeatherSnapshot, SourceError>;

    /// Hourly forecast; element 0 is one hour from now.
    /// May return fewer than `hours` snapshots.
    fn hourly(&mut self, location: &Location, hours: u32)
        -> Result<Vec<WeatherSnapshot>, SourceError>;
}

/// A type that can estimate surface AQI from satellite retrievals.
pub trait SatelliteSource {
    fn estimate(&mut self, location: &Location) -> Result<SatelliteEstimate, SourceError>;
}

/// The nullary source: never has data.
#[derive(Debug, Default)]
pub struct NullSource {}

impl GroundSource for NullSource {
    fn readings(&mut self, _: &Location) -> Result<Vec<PollutantReading>, SourceError> {
        Err(SourceError::unavailable("ground", "no ground source configured"))
    }
}

impl WeatherSource for NullSource {
    fn current(&mut self, _: &Location) -> Result<WeatherSnapshot, SourceError> {
        Err(SourceError::unavailable("weather", "no weather source configured"))
    }

    fn hourly(&mut self, _: &Location, _: u32) -> Result<Vec<WeatherSnapshot>, SourceError> {
        Err(SourceError::unavailable("weather", "no weather source configured"))
    }
}

impl SatelliteSource for NullSource {
    fn estimate(&mut self, _: &Location) -> Result<SatelliteEstimate, SourceError> {
        Err(SourceError::unavailable("satellite", "no satellite source configured"))
    }
}

/// Fake ground source: repeatedly provides the same readings.
#[derive(Debug, Clone, Default)]
pub struct FakeGroundSource {
    pub readings: Vec<PollutantReading>,
}

impl GroundSource for FakeGroundSource {
    fn readings(&mut self, _: &Location) -> Result<Vec<PollutantReading>, SourceError> {
        Ok(self.readings.clone())
    }
}

/// Fake weather source: the same conditions now and for every forecast hour
/// it has.
#[derive(Debug, Clone)]
pub struct FakeWeatherSource {
    pub current: WeatherSnapshot,
    pub hourly: Vec<WeatherSnapshot>,
}

impl WeatherSource for FakeWeatherSource {
    fn current(&mut self, _: &Location) -> Result<WeatherSnapshot, SourceError> {
        Ok(self.current)
    }

    fn hourly(&mut self, _: &Location, hours: u32) -> Result<Vec<WeatherSnapshot>, SourceError> {
        Ok(self.hourly.iter().take(hours as usize).copied().collect())
    }
}

/// Fake satellite source: repeatedly provides the indicated estimate.
#[derive(Debug, Clone, Copy)]
pub struct FakeSatelliteSource {
    pub estimate: SatelliteEstimate,
}

impl SatelliteSource for FakeSatelliteSource {
    fn estimate(&mut self, _: &Location) -> Result<SatelliteEstimate, SourceError> {
        Ok(self.estimate)
    }
}
