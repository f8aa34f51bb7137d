//! Pollutant identifiers and the raw readings that carry them.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// A criteria pollutant covered by the EPA AQI.
///
/// Variants are declared in tie-break priority order (PM2.5 first),
/// so the derived `Ord` sorts the most health-relevant pollutant first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pollutant {
    /// Fine particulate matter, 24-hour average.
    Pm25,
    /// Coarse particulate matter, 24-hour average.
    Pm10,
    /// Ozone, 8-hour average.
    O3,
    /// Nitrogen dioxide, 1-hour average.
    No2,
    /// Sulfur dioxide, 1-hour average.
    So2,
    /// Carbon monoxide, 8-hour average.
    Co,
}

impl Pollutant {
    /// All pollutants, in priority order.
    pub const ALL: [Pollutant; 6] = [
        Pollutant::Pm25,
        Pollutant::Pm10,
        Pollutant::O3,
        Pollutant::No2,
        Pollutant::So2,
        Pollutant::Co,
    ];

    /// The unit the EPA breakpoint table for this pollutant is expressed in.
    pub fn standard_unit(&self) -> Unit {
        match self {
            Pollutant::Pm25 | Pollutant::Pm10 => Unit::MicrogramsPerCubicMeter,
            Pollutant::O3 | Pollutant::Co => Unit::PartsPerMillion,
            Pollutant::No2 | Pollutant::So2 => Unit::PartsPerBillion,
        }
    }

    /// Conventional display label, e.g. "PM2.5".
    pub fn label(&self) -> &'static str {
        match self {
            Pollutant::Pm25 => "PM2.5",
            Pollutant::Pm10 => "PM10",
            Pollutant::O3 => "O3",
            Pollutant::No2 => "NO2",
            Pollutant::So2 => "SO2",
            Pollutant::Co => "CO",
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Pollutant {
    type Err = Error;

    /// Accepts the spellings providers use: "pm25", "pm2.5", "pm2_5", "PM10", "o3", ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '.' | '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "pm25" => Ok(Pollutant::Pm25),
            "pm10" => Ok(Pollutant::Pm10),
            "o3" | "ozone" => Ok(Pollutant::O3),
            "no2" => Ok(Pollutant::No2),
            "so2" => Ok(Pollutant::So2),
            "co" => Ok(Pollutant::Co),
            _ => Err(Error::InvalidInput(format!("unknown pollutant {s:?}"))),
        }
    }
}

/// Concentration unit of a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "ug/m3", alias = "µg/m³")]
    MicrogramsPerCubicMeter,
    #[serde(rename = "ppm")]
    PartsPerMillion,
    #[serde(rename = "ppb")]
    PartsPerBillion,
}

impl Unit {
    /// Convert `value` from this unit into `target`.
    ///
    /// Only mixing-ratio conversions (ppm <-> ppb) are possible without
    /// temperature and molar mass; anything else returns `None`.
    pub fn convert(self, value: f64, target: Unit) -> Option<f64> {
        match (self, target) {
            (a, b) if a == b => Some(value),
            (Unit::PartsPerMillion, Unit::PartsPerBillion) => Some(value * 1000.0),
            (Unit::PartsPerBillion, Unit::PartsPerMillion) => Some(value / 1000.0),
            _ => None,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::MicrogramsPerCubicMeter => write!(f, "µg/m³"),
            Unit::PartsPerMillion => write!(f, "ppm"),
            Unit::PartsPerBillion => write!(f, "ppb"),
        }
    }
}

/// A single concentration observation, as captured by a data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollutantReading {
    pub pollutant: Pollutant,
    pub value: f64,
    pub unit: Unit,
    /// Identifier of the station or provider that produced the reading.
    pub source: String,
    pub observed_at: DateTime<Utc>,
}

impl PollutantReading {
    /// Check that the reading is usable: a finite, non-negative concentration.
    ///
    /// The core assumes validated input; boundary code calls this first.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.value.is_finite() {
            return Err(Error::InvalidInput(format!(
                "{} reading from {} is not a finite number",
                self.pollutant, self.source
            )));
        }
        if self.value < 0.0 {
            return Err(Error::InvalidInput(format!(
                "{} reading from {} is negative: {}",
                self.pollutant, self.source, self.value
            )));
        }
        Ok(())
    }

    /// The concentration expressed in the pollutant's breakpoint unit, if convertible.
    pub fn standard_value(&self) -> Option<f64> {
        self.unit.convert(self.value, self.pollutant.standard_unit())
    }
}
