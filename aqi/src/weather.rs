//! How the weather pushes pollutant concentrations up or down.
//!
//! This is a heuristic model of dispersion and accumulation, not a
//! meteorological simulation: each variable picks a multiplicative factor
//! from a small table of bands, and the factors are multiplied together.

use serde::{Deserialize, Serialize};

/// A sample of weather conditions at one place and time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity as a percentage (0.0 to 100.0).
    pub humidity: f64,
    /// Sea-level pressure in hPa.
    pub pressure: f64,
    /// Wind speed in m/s.
    pub wind_speed: f64,
    /// Direction the wind blows from, in degrees clockwise from north.
    pub wind_direction: f64,
    /// Rain plus snow, in mm/h.
    #[serde(default)]
    pub precipitation: f64,
    /// Cloud cover as a percentage.
    #[serde(default)]
    pub cloud_cover: f64,
}

/// The factors the weather applies to a base AQI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherImpact {
    /// Product of all four factors; multiply a base AQI by this.
    pub aqi_modifier: f64,
    /// Wind-speed term alone.
    pub dispersion_factor: f64,
    pub pressure_factor: f64,
    pub humidity_factor: f64,
    pub precipitation_factor: f64,
}

impl WeatherImpact {
    /// Human-readable summary of the modifier.
    pub fn description(&self) -> &'static str {
        let m = self.aqi_modifier;
        if m > 1.3 {
            "Weather significantly worsening air quality"
        } else if m > 1.1 {
            "Weather moderately worsening air quality"
        } else if m < 0.8 {
            "Weather significantly improving air quality"
        } else if m < 0.95 {
            "Weather moderately improving air quality"
        } else {
            "Weather having neutral impact on air quality"
        }
    }
}

fn dispersion_factor(wind_speed: f64) -> f64 {
    if wind_speed > 10.0 {
        0.7
    } else if wind_speed > 5.0 {
        0.85
    } else if wind_speed > 2.0 {
        1.0
    } else {
        1.3
    }
}

fn pressure_factor(pressure: f64, wind_speed: f64) -> f64 {
    if pressure > 1020.0 && wind_speed < 3.0 {
        // High pressure under calm air: temperature inversion likely.
        1.25
    } else if pressure < 1000.0 {
        0.9
    } else {
        1.0
    }
}

fn humidity_factor(humidity: f64) -> f64 {
    if humidity > 80.0 {
        // Particle growth.
        1.15
    } else if humidity < 30.0 {
        0.95
    } else {
        1.0
    }
}

fn precipitation_factor(precipitation: f64) -> f64 {
    if precipitation > 1.0 {
        0.6
    } else if precipitation > 0.1 {
        0.8
    } else {
        1.0
    }
}

/// Compute the AQI modifier for a weather snapshot.
pub fn compute_modifier(weather: &WeatherSnapshot) -> WeatherImpact {
    let dispersion_factor = dispersion_factor(weather.wind_speed);
    let pressure_factor = pressure_factor(weather.pressure, weather.wind_speed);
    let humidity_factor = humidity_factor(weather.humidity);
    let precipitation_factor = precipitation_factor(weather.precipitation);
    WeatherImpact {
        aqi_modifier: dispersion_factor * pressure_factor * humidity_factor * precipitation_factor,
        dispersion_factor,
        pressure_factor,
        humidity_factor,
        precipitation_factor,
    }
}

impl WeatherSnapshot {
    pub fn impact(&self) -> WeatherImpact {
        compute_modifier(self)
    }
}

/// How readily the air is carrying pollution away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dispersion {
    Rapid,
    Good,
    Moderate,
    PoorInversion,
    Stagnant,
    Limited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixingHeight {
    Low,
    Moderate,
    High,
}

impl MixingHeight {
    /// Representative mixing-layer depth in meters.
    pub fn meters(&self) -> f64 {
        match self {
            MixingHeight::Low => 300.0,
            MixingHeight::Moderate => 800.0,
            MixingHeight::High => 1500.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stability {
    Stable,
    Neutral,
    Unstable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccumulationRisk {
    Low,
    Moderate,
    High,
}

/// Qualitative description of pollution transport under the current weather.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransportAnalysis {
    /// 16-point compass direction the wind blows from.
    pub wind_direction: &'static str,
    pub dispersion: Dispersion,
    pub mixing_height: MixingHeight,
    pub stability: Stability,
    /// Wind speed times mixing height, in 1000 m²/s.
    pub ventilation_index: f64,
    pub accumulation_risk: AccumulationRisk,
}

const COMPASS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// 16-point compass name for a bearing in degrees.
pub fn compass_point(degrees: f64) -> &'static str {
    let index = (degrees.rem_euclid(360.0) / 22.5).round() as usize % COMPASS.len();
    COMPASS[index]
}

/// Describe how the weather is moving pollution around.
pub fn analyze_transport(weather: &WeatherSnapshot) -> TransportAnalysis {
    let wind = weather.wind_speed;

    let dispersion = if wind > 15.0 {
        Dispersion::Rapid
    } else if wind > 8.0 {
        Dispersion::Good
    } else if wind > 3.0 {
        Dispersion::Moderate
    } else if weather.pressure > 1020.0 && weather.temperature > 25.0 {
        Dispersion::PoorInversion
    } else if wind < 1.0 {
        Dispersion::Stagnant
    } else {
        Dispersion::Limited
    };

    let mixing_height = if weather.temperature > 25.0 && wind < 3.0 {
        MixingHeight::Low
    } else if weather.temperature < 10.0 || wind > 8.0 {
        MixingHeight::High
    } else {
        MixingHeight::Moderate
    };

    let stability = if weather.pressure > 1020.0 && wind < 2.0 {
        Stability::Stable
    } else if wind > 10.0 {
        Stability::Unstable
    } else {
        Stability::Neutral
    };

    let modifier = compute_modifier(weather).aqi_modifier;
    let accumulation_risk = if modifier > 1.2 {
        AccumulationRisk::High
    } else if modifier > 1.0 {
        AccumulationRisk::Moderate
    } else {
        AccumulationRisk::Low
    };

    TransportAnalysis {
        wind_direction: compass_point(weather.wind_direction),
        dispersion,
        mixing_height,
        stability,
        ventilation_index: wind * mixing_height.meters() / 1000.0,
        accumulation_risk,
    }
}

/// Activity advice that accounts for the weather, not just the AQI.
pub fn activity_hint(weather: &WeatherSnapshot, impact: &WeatherImpact) -> &'static str {
    if impact.aqi_modifier > 1.2 {
        "Weather conditions are trapping pollutants - minimize outdoor time"
    } else if weather.wind_speed > 10.0 {
        "Good wind conditions for outdoor activities"
    } else if weather.precipitation > 0.0 {
        "Rainfall is improving air quality - good for activities after rain"
    } else {
        "Monitor conditions before extended outdoor activities"
    }
}
