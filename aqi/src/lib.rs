//! Air quality estimation core.
//!
//! Converts pollutant concentrations into EPA Air Quality Index values,
//! reconciles ground-station, weather and satellite estimates, projects the
//! result forward hour by hour, and classifies what a forecast means for a
//! particular person's health.
//!
//! Everything here is a deterministic function of its inputs. Fetching
//! observations is the caller's job; see the `airwatch` crate for that.
//!
//! Absence of data is reported as `None`, never as a low AQI:
//! an empty set of readings has no estimate, and a reconciliation with no
//! sources has no final value.

pub mod alerts;
pub mod category;
pub mod composite;
pub mod convert;
pub mod forecast;
pub mod health;
pub mod pollutant;
pub mod reconcile;
pub mod weather;

pub use alerts::{generate_alerts, AlertType, CurrentConditions, HealthAlert};
pub use category::{Category, Color, HealthAdvice};
pub use composite::{select_composite, AirQualityEstimate, SubIndices};
pub use convert::{pollutant_to_aqi, sub_index};
pub use forecast::{project, DataSource, ForecastModel, ForecastPoint, ForecastSummary, Trend};
pub use health::{
    classify, ActivityLevel, ExposureLevel, HealthCondition, HealthProfile, RiskAssessment, RiskLevel,
    SensitivityLevel,
};
pub use pollutant::{Pollutant, PollutantReading, Unit};
pub use reconcile::{reconcile, ConfidenceLevel, DataQuality, ReconciledAssessment, SatelliteEstimate};
pub use weather::{analyze_transport, compute_modifier, TransportAnalysis, WeatherImpact, WeatherSnapshot};

/// An error in handling air quality inputs.
///
/// "Not enough data" inside the core is an `Option`;
/// this type is for callers that need a `Result`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The input was malformed or out of range.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// There was nothing to compute an answer from.
    #[error("no data available: {0}")]
    MissingData(&'static str),
}
