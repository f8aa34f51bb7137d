//! Reconciling ground, weather and satellite estimates into one AQI.

use serde::{Deserialize, Serialize};

use std::collections::BTreeSet;

use crate::{AirQualityEstimate, Category, DataSource, Error};

/// Quality flag attached to a satellite retrieval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQuality {
    Excellent,
    Good,
    #[default]
    Moderate,
    Poor,
}

impl DataQuality {
    /// How much a satellite estimate of this quality is trusted.
    pub fn base_confidence(&self) -> f64 {
        match self {
            DataQuality::Excellent => 0.9,
            DataQuality::Good => 0.8,
            DataQuality::Moderate => 0.7,
            DataQuality::Poor => 0.5,
        }
    }
}

/// Surface AQI estimated from satellite column densities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SatelliteEstimate {
    pub aqi: f64,
    #[serde(default)]
    pub quality: DataQuality,
}

impl SatelliteEstimate {
    pub fn new(aqi: f64) -> Self {
        SatelliteEstimate {
            aqi,
            quality: DataQuality::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Agreement {
    Good,
    Moderate,
    Poor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Validated,
    Inconsistent,
}

/// Satellite-versus-ground comparison. Advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossValidation {
    pub agreement: Agreement,
    pub difference: f64,
    pub status: ValidationStatus,
}

impl CrossValidation {
    fn compare(satellite: f64, weather_adjusted: f64) -> Self {
        let difference = (satellite - weather_adjusted).abs();
        let (agreement, status) = if difference < 20.0 {
            (Agreement::Good, ValidationStatus::Validated)
        } else if difference < 40.0 {
            (Agreement::Moderate, ValidationStatus::Validated)
        } else {
            (Agreement::Poor, ValidationStatus::Inconsistent)
        };
        CrossValidation {
            agreement,
            difference,
            status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Low,
    Moderate,
    High,
}

impl ConfidenceLevel {
    pub fn from_score(score: f64) -> Self {
        if score > 0.75 {
            ConfidenceLevel::High
        } else if score > 0.5 {
            ConfidenceLevel::Moderate
        } else {
            ConfidenceLevel::Low
        }
    }
}

/// Base confidence of the weather integration step.
const WEATHER_CONFIDENCE: f64 = 0.9;

/// The outcome of merging every available estimate for a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledAssessment {
    /// Ground-station composite AQI.
    pub base_aqi: Option<f64>,
    /// Ground composite times the weather modifier.
    pub weather_adjusted_aqi: Option<f64>,
    pub satellite_aqi: Option<f64>,
    /// First present of: weather-adjusted, base, satellite.
    pub final_aqi: Option<f64>,
    /// Present only when both weather-adjusted and satellite values exist.
    pub cross_validation: Option<CrossValidation>,
    pub confidence_score: f64,
    pub confidence: ConfidenceLevel,
}

impl ReconciledAssessment {
    pub fn category(&self) -> Option<Category> {
        self.final_aqi.map(Category::from_aqi)
    }

    /// The final AQI, or an explicit error when no source contributed.
    pub fn require_final(&self) -> Result<f64, Error> {
        self.final_aqi
            .ok_or(Error::MissingData("no ground, weather or satellite estimate"))
    }

    /// Where the final AQI came from, for tagging forecasts projected from it.
    ///
    /// Empty when there is no final AQI. A satellite estimate that only
    /// cross-checks ground data is not counted.
    pub fn baseline_sources(&self) -> BTreeSet<DataSource> {
        let mut sources = BTreeSet::new();
        if self.base_aqi.is_some() {
            sources.insert(DataSource::GroundStations);
        } else if self.satellite_aqi.is_some() {
            sources.insert(DataSource::Satellite);
        }
        sources
    }
}

fn mean(scores: &[f64]) -> Option<f64> {
    if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }
}

/// Merge the available estimates into one assessment.
///
/// The weather modifier only contributes when there is a ground estimate to
/// adjust. A satellite estimate cross-checks the ground data when both exist.
///
/// The confidence score is the mean of the contributing sources' base scores,
/// so a weak source can pull it down. With no sources at all there is no
/// final AQI and the score is 0.0 (low).
pub fn reconcile(
    ground: Option<&AirQualityEstimate>,
    weather_modifier: Option<f64>,
    satellite: Option<&SatelliteEstimate>,
) -> ReconciledAssessment {
    let base_aqi = ground.map(|g| g.composite_aqi as f64);
    let weather_adjusted_aqi = base_aqi.zip(weather_modifier).map(|(base, m)| base * m);
    let satellite_aqi = satellite.map(|s| s.aqi);

    let final_aqi = weather_adjusted_aqi.or(base_aqi).or(satellite_aqi);
    let cross_validation = satellite_aqi
        .zip(weather_adjusted_aqi)
        .map(|(sat, adjusted)| CrossValidation::compare(sat, adjusted));

    let mut scores = Vec::with_capacity(3);
    if let Some(g) = ground {
        scores.push(g.confidence);
    }
    if weather_adjusted_aqi.is_some() {
        scores.push(WEATHER_CONFIDENCE);
    }
    if let Some(s) = satellite {
        scores.push(s.quality.base_confidence());
    }
    let confidence_score = mean(&scores).unwrap_or(0.0);

    let assessment = ReconciledAssessment {
        base_aqi,
        weather_adjusted_aqi,
        satellite_aqi,
        final_aqi,
        cross_validation,
        confidence_score,
        confidence: ConfidenceLevel::from_score(confidence_score),
    };
    tracing::debug!(
        "reconciled {} source(s): final {:?}, confidence {:?} ({:.2})",
        scores.len(),
        assessment.final_aqi,
        assessment.confidence,
        assessment.confidence_score
    );
    assessment
}
