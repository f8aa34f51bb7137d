//! Composite AQI: the worst sub-index wins.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{convert::pollutant_to_aqi, Category, Pollutant, PollutantReading};

/// Sub-index per pollutant. Iterates in pollutant priority order.
pub type SubIndices = BTreeMap<Pollutant, u16>;

/// Base confidence for ground-station data: more stations, more trust.
const MANY_STATIONS: usize = 3;
const MANY_STATIONS_CONFIDENCE: f64 = 0.8;
const FEW_STATIONS_CONFIDENCE: f64 = 0.6;

/// Pick the composite AQI and the pollutant responsible for it.
///
/// Ties go to the pollutant earlier in priority order
/// (PM2.5 > PM10 > O3 > NO2 > SO2 > CO).
/// Returns `None` for an empty mapping: no data is not the same as AQI 0.
pub fn select_composite(sub_indices: &SubIndices) -> Option<(u16, Pollutant)> {
    let mut best: Option<(u16, Pollutant)> = None;
    // Priority order comes from the map; only a strictly greater value displaces.
    for (&pollutant, &aqi) in sub_indices {
        match best {
            Some((top, _)) if aqi <= top => {}
            _ => best = Some((aqi, pollutant)),
        }
    }
    best
}

/// A ground-station AQI estimate for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityEstimate {
    pub composite_aqi: u16,
    pub category: Category,
    pub dominant_pollutant: Pollutant,
    pub sub_indices: SubIndices,
    /// Station or provider identifiers that contributed readings.
    pub sources: Vec<String>,
    /// Confidence in this estimate alone, before reconciliation.
    pub confidence: f64,
}

impl AirQualityEstimate {
    /// Build an estimate from per-pollutant sub-indices.
    ///
    /// `sources` lists the contributing stations; their count sets the confidence.
    pub fn from_sub_indices(sub_indices: SubIndices, sources: Vec<String>) -> Option<Self> {
        let (composite_aqi, dominant_pollutant) = select_composite(&sub_indices)?;
        let confidence = if sources.len() > MANY_STATIONS {
            MANY_STATIONS_CONFIDENCE
        } else {
            FEW_STATIONS_CONFIDENCE
        };
        Some(AirQualityEstimate {
            composite_aqi,
            category: Category::from_aqi(composite_aqi as f64),
            dominant_pollutant,
            sub_indices,
            sources,
            confidence,
        })
    }

    /// Build an estimate from raw readings.
    ///
    /// Readings are grouped by pollutant and their concentrations averaged
    /// across stations before conversion. Readings in a unit that can't be
    /// converted to the pollutant's breakpoint unit are skipped.
    /// Readings are assumed to be [validated](PollutantReading::validate).
    pub fn from_readings(readings: &[PollutantReading]) -> Option<Self> {
        let mut totals: BTreeMap<Pollutant, (f64, usize)> = BTreeMap::new();
        let mut sources = BTreeSet::new();

        for reading in readings {
            let Some(value) = reading.standard_value() else {
                tracing::warn!(
                    "skipping {} reading from {}: cannot convert {} to {}",
                    reading.pollutant,
                    reading.source,
                    reading.unit,
                    reading.pollutant.standard_unit()
                );
                continue;
            };
            let entry = totals.entry(reading.pollutant).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
            sources.insert(reading.source.clone());
        }

        let sub_indices: SubIndices = totals
            .into_iter()
            .map(|(pollutant, (sum, n))| (pollutant, pollutant_to_aqi(pollutant, sum / n as f64)))
            .collect();
        let estimate = Self::from_sub_indices(sub_indices, sources.into_iter().collect());
        if let Some(e) = &estimate {
            tracing::debug!(
                "estimate from {} readings: AQI {} ({}), dominant {}",
                readings.len(),
                e.composite_aqi,
                e.category,
                e.dominant_pollutant
            );
        }
        estimate
    }

    /// Number of distinct stations behind this estimate.
    pub fn station_count(&self) -> usize {
        self.sources.len()
    }
}
