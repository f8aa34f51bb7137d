//! Hour-by-hour AQI projection.
//!
//! Three models are available. [`ForecastModel::TemporalTrend`] follows daily
//! and weekly cycles from the baseline alone; [`ForecastModel::WeatherIntegrated`]
//! scales the baseline by each forecast hour's weather; and
//! [`ForecastModel::Ensemble`] blends the two.
//!
//! Every run is a pure function of its inputs, including the start time:
//! there is no hidden clock, so a projection can be replayed exactly.

use std::{collections::BTreeSet, f64::consts::PI, fmt, str::FromStr};

use chrono::{DateTime, Datelike, TimeDelta, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::{compute_modifier, Category, Error, Pollutant, WeatherSnapshot};

/// Which projection to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastModel {
    TemporalTrend,
    WeatherIntegrated,
    #[default]
    Ensemble,
}

impl ForecastModel {
    pub fn name(&self) -> &'static str {
        match self {
            ForecastModel::TemporalTrend => "temporal_trend",
            ForecastModel::WeatherIntegrated => "weather_integrated",
            ForecastModel::Ensemble => "ensemble",
        }
    }
}

impl fmt::Display for ForecastModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ForecastModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "temporal_trend" | "temporal" => Ok(ForecastModel::TemporalTrend),
            "weather_integrated" | "weather" => Ok(ForecastModel::WeatherIntegrated),
            "ensemble" => Ok(ForecastModel::Ensemble),
            _ => Err(Error::InvalidInput(format!("unknown forecast model {s:?}"))),
        }
    }
}

/// What a forecast point was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    TemporalAnalysis,
    WeatherForecast,
    GroundStations,
    Satellite,
}

/// One hour of a projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Hours after the start of the projection, from 1.
    pub hour_ahead: u32,
    pub timestamp: DateTime<Utc>,
    /// Rounded to one decimal; never below [`MIN_PREDICTED_AQI`].
    pub predicted_aqi: f64,
    pub category: Category,
    /// Rounded to two decimals. Never increases along one projection.
    pub confidence: f64,
    pub primary_pollutants: BTreeSet<Pollutant>,
    pub data_sources: BTreeSet<DataSource>,
}

impl ForecastPoint {
    /// The primary pollutants a rule picked out, leaving out the PM2.5 that
    /// [`primary_pollutants`] names when no rule applies.
    pub fn attributed_pollutants(&self) -> BTreeSet<Pollutant> {
        if self.primary_pollutants == default_pollutants(self.predicted_aqi) {
            BTreeSet::new()
        } else {
            self.primary_pollutants.clone()
        }
    }
}

/// Floor for every predicted value: a forecast never claims perfectly clean air.
pub const MIN_PREDICTED_AQI: f64 = 1.0;

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

const UNHEALTHY_SENSITIVE_AQI: f64 = 100.0;

/// Pollutants likely to drive the AQI at a forecast hour.
///
/// Particulates and NO2 when the air is unhealthy, ozone in the heat,
/// coarse particulates when the air is still. PM2.5 if nothing else applies.
pub fn primary_pollutants(aqi: f64, weather: Option<&WeatherSnapshot>) -> BTreeSet<Pollutant> {
    let mut pollutants = BTreeSet::new();
    if aqi > UNHEALTHY_SENSITIVE_AQI {
        pollutants.insert(Pollutant::Pm25);
        pollutants.insert(Pollutant::No2);
    }
    if let Some(w) = weather {
        if w.temperature > 25.0 {
            pollutants.insert(Pollutant::O3);
        }
        if w.wind_speed < 3.0 {
            pollutants.insert(Pollutant::Pm10);
        }
    }
    if pollutants.is_empty() {
        pollutants = default_pollutants(aqi);
    }
    pollutants
}

// The no-rule fallback. Empty above 100, where PM2.5 is always named by rule.
fn default_pollutants(aqi: f64) -> BTreeSet<Pollutant> {
    if aqi > UNHEALTHY_SENSITIVE_AQI {
        BTreeSet::new()
    } else {
        BTreeSet::from([Pollutant::Pm25])
    }
}

fn point(
    hour_ahead: u32,
    timestamp: DateTime<Utc>,
    aqi: f64,
    confidence: f64,
    weather: Option<&WeatherSnapshot>,
    data_sources: BTreeSet<DataSource>,
) -> ForecastPoint {
    let predicted_aqi = round_to(aqi.max(MIN_PREDICTED_AQI), 1);
    ForecastPoint {
        hour_ahead,
        timestamp,
        predicted_aqi,
        category: Category::from_aqi(predicted_aqi),
        confidence: round_to(confidence.clamp(0.0, 1.0), 2),
        primary_pollutants: primary_pollutants(predicted_aqi, weather),
        data_sources,
    }
}

fn hour_after<Tz: TimeZone>(start: &DateTime<Tz>, hours: u32) -> DateTime<Tz> {
    start.clone() + TimeDelta::hours(i64::from(hours))
}

/// Pollution peaks mid-afternoon and bottoms out before dawn.
fn diurnal_factor(hour_of_day: u32) -> f64 {
    1.0 + 0.2 * (2.0 * PI * (hour_of_day as f64 - 6.0) / 24.0).sin()
}

/// Weekday traffic adds a little; weekends take a little away.
fn weekly_factor(days_from_monday: u32) -> f64 {
    if days_from_monday < 5 {
        1.05
    } else {
        0.95
    }
}

/// Project from daily and weekly cycles alone.
///
/// Hour of day and day of week are read in `start`'s time zone, so pass a
/// local time to get local rush hours.
pub fn temporal_trend<Tz: TimeZone>(
    baseline: f64,
    hours: u32,
    start: &DateTime<Tz>,
) -> Vec<ForecastPoint> {
    (1..=hours)
        .map(|hour| {
            let at = hour_after(start, hour);
            let trend = 1.0 + 0.002 * hour as f64;
            let aqi = baseline
                * diurnal_factor(at.hour())
                * weekly_factor(at.weekday().num_days_from_monday())
                * trend;
            let confidence = (0.85 - 0.01 * hour as f64).max(0.4);
            point(
                hour,
                at.with_timezone(&Utc),
                aqi,
                confidence,
                None,
                BTreeSet::from([DataSource::TemporalAnalysis]),
            )
        })
        .collect()
}

/// Project by applying each forecast hour's weather to the baseline.
///
/// `weather[0]` is the forecast for hour 1. Hours past the end of `weather`
/// fall back to a slow drift with lower confidence.
/// Each point is tagged with `baseline_sources`, plus
/// [`DataSource::WeatherForecast`] on hours that had a snapshot.
pub fn weather_integrated<Tz: TimeZone>(
    baseline: f64,
    baseline_sources: &BTreeSet<DataSource>,
    hours: u32,
    weather: &[WeatherSnapshot],
    start: &DateTime<Tz>,
) -> Vec<ForecastPoint> {
    let mut ceiling = 1.0f64;
    (1..=hours)
        .map(|hour| {
            let h = hour as f64;
            let snapshot = weather.get(hour as usize - 1);
            let (aqi, confidence) = match snapshot {
                Some(w) => (
                    baseline * compute_modifier(w).aqi_modifier * (1.0 + 0.005 * h),
                    (0.9 - 0.015 * h).max(0.1),
                ),
                None => (baseline * (1.0 + 0.01 * h), (0.7 - 0.02 * h).max(0.3)),
            };
            // Running minimum: falling back must not raise confidence again.
            ceiling = ceiling.min(round_to(confidence, 2));
            let mut sources = baseline_sources.clone();
            if snapshot.is_some() {
                sources.insert(DataSource::WeatherForecast);
            }
            point(
                hour,
                hour_after(start, hour).with_timezone(&Utc),
                aqi,
                ceiling,
                snapshot,
                sources,
            )
        })
        .collect()
}

const WEATHER_WEIGHT: f64 = 0.6;
const TEMPORAL_WEIGHT: f64 = 0.4;

/// Blend the weather-integrated and temporal-trend projections hour by hour.
pub fn ensemble<Tz: TimeZone>(
    baseline: f64,
    baseline_sources: &BTreeSet<DataSource>,
    hours: u32,
    weather: &[WeatherSnapshot],
    start: &DateTime<Tz>,
) -> Vec<ForecastPoint> {
    let temporal = temporal_trend(baseline, hours, start);
    let integrated = weather_integrated(baseline, baseline_sources, hours, weather, start);
    temporal
        .into_iter()
        .zip(integrated)
        .map(|(t, w)| {
            let aqi = WEATHER_WEIGHT * w.predicted_aqi + TEMPORAL_WEIGHT * t.predicted_aqi;
            let confidence = WEATHER_WEIGHT * w.confidence + TEMPORAL_WEIGHT * t.confidence;
            let sources = t.data_sources.union(&w.data_sources).copied().collect();
            point(
                t.hour_ahead,
                t.timestamp,
                aqi,
                confidence,
                weather.get(t.hour_ahead as usize - 1),
                sources,
            )
        })
        .collect()
}

/// Project `hours` hours ahead from `baseline` using `model`.
///
/// Returns exactly `hours` points with `hour_ahead` running 1, 2, ... `hours`.
/// Without a weather forecast, the weather-dependent models run on their
/// fallback alone. `baseline_sources` says where `baseline` came from; see
/// [`ReconciledAssessment::baseline_sources`](crate::ReconciledAssessment::baseline_sources).
pub fn project<Tz: TimeZone>(
    model: ForecastModel,
    baseline: f64,
    baseline_sources: &BTreeSet<DataSource>,
    hours: u32,
    weather: Option<&[WeatherSnapshot]>,
    start: &DateTime<Tz>,
) -> Vec<ForecastPoint> {
    let weather = weather.unwrap_or_default();
    tracing::debug!(
        "projecting {hours}h from AQI {baseline:.1} with {model} model, {} weather hours",
        weather.len()
    );
    match model {
        ForecastModel::TemporalTrend => temporal_trend(baseline, hours, start),
        ForecastModel::WeatherIntegrated => {
            weather_integrated(baseline, baseline_sources, hours, weather, start)
        }
        ForecastModel::Ensemble => ensemble(baseline, baseline_sources, hours, weather, start),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Worsening,
    Stable,
}

/// A notable point in a forecast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extreme {
    pub aqi: f64,
    pub hour_ahead: u32,
    pub category: Category,
}

impl Extreme {
    fn of(p: &ForecastPoint) -> Self {
        Extreme {
            aqi: p.predicted_aqi,
            hour_ahead: p.hour_ahead,
            category: p.category,
        }
    }
}

/// Statistics over a whole projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub hours: usize,
    pub average_aqi: f64,
    /// Earliest hour with the highest AQI.
    pub peak: Extreme,
    /// Earliest hour with the lowest AQI.
    pub minimum: Extreme,
    /// Hours above 100.
    pub unhealthy_hours: usize,
    /// Hours above 200.
    pub very_unhealthy_hours: usize,
    /// Share of hours rated Good, in percent.
    pub percent_good: f64,
    pub average_confidence: f64,
    pub min_confidence: f64,
    /// Hours with confidence above 0.7.
    pub high_confidence_hours: usize,
    /// Last hour compared with the first.
    pub trend: Trend,
    /// Size of the change from first to last hour, in percent of the first.
    pub trend_strength: f64,
}

impl ForecastSummary {
    /// Summarize a projection. `None` for an empty one.
    pub fn from_points(points: &[ForecastPoint]) -> Option<Self> {
        let first = points.first()?;
        let last = points.last()?;
        let n = points.len() as f64;

        let mut peak = first;
        let mut minimum = first;
        for p in points {
            if p.predicted_aqi > peak.predicted_aqi {
                peak = p;
            }
            if p.predicted_aqi < minimum.predicted_aqi {
                minimum = p;
            }
        }
        let above = |aqi: f64| points.iter().filter(|p| p.predicted_aqi > aqi).count();
        let good = points.len() - above(50.0);

        let trend = if last.predicted_aqi < first.predicted_aqi {
            Trend::Improving
        } else if last.predicted_aqi > first.predicted_aqi {
            Trend::Worsening
        } else {
            Trend::Stable
        };

        Some(ForecastSummary {
            hours: points.len(),
            average_aqi: round_to(points.iter().map(|p| p.predicted_aqi).sum::<f64>() / n, 1),
            peak: Extreme::of(peak),
            minimum: Extreme::of(minimum),
            unhealthy_hours: above(100.0),
            very_unhealthy_hours: above(200.0),
            percent_good: round_to(good as f64 / n * 100.0, 1),
            average_confidence: round_to(points.iter().map(|p| p.confidence).sum::<f64>() / n, 2),
            min_confidence: points.iter().map(|p| p.confidence).fold(f64::INFINITY, f64::min),
            high_confidence_hours: points.iter().filter(|p| p.confidence > 0.7).count(),
            trend,
            trend_strength: round_to(
                (last.predicted_aqi - first.predicted_aqi).abs() / first.predicted_aqi * 100.0,
                1,
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use proptest::prelude::*;

    fn weather(wind_speed: f64, pressure: f64, temperature: f64) -> WeatherSnapshot {
        WeatherSnapshot {
            temperature,
            humidity: 50.0,
            pressure,
            wind_speed,
            wind_direction: 180.0,
            precipitation: 0.0,
            cloud_cover: 0.0,
        }
    }

    fn monday_11am() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 11, 0, 0).unwrap()
    }

    fn ground() -> BTreeSet<DataSource> {
        BTreeSet::from([DataSource::GroundStations])
    }

    #[test]
    fn hours_run_from_one() {
        let start = monday_11am();
        let w = vec![weather(4.0, 1013.0, 20.0); 12];
        for model in [
            ForecastModel::TemporalTrend,
            ForecastModel::WeatherIntegrated,
            ForecastModel::Ensemble,
        ] {
            let points = project(model, 80.0, &ground(), 24, Some(&w[..]), &start);
            assert_eq!(points.len(), 24, "{model}");
            for (i, p) in points.iter().enumerate() {
                assert_eq!(p.hour_ahead as usize, i + 1);
                assert_eq!(p.timestamp, start + TimeDelta::hours(i as i64 + 1));
            }
        }
        assert!(project(ForecastModel::Ensemble, 80.0, &ground(), 0, None, &start).is_empty());
    }

    #[test]
    fn temporal_trend_follows_the_clock() {
        // Noon on a Monday: diurnal peak 1.2, weekday 1.05, trend 1.002.
        let points = temporal_trend(100.0, 1, &monday_11am());
        assert_eq!(points[0].predicted_aqi, 126.3);
        assert_eq!(points[0].confidence, 0.84);
        assert_eq!(points[0].data_sources, BTreeSet::from([DataSource::TemporalAnalysis]));

        // 06:00 on a Saturday: diurnal 1.0, weekend 0.95.
        let saturday = Utc.with_ymd_and_hms(2024, 6, 8, 5, 0, 0).unwrap();
        assert_eq!(temporal_trend(100.0, 1, &saturday)[0].predicted_aqi, 95.2);
    }

    #[test]
    fn temporal_trend_uses_local_time() {
        let eastern = FixedOffset::west_opt(5 * 3600).unwrap();
        let start = eastern.with_ymd_and_hms(2024, 6, 3, 11, 0, 0).unwrap();
        let p = &temporal_trend(100.0, 1, &start)[0];
        assert_eq!(p.predicted_aqi, 126.3);
        assert_eq!(p.timestamp, Utc.with_ymd_and_hms(2024, 6, 3, 17, 0, 0).unwrap());
    }

    #[test]
    fn weather_integrated_then_fallback() {
        // Calm, hot, high pressure: modifier 1.625.
        let w = [weather(0.5, 1025.0, 30.0)];
        let points = weather_integrated(100.0, &ground(), 3, &w, &monday_11am());
        assert_eq!(points[0].predicted_aqi, 163.3);
        assert_eq!(
            points[0].data_sources,
            BTreeSet::from([DataSource::WeatherForecast, DataSource::GroundStations])
        );
        assert_eq!(
            points[0].primary_pollutants,
            BTreeSet::from([Pollutant::Pm25, Pollutant::Pm10, Pollutant::O3, Pollutant::No2])
        );
        // Past the weather forecast: 1% drift per hour.
        assert_eq!(points[1].predicted_aqi, 102.0);
        assert_eq!(points[1].confidence, 0.66);
        assert_eq!(points[1].primary_pollutants, BTreeSet::from([Pollutant::Pm25, Pollutant::No2]));
        assert_eq!(points[2].confidence, 0.64);
        // No snapshot for these hours, so no weather attribution.
        assert_eq!(points[1].data_sources, ground());
    }

    #[test]
    fn sources_follow_the_baseline() {
        let satellite = BTreeSet::from([DataSource::Satellite]);
        let points = project(ForecastModel::Ensemble, 70.0, &satellite, 2, None, &monday_11am());
        for p in &points {
            assert_eq!(
                p.data_sources,
                BTreeSet::from([DataSource::TemporalAnalysis, DataSource::Satellite])
            );
        }

        let points = weather_integrated(70.0, &BTreeSet::new(), 1, &[], &monday_11am());
        assert!(points[0].data_sources.is_empty());
    }

    #[test]
    fn ensemble_blends_sixty_forty() {
        let start = monday_11am();
        let w = [weather(6.0, 1010.0, 20.0), weather(6.0, 1010.0, 20.0)];
        let t = temporal_trend(90.0, 2, &start);
        let i = weather_integrated(90.0, &ground(), 2, &w, &start);
        let e = ensemble(90.0, &ground(), 2, &w, &start);
        for h in 0..2 {
            let blended = 0.6 * i[h].predicted_aqi + 0.4 * t[h].predicted_aqi;
            assert!((e[h].predicted_aqi - blended).abs() <= 0.05 + 1e-9);
            let confidence = 0.6 * i[h].confidence + 0.4 * t[h].confidence;
            assert!((e[h].confidence - confidence).abs() <= 0.005 + 1e-9);
        }
        assert_eq!(
            e[0].data_sources,
            BTreeSet::from([
                DataSource::TemporalAnalysis,
                DataSource::WeatherForecast,
                DataSource::GroundStations
            ])
        );
    }

    #[test]
    fn predictions_stay_positive() {
        let points = project(ForecastModel::Ensemble, 0.0, &ground(), 6, None, &monday_11am());
        assert!(points.iter().all(|p| p.predicted_aqi >= MIN_PREDICTED_AQI));
    }

    #[test]
    fn clean_calm_air_still_names_a_pollutant() {
        assert_eq!(primary_pollutants(40.0, None), BTreeSet::from([Pollutant::Pm25]));
        assert_eq!(
            primary_pollutants(40.0, Some(&weather(1.0, 1013.0, 15.0))),
            BTreeSet::from([Pollutant::Pm10])
        );
    }

    #[test]
    fn fallback_pollutant_is_not_attributed() {
        let calm_hot = weather(1.0, 1013.0, 30.0);
        let points = weather_integrated(40.0, &ground(), 2, &[calm_hot], &monday_11am());
        assert_eq!(points[0].attributed_pollutants(), points[0].primary_pollutants);
        assert!(!points[0].attributed_pollutants().is_empty());
        // Hour 2 has no weather and clean air: only the PM2.5 default.
        assert_eq!(points[1].primary_pollutants, BTreeSet::from([Pollutant::Pm25]));
        assert!(points[1].attributed_pollutants().is_empty());

        let dirty = &weather_integrated(150.0, &ground(), 1, &[], &monday_11am())[0];
        assert_eq!(
            dirty.attributed_pollutants(),
            BTreeSet::from([Pollutant::Pm25, Pollutant::No2])
        );
    }

    #[test]
    fn model_names_parse() {
        assert_eq!("ensemble".parse::<ForecastModel>().unwrap(), ForecastModel::Ensemble);
        assert_eq!(
            "Weather-Integrated".parse::<ForecastModel>().unwrap(),
            ForecastModel::WeatherIntegrated
        );
        assert!("crystal_ball".parse::<ForecastModel>().is_err());
    }

    fn fixed(hour_ahead: u32, predicted_aqi: f64, confidence: f64) -> ForecastPoint {
        point(
            hour_ahead,
            monday_11am() + TimeDelta::hours(i64::from(hour_ahead)),
            predicted_aqi,
            confidence,
            None,
            BTreeSet::new(),
        )
    }

    #[test]
    fn summary() {
        let points = [
            fixed(1, 40.0, 0.9),
            fixed(2, 120.0, 0.8),
            fixed(3, 250.0, 0.7),
            fixed(4, 250.0, 0.6),
            fixed(5, 30.0, 0.5),
        ];
        let s = ForecastSummary::from_points(&points).unwrap();
        assert_eq!(s.hours, 5);
        assert_eq!(s.average_aqi, 138.0);
        assert_eq!(s.peak.hour_ahead, 3);
        assert_eq!(s.peak.category, Category::VeryUnhealthy);
        assert_eq!(s.minimum.hour_ahead, 5);
        assert_eq!(s.minimum.aqi, 30.0);
        assert_eq!(s.unhealthy_hours, 3);
        assert_eq!(s.very_unhealthy_hours, 2);
        assert_eq!(s.percent_good, 40.0);
        assert_eq!(s.average_confidence, 0.7);
        assert_eq!(s.min_confidence, 0.5);
        assert_eq!(s.high_confidence_hours, 2);
        assert_eq!(s.trend, Trend::Improving);
        assert_eq!(s.trend_strength, 25.0);

        assert_eq!(ForecastSummary::from_points(&[]), None);
    }

    fn arb_weather() -> impl Strategy<Value = WeatherSnapshot> {
        (0.0f64..20.0, 980.0f64..1040.0, 0.0f64..100.0, 0.0f64..5.0, -10.0f64..40.0).prop_map(
            |(wind_speed, pressure, humidity, precipitation, temperature)| WeatherSnapshot {
                temperature,
                humidity,
                pressure,
                wind_speed,
                wind_direction: 0.0,
                precipitation,
                cloud_cover: 0.0,
            },
        )
    }

    proptest! {
        #[test]
        fn confidence_never_rises(
            baseline in 0.0f64..400.0,
            hours in 1u32..72,
            weather in prop::collection::vec(arb_weather(), 0..72),
            offset in 0i64..168,
        ) {
            let start = monday_11am() + TimeDelta::hours(offset);
            for model in [ForecastModel::TemporalTrend, ForecastModel::WeatherIntegrated, ForecastModel::Ensemble] {
                let points = project(model, baseline, &ground(), hours, Some(&weather[..]), &start);
                prop_assert_eq!(points.len(), hours as usize);
                for pair in points.windows(2) {
                    prop_assert!(pair[1].confidence <= pair[0].confidence);
                }
                for p in &points {
                    prop_assert!(p.predicted_aqi >= MIN_PREDICTED_AQI);
                    prop_assert!((0.0..=1.0).contains(&p.confidence));
                }
            }
        }
    }
}
