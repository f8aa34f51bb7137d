//! The assessment service: gather observations, run the core, report.

use aqi::{
    alerts::CurrentConditions,
    forecast::ForecastSummary,
    generate_alerts, project, reconcile,
    weather::{activity_hint, analyze_transport},
    AirQualityEstimate, Category, ConfidenceLevel, ForecastPoint, HealthAlert, HealthProfile,
    PollutantReading, ReconciledAssessment, SatelliteEstimate, SubIndices, TransportAnalysis,
    WeatherImpact, WeatherSnapshot,
};
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::{
    config::{Config, ForecastConfig},
    sources::{
        FixtureSources, GroundSource, Location, NullSource, SatelliteSource, SourceError,
        WeatherSource,
    },
};

/// Current weather and what it means for air quality.
#[derive(Debug, Clone, Serialize)]
pub struct WeatherReport {
    pub snapshot: WeatherSnapshot,
    pub impact: WeatherImpact,
    pub description: &'static str,
    pub transport: TransportAnalysis,
    pub activity_hint: &'static str,
}

impl WeatherReport {
    fn new(snapshot: WeatherSnapshot) -> Self {
        let impact = snapshot.impact();
        WeatherReport {
            snapshot,
            impact,
            description: impact.description(),
            transport: analyze_transport(&snapshot),
            activity_hint: activity_hint(&snapshot, &impact),
        }
    }
}

/// Whether the report has an AQI at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Availability {
    Available {
        aqi: f64,
        category: Category,
        confidence: ConfidenceLevel,
    },
    /// No source produced an estimate. There are no numbers to show.
    Unavailable,
}

/// Everything known about one location at one time.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub location: Location,
    pub status: Availability,
    pub estimate: Option<AirQualityEstimate>,
    pub weather: Option<WeatherReport>,
    pub assessment: ReconciledAssessment,
    pub forecast: Vec<ForecastPoint>,
    pub summary: Option<ForecastSummary>,
    pub alerts: Vec<HealthAlert>,
    /// Why each missing source is missing.
    pub unavailable: Vec<String>,
}

impl Report {
    /// The final AQI, or an error saying there is none.
    pub fn aqi(&self) -> Result<f64, aqi::Error> {
        self.assessment.require_final()
    }
}

/// Produces [`Report`]s from a fixed set of sources.
///
/// Sources are supplied once, at construction; tests pass fakes.
pub struct Assessor {
    ground: Box<dyn GroundSource>,
    weather: Box<dyn WeatherSource>,
    satellite: Box<dyn SatelliteSource>,
    location: Location,
    profile: HealthProfile,
    forecast: ForecastConfig,
}

impl Assessor {
    pub fn new(
        ground: Box<dyn GroundSource>,
        weather: Box<dyn WeatherSource>,
        satellite: Box<dyn SatelliteSource>,
    ) -> Self {
        Assessor {
            ground,
            weather,
            satellite,
            location: Location::default(),
            profile: HealthProfile::default(),
            forecast: ForecastConfig::default(),
        }
    }

    /// Build the sources the configuration names.
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let assessor = match &config.sources.fixture {
            Some(path) => {
                let fixture = FixtureSources::load(path)?;
                Assessor::new(
                    Box::new(fixture.clone()),
                    Box::new(fixture.clone()),
                    Box::new(fixture),
                )
            }
            None => {
                tracing::warn!("no data sources configured; every assessment will be unavailable");
                Assessor::new(
                    Box::new(NullSource {}),
                    Box::new(NullSource {}),
                    Box::new(NullSource {}),
                )
            }
        };
        Ok(assessor
            .with_location(config.location)
            .with_profile(config.profile.clone())
            .with_forecast(config.forecast.clone()))
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    pub fn with_profile(mut self, profile: HealthProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_forecast(mut self, forecast: ForecastConfig) -> Self {
        self.forecast = forecast;
        self
    }

    fn ground_readings(&mut self, unavailable: &mut Vec<String>) -> Vec<PollutantReading> {
        let readings = match self.ground.readings(&self.location) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("{e}");
                unavailable.push(e.to_string());
                return Vec::new();
            }
        };
        let total = readings.len();
        let valid: Vec<PollutantReading> = readings
            .into_iter()
            .filter(|r| match r.validate() {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("dropping reading: {e}");
                    false
                }
            })
            .collect();
        if valid.is_empty() {
            let reason = if total == 0 {
                "source returned no readings".to_string()
            } else {
                format!("all {total} ground reading(s) were invalid")
            };
            let e = SourceError::unavailable("ground", reason);
            tracing::warn!("{e}");
            unavailable.push(e.to_string());
        }
        valid
    }

    fn current_weather(&mut self, unavailable: &mut Vec<String>) -> Option<WeatherSnapshot> {
        match self.weather.current(&self.location) {
            Ok(w) => Some(w),
            Err(e) => {
                tracing::warn!("{e}");
                unavailable.push(e.to_string());
                None
            }
        }
    }

    fn satellite_estimate(&mut self, unavailable: &mut Vec<String>) -> Option<SatelliteEstimate> {
        match self.satellite.estimate(&self.location) {
            Ok(s) if s.aqi.is_finite() && s.aqi >= 0.0 => Some(s),
            Ok(s) => {
                tracing::warn!("dropping satellite estimate with AQI {}", s.aqi);
                None
            }
            Err(e) => {
                tracing::warn!("{e}");
                unavailable.push(e.to_string());
                None
            }
        }
    }

    /// Assess the configured location as of `now`.
    ///
    /// `now`'s time zone sets the hour of day used by the forecast's daily cycle.
    pub fn assess<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Report {
        let generated_at = now.with_timezone(&Utc);
        let mut unavailable = Vec::new();

        let readings = self.ground_readings(&mut unavailable);
        let estimate = AirQualityEstimate::from_readings(&readings);
        let weather = self
            .current_weather(&mut unavailable)
            .map(WeatherReport::new);
        let satellite = self.satellite_estimate(&mut unavailable);

        let assessment = reconcile(
            estimate.as_ref(),
            weather.as_ref().map(|w| w.impact.aqi_modifier),
            satellite.as_ref(),
        );

        let Some(final_aqi) = assessment.final_aqi else {
            tracing::warn!(
                "no AQI for {:.3},{:.3}: no source produced an estimate",
                self.location.latitude,
                self.location.longitude
            );
            return Report {
                generated_at,
                location: self.location,
                status: Availability::Unavailable,
                estimate,
                weather,
                assessment,
                forecast: Vec::new(),
                summary: None,
                alerts: Vec::new(),
                unavailable,
            };
        };

        let hours = self.forecast.hours_ahead;
        let hourly = match self.weather.hourly(&self.location, hours) {
            Ok(h) => Some(h),
            Err(e) => {
                tracing::warn!("{e}");
                unavailable.push(e.to_string());
                None
            }
        };
        let forecast = project(
            self.forecast.model,
            final_aqi,
            &assessment.baseline_sources(),
            hours,
            hourly.as_deref(),
            now,
        );
        let summary = ForecastSummary::from_points(&forecast);

        let current = CurrentConditions {
            aqi: final_aqi,
            sub_indices: estimate
                .as_ref()
                .map(|e| e.sub_indices.clone())
                .unwrap_or_else(SubIndices::new),
        };
        let alerts = generate_alerts(Some(&current), &forecast, &self.profile, generated_at);

        let status = Availability::Available {
            aqi: final_aqi,
            category: Category::from_aqi(final_aqi),
            confidence: assessment.confidence,
        };
        tracing::info!(
            "AQI {:.0} ({}), {:?} confidence, {}h {} forecast, {} alert(s)",
            final_aqi,
            Category::from_aqi(final_aqi),
            assessment.confidence,
            forecast.len(),
            self.forecast.model,
            alerts.len()
        );

        Report {
            generated_at,
            location: self.location,
            status,
            estimate,
            weather,
            assessment,
            forecast,
            summary,
            alerts,
            unavailable,
        }
    }
}
