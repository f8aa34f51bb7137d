use std::{collections::BTreeSet, path::Path, thread, time::Duration};

use airwatch::{
    config::{Config, ForecastConfig},
    service::{Assessor, Availability},
    shutdown::Shutdown,
    sources::{FakeGroundSource, FakeSatelliteSource, FakeWeatherSource, NullSource},
};
use aqi::{
    reconcile::Agreement, Category, DataQuality, DataSource, ForecastModel, HealthCondition,
    HealthProfile, Pollutant, PollutantReading, SatelliteEstimate, Unit, WeatherSnapshot,
};
use chrono::{DateTime, TimeZone, Utc};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 14, 0, 0).unwrap()
}

fn pm25(value: f64, source: &str) -> PollutantReading {
    PollutantReading {
        pollutant: Pollutant::Pm25,
        value,
        unit: Unit::MicrogramsPerCubicMeter,
        source: source.to_string(),
        observed_at: now(),
    }
}

fn neutral_weather() -> WeatherSnapshot {
    WeatherSnapshot {
        temperature: 20.0,
        humidity: 50.0,
        pressure: 1013.0,
        wind_speed: 4.0,
        wind_direction: 180.0,
        precipitation: 0.0,
        cloud_cover: 20.0,
    }
}

fn all_sources(satellite_aqi: f64) -> Assessor {
    Assessor::new(
        Box::new(FakeGroundSource {
            readings: vec![pm25(30.0, "a"), pm25(60.0, "b")],
        }),
        Box::new(FakeWeatherSource {
            current: neutral_weather(),
            hourly: vec![neutral_weather(); 12],
        }),
        Box::new(FakeSatelliteSource {
            estimate: SatelliteEstimate::new(satellite_aqi),
        }),
    )
}

#[test]
fn all_sources_available() {
    let report = all_sources(110.0).assess(&now());

    // Mean PM2.5 of 45 µg/m³; neutral weather leaves it alone.
    let Availability::Available { aqi, category, .. } = report.status else {
        panic!("expected an AQI: {:?}", report.status);
    };
    assert_eq!(aqi, 124.0);
    assert_eq!(category, Category::UnhealthySensitive);
    assert_eq!(report.aqi().unwrap(), 124.0);

    let estimate = report.estimate.as_ref().unwrap();
    assert_eq!(estimate.station_count(), 2);
    assert_eq!(estimate.dominant_pollutant, Pollutant::Pm25);

    let validation = report.assessment.cross_validation.unwrap();
    assert_eq!(validation.agreement, Agreement::Good);

    let weather = report.weather.as_ref().unwrap();
    assert_eq!(weather.impact.aqi_modifier, 1.0);

    assert_eq!(report.forecast.len(), 24);
    assert!(report.summary.is_some());
    assert!(report.unavailable.is_empty());
    // Twelve hours of weather forecast, then the fallback.
    for p in &report.forecast {
        assert!(p.data_sources.contains(&DataSource::GroundStations));
        assert!(!p.data_sources.contains(&DataSource::Satellite));
        assert_eq!(
            p.data_sources.contains(&DataSource::WeatherForecast),
            p.hour_ahead <= 12,
            "hour {}",
            p.hour_ahead
        );
    }
    for pair in report.alerts.windows(2) {
        assert!(pair[0].urgency >= pair[1].urgency);
    }
}

#[test]
fn nothing_available_means_no_numbers() {
    let mut assessor = Assessor::new(
        Box::new(NullSource {}),
        Box::new(NullSource {}),
        Box::new(NullSource {}),
    );
    let report = assessor.assess(&now());
    assert_eq!(report.status, Availability::Unavailable);
    assert!(report.aqi().is_err());
    assert!(report.estimate.is_none());
    assert!(report.forecast.is_empty());
    assert!(report.summary.is_none());
    assert!(report.alerts.is_empty());
    assert_eq!(report.unavailable.len(), 3);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["status"]["status"], "unavailable");
}

#[test]
fn satellite_alone_is_low_confidence() {
    let mut assessor = Assessor::new(
        Box::new(NullSource {}),
        Box::new(NullSource {}),
        Box::new(FakeSatelliteSource {
            estimate: SatelliteEstimate {
                aqi: 80.0,
                quality: DataQuality::Poor,
            },
        }),
    );
    let report = assessor.assess(&now());
    assert!(report.estimate.is_none());
    assert_eq!(report.assessment.final_aqi, Some(80.0));
    assert_eq!(report.assessment.confidence, aqi::ConfidenceLevel::Low);
    // Without weather, the forecast runs on its fallback.
    assert_eq!(report.forecast.len(), 24);
    for p in &report.forecast {
        assert_eq!(
            p.data_sources,
            BTreeSet::from([DataSource::TemporalAnalysis, DataSource::Satellite])
        );
    }
}

#[test]
fn bad_readings_are_dropped() {
    let mut assessor = Assessor::new(
        Box::new(FakeGroundSource {
            readings: vec![pm25(-5.0, "broken"), pm25(f64::NAN, "broken"), pm25(9.0, "ok")],
        }),
        Box::new(NullSource {}),
        Box::new(NullSource {}),
    );
    let report = assessor.assess(&now());
    let estimate = report.estimate.unwrap();
    assert_eq!(estimate.composite_aqi, 50);
    assert_eq!(estimate.sources, vec!["ok".to_string()]);
}

#[test]
fn all_bad_readings_say_why() {
    let mut assessor = Assessor::new(
        Box::new(FakeGroundSource {
            readings: vec![pm25(-5.0, "broken"), pm25(f64::INFINITY, "broken")],
        }),
        Box::new(NullSource {}),
        Box::new(NullSource {}),
    );
    let report = assessor.assess(&now());
    assert!(report.estimate.is_none());
    assert_eq!(report.status, Availability::Unavailable);
    assert!(report
        .unavailable
        .iter()
        .any(|reason| reason.contains("all 2 ground reading(s) were invalid")));
}

#[test]
fn sensitive_profile_gets_alerts() {
    let profile = HealthProfile::new([HealthCondition::Asthma]).unwrap();
    let mut assessor = all_sources(120.0)
        .with_profile(profile)
        .with_forecast(ForecastConfig {
            hours_ahead: 12,
            model: ForecastModel::WeatherIntegrated,
        });
    let report = assessor.assess(&now());
    assert_eq!(report.forecast.len(), 12);
    // 124 x 2.0 for asthma and PM2.5 is very high risk now, and stays high.
    assert!(!report.alerts.is_empty());
    assert!(report.alerts.iter().all(|a| a.risk >= aqi::RiskLevel::High));
}

#[test]
fn sample_config_runs() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/airwatch.toml");
    let config = Config::from_file(&path).unwrap();
    config.validate().unwrap();
    let mut assessor = Assessor::from_config(&config).unwrap();
    let report = assessor.assess(&now());
    assert!(matches!(report.status, Availability::Available { .. }));
    assert!(report.assessment.cross_validation.is_some());
    assert_eq!(report.forecast.len(), 24);
}

#[test]
fn run_stops_on_shutdown() {
    let config = Config {
        period_secs: 3600,
        ..Config::default()
    };
    let mut assessor = all_sources(110.0);

    let shutdown = Shutdown::new();
    shutdown.request();
    assert_eq!(airwatch::run(&shutdown, &mut assessor, &config, false), 0);

    let shutdown = Shutdown::new();
    let waker = {
        let shutdown = shutdown.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            shutdown.request();
        })
    };
    assert_eq!(airwatch::run(&shutdown, &mut assessor, &config, false), 1);
    waker.join().unwrap();
}
