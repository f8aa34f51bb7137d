//! Air quality monitoring for one location.
//!
//! Pulls ground-station, weather and satellite observations from
//! [sources], runs them through the [`aqi`] core via the
//! [`Assessor`](service::Assessor), and reports the result on a fixed period
//! until asked to stop.

use std::time::Duration;

use chrono::Local;

pub mod config;
pub mod service;
pub mod shutdown;
pub mod sources;

use config::Config;
use service::{Assessor, Report};
use shutdown::Shutdown;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over `default_directive` when both are set.
pub fn init_logging(default_directive: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Print a report as a single line of JSON on stdout.
pub fn print_json(report: &Report) {
    match serde_json::to_string(report) {
        Ok(s) => println!("{s}"),
        Err(e) => tracing::error!("could not serialize report: {e}"),
    }
}

/// Assess repeatedly until shutdown is requested.
///
/// Returns the number of assessments made.
pub fn run(shutdown: &Shutdown, assessor: &mut Assessor, config: &Config, json: bool) -> usize {
    let period = Duration::from_secs(config.period_secs);
    let mut count = 0;
    while !shutdown.is_requested() {
        let t = Local::now();
        tracing::debug!("assessing at {}", t);
        let report = assessor.assess(&t);
        count += 1;
        if json {
            print_json(&report);
        }
        for alert in &report.alerts {
            tracing::info!("[{:?}] {}: {}", alert.alert_type, alert.title, alert.message);
        }
        if shutdown.sleep(period) {
            break;
        }
    }
    tracing::info!("stopped after {count} assessment(s)");
    count
}
