//! Print a forecast table from a baseline AQI.
//!
//! For checking the projection models by eye: one row per hour, then a summary.

use std::{collections::BTreeSet, path::PathBuf};

use airwatch::sources::{FixtureSources, Location, WeatherSource};
use aqi::{project, ForecastModel, ForecastPoint, ForecastSummary};
use chrono::Local;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "forecast")]
#[command(about = "Print an hourly AQI forecast table")]
struct Args {
    /// Current AQI to project from.
    #[arg(long, default_value = "75")]
    aqi: f64,

    /// Hours to project.
    #[arg(long, default_value = "24")]
    hours: u32,

    /// temporal_trend, weather_integrated, or ensemble.
    #[arg(long, default_value = "ensemble")]
    model: ForecastModel,

    /// JSON fixture supplying the hourly weather forecast.
    #[arg(long)]
    weather: Option<PathBuf>,
}

fn row(p: &ForecastPoint) -> String {
    let pollutants: Vec<String> = p.primary_pollutants.iter().map(|p| p.to_string()).collect();
    format!(
        "{:>4}  {}  {:>6.1}  {:<30}  {:>4.2}  {}",
        p.hour_ahead,
        p.timestamp.with_timezone(&Local).format("%a %H:%M"),
        p.predicted_aqi,
        p.category.label(),
        p.confidence,
        pollutants.join(",")
    )
}

fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let hourly = match &args.weather {
        Some(path) => {
            let mut sources = match FixtureSources::load(path) {
                Ok(s) => s,
                Err(e) => {
                    tracing::error!("{e}");
                    std::process::exit(2);
                }
            };
            match sources.hourly(&Location::default(), args.hours) {
                Ok(h) => Some(h),
                Err(e) => {
                    tracing::warn!("{e}; projecting without weather");
                    None
                }
            }
        }
        None => None,
    };

    // The baseline is typed in, not observed.
    let points = project(
        args.model,
        args.aqi,
        &BTreeSet::new(),
        args.hours,
        hourly.as_deref(),
        &Local::now(),
    );
    println!("hour  time       aqi     category                        conf  pollutants");
    for p in &points {
        println!("{}", row(p));
    }

    if let Some(s) = ForecastSummary::from_points(&points) {
        println!();
        println!("average {:.1}, confidence {:.2}", s.average_aqi, s.average_confidence);
        println!("peak {:.1} at +{}h ({})", s.peak.aqi, s.peak.hour_ahead, s.peak.category);
        println!(
            "low {:.1} at +{}h ({})",
            s.minimum.aqi, s.minimum.hour_ahead, s.minimum.category
        );
        println!(
            "{} unhealthy hour(s), {:.1}% good, trend {:?} ({:.1}%)",
            s.unhealthy_hours, s.percent_good, s.trend, s.trend_strength
        );
    }
}
