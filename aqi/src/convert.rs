//! Concentration to AQI sub-index conversion.
//!
//! Breakpoints follow the EPA's
//! [technical assistance document](https://document.airnow.gov/technical-assistance-document-for-the-reporting-of-daily-air-quailty.pdf)
//! (2024 revision, which lowered the PM2.5 "Good" ceiling to 9.0 µg/m³).
//! Results may be checked against the
//! [AirNow calculator](https://www.airnow.gov/aqi/aqi-calculator-concentration/).

use crate::Pollutant;

/// One row of a breakpoint table: a concentration band and the AQI band it maps onto.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub lo: f64,
    pub hi: f64,
    pub aqi_lo: u16,
    pub aqi_hi: u16,
}

const fn bp(lo: f64, hi: f64, aqi_lo: u16, aqi_hi: u16) -> Breakpoint {
    Breakpoint {
        lo,
        hi,
        aqi_lo,
        aqi_hi,
    }
}

/// Highest value on the AQI scale.
pub const AQI_CEILING: u16 = 500;

// µg/m³, 24-hour.
const PM25: [Breakpoint; 6] = [
    bp(0.0, 9.0, 0, 50),
    bp(9.1, 35.4, 51, 100),
    bp(35.5, 55.4, 101, 150),
    bp(55.5, 125.4, 151, 200),
    bp(125.5, 225.4, 201, 300),
    bp(225.5, 325.4, 301, 500),
];

// µg/m³, 24-hour.
const PM10: [Breakpoint; 6] = [
    bp(0.0, 54.0, 0, 50),
    bp(55.0, 154.0, 51, 100),
    bp(155.0, 254.0, 101, 150),
    bp(255.0, 354.0, 151, 200),
    bp(355.0, 424.0, 201, 300),
    bp(425.0, 604.0, 301, 500),
];

// ppm, 8-hour. The 8-hour table stops at 300;
// the hazardous row borrows the upper bound of the 1-hour table.
const O3: [Breakpoint; 6] = [
    bp(0.000, 0.054, 0, 50),
    bp(0.055, 0.070, 51, 100),
    bp(0.071, 0.085, 101, 150),
    bp(0.086, 0.105, 151, 200),
    bp(0.106, 0.200, 201, 300),
    bp(0.201, 0.604, 301, 500),
];

// ppb, 1-hour.
const NO2: [Breakpoint; 6] = [
    bp(0.0, 53.0, 0, 50),
    bp(54.0, 100.0, 51, 100),
    bp(101.0, 360.0, 101, 150),
    bp(361.0, 649.0, 151, 200),
    bp(650.0, 1249.0, 201, 300),
    bp(1250.0, 2049.0, 301, 500),
];

// ppb, 1-hour.
const SO2: [Breakpoint; 6] = [
    bp(0.0, 35.0, 0, 50),
    bp(36.0, 75.0, 51, 100),
    bp(76.0, 185.0, 101, 150),
    bp(186.0, 304.0, 151, 200),
    bp(305.0, 604.0, 201, 300),
    bp(605.0, 1004.0, 301, 500),
];

// ppm, 8-hour.
const CO: [Breakpoint; 6] = [
    bp(0.0, 4.4, 0, 50),
    bp(4.5, 9.4, 51, 100),
    bp(9.5, 12.4, 101, 150),
    bp(12.5, 15.4, 151, 200),
    bp(15.5, 30.4, 201, 300),
    bp(30.5, 50.4, 301, 500),
];

/// The breakpoint table for a pollutant, lowest band first.
pub fn breakpoints(pollutant: Pollutant) -> &'static [Breakpoint] {
    match pollutant {
        Pollutant::Pm25 => &PM25,
        Pollutant::Pm10 => &PM10,
        Pollutant::O3 => &O3,
        Pollutant::No2 => &NO2,
        Pollutant::So2 => &SO2,
        Pollutant::Co => &CO,
    }
}

/// Number of decimal places the EPA truncates each pollutant's concentration to.
///
/// Truncating first closes the gaps between adjacent bands (e.g. 9.0 / 9.1).
fn precision(pollutant: Pollutant) -> i32 {
    match pollutant {
        Pollutant::Pm25 | Pollutant::Co => 1,
        Pollutant::Pm10 | Pollutant::No2 | Pollutant::So2 => 0,
        Pollutant::O3 => 3,
    }
}

fn truncate(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    // The small bias keeps values like 55.4 (55.39999...) from truncating down a step.
    ((value * scale) + 1e-9).floor() / scale
}

/// Linear interpolation transcribed from the EPA documentation:
/// AQI = ((AQIhigh - AQIlow) / (Chigh - Clow)) * (C - Clow) + AQIlow
fn interpolate(band: &Breakpoint, c: f64) -> f64 {
    (band.aqi_hi - band.aqi_lo) as f64 / (band.hi - band.lo) * (c - band.lo) + band.aqi_lo as f64
}

/// Calculate the AQI sub-index for a concentration of the given pollutant.
///
/// The concentration must be in the pollutant's [standard unit](Pollutant::standard_unit)
/// and non-negative; validation is the caller's job.
/// Concentrations above the table clamp to 500.
///
/// ```
/// use aqi::{pollutant_to_aqi, Pollutant};
///
/// assert_eq!(pollutant_to_aqi(Pollutant::Pm25, 41.0), 115);
/// assert_eq!(pollutant_to_aqi(Pollutant::Pm25, 7.0), 39);
/// ```
pub fn pollutant_to_aqi(pollutant: Pollutant, concentration: f64) -> u16 {
    let table = breakpoints(pollutant);
    let c = truncate(concentration, precision(pollutant));

    if let Some(band) = table.iter().find(|b| c >= b.lo && c <= b.hi) {
        return interpolate(band, c).round() as u16;
    }
    match table.first() {
        // Extension of the lowest band; only reachable for negative input.
        Some(lowest) if c < lowest.lo => interpolate(lowest, c).round().max(0.0) as u16,
        _ => AQI_CEILING,
    }
}

/// Sub-index for a provider's pollutant identifier.
///
/// Unknown identifiers have no sub-index: `None`, not zero.
pub fn sub_index(identifier: &str, concentration: f64) -> Option<u16> {
    let pollutant: Pollutant = identifier.parse().ok()?;
    Some(pollutant_to_aqi(pollutant, concentration))
}
