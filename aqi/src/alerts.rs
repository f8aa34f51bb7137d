//! Personalized health alerts from current conditions and a forecast.
//!
//! Three independent checks run over the same inputs:
//! current conditions (immediate), the next 24 hours (forecast),
//! and the next 6 hours at emergency levels (emergency).

use std::collections::BTreeSet;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    health::{at_risk_conditions, urgency_score, ActivityLevel, ExposureLevel, EXTREME_AQI},
    classify, ForecastPoint, HealthCondition, HealthProfile, Pollutant, RiskLevel, SubIndices,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Immediate,
    Hourly,
    Daily,
    Forecast,
    Emergency,
}

impl AlertType {
    fn prefix(&self) -> &'static str {
        match self {
            AlertType::Immediate => "immediate",
            AlertType::Hourly => "hourly",
            AlertType::Daily => "daily",
            AlertType::Forecast => "forecast",
            AlertType::Emergency => "emergency",
        }
    }

    /// How long an alert of this type stays relevant.
    pub fn validity(&self) -> TimeDelta {
        match self {
            AlertType::Immediate | AlertType::Hourly => TimeDelta::hours(1),
            AlertType::Daily | AlertType::Forecast => TimeDelta::hours(24),
            AlertType::Emergency => TimeDelta::hours(EMERGENCY_WINDOW_HOURS.into()),
        }
    }
}

/// Hours of forecast checked for a forecast alert.
pub const FORECAST_WINDOW_HOURS: u32 = 24;
/// Hours of forecast checked for an emergency alert.
pub const EMERGENCY_WINDOW_HOURS: u32 = 6;

const FORECAST_URGENCY_SCALE: f64 = 0.8;
const EMERGENCY_URGENCY: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthAlert {
    pub id: String,
    pub alert_type: AlertType,
    pub risk: RiskLevel,
    pub title: String,
    pub message: String,
    pub recommendations: Vec<String>,
    pub affected_pollutants: BTreeSet<Pollutant>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// 0 to 10; higher sorts first.
    pub urgency: f64,
    /// Conditions in the profile this alert is about.
    pub conditions: Vec<HealthCondition>,
}

impl HealthAlert {
    fn new(alert_type: AlertType, id: String, risk: RiskLevel, now: DateTime<Utc>) -> Self {
        HealthAlert {
            id,
            alert_type,
            risk,
            title: String::new(),
            message: String::new(),
            recommendations: Vec::new(),
            affected_pollutants: BTreeSet::new(),
            created_at: now,
            expires_at: now + alert_type.validity(),
            urgency: 0.0,
            conditions: Vec::new(),
        }
    }
}

/// The air right now: the AQI to classify and the sub-indices behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub aqi: f64,
    pub sub_indices: SubIndices,
}

impl CurrentConditions {
    /// Pollutants whose own sub-index is unhealthy.
    fn problem_pollutants(&self) -> BTreeSet<Pollutant> {
        self.sub_indices
            .iter()
            .filter(|&(_, &aqi)| aqi > 100)
            .map(|(&p, _)| p)
            .collect()
    }
}

fn alert_id(alert_type: AlertType, now: DateTime<Utc>) -> String {
    format!("{}_{}", alert_type.prefix(), now.format("%Y%m%d_%H%M%S"))
}

fn conditions_text(conditions: &[HealthCondition]) -> String {
    conditions
        .iter()
        .map(HealthCondition::label)
        .collect::<Vec<_>>()
        .join(", ")
}

fn strings(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|s| s.to_string()).collect()
}

/// Advice for a risk level, plus advice for each at-risk condition.
pub fn health_recommendations(risk: RiskLevel, at_risk: &[HealthCondition]) -> Vec<String> {
    let general: &[&str] = match risk {
        RiskLevel::Extreme => &[
            "Stay indoors and keep windows closed",
            "Use air purifiers if available",
            "Avoid all outdoor activities",
            "Seek medical attention if experiencing symptoms",
        ],
        RiskLevel::VeryHigh => &[
            "Limit outdoor activities to essential only",
            "Wear N95 or P100 mask when outdoors",
            "Keep windows closed and use air conditioning",
        ],
        RiskLevel::High => &[
            "Reduce outdoor exercise and activities",
            "Consider wearing a mask outdoors",
            "Take frequent breaks if must be outside",
        ],
        RiskLevel::Moderate | RiskLevel::Low => &[],
    };
    let mut out = strings(general);
    for condition in at_risk {
        let specific: &[&str] = match condition {
            HealthCondition::Asthma => &[
                "Keep rescue inhaler readily available",
                "Monitor for asthma symptoms closely",
                "Consider pre-medicating before outdoor exposure",
            ],
            HealthCondition::Copd => &[
                "Use supplemental oxygen as prescribed",
                "Monitor breathing difficulty",
                "Stay hydrated and rest frequently",
            ],
            HealthCondition::HeartDisease => &[
                "Monitor for chest pain or discomfort",
                "Avoid strenuous activities",
                "Take medications as prescribed",
            ],
            HealthCondition::Pregnancy => &[
                "Minimize outdoor exposure",
                "Monitor fetal movement",
                "Consult healthcare provider if concerned",
            ],
            HealthCondition::Elderly
            | HealthCondition::Children
            | HealthCondition::Diabetes
            | HealthCondition::Healthy => &[],
        };
        out.extend(strings(specific));
    }
    out
}

fn forecast_recommendations(earliest_hour: u32, profile: &HealthProfile) -> Vec<String> {
    let mut out = vec![
        format!("Plan indoor activities for the next {earliest_hour} hour(s)"),
        "Reschedule outdoor activities to avoid high-risk periods".to_string(),
        "Prepare medications and air purification devices".to_string(),
    ];
    if profile.activity == ActivityLevel::Active {
        out.push("Consider moving exercise to early morning or late evening".to_string());
    }
    if profile.exposure == ExposureLevel::High {
        out.push("Plan work/commute routes to minimize exposure time".to_string());
    }
    out
}

fn emergency_recommendations() -> Vec<String> {
    strings(&[
        "IMMEDIATE ACTION REQUIRED: Stay indoors immediately",
        "Seal windows and doors if possible",
        "Use highest-efficiency air filtration available",
        "Contact healthcare provider if experiencing any symptoms",
        "Monitor local emergency services for evacuation orders",
        "Keep emergency medications readily accessible",
        "Avoid all outdoor activities until conditions improve",
    ])
}

fn immediate_alert(
    current: &CurrentConditions,
    profile: &HealthProfile,
    now: DateTime<Utc>,
) -> Option<HealthAlert> {
    let present: Vec<Pollutant> = current.sub_indices.keys().copied().collect();
    let assessment = classify(current.aqi, profile, &present);
    if !assessment.risk.is_alerting() {
        return None;
    }
    let at_risk = at_risk_conditions(current.aqi, profile);
    let precautions = if at_risk.is_empty() {
        "Take extra precautions outdoors.".to_string()
    } else {
        format!(
            "Individuals with {} should take extra precautions.",
            conditions_text(&at_risk)
        )
    };

    let mut alert = HealthAlert::new(
        AlertType::Immediate,
        alert_id(AlertType::Immediate, now),
        assessment.risk,
        now,
    );
    alert.title = format!(
        "Current Air Quality Health Alert - {} Risk",
        assessment.risk.title()
    );
    alert.message = format!(
        "Current air quality poses {} health risk. AQI: {:.0} (adjusted to {:.0} for your health profile). {precautions}",
        assessment.risk, current.aqi, assessment.adjusted_aqi
    );
    alert.recommendations = health_recommendations(assessment.risk, &at_risk);
    alert.affected_pollutants = current.problem_pollutants();
    alert.urgency = urgency_score(assessment.risk, &at_risk);
    alert.conditions = at_risk;
    Some(alert)
}

fn forecast_alert(
    forecast: &[ForecastPoint],
    profile: &HealthProfile,
    now: DateTime<Utc>,
) -> Option<HealthAlert> {
    let risky: Vec<(&ForecastPoint, RiskLevel)> = forecast
        .iter()
        .filter(|p| p.hour_ahead <= FORECAST_WINDOW_HOURS)
        .filter_map(|p| {
            let pollutants: Vec<Pollutant> = p.primary_pollutants.iter().copied().collect();
            let risk = classify(p.predicted_aqi, profile, &pollutants).risk;
            risk.is_alerting().then_some((p, risk))
        })
        .collect();

    let max_risk = risky.iter().map(|(_, r)| *r).max()?;
    let earliest = risky.iter().map(|(p, _)| p.hour_ahead).min()?;
    let peak = risky
        .iter()
        .map(|(p, _)| p.predicted_aqi)
        .fold(f64::NEG_INFINITY, f64::max);
    let at_risk = at_risk_conditions(peak, profile);

    let mut alert = HealthAlert::new(
        AlertType::Forecast,
        alert_id(AlertType::Forecast, now),
        max_risk,
        now,
    );
    alert.title = format!(
        "Air Quality Forecast Alert - {} High Risk Hours Ahead",
        risky.len()
    );
    alert.message = format!(
        "Air quality deterioration predicted starting in {earliest} hour(s). Peak AQI expected: {peak:.0}."
    );
    if !at_risk.is_empty() {
        alert.message += &format!(" Plan accordingly if you have {}.", conditions_text(&at_risk));
    }
    alert.recommendations = forecast_recommendations(earliest, profile);
    alert.affected_pollutants = risky
        .iter()
        .flat_map(|(p, _)| p.attributed_pollutants())
        .collect();
    alert.urgency = urgency_score(max_risk, &at_risk) * FORECAST_URGENCY_SCALE;
    alert.conditions = at_risk;
    Some(alert)
}

fn emergency_alert(
    forecast: &[ForecastPoint],
    profile: &HealthProfile,
    now: DateTime<Utc>,
) -> Option<HealthAlert> {
    let p = forecast
        .iter()
        .filter(|p| p.hour_ahead <= EMERGENCY_WINDOW_HOURS)
        .find(|p| {
            let pollutants: Vec<Pollutant> = p.primary_pollutants.iter().copied().collect();
            let a = classify(p.predicted_aqi, profile, &pollutants);
            a.risk == RiskLevel::Extreme || a.adjusted_aqi > EXTREME_AQI
        })?;

    let mut alert = HealthAlert::new(
        AlertType::Emergency,
        format!("{}_{}", alert_id(AlertType::Emergency, now), p.hour_ahead),
        RiskLevel::Extreme,
        now,
    );
    alert.title = "EMERGENCY: Extreme Air Quality Alert".to_string();
    alert.message = format!(
        "EMERGENCY ALERT: Extremely hazardous air quality predicted in {} hour(s). Immediate protective action required for all health conditions.",
        p.hour_ahead
    );
    alert.recommendations = emergency_recommendations();
    alert.affected_pollutants = p.attributed_pollutants();
    alert.urgency = EMERGENCY_URGENCY;
    alert.conditions = profile.conditions().iter().copied().collect();
    Some(alert)
}

/// Alerts for a person, most urgent first.
///
/// `forecast` points are matched to the alert windows by `hour_ahead`,
/// not by position. With no current conditions only forecast-based
/// alerts are considered.
pub fn generate_alerts(
    current: Option<&CurrentConditions>,
    forecast: &[ForecastPoint],
    profile: &HealthProfile,
    now: DateTime<Utc>,
) -> Vec<HealthAlert> {
    let mut alerts: Vec<HealthAlert> = current
        .and_then(|c| immediate_alert(c, profile, now))
        .into_iter()
        .chain(forecast_alert(forecast, profile, now))
        .chain(emergency_alert(forecast, profile, now))
        .collect();
    alerts.sort_by(|a, b| b.urgency.total_cmp(&a.urgency));
    tracing::debug!(
        "{} alert(s) for profile with {} condition(s)",
        alerts.len(),
        profile.conditions().len()
    );
    alerts
}
