//! Personal health risk from an AQI value.

use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

use crate::{Error, Pollutant};

/// A health condition that changes how air pollution affects someone.
///
/// Variants are declared from most to least sensitive, so the first
/// condition in a sorted set is the one that drives classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthCondition {
    Copd,
    Asthma,
    HeartDisease,
    Pregnancy,
    Elderly,
    Children,
    Diabetes,
    Healthy,
}

impl HealthCondition {
    pub const ALL: [HealthCondition; 8] = [
        HealthCondition::Copd,
        HealthCondition::Asthma,
        HealthCondition::HeartDisease,
        HealthCondition::Pregnancy,
        HealthCondition::Elderly,
        HealthCondition::Children,
        HealthCondition::Diabetes,
        HealthCondition::Healthy,
    ];

    /// How the condition reads in a sentence: "Individuals with {label}".
    pub fn label(&self) -> &'static str {
        match self {
            HealthCondition::Copd => "COPD",
            HealthCondition::Asthma => "asthma",
            HealthCondition::HeartDisease => "heart disease",
            HealthCondition::Pregnancy => "pregnancy",
            HealthCondition::Elderly => "elderly individuals",
            HealthCondition::Children => "children",
            HealthCondition::Diabetes => "diabetes",
            HealthCondition::Healthy => "healthy",
        }
    }

    /// Respiratory and cardiac conditions, which raise alert urgency the most.
    pub fn is_high_priority(&self) -> bool {
        matches!(
            self,
            HealthCondition::Asthma | HealthCondition::Copd | HealthCondition::HeartDisease
        )
    }
}

impl fmt::Display for HealthCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityLevel {
    Low,
    #[default]
    Normal,
    High,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    #[default]
    Sedentary,
    Moderate,
    Active,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExposureLevel {
    #[default]
    Minimal,
    Moderate,
    High,
}

/// Who the AQI is being interpreted for.
///
/// Always has at least one condition; use [`HealthCondition::Healthy`] for none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ProfileFields")]
pub struct HealthProfile {
    conditions: BTreeSet<HealthCondition>,
    pub sensitivity: SensitivityLevel,
    pub activity: ActivityLevel,
    pub exposure: ExposureLevel,
}

#[derive(Deserialize)]
struct ProfileFields {
    conditions: BTreeSet<HealthCondition>,
    #[serde(default)]
    sensitivity: SensitivityLevel,
    #[serde(default)]
    activity: ActivityLevel,
    #[serde(default)]
    exposure: ExposureLevel,
}

impl TryFrom<ProfileFields> for HealthProfile {
    type Error = Error;

    fn try_from(fields: ProfileFields) -> Result<Self, Self::Error> {
        let mut profile = HealthProfile::new(fields.conditions)?;
        profile.sensitivity = fields.sensitivity;
        profile.activity = fields.activity;
        profile.exposure = fields.exposure;
        Ok(profile)
    }
}

impl HealthProfile {
    /// A profile with the given conditions and default levels.
    pub fn new(conditions: impl IntoIterator<Item = HealthCondition>) -> Result<Self, Error> {
        let conditions: BTreeSet<_> = conditions.into_iter().collect();
        if conditions.is_empty() {
            return Err(Error::InvalidInput(
                "health profile needs at least one condition".to_string(),
            ));
        }
        Ok(HealthProfile {
            conditions,
            sensitivity: SensitivityLevel::default(),
            activity: ActivityLevel::default(),
            exposure: ExposureLevel::default(),
        })
    }

    pub fn conditions(&self) -> &BTreeSet<HealthCondition> {
        &self.conditions
    }

    /// The most sensitive condition in the profile.
    pub fn primary_condition(&self) -> HealthCondition {
        self.conditions
            .first()
            .copied()
            .unwrap_or(HealthCondition::Healthy)
    }
}

impl Default for HealthProfile {
    fn default() -> Self {
        HealthProfile {
            conditions: BTreeSet::from([HealthCondition::Healthy]),
            sensitivity: SensitivityLevel::default(),
            activity: ActivityLevel::default(),
            exposure: ExposureLevel::default(),
        }
    }
}

/// How strongly a pollutant affects someone with a condition,
/// relative to a healthy adult. `None` where the pollutant is not a
/// recognized concern for that condition.
pub fn sensitivity(condition: HealthCondition, pollutant: Pollutant) -> Option<f64> {
    use HealthCondition as H;
    use Pollutant as P;
    let multiplier = match (condition, pollutant) {
        (H::Asthma, P::Pm25) => 2.0,
        (H::Asthma, P::O3) => 2.5,
        (H::Asthma, P::No2) => 2.0,
        (H::Asthma, P::So2) => 1.8,

        (H::Copd, P::Pm25) => 2.5,
        (H::Copd, P::Pm10) => 2.0,
        (H::Copd, P::O3) => 2.2,
        (H::Copd, P::No2) => 2.0,

        (H::HeartDisease, P::Pm25) => 2.0,
        (H::HeartDisease, P::Pm10) => 1.8,
        (H::HeartDisease, P::Co) => 2.5,
        (H::HeartDisease, P::No2) => 1.5,

        (H::Diabetes, P::Pm25) => 1.5,
        (H::Diabetes, P::O3) => 1.8,
        (H::Diabetes, P::No2) => 1.5,

        (H::Pregnancy, P::Pm25) => 1.8,
        (H::Pregnancy, P::Pm10) => 1.5,
        (H::Pregnancy, P::Co) => 2.0,
        (H::Pregnancy, P::O3) => 1.6,

        (H::Elderly, P::Pm25) => 1.8,
        (H::Elderly, P::Pm10) => 1.5,
        (H::Elderly, P::O3) => 1.8,
        (H::Elderly, P::No2) => 1.5,

        (H::Children, P::Pm25) => 1.6,
        (H::Children, P::O3) => 2.0,
        (H::Children, P::No2) => 1.8,
        (H::Children, P::So2) => 1.5,

        (H::Healthy, _) => 1.0,
        _ => return None,
    };
    Some(multiplier)
}

/// Adjusted-AQI cutoffs for one condition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskThresholds {
    pub low: f64,
    pub moderate: f64,
    pub high: f64,
    pub very_high: f64,
}

const fn rt(low: f64, moderate: f64, high: f64, very_high: f64) -> RiskThresholds {
    RiskThresholds {
        low,
        moderate,
        high,
        very_high,
    }
}

pub fn thresholds(condition: HealthCondition) -> RiskThresholds {
    match condition {
        HealthCondition::Copd => rt(25.0, 45.0, 90.0, 130.0),
        HealthCondition::Asthma => rt(30.0, 50.0, 100.0, 150.0),
        HealthCondition::HeartDisease => rt(35.0, 55.0, 110.0, 160.0),
        HealthCondition::Pregnancy => rt(35.0, 55.0, 110.0, 160.0),
        HealthCondition::Elderly => rt(40.0, 60.0, 120.0, 170.0),
        HealthCondition::Children => rt(35.0, 55.0, 110.0, 160.0),
        HealthCondition::Diabetes => rt(40.0, 60.0, 120.0, 170.0),
        HealthCondition::Healthy => rt(50.0, 100.0, 150.0, 200.0),
    }
}

/// Adjusted AQI at which risk is extreme for everyone.
pub const EXTREME_AQI: f64 = 300.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
    Extreme,
}

impl RiskLevel {
    pub fn title(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
            RiskLevel::VeryHigh => "Very High",
            RiskLevel::Extreme => "Extreme",
        }
    }

    /// High, very high or extreme.
    pub fn is_alerting(&self) -> bool {
        *self >= RiskLevel::High
    }

    fn base_urgency(&self) -> f64 {
        match self {
            RiskLevel::Low => 1.0,
            RiskLevel::Moderate => 3.0,
            RiskLevel::High => 6.0,
            RiskLevel::VeryHigh => 8.0,
            RiskLevel::Extreme => 10.0,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
            RiskLevel::VeryHigh => "very high",
            RiskLevel::Extreme => "extreme",
        })
    }
}

/// Result of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub risk: RiskLevel,
    pub adjusted_aqi: f64,
    /// The condition whose tables were used.
    pub condition: HealthCondition,
    pub adjustment_factor: f64,
}

/// Classify an AQI for a person.
///
/// `pollutants` are the pollutants present in the air; the strongest
/// sensitivity the profile's primary condition has to any of them scales the
/// AQI, as do the profile's sensitivity, activity and exposure levels.
pub fn classify(aqi: f64, profile: &HealthProfile, pollutants: &[Pollutant]) -> RiskAssessment {
    let condition = profile.primary_condition();

    let mut factor = pollutants
        .iter()
        .filter_map(|&p| sensitivity(condition, p))
        .reduce(f64::max)
        .unwrap_or(1.0);
    factor *= match profile.sensitivity {
        SensitivityLevel::High => 1.2,
        SensitivityLevel::Low => 0.9,
        SensitivityLevel::Normal => 1.0,
    };
    if profile.activity == ActivityLevel::Active {
        factor *= 1.15;
    }
    if profile.exposure == ExposureLevel::High {
        factor *= 1.1;
    }

    let adjusted_aqi = aqi * factor;
    let t = thresholds(condition);
    let risk = if adjusted_aqi >= EXTREME_AQI {
        RiskLevel::Extreme
    } else if adjusted_aqi >= t.very_high {
        RiskLevel::VeryHigh
    } else if adjusted_aqi >= t.high {
        RiskLevel::High
    } else if adjusted_aqi >= t.moderate {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    };
    tracing::trace!("AQI {aqi:.0} x {factor:.2} for {condition}: {risk}");

    RiskAssessment {
        risk,
        adjusted_aqi,
        condition,
        adjustment_factor: factor,
    }
}

/// Conditions in the profile for which `aqi` reaches the moderate threshold.
pub fn at_risk_conditions(aqi: f64, profile: &HealthProfile) -> Vec<HealthCondition> {
    profile
        .conditions()
        .iter()
        .copied()
        .filter(|&c| aqi >= thresholds(c).moderate)
        .collect()
}

/// Alert priority from 0 to 10.
pub fn urgency_score(risk: RiskLevel, at_risk: &[HealthCondition]) -> f64 {
    let score = at_risk.iter().fold(risk.base_urgency(), |score, c| {
        if c.is_high_priority() {
            score * 1.3
        } else {
            score * 1.1
        }
    });
    score.min(10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(conditions: &[HealthCondition]) -> HealthProfile {
        HealthProfile::new(conditions.iter().copied()).unwrap()
    }

    #[test]
    fn healthy_low_aqi_is_low_risk() {
        let r = classify(40.0, &HealthProfile::default(), &[Pollutant::Pm25]);
        assert_eq!(r.risk, RiskLevel::Low);
        assert_eq!(r.adjusted_aqi, 40.0);
        assert_eq!(r.condition, HealthCondition::Healthy);
    }

    #[test]
    fn asthma_is_sensitive_to_ozone() {
        let r = classify(60.0, &profile(&[HealthCondition::Asthma]), &[Pollutant::O3]);
        assert_eq!(r.adjustment_factor, 2.5);
        assert_eq!(r.adjusted_aqi, 150.0);
        assert!(r.risk >= RiskLevel::Moderate);
        assert_eq!(r.risk, RiskLevel::VeryHigh);
    }

    #[test]
    fn strongest_sensitivity_wins() {
        let r = classify(
            20.0,
            &profile(&[HealthCondition::HeartDisease]),
            &[Pollutant::No2, Pollutant::Co, Pollutant::O3],
        );
        // CO 2.5 beats NO2 1.5; O3 is not a listed concern.
        assert_eq!(r.adjustment_factor, 2.5);

        let r = classify(20.0, &profile(&[HealthCondition::Diabetes]), &[Pollutant::So2]);
        assert_eq!(r.adjustment_factor, 1.0);
    }

    #[test]
    fn lifestyle_multipliers_compound() {
        let mut p = profile(&[HealthCondition::Asthma]);
        p.sensitivity = SensitivityLevel::High;
        p.activity = ActivityLevel::Active;
        p.exposure = ExposureLevel::High;
        let r = classify(40.0, &p, &[Pollutant::O3]);
        assert!((r.adjustment_factor - 2.5 * 1.2 * 1.15 * 1.1).abs() < 1e-9);
        assert!((r.adjusted_aqi - 151.8).abs() < 1e-9);

        p.sensitivity = SensitivityLevel::Low;
        p.activity = ActivityLevel::Moderate;
        p.exposure = ExposureLevel::Moderate;
        let r = classify(40.0, &p, &[Pollutant::O3]);
        assert!((r.adjustment_factor - 2.25).abs() < 1e-9);
    }

    #[test]
    fn extreme_for_everyone_past_300() {
        let r = classify(320.0, &HealthProfile::default(), &[]);
        assert_eq!(r.risk, RiskLevel::Extreme);
        let r = classify(299.0, &HealthProfile::default(), &[]);
        assert_eq!(r.risk, RiskLevel::VeryHigh);
    }

    #[test]
    fn most_sensitive_condition_drives() {
        let p = profile(&[HealthCondition::Healthy, HealthCondition::Asthma, HealthCondition::Copd]);
        assert_eq!(p.primary_condition(), HealthCondition::Copd);
        let p = profile(&[HealthCondition::Diabetes, HealthCondition::Children]);
        assert_eq!(p.primary_condition(), HealthCondition::Children);
    }

    #[test]
    fn empty_profile_is_rejected() {
        assert!(HealthProfile::new([]).is_err());
        let json = r#"{"conditions": [], "sensitivity": "high"}"#;
        assert!(serde_json::from_str::<HealthProfile>(json).is_err());

        let json = r#"{"conditions": ["asthma", "elderly"], "activity": "active"}"#;
        let p: HealthProfile = serde_json::from_str(json).unwrap();
        assert_eq!(p.primary_condition(), HealthCondition::Asthma);
        assert_eq!(p.activity, ActivityLevel::Active);
        assert_eq!(p.sensitivity, SensitivityLevel::Normal);
    }

    #[test]
    fn at_risk_uses_each_conditions_threshold() {
        let p = profile(&[HealthCondition::Asthma, HealthCondition::Healthy]);
        assert!(at_risk_conditions(49.0, &p).is_empty());
        assert_eq!(at_risk_conditions(50.0, &p), vec![HealthCondition::Asthma]);
        assert_eq!(
            at_risk_conditions(100.0, &p),
            vec![HealthCondition::Asthma, HealthCondition::Healthy]
        );
    }

    #[test]
    fn urgency() {
        assert!((urgency_score(RiskLevel::High, &[HealthCondition::Asthma]) - 7.8).abs() < 1e-9);
        assert!((urgency_score(RiskLevel::Low, &[HealthCondition::Diabetes]) - 1.1).abs() < 1e-9);
        assert_eq!(urgency_score(RiskLevel::Moderate, &[]), 3.0);
        assert_eq!(
            urgency_score(RiskLevel::VeryHigh, &[HealthCondition::Asthma, HealthCondition::Copd]),
            10.0
        );
    }

    #[test]
    fn every_condition_has_thresholds_in_order() {
        for c in HealthCondition::ALL {
            let t = thresholds(c);
            assert!(t.low < t.moderate && t.moderate < t.high && t.high < t.very_high);
            assert!(t.very_high < EXTREME_AQI);
        }
    }
}
