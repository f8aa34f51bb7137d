//! The six EPA AQI categories and what they mean for people outdoors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// EPA AQI category, in increasing order of severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Good,
    Moderate,
    UnhealthySensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

/// Colors the EPA assigns to each AQI category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Green,
    Yellow,
    Orange,
    Red,
    Purple,
    Maroon,
}

/// Three-part health guidance for an AQI category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthAdvice {
    pub general: &'static str,
    pub sensitive: &'static str,
    pub activities: &'static str,
}

impl Category {
    /// Category for an AQI value. Fractional values round up into the next
    /// band only once they pass its lower bound (50.4 is Moderate).
    pub fn from_aqi(aqi: f64) -> Self {
        if aqi <= 50.0 {
            Category::Good
        } else if aqi <= 100.0 {
            Category::Moderate
        } else if aqi <= 150.0 {
            Category::UnhealthySensitive
        } else if aqi <= 200.0 {
            Category::Unhealthy
        } else if aqi <= 300.0 {
            Category::VeryUnhealthy
        } else {
            Category::Hazardous
        }
    }

    /// Display label as used by AirNow.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Good => "Good",
            Category::Moderate => "Moderate",
            Category::UnhealthySensitive => "Unhealthy for Sensitive Groups",
            Category::Unhealthy => "Unhealthy",
            Category::VeryUnhealthy => "Very Unhealthy",
            Category::Hazardous => "Hazardous",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Category::Good => Color::Green,
            Category::Moderate => Color::Yellow,
            Category::UnhealthySensitive => Color::Orange,
            Category::Unhealthy => Color::Red,
            Category::VeryUnhealthy => Color::Purple,
            Category::Hazardous => Color::Maroon,
        }
    }

    pub fn advice(&self) -> HealthAdvice {
        match self {
            Category::Good => HealthAdvice {
                general: "Air quality is good - ideal for outdoor activities",
                sensitive: "No restrictions for sensitive groups",
                activities: "All outdoor activities recommended",
            },
            Category::Moderate => HealthAdvice {
                general: "Air quality acceptable for most people",
                sensitive: "Unusually sensitive people may experience minor irritation",
                activities: "Normal outdoor activities",
            },
            Category::UnhealthySensitive => HealthAdvice {
                general: "Some people may experience health effects",
                sensitive: "Sensitive groups should limit prolonged outdoor exertion",
                activities: "Reduce prolonged outdoor activities for sensitive groups",
            },
            Category::Unhealthy => HealthAdvice {
                general: "Everyone may experience health effects",
                sensitive: "Sensitive groups should avoid outdoor exertion",
                activities: "Limit outdoor activities for everyone",
            },
            Category::VeryUnhealthy | Category::Hazardous => HealthAdvice {
                general: "Health alert - everyone may experience serious effects",
                sensitive: "Sensitive groups should remain indoors",
                activities: "Avoid all outdoor activities",
            },
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
