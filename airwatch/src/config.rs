//! Configuration: a TOML file, then environment overrides, then validation.
//!
//! ```toml
//! period_secs = 300
//! log_level = "info"
//!
//! [location]
//! latitude = 38.9
//! longitude = -77.0
//! radius_km = 25.0
//!
//! [forecast]
//! hours_ahead = 24
//! model = "ensemble"
//!
//! [profile]
//! conditions = ["asthma"]
//! activity = "active"
//!
//! [sources]
//! fixture = "fixtures/sample.json"
//! ```

use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use aqi::{ForecastModel, HealthProfile};
use serde::{Deserialize, Serialize};

use crate::sources::Location;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parsing {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("environment variable {name}: cannot parse {value:?}")]
    Env { name: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastConfig {
    /// Hours to project, 1 to 72.
    pub hours_ahead: u32,
    pub model: ForecastModel,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        ForecastConfig {
            hours_ahead: 24,
            model: ForecastModel::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourcesConfig {
    /// JSON file to serve all observations from.
    /// Without one, every source is unavailable.
    pub fixture: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Seconds between assessments.
    pub period_secs: u64,
    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    pub log_level: String,
    pub location: Location,
    pub forecast: ForecastConfig,
    pub profile: HealthProfile,
    pub sources: SourcesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            period_secs: 300,
            log_level: "info".to_string(),
            location: Location::default(),
            forecast: ForecastConfig::default(),
            profile: HealthProfile::default(),
            sources: SourcesConfig::default(),
        }
    }
}

pub const ENV_LATITUDE: &str = "AIRWATCH_LATITUDE";
pub const ENV_LONGITUDE: &str = "AIRWATCH_LONGITUDE";
pub const ENV_FORECAST_HOURS: &str = "AIRWATCH_FORECAST_HOURS";
pub const ENV_LOG: &str = "AIRWATCH_LOG";

fn parse_env<T: FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { name, value })
}

impl Config {
    /// Load from `path` (or defaults), apply environment overrides, and validate.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Config::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        // A relative fixture path is relative to the config file.
        if let (Some(fixture), Some(dir)) = (&config.sources.fixture, path.parent()) {
            if fixture.is_relative() {
                config.sources.fixture = Some(dir.join(fixture));
            }
        }
        Ok(config)
    }

    /// Override settings from environment variables, as looked up by `var`.
    pub fn apply_env(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(v) = var(ENV_LATITUDE) {
            self.location.latitude = parse_env(ENV_LATITUDE, v)?;
        }
        if let Some(v) = var(ENV_LONGITUDE) {
            self.location.longitude = parse_env(ENV_LONGITUDE, v)?;
        }
        if let Some(v) = var(ENV_FORECAST_HOURS) {
            self.forecast.hours_ahead = parse_env(ENV_FORECAST_HOURS, v)?;
        }
        if let Some(v) = var(ENV_LOG) {
            self.log_level = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let Location {
            latitude,
            longitude,
            radius_km,
        } = self.location;
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ConfigError::Invalid(format!(
                "latitude {latitude} is outside -90..=90"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ConfigError::Invalid(format!(
                "longitude {longitude} is outside -180..=180"
            )));
        }
        if !(1.0..=100.0).contains(&radius_km) {
            return Err(ConfigError::Invalid(format!(
                "radius {radius_km} km is outside 1..=100"
            )));
        }
        if !(1..=72).contains(&self.forecast.hours_ahead) {
            return Err(ConfigError::Invalid(format!(
                "forecast of {} hours is outside 1..=72",
                self.forecast.hours_ahead
            )));
        }
        if self.period_secs == 0 {
            return Err(ConfigError::Invalid("period must be at least 1 second".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqi::{ActivityLevel, HealthCondition};
    use std::{collections::HashMap, io::Write};

    #[test]
    fn defaults_are_valid() {
        let c = Config::default();
        c.validate().unwrap();
        assert_eq!(c.forecast.hours_ahead, 24);
        assert_eq!(c.forecast.model, ForecastModel::Ensemble);
        assert_eq!(c.period_secs, 300);
        assert_eq!(c.profile.primary_condition(), HealthCondition::Healthy);
    }

    #[test]
    fn loads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("airwatch.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(
            f,
            r#"
period_secs = 60

[location]
latitude = 34.05
longitude = -118.25

[forecast]
model = "weather_integrated"

[profile]
conditions = ["asthma", "elderly"]
activity = "active"

[sources]
fixture = "sample.json"
"#
        )
        .unwrap();
        drop(f);

        let c = Config::from_file(&path).unwrap();
        c.validate().unwrap();
        assert_eq!(c.period_secs, 60);
        assert_eq!(c.location.latitude, 34.05);
        assert_eq!(c.location.radius_km, 25.0);
        assert_eq!(c.forecast.hours_ahead, 24);
        assert_eq!(c.forecast.model, ForecastModel::WeatherIntegrated);
        assert_eq!(c.profile.primary_condition(), HealthCondition::Asthma);
        assert_eq!(c.profile.activity, ActivityLevel::Active);
        assert_eq!(c.sources.fixture, Some(dir.path().join("sample.json")));
    }

    #[test]
    fn file_errors() {
        let err = Config::from_file(Path::new("/nonexistent/airwatch.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));

        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "[profile]\nconditions = []\n").unwrap();
        let err = Config::from_file(f.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "colour = \"blue\"\n").unwrap();
        assert!(Config::from_file(f.path()).is_err());
    }

    #[test]
    fn environment_overrides() {
        let env = HashMap::from([
            (ENV_LATITUDE, "51.5"),
            (ENV_FORECAST_HOURS, " 48 "),
            (ENV_LOG, "airwatch=debug"),
        ]);
        let mut c = Config::default();
        c.apply_env(|name| env.get(name).map(|v| v.to_string())).unwrap();
        assert_eq!(c.location.latitude, 51.5);
        assert_eq!(c.location.longitude, -77.0);
        assert_eq!(c.forecast.hours_ahead, 48);
        assert_eq!(c.log_level, "airwatch=debug");

        let err = c
            .apply_env(|name| (name == ENV_LONGITUDE).then(|| "west".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { name: ENV_LONGITUDE, .. }));
    }

    #[test]
    fn validation() {
        let check = |f: fn(&mut Config)| {
            let mut c = Config::default();
            f(&mut c);
            c.validate()
        };
        assert!(check(|c| c.location.latitude = 91.0).is_err());
        assert!(check(|c| c.location.latitude = -90.0).is_ok());
        assert!(check(|c| c.location.longitude = 180.5).is_err());
        assert!(check(|c| c.location.radius_km = 0.5).is_err());
        assert!(check(|c| c.location.radius_km = 100.0).is_ok());
        assert!(check(|c| c.forecast.hours_ahead = 0).is_err());
        assert!(check(|c| c.forecast.hours_ahead = 73).is_err());
        assert!(check(|c| c.period_secs = 0).is_err());
    }
}
