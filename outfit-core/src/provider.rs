use crate::{
    Config,
    clock::CivilOffset,
    model::{Coordinate, Forecast, ForecastStep},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt::Debug};

pub mod openweather;
pub mod payload;

pub use payload::RawForecast;

/// External services that need credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    Gemini,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::Gemini => "gemini",
        }
    }

    /// Environment variable that overrides the configured key.
    pub fn env_var(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "OPENWEATHER_API_KEY",
            ProviderId::Gemini => "GOOGLE_API_KEY",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::Gemini]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "gemini" => Ok(ProviderId::Gemini),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, gemini."
            )),
        }
    }
}

/// Which forecast endpoint to call, and therefore which payload shape comes back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ForecastSchema {
    /// Hourly steps with feels-like, probability of precipitation and a daily icon.
    #[default]
    Hourly,
    /// 3-hourly steps with the city name embedded in the payload.
    ThreeHourly,
}

#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn fetch_forecast(&self, coord: Coordinate) -> anyhow::Result<Forecast>;
}

/// Adapter from one provider payload shape to the uniform [`Forecast`].
pub trait NormalizeForecast {
    fn normalize(self, offset: CivilOffset) -> Forecast;
}

/// Sorts by local timestamp and drops repeated timestamps, keeping the first.
pub(crate) fn order_steps(mut steps: Vec<ForecastStep>) -> Vec<ForecastStep> {
    steps.sort_by_key(|s| s.timestamp);
    steps.dedup_by_key(|s| s.timestamp);
    steps
}

/// Construct the forecast provider described by `config`.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn ForecastProvider>> {
    let api_key = config.require_api_key(ProviderId::OpenWeather)?;

    Ok(Box::new(OpenWeatherProvider::new(
        api_key.to_owned(),
        config.forecast_schema,
        config.language.clone(),
        CivilOffset::hours(config.utc_offset_hours),
        config.forecast_timeout(),
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let parsed = ProviderId::try_from(id.as_str()).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("weatherapi").unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("No API key configured for 'openweather'"));
    }

    #[test]
    fn provider_from_config_works_when_configured() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "KEY".to_string());

        assert!(provider_from_config(&cfg).is_ok());
    }

    #[test]
    fn schema_names_are_kebab_case() {
        let parsed: ForecastSchema =
            serde_json::from_str("\"three-hourly\"").expect("known schema");
        assert_eq!(parsed, ForecastSchema::ThreeHourly);
    }
}
