//! Raw OpenWeather payloads and their normalization into [`Forecast`].
//!
//! Two shapes are accepted: the One Call "hourly" payload and the 5-day
//! "3-hourly" payload. Each implements [`NormalizeForecast`]; optional
//! fields that a shape leaves out stay `None` (or `0.0` for rain depth)
//! rather than failing the decode.

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

use super::{NormalizeForecast, order_steps};
use crate::{
    clock::CivilOffset,
    model::{Forecast, ForecastStep},
};

pub const ICON_URL_BASE: &str = "https://openweathermap.org/img/wn";

pub fn icon_url(icon_id: &str) -> String {
    format!("{ICON_URL_BASE}/{icon_id}@2x.png")
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawForecast {
    Hourly(HourlyPayload),
    ThreeHourly(ThreeHourlyPayload),
}

impl RawForecast {
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body)
            .context("Forecast JSON matched neither the hourly nor the 3-hourly shape")
    }
}

impl NormalizeForecast for RawForecast {
    fn normalize(self, offset: CivilOffset) -> Forecast {
        match self {
            RawForecast::Hourly(p) => p.normalize(offset),
            RawForecast::ThreeHourly(p) => p.normalize(offset),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct OwCondition {
    #[serde(default)]
    main: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Default, Deserialize)]
struct OwRain {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
    #[serde(rename = "3h")]
    three_hours: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwHourlyEntry {
    dt: i64,
    temp: f64,
    feels_like: Option<f64>,
    pop: Option<f64>,
    rain: Option<OwRain>,
    #[serde(default)]
    weather: Vec<OwCondition>,
}

#[derive(Debug, Deserialize)]
struct OwDailyEntry {
    #[serde(default)]
    weather: Vec<OwCondition>,
}

#[derive(Debug, Deserialize)]
pub struct HourlyPayload {
    hourly: Vec<OwHourlyEntry>,
    #[serde(default)]
    daily: Vec<OwDailyEntry>,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwThreeHourlyEntry {
    dt: i64,
    main: OwMain,
    pop: Option<f64>,
    rain: Option<OwRain>,
    #[serde(default)]
    weather: Vec<OwCondition>,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    name: String,
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
pub struct ThreeHourlyPayload {
    list: Vec<OwThreeHourlyEntry>,
    city: Option<OwCity>,
}

struct StepFields<'a> {
    dt: i64,
    condition: Option<&'a OwCondition>,
    temperature_c: f64,
    feels_like_c: Option<f64>,
    pop: Option<f64>,
    precipitation_mm: f64,
}

fn build_step(offset: CivilOffset, fields: StepFields<'_>) -> Option<ForecastStep> {
    let Some(timestamp) = offset.from_epoch(fields.dt) else {
        warn!("Skipping forecast step with out-of-range timestamp {}", fields.dt);
        return None;
    };

    let fallback = OwCondition::default();
    let condition = fields.condition.unwrap_or(&fallback);

    Some(ForecastStep {
        timestamp,
        condition_code: condition.main.clone(),
        description: condition.description.clone(),
        temperature_c: fields.temperature_c,
        feels_like_c: fields.feels_like_c,
        precipitation_probability: fields.pop.map(|p| p.clamp(0.0, 1.0)),
        precipitation_mm: fields.precipitation_mm,
        icon_id: condition.icon.clone(),
    })
}

impl NormalizeForecast for HourlyPayload {
    fn normalize(self, offset: CivilOffset) -> Forecast {
        let steps = self
            .hourly
            .iter()
            .filter_map(|entry| {
                build_step(
                    offset,
                    StepFields {
                        dt: entry.dt,
                        condition: entry.weather.first(),
                        temperature_c: entry.temp,
                        feels_like_c: entry.feels_like,
                        pop: entry.pop,
                        precipitation_mm: entry
                            .rain
                            .as_ref()
                            .and_then(|r| r.one_hour)
                            .unwrap_or(0.0),
                    },
                )
            })
            .collect();

        let daily_icon_url = self
            .daily
            .first()
            .and_then(|d| d.weather.first())
            .filter(|w| !w.icon.is_empty())
            .map(|w| icon_url(&w.icon));

        Forecast {
            steps: order_steps(steps),
            daily_icon_url,
            location_label: None,
        }
    }
}

impl NormalizeForecast for ThreeHourlyPayload {
    fn normalize(self, offset: CivilOffset) -> Forecast {
        let steps = self
            .list
            .iter()
            .filter_map(|entry| {
                build_step(
                    offset,
                    StepFields {
                        dt: entry.dt,
                        condition: entry.weather.first(),
                        temperature_c: entry.main.temp,
                        feels_like_c: entry.main.feels_like,
                        pop: entry.pop,
                        precipitation_mm: entry
                            .rain
                            .as_ref()
                            .and_then(|r| r.three_hours)
                            .unwrap_or(0.0),
                    },
                )
            })
            .collect();

        let location_label = self.city.map(|c| {
            if c.country.is_empty() {
                c.name
            } else {
                format!("{}, {}", c.name, c.country)
            }
        });

        Forecast {
            steps: order_steps(steps),
            daily_icon_url: None,
            location_label,
        }
    }
}
