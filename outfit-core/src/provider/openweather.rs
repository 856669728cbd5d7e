use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use super::{ForecastProvider, ForecastSchema, NormalizeForecast, RawForecast};
use crate::{
    clock::CivilOffset,
    model::{Coordinate, Forecast},
};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    http: Client,
    base_url: String,
    schema: ForecastSchema,
    language: String,
    offset: CivilOffset,
}

impl OpenWeatherProvider {
    pub fn new(
        api_key: String,
        schema: ForecastSchema,
        language: String,
        offset: CivilOffset,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create forecast client")?;

        Ok(Self {
            api_key,
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            schema,
            language,
            offset,
        })
    }

    /// Point the provider at another host, e.g. a mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        match self.schema {
            ForecastSchema::Hourly => format!("{}/data/3.0/onecall", self.base_url),
            ForecastSchema::ThreeHourly => format!("{}/data/2.5/forecast", self.base_url),
        }
    }

    async fn fetch_raw(&self, coord: Coordinate) -> Result<RawForecast> {
        let url = self.endpoint();
        let lat = coord.latitude.to_string();
        let lon = coord.longitude.to_string();

        let mut query = vec![
            ("lat", lat.as_str()),
            ("lon", lon.as_str()),
            ("appid", self.api_key.as_str()),
            ("units", "metric"),
            ("lang", self.language.as_str()),
        ];
        if self.schema == ForecastSchema::Hourly {
            query.push(("exclude", "current,minutely,alerts"));
        }

        debug!("Requesting {:?} forecast for {}", self.schema, coord);

        // The request URL carries `appid`, so it is stripped from transport errors.
        let res = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to send request to OpenWeather (forecast)")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to read OpenWeather forecast response body")?;

        if !status.is_success() {
            warn!("OpenWeather forecast returned status {}", status);
            return Err(anyhow!(
                "OpenWeather forecast request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        RawForecast::from_json(&body)
    }
}

#[async_trait]
impl ForecastProvider for OpenWeatherProvider {
    async fn fetch_forecast(&self, coord: Coordinate) -> Result<Forecast> {
        let raw = self.fetch_raw(coord).await?;
        let forecast = raw.normalize(self.offset);

        debug!("Normalized {} forecast steps", forecast.steps.len());
        Ok(forecast)
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
