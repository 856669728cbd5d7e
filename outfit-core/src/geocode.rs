//! Forward geocoding: region + locality text to a coordinate.
//! Uses Nominatim (OpenStreetMap) - free, no API key required.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{fmt::Debug, time::Duration};
use tracing::{debug, info, warn};

use crate::{location::LocationQuery, model::Coordinate};

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
const USER_AGENT: &str = concat!("outfit/", env!("CARGO_PKG_VERSION"));

#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    /// First coordinate matching the query's region + locality. Timeouts,
    /// transport errors and empty results all come back as `None`.
    async fn resolve(&self, query: &LocationQuery) -> Option<Coordinate>;
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
}

#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    http: Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create geocoding client")?;

        Ok(Self {
            http,
            base_url: NOMINATIM_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn search(&self, address: &str) -> Result<Option<Coordinate>> {
        let url = format!("{}/search", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .context("Geocode request failed")?
            .error_for_status()
            .context("Geocoder returned an error status")?;

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .context("Failed to parse geocoder response")?;

        let Some(place) = places.into_iter().next() else {
            return Ok(None);
        };

        let latitude = place.lat.parse::<f64>().context("Invalid latitude")?;
        let longitude = place.lon.parse::<f64>().context("Invalid longitude")?;

        debug!("Matched '{}' to {}", address, place.display_name);
        Ok(Some(Coordinate {
            latitude,
            longitude,
        }))
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn resolve(&self, query: &LocationQuery) -> Option<Coordinate> {
        let address = query.address();

        match self.search(&address).await {
            Ok(Some(coord)) => {
                info!("Geocoded '{}' to {}", address, coord);
                Some(coord)
            }
            Ok(None) => {
                warn!("No coordinates found for '{}'", address);
                None
            }
            Err(e) => {
                warn!("Geocoding '{}' failed: {:#}", address, e);
                None
            }
        }
    }
}
