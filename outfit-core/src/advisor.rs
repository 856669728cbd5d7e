use chrono::NaiveDateTime;
use std::{path::PathBuf, sync::Arc};
use tracing::{debug, info, instrument, warn};

use crate::{
    Config,
    clock::CivilOffset,
    error::AdviceError,
    generation::{GeminiClient, TextGenerator},
    geocode::{Geocoder, NominatimGeocoder},
    location::LocationQuery,
    model::{Recommendation, WardrobeText},
    prompt,
    provider::{ForecastProvider, provider_from_config},
    wardrobe::{WardrobeStore, load_wardrobe_text},
    window::select_today,
};

/// A rendered prompt plus what the caller needs alongside the generated text.
#[derive(Debug, Clone)]
pub struct PreparedPrompt {
    pub prompt: String,
    pub daily_icon_url: Option<String>,
}

/// Runs one request end to end: geocode, forecast, window, render, generate.
///
/// Holds no per-request state; concurrent calls share only the collaborators.
#[derive(Debug, Clone)]
pub struct Advisor {
    geocoder: Arc<dyn Geocoder>,
    forecasts: Arc<dyn ForecastProvider>,
    generator: Arc<dyn TextGenerator>,
    wardrobe: Arc<dyn WardrobeStore>,
    offset: CivilOffset,
    debug_prompt_path: Option<PathBuf>,
}

impl Advisor {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        forecasts: Arc<dyn ForecastProvider>,
        generator: Arc<dyn TextGenerator>,
        wardrobe: Arc<dyn WardrobeStore>,
        offset: CivilOffset,
    ) -> Self {
        Self {
            geocoder,
            forecasts,
            generator,
            wardrobe,
            offset,
            debug_prompt_path: None,
        }
    }

    /// Wire the production collaborators. Fails if a required API key is absent.
    pub fn from_config(config: &Config, wardrobe: Arc<dyn WardrobeStore>) -> anyhow::Result<Self> {
        let geocoder = NominatimGeocoder::new(config.geocode_timeout())?;
        let forecasts = provider_from_config(config)?;
        let generator = GeminiClient::from_config(config)?;

        let advisor = Self::new(
            Arc::new(geocoder),
            Arc::from(forecasts),
            Arc::new(generator),
            wardrobe,
            CivilOffset::hours(config.utc_offset_hours),
        );

        Ok(advisor.with_debug_prompt_path(config.debug_prompt_path.clone()))
    }

    /// Write every rendered prompt to `path`, overwriting the previous one.
    pub fn with_debug_prompt_path(mut self, path: Option<PathBuf>) -> Self {
        self.debug_prompt_path = path;
        self
    }

    pub fn wardrobe(&self) -> &Arc<dyn WardrobeStore> {
        &self.wardrobe
    }

    pub async fn advise(&self, location: &str) -> Result<Recommendation, AdviceError> {
        self.advise_at(location, self.offset.now()).await
    }

    /// Everything up to (not including) generation, at a fixed local `now`.
    pub async fn prepare_prompt(
        &self,
        query: &LocationQuery,
        now: NaiveDateTime,
    ) -> Result<PreparedPrompt, AdviceError> {
        let coord = self
            .geocoder
            .resolve(query)
            .await
            .ok_or_else(|| AdviceError::LocationNotFound(query.to_string()))?;

        let forecast = self
            .forecasts
            .fetch_forecast(coord)
            .await
            .map_err(AdviceError::ForecastUnavailable)?;

        let window = select_today(&forecast.steps, now);
        debug!(
            "{} of {} steps fall on {}",
            window.len(),
            forecast.steps.len(),
            now.date()
        );

        let wardrobe = self.load_wardrobe().await?;
        let prompt = prompt::render_labeled(
            now,
            &query.region,
            &query.locality,
            &window,
            &wardrobe,
            forecast.location_label.as_deref(),
        );

        self.save_debug_prompt(&prompt).await;

        Ok(PreparedPrompt {
            prompt,
            daily_icon_url: forecast.daily_icon_url,
        })
    }

    #[instrument(skip(self))]
    pub async fn advise_at(
        &self,
        location: &str,
        now: NaiveDateTime,
    ) -> Result<Recommendation, AdviceError> {
        let query = LocationQuery::try_from(location)?;
        let prepared = self.prepare_prompt(&query, now).await?;

        let generated_text = self.generator.complete(&prepared.prompt).await?;
        info!("Generated advice for {}", query);

        Ok(Recommendation {
            generated_text,
            daily_icon_url: prepared.daily_icon_url.unwrap_or_default(),
        })
    }

    /// The store does blocking file I/O, so it is read on the blocking pool.
    async fn load_wardrobe(&self) -> Result<WardrobeText, AdviceError> {
        let store = Arc::clone(&self.wardrobe);

        tokio::task::spawn_blocking(move || load_wardrobe_text(store.as_ref()))
            .await
            .map_err(|e| {
                AdviceError::Internal(anyhow::Error::new(e).context("Wardrobe load task failed"))
            })
    }

    async fn save_debug_prompt(&self, prompt: &str) {
        let Some(path) = &self.debug_prompt_path else {
            return;
        };
        if let Err(e) = tokio::fs::write(path, prompt).await {
            warn!("Failed to save prompt to {}: {}", path.display(), e);
        }
    }
}
