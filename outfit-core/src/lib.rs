//! Core library for the `outfit` advisor.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Geocoding and forecast retrieval, normalized to local civil time
//! - Selection of today's forecast window and prompt rendering
//! - The text-generation client and the wardrobe store
//!
//! It is used by `outfit-cli`, but can also be reused by other binaries or services.

pub mod advisor;
pub mod clock;
pub mod config;
pub mod error;
pub mod generation;
pub mod geocode;
pub mod location;
pub mod model;
pub mod prompt;
pub mod provider;
pub mod wardrobe;
pub mod window;

pub use advisor::Advisor;
pub use clock::CivilOffset;
pub use config::{Config, ProviderConfig};
pub use error::{AdviceError, GenerationError, WardrobeError};
pub use generation::{GeminiClient, TextGenerator};
pub use geocode::{Geocoder, NominatimGeocoder};
pub use location::LocationQuery;
pub use model::{Coordinate, Forecast, ForecastStep, ForecastWindow, Recommendation, WardrobeText};
pub use provider::{ForecastProvider, ForecastSchema, ProviderId};
pub use wardrobe::{FileWardrobeStore, WardrobeStore};
