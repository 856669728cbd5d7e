use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Text handed to the prompt when nothing has been registered yet.
pub const NOT_REGISTERED: &str = "(no clothes registered)";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.latitude, self.longitude)
    }
}

/// One normalized forecast data point. `timestamp` is civil time at the
/// forecast location, never UTC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastStep {
    pub timestamp: NaiveDateTime,
    pub condition_code: String,
    pub description: String,
    pub temperature_c: f64,
    pub feels_like_c: Option<f64>,
    /// Fraction in `[0, 1]`.
    pub precipitation_probability: Option<f64>,
    pub precipitation_mm: f64,
    pub icon_id: String,
}

/// Uniform result of a forecast fetch, whatever schema the provider answered with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub steps: Vec<ForecastStep>,
    pub daily_icon_url: Option<String>,
    /// "City, Country" when the payload embeds it.
    pub location_label: Option<String>,
}

/// Forecast steps falling on the current local calendar day. May be empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastWindow {
    steps: Vec<ForecastStep>,
}

impl ForecastWindow {
    pub fn new(steps: Vec<ForecastStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[ForecastStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }
}

/// Free-text wardrobe as read from the store, or the "nothing registered" marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WardrobeText {
    Registered(String),
    NotRegistered,
}

impl WardrobeText {
    pub fn from_items(items: &[String]) -> Self {
        if items.is_empty() {
            Self::NotRegistered
        } else {
            Self::Registered(items.join("\n"))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Registered(text) => text,
            Self::NotRegistered => NOT_REGISTERED,
        }
    }
}

impl fmt::Display for WardrobeText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the caller gets back from one advice request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub generated_text: String,
    /// Empty when the provider did not supply a daily icon.
    #[serde(default)]
    pub daily_icon_url: String,
}
