use thiserror::Error;

/// Failures surfaced by the advice pipeline, one variant per caller-visible outcome.
#[derive(Debug, Error)]
pub enum AdviceError {
    #[error("invalid location: {0}")]
    Validation(String),

    #[error("location not found: {0}")]
    LocationNotFound(String),

    #[error("forecast unavailable: {0:#}")]
    ForecastUnavailable(anyhow::Error),

    #[error("failed to generate text: {0}")]
    GenerationUnavailable(#[from] GenerationError),

    #[error("internal error: {0:#}")]
    Internal(anyhow::Error),
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("no API key configured for the generation service")]
    MissingApiKey,

    #[error("generation service returned status {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("generation request failed: {0}")]
    Transport(String),

    #[error("unexpected generation response format")]
    UnexpectedShape,
}

#[derive(Debug, Error)]
pub enum WardrobeError {
    #[error("clothing name must not be blank")]
    Blank,

    #[error("'{0}' is not in the wardrobe")]
    NotFound(String),

    #[error("wardrobe file error: {0}")]
    Io(#[from] std::io::Error),
}
