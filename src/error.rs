use thiserror::Error;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that may cross the library boundary.
///
/// Only configuration and storage setup return these; play-time entry points
/// recover locally and log instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A round could not produce a target item
    #[error("missing content: {0}")]
    MissingContent(String),

    #[error("progress store unavailable: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid data file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Rejected `SessionConfig`. Never clamped, always raised from `configure`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("total_rounds must be at least 1")]
    NoRounds,

    #[error("choice_count must be at least 2, got {0}")]
    TooFewChoices(usize),

    #[error("perfect threshold ({perfect}) must be below good threshold ({good})")]
    ThresholdOrder { perfect: u32, good: u32 },

    #[error("engine has not been configured")]
    NotConfigured,

    #[error("no game registered as '{0}'")]
    UnknownGame(String),
}
