use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkylensError {
    #[error("Invalid projection parameter: {0}")]
    InvalidProjectionParameter(String),

    #[error("Invalid orientation estimator parameter: {0}")]
    InvalidEstimatorParameter(String),

    #[error("Invalid scene parameter: {0}")]
    InvalidSceneParameter(String),

    #[error("Invalid observer location: {0}")]
    InvalidLocation(String),

    #[error("Invalid celestial position: {0}")]
    InvalidCelestialPosition(String),

    #[error("Unknown solar system body: {0}")]
    UnknownBody(String),

    #[error("No provider is able to locate target: {0}")]
    UnsupportedTarget(String),

    #[error("Celestial position provider failed: {0}")]
    ProviderFailure(String),

    #[error("Invalid catalog data: {0}")]
    InvalidCatalog(String),

    #[error("Unable to perform file operation: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("The sky session has been shut down")]
    SessionClosed,
}

impl PartialEq for SkylensError {
    fn eq(&self, other: &Self) -> bool {
        use SkylensError::*;
        match (self, other) {
            (InvalidProjectionParameter(a), InvalidProjectionParameter(b)) => a == b,
            (InvalidEstimatorParameter(a), InvalidEstimatorParameter(b)) => a == b,
            (InvalidSceneParameter(a), InvalidSceneParameter(b)) => a == b,
            (InvalidLocation(a), InvalidLocation(b)) => a == b,
            (InvalidCelestialPosition(a), InvalidCelestialPosition(b)) => a == b,
            (UnknownBody(a), UnknownBody(b)) => a == b,
            (UnsupportedTarget(a), UnsupportedTarget(b)) => a == b,
            (ProviderFailure(a), ProviderFailure(b)) => a == b,
            (InvalidCatalog(a), InvalidCatalog(b)) => a == b,

            // Wrapped foreign errors are not comparable: same variant means equal
            (Io(_), Io(_)) => true,
            (Serialization(_), Serialization(_)) => true,
            (CsvError(_), CsvError(_)) => true,

            (SessionClosed, SessionClosed) => true,

            _ => false,
        }
    }
}
