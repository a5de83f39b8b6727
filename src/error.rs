use thiserror::Error;

/// Everything that can go wrong talking to the data or lookup backends.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Transport(#[from] ureq::Error),
    #[error("provider answered with status {0}")]
    Status(u16),
    #[error("could not decode provider response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("could not decode geojson: {0}")]
    GeoJson(#[from] geojson::Error),
    #[error("no location named {0:?}")]
    NotFound(String),
    #[error("request outstanding for more than {0:.1}s")]
    Timeout(f64),
}

impl ProviderError {
    /// ureq reports non-success statuses as an error variant; pull them out so
    /// they read the same as any other status failure.
    pub fn from_ureq(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => ProviderError::Status(code),
            other => ProviderError::Transport(other),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error, PartialEq)]
pub enum ClassifierError {
    #[error("detail level table is empty")]
    Empty,
    #[error("detail level thresholds must be strictly increasing (level {0})")]
    Unordered(usize),
}

#[derive(Debug, Error, PartialEq)]
pub enum RouteError {
    #[error("unknown station {0:?}")]
    UnknownWaypoint(String),
    #[error("source and destination are both {0:?}")]
    SameEndpoints(String),
}
