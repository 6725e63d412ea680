use thiserror::Error;

/// Errors surfaced by the remote store, the market-data API and the sync layer.
///
/// Short history is not an error: indicators return `None` for it.
#[derive(Error, Debug)]
pub enum MarketError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote error {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("response for request #{requested} superseded by request #{current}")]
    Superseded { requested: u64, current: u64 },

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl MarketError {
    /// Failures that should push the sync layer onto its synthetic fallback.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            MarketError::Http(_)
                | MarketError::Remote { .. }
                | MarketError::Malformed(_)
                | MarketError::Serde(_)
        )
    }
}

pub type Result<T, E = MarketError> = std::result::Result<T, E>;
