use thiserror::Error;

pub type Result<T> = std::result::Result<T, RecommendError>;

#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("No destinations available for training")]
    NoDataAvailable,

    #[error("Recommendation model has not been trained")]
    ModelNotTrained,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RecommendError {
    /// Whether the caller can reasonably retry once the catalog is populated.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RecommendError::NoDataAvailable)
    }
}

impl From<std::io::Error> for RecommendError {
    fn from(err: std::io::Error) -> Self {
        RecommendError::Catalog(err.to_string())
    }
}

impl From<serde_json::Error> for RecommendError {
    fn from(err: serde_json::Error) -> Self {
        RecommendError::Catalog(err.to_string())
    }
}

impl From<csv::Error> for RecommendError {
    fn from(err: csv::Error) -> Self {
        RecommendError::Catalog(err.to_string())
    }
}

impl From<envy::Error> for RecommendError {
    fn from(err: envy::Error) -> Self {
        RecommendError::Config(err.to_string())
    }
}
