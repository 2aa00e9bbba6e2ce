use thiserror::Error;

#[derive(Error, Debug)]
pub enum VectraApiError {
    #[error("Failed to create HTTP client: {0}")]
    HttpClientCreationError(reqwest::Error),

    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Vectra API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl VectraApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            VectraApiError::ApiError { status, .. } => Some(*status),
            VectraApiError::RequestError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
