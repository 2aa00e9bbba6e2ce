use std::env;
use std::time::Duration;

use super::error::VectraApiError;

pub const SUPPORTED_API_VERSIONS: &[&str] = &["v3", "v3.1", "v3.2", "v3.3", "v3.4"];
pub const DEFAULT_API_VERSION: &str = "v3.4";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Connection settings for a Vectra tenant.
///
/// Built from `VECTRA_*` environment variables (a `.env` file is honoured)
/// or assembled directly when embedding the client.
#[derive(Debug, Clone)]
pub struct VectraConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub api_version: String,
    pub oauth_token_url: Option<String>,
    pub request_timeout: Duration,
    pub verify_ssl: bool,
}

impl VectraConfig {
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            oauth_token_url: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            verify_ssl: true,
        }
    }

    pub fn from_env() -> Result<Self, VectraApiError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, VectraApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| {
                    VectraApiError::ConfigurationError(format!(
                        "{} environment variable is required",
                        key
                    ))
                })
        };

        let base_url = required("VECTRA_BASE_URL")?;
        let client_id = required("VECTRA_CLIENT_ID")?;
        let client_secret = required("VECTRA_CLIENT_SECRET")?;

        let api_version =
            lookup("VECTRA_API_VERSION").unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
        if !SUPPORTED_API_VERSIONS.contains(&api_version.as_str()) {
            return Err(VectraApiError::ConfigurationError(format!(
                "Unsupported API version: {}. Supported versions: {}",
                api_version,
                SUPPORTED_API_VERSIONS.join(", ")
            )));
        }

        let request_timeout = match lookup("VECTRA_REQUEST_TIMEOUT") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(VectraApiError::ConfigurationError(format!(
                        "VECTRA_REQUEST_TIMEOUT must be a positive number of seconds, got '{}'",
                        raw
                    )))
                }
            },
            None => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        let verify_ssl = lookup("VERIFY_SSL")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        let oauth_token_url = lookup("VECTRA_OAUTH_TOKEN_URL").filter(|v| !v.trim().is_empty());

        Ok(Self {
            base_url: normalize_base_url(&base_url),
            client_id,
            client_secret,
            api_version,
            oauth_token_url,
            request_timeout,
            verify_ssl,
        })
    }

    /// Root of the versioned REST API, e.g. `https://tenant/api/v3.4`.
    pub fn api_base_url(&self) -> String {
        format!("{}/api/{}", self.base_url, self.api_version)
    }

    pub fn oauth_token_url(&self) -> String {
        self.oauth_token_url
            .clone()
            .unwrap_or_else(|| format!("{}/oauth2/token", self.base_url))
    }
}

fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}
