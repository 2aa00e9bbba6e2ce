use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use super::config::VectraConfig;
use super::error::VectraApiError;
use super::models::{AssignmentQuery, AssignmentRequest, EntityType};

/// Tokens this close to expiry are refreshed before use.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

/// Calls the investigation tools make against the platform.
///
/// Every method is a single round trip. Implementations raise on transport
/// or HTTP failures; callers do not retry.
#[async_trait]
pub trait InvestigationApi: Send + Sync {
    /// Lists assignments. `None` means the platform returned no body.
    async fn get_assignments(&self, query: &AssignmentQuery)
        -> Result<Option<Value>, VectraApiError>;

    async fn get_assignment(&self, assignment_id: i64) -> Result<Value, VectraApiError>;

    async fn create_assignment(
        &self,
        request: &AssignmentRequest,
    ) -> Result<Value, VectraApiError>;

    async fn delete_assignment(&self, assignment_id: i64) -> Result<Value, VectraApiError>;

    async fn add_entity_note(
        &self,
        entity_id: i64,
        entity_type: EntityType,
        note: &str,
    ) -> Result<Value, VectraApiError>;

    async fn mark_detection_fixed(
        &self,
        detection_ids: &[i64],
        mark_fixed: bool,
    ) -> Result<Value, VectraApiError>;
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_lifetime")]
    expires_in: u64,
}

fn default_token_lifetime() -> u64 {
    DEFAULT_TOKEN_LIFETIME_SECS
}

#[derive(Clone)]
pub struct VectraClient {
    http: Client,
    config: VectraConfig,
    token: Arc<RwLock<Option<AccessToken>>>,
}

impl fmt::Debug for VectraClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectraClient")
            .field("api_base_url", &self.config.api_base_url())
            .field("client_id", &self.config.client_id)
            .finish_non_exhaustive()
    }
}

impl VectraClient {
    pub fn new(config: VectraConfig) -> Result<Self, VectraApiError> {
        debug!(
            base_url = %config.base_url,
            api_version = %config.api_version,
            verify_ssl = %config.verify_ssl,
            "Creating new VectraClient"
        );

        let http = Client::builder()
            .danger_accept_invalid_certs(!config.verify_ssl)
            .timeout(config.request_timeout)
            .user_agent(concat!("mcp-server-vectra/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(VectraApiError::HttpClientCreationError)?;

        Ok(Self {
            http,
            config,
            token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn config(&self) -> &VectraConfig {
        &self.config
    }

    async fn access_token(&self) -> Result<String, VectraApiError> {
        {
            let token = self.token.read().await;
            if let Some(t) = &*token {
                if t.expires_at > Instant::now() + TOKEN_REFRESH_MARGIN {
                    return Ok(t.value.clone());
                }
            }
        }

        let token_url = self.config.oauth_token_url();
        info!(%token_url, "Fetching new OAuth2 token from Vectra");

        let response = self
            .http
            .post(&token_url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| VectraApiError::AuthenticationError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, "OAuth2 token request rejected");
            return Err(VectraApiError::AuthenticationError(format!(
                "token request failed with status {}: {}",
                status, body
            )));
        }

        let token_response: TokenResponse = response.json().await.map_err(|e| {
            VectraApiError::AuthenticationError(format!("invalid token response: {}", e))
        })?;

        let now = Instant::now();
        // Lifetimes past what Instant can represent fall back to the default.
        let expires_at = now
            .checked_add(Duration::from_secs(token_response.expires_in))
            .unwrap_or_else(|| now + Duration::from_secs(DEFAULT_TOKEN_LIFETIME_SECS));

        let mut token = self.token.write().await;
        *token = Some(AccessToken {
            value: token_response.access_token.clone(),
            expires_at,
        });
        debug!(expires_in = token_response.expires_in, "OAuth2 token cached");

        Ok(token_response.access_token)
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Option<Value>, VectraApiError> {
        let url = format!(
            "{}/{}",
            self.config.api_base_url(),
            path.trim_start_matches('/')
        );
        let token = self.access_token().await?;

        debug!(%method, %url, ?query, "Sending request to Vectra");

        let mut builder = self
            .http
            .request(method.clone(), &url)
            .bearer_auth(token)
            .query(query);
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            error!(%method, %url, %status, "Vectra API request failed");
            let message = if text.trim().is_empty() {
                status.canonical_reason().unwrap_or("no response body").to_string()
            } else {
                text
            };
            return Err(VectraApiError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            debug!(%method, %url, %status, "Vectra returned an empty body");
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&text)?))
    }
}

#[async_trait]
impl InvestigationApi for VectraClient {
    async fn get_assignments(
        &self,
        query: &AssignmentQuery,
    ) -> Result<Option<Value>, VectraApiError> {
        info!(?query, "Retrieving assignments from Vectra");
        self.request(Method::GET, "assignments", &query.to_query_pairs(), None)
            .await
    }

    async fn get_assignment(&self, assignment_id: i64) -> Result<Value, VectraApiError> {
        info!("Fetching assignment with ID: {}", assignment_id);
        let path = format!("assignments/{}", assignment_id);
        match self.request(Method::GET, &path, &[], None).await {
            Ok(assignment) => {
                debug!("Successfully retrieved assignment {}", assignment_id);
                Ok(assignment.unwrap_or(Value::Null))
            }
            Err(e) => {
                error!("Failed to retrieve assignment {}: {}", assignment_id, e);
                Err(e)
            }
        }
    }

    async fn create_assignment(
        &self,
        request: &AssignmentRequest,
    ) -> Result<Value, VectraApiError> {
        info!(
            assign_to_user_id = request.assign_to_user_id,
            assign_host_id = ?request.assign_host_id,
            assign_account_id = ?request.assign_account_id,
            "Creating assignment"
        );
        let body = serde_json::to_value(request)?;
        let created = self
            .request(Method::POST, "assignments", &[], Some(body))
            .await?;
        Ok(created.unwrap_or(Value::Null))
    }

    async fn delete_assignment(&self, assignment_id: i64) -> Result<Value, VectraApiError> {
        info!("Deleting assignment with ID: {}", assignment_id);
        let path = format!("assignments/{}", assignment_id);
        let deleted = self.request(Method::DELETE, &path, &[], None).await?;
        Ok(deleted.unwrap_or(Value::Null))
    }

    async fn add_entity_note(
        &self,
        entity_id: i64,
        entity_type: EntityType,
        note: &str,
    ) -> Result<Value, VectraApiError> {
        info!(entity_id, %entity_type, "Adding note to entity");
        let path = format!("entities/{}/notes", entity_id);
        let query = [("type", entity_type.to_string())];
        let created = self
            .request(Method::POST, &path, &query, Some(json!({ "note": note })))
            .await?;
        Ok(created.unwrap_or(Value::Null))
    }

    async fn mark_detection_fixed(
        &self,
        detection_ids: &[i64],
        mark_fixed: bool,
    ) -> Result<Value, VectraApiError> {
        info!(
            count = detection_ids.len(),
            mark_fixed, "Updating fixed state of detections"
        );
        let body = json!({
            "detectionIdList": detection_ids,
            "mark_as_fixed": if mark_fixed { "True" } else { "False" },
        });
        let updated = self
            .request(Method::PATCH, "detections", &[], Some(body))
            .await?;
        Ok(updated.unwrap_or(Value::Null))
    }
}
