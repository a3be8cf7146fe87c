//! API client for the rewards backend.
//!
//! Every request reads the persisted access token and sends it as a
//! bearer credential. A 401 triggers one token refresh and one replay of
//! the original request; a failed refresh expires the session.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::auth::Session;
use crate::models::UserProfile;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Production backend
pub const DEFAULT_BASE_URL: &str = "https://emotion-api-production-40d4.up.railway.app";

/// HTTP request timeout in seconds
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

const LOGIN_PATH: &str = "/auth/employee/login";
const REFRESH_PATH: &str = "/auth/refresh";

/// Response of the employee login endpoint
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub profile: UserProfile,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Whether a request carries the session's bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credentials {
    /// Attach the persisted access token when there is one, refresh on 401
    Bearer,
    /// Credential exchange (login, refresh): no token, no refresh on 401
    Anonymous,
}

/// Retry state carried alongside a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Initial,
    RetriedOnce,
}

/// An outgoing API call
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    body: Option<serde_json::Value>,
    query: Vec<(String, String)>,
    credentials: Credentials,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            query: Vec::new(),
            credentials: Credentials::Bearer,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn anonymous(mut self) -> Self {
        self.credentials = Credentials::Anonymous;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// API client for the rewards backend.
/// Clone is cheap - reqwest::Client and the session are shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<Session>,
}

impl ApiClient {
    /// Create a client against the production backend with the default timeout
    pub fn new(session: Arc<Session>) -> Result<Self, ApiError> {
        Self::with_base_url(
            session,
            DEFAULT_BASE_URL,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn with_base_url(
        session: Arc<Session>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request and parse the JSON response
    pub async fn request<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.execute(&request).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse response from {}: {}", request.path, e))
        })
    }

    /// Exchange credentials for a token pair and profile
    pub async fn login(&self, registration: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = serde_json::json!({
            "registration": registration,
            "password": password,
        });
        self.request(ApiRequest::post(LOGIN_PATH).json(&body)?.anonymous())
            .await
    }

    // ===== Request Pipeline =====

    async fn execute(&self, request: &ApiRequest) -> Result<Response, ApiError> {
        let mut attempt = Attempt::Initial;

        loop {
            let token = match request.credentials {
                Credentials::Bearer => self.session.access_token()?,
                Credentials::Anonymous => None,
            };

            let response = self.send(request, token.as_deref()).await?;

            let refreshable = response.status() == StatusCode::UNAUTHORIZED
                && request.credentials == Credentials::Bearer
                && attempt == Attempt::Initial;
            if !refreshable {
                return Self::check_response(response).await;
            }

            let body = response.text().await.unwrap_or_default();
            let unauthorized = ApiError::from_status(StatusCode::UNAUTHORIZED, &body);
            attempt = Attempt::RetriedOnce;

            debug!(path = %request.path, "Unauthorized, refreshing access token");
            self.refresh_access_token(token.as_deref(), unauthorized).await?;
        }
    }

    async fn send(&self, request: &ApiRequest, token: Option<&str>) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .header(header::ACCEPT, "application/json");
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        Ok(builder.send().await?)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    // ===== Token Refresh =====

    /// Make sure the stored access token is newer than `stale`.
    ///
    /// Only one refresh runs at a time. A caller that waited on the lock
    /// while another caller rotated the token reuses that token. A caller
    /// that finds its session cleared while it waited shares the failed
    /// refresh and gets `RefreshFailed`.
    async fn refresh_access_token(
        &self,
        stale: Option<&str>,
        unauthorized: ApiError,
    ) -> Result<(), ApiError> {
        let _guard = self.session.lock_refresh().await;
        let generation = self.session.generation();

        match (stale, self.session.access_token()?) {
            (Some(stale), Some(current)) if stale != current => {
                debug!("Access token already refreshed by another request");
                return Ok(());
            }
            (Some(_), None) => {
                debug!("Session ended while waiting for refresh");
                return Err(ApiError::RefreshFailed(Box::new(unauthorized)));
            }
            (None, Some(_)) => {
                debug!("Access token stored since the request was sent");
                return Ok(());
            }
            _ => {}
        }

        let Some(refresh_token) = self.session.refresh_token()? else {
            warn!("No refresh token stored, ending session");
            self.session.expire(generation);
            return Err(unauthorized);
        };

        let tokens = match self.exchange_refresh_token(&refresh_token).await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(error = %e, "Token refresh failed, ending session");
                self.session.expire(generation);
                return Err(ApiError::RefreshFailed(Box::new(e)));
            }
        };

        if self.session.rotate_tokens(
            generation,
            &tokens.access_token,
            tokens.refresh_token.as_deref(),
        )? {
            info!("Access token refreshed");
            Ok(())
        } else {
            info!("Session changed during refresh, discarding refreshed tokens");
            Err(unauthorized)
        }
    }

    async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<RefreshResponse, ApiError> {
        let body = serde_json::json!({ "refresh_token": refresh_token });
        let request = ApiRequest::post(REFRESH_PATH).json(&body)?.anonymous();

        let response = self.send(&request, None).await?;
        let response = Self::check_response(response).await?;
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse refresh response: {}", e)))
    }
}
