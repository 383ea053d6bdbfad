//! Session handling for the Olho Vivo transit API
//!
//! The transit API authenticates with a static token and answers with a
//! session cookie that must accompany every later call. One credential is
//! held per service instance and refreshed lazily: the next caller after an
//! invalidation re-authenticates. Separate instances never share it.

use std::sync::{Mutex, MutexGuard, PoisonError};

use reqwest::header::{HeaderMap, COOKIE, SET_COOKIE};
use reqwest::{Client, Response, StatusCode};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Base URL for the Olho Vivo API
pub const OLHO_VIVO_BASE_URL: &str = "https://api.olhovivo.sptrans.com.br/v2.1";

/// Errors that can occur while talking to the transit API
#[derive(Debug, Error)]
pub enum SessionError {
    /// No API token was configured
    #[error("Transit API token not configured")]
    MissingToken,

    /// The authentication call did not answer `true`
    #[error("Transit API token is invalid or expired")]
    Rejected,

    /// The authentication call succeeded but set no cookie
    #[error("Authentication response carried no session cookie")]
    MissingCookie,

    /// Transport failure during authentication
    #[error("Authentication request failed: {0}")]
    AuthRequestFailed(reqwest::Error),

    /// The upstream refused the held credential
    #[error("Transit API rejected the session credential")]
    Unauthorized,

    /// Non-success status other than unauthorized
    #[error("Transit API returned status {0}")]
    UpstreamStatus(StatusCode),

    /// Transport failure on an authenticated call
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

impl SessionError {
    /// True when the error means no session could be established
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            SessionError::MissingToken
                | SessionError::Rejected
                | SessionError::MissingCookie
                | SessionError::AuthRequestFailed(_)
        )
    }
}

/// Mutable session state owned by a [`SessionManager`]
#[derive(Debug, Default)]
pub struct SessionState {
    credential: Option<String>,
}

/// Holds the transit API session credential and performs authenticated calls
#[derive(Debug)]
pub struct SessionManager {
    http_client: Client,
    base_url: String,
    token: Option<String>,
    state: Mutex<SessionState>,
}

impl SessionManager {
    /// Creates a manager for the given API base URL and token
    pub fn new(http_client: Client, base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
            state: Mutex::new(SessionState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        // the guarded value is a plain Option, a poisoned lock is still usable
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Currently held credential, if any
    pub fn credential(&self) -> Option<String> {
        self.state().credential.clone()
    }

    /// Clears the held credential so the next call re-authenticates
    pub fn invalidate(&self) {
        if self.state().credential.take().is_some() {
            info!("Transit API session invalidated");
        }
    }

    /// Returns the held credential, authenticating first if none is held
    pub async fn ensure_session(&self) -> Result<String, SessionError> {
        if let Some(credential) = self.credential() {
            return Ok(credential);
        }
        self.authenticate().await
    }

    /// Performs the authentication call and stores the resulting credential
    ///
    /// Any failure clears the held credential.
    pub async fn authenticate(&self) -> Result<String, SessionError> {
        info!("Authenticating with the transit API");

        match self.request_credential().await {
            Ok(credential) => {
                self.state().credential = Some(credential.clone());
                info!("Transit API session established");
                Ok(credential)
            }
            Err(e) => {
                self.state().credential = None;
                error!("Transit API authentication failed: {}", e);
                Err(e)
            }
        }
    }

    async fn request_credential(&self) -> Result<String, SessionError> {
        let token = self.token.as_deref().ok_or(SessionError::MissingToken)?;

        let response = self
            .http_client
            .post(format!("{}/Login/Autenticar", self.base_url))
            .query(&[("token", token)])
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(SessionError::AuthRequestFailed)?;

        if !response.status().is_success() {
            warn!("Authentication answered with status {}", response.status());
            return Err(SessionError::Rejected);
        }

        let credential = session_cookie(response.headers());
        let accepted: serde_json::Value = response
            .json()
            .await
            .map_err(SessionError::AuthRequestFailed)?;

        if accepted != serde_json::Value::Bool(true) {
            return Err(SessionError::Rejected);
        }

        credential.ok_or(SessionError::MissingCookie)
    }

    /// Sends an authenticated GET to `path` with the given query pairs
    ///
    /// An unauthorized answer invalidates the session before returning
    /// [`SessionError::Unauthorized`]. No retry happens within the call.
    pub async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Response, SessionError> {
        let credential = self.ensure_session().await?;
        let url = upstream_url(&self.base_url, path);
        debug!("Forwarding authenticated GET {}", url);

        let response = self
            .http_client
            .get(&url)
            .query(query)
            .header(COOKIE, credential)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!("Transit API refused the session for {}", path);
                self.invalidate();
                Err(SessionError::Unauthorized)
            }
            status if !status.is_success() => Err(SessionError::UpstreamStatus(status)),
            _ => Ok(response),
        }
    }

    /// Replaces the held credential (for testing)
    #[cfg(test)]
    pub(crate) fn set_credential(&self, credential: Option<&str>) {
        self.state().credential = credential.map(str::to_string);
    }
}

/// Joins the base URL and an upstream path
fn upstream_url(base_url: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{}{}", base_url, path)
    } else {
        format!("{}/{}", base_url, path)
    }
}

/// Extracts the `name=value` pair of the first `Set-Cookie` header
fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .map(str::trim)
        .find(|pair| !pair.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn manager(token: Option<&str>) -> SessionManager {
        SessionManager::new(
            Client::new(),
            "http://127.0.0.1:9/v2.1/",
            token.map(str::to_string),
        )
    }

    #[test]
    fn test_session_cookie_takes_first_pair() {
        let mut headers = HeaderMap::new();
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("apiCredentials=abc123; path=/; HttpOnly"),
        );
        headers.append(SET_COOKIE, HeaderValue::from_static("other=1"));

        assert_eq!(session_cookie(&headers), Some("apiCredentials=abc123".to_string()));
    }

    #[test]
    fn test_session_cookie_missing() {
        assert_eq!(session_cookie(&HeaderMap::new()), None);
    }

    #[test]
    fn test_upstream_url_joins_paths() {
        assert_eq!(upstream_url("http://x/v2.1", "/Linha/Buscar"), "http://x/v2.1/Linha/Buscar");
        assert_eq!(upstream_url("http://x/v2.1", "Corredor"), "http://x/v2.1/Corredor");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        assert_eq!(manager(None).base_url, "http://127.0.0.1:9/v2.1");
    }

    #[test]
    fn test_blank_token_counts_as_missing() {
        let manager = SessionManager::new(Client::new(), "http://x", Some("  ".to_string()));
        assert!(manager.token.is_none());
    }

    #[tokio::test]
    async fn test_missing_token_fails_and_clears_credential() {
        let manager = manager(None);
        manager.set_credential(Some("stale=1"));
        manager.invalidate();

        let err = manager.ensure_session().await.unwrap_err();
        assert!(matches!(err, SessionError::MissingToken));
        assert!(err.is_authentication());
        assert!(manager.credential().is_none());
    }

    #[tokio::test]
    async fn test_held_credential_is_reused() {
        let manager = manager(None);
        manager.set_credential(Some("apiCredentials=held"));

        // no token configured, so this only succeeds without an auth call
        let credential = manager.ensure_session().await.unwrap();
        assert_eq!(credential, "apiCredentials=held");
    }

    #[test]
    fn test_invalidate_clears_credential() {
        let manager = manager(Some("token"));
        manager.set_credential(Some("apiCredentials=held"));
        manager.invalidate();
        assert!(manager.credential().is_none());
    }

    #[test]
    fn test_error_classification() {
        assert!(SessionError::Rejected.is_authentication());
        assert!(SessionError::MissingCookie.is_authentication());
        assert!(!SessionError::Unauthorized.is_authentication());
        assert!(!SessionError::UpstreamStatus(StatusCode::BAD_GATEWAY).is_authentication());
    }
}
