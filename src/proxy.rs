//! Generic pass-through to the transit API
//!
//! Requests on the transit endpoint whose `path` parameter is not the panel
//! route are forwarded to the transit API with the session cookie attached.
//! The remaining query parameters travel with the call and the upstream body
//! comes back untouched.

use std::sync::Arc;

use axum::body::Bytes;
use tracing::info;
use url::form_urlencoded;

use crate::data::{SessionError, SessionManager};

/// Query parameter naming the upstream path
pub const PATH_PARAM: &str = "path";

/// A transit endpoint query split into its path and the remaining pairs
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransitQuery {
    pub path: Option<String>,
    pub params: Vec<(String, String)>,
}

impl TransitQuery {
    /// Splits a raw query string, keeping the order of the other parameters
    ///
    /// The first non-empty `path` wins; every `path` pair is removed.
    pub fn parse(raw: Option<&str>) -> Self {
        let mut query = TransitQuery::default();

        for (key, value) in form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
            if key == PATH_PARAM {
                if query.path.is_none() && !value.is_empty() {
                    query.path = Some(value.into_owned());
                }
            } else {
                query.params.push((key.into_owned(), value.into_owned()));
            }
        }

        query
    }
}

/// Upstream answer returned verbatim to the caller
#[derive(Debug, Clone)]
pub struct ProxiedResponse {
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// Forwards calls to the transit API through the shared session
#[derive(Debug, Clone)]
pub struct TransitProxy {
    session: Arc<SessionManager>,
}

impl TransitProxy {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    /// Forwards a GET for `path` with `params`
    ///
    /// An unauthorized answer leaves the session invalidated and is returned
    /// as an error; the next call re-authenticates.
    pub async fn forward(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<ProxiedResponse, SessionError> {
        info!("Proxying transit API request for {}", path);

        let response = self.session.get(path, params).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;

        Ok(ProxiedResponse { content_type, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_strips_path() {
        let query = TransitQuery::parse(Some("path=/Linha/Buscar&termosBusca=8000"));
        assert_eq!(query.path.as_deref(), Some("/Linha/Buscar"));
        assert_eq!(query.params, pairs(&[("termosBusca", "8000")]));
    }

    #[test]
    fn test_parse_keeps_order_and_decodes() {
        let query = TransitQuery::parse(Some("b=2&path=%2FPosicao&a=hello%20world&c=3"));
        assert_eq!(query.path.as_deref(), Some("/Posicao"));
        assert_eq!(query.params, pairs(&[("b", "2"), ("a", "hello world"), ("c", "3")]));
    }

    #[test]
    fn test_parse_missing_or_empty_path() {
        assert_eq!(TransitQuery::parse(None), TransitQuery::default());
        assert!(TransitQuery::parse(Some("path=&x=1")).path.is_none());
        assert!(TransitQuery::parse(Some("x=1")).path.is_none());
    }

    #[test]
    fn test_parse_repeated_path() {
        let query = TransitQuery::parse(Some("path=/a&path=/b&x=1"));
        assert_eq!(query.path.as_deref(), Some("/a"));
        assert_eq!(query.params, pairs(&[("x", "1")]));
    }

    #[tokio::test]
    async fn test_forward_without_token_fails_authentication() {
        let session = Arc::new(SessionManager::new(reqwest::Client::new(), "http://127.0.0.1:9", None));
        let proxy = TransitProxy::new(session);

        let err = proxy.forward("/Linha/Buscar", &[]).await.unwrap_err();
        assert!(matches!(err, SessionError::MissingToken));
    }
}
