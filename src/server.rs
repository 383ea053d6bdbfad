//! HTTP surface of the service
//!
//! | Method | Path                           | Handler                 |
//! |--------|--------------------------------|-------------------------|
//! | GET    | `/vote`                        | current vote tally      |
//! | POST   | `/vote`                        | record a vote           |
//! | GET    | `/transit?path=/panel`         | panel snapshot          |
//! | GET    | `/transit?path=<p>&<query>`    | transit API passthrough |
//! | OPTIONS| any                            | empty 200 (CORS layer)  |
//!
//! All responses carry permissive CORS headers. Errors are JSON objects with
//! an `error` field and optional `details`.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, RawQuery, State},
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::cli::Config;
use crate::data::{RailStatusClient, RoutesClient, SessionManager};
use crate::error::AppError;
use crate::panel::PanelAggregator;
use crate::proxy::{TransitProxy, TransitQuery};
use crate::votes::{InMemoryVoteStore, RedisVoteStore, VoteCounter, VoteStore, VoteTally};

/// Value of the `path` parameter selecting the panel
pub const PANEL_PATH: &str = "/panel";

/// Long-lived service state shared by all requests
///
/// The session credential and the panel cache live here, per process.
/// Two running instances keep independent copies and may disagree.
pub struct AppState {
    pub votes: VoteCounter,
    pub panel: PanelAggregator,
    pub proxy: TransitProxy,
}

impl AppState {
    /// Builds the state from configuration
    ///
    /// Falls back to in-memory vote counters when Redis is not configured or
    /// cannot be reached.
    pub async fn from_config(config: &Config) -> Arc<Self> {
        let store: Arc<dyn VoteStore> = match &config.redis_url {
            Some(redis_url) => match RedisVoteStore::connect(redis_url).await {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    warn!("Redis unavailable ({}), keeping votes in memory", e);
                    Arc::new(InMemoryVoteStore::new())
                }
            },
            None => Arc::new(InMemoryVoteStore::new()),
        };

        Self::with_store(config, store)
    }

    /// Builds the state around an existing vote store
    pub fn with_store(config: &Config, store: Arc<dyn VoteStore>) -> Arc<Self> {
        let http_client = reqwest::Client::new();
        let session = Arc::new(SessionManager::new(
            http_client.clone(),
            config.transit_api_url.clone(),
            config.transit_token.clone(),
        ));
        let routes = RoutesClient::new(
            http_client.clone(),
            config.routes_api_url.clone(),
            config.routes_api_key.clone(),
        );
        let rail = config
            .include_rail_status
            .then(|| RailStatusClient::new(http_client, config.rail_feed_url.clone()));
        let ttl = panel_ttl(config.panel_ttl_secs);

        Arc::new(Self {
            votes: VoteCounter::new(store),
            panel: PanelAggregator::new(session.clone(), routes, rail, ttl),
            proxy: TransitProxy::new(session),
        })
    }
}

/// Converts the configured TTL, saturating at the largest representable duration
fn panel_ttl(secs: u64) -> chrono::Duration {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or(chrono::Duration::MAX)
}

/// Builds the router
///
/// The CORS layer wraps everything, so any OPTIONS request is answered with
/// an empty 200 before routing.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/vote",
            get(get_votes).post(record_vote).fallback(method_not_allowed),
        )
        .route("/transit", get(transit).fallback(method_not_allowed))
        .fallback(not_found)
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60))
}

async fn get_votes(State(state): State<Arc<AppState>>) -> Result<Json<VoteTally>, AppError> {
    Ok(Json(state.votes.get_tally().await?))
}

#[derive(Debug, Deserialize)]
struct VoteBody {
    option: String,
}

async fn record_vote(
    State(state): State<Arc<AppState>>,
    body: Result<Json<VoteBody>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Json(body) = body.map_err(|e| AppError::Validation(format!("Invalid vote body: {}", e.body_text())))?;
    state.votes.record_vote(&body.option).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

async fn transit(
    State(state): State<Arc<AppState>>,
    RawQuery(raw): RawQuery,
) -> Result<Response, AppError> {
    let query = TransitQuery::parse(raw.as_deref());
    let path = query.path.ok_or_else(|| {
        AppError::Validation(format!("Missing path parameter. Use /transit?path={}", PANEL_PATH))
    })?;

    if path == PANEL_PATH {
        let snapshot = state.panel.get_panel().await?;
        return Ok(Json(snapshot).into_response());
    }

    let proxied = state.proxy.forward(&path, &query.params).await?;
    let content_type = proxied
        .content_type
        .and_then(|value| HeaderValue::from_str(&value).ok())
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));

    Ok(([(CONTENT_TYPE, content_type)], proxied.body).into_response())
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

async fn not_found() -> AppError {
    AppError::NotFound(format!(
        "Endpoint not found. Use /vote or /transit?path={}",
        PANEL_PATH
    ))
}

/// Serves the API on `listener` until Ctrl+C or SIGTERM
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    if let Ok(address) = listener.local_addr() {
        info!("Server running on {}", address);
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
        } else {
            warn!("Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_state_without_redis_uses_memory_store() {
        let state = AppState::from_config(&Config::default()).await;
        state.votes.record_vote("yes").await.unwrap();
        assert_eq!(state.votes.get_tally().await.unwrap().yes, 1);
    }

    #[test]
    fn test_panel_ttl_conversion() {
        assert_eq!(panel_ttl(0), chrono::Duration::zero());
        assert_eq!(panel_ttl(180), chrono::Duration::minutes(3));
        assert_eq!(panel_ttl(u64::MAX), chrono::Duration::MAX);
        assert_eq!(panel_ttl(i64::MAX as u64), chrono::Duration::MAX);
    }

    #[tokio::test]
    async fn test_huge_ttl_builds_state() {
        use crate::cli::Cli;
        use clap::Parser;

        let cli = Cli::parse_from(["transit-panel", "--panel-ttl-secs", "18446744073709551615"]);
        let config = Config {
            transit_token: None,
            ..Config::from_cli(cli).unwrap()
        };
        let state = AppState::with_store(&config, Arc::new(InMemoryVoteStore::new()));

        // no token, so the panel fails cleanly instead of panicking
        assert!(state.panel.get_panel().await.is_err());
    }

    #[tokio::test]
    async fn test_unreachable_redis_falls_back_to_memory() {
        let config = Config {
            redis_url: Some("redis://127.0.0.1:9/".to_string()),
            ..Config::default()
        };
        let state = AppState::from_config(&config).await;
        assert_eq!(state.votes.get_tally().await.unwrap(), VoteTally::default());
    }
}
