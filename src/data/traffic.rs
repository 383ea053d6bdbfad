//! Routing API client and congestion heuristic
//!
//! For every monitored corridor the routing API is asked for a traffic-aware
//! route, returning both the live duration and the no-traffic baseline. The
//! relative delay is turned into "kilometers of slow traffic":
//!
//! ```text
//! delay_ratio   = (live - baseline) / baseline
//! congestion_km = round(distance_km * delay_ratio * 2.5), floored at 0
//! ```

use std::collections::BTreeMap;

use futures::future::join_all;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use super::{all_corridors, Corridor, Zone, ZoneCongestion};

/// Google Routes API endpoint
pub const ROUTES_API_URL: &str = "https://routes.googleapis.com/directions/v2:computeRoutes";

/// Only the two durations are requested from the API
const FIELD_MASK: &str = "routes.duration,routes.staticDuration";

/// Scale applied to the delay ratio
const CONGESTION_FACTOR: f64 = 2.5;

/// Errors that can occur when fetching a route
#[derive(Debug, Error)]
pub enum RoutesError {
    /// No routing API key configured
    #[error("Routing API key not configured")]
    MissingApiKey,

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The API answered with an error status
    #[error("Routing API returned {status}: {message}")]
    ApiError { status: StatusCode, message: String },

    /// The response contained no route
    #[error("No route in response")]
    NoRoute,

    /// A duration was not of the form `"<seconds>s"`
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),
}

/// Live and baseline travel times for one corridor, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteDurations {
    pub live_secs: u64,
    pub static_secs: u64,
}

/// Converts a corridor delay into the congestion-km heuristic
///
/// A zero baseline yields 0 and the result never goes negative.
pub fn congestion_km(distance_km: f64, live_secs: u64, static_secs: u64) -> u32 {
    if static_secs == 0 {
        return 0;
    }
    let delay_ratio = (live_secs as f64 - static_secs as f64) / static_secs as f64;
    let km = (distance_km * delay_ratio * CONGESTION_FACTOR).round();
    km.max(0.0) as u32
}

/// Parses a protobuf-style duration such as `"754s"` into whole seconds
fn parse_duration(value: &str) -> Result<u64, RoutesError> {
    let seconds: f64 = value
        .strip_suffix('s')
        .and_then(|n| n.trim().parse().ok())
        .ok_or_else(|| RoutesError::InvalidDuration(value.to_string()))?;

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(RoutesError::InvalidDuration(value.to_string()));
    }
    Ok(seconds.trunc() as u64)
}

/// Client for the routing API
#[derive(Debug, Clone)]
pub struct RoutesClient {
    http_client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl RoutesClient {
    /// Creates a new RoutesClient
    pub fn new(http_client: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    /// Fetches congestion for every corridor concurrently
    ///
    /// Never fails: a corridor whose lookup fails reports 0 km, and without
    /// an API key every zone reports 0 km.
    pub async fn fetch_congestion(&self) -> BTreeMap<Zone, ZoneCongestion> {
        info!("Fetching traffic data for all corridors");

        if self.api_key.is_none() {
            error!("{}", RoutesError::MissingApiKey);
            return all_corridors()
                .iter()
                .map(|corridor| (corridor.zone, ZoneCongestion { km: 0 }))
                .collect();
        }

        let lookups = all_corridors()
            .iter()
            .map(|corridor| self.fetch_zone_congestion(corridor));
        let congestion: BTreeMap<Zone, ZoneCongestion> = join_all(lookups).await.into_iter().collect();

        info!("Traffic data collected for {} zones", congestion.len());
        congestion
    }

    /// Congestion for one corridor, logging and absorbing failures
    async fn fetch_zone_congestion(&self, corridor: &Corridor) -> (Zone, ZoneCongestion) {
        let km = match self.fetch_route_durations(corridor).await {
            Ok(durations) => {
                congestion_km(corridor.distance_km, durations.live_secs, durations.static_secs)
            }
            Err(e) => {
                error!("Failed to fetch route {}: {}", corridor.name, e);
                0
            }
        };
        (corridor.zone, ZoneCongestion { km })
    }

    /// Requests live and baseline durations for a corridor
    pub async fn fetch_route_durations(
        &self,
        corridor: &Corridor,
    ) -> Result<RouteDurations, RoutesError> {
        let api_key = self.api_key.as_deref().ok_or(RoutesError::MissingApiKey)?;

        let response = self
            .http_client
            .post(&self.base_url)
            .header("X-Goog-Api-Key", api_key)
            .header("X-Goog-FieldMask", FIELD_MASK)
            .json(&RouteRequest::for_corridor(corridor))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_else(|_| "no error details".to_string());
            return Err(RoutesError::ApiError { status, message });
        }

        let body: ComputeRoutesResponse = response.json().await?;
        parse_routes(body)
    }
}

/// Extracts durations from the first route of a response
fn parse_routes(body: ComputeRoutesResponse) -> Result<RouteDurations, RoutesError> {
    let route = body.routes.into_iter().next().ok_or(RoutesError::NoRoute)?;
    Ok(RouteDurations {
        live_secs: parse_duration(&route.duration)?,
        static_secs: parse_duration(&route.static_duration)?,
    })
}

/// computeRoutes request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RouteRequest {
    origin: Waypoint,
    destination: Waypoint,
    travel_mode: &'static str,
    routing_preference: &'static str,
}

impl RouteRequest {
    fn for_corridor(corridor: &Corridor) -> Self {
        Self {
            origin: Waypoint::at(corridor.start),
            destination: Waypoint::at(corridor.end),
            travel_mode: "DRIVE",
            routing_preference: "TRAFFIC_AWARE",
        }
    }
}

#[derive(Debug, Serialize)]
struct Waypoint {
    location: Location,
}

impl Waypoint {
    fn at((latitude, longitude): (f64, f64)) -> Self {
        Self {
            location: Location {
                lat_lng: LatLng { latitude, longitude },
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Location {
    lat_lng: LatLng,
}

#[derive(Debug, Serialize)]
struct LatLng {
    latitude: f64,
    longitude: f64,
}

/// computeRoutes response, restricted by the field mask
#[derive(Debug, Deserialize)]
struct ComputeRoutesResponse {
    #[serde(default)]
    routes: Vec<RouteInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouteInfo {
    duration: String,
    static_duration: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}
