//! Panel aggregation with a time-boxed cache
//!
//! A panel request is served from the cache while the cached snapshot is
//! younger than the TTL. Otherwise the transit session is established, the
//! four collectors run concurrently, and the new snapshot replaces the cache.
//!
//! Collector failures are absorbed into placeholder values inside each
//! collector. Only a failure to establish the session aborts the refresh,
//! in which case the cache is cleared and the error reaches the caller.

use std::sync::Arc;

use chrono::{Duration, Utc};
use thiserror::Error;
use tracing::{error, info};

use crate::cache::CacheManager;
use crate::data::{
    current_restriction, BusSpeedCollector, PanelSnapshot, RailStatusClient, RoutesClient,
    SessionError, SessionManager,
};

/// Errors that abort a panel refresh
#[derive(Debug, Error)]
pub enum PanelError {
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Builds and caches panel snapshots
pub struct PanelAggregator {
    session: Arc<SessionManager>,
    routes: RoutesClient,
    bus: BusSpeedCollector,
    /// `None` when the panel is configured without rail status
    rail: Option<RailStatusClient>,
    cache: CacheManager<PanelSnapshot>,
}

impl PanelAggregator {
    pub fn new(
        session: Arc<SessionManager>,
        routes: RoutesClient,
        rail: Option<RailStatusClient>,
        ttl: Duration,
    ) -> Self {
        Self {
            bus: BusSpeedCollector::new(session.clone()),
            session,
            routes,
            rail,
            cache: CacheManager::new(ttl),
        }
    }

    /// Returns the cached snapshot if fresh, otherwise builds a new one
    pub async fn get_panel(&self) -> Result<PanelSnapshot, PanelError> {
        if let Some(snapshot) = self.cache.fresh() {
            info!("Serving panel from cache");
            return Ok(snapshot);
        }

        info!("Panel cache empty or expired, collecting fresh data");
        match self.collect().await {
            Ok(snapshot) => {
                self.cache.write_at(snapshot.clone(), snapshot.timestamp);
                Ok(snapshot)
            }
            Err(e) => {
                error!("Panel refresh failed: {}", e);
                self.cache.clear();
                Err(e)
            }
        }
    }

    async fn collect(&self) -> Result<PanelSnapshot, PanelError> {
        self.session.ensure_session().await?;

        info!("Collecting panel data in parallel");
        let rail = async {
            match &self.rail {
                Some(client) => Some(client.fetch_line_status().await),
                None => None,
            }
        };
        let (congestion_by_zone, bus_speed, rail_status) =
            tokio::join!(self.routes.fetch_congestion(), self.bus.fetch_bus_speed(), rail);
        info!("All panel data collected");

        let timestamp = Utc::now();
        Ok(PanelSnapshot {
            congestion_by_zone,
            bus_speed,
            vehicle_restriction: current_restriction(timestamp),
            rail_status,
            timestamp,
        })
    }
}
