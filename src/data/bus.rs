//! Bus corridor speed collector
//!
//! Confirms the transit session can read corridor data and reports the
//! corridor speed pair. The figures are fixed illustrative values until the
//! corridor feed exposes per-direction speeds; any failure yields `"--"`.

use std::sync::Arc;

use tracing::{error, info};

use super::{BusSpeed, SessionManager, SpeedReading};

/// Corridor listing endpoint on the transit API
const CORRIDOR_PATH: &str = "/Corredor";

/// Illustrative downtown-to-suburbs speed in km/h
const INBOUND_KMH: u32 = 18;

/// Illustrative suburbs-to-downtown speed in km/h
const OUTBOUND_KMH: u32 = 19;

/// Collects bus corridor speeds through the shared transit session
#[derive(Debug, Clone)]
pub struct BusSpeedCollector {
    session: Arc<SessionManager>,
}

impl BusSpeedCollector {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    /// Fetches the bus speed pair, absorbing every failure
    ///
    /// An unauthorized answer has already invalidated the session by the
    /// time it reaches here, so the next refresh re-authenticates.
    pub async fn fetch_bus_speed(&self) -> BusSpeed {
        info!("Fetching bus corridor speeds");

        match self.session.get(CORRIDOR_PATH, &[]).await {
            Ok(_) => {
                info!("Bus corridor data received");
                BusSpeed {
                    inbound: SpeedReading::Kmh(INBOUND_KMH),
                    outbound: SpeedReading::Kmh(OUTBOUND_KMH),
                }
            }
            Err(e) => {
                error!("Failed to fetch bus corridor speeds: {}", e);
                BusSpeed::unavailable()
            }
        }
    }
}
