//! Core data models for the transit panel
//!
//! This module contains the types that make up a panel snapshot and the
//! clients that collect each part of it from upstream services.

pub mod bus;
pub mod corridors;
pub mod rail;
pub mod rodizio;
pub mod session;
pub mod traffic;

pub use bus::BusSpeedCollector;
pub use corridors::{all_corridors, get_corridor_by_zone};
pub use rail::{RailError, RailStatusClient};
pub use rodizio::{current_restriction, restriction_for};
pub use session::{SessionError, SessionManager};
pub use traffic::{congestion_km, RoutesClient, RoutesError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// City zone covered by one monitored corridor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    North,
    South,
    East,
    West,
    Center,
}

/// A monitored road corridor
///
/// Uses `&'static str` so the corridor table can be a static array.
#[derive(Debug, Clone, Copy)]
pub struct Corridor {
    /// Zone this corridor represents
    pub zone: Zone,
    /// Human-readable corridor name
    pub name: &'static str,
    /// Reference length of the corridor in kilometers
    pub distance_km: f64,
    /// Route origin (latitude, longitude)
    pub start: (f64, f64),
    /// Route destination (latitude, longitude)
    pub end: (f64, f64),
}

/// Congestion estimate for a single zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneCongestion {
    /// Kilometers of slow traffic (heuristic, never negative)
    pub km: u32,
}

/// A speed figure that may be unavailable
///
/// Serializes as a number, or as the string `"--"` when unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpeedReading {
    Kmh(u32),
    Unavailable(Placeholder),
}

/// The `"--"` marker used for missing figures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placeholder {
    #[serde(rename = "--")]
    Dashes,
}

impl SpeedReading {
    pub const UNAVAILABLE: SpeedReading = SpeedReading::Unavailable(Placeholder::Dashes);
}

/// Average bus speeds along the exclusive corridors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusSpeed {
    /// Downtown to suburbs
    pub inbound: SpeedReading,
    /// Suburbs to downtown
    pub outbound: SpeedReading,
}

impl BusSpeed {
    pub fn unavailable() -> Self {
        Self {
            inbound: SpeedReading::UNAVAILABLE,
            outbound: SpeedReading::UNAVAILABLE,
        }
    }
}

/// Plate restriction in force for a day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleRestriction {
    /// Weekday name in English
    pub day: String,
    /// Restricted plate final digits, or `["N/A"]` on weekends
    pub plates: Vec<String>,
}

/// Operational status of one metro/train line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RailLineStatus {
    /// Display name such as `"4-Amarela"`
    pub name: String,
    /// Status text published by the feed
    pub status_description: String,
}

/// Composed view of current transit and traffic conditions
///
/// Immutable once built; a refresh replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelSnapshot {
    pub congestion_by_zone: BTreeMap<Zone, ZoneCongestion>,
    pub bus_speed: BusSpeed,
    pub vehicle_restriction: VehicleRestriction,
    /// Omitted when the service runs without rail status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rail_status: Option<Vec<RailLineStatus>>,
    pub timestamp: DateTime<Utc>,
}
