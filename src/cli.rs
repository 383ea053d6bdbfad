//! Command-line and environment configuration for the transit panel
//!
//! Every option can be given as a flag or through its environment variable.
//! Credentials are optional: the service starts without them and degrades
//! the features that need them.

use std::net::SocketAddr;

use clap::Parser;
use thiserror::Error;
use tracing::{info, warn};

use crate::data::rail::RAIL_FEED_URL;
use crate::data::session::OLHO_VIVO_BASE_URL;
use crate::data::traffic::ROUTES_API_URL;

/// Default panel cache lifetime in seconds
pub const DEFAULT_PANEL_TTL_SECS: u64 = 180;

/// Error types for configuration parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// A URL option could not be parsed
    #[error("Invalid URL for {name}: '{value}' ({source})")]
    InvalidUrl {
        name: &'static str,
        value: String,
        source: url::ParseError,
    },
}

/// Transit panel - São Paulo traffic and transit aggregation service
#[derive(Parser, Debug)]
#[command(name = "transit-panel")]
#[command(about = "Aggregates São Paulo traffic, bus, rail and rodízio data over HTTP")]
#[command(version)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, env = "TRANSIT_PANEL_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Base URL of the Olho Vivo transit API
    #[arg(long, env = "TRANSIT_API_URL", default_value = OLHO_VIVO_BASE_URL)]
    pub transit_api_url: String,

    /// Olho Vivo API token
    #[arg(long, env = "SPTRANS_TOKEN", hide_env_values = true)]
    pub transit_token: Option<String>,

    /// computeRoutes endpoint of the routing API
    #[arg(long, env = "ROUTES_API_URL", default_value = ROUTES_API_URL)]
    pub routes_api_url: String,

    /// Routing API key
    #[arg(long, env = "MAPS_API_KEY", hide_env_values = true)]
    pub routes_api_key: Option<String>,

    /// Metro/train status feed URL
    #[arg(long, env = "RAIL_FEED_URL", default_value = RAIL_FEED_URL)]
    pub rail_feed_url: String,

    /// Redis URL for the vote counters; counters stay in memory when unset
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// Seconds a panel snapshot is served from cache
    #[arg(long, env = "PANEL_TTL_SECS", default_value_t = DEFAULT_PANEL_TTL_SECS)]
    pub panel_ttl_secs: u64,

    /// Leave metro/train status out of the panel
    #[arg(long, env = "PANEL_WITHOUT_RAIL")]
    pub no_rail_status: bool,
}

/// Validated service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub bind: SocketAddr,
    pub transit_api_url: String,
    pub transit_token: Option<String>,
    pub routes_api_url: String,
    pub routes_api_key: Option<String>,
    pub rail_feed_url: String,
    pub redis_url: Option<String>,
    pub panel_ttl_secs: u64,
    /// Whether panel snapshots carry the `railStatus` field
    pub include_rail_status: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            transit_api_url: OLHO_VIVO_BASE_URL.to_string(),
            transit_token: None,
            routes_api_url: ROUTES_API_URL.to_string(),
            routes_api_key: None,
            rail_feed_url: RAIL_FEED_URL.to_string(),
            redis_url: None,
            panel_ttl_secs: DEFAULT_PANEL_TTL_SECS,
            include_rail_status: true,
        }
    }
}

fn check_url(name: &'static str, value: &str) -> Result<(), CliError> {
    url::Url::parse(value).map(|_| ()).map_err(|source| CliError::InvalidUrl {
        name,
        value: value.to_string(),
        source,
    })
}

/// Treats blank values as unset
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Creates a Config from parsed CLI arguments
    ///
    /// # Returns
    /// * `Ok(Config)` with validated URLs
    /// * `Err(CliError)` if a URL option is malformed
    pub fn from_cli(cli: Cli) -> Result<Self, CliError> {
        check_url("transit API", &cli.transit_api_url)?;
        check_url("routing API", &cli.routes_api_url)?;
        check_url("rail feed", &cli.rail_feed_url)?;

        let config = Config {
            bind: cli.bind,
            transit_api_url: cli.transit_api_url,
            transit_token: non_blank(cli.transit_token),
            routes_api_url: cli.routes_api_url,
            routes_api_key: non_blank(cli.routes_api_key),
            rail_feed_url: cli.rail_feed_url,
            redis_url: non_blank(cli.redis_url),
            panel_ttl_secs: cli.panel_ttl_secs,
            include_rail_status: !cli.no_rail_status,
        };
        config.log_summary();
        Ok(config)
    }

    fn log_summary(&self) {
        if self.transit_token.is_none() {
            warn!("SPTRANS_TOKEN not set, transit API calls will fail");
        }
        if self.routes_api_key.is_none() {
            warn!("MAPS_API_KEY not set, congestion will report 0 km");
        }
        if self.redis_url.is_none() {
            warn!("REDIS_URL not set, votes are kept in memory");
        }
        info!(
            "Panel cache TTL {}s, rail status {}",
            self.panel_ttl_secs,
            if self.include_rail_status { "on" } else { "off" }
        );
    }
}
