//! Integration tests for command-line handling
//!
//! Tests flag parsing and startup failures of the transit-panel binary.

use std::process::Command;

/// Helper to run the binary with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_transit-panel"))
        .args(args)
        .env_remove("TRANSIT_PANEL_BIND")
        .env_remove("RAIL_FEED_URL")
        .output()
        .expect("Failed to execute transit-panel")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("transit-panel"), "Help should mention transit-panel");
    assert!(stdout.contains("--panel-ttl-secs"), "Help should mention the cache TTL flag");
    assert!(stdout.contains("--no-rail-status"), "Help should mention the rail flag");
}

#[test]
fn test_help_hides_secret_values() {
    let output = Command::new(env!("CARGO_BIN_EXE_transit-panel"))
        .arg("--help")
        .env("SPTRANS_TOKEN", "super-secret-token")
        .output()
        .expect("Failed to execute transit-panel");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("super-secret-token"));
}

#[test]
fn test_invalid_bind_address_fails() {
    let output = run_cli(&["--bind", "not-an-address"]);
    assert!(!output.status.success(), "Expected invalid bind to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("invalid") || stderr.contains("Invalid"),
        "Should print error message about the bind address: {}",
        stderr
    );
}

#[test]
fn test_invalid_feed_url_fails_before_binding() {
    let output = run_cli(&["--rail-feed-url", "not a url", "--bind", "127.0.0.1:0"]);
    assert!(!output.status.success(), "Expected invalid URL to fail");
    let combined = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(
        combined.contains("Invalid URL for rail feed"),
        "Should report the bad URL: {}",
        combined
    );
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use transit_panel::cli::{Cli, Config};

    #[test]
    fn test_cli_transit_token_flag() {
        let cli = Cli::parse_from(["transit-panel", "--transit-token", "abc"]);
        assert_eq!(cli.transit_token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_cli_custom_upstream_urls() {
        let cli = Cli::parse_from([
            "transit-panel",
            "--transit-api-url",
            "http://localhost:1/v2.1",
            "--routes-api-url",
            "http://localhost:1/routes",
            "--rail-feed-url",
            "http://localhost:1/rail",
        ]);
        let config = Config::from_cli(cli).unwrap();
        assert_eq!(config.transit_api_url, "http://localhost:1/v2.1");
        assert_eq!(config.routes_api_url, "http://localhost:1/routes");
        assert_eq!(config.rail_feed_url, "http://localhost:1/rail");
    }

    #[test]
    fn test_config_rail_status_on_by_default() {
        let cli = Cli::parse_from(["transit-panel"]);
        let config = Config::from_cli(cli).unwrap();
        assert!(config.include_rail_status);
    }

    #[test]
    fn test_config_zero_ttl_allowed() {
        let cli = Cli::parse_from(["transit-panel", "--panel-ttl-secs", "0"]);
        let config = Config::from_cli(cli).unwrap();
        assert_eq!(config.panel_ttl_secs, 0);
    }

    #[test]
    fn test_negative_ttl_rejected() {
        assert!(Cli::try_parse_from(["transit-panel", "--panel-ttl-secs", "-1"]).is_err());
    }
}
