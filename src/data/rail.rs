//! Metro and train line status client
//!
//! Fetches the public status feed and maps numeric line codes to the line
//! names riders know. Failures produce an empty list.

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use serde_json::Value;
use tracing::{error, info, warn};

use super::RailLineStatus;

/// Base URL for the status feed
pub const RAIL_FEED_URL: &str = "https://www.diretodostrens.com.br/api/status";

/// The feed rejects requests without a browser user agent
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Errors that can occur when fetching line status
#[derive(Debug, Error)]
pub enum RailError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Line code as published by the feed, either numeric or textual
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LineCode {
    Number(u64),
    Text(String),
}

impl LineCode {
    fn as_string(&self) -> String {
        match self {
            LineCode::Number(n) => n.to_string(),
            LineCode::Text(s) => s.trim().to_string(),
        }
    }
}

/// A single record from the feed
#[derive(Debug, Deserialize)]
struct StatusRecord {
    #[serde(default, alias = "codigo")]
    line: Option<LineCode>,
    #[serde(default, alias = "situacao")]
    status: Option<String>,
}

/// Rider-facing name for a line code
pub fn line_label(code: &str) -> String {
    let label = match code {
        "1" => "Azul",
        "2" => "Verde",
        "3" => "Vermelha",
        "4" => "Amarela",
        "5" => "Lilás",
        "7" => "Rubi",
        "8" => "Diamante",
        "9" => "Esmeralda",
        "10" => "Turquesa",
        "11" => "Coral",
        "12" => "Safira",
        "13" => "Jade",
        "15" => "Prata",
        _ => return format!("Line {}", code),
    };
    label.to_string()
}

/// Client for the metro/train status feed
#[derive(Debug, Clone)]
pub struct RailStatusClient {
    http_client: Client,
    base_url: String,
}

impl RailStatusClient {
    pub fn new(http_client: Client, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
        }
    }

    /// Fetches line statuses, returning an empty list on any failure
    pub async fn fetch_line_status(&self) -> Vec<RailLineStatus> {
        info!("Fetching metro/train line status");

        match self.fetch_from_feed().await {
            Ok(lines) => {
                info!("Line status received for {} lines", lines.len());
                lines
            }
            Err(e) => {
                error!("Failed to fetch metro/train line status: {}", e);
                Vec::new()
            }
        }
    }

    async fn fetch_from_feed(&self) -> Result<Vec<RailLineStatus>, RailError> {
        let records = self
            .http_client
            .get(&self.base_url)
            .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Value>>()
            .await?;

        Ok(parse_records(records))
    }
}

/// Names each record and drops the malformed ones and those without a status
fn parse_records(records: Vec<Value>) -> Vec<RailLineStatus> {
    records
        .into_iter()
        .filter_map(|value| {
            let record: StatusRecord = match serde_json::from_value(value) {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping malformed line status record: {}", e);
                    return None;
                }
            };
            let status = record.status.filter(|s| !s.trim().is_empty())?;
            let code = record
                .line
                .map(|code| code.as_string())
                .unwrap_or_else(|| "?".to_string());
            Some(RailLineStatus {
                name: format!("{}-{}", code, line_label(&code)),
                status_description: status,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Vec<RailLineStatus> {
        parse_records(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_known_line_labels() {
        assert_eq!(line_label("1"), "Azul");
        assert_eq!(line_label("5"), "Lilás");
        assert_eq!(line_label("15"), "Prata");
    }

    #[test]
    fn test_unknown_line_falls_back() {
        assert_eq!(line_label("6"), "Line 6");
        assert_eq!(line_label("17"), "Line 17");
    }

    #[test]
    fn test_parse_english_fields() {
        let lines = parse(r#"[{"line": "4", "status": "Operação Normal"}]"#);
        assert_eq!(
            lines,
            vec![RailLineStatus {
                name: "4-Amarela".to_string(),
                status_description: "Operação Normal".to_string(),
            }]
        );
    }

    #[test]
    fn test_parse_portuguese_fields_and_numeric_code() {
        let lines = parse(r#"[{"codigo": 11, "situacao": "Velocidade Reduzida"}]"#);
        assert_eq!(lines[0].name, "11-Coral");
        assert_eq!(lines[0].status_description, "Velocidade Reduzida");
    }

    #[test]
    fn test_unmapped_code_uses_generic_label() {
        let lines = parse(r#"[{"line": "17", "status": "Operação Normal"}]"#);
        assert_eq!(lines[0].name, "17-Line 17");
    }

    #[test]
    fn test_records_without_status_are_dropped() {
        let lines = parse(
            r#"[
                {"line": "1", "status": "Operação Normal"},
                {"line": "2"},
                {"line": "3", "status": ""},
                {"line": "4", "status": null}
            ]"#,
        );
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].name, "1-Azul");
    }

    #[test]
    fn test_malformed_records_are_skipped_individually() {
        let lines = parse(
            r#"[
                {"codigo": "1", "situacao": {"texto": "Operação Normal"}},
                {"codigo": "2", "situacao": 3},
                {"codigo": true, "situacao": "Paralisada"},
                "not a record",
                {"codigo": "5", "situacao": "Operação Normal"}
            ]"#,
        );
        assert_eq!(
            lines,
            vec![RailLineStatus {
                name: "5-Lilás".to_string(),
                status_description: "Operação Normal".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_unreachable_feed_yields_empty_list() {
        let client = RailStatusClient::new(Client::new(), "http://127.0.0.1:9/api/status");
        assert!(client.fetch_line_status().await.is_empty());
    }
}
