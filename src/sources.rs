use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use tracing::{info, warn};

use crate::error::SourceError;
use crate::records::{Fixture, LoadedTable, MatchRecord, parse_fixtures_csv, parse_history_csv};

pub const DEFAULT_HISTORY_URL: &str = "https://raw.githubusercontent.com/RedLegacy227/base_de_dados_fluffy_chips/refs/heads/main/fluffy_chips_2018_2024.csv";
pub const DEFAULT_FIXTURES_BASE_URL: &str =
    "https://raw.githubusercontent.com/RedLegacy227/df_jogos_do_dia/refs/heads/main";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Where a source CSV comes from. Local files win over URLs when both are
/// configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Url(String),
    File(String),
}

impl SourceLocation {
    pub fn describe(&self) -> &str {
        match self {
            SourceLocation::Url(url) => url,
            SourceLocation::File(path) => path,
        }
    }
}

pub fn fixtures_url(base_url: &str, date: NaiveDate) -> String {
    format!(
        "{}/df_jogos_do_dia_{}.csv",
        base_url.trim_end_matches('/'),
        date.format("%Y-%m-%d")
    )
}

pub fn http_client(timeout_secs: u64) -> Result<&'static Client, SourceError> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .map_err(|err| SourceError::Fetch {
                url: String::new(),
                reason: format!("failed to build http client: {err}"),
            })
    })
}

pub fn fetch_text(client: &Client, url: &str) -> Result<String, SourceError> {
    let fetch_err = |reason: String| SourceError::Fetch {
        url: url.to_string(),
        reason,
    };
    let resp = client
        .get(url)
        .header(USER_AGENT, "Mozilla/5.0")
        .send()
        .map_err(|err| fetch_err(format!("request failed: {err}")))?;
    let status = resp.status();
    let body = resp
        .text()
        .map_err(|err| fetch_err(format!("failed reading body: {err}")))?;
    if !status.is_success() {
        return Err(fetch_err(format!("http {status}")));
    }
    Ok(body)
}

pub fn read_text(path: &Path) -> Result<String, SourceError> {
    fs::read_to_string(path).map_err(|err| SourceError::Read {
        path: path.display().to_string(),
        reason: err.to_string(),
    })
}

fn load_raw(location: &SourceLocation, timeout_secs: u64) -> Result<String, SourceError> {
    match location {
        SourceLocation::File(path) => read_text(Path::new(path)),
        SourceLocation::Url(url) => fetch_text(http_client(timeout_secs)?, url),
    }
}

pub fn load_history(
    location: &SourceLocation,
    timeout_secs: u64,
) -> Result<LoadedTable<MatchRecord>, SourceError> {
    let raw = load_raw(location, timeout_secs)?;
    let table = parse_history_csv(&raw)?;
    info!(
        source = location.describe(),
        rows = table.rows.len(),
        skipped = table.skipped,
        "history loaded"
    );
    Ok(table)
}

pub fn load_fixtures(
    location: &SourceLocation,
    timeout_secs: u64,
) -> Result<LoadedTable<Fixture>, SourceError> {
    let raw = load_raw(location, timeout_secs)?;
    let table = parse_fixtures_csv(&raw)?;
    info!(
        source = location.describe(),
        rows = table.rows.len(),
        skipped = table.skipped,
        "fixtures loaded"
    );
    Ok(table)
}

/// A source that cannot be loaded becomes an empty table plus the message
/// that explains why.
pub fn load_history_or_empty(
    location: &SourceLocation,
    timeout_secs: u64,
) -> (LoadedTable<MatchRecord>, Option<String>) {
    or_empty(load_history(location, timeout_secs), "history")
}

pub fn load_fixtures_or_empty(
    location: &SourceLocation,
    timeout_secs: u64,
) -> (LoadedTable<Fixture>, Option<String>) {
    or_empty(load_fixtures(location, timeout_secs), "fixtures")
}

fn or_empty<T>(
    result: Result<LoadedTable<T>, SourceError>,
    what: &str,
) -> (LoadedTable<T>, Option<String>) {
    match result {
        Ok(table) => (table, None),
        Err(err) => {
            warn!(source = what, error = %err, "source unavailable, continuing with no rows");
            (LoadedTable::empty(), Some(err.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_url_embeds_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(
            fixtures_url("https://host/base/", date),
            "https://host/base/df_jogos_do_dia_2024-03-09.csv"
        );
    }

    #[test]
    fn missing_file_degrades_to_empty_table() {
        let location = SourceLocation::File("/nonexistent/fluffy/history.csv".to_string());
        let (table, warning) = load_history_or_empty(&location, 1);
        assert!(table.rows.is_empty());
        assert!(warning.unwrap().contains("/nonexistent/fluffy/history.csv"));
    }
}
