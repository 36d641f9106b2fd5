use std::path::PathBuf;

use anyhow::{Result, bail};
use chrono::{Local, NaiveDate};
use clap::Parser;

use crate::features::EngineConfig;
use crate::rolling::{DEFAULT_MIN_PERIODS, DEFAULT_WINDOW, WindowSpec};
use crate::sources::{
    DEFAULT_FIXTURES_BASE_URL, DEFAULT_HISTORY_URL, DEFAULT_TIMEOUT_SECS, SourceLocation,
    fixtures_url,
};

/// Fluffy Chips daily fixture projector
#[derive(Parser, Debug, Clone)]
#[command(name = "fluffy_chips", version, about)]
pub struct Settings {
    /// Analysis date (YYYY-MM-DD); history on or after it is ignored
    #[arg(long, env = "FLUFFY_DATE")]
    pub date: Option<NaiveDate>,

    /// Historical results CSV URL
    #[arg(long, env = "FLUFFY_HISTORY_URL", default_value = DEFAULT_HISTORY_URL)]
    pub history_url: String,

    /// Base URL of the daily fixture CSVs
    #[arg(long, env = "FLUFFY_FIXTURES_BASE_URL", default_value = DEFAULT_FIXTURES_BASE_URL)]
    pub fixtures_base_url: String,

    /// Read history from a local CSV instead of the URL
    #[arg(long, env = "FLUFFY_HISTORY_FILE")]
    pub history_file: Option<PathBuf>,

    /// Read fixtures from a local CSV instead of the URL
    #[arg(long, env = "FLUFFY_FIXTURES_FILE")]
    pub fixtures_file: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[arg(long, env = "FLUFFY_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Rolling window length
    #[arg(long, env = "FLUFFY_WINDOW", default_value_t = DEFAULT_WINDOW)]
    pub window: usize,

    /// Minimum valid observations before a rolling value is emitted
    #[arg(long, env = "FLUFFY_MIN_PERIODS", default_value_t = DEFAULT_MIN_PERIODS)]
    pub min_periods: usize,

    /// Write the projected fixtures and screens to this XLSX workbook
    #[arg(long, env = "FLUFFY_XLSX")]
    pub xlsx: Option<PathBuf>,

    /// Print the projection as JSON on stdout
    #[arg(long, env = "FLUFFY_JSON", default_value_t = false)]
    pub json: bool,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.window == 0 {
            bail!("window must be at least 1");
        }
        if self.min_periods == 0 || self.min_periods > self.window {
            bail!(
                "min periods must be between 1 and the window length ({})",
                self.window
            );
        }
        if self.timeout_secs == 0 {
            bail!("timeout must be at least one second");
        }
        Ok(())
    }

    pub fn analysis_date(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            window: WindowSpec::new(self.window, self.min_periods),
            ..EngineConfig::default()
        }
    }

    pub fn history_location(&self) -> SourceLocation {
        match &self.history_file {
            Some(path) => SourceLocation::File(path.display().to_string()),
            None => SourceLocation::Url(self.history_url.clone()),
        }
    }

    pub fn fixtures_location(&self) -> SourceLocation {
        match &self.fixtures_file {
            Some(path) => SourceLocation::File(path.display().to_string()),
            None => SourceLocation::Url(fixtures_url(&self.fixtures_base_url, self.analysis_date())),
        }
    }
}
