use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;

use crate::error::SourceError;
use crate::odds::{MarketOdds, valid_odd};

const HISTORY_SOURCE: &str = "historical";
const FIXTURE_SOURCE: &str = "fixtures";

const FIRST_HALF_END: u32 = 45;
const MATCH_END: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Role {
    Home,
    Away,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::Home => "home",
            Role::Away => "away",
        }
    }
}

/// One completed match from the historical table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRecord {
    pub date: NaiveDate,
    pub league: String,
    pub season: String,
    pub home_team: String,
    pub away_team: String,
    pub ht_goals_home: u32,
    pub ht_goals_away: u32,
    pub ft_goals_home: u32,
    pub ft_goals_away: u32,
    pub odds: MarketOdds,
    pub goal_minutes_home: String,
    pub goal_minutes_away: String,
}

impl MatchRecord {
    pub fn team(&self, role: Role) -> &str {
        match role {
            Role::Home => &self.home_team,
            Role::Away => &self.away_team,
        }
    }

    pub fn score_label(&self) -> String {
        format!("{}x{}", self.ft_goals_home, self.ft_goals_away)
    }
}

/// One upcoming match from the daily fixture table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Fixture {
    pub league: String,
    pub date: Option<NaiveDate>,
    pub time: String,
    pub home_team: String,
    pub away_team: String,
    pub odds: MarketOdds,
}

#[derive(Debug, Clone, Default)]
pub struct LoadedTable<T> {
    pub rows: Vec<T>,
    pub skipped: usize,
}

impl<T> LoadedTable<T> {
    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            skipped: 0,
        }
    }
}

/// First-half boundary used by the "scored first in the 1st half" counters.
pub fn is_first_half(minute: u32) -> bool {
    minute <= FIRST_HALF_END
}

/// First scored minute from a textual list such as `"[23, 67]"` or `"['45+2']"`.
/// Only the first entry is considered; an entry outside [0, 90] or one that
/// does not parse means there is no valid first goal.
pub fn first_goal_minute(raw: &str) -> Option<u32> {
    let inner = raw
        .trim()
        .trim_start_matches(['[', '('])
        .trim_end_matches([']', ')']);
    let first = inner
        .split(',')
        .next()?
        .trim()
        .trim_matches(|c| c == '\'' || c == '"')
        .trim();
    if first.is_empty() {
        return None;
    }
    let base = first.split('+').next()?.trim();
    let minute = base.parse::<f64>().ok()?;
    if !minute.is_finite() || !(0.0..=MATCH_END).contains(&minute) {
        return None;
    }
    Some(minute as u32)
}

pub fn parse_history_csv(raw: &str) -> Result<LoadedTable<MatchRecord>, SourceError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(raw.as_bytes());
    let headers = reader.headers().map_err(|err| decode(HISTORY_SOURCE, err))?;
    let columns = HistoryColumns::resolve(&ColumnIndex::new(headers))?;

    let mut table = LoadedTable::empty();
    for record in reader.records() {
        let record = record.map_err(|err| decode(HISTORY_SOURCE, err))?;
        match columns.read(&record) {
            Some(row) => table.rows.push(row),
            None => table.skipped += 1,
        }
    }
    Ok(table)
}

pub fn parse_fixtures_csv(raw: &str) -> Result<LoadedTable<Fixture>, SourceError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(raw.as_bytes());
    let headers = reader.headers().map_err(|err| decode(FIXTURE_SOURCE, err))?;
    let columns = FixtureColumns::resolve(&ColumnIndex::new(headers))?;

    let mut table = LoadedTable::empty();
    for record in reader.records() {
        let record = record.map_err(|err| decode(FIXTURE_SOURCE, err))?;
        if record.iter().all(|cell| cell.is_empty()) {
            table.skipped += 1;
            continue;
        }
        table.rows.push(columns.read(&record));
    }
    Ok(table)
}

/// Sorts by date (stable, so same-day rows keep file order) and drops
/// repeated (date, home, away) rows.
pub fn prepare_history(mut rows: Vec<MatchRecord>) -> Vec<MatchRecord> {
    rows.sort_by_key(|m| m.date);
    let mut seen = HashSet::new();
    rows.retain(|m| seen.insert((m.date, m.home_team.clone(), m.away_team.clone())));
    rows
}

/// The slice the engine is allowed to see for an analysis date.
pub fn history_before(rows: &[MatchRecord], analysis_date: NaiveDate) -> Vec<MatchRecord> {
    rows.iter()
        .filter(|m| m.date < analysis_date)
        .cloned()
        .collect()
}

struct ColumnIndex {
    by_name: HashMap<String, usize>,
}

impl ColumnIndex {
    fn new(headers: &StringRecord) -> Self {
        let by_name = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.trim().to_string(), idx))
            .collect();
        Self { by_name }
    }

    fn get(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    fn first_of(&self, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|name| self.get(name))
    }
}

struct MissingTracker {
    missing: Vec<String>,
}

impl MissingTracker {
    fn new() -> Self {
        Self {
            missing: Vec::new(),
        }
    }

    fn require(&mut self, index: &ColumnIndex, names: &[&str]) -> usize {
        match index.first_of(names) {
            Some(idx) => idx,
            None => {
                self.missing.push(names.join("|"));
                usize::MAX
            }
        }
    }

    fn finish(self, source_name: &'static str) -> Result<(), SourceError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(SourceError::MissingColumns {
                source_name,
                missing: self.missing,
            })
        }
    }
}

struct OddsColumns {
    home_win: usize,
    draw: usize,
    away_win: usize,
    over_05_ht: usize,
    under_05_ht: usize,
    over_15_ft: usize,
    under_15_ft: usize,
    over_25_ft: usize,
    under_25_ft: usize,
    btts_yes: usize,
    btts_no: usize,
}

impl OddsColumns {
    /// Historical naming first, fixture naming as the fallback.
    fn historical(index: &ColumnIndex, tracker: &mut MissingTracker) -> Self {
        Self {
            home_win: tracker.require(index, &["FT_Odd_H"]),
            draw: tracker.require(index, &["FT_Odd_D"]),
            away_win: tracker.require(index, &["FT_Odd_A"]),
            over_05_ht: tracker.require(index, &["HT_Odd_Over05", "HT_Odd_Ov05"]),
            under_05_ht: tracker.require(index, &["HT_Odd_Under05", "HT_Odd_Un05"]),
            over_15_ft: tracker.require(index, &["FT_Odd_Over15", "FT_Odd_Ov15"]),
            under_15_ft: tracker.require(index, &["FT_Odd_Under15", "FT_Odd_Un15"]),
            over_25_ft: tracker.require(index, &["FT_Odd_Over25", "FT_Odd_Ov25"]),
            under_25_ft: tracker.require(index, &["FT_Odd_Under25", "FT_Odd_Un25"]),
            btts_yes: tracker.require(index, &["Odd_BTTS_Yes", "FT_Odd_BTTS_Y"]),
            btts_no: tracker.require(index, &["Odd_BTTS_No", "FT_Odd_BTTS_N"]),
        }
    }

    /// Fixture naming first, historical naming as the fallback.
    fn fixture(index: &ColumnIndex, tracker: &mut MissingTracker) -> Self {
        Self {
            home_win: tracker.require(index, &["FT_Odd_H"]),
            draw: tracker.require(index, &["FT_Odd_D"]),
            away_win: tracker.require(index, &["FT_Odd_A"]),
            over_05_ht: tracker.require(index, &["HT_Odd_Ov05", "HT_Odd_Over05"]),
            under_05_ht: tracker.require(index, &["HT_Odd_Un05", "HT_Odd_Under05"]),
            over_15_ft: tracker.require(index, &["FT_Odd_Ov15", "FT_Odd_Over15"]),
            under_15_ft: tracker.require(index, &["FT_Odd_Un15", "FT_Odd_Under15"]),
            over_25_ft: tracker.require(index, &["FT_Odd_Ov25", "FT_Odd_Over25"]),
            under_25_ft: tracker.require(index, &["FT_Odd_Un25", "FT_Odd_Under25"]),
            btts_yes: tracker.require(index, &["FT_Odd_BTTS_Y", "Odd_BTTS_Yes"]),
            btts_no: tracker.require(index, &["FT_Odd_BTTS_N", "Odd_BTTS_No"]),
        }
    }

    fn read(&self, record: &StringRecord) -> MarketOdds {
        let odd = |idx: usize| parse_odd(cell(record, idx));
        MarketOdds {
            home_win: odd(self.home_win),
            draw: odd(self.draw),
            away_win: odd(self.away_win),
            over_05_ht: odd(self.over_05_ht),
            under_05_ht: odd(self.under_05_ht),
            over_15_ft: odd(self.over_15_ft),
            under_15_ft: odd(self.under_15_ft),
            over_25_ft: odd(self.over_25_ft),
            under_25_ft: odd(self.under_25_ft),
            btts_yes: odd(self.btts_yes),
            btts_no: odd(self.btts_no),
        }
    }
}

struct HistoryColumns {
    date: usize,
    league: usize,
    season: usize,
    home: usize,
    away: usize,
    ht_goals_home: usize,
    ht_goals_away: usize,
    ft_goals_home: usize,
    ft_goals_away: usize,
    odds: OddsColumns,
    goal_minutes_home: usize,
    goal_minutes_away: usize,
}

impl HistoryColumns {
    fn resolve(index: &ColumnIndex) -> Result<Self, SourceError> {
        let mut tracker = MissingTracker::new();
        let columns = Self {
            date: tracker.require(index, &["Date"]),
            league: tracker.require(index, &["League"]),
            season: tracker.require(index, &["Season"]),
            home: tracker.require(index, &["Home"]),
            away: tracker.require(index, &["Away"]),
            ht_goals_home: tracker.require(index, &["HT_Goals_H"]),
            ht_goals_away: tracker.require(index, &["HT_Goals_A"]),
            ft_goals_home: tracker.require(index, &["FT_Goals_H"]),
            ft_goals_away: tracker.require(index, &["FT_Goals_A"]),
            odds: OddsColumns::historical(index, &mut tracker),
            goal_minutes_home: tracker.require(index, &["Goals_Minutes_Home"]),
            goal_minutes_away: tracker.require(index, &["Goals_Minutes_Away"]),
        };
        tracker.finish(HISTORY_SOURCE)?;
        Ok(columns)
    }

    fn read(&self, record: &StringRecord) -> Option<MatchRecord> {
        let date = parse_date(cell(record, self.date))?;
        let home_team = cell(record, self.home).to_string();
        let away_team = cell(record, self.away).to_string();
        if home_team.is_empty() || away_team.is_empty() {
            return None;
        }
        Some(MatchRecord {
            date,
            league: cell(record, self.league).to_string(),
            season: cell(record, self.season).to_string(),
            home_team,
            away_team,
            ht_goals_home: parse_goals(cell(record, self.ht_goals_home)),
            ht_goals_away: parse_goals(cell(record, self.ht_goals_away)),
            ft_goals_home: parse_goals(cell(record, self.ft_goals_home)),
            ft_goals_away: parse_goals(cell(record, self.ft_goals_away)),
            odds: self.odds.read(record),
            goal_minutes_home: cell(record, self.goal_minutes_home).to_string(),
            goal_minutes_away: cell(record, self.goal_minutes_away).to_string(),
        })
    }
}

struct FixtureColumns {
    league: usize,
    date: usize,
    time: usize,
    home: usize,
    away: usize,
    odds: OddsColumns,
}

impl FixtureColumns {
    fn resolve(index: &ColumnIndex) -> Result<Self, SourceError> {
        let mut tracker = MissingTracker::new();
        let columns = Self {
            league: tracker.require(index, &["League"]),
            date: tracker.require(index, &["Date"]),
            time: tracker.require(index, &["Time"]),
            home: tracker.require(index, &["Home"]),
            away: tracker.require(index, &["Away"]),
            odds: OddsColumns::fixture(index, &mut tracker),
        };
        tracker.finish(FIXTURE_SOURCE)?;
        Ok(columns)
    }

    fn read(&self, record: &StringRecord) -> Fixture {
        Fixture {
            league: cell(record, self.league).to_string(),
            date: parse_date(cell(record, self.date)),
            time: cell(record, self.time).to_string(),
            home_team: cell(record, self.home).to_string(),
            away_team: cell(record, self.away).to_string(),
            odds: self.odds.read(record),
        }
    }
}

fn cell(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or_default().trim()
}

fn decode(source_name: &'static str, err: csv::Error) -> SourceError {
    SourceError::Decode {
        source_name,
        reason: err.to_string(),
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok())
}

fn parse_odd(raw: &str) -> Option<f64> {
    let value = raw.replace(',', ".").parse::<f64>().ok();
    valid_odd(value)
}

fn parse_goals(raw: &str) -> u32 {
    raw.parse::<f64>()
        .ok()
        .filter(|g| g.is_finite() && *g > 0.0)
        .map(|g| g as u32)
        .unwrap_or(0)
}
