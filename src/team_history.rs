use std::collections::HashMap;

use serde::Serialize;

use crate::records::{MatchRecord, Role};

pub const DEFAULT_RECENT: usize = 5;
pub const SIMILAR_ODDS_MARGIN: f64 = 0.10;
const ROUT_MARGIN: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreFrequency {
    pub score: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreSummary {
    pub team: String,
    pub role: Role,
    pub matches: usize,
    pub frequencies: Vec<ScoreFrequency>,
    pub routs: Vec<MatchRecord>,
}

/// Same-venue meetings of `home` against `away`, newest first.
pub fn head_to_head(history: &[MatchRecord], home: &str, away: &str) -> Vec<MatchRecord> {
    newest_first(
        history
            .iter()
            .filter(|m| m.home_team == home && m.away_team == away),
    )
}

pub fn recent_matches(
    history: &[MatchRecord],
    team: &str,
    role: Role,
    limit: usize,
) -> Vec<MatchRecord> {
    let mut rows = newest_first(history.iter().filter(|m| m.team(role) == team));
    rows.truncate(limit);
    rows
}

/// Past meetings of the pairing whose home and away odds sit within
/// `margin` of the given odds.
pub fn similar_odds_matches(
    history: &[MatchRecord],
    home: &str,
    away: &str,
    odd_home: f64,
    odd_away: f64,
    margin: f64,
) -> Vec<MatchRecord> {
    let near = |odd: Option<f64>, target: f64| {
        odd.is_some_and(|o| o >= target - margin && o <= target + margin)
    };
    newest_first(history.iter().filter(|m| {
        m.home_team == home
            && m.away_team == away
            && near(m.odds.home_win, odd_home)
            && near(m.odds.away_win, odd_away)
    }))
}

/// Final-score frequencies ("HxA", home goals first) of `team` in `role`,
/// most frequent first, plus the routs (margin of four or more).
pub fn score_summary(history: &[MatchRecord], team: &str, role: Role) -> ScoreSummary {
    let games: Vec<&MatchRecord> = history.iter().filter(|m| m.team(role) == team).collect();

    let mut counts: HashMap<String, usize> = HashMap::new();
    for m in &games {
        *counts.entry(m.score_label()).or_insert(0) += 1;
    }
    let mut frequencies: Vec<ScoreFrequency> = counts
        .into_iter()
        .map(|(score, count)| ScoreFrequency { score, count })
        .collect();
    frequencies.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.score.cmp(&b.score)));

    let routs = games
        .iter()
        .filter(|m| m.ft_goals_home.abs_diff(m.ft_goals_away) >= ROUT_MARGIN)
        .map(|m| (*m).clone())
        .collect();

    ScoreSummary {
        team: team.to_string(),
        role,
        matches: games.len(),
        frequencies,
        routs,
    }
}

fn newest_first<'a>(rows: impl Iterator<Item = &'a MatchRecord>) -> Vec<MatchRecord> {
    let mut out: Vec<MatchRecord> = rows.cloned().collect();
    out.sort_by(|a, b| b.date.cmp(&a.date));
    out
}
