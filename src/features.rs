//! Per-team, per-role rolling feature engine.
//!
//! The pipeline is a strict forward pass over the date-ordered history:
//! per-match scalars and value metrics first, then the pooled Power Ranking
//! normalisation, then one ring-buffer tracker per (team, role) that is read
//! before the current match is pushed into it.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::odds::{MarketOdds, MarketProfile, finite, ratio};
use crate::power_ranking::{self, PowerRankingInputs, PowerRankingWeights, SCALE_MAX};
use crate::records::{MatchRecord, Role, first_goal_minute, is_first_half};
use crate::rolling::{RollingStat, RollingWindow, WindowSpec};
use crate::scoring::{self, MatchRps};

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub window: WindowSpec,
    pub weights: PowerRankingWeights,
    pub scale_max: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window: WindowSpec::default(),
            weights: PowerRankingWeights::default(),
            scale_max: SCALE_MAX,
        }
    }
}

/// Form of one team in one role going into a match: every field covers
/// only matches played before it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SideForm {
    pub matches_seen: usize,
    pub points: RollingStat,
    pub points_value: RollingStat,
    pub goal_margin: RollingStat,
    pub goal_margin_value: RollingStat,
    pub goal_value_for_ht: RollingStat,
    pub goal_value_against_ht: RollingStat,
    pub goal_value_for: RollingStat,
    pub goal_value_against: RollingStat,
    pub cost_goal_for_1: RollingStat,
    pub cost_goal_against_1: RollingStat,
    pub cost_goal_for_2: RollingStat,
    pub cost_goal_against_2: RollingStat,
    pub rps_match_odds: RollingStat,
    pub rps_over_under: RollingStat,
    pub rps_btts: RollingStat,
    pub win_probability: RollingStat,
    pub power_ranking: RollingStat,
    pub first_goal_scored_minute: Option<f64>,
    pub first_goal_conceded_minute: Option<f64>,
    pub pct_scored_first: Option<f64>,
    pub pct_conceded_first: Option<f64>,
    pub pct_scored_first_ht: Option<f64>,
    pub pct_conceded_first_ht: Option<f64>,
    pub pct_btts: Option<f64>,
    pub pct_over_05_ht: Option<f64>,
    pub pct_under_05_ht: Option<f64>,
    pub pct_over_15_ht: Option<f64>,
    pub pct_under_15_ht: Option<f64>,
    pub pct_over_05_ft: Option<f64>,
    pub pct_under_05_ft: Option<f64>,
    pub pct_over_15_ft: Option<f64>,
    pub pct_under_15_ft: Option<f64>,
    pub pct_over_25_ft: Option<f64>,
    pub pct_under_25_ft: Option<f64>,
    pub pct_win_ht: Option<f64>,
    pub pct_win_ft: Option<f64>,
    pub pct_scored: Option<f64>,
    pub pct_conceded: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedFeatureRow {
    pub match_number: usize,
    pub date: NaiveDate,
    pub league: String,
    pub season: String,
    pub home_team: String,
    pub away_team: String,
    pub ft_goals_home: u32,
    pub ft_goals_away: u32,
    pub odds: MarketOdds,
    pub market: MarketProfile,
    pub power_ranking_home: Option<f64>,
    pub power_ranking_away: Option<f64>,
    pub home_form: SideForm,
    pub away_form: SideForm,
}

/// Immutable result of one engine run.
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    pub rows: Vec<DerivedFeatureRow>,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Form stored on the team's last row in `role`: the shifted rolling
    /// values of its most recent match in the slice.
    pub fn latest_form(&self, team: &str, role: Role) -> Option<&SideForm> {
        self.rows_for(team, role)
            .last()
            .map(|row| Self::form_on_row(row, role))
    }

    pub fn rows_for<'a>(
        &'a self,
        team: &str,
        role: Role,
    ) -> impl Iterator<Item = &'a DerivedFeatureRow> {
        self.rows.iter().filter(move |row| match role {
            Role::Home => row.home_team == team,
            Role::Away => row.away_team == team,
        })
    }

    /// The rolling form stored on a historical row for the side playing `role`.
    pub fn form_on_row(row: &DerivedFeatureRow, role: Role) -> &SideForm {
        match role {
            Role::Home => &row.home_form,
            Role::Away => &row.away_form,
        }
    }

    /// Distinct (team, role) groups in the table.
    pub fn team_count(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|row| {
                [
                    (row.home_team.as_str(), Role::Home),
                    (row.away_team.as_str(), Role::Away),
                ]
            })
            .collect::<HashSet<_>>()
            .len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Metric {
    Points,
    PointsValue,
    GoalMargin,
    GoalMarginValue,
    GoalValueForHt,
    GoalValueAgainstHt,
    GoalValueFor,
    GoalValueAgainst,
    CostGoalFor1,
    CostGoalAgainst1,
    CostGoalFor2,
    CostGoalAgainst2,
    RpsMatchOdds,
    RpsOverUnder,
    RpsBtts,
    WinProbability,
    PowerRanking,
    FirstGoalScoredMinute,
    FirstGoalConcededMinute,
    ScoredFirst,
    ConcededFirst,
    ScoredFirstHt,
    ConcededFirstHt,
    Btts,
    Over05Ht,
    Under05Ht,
    Over15Ht,
    Under15Ht,
    Over05Ft,
    Under05Ft,
    Over15Ft,
    Under15Ft,
    Over25Ft,
    Under25Ft,
    WinHt,
    WinFt,
    Scored,
    Conceded,
}

const METRIC_COUNT: usize = Metric::Conceded as usize + 1;

type Observation = [Option<f64>; METRIC_COUNT];

struct SideTracker {
    matches_seen: usize,
    windows: Vec<RollingWindow>,
}

impl SideTracker {
    fn new(spec: WindowSpec) -> Self {
        Self {
            matches_seen: 0,
            windows: (0..METRIC_COUNT).map(|_| RollingWindow::new(spec)).collect(),
        }
    }

    fn push(&mut self, obs: &Observation) {
        for (window, value) in self.windows.iter_mut().zip(obs.iter()) {
            window.push(*value);
        }
        self.matches_seen += 1;
    }

    fn stat(&self, metric: Metric) -> RollingStat {
        self.windows[metric as usize].stat()
    }

    fn mean(&self, metric: Metric) -> Option<f64> {
        self.windows[metric as usize].mean()
    }

    fn percent(&self, metric: Metric) -> Option<f64> {
        self.windows[metric as usize].percent()
    }

    fn form(&self) -> SideForm {
        use Metric::*;
        SideForm {
            matches_seen: self.matches_seen,
            points: self.stat(Points),
            points_value: self.stat(PointsValue),
            goal_margin: self.stat(GoalMargin),
            goal_margin_value: self.stat(GoalMarginValue),
            goal_value_for_ht: self.stat(GoalValueForHt),
            goal_value_against_ht: self.stat(GoalValueAgainstHt),
            goal_value_for: self.stat(GoalValueFor),
            goal_value_against: self.stat(GoalValueAgainst),
            cost_goal_for_1: self.stat(CostGoalFor1),
            cost_goal_against_1: self.stat(CostGoalAgainst1),
            cost_goal_for_2: self.stat(CostGoalFor2),
            cost_goal_against_2: self.stat(CostGoalAgainst2),
            rps_match_odds: self.stat(RpsMatchOdds),
            rps_over_under: self.stat(RpsOverUnder),
            rps_btts: self.stat(RpsBtts),
            win_probability: self.stat(WinProbability),
            power_ranking: self.stat(PowerRanking),
            first_goal_scored_minute: self.mean(FirstGoalScoredMinute),
            first_goal_conceded_minute: self.mean(FirstGoalConcededMinute),
            pct_scored_first: self.percent(ScoredFirst),
            pct_conceded_first: self.percent(ConcededFirst),
            pct_scored_first_ht: self.percent(ScoredFirstHt),
            pct_conceded_first_ht: self.percent(ConcededFirstHt),
            pct_btts: self.percent(Btts),
            pct_over_05_ht: self.percent(Over05Ht),
            pct_under_05_ht: self.percent(Under05Ht),
            pct_over_15_ht: self.percent(Over15Ht),
            pct_under_15_ht: self.percent(Under15Ht),
            pct_over_05_ft: self.percent(Over05Ft),
            pct_under_05_ft: self.percent(Under05Ft),
            pct_over_15_ft: self.percent(Over15Ft),
            pct_under_15_ft: self.percent(Under15Ft),
            pct_over_25_ft: self.percent(Over25Ft),
            pct_under_25_ft: self.percent(Under25Ft),
            pct_win_ht: self.percent(WinHt),
            pct_win_ft: self.percent(WinFt),
            pct_scored: self.percent(Scored),
            pct_conceded: self.percent(Conceded),
        }
    }
}

/// What one side did in one match, seen from that side.
struct SideView {
    ht_for: u32,
    ht_against: u32,
    ft_for: u32,
    ft_against: u32,
    p_own: Option<f64>,
    p_opp: Option<f64>,
    first_for: Option<u32>,
    first_against: Option<u32>,
}

struct MatchScalars {
    market: MarketProfile,
    home: Observation,
    away: Observation,
    raw_power_home: Option<f64>,
    raw_power_away: Option<f64>,
}

pub struct FeatureEngine {
    config: EngineConfig,
}

impl Default for FeatureEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl FeatureEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs the full pipeline over `history`. Rows are processed in date
    /// order (stable for same-day matches) regardless of input order.
    pub fn build(&self, history: &[MatchRecord]) -> FeatureTable {
        let mut order: Vec<usize> = (0..history.len()).collect();
        order.sort_by_key(|&idx| history[idx].date);

        let mut scalars: Vec<MatchScalars> = order
            .iter()
            .map(|&idx| self.match_scalars(&history[idx]))
            .collect();

        let raw_power: Vec<Option<f64>> = scalars
            .iter()
            .flat_map(|s| [s.raw_power_home, s.raw_power_away])
            .collect();
        let normalized = power_ranking::normalize(&raw_power, self.config.scale_max);
        for (s, pair) in scalars.iter_mut().zip(normalized.chunks(2)) {
            s.home[Metric::PowerRanking as usize] = pair[0];
            s.away[Metric::PowerRanking as usize] = pair[1];
        }

        let mut trackers: HashMap<(String, Role), SideTracker> = HashMap::new();
        let mut rows = Vec::with_capacity(history.len());
        for (position, (&idx, s)) in order.iter().zip(&scalars).enumerate() {
            let record = &history[idx];
            let home_form =
                self.read_then_push(&mut trackers, &record.home_team, Role::Home, &s.home);
            let away_form =
                self.read_then_push(&mut trackers, &record.away_team, Role::Away, &s.away);
            rows.push(DerivedFeatureRow {
                match_number: position + 1,
                date: record.date,
                league: record.league.clone(),
                season: record.season.clone(),
                home_team: record.home_team.clone(),
                away_team: record.away_team.clone(),
                ft_goals_home: record.ft_goals_home,
                ft_goals_away: record.ft_goals_away,
                odds: record.odds,
                market: s.market,
                power_ranking_home: s.home[Metric::PowerRanking as usize],
                power_ranking_away: s.away[Metric::PowerRanking as usize],
                home_form,
                away_form,
            });
        }

        debug!(
            matches = rows.len(),
            team_roles = trackers.len(),
            "feature table built"
        );
        FeatureTable { rows }
    }

    fn read_then_push(
        &self,
        trackers: &mut HashMap<(String, Role), SideTracker>,
        team: &str,
        role: Role,
        obs: &Observation,
    ) -> SideForm {
        let tracker = trackers
            .entry((team.to_string(), role))
            .or_insert_with(|| SideTracker::new(self.config.window));
        let form = tracker.form();
        tracker.push(obs);
        form
    }

    fn match_scalars(&self, record: &MatchRecord) -> MatchScalars {
        let market = MarketProfile::from_odds(&record.odds);
        let probs = market.probabilities;
        let rps = MatchRps::score(&probs, record.ft_goals_home, record.ft_goals_away);
        let first_home = first_goal_minute(&record.goal_minutes_home);
        let first_away = first_goal_minute(&record.goal_minutes_away);

        let home_view = SideView {
            ht_for: record.ht_goals_home,
            ht_against: record.ht_goals_away,
            ft_for: record.ft_goals_home,
            ft_against: record.ft_goals_away,
            p_own: probs.home_win,
            p_opp: probs.away_win,
            first_for: first_home,
            first_against: first_away,
        };
        let away_view = SideView {
            ht_for: record.ht_goals_away,
            ht_against: record.ht_goals_home,
            ft_for: record.ft_goals_away,
            ft_against: record.ft_goals_home,
            p_own: probs.away_win,
            p_opp: probs.home_win,
            first_for: first_away,
            first_against: first_home,
        };

        let weights = &self.config.weights;
        let raw_power_home = power_ranking::raw_score(&power_inputs(&home_view), weights);
        let raw_power_away = power_ranking::raw_score(&power_inputs(&away_view), weights);

        MatchScalars {
            market,
            home: observe(&home_view, &rps),
            away: observe(&away_view, &rps),
            raw_power_home,
            raw_power_away,
        }
    }
}

fn power_inputs(side: &SideView) -> PowerRankingInputs {
    PowerRankingInputs::for_side(
        (side.ht_for, side.ft_for),
        (side.ht_against, side.ft_against),
        side.p_own,
        side.p_opp,
    )
}

fn flag(value: bool) -> Option<f64> {
    Some(if value { 1.0 } else { 0.0 })
}

fn weighted(value: f64, p: Option<f64>) -> Option<f64> {
    p.and_then(|p| finite(value * p))
}

fn linear_cost(goals: f64, p: Option<f64>) -> Option<f64> {
    p.and_then(|p| finite(goals / 2.0 + p / 2.0))
}

fn observe(side: &SideView, rps: &MatchRps) -> Observation {
    use Metric::*;
    let mut obs: Observation = [None; METRIC_COUNT];
    let ht_for = f64::from(side.ht_for);
    let ht_against = f64::from(side.ht_against);
    let ft_for = f64::from(side.ft_for);
    let ft_against = f64::from(side.ft_against);
    let ht_total = side.ht_for + side.ht_against;
    let ft_total = side.ft_for + side.ft_against;
    let points = f64::from(scoring::points(side.ft_for, side.ft_against));
    let margin = scoring::goal_margin(side.ft_for, side.ft_against) as f64;

    obs[Points as usize] = Some(points);
    obs[PointsValue as usize] = weighted(points, side.p_opp);
    obs[GoalMargin as usize] = Some(margin);
    obs[GoalMarginValue as usize] = weighted(margin, side.p_opp);
    obs[GoalValueForHt as usize] = weighted(ht_for, side.p_opp);
    obs[GoalValueAgainstHt as usize] = weighted(ht_against, side.p_opp);
    obs[GoalValueFor as usize] = weighted(ft_for, side.p_opp);
    obs[GoalValueAgainst as usize] = weighted(ft_against, side.p_opp);
    obs[CostGoalFor1 as usize] = ratio(Some(ft_for), side.p_own);
    obs[CostGoalAgainst1 as usize] = ratio(Some(ft_against), side.p_opp);
    obs[CostGoalFor2 as usize] = linear_cost(ft_for, side.p_own);
    obs[CostGoalAgainst2 as usize] = linear_cost(ft_against, side.p_opp);
    obs[RpsMatchOdds as usize] = rps.match_odds;
    obs[RpsOverUnder as usize] = rps.over_under;
    obs[RpsBtts as usize] = rps.btts;
    obs[WinProbability as usize] = side.p_own;

    obs[FirstGoalScoredMinute as usize] = side.first_for.map(f64::from);
    obs[FirstGoalConcededMinute as usize] = side.first_against.map(f64::from);
    let scored_first = match (side.first_for, side.first_against) {
        (Some(own), Some(opp)) => own < opp,
        (Some(_), None) => true,
        _ => false,
    };
    let conceded_first = match (side.first_for, side.first_against) {
        (Some(own), Some(opp)) => opp < own,
        (None, Some(_)) => true,
        _ => false,
    };
    obs[ScoredFirst as usize] = flag(scored_first);
    obs[ConcededFirst as usize] = flag(conceded_first);
    obs[ScoredFirstHt as usize] =
        flag(scored_first && side.first_for.is_some_and(is_first_half));
    obs[ConcededFirstHt as usize] =
        flag(conceded_first && side.first_against.is_some_and(is_first_half));

    obs[Btts as usize] = flag(scoring::both_teams_scored(side.ft_for, side.ft_against));
    obs[Over05Ht as usize] = flag(ht_total >= 1);
    obs[Under05Ht as usize] = flag(ht_total < 1);
    obs[Over15Ht as usize] = flag(ht_total >= 2);
    obs[Under15Ht as usize] = flag(ht_total < 2);
    obs[Over05Ft as usize] = flag(ft_total >= 1);
    obs[Under05Ft as usize] = flag(ft_total < 1);
    obs[Over15Ft as usize] = flag(ft_total >= 2);
    obs[Under15Ft as usize] = flag(ft_total < 2);
    obs[Over25Ft as usize] = flag(ft_total >= 3);
    obs[Under25Ft as usize] = flag(ft_total < 3);
    obs[WinHt as usize] = flag(side.ht_for > side.ht_against);
    obs[WinFt as usize] = flag(side.ft_for > side.ft_against);
    obs[Scored as usize] = flag(side.ft_for >= 1);
    obs[Conceded as usize] = flag(side.ft_against >= 1);
    obs
}
