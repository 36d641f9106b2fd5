use serde::Serialize;

use crate::features::SideForm;
use crate::projector::ProjectedFixture;
use crate::rolling::RollingStat;

const POWER_SPLIT: f64 = 250.0;
const COST_PER_GOAL_MIN: f64 = 3.5;
const OVER_15_PCT_MIN: f64 = 55.0;
const BTTS_PCT_MIN: f64 = 55.0;
const GOAL_VALUE_MEAN_MIN: f64 = 1.0;
const GOAL_VALUE_CV_MAX: f64 = 1.0;
const LAY_SCORED_PCT_MIN: f64 = 85.0;
const LAY_CONCEDED_PCT_MIN: f64 = 75.0;
const LAY_COST_FOR_1_MIN: f64 = 3.0;
const LAY_COST_FOR_2_MIN: f64 = 0.8;
const LAY_COST_AGAINST_2_CV_MAX: f64 = 0.8;
const LAY_FAVOURITE_ODD_MIN: f64 = 1.25;
const LAY_FAVOURITE_ODD_MAX: f64 = 2.2;
const LAY_OVER_25_ODD_MAX: f64 = 2.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Screen {
    BackHome,
    LayHome,
    Over15Ft,
    /// Lay the 0-1 correct score behind a scoring home favourite.
    Lay0x1,
    /// Lay the 1-0 correct score behind a scoring away favourite.
    Lay1x0,
}

impl Screen {
    pub const ALL: [Screen; 5] = [
        Screen::BackHome,
        Screen::LayHome,
        Screen::Over15Ft,
        Screen::Lay0x1,
        Screen::Lay1x0,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Screen::BackHome => "Back Home",
            Screen::LayHome => "Lay Home",
            Screen::Over15Ft => "Over 1.5 FT",
            Screen::Lay0x1 => "Lay 0x1",
            Screen::Lay1x0 => "Lay 1x0",
        }
    }

    /// A missing feature never passes a threshold.
    pub fn matches(self, f: &ProjectedFixture) -> bool {
        if f.error.is_some() {
            return false;
        }
        let (home, away) = (&f.home_form, &f.away_form);
        let odds = &f.fixture.odds;
        match self {
            Screen::BackHome => {
                at_least(home.power_ranking.mean, POWER_SPLIT)
                    && below(away.power_ranking.mean, POWER_SPLIT)
                    && above(home.cost_goal_for_1.mean, COST_PER_GOAL_MIN)
            }
            Screen::LayHome => {
                at_least(away.power_ranking.mean, POWER_SPLIT)
                    && below(home.power_ranking.mean, POWER_SPLIT)
                    && above(away.cost_goal_for_1.mean, COST_PER_GOAL_MIN)
            }
            Screen::Over15Ft => {
                above(home.pct_over_15_ft, OVER_15_PCT_MIN)
                    && above(away.pct_over_15_ft, OVER_15_PCT_MIN)
                    && above(home.pct_btts, BTTS_PCT_MIN)
                    && above(away.pct_btts, BTTS_PCT_MIN)
                    && steady_goals(&home.goal_value_for)
                    && steady_goals(&away.goal_value_for)
                    && steady_goals(&home.goal_value_against)
                    && steady_goals(&away.goal_value_against)
            }
            Screen::Lay0x1 => {
                lay_correct_score(home, away)
                    && favourite_priced(odds.home_win, odds.away_win, odds.draw)
                    && at_most(odds.over_25_ft, LAY_OVER_25_ODD_MAX)
            }
            Screen::Lay1x0 => {
                lay_correct_score(away, home)
                    && favourite_priced(odds.away_win, odds.home_win, odds.draw)
                    && at_most(odds.over_25_ft, LAY_OVER_25_ODD_MAX)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScreenSelection {
    pub screen: Screen,
    pub fixtures: Vec<ProjectedFixture>,
}

/// Fixtures passing `screen`, ordered by kick-off time and renumbered from 1.
pub fn apply(screen: Screen, fixtures: &[ProjectedFixture]) -> ScreenSelection {
    let mut picked: Vec<ProjectedFixture> = fixtures
        .iter()
        .filter(|f| screen.matches(f))
        .cloned()
        .collect();
    picked.sort_by(|a, b| a.fixture.time.cmp(&b.fixture.time));
    for (idx, f) in picked.iter_mut().enumerate() {
        f.row_number = idx + 1;
    }
    ScreenSelection {
        screen,
        fixtures: picked,
    }
}

pub fn apply_all(fixtures: &[ProjectedFixture]) -> Vec<ScreenSelection> {
    Screen::ALL
        .iter()
        .map(|screen| apply(*screen, fixtures))
        .collect()
}

fn above(value: Option<f64>, threshold: f64) -> bool {
    value.is_some_and(|v| v > threshold)
}

fn at_least(value: Option<f64>, threshold: f64) -> bool {
    value.is_some_and(|v| v >= threshold)
}

fn at_most(value: Option<f64>, threshold: f64) -> bool {
    value.is_some_and(|v| v <= threshold)
}

fn below(value: Option<f64>, threshold: f64) -> bool {
    value.is_some_and(|v| v < threshold)
}

fn steady_goals(stat: &RollingStat) -> bool {
    above(stat.mean, GOAL_VALUE_MEAN_MIN) && below(stat.cv, GOAL_VALUE_CV_MAX)
}

/// `favourite` scores often, `opponent` concedes often.
fn lay_correct_score(favourite: &SideForm, opponent: &SideForm) -> bool {
    at_least(favourite.pct_scored, LAY_SCORED_PCT_MIN)
        && at_least(opponent.pct_conceded, LAY_CONCEDED_PCT_MIN)
        && at_least(favourite.cost_goal_for_1.mean, LAY_COST_FOR_1_MIN)
        && at_least(favourite.cost_goal_for_2.mean, LAY_COST_FOR_2_MIN)
        && at_most(favourite.cost_goal_against_2.cv, LAY_COST_AGAINST_2_CV_MAX)
}

/// Favourite odd inside its band and the underdog priced no shorter than the draw.
fn favourite_priced(favourite: Option<f64>, underdog: Option<f64>, draw: Option<f64>) -> bool {
    let in_band = at_least(favourite, LAY_FAVOURITE_ODD_MIN)
        && at_most(favourite, LAY_FAVOURITE_ODD_MAX);
    let underdog_behind_draw = match (underdog, draw) {
        (Some(underdog), Some(draw)) => underdog >= draw,
        _ => false,
    };
    in_band && underdog_behind_draw
}
