use serde::Serialize;

use crate::odds::{ImpliedProbabilities, finite};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GoalLine {
    Over,
    Under,
}

pub fn classify_outcome(home_goals: u32, away_goals: u32) -> Outcome {
    if home_goals > away_goals {
        Outcome::Home
    } else if home_goals < away_goals {
        Outcome::Away
    } else {
        Outcome::Draw
    }
}

pub fn classify_over_under(total_goals: u32, line: f64) -> GoalLine {
    if f64::from(total_goals) > line {
        GoalLine::Over
    } else {
        GoalLine::Under
    }
}

pub fn both_teams_scored(home_goals: u32, away_goals: u32) -> bool {
    home_goals > 0 && away_goals > 0
}

/// League points for the side that scored `goals_for`.
pub fn points(goals_for: u32, goals_against: u32) -> u32 {
    match goals_for.cmp(&goals_against) {
        std::cmp::Ordering::Greater => 3,
        std::cmp::Ordering::Equal => 1,
        std::cmp::Ordering::Less => 0,
    }
}

pub fn goal_margin(goals_for: u32, goals_against: u32) -> i64 {
    i64::from(goals_for) - i64::from(goals_against)
}

/// Per-match Ranked Probability Scores for the three markets.
/// Values near 0 mean the market agreed with the result.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MatchRps {
    pub match_odds: Option<f64>,
    pub over_under: Option<f64>,
    pub btts: Option<f64>,
}

impl MatchRps {
    pub fn score(probs: &ImpliedProbabilities, ft_home: u32, ft_away: u32) -> Self {
        let result = classify_outcome(ft_home, ft_away);
        let line = classify_over_under(ft_home + ft_away, 2.5);
        let btts = both_teams_scored(ft_home, ft_away);
        Self {
            match_odds: rps_match_odds(probs, result),
            over_under: rps_binary(
                probs.over_25_ft,
                probs.under_25_ft,
                line == GoalLine::Over,
            ),
            btts: rps_binary(probs.btts_yes, probs.btts_no, btts),
        }
    }
}

pub fn rps_match_odds(probs: &ImpliedProbabilities, outcome: Outcome) -> Option<f64> {
    let (h, d, a) = (probs.home_win?, probs.draw?, probs.away_win?);
    let y = one_hot(outcome);
    finite((h - y.0).powi(2) + (d - y.1).powi(2) + (a - y.2).powi(2))
}

pub fn rps_binary(p_yes: Option<f64>, p_no: Option<f64>, happened: bool) -> Option<f64> {
    let (p_yes, p_no) = (p_yes?, p_no?);
    let (y_yes, y_no) = if happened { (1.0, 0.0) } else { (0.0, 1.0) };
    finite((p_yes - y_yes).powi(2) + (p_no - y_no).powi(2))
}

fn one_hot(outcome: Outcome) -> (f64, f64, f64) {
    match outcome {
        Outcome::Home => (1.0, 0.0, 0.0),
        Outcome::Draw => (0.0, 1.0, 0.0),
        Outcome::Away => (0.0, 0.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn probs(h: f64, d: f64, a: f64) -> ImpliedProbabilities {
        ImpliedProbabilities {
            home_win: Some(h),
            draw: Some(d),
            away_win: Some(a),
            over_25_ft: Some(0.55),
            under_25_ft: Some(0.5),
            btts_yes: Some(0.6),
            btts_no: Some(0.45),
            ..ImpliedProbabilities::default()
        }
    }

    #[test]
    fn favourite_win_scores_lower_than_upset() {
        let p = probs(0.7, 0.2, 0.15);
        let expected = rps_match_odds(&p, Outcome::Home).unwrap();
        let upset = rps_match_odds(&p, Outcome::Away).unwrap();
        assert_relative_eq!(expected, 0.09 + 0.04 + 0.0225, epsilon = 1e-12);
        assert!(expected < 0.33);
        assert!(upset > expected);
    }

    #[test]
    fn binary_markets_follow_result() {
        let p = probs(0.5, 0.3, 0.25);
        let rps = MatchRps::score(&p, 2, 1);
        assert_relative_eq!(rps.over_under.unwrap(), 0.2025 + 0.25, epsilon = 1e-12);
        assert_relative_eq!(rps.btts.unwrap(), 0.16 + 0.2025, epsilon = 1e-12);
    }

    #[test]
    fn missing_probability_leaves_score_missing() {
        let mut p = probs(0.5, 0.3, 0.25);
        p.draw = None;
        assert_eq!(MatchRps::score(&p, 0, 0).match_odds, None);
    }

    #[test]
    fn points_and_margin() {
        assert_eq!(points(2, 1), 3);
        assert_eq!(points(1, 1), 1);
        assert_eq!(points(0, 4), 0);
        assert_eq!(goal_margin(0, 4), -4);
        assert_eq!(classify_over_under(3, 2.5), GoalLine::Over);
        assert_eq!(classify_over_under(2, 2.5), GoalLine::Under);
    }
}
