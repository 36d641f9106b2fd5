use crate::odds::finite;

pub const ZERO_ZERO_PENALTY: f64 = -100.0;
pub const DRAW_PENALTY: f64 = -75.0;
pub const SCALE_MAX: f64 = 500.0;

#[derive(Debug, Clone, Copy)]
pub struct PowerRankingWeights {
    pub points_value: f64,
    pub goal_margin_value: f64,
    pub first_half_goals_for: f64,
    pub second_half_swing_for: f64,
    pub first_half_goals_against: f64,
    pub second_half_swing_against: f64,
    pub odds_skew: f64,
}

impl Default for PowerRankingWeights {
    fn default() -> Self {
        Self {
            points_value: 2.0,
            goal_margin_value: 0.6,
            first_half_goals_for: 0.5,
            second_half_swing_for: 0.5,
            first_half_goals_against: -0.4,
            second_half_swing_against: -0.4,
            odds_skew: 0.3,
        }
    }
}

/// Per-side terms of one match, all already weighted by the opponent's
/// implied win probability except `odds_skew` (own minus opponent probability).
#[derive(Debug, Clone, Copy, Default)]
pub struct PowerRankingInputs {
    pub points_value: Option<f64>,
    pub goal_margin_value: Option<f64>,
    pub first_half_goal_value_for: Option<f64>,
    pub second_half_swing_for: Option<f64>,
    pub first_half_goal_value_against: Option<f64>,
    pub second_half_swing_against: Option<f64>,
    pub odds_skew: Option<f64>,
    pub ft_goals_for: u32,
    pub ft_goals_against: u32,
}

impl PowerRankingInputs {
    /// Builds the terms for the side that scored `(ht_for, ft_for)` against
    /// `(ht_against, ft_against)`.
    pub fn for_side(
        (ht_for, ft_for): (u32, u32),
        (ht_against, ft_against): (u32, u32),
        p_own: Option<f64>,
        p_opp: Option<f64>,
    ) -> Self {
        let weighted = |value: f64| p_opp.and_then(|p| finite(value * p));
        let points = f64::from(crate::scoring::points(ft_for, ft_against));
        let margin = crate::scoring::goal_margin(ft_for, ft_against) as f64;
        let second_for = f64::from(ft_for.saturating_sub(ht_for));
        let second_against = f64::from(ft_against.saturating_sub(ht_against));
        Self {
            points_value: weighted(points),
            goal_margin_value: weighted(margin),
            first_half_goal_value_for: weighted(f64::from(ht_for)),
            second_half_swing_for: weighted(second_for - f64::from(ht_for)),
            first_half_goal_value_against: weighted(f64::from(ht_against)),
            second_half_swing_against: weighted(second_against - f64::from(ht_against)),
            odds_skew: match (p_own, p_opp) {
                (Some(own), Some(opp)) => finite(own - opp),
                _ => None,
            },
            ft_goals_for: ft_for,
            ft_goals_against: ft_against,
        }
    }
}

pub fn penalty(goals_for: u32, goals_against: u32) -> f64 {
    if goals_for == 0 && goals_against == 0 {
        ZERO_ZERO_PENALTY
    } else if goals_for == goals_against {
        DRAW_PENALTY
    } else {
        0.0
    }
}

/// Weighted sum of the terms, missing when any term is missing.
pub fn composite(inputs: &PowerRankingInputs, weights: &PowerRankingWeights) -> Option<f64> {
    let sum = weights.points_value * inputs.points_value?
        + weights.goal_margin_value * inputs.goal_margin_value?
        + weights.first_half_goals_for * inputs.first_half_goal_value_for?
        + weights.second_half_swing_for * inputs.second_half_swing_for?
        + weights.first_half_goals_against * inputs.first_half_goal_value_against?
        + weights.second_half_swing_against * inputs.second_half_swing_against?
        + weights.odds_skew * inputs.odds_skew?;
    finite(sum)
}

pub fn raw_score(inputs: &PowerRankingInputs, weights: &PowerRankingWeights) -> Option<f64> {
    let base = composite(inputs, weights)?;
    finite(base + penalty(inputs.ft_goals_for, inputs.ft_goals_against))
}

/// Min-max scales every present value to `[0, scale_max]` using the global
/// extremes of `raw`. Missing stays missing. When all present values are equal
/// they all map to 0.
pub fn normalize(raw: &[Option<f64>], scale_max: f64) -> Vec<Option<f64>> {
    let present = raw.iter().flatten().copied();
    let (min, max) = present.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return vec![None; raw.len()];
    }
    let span = max - min;
    raw.iter()
        .map(|value| {
            let v = (*value)?;
            if span <= 0.0 {
                return Some(0.0);
            }
            finite(((v - min) / span * scale_max).clamp(0.0, scale_max))
        })
        .collect()
}
