use serde::Serialize;

const PROB_DECIMALS: i32 = 4;

/// Decimal closing (or pre-match) odds for every market the feature engine reads.
/// A value of `None` means the column was blank, zero or unparseable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MarketOdds {
    pub home_win: Option<f64>,
    pub draw: Option<f64>,
    pub away_win: Option<f64>,
    pub over_05_ht: Option<f64>,
    pub under_05_ht: Option<f64>,
    pub over_15_ft: Option<f64>,
    pub under_15_ft: Option<f64>,
    pub over_25_ft: Option<f64>,
    pub under_25_ft: Option<f64>,
    pub btts_yes: Option<f64>,
    pub btts_no: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ImpliedProbabilities {
    pub home_win: Option<f64>,
    pub draw: Option<f64>,
    pub away_win: Option<f64>,
    pub over_05_ht: Option<f64>,
    pub under_05_ht: Option<f64>,
    pub over_15_ft: Option<f64>,
    pub under_15_ft: Option<f64>,
    pub over_25_ft: Option<f64>,
    pub under_25_ft: Option<f64>,
    pub btts_yes: Option<f64>,
    pub btts_no: Option<f64>,
}

/// Pairwise 1X2 odds ratios, named numerator first (`h_d` = home / draw).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OddsRatios {
    pub h_d: Option<f64>,
    pub h_a: Option<f64>,
    pub d_h: Option<f64>,
    pub d_a: Option<f64>,
    pub a_h: Option<f64>,
    pub a_d: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PairSpread {
    pub home_away: Option<f64>,
    pub home_draw: Option<f64>,
    pub draw_away: Option<f64>,
}

/// Everything derivable from one odds snapshot without looking at a result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MarketProfile {
    pub probabilities: ImpliedProbabilities,
    pub ratios: OddsRatios,
    pub abs_diff: PairSpread,
    pub pct_diff: PairSpread,
    pub angle: PairSpread,
}

impl MarketProfile {
    pub fn from_odds(odds: &MarketOdds) -> Self {
        let (h, d, a) = (
            valid_odd(odds.home_win),
            valid_odd(odds.draw),
            valid_odd(odds.away_win),
        );
        Self {
            probabilities: ImpliedProbabilities {
                home_win: implied_probability(odds.home_win),
                draw: implied_probability(odds.draw),
                away_win: implied_probability(odds.away_win),
                over_05_ht: implied_probability(odds.over_05_ht),
                under_05_ht: implied_probability(odds.under_05_ht),
                over_15_ft: implied_probability(odds.over_15_ft),
                under_15_ft: implied_probability(odds.under_15_ft),
                over_25_ft: implied_probability(odds.over_25_ft),
                under_25_ft: implied_probability(odds.under_25_ft),
                btts_yes: implied_probability(odds.btts_yes),
                btts_no: implied_probability(odds.btts_no),
            },
            ratios: OddsRatios {
                h_d: ratio(h, d),
                h_a: ratio(h, a),
                d_h: ratio(d, h),
                d_a: ratio(d, a),
                a_h: ratio(a, h),
                a_d: ratio(a, d),
            },
            abs_diff: PairSpread {
                home_away: abs_diff(h, a),
                home_draw: abs_diff(h, d),
                draw_away: abs_diff(d, a),
            },
            pct_diff: PairSpread {
                home_away: pct_diff(h, a),
                home_draw: pct_diff(h, d),
                draw_away: pct_diff(d, a),
            },
            angle: PairSpread {
                home_away: disparity_angle(h, a),
                home_draw: disparity_angle(h, d),
                draw_away: disparity_angle(d, a),
            },
        }
    }
}

/// The single sanitisation point: anything non-finite becomes missing.
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

pub fn valid_odd(odd: Option<f64>) -> Option<f64> {
    odd.filter(|o| o.is_finite() && *o > 0.0)
}

/// `round(1 / odd, 4)`, missing for zero, negative or absent odds.
pub fn implied_probability(odd: Option<f64>) -> Option<f64> {
    let odd = valid_odd(odd)?;
    finite(round_to(1.0 / odd, PROB_DECIMALS))
}

pub fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let (n, d) = (numerator?, denominator?);
    if d == 0.0 {
        return None;
    }
    finite(n / d)
}

pub fn abs_diff(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    finite((a? - b?).abs())
}

/// Absolute gap expressed as a percentage of the first-named odd.
pub fn pct_diff(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    let gap = abs_diff(a, b)?;
    ratio(Some(gap), a).and_then(|v| finite(v * 100.0))
}

/// `degrees(atan((b - a) / 2))`: a bounded monotone transform of the odds gap.
pub fn disparity_angle(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    finite(((b? - a?) / 2.0).atan().to_degrees())
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}
