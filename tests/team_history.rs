use chrono::NaiveDate;
use fluffy_chips::odds::MarketOdds;
use fluffy_chips::records::{MatchRecord, Role};
use fluffy_chips::team_history::{
    DEFAULT_RECENT, SIMILAR_ODDS_MARGIN, head_to_head, recent_matches, score_summary,
    similar_odds_matches,
};

fn game(date: (i32, u32, u32), home: &str, away: &str, ft: (u32, u32), odds: (f64, f64)) -> MatchRecord {
    MatchRecord {
        date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        league: "NETHERLANDS 1".to_string(),
        season: "2023/2024".to_string(),
        home_team: home.to_string(),
        away_team: away.to_string(),
        ht_goals_home: 0,
        ht_goals_away: 0,
        ft_goals_home: ft.0,
        ft_goals_away: ft.1,
        odds: MarketOdds {
            home_win: Some(odds.0),
            draw: Some(3.5),
            away_win: Some(odds.1),
            ..MarketOdds::default()
        },
        goal_minutes_home: String::new(),
        goal_minutes_away: String::new(),
    }
}

fn history() -> Vec<MatchRecord> {
    vec![
        game((2022, 9, 4), "Ajax", "PSV", (2, 2), (2.08, 3.22)),
        game((2023, 2, 12), "PSV", "Ajax", (1, 0), (1.95, 3.60)),
        game((2023, 3, 5), "Ajax", "PSV", (5, 0), (2.05, 3.25)),
        game((2023, 8, 20), "Ajax", "Twente", (1, 0), (1.50, 6.00)),
        game((2023, 9, 17), "Ajax", "Utrecht", (2, 2), (1.60, 5.00)),
        game((2023, 10, 1), "Ajax", "AZ", (0, 4), (2.30, 2.90)),
        game((2023, 11, 5), "Ajax", "Heerenveen", (2, 2), (1.55, 5.50)),
        game((2024, 1, 21), "Ajax", "PSV", (1, 0), (2.60, 2.50)),
        game((2024, 2, 4), "Ajax", "Vitesse", (1, 0), (1.40, 7.00)),
    ]
}

#[test]
fn head_to_head_keeps_venue_and_orders_newest_first() {
    let rows = head_to_head(&history(), "Ajax", "PSV");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 1, 21).unwrap());
    assert!(rows.iter().all(|m| m.home_team == "Ajax" && m.away_team == "PSV"));
}

#[test]
fn recent_matches_are_capped() {
    let rows = recent_matches(&history(), "Ajax", Role::Home, DEFAULT_RECENT);
    assert_eq!(rows.len(), DEFAULT_RECENT);
    assert_eq!(rows[0].away_team, "Vitesse");
    assert_eq!(rows[4].away_team, "Utrecht");

    let away = recent_matches(&history(), "Ajax", Role::Away, DEFAULT_RECENT);
    assert_eq!(away.len(), 1);
    assert_eq!(away[0].home_team, "PSV");
}

#[test]
fn similar_odds_stay_inside_the_margin() {
    let rows = similar_odds_matches(&history(), "Ajax", "PSV", 2.00, 3.30, SIMILAR_ODDS_MARGIN);
    let dates: Vec<NaiveDate> = rows.iter().map(|m| m.date).collect();
    assert_eq!(
        dates,
        [
            NaiveDate::from_ymd_opt(2023, 3, 5).unwrap(),
            NaiveDate::from_ymd_opt(2022, 9, 4).unwrap(),
        ]
    );
    assert!(similar_odds_matches(&history(), "Ajax", "PSV", 3.0, 3.3, SIMILAR_ODDS_MARGIN).is_empty());
}

#[test]
fn score_frequencies_and_routs() {
    let summary = score_summary(&history(), "Ajax", Role::Home);
    assert_eq!(summary.matches, 8);
    assert_eq!(summary.frequencies[0].score, "1x0");
    assert_eq!(summary.frequencies[0].count, 3);
    assert_eq!(summary.frequencies[1].score, "2x2");
    assert_eq!(summary.frequencies[1].count, 3);
    let total: usize = summary.frequencies.iter().map(|f| f.count).sum();
    assert_eq!(total, summary.matches);

    let routs: Vec<String> = summary.routs.iter().map(|m| m.score_label()).collect();
    assert_eq!(routs, ["5x0", "0x4"]);
}
