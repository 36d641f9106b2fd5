use std::fs;
use std::path::PathBuf;

use approx::assert_relative_eq;
use chrono::{Days, NaiveDate};
use fluffy_chips::features::{FeatureEngine, FeatureTable, SideForm};
use fluffy_chips::odds::{MarketOdds, MarketProfile};
use fluffy_chips::projector::{ProjectedFixture, project_fixtures, project_for_date};
use fluffy_chips::records::{
    Fixture, MatchRecord, Role, parse_fixtures_csv, parse_history_csv, prepare_history,
};
use fluffy_chips::rolling::RollingStat;
use fluffy_chips::screens::{self, Screen};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn analysis_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 2, 10).unwrap()
}

fn stat(mean: f64, cv: f64) -> RollingStat {
    RollingStat {
        mean: Some(mean),
        std: Some(mean * cv),
        cv: Some(cv),
    }
}

fn projected(time: &str, home_form: SideForm, away_form: SideForm) -> ProjectedFixture {
    ProjectedFixture {
        row_number: 0,
        fixture: Fixture {
            time: time.to_string(),
            home_team: format!("Home {time}"),
            away_team: format!("Away {time}"),
            ..Fixture::default()
        },
        market: MarketProfile::default(),
        home_form,
        away_form,
        error: None,
    }
}

fn home_game(offset: u64, away: &str, ft: (u32, u32)) -> MatchRecord {
    MatchRecord {
        date: NaiveDate::from_ymd_opt(2023, 8, 5).unwrap() + Days::new(offset * 7),
        league: "NETHERLANDS 1".to_string(),
        season: "2023/2024".to_string(),
        home_team: "Ajax".to_string(),
        away_team: away.to_string(),
        ht_goals_home: 0,
        ht_goals_away: 0,
        ft_goals_home: ft.0,
        ft_goals_away: ft.1,
        odds: MarketOdds {
            home_win: Some(1.9),
            draw: Some(3.6),
            away_win: Some(4.0),
            ..MarketOdds::default()
        },
        goal_minutes_home: String::new(),
        goal_minutes_away: String::new(),
    }
}

fn lay_odds(favourite: f64, underdog: f64) -> MarketOdds {
    MarketOdds {
        home_win: Some(favourite),
        draw: Some(3.5),
        away_win: Some(underdog),
        over_25_ft: Some(2.3),
        ..MarketOdds::default()
    }
}

fn scoring_favourite() -> SideForm {
    SideForm {
        pct_scored: Some(85.0),
        cost_goal_for_1: stat(3.0, 0.4),
        cost_goal_for_2: stat(0.8, 0.5),
        cost_goal_against_2: stat(0.6, 0.8),
        ..SideForm::default()
    }
}

fn leaky_opponent() -> SideForm {
    SideForm {
        pct_conceded: Some(75.0),
        ..SideForm::default()
    }
}

fn lay_0x1_at_the_edges() -> ProjectedFixture {
    let mut f = projected("20:00", scoring_favourite(), leaky_opponent());
    f.fixture.odds = lay_odds(2.2, 3.5);
    f
}

fn strong_side(power: f64) -> SideForm {
    SideForm {
        power_ranking: stat(power, 0.2),
        cost_goal_for_1: stat(4.2, 0.5),
        ..SideForm::default()
    }
}

fn goals_side() -> SideForm {
    SideForm {
        pct_over_15_ft: Some(71.4),
        pct_btts: Some(57.1),
        goal_value_for: stat(1.4, 0.6),
        goal_value_against: stat(1.2, 0.8),
        ..SideForm::default()
    }
}

#[test]
fn projects_fixture_file_against_history() {
    let history = prepare_history(
        parse_history_csv(&read_fixture("history.csv"))
            .expect("history should parse")
            .rows,
    );
    let fixtures = parse_fixtures_csv(&read_fixture("fixtures_today.csv"))
        .expect("fixtures should parse")
        .rows;

    let (table, report) =
        project_for_date(&FeatureEngine::default(), &history, &fixtures, analysis_date());
    assert_eq!(table.len(), 4);
    assert_eq!(report.fixtures.len(), 3);
    assert_eq!(report.errors.len(), 1);

    let ajax = &report.fixtures[0];
    assert_eq!(ajax.row_number, 1);
    assert!(ajax.error.is_none());
    // form of the 2024-01-20 home row, which saw only the 2024-01-06 match
    assert_eq!(ajax.home_form.matches_seen, 1);
    assert_eq!(ajax.away_form.matches_seen, 0);
    assert_eq!(ajax.market.probabilities.home_win, Some(0.4444));

    let twente = &report.fixtures[2];
    assert_eq!(twente.row_number, 3);
    assert!(twente.error.as_deref().is_some_and(|e| e.contains("away")));
}

#[test]
fn unknown_teams_get_missing_form_but_full_market() {
    let history = prepare_history(
        parse_history_csv(&read_fixture("history.csv"))
            .expect("history should parse")
            .rows,
    );
    let fixtures = parse_fixtures_csv(&read_fixture("fixtures_today.csv"))
        .expect("fixtures should parse")
        .rows;
    let (_, report) =
        project_for_date(&FeatureEngine::default(), &history, &fixtures, analysis_date());

    let heracles = &report.fixtures[1];
    assert_eq!(heracles.fixture.home_team, "Heracles");
    assert_eq!(heracles.home_form, SideForm::default());
    assert_eq!(heracles.away_form, SideForm::default());
    assert_eq!(heracles.home_form.power_ranking.mean, None);
    assert_eq!(heracles.home_form.pct_over_15_ft, None);

    let market = &heracles.market;
    assert_eq!(market.probabilities.home_win, Some(0.3846));
    assert_eq!(market.probabilities.draw, Some(0.303));
    assert!(market.ratios.h_a.is_some());
    assert!(market.pct_diff.home_away.is_some());
    assert!(market.angle.home_draw.is_some());
    assert!(market.probabilities.btts_yes.is_some());
}

#[test]
fn history_on_or_after_the_analysis_date_is_ignored() {
    let history = prepare_history(
        parse_history_csv(&read_fixture("history.csv"))
            .expect("history should parse")
            .rows,
    );
    let early = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();
    let (table, _) = project_for_date(&FeatureEngine::default(), &history, &[], early);
    assert_eq!(table.len(), 2);
    assert!(table.rows.iter().all(|r| r.date < early));
}

#[test]
fn same_team_on_both_sides_is_reported() {
    let fixtures = vec![
        Fixture {
            home_team: "Ajax".to_string(),
            away_team: "Ajax".to_string(),
            ..Fixture::default()
        },
        Fixture {
            home_team: "PSV".to_string(),
            away_team: "Ajax".to_string(),
            ..Fixture::default()
        },
    ];
    let (_, report) = project_for_date(&FeatureEngine::default(), &[], &fixtures, analysis_date());
    assert_eq!(report.errors.len(), 1);
    assert!(report.fixtures[0].error.is_some());
    assert!(report.fixtures[1].error.is_none());
}

#[test]
fn back_and_lay_home_mirror_each_other() {
    let back = projected("18:00", strong_side(320.0), strong_side(120.0));
    let lay = projected("15:00", strong_side(90.0), strong_side(410.0));

    assert!(Screen::BackHome.matches(&back));
    assert!(!Screen::LayHome.matches(&back));
    assert!(Screen::LayHome.matches(&lay));
    assert!(!Screen::BackHome.matches(&lay));

    let mut edge = projected("19:00", strong_side(250.0), strong_side(249.9));
    assert!(Screen::BackHome.matches(&edge));
    edge.home_form.cost_goal_for_1 = stat(3.5, 0.5);
    assert!(!Screen::BackHome.matches(&edge));
}

#[test]
fn missing_features_never_pass_a_screen() {
    let mut fixture = projected("18:00", strong_side(320.0), SideForm::default());
    assert!(!Screen::BackHome.matches(&fixture));
    fixture.away_form = strong_side(100.0);
    assert!(Screen::BackHome.matches(&fixture));
    fixture.error = Some("bad row".to_string());
    assert!(!Screen::BackHome.matches(&fixture));

    let mut goals = projected("18:00", goals_side(), goals_side());
    assert!(Screen::Over15Ft.matches(&goals));
    goals.away_form.goal_value_against.cv = None;
    assert!(!Screen::Over15Ft.matches(&goals));
}

#[test]
fn screen_output_is_ordered_by_time_and_renumbered() {
    let fixtures = vec![
        projected("21:00", goals_side(), goals_side()),
        projected("13:30", SideForm::default(), SideForm::default()),
        projected("16:15", goals_side(), goals_side()),
    ];
    let selection = screens::apply(Screen::Over15Ft, &fixtures);
    let times: Vec<&str> = selection
        .fixtures
        .iter()
        .map(|f| f.fixture.time.as_str())
        .collect();
    assert_eq!(times, ["16:15", "21:00"]);
    assert_eq!(selection.fixtures[0].row_number, 1);
    assert_eq!(selection.fixtures[1].row_number, 2);

    let all = screens::apply_all(&fixtures);
    assert_eq!(all.len(), 5);
    assert!(all[0].fixtures.is_empty());
    assert_eq!(all[3].screen, Screen::Lay0x1);
    assert_eq!(all[4].screen, Screen::Lay1x0);
}

#[test]
fn fixture_form_is_the_last_history_row_form() {
    let points_sequence = [(1, 0), (2, 1), (0, 1), (1, 1), (3, 0), (2, 0), (0, 2), (0, 0)];
    let history: Vec<MatchRecord> = points_sequence
        .iter()
        .enumerate()
        .map(|(i, ft)| home_game(i as u64, "PSV", *ft))
        .collect();
    let table = FeatureEngine::default().build(&history);
    let fixtures = vec![
        Fixture {
            time: "20:00".to_string(),
            home_team: "Ajax".to_string(),
            away_team: "PSV".to_string(),
            ..Fixture::default()
        },
        Fixture {
            time: "18:00".to_string(),
            home_team: "PSV".to_string(),
            away_team: "Ajax".to_string(),
            ..Fixture::default()
        },
    ];
    let report = project_fixtures(&fixtures, &table);

    let last_home = table.rows_for("Ajax", Role::Home).last().unwrap();
    let ajax = &report.fixtures[0];
    assert_eq!(&ajax.home_form, FeatureTable::form_on_row(last_home, Role::Home));
    assert_eq!(ajax.home_form, table.rows[7].home_form);
    assert_eq!(ajax.home_form.matches_seen, 7);
    // points [3, 3, 0, 1, 3, 3, 0] before the last match
    assert_relative_eq!(ajax.home_form.points.mean.unwrap(), 13.0 / 7.0, epsilon = 1e-12);
    assert_eq!(ajax.away_form, table.rows[7].away_form);

    // PSV never played at home and Ajax never away
    let reversed = &report.fixtures[1];
    assert!(reversed.error.is_none());
    assert_eq!(reversed.home_form, SideForm::default());
    assert_eq!(reversed.away_form, SideForm::default());
}

#[test]
fn lay_0x1_thresholds_are_inclusive() {
    let edge = lay_0x1_at_the_edges();
    assert!(Screen::Lay0x1.matches(&edge));
    assert!(!Screen::Lay1x0.matches(&edge));

    let mut shortest = lay_0x1_at_the_edges();
    shortest.fixture.odds.home_win = Some(1.25);
    assert!(Screen::Lay0x1.matches(&shortest));

    let mut level = lay_0x1_at_the_edges();
    level.fixture.odds.away_win = level.fixture.odds.draw;
    assert!(Screen::Lay0x1.matches(&level));
}

#[test]
fn lay_0x1_fails_just_outside_each_threshold() {
    let tweaks: [fn(&mut ProjectedFixture); 10] = [
        |f| f.home_form.pct_scored = Some(84.9),
        |f| f.away_form.pct_conceded = Some(74.9),
        |f| f.home_form.cost_goal_for_1.mean = Some(2.99),
        |f| f.home_form.cost_goal_for_2.mean = Some(0.79),
        |f| f.home_form.cost_goal_against_2.cv = Some(0.81),
        |f| f.fixture.odds.home_win = Some(1.24),
        |f| f.fixture.odds.home_win = Some(2.21),
        |f| f.fixture.odds.over_25_ft = Some(2.31),
        |f| f.fixture.odds.away_win = Some(3.49),
        |f| f.error = Some("bad row".to_string()),
    ];
    for (idx, tweak) in tweaks.iter().enumerate() {
        let mut f = lay_0x1_at_the_edges();
        tweak(&mut f);
        assert!(!Screen::Lay0x1.matches(&f), "tweak {idx} still passed");
    }
}

#[test]
fn lay_0x1_missing_values_fail() {
    let tweaks: [fn(&mut ProjectedFixture); 9] = [
        |f| f.home_form.pct_scored = None,
        |f| f.away_form.pct_conceded = None,
        |f| f.home_form.cost_goal_for_1.mean = None,
        |f| f.home_form.cost_goal_for_2.mean = None,
        |f| f.home_form.cost_goal_against_2.cv = None,
        |f| f.fixture.odds.home_win = None,
        |f| f.fixture.odds.draw = None,
        |f| f.fixture.odds.away_win = None,
        |f| f.fixture.odds.over_25_ft = None,
    ];
    for (idx, tweak) in tweaks.iter().enumerate() {
        let mut f = lay_0x1_at_the_edges();
        tweak(&mut f);
        assert!(!Screen::Lay0x1.matches(&f), "missing value {idx} still passed");
    }
}

#[test]
fn lay_1x0_mirrors_lay_0x1() {
    let mut f = projected("20:00", leaky_opponent(), scoring_favourite());
    f.fixture.odds = MarketOdds {
        home_win: Some(3.5),
        away_win: Some(1.25),
        ..lay_odds(0.0, 0.0)
    };
    assert!(Screen::Lay1x0.matches(&f));
    assert!(!Screen::Lay0x1.matches(&f));

    let mut long = f.clone();
    long.fixture.odds.away_win = Some(2.21);
    assert!(!Screen::Lay1x0.matches(&long));

    let mut draw_longer = f.clone();
    draw_longer.fixture.odds.home_win = Some(3.4);
    assert!(!Screen::Lay1x0.matches(&draw_longer));

    let mut weak_scorer = f.clone();
    weak_scorer.away_form.pct_scored = Some(84.9);
    assert!(!Screen::Lay1x0.matches(&weak_scorer));

    let mut tight_home = f;
    tight_home.home_form.pct_conceded = None;
    assert!(!Screen::Lay1x0.matches(&tight_home));
}
