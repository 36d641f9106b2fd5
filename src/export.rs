use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::features::SideForm;
use crate::projector::ProjectedFixture;
use crate::rolling::RollingStat;
use crate::screens::ScreenSelection;

pub struct ExportReport {
    pub fixtures: usize,
    pub screens: Vec<(String, usize)>,
}

enum Cell {
    Text(String),
    Number(f64),
    Blank,
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => Cell::Number(v),
            _ => Cell::Blank,
        }
    }
}

/// Writes the `Fixtures` sheet plus one sheet per screen. Missing values
/// are left as empty cells.
pub fn export_workbook(
    path: &Path,
    fixtures: &[ProjectedFixture],
    screens: &[ScreenSelection],
) -> Result<ExportReport> {
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Fixtures")?;
        write_fixture_sheet(sheet, fixtures)?;
    }
    let mut screen_counts = Vec::with_capacity(screens.len());
    for selection in screens {
        let sheet = workbook.add_worksheet();
        sheet.set_name(selection.screen.title())?;
        write_fixture_sheet(sheet, &selection.fixtures)?;
        screen_counts.push((
            selection.screen.title().to_string(),
            selection.fixtures.len(),
        ));
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        fixtures: fixtures.len(),
        screens: screen_counts,
    })
}

pub fn to_json(fixtures: &[ProjectedFixture], screens: &[ScreenSelection]) -> Result<String> {
    let doc = serde_json::json!({
        "fixtures": fixtures,
        "screens": screens,
    });
    serde_json::to_string_pretty(&doc).context("failed encoding projection as json")
}

const STAT_COLUMNS: &[&str] = &[
    "Points",
    "Points Value",
    "Goal Margin",
    "Goal Margin Value",
    "Goal Value For HT",
    "Goal Value Against HT",
    "Goal Value For",
    "Goal Value Against",
    "Cost Goal For 1",
    "Cost Goal Against 1",
    "Cost Goal For 2",
    "Cost Goal Against 2",
    "RPS Match Odds",
    "RPS Over/Under",
    "RPS BTTS",
    "Win Probability",
    "Power Ranking",
];

const PCT_COLUMNS: &[&str] = &[
    "First Goal Scored Min",
    "First Goal Conceded Min",
    "% Scored First",
    "% Conceded First",
    "% Scored First HT",
    "% Conceded First HT",
    "% BTTS",
    "% Over 0.5 HT",
    "% Under 0.5 HT",
    "% Over 1.5 HT",
    "% Under 1.5 HT",
    "% Over 0.5 FT",
    "% Under 0.5 FT",
    "% Over 1.5 FT",
    "% Under 1.5 FT",
    "% Over 2.5 FT",
    "% Under 2.5 FT",
    "% Win HT",
    "% Win FT",
    "% Scored",
    "% Conceded",
];

fn header() -> Vec<String> {
    let mut row: Vec<String> = [
        "#", "League", "Date", "Time", "Home", "Away", "Odd H", "Odd D", "Odd A", "Odd Over 1.5",
        "Odd Over 2.5", "Odd BTTS Yes", "Prob H", "Prob D", "Prob A", "H/D", "H/A", "D/H", "D/A",
        "A/H", "A/D", "Diff H-A", "Diff H-D", "Diff D-A", "Pct H-A", "Pct H-D", "Pct D-A",
        "Angle H-A", "Angle H-D", "Angle D-A",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    for side in ["Home", "Away"] {
        row.push(format!("{side} Matches"));
        for name in STAT_COLUMNS {
            row.push(format!("{side} {name} Mean"));
            row.push(format!("{side} {name} Std"));
            row.push(format!("{side} {name} CV"));
        }
        for name in PCT_COLUMNS {
            row.push(format!("{side} {name}"));
        }
    }
    row.push("Error".to_string());
    row
}

fn fixture_row(f: &ProjectedFixture) -> Vec<Cell> {
    let odds = &f.fixture.odds;
    let m = &f.market;
    let mut row = vec![
        Cell::Number(f.row_number as f64),
        Cell::Text(f.fixture.league.clone()),
        Cell::Text(
            f.fixture
                .date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        ),
        Cell::Text(f.fixture.time.clone()),
        Cell::Text(f.fixture.home_team.clone()),
        Cell::Text(f.fixture.away_team.clone()),
    ];
    row.extend(
        [
            odds.home_win,
            odds.draw,
            odds.away_win,
            odds.over_15_ft,
            odds.over_25_ft,
            odds.btts_yes,
            m.probabilities.home_win,
            m.probabilities.draw,
            m.probabilities.away_win,
            m.ratios.h_d,
            m.ratios.h_a,
            m.ratios.d_h,
            m.ratios.d_a,
            m.ratios.a_h,
            m.ratios.a_d,
            m.abs_diff.home_away,
            m.abs_diff.home_draw,
            m.abs_diff.draw_away,
            m.pct_diff.home_away,
            m.pct_diff.home_draw,
            m.pct_diff.draw_away,
            m.angle.home_away,
            m.angle.home_draw,
            m.angle.draw_away,
        ]
        .into_iter()
        .map(Cell::from),
    );
    for form in [&f.home_form, &f.away_form] {
        row.extend(form_cells(form));
    }
    row.push(Cell::Text(f.error.clone().unwrap_or_default()));
    row
}

fn form_cells(form: &SideForm) -> Vec<Cell> {
    let stats: [&RollingStat; 17] = [
        &form.points,
        &form.points_value,
        &form.goal_margin,
        &form.goal_margin_value,
        &form.goal_value_for_ht,
        &form.goal_value_against_ht,
        &form.goal_value_for,
        &form.goal_value_against,
        &form.cost_goal_for_1,
        &form.cost_goal_against_1,
        &form.cost_goal_for_2,
        &form.cost_goal_against_2,
        &form.rps_match_odds,
        &form.rps_over_under,
        &form.rps_btts,
        &form.win_probability,
        &form.power_ranking,
    ];
    let mut cells = vec![Cell::Number(form.matches_seen as f64)];
    for stat in stats {
        cells.push(stat.mean.into());
        cells.push(stat.std.into());
        cells.push(stat.cv.into());
    }
    cells.extend(
        [
            form.first_goal_scored_minute,
            form.first_goal_conceded_minute,
            form.pct_scored_first,
            form.pct_conceded_first,
            form.pct_scored_first_ht,
            form.pct_conceded_first_ht,
            form.pct_btts,
            form.pct_over_05_ht,
            form.pct_under_05_ht,
            form.pct_over_15_ht,
            form.pct_under_15_ht,
            form.pct_over_05_ft,
            form.pct_under_05_ft,
            form.pct_over_15_ft,
            form.pct_under_15_ft,
            form.pct_over_25_ft,
            form.pct_under_25_ft,
            form.pct_win_ht,
            form.pct_win_ft,
            form.pct_scored,
            form.pct_conceded,
        ]
        .into_iter()
        .map(Cell::from),
    );
    cells
}

fn write_fixture_sheet(worksheet: &mut Worksheet, fixtures: &[ProjectedFixture]) -> Result<()> {
    let header = header()
        .into_iter()
        .map(Cell::Text)
        .collect::<Vec<_>>();
    write_row(worksheet, 0, &header)?;
    for (idx, f) in fixtures.iter().enumerate() {
        write_row(worksheet, (idx + 1) as u32, &fixture_row(f))?;
    }
    Ok(())
}

fn write_row(worksheet: &mut Worksheet, row_idx: u32, row: &[Cell]) -> Result<()> {
    for (col_idx, cell) in row.iter().enumerate() {
        let col = col_idx as u16;
        match cell {
            Cell::Text(value) => {
                worksheet
                    .write_string(row_idx, col, value)
                    .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
            }
            Cell::Number(value) => {
                worksheet
                    .write_number(row_idx, col, *value)
                    .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
            }
            Cell::Blank => {}
        }
    }
    Ok(())
}
