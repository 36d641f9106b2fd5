use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::ProjectionError;
use crate::features::{FeatureEngine, FeatureTable, SideForm};
use crate::odds::MarketProfile;
use crate::records::{Fixture, MatchRecord, Role, history_before};

/// One fixture merged with its own market profile and the form stored on
/// each team's last historical row in its role. Teams without such a row
/// carry an all-missing `SideForm`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedFixture {
    pub row_number: usize,
    pub fixture: Fixture,
    pub market: MarketProfile,
    pub home_form: SideForm,
    pub away_form: SideForm,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectionReport {
    pub fixtures: Vec<ProjectedFixture>,
    pub errors: Vec<String>,
}

/// Builds the feature table from matches strictly before `analysis_date` and
/// projects every fixture onto it.
pub fn project_for_date(
    engine: &FeatureEngine,
    history: &[MatchRecord],
    fixtures: &[Fixture],
    analysis_date: NaiveDate,
) -> (FeatureTable, ProjectionReport) {
    let slice = history_before(history, analysis_date);
    let table = engine.build(&slice);
    info!(
        %analysis_date,
        history = slice.len(),
        fixtures = fixtures.len(),
        "projecting fixtures"
    );
    let report = project_fixtures(fixtures, &table);
    (table, report)
}

pub fn project_fixtures(fixtures: &[Fixture], table: &FeatureTable) -> ProjectionReport {
    let mut errors = Vec::new();
    let projected = fixtures
        .iter()
        .enumerate()
        .map(|(idx, fixture)| {
            let row_number = idx + 1;
            match project_one(row_number, fixture, table) {
                Ok(projected) => projected,
                Err(err) => {
                    warn!(row = row_number, error = %err, "fixture projection failed");
                    errors.push(err.to_string());
                    ProjectedFixture {
                        row_number,
                        fixture: fixture.clone(),
                        market: MarketProfile::default(),
                        home_form: SideForm::default(),
                        away_form: SideForm::default(),
                        error: Some(err.to_string()),
                    }
                }
            }
        })
        .collect();
    ProjectionReport {
        fixtures: projected,
        errors,
    }
}

fn project_one(
    row_number: usize,
    fixture: &Fixture,
    table: &FeatureTable,
) -> Result<ProjectedFixture, ProjectionError> {
    if fixture.home_team.trim().is_empty() {
        return Err(ProjectionError::BlankTeam {
            row: row_number,
            side: Role::Home.label(),
        });
    }
    if fixture.away_team.trim().is_empty() {
        return Err(ProjectionError::BlankTeam {
            row: row_number,
            side: Role::Away.label(),
        });
    }
    if fixture.home_team == fixture.away_team {
        return Err(ProjectionError::SameTeam {
            row: row_number,
            team: fixture.home_team.clone(),
        });
    }

    let home_form = table
        .latest_form(&fixture.home_team, Role::Home)
        .cloned()
        .unwrap_or_default();
    let away_form = table
        .latest_form(&fixture.away_team, Role::Away)
        .cloned()
        .unwrap_or_default();

    Ok(ProjectedFixture {
        row_number,
        fixture: fixture.clone(),
        market: MarketProfile::from_odds(&fixture.odds),
        home_form,
        away_form,
        error: None,
    })
}
