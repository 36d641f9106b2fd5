use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fluffy_chips::config::Settings;
use fluffy_chips::export;
use fluffy_chips::features::FeatureEngine;
use fluffy_chips::projector::project_for_date;
use fluffy_chips::records::prepare_history;
use fluffy_chips::screens;
use fluffy_chips::sources::{load_fixtures_or_empty, load_history_or_empty};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::parse();
    settings.validate()?;
    let analysis_date = settings.analysis_date();
    let started = Instant::now();

    let history_location = settings.history_location();
    let fixtures_location = settings.fixtures_location();
    let timeout = settings.timeout_secs;
    let ((history, history_warning), (fixtures, fixtures_warning)) = rayon::join(
        || load_history_or_empty(&history_location, timeout),
        || load_fixtures_or_empty(&fixtures_location, timeout),
    );

    let mut warnings: Vec<String> = Vec::new();
    warnings.extend(history_warning);
    warnings.extend(fixtures_warning);

    let history = prepare_history(history.rows);
    let engine = FeatureEngine::new(settings.engine_config());
    let (table, report) = project_for_date(&engine, &history, &fixtures.rows, analysis_date);
    warnings.extend(report.errors.iter().cloned());

    let selections = screens::apply_all(&report.fixtures);

    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        matches = table.len(),
        teams = table.team_count(),
        fixtures = report.fixtures.len(),
        "analysis complete"
    );

    if settings.json {
        println!("{}", export::to_json(&report.fixtures, &selections)?);
    } else {
        println!("Fluffy Chips {analysis_date}");
        println!("History matches: {}", table.len());
        println!("Fixtures: {}", report.fixtures.len());
        for selection in &selections {
            println!("{}: {}", selection.screen.title(), selection.fixtures.len());
            for f in &selection.fixtures {
                println!(
                    "  {:>2}. {} {} - {} ({})",
                    f.row_number,
                    f.fixture.time,
                    f.fixture.home_team,
                    f.fixture.away_team,
                    f.fixture.league
                );
            }
        }
    }

    if let Some(path) = settings.xlsx.as_ref() {
        let summary = export::export_workbook(path, &report.fixtures, &selections)
            .with_context(|| format!("export to {}", path.display()))?;
        info!(
            path = %path.display(),
            fixtures = summary.fixtures,
            sheets = summary.screens.len() + 1,
            "workbook written"
        );
    }

    if !warnings.is_empty() && !settings.json {
        println!("Warnings: {}", warnings.len());
        for warning in warnings.iter().take(6) {
            println!("   - {warning}");
        }
    }

    Ok(())
}
