use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use fluffy_chips::records::{MatchRecord, Role, prepare_history};
use fluffy_chips::sources::{
    DEFAULT_HISTORY_URL, DEFAULT_TIMEOUT_SECS, SourceLocation, load_history,
};
use fluffy_chips::team_history::{
    DEFAULT_RECENT, SIMILAR_ODDS_MARGIN, head_to_head, recent_matches, score_summary,
    similar_odds_matches,
};

/// Head-to-head, recent form and score patterns for one pairing
#[derive(Parser, Debug)]
#[command(name = "team_report", version, about)]
struct Args {
    /// Home team as written in the history file
    home: String,

    /// Away team as written in the history file
    away: String,

    #[arg(long, env = "FLUFFY_HISTORY_URL", default_value = DEFAULT_HISTORY_URL)]
    history_url: String,

    #[arg(long, env = "FLUFFY_HISTORY_FILE")]
    history_file: Option<PathBuf>,

    /// Number of recent matches per side
    #[arg(long, default_value_t = DEFAULT_RECENT)]
    recent: usize,

    /// Home win odd for the similar-odds lookup
    #[arg(long)]
    odd_home: Option<f64>,

    /// Away win odd for the similar-odds lookup
    #[arg(long)]
    odd_away: Option<f64>,

    #[arg(long, default_value_t = SIMILAR_ODDS_MARGIN)]
    margin: f64,

    #[arg(long, env = "FLUFFY_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if args.home == args.away {
        return Err(anyhow!("home and away must be different teams"));
    }
    let location = match &args.history_file {
        Some(path) => SourceLocation::File(path.display().to_string()),
        None => SourceLocation::Url(args.history_url.clone()),
    };
    let history = prepare_history(load_history(&location, args.timeout_secs)?.rows);

    println!("{} vs {}", args.home, args.away);
    print_matches("Head to head", &head_to_head(&history, &args.home, &args.away));
    print_matches(
        &format!("Last {} at home: {}", args.recent, args.home),
        &recent_matches(&history, &args.home, Role::Home, args.recent),
    );
    print_matches(
        &format!("Last {} away: {}", args.recent, args.away),
        &recent_matches(&history, &args.away, Role::Away, args.recent),
    );

    if let (Some(odd_home), Some(odd_away)) = (args.odd_home, args.odd_away) {
        let similar = similar_odds_matches(
            &history,
            &args.home,
            &args.away,
            odd_home,
            odd_away,
            args.margin,
        );
        print_matches(
            &format!("Similar odds (H {odd_home:.2} / A {odd_away:.2} ± {:.2})", args.margin),
            &similar,
        );
    }

    for (team, role) in [(&args.home, Role::Home), (&args.away, Role::Away)] {
        let summary = score_summary(&history, team, role);
        println!();
        println!(
            "Scores for {} ({}), {} matches",
            summary.team,
            role.label(),
            summary.matches
        );
        for freq in summary.frequencies.iter().take(10) {
            println!("  {:>5}  {}", freq.score, freq.count);
        }
        if !summary.routs.is_empty() {
            println!("  routs: {}", summary.routs.len());
            for m in summary.routs.iter().take(6) {
                println!("   - {}", match_line(m));
            }
        }
    }

    Ok(())
}

fn print_matches(title: &str, rows: &[MatchRecord]) {
    println!();
    println!("{title}: {}", rows.len());
    for m in rows {
        println!("  {}", match_line(m));
    }
}

fn match_line(m: &MatchRecord) -> String {
    let odd = |v: Option<f64>| v.map(|o| format!("{o:.2}")).unwrap_or_else(|| "-".into());
    format!(
        "{} {} {} {} (HT {}x{}) odds {}/{}/{}",
        m.date,
        m.home_team,
        m.score_label(),
        m.away_team,
        m.ht_goals_home,
        m.ht_goals_away,
        odd(m.odds.home_win),
        odd(m.odds.draw),
        odd(m.odds.away_win)
    )
}
