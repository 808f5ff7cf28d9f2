//! CLI entry point for the tabtrend analysis tool.
//!
//! Provides subcommands for the per-period name-trend pipeline and the
//! shooting-statistics sheet, writing the resulting tables as CSV and the
//! summary reports as JSON.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tabtrend::names::{
    analyze_names, find_names, letter_shares, letter_trend, name_share_by_group, name_trend,
};
use tabtrend::output::{append_record, print_json, write_json, write_pivot_csv, write_rows};
use tabtrend::shooting::analyze_shooting;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "tabtrend")]
#[command(about = "A tool to analyze period-stamped tabular records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze per-year name files (yob{YEAR}.txt) in a directory
    Names(NamesArgs),
    /// Analyze a shooting-statistics sheet with a two-row header
    Shooting(ShootingArgs),
}

#[derive(Args)]
struct NamesArgs {
    /// Directory containing the per-year files
    #[arg(value_name = "DATA_DIR")]
    data_dir: PathBuf,

    /// First year to load
    #[arg(long, default_value_t = 1880)]
    start: i32,

    /// Last year to load (inclusive)
    #[arg(long, default_value_t = 2010)]
    end: i32,

    /// Names to keep per (year, sex) group
    #[arg(short = 'n', long, default_value_t = 1000)]
    top: usize,

    /// Cumulative-share threshold for the diversity series
    #[arg(short = 't', long, default_value_t = 0.5)]
    threshold: f64,

    /// Names for the fixed-list trend table (repeatable)
    #[arg(long = "name", value_name = "NAME", default_values_t = [
        "John".to_string(),
        "Harry".to_string(),
        "Mary".to_string(),
        "Marilyn".to_string(),
    ])]
    names: Vec<String>,

    /// Years compared in the last-letter share table (repeatable)
    #[arg(long = "letter-year", value_name = "YEAR", default_values_t = [1910, 1960, 2010])]
    letter_years: Vec<i32>,

    /// Last letters tracked across all years (repeatable)
    #[arg(long = "letter", value_name = "LETTER", default_values_t = ['d', 'n', 'y'])]
    letters: Vec<char>,

    /// Group whose letter trend is tracked
    #[arg(long, default_value = "M")]
    letter_group: String,

    /// Case-insensitive substring to search the top names for
    #[arg(long, value_name = "PATTERN")]
    search: Option<String>,

    /// Directory to write CSV tables and the JSON report to
    #[arg(short, long, default_value = "out")]
    output_dir: PathBuf,
}

#[derive(Args)]
struct ShootingArgs {
    /// Path to the CSV sheet
    #[arg(value_name = "CSV_FILE")]
    input: PathBuf,

    /// Positions to keep (repeatable)
    #[arg(short, long, default_values_t = [
        "FW".to_string(),
        "FW,MF".to_string(),
        "MF,FW".to_string(),
        "MF".to_string(),
    ])]
    positions: Vec<String>,

    /// Directory to write CSV tables and the JSON report to
    #[arg(short, long, default_value = "out")]
    output_dir: PathBuf,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/tabtrend.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("tabtrend.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Names(args) => run_names(&args)?,
        Commands::Shooting(args) => run_shooting(&args)?,
    }

    Ok(())
}

#[tracing::instrument(skip(args), fields(start = args.start, end = args.end, top = args.top))]
fn run_names(args: &NamesArgs) -> Result<()> {
    let analysis = analyze_names(
        &args.data_dir,
        args.start..=args.end,
        args.top,
        args.threshold,
    )?;

    let out = args.output_dir.as_path();
    std::fs::create_dir_all(out)?;

    write_pivot_csv(&out.join("totals.csv"), &analysis.totals, "year")?;
    write_pivot_csv(&out.join("top_share.csv"), &analysis.top_share, "year")?;
    write_pivot_csv(&out.join("diversity.csv"), &analysis.diversity, "year")?;

    let trend = name_trend(&analysis.top, &args.names);
    write_pivot_csv(&out.join("name_trend.csv"), &trend, "year")?;

    let shares = letter_shares(&analysis.records, &args.letter_years);
    write_pivot_csv(&out.join("letter_shares.csv"), &shares, "letter")?;

    let letter_series = letter_trend(&analysis.records, &args.letter_group, &args.letters);
    write_pivot_csv(&out.join("letter_trend.csv"), &letter_series, "year")?;

    if let Some(pattern) = &args.search {
        let found = find_names(&analysis.top, pattern);
        info!(pattern = %pattern, matches = found.len(), "Name search");

        let share = name_share_by_group(&analysis.records, &found);
        write_pivot_csv(&out.join("name_share.csv"), &share, "year")?;
    }

    write_json(&out.join("names_report.json"), &analysis.report)?;
    append_record(&out.join("names_runs.csv"), &analysis.report.run_row())?;
    print_json(&analysis.report)?;

    info!(output_dir = %out.display(), "Name-trend tables written");
    Ok(())
}

#[tracing::instrument(skip(args))]
fn run_shooting(args: &ShootingArgs) -> Result<()> {
    let analysis = analyze_shooting(&args.input, &args.positions)?;

    let out = args.output_dir.as_path();
    std::fs::create_dir_all(out)?;

    write_rows(&out.join("players.csv"), &analysis.players)?;
    write_rows(&out.join("goals_histogram.csv"), &analysis.histogram)?;
    write_json(&out.join("shooting_report.json"), &analysis.report)?;
    append_record(&out.join("shooting_runs.csv"), &analysis.report.run_row())?;
    print_json(&analysis.report)?;

    info!(output_dir = %out.display(), "Shooting tables written");
    Ok(())
}
