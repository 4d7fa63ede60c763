use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod loader;
mod models;
mod overdue;
mod parser;
mod period;
mod report;

use config::Config;
use models::Dataset;
use period::Period;

#[derive(Parser)]
#[command(name = "contact-tracker")]
#[command(about = "Tracks overdue advisor communications for graduate and undergraduate students", long_about = None)]
struct Cli {
    /// Directory or http(s) base URL holding students.csv and communications.csv
    #[arg(long, global = true)]
    data: Option<String>,
    /// Compute as if today were this date (YYYY-MM-DD)
    #[arg(long, global = true)]
    as_of: Option<NaiveDate>,
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show student and overdue counters
    Summary,
    /// List graduates and undergraduates past their contact threshold
    Overdue,
    /// Count communications per student over a period
    Stats {
        #[arg(long, value_enum, default_value_t = Period::Total)]
        period: Period,
    },
    /// Write the markdown dashboard
    Report {
        #[arg(long, value_enum, default_value_t = Period::Total)]
        period: Period,
        #[arg(long, default_value = "dashboard.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::resolve(cli.data, cli.as_of)?;
    info!(source = %config.source, now = %config.now, "starting");

    let dataset = match loader::load_dataset(&config.source).await {
        Ok(dataset) => dataset,
        Err(failure) => {
            error!(error = %failure.error, "failed to load data");
            eprintln!(
                "Failed to load data: {}. Check that the CSV files exist and are well formed.",
                failure.error
            );
            failure.partial
        }
    };

    run(cli.command, cli.format, &config, &dataset)
}

fn run(
    command: Commands,
    format: OutputFormat,
    config: &Config,
    dataset: &Dataset,
) -> anyhow::Result<()> {
    match command {
        Commands::Summary => {
            let records =
                overdue::overdue_records(&dataset.students, &dataset.communications, config.now);
            let summary = overdue::summarize(&dataset.students, &records);
            emit(format, &summary, || report::render_summary(&summary))?;
        }
        Commands::Overdue => {
            let records =
                overdue::overdue_records(&dataset.students, &dataset.communications, config.now);
            let lists = overdue::overdue_lists(&records);
            emit(format, &lists, || report::render_overdue(&lists))?;
        }
        Commands::Stats { period } => {
            let stats = period::stats_by_period(
                &dataset.students,
                &dataset.communications,
                period,
                config.today(),
            );
            emit(format, &stats, || report::render_stats(period, &stats))?;
        }
        Commands::Report { period, out } => {
            let dashboard = report::build_dashboard(dataset, period, config.now);
            let body = match format {
                OutputFormat::Text => report::build_report(&dashboard),
                OutputFormat::Json => serde_json::to_string_pretty(&dashboard)?,
            };
            std::fs::write(&out, body)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn emit<T: Serialize>(
    format: OutputFormat,
    value: &T,
    render: impl FnOnce() -> String,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => print!("{}", render()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}
