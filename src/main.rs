//! CLI entry point for the shave-of-the-day league tables.
//!
//! Provides subcommands for building a monthly report with rank deltas,
//! rolling up a full year, and comparing two published reports.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sotd_ranker::analyzers::report::{
    MonthTallies, build_annual_report, build_period_report, compare_report, tally_month,
};
use sotd_ranker::output::{
    print_deltas, print_json, print_pretty, render_annual_markdown, render_report_markdown,
    write_report_csvs,
};
use sotd_ranker::parser::parse_snapshot;
use sotd_ranker::period::Month;
use sotd_ranker::store::{DirectoryStore, RecordSource, SnapshotProvider};
use sotd_ranker::{Catalog, PeriodReport, Snapshot, calculate_annual_deltas, calculate_deltas};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "sotd_ranker")]
#[command(about = "Build ranked shave-of-the-day league tables", long_about = None)]
struct Cli {
    /// Root data directory (defaults to $DATA_DIR, then "data")
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// How to log a finished report.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum PrintFormat {
    Json,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the league tables for one month and compare against earlier months
    Report {
        /// Month to report on, as YYYY-MM
        #[arg(short, long)]
        month: String,

        /// Only build these tables (comma separated); all tables by default
        #[arg(short, long, value_delimiter = ',')]
        categories: Vec<String>,

        /// Directory to write one CSV per table into
        #[arg(long)]
        csv_dir: Option<PathBuf>,

        /// Markdown file to render the report into
        #[arg(long)]
        markdown: Option<PathBuf>,

        /// Rows per markdown table (ties at the cutoff are kept)
        #[arg(short, long, default_value_t = 20)]
        limit: usize,

        /// Also log the full report
        #[arg(long, value_enum)]
        print: Option<PrintFormat>,
    },
    /// Roll up all months of a year and compare against the previous year
    Annual {
        /// Year to roll up
        #[arg(short, long)]
        year: i32,

        /// Only build these tables (comma separated); all tables by default
        #[arg(short, long, value_delimiter = ',')]
        categories: Vec<String>,

        /// Maximum number of months tallied at once
        #[arg(long, default_value_t = 4)]
        concurrency: usize,

        /// Markdown file to render the report into
        #[arg(long)]
        markdown: Option<PathBuf>,

        /// Rows per markdown table (ties at the cutoff are kept)
        #[arg(short, long, default_value_t = 50)]
        limit: usize,

        /// Also log the full report
        #[arg(long, value_enum)]
        print: Option<PrintFormat>,
    },
    /// Compare two published report files
    Deltas {
        /// Report file for the current period
        #[arg(long)]
        current: PathBuf,

        /// Report file for the earlier period
        #[arg(long)]
        previous: PathBuf,

        /// Only compare this table
        #[arg(long)]
        category: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/sotd_ranker.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("sotd_ranker.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let data_dir = cli
        .data_dir
        .or_else(|| std::env::var_os("DATA_DIR").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("data"));
    let store = DirectoryStore::new(data_dir);
    info!(data_dir = %store.root().display(), "Using data directory");

    match cli.command {
        Commands::Report {
            month,
            categories,
            csv_dir,
            markdown,
            limit,
            print,
        } => {
            let month: Month = month.parse()?;
            let catalog = select_catalog(&categories)?;
            let report = monthly_report(
                &store,
                &catalog,
                month,
                csv_dir.as_deref(),
                markdown.as_deref(),
                limit,
            )?;
            print_report(&report, print)?;
        }
        Commands::Annual {
            year,
            categories,
            concurrency,
            markdown,
            limit,
            print,
        } => {
            let catalog = select_catalog(&categories)?;
            let report =
                annual_report(store, catalog, year, concurrency, markdown.as_deref(), limit)
                    .await?;
            print_report(&report, print)?;
        }
        Commands::Deltas {
            current,
            previous,
            category,
        } => {
            let current = load_snapshot_file(&current)?;
            let previous = load_snapshot_file(&previous)?;
            compare_files(&current, &previous, category.as_deref());
        }
    }

    Ok(())
}

fn select_catalog(categories: &[String]) -> Result<Catalog> {
    let catalog = Catalog::standard()?;
    if categories.is_empty() {
        Ok(catalog)
    } else {
        Ok(catalog.select(categories)?)
    }
}

fn print_report(report: &PeriodReport, format: Option<PrintFormat>) -> Result<()> {
    match format {
        Some(PrintFormat::Json) => print_json(report)?,
        Some(PrintFormat::Pretty) => print_pretty(report),
        None => {}
    }
    Ok(())
}

fn load_snapshot_file(path: &Path) -> Result<Snapshot> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    parse_snapshot(&bytes).with_context(|| format!("failed to parse {}", path.display()))
}

/// Builds, saves and optionally exports one month's report, with deltas
/// against the previous month, one year ago and five years ago.
#[tracing::instrument(skip(store, catalog, month, csv_dir, markdown), fields(month = %month))]
fn monthly_report(
    store: &DirectoryStore,
    catalog: &Catalog,
    month: Month,
    csv_dir: Option<&Path>,
    markdown: Option<&Path>,
    limit: usize,
) -> Result<PeriodReport> {
    let period = month.to_string();
    let records = store
        .load_records(&period)?
        .with_context(|| format!("no records found for {period}"))?;
    info!(records = records.len(), "Records loaded");

    let report = build_period_report(&period, &records, catalog);
    let path = store.save_report(&period, &report)?;
    info!(path = %path.display(), "Report saved");

    let mut comparisons = Vec::new();
    for (label, earlier) in month.comparisons() {
        match store.snapshot(&earlier.to_string())? {
            Some(snapshot) => comparisons.push((label, snapshot)),
            None => info!(comparison = %earlier, "No published report to compare against"),
        }
    }
    let deltas = compare_report(&report, &comparisons);

    if let Some(dir) = csv_dir {
        write_report_csvs(dir, &report)?;
    }

    if let Some(path) = markdown {
        std::fs::write(path, render_report_markdown(&report, &deltas, limit))
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "Markdown report written");
    }

    Ok(report)
}

/// Tallies every month of `year` on blocking workers, at most `concurrency`
/// at a time. Months without records are skipped.
async fn tally_year(
    store: Arc<DirectoryStore>,
    catalog: Arc<Catalog>,
    year: i32,
    concurrency: usize,
) -> Result<Vec<MonthTallies>> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = vec![];

    for month in Month::months_of(year) {
        let sem = semaphore.clone();
        let store = store.clone();
        let catalog = catalog.clone();
        let span = tracing::info_span!("tally_month", month = %month);

        let task = tokio::spawn(async move {
            let _permit = sem.acquire_owned().await?;

            let tallies = tokio::task::spawn_blocking(move || -> Result<Option<MonthTallies>> {
                let _enter = span.enter();
                match store.load_records(&month.to_string())? {
                    Some(records) => {
                        info!(records = records.len(), "Month tallied");
                        Ok(Some(tally_month(&records, &catalog)))
                    }
                    None => {
                        warn!("No records for month, skipping");
                        Ok(None)
                    }
                }
            })
            .await??;

            Ok::<_, anyhow::Error>(tallies)
        });

        tasks.push(task);
    }

    let mut months = Vec::new();
    for task in tasks {
        if let Some(tallies) = task.await?? {
            months.push(tallies);
        }
    }

    Ok(months)
}

/// Rolls up a year, saves it, and compares it against the prior year's
/// annual report when one exists.
#[tracing::instrument(skip(store, catalog, markdown))]
async fn annual_report(
    store: DirectoryStore,
    catalog: Catalog,
    year: i32,
    concurrency: usize,
    markdown: Option<&Path>,
    limit: usize,
) -> Result<PeriodReport> {
    let store = Arc::new(store);
    let catalog = Arc::new(catalog);

    let months = tally_year(store.clone(), catalog.clone(), year, concurrency).await?;
    if months.is_empty() {
        anyhow::bail!("no monthly records found for {year}");
    }
    info!(months = months.len(), "Months loaded");

    let period = format!("annual/{year}");
    let report = build_annual_report(&year.to_string(), months, &catalog);
    let path = store.save_report(&period, &report)?;
    info!(path = %path.display(), "Annual report saved");

    let previous_year = (year - 1).to_string();
    let deltas = match store.snapshot(&format!("annual/{previous_year}"))? {
        Some(previous) => calculate_annual_deltas(&report.data, &previous),
        None => {
            info!(year = %previous_year, "No previous annual report to compare against");
            Default::default()
        }
    };

    if let Some(path) = markdown {
        std::fs::write(path, render_annual_markdown(&report, &deltas, &previous_year, limit))
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "Markdown report written");
    }

    Ok(report)
}

/// Logs rank changes between two report files, table by table.
fn compare_files(current: &Snapshot, previous: &Snapshot, only: Option<&str>) {
    for (category, ranked) in current {
        if only.is_some_and(|c| c != category.as_str()) {
            continue;
        }
        match previous.get(category) {
            Some(earlier) => print_deltas(category, &calculate_deltas(ranked, earlier)),
            None => warn!(category = %category, "Table missing from previous report, skipping"),
        }
    }
}
