//! cdindex - compute CD index scores for a citation store
//!
//! Usage:
//!   cdindex crossref.db cdindex.db [--window-years 5] [--threads 8]
//!   cdindex synthetic:100000 bench.db --summary run.json
//!
//! Logging follows `RUST_LOG` (default `info`) and goes to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use cdindex::{CdIndexError, RunConfig, RunMetrics, SourceSpec};

#[derive(Parser)]
#[command(name = "cdindex")]
#[command(about = "Batched parallel CD index scoring over a citation graph")]
#[command(version)]
struct Cli {
    /// Source store path, or `synthetic:<N>` for a generated population
    #[arg(value_parser = parse_source)]
    source: SourceSpec,

    /// Destination store path (created if missing)
    destination: PathBuf,

    /// First publication year ingested
    #[arg(long, default_value_t = 1945)]
    first_year: i32,

    /// Last publication year ingested
    #[arg(long, default_value_t = 2023)]
    last_year: i32,

    /// Last year with observable citations
    #[arg(long, default_value_t = 2023)]
    cutoff_year: i32,

    /// Forward citation window in years
    #[arg(long, default_value_t = 5)]
    window_years: u32,

    /// Registry entries per work unit
    #[arg(long, default_value_t = 10_000)]
    batch_size: usize,

    /// Scoring threads (default: one per detected CPU)
    #[arg(long)]
    threads: Option<usize>,

    /// Keys between scoring progress lines
    #[arg(long, default_value_t = 1_000_000)]
    progress_interval: u64,

    /// Destination table name
    #[arg(long, default_value = "cdindex")]
    table: String,

    /// Skip creating join indexes on the source store
    #[arg(long)]
    no_source_indexes: bool,

    /// Seed for synthetic populations
    #[arg(long, default_value = "xyzzy")]
    seed: String,

    /// Write the run summary as JSON to this path
    #[arg(long)]
    summary: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> (RunConfig, Option<PathBuf>) {
        let config = RunConfig {
            source: self.source,
            destination: self.destination,
            first_year: self.first_year,
            last_year: self.last_year,
            cutoff_year: self.cutoff_year,
            window_years: self.window_years,
            batch_size: self.batch_size,
            threads: self.threads,
            progress_interval: self.progress_interval,
            table: self.table,
            create_source_indexes: !self.no_source_indexes,
            seed: self.seed,
        };
        (config, self.summary)
    }
}

fn parse_source(s: &str) -> std::result::Result<SourceSpec, String> {
    s.parse().map_err(|e: CdIndexError| e.to_string())
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    if let Err(e) = run(Cli::parse()) {
        let code = e
            .downcast_ref::<CdIndexError>()
            .map(CdIndexError::code)
            .unwrap_or("INTERNAL_ERROR");
        eprintln!("error [{code}]: {e:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run(cli: Cli) -> Result<()> {
    let (config, summary_path) = cli.into_config();
    let metrics = RunMetrics::new();
    let summary = cdindex::run(&config, &metrics)?;

    if let Some(path) = summary_path {
        summary
            .write_json(&path)
            .with_context(|| format!("writing summary to {}", path.display()))?;
    }
    info!(
        scored = summary.metrics.scored,
        exported = summary.exported,
        failed = summary.failures.len(),
        elapsed_ms = summary.metrics.elapsed_ms,
        "Done"
    );
    Ok(())
}
