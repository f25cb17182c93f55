//! End-to-end run: ingest, freeze, partition, score, export.

use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::builder::{CitationIndex, GraphBuilder};
use crate::config::{RunConfig, SourceSpec};
use crate::eligibility::EligibilityFilter;
use crate::error::Result;
use crate::export::ResultExporter;
use crate::graph::{CitationGraph, CsrGraph};
use crate::metrics::{MetricsSnapshot, RunMetrics};
use crate::partition::BatchPlanner;
use crate::resource::{ResourceManager, SystemResources};
use crate::scoring::{CdIndex, DisruptionScorer, FailedScore, ScoringEngine};
use crate::source::WorkSource;
use crate::synthetic::SyntheticPopulation;
use crate::temporal::Horizon;

/// Everything worth keeping from one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub config: RunConfig,
    pub horizon: Horizon,
    pub threads: usize,
    pub vertices: usize,
    pub edges: usize,
    pub exported: usize,
    pub failures: Vec<FailedScore>,
    pub metrics: MetricsSnapshot,
}

impl RunSummary {
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Run with the default CD index scorer.
pub fn run(config: &RunConfig, metrics: &RunMetrics) -> Result<RunSummary> {
    run_with_scorer(config, &CdIndex, metrics)
}

pub fn run_with_scorer<S: DisruptionScorer>(
    config: &RunConfig,
    scorer: &S,
    metrics: &RunMetrics,
) -> Result<RunSummary> {
    config.validate()?;
    let horizon = config.horizon()?;
    let window = config.window();
    info!(
        source = %config.source,
        destination = %config.destination.display(),
        horizon = horizon.year,
        window_years = config.window_years,
        "Starting CD index run"
    );

    // Fail on an unusable destination before any ingestion work, but leave
    // no file behind if the run aborts before export.
    ResultExporter::check_destination(&config.destination, &config.table)?;

    let started = Instant::now();
    let mut index = ingest(config, metrics)?;
    metrics.record_phase("ingest", started);

    let vertices = index.graph.vertex_count();
    let edges = index.graph.edge_count();
    info!(vertices, edges, "Graph ready for searching");

    let started = Instant::now();
    let units = BatchPlanner::new(config.batch_size).plan(index.registry.len());
    let threads = config
        .threads
        .unwrap_or_else(|| ResourceManager::auto_tune().scoring_threads);
    info!(units = units.len(), threads, "Scoring");

    let engine = ScoringEngine::new(scorer, EligibilityFilter::new(horizon), window, metrics)
        .with_threads(threads)
        .with_progress_interval(config.progress_interval);
    let report = engine.run(&mut index, &units)?;
    metrics.record_phase("score", started);

    let started = Instant::now();
    let mut exporter = ResultExporter::open(&config.destination, &config.table)?;
    let exported = exporter.export_registry(&index.registry, metrics)?;
    metrics.record_phase("export", started);

    Ok(RunSummary {
        config: config.clone(),
        horizon,
        threads,
        vertices,
        edges,
        exported,
        failures: report.failures,
        metrics: metrics.snapshot(),
    })
}

/// Build and freeze the citation index from the configured source.
pub fn ingest(config: &RunConfig, metrics: &RunMetrics) -> Result<CitationIndex> {
    let builder = match &config.source {
        SourceSpec::Store(path) => {
            let mut builder = GraphBuilder::new(metrics);
            let source = WorkSource::open(path)?;
            if config.create_source_indexes {
                source.create_indexes()?;
            }

            let stats = source.read_vertices(config.first_year, config.last_year, |batch| {
                builder.add_vertex_batch(batch);
            })?;
            metrics.invalid_dates.fetch_add(stats.skipped, Ordering::Relaxed);
            info!(
                phase = "N",
                rows = stats.rows,
                invalid_dates = stats.skipped,
                duplicates = metrics.duplicate_keys.load(Ordering::Relaxed),
                "Works loaded"
            );

            let stats = source.read_edges(|batch| {
                builder.add_edge_batch(batch);
            })?;
            info!(
                phase = "E",
                rows = stats.rows,
                dangling = metrics.dangling_edges.load(Ordering::Relaxed),
                "References loaded"
            );
            builder
        }
        SourceSpec::Synthetic { size } => {
            let population =
                SyntheticPopulation::new(*size, config.first_year, config.last_year, &config.seed);
            let resources = SystemResources::detect();
            let fits = resources.fits(population.size() as u64, population.edge_count() as u64);
            let mut builder = if fits {
                GraphBuilder::with_capacity(population.size(), population.edge_count(), metrics)
            } else {
                warn!(
                    size = population.size(),
                    available_bytes = resources.available_memory_bytes,
                    "synthetic population may not fit in memory"
                );
                GraphBuilder::new(metrics)
            };
            builder.add_vertex_batch(population.vertices());
            info!(phase = "N", rows = population.size(), "Synthetic works generated");
            builder.add_edge_batch(population.edges());
            info!(phase = "E", rows = population.edge_count(), "Synthetic references generated");
            builder
        }
    };
    Ok(finalize(builder))
}

fn finalize(builder: GraphBuilder<'_, CsrGraph>) -> CitationIndex {
    let started = Instant::now();
    let index = builder.finalize();
    info!(elapsed_ms = started.elapsed().as_millis() as u64, "Graph frozen");
    index
}
