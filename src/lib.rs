//! cdindex - batched parallel disruption scoring over citation graphs
//!
//! Loads works and their references into an in-memory citation graph,
//! freezes it, scores every eligible work with a pluggable
//! `DisruptionScorer` (the CD index by default) on a pool of workers,
//! and writes one `(key, score)` row per scored work back to a store.

pub mod builder;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod export;
pub mod graph;
pub mod metrics;
pub mod partition;
pub mod pipeline;
pub mod registry;
pub mod resource;
pub mod scoring;
pub mod source;
pub mod synthetic;
pub mod temporal;

pub use builder::{CitationIndex, EdgeRecord, GraphBuilder, VertexRecord};
pub use config::{RunConfig, SourceSpec};
pub use eligibility::EligibilityFilter;
pub use error::{CdIndexError, Result};
pub use export::ResultExporter;
pub use graph::{CitationGraph, CsrGraph, VertexId};
pub use metrics::{MetricsSnapshot, RunMetrics};
pub use partition::{partition, BatchPlanner, WorkUnit};
pub use pipeline::{run, run_with_scorer, RunSummary};
pub use registry::IdentifierRegistry;
pub use scoring::{CdIndex, DisruptionScorer, ScoreError, ScoringEngine, ScoringReport};
pub use source::WorkSource;
pub use synthetic::SyntheticPopulation;
pub use temporal::{encode, Horizon, Instant, TimeWindow};
