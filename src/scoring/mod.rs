//! Disruption scoring: the scorer seam and the parallel engine driving it.

pub mod cdindex;
pub mod engine;

pub use cdindex::CdIndex;
pub use engine::{FailedScore, ScoringEngine, ScoringReport};

use thiserror::Error;

use crate::graph::{CitationGraph, VertexId};
use crate::temporal::TimeWindow;

/// Why a single vertex could not be scored.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    #[error("unknown vertex {0}")]
    UnknownVertex(VertexId),

    #[error("vertex has no references")]
    NoReferences,

    #[error("non-finite score {0}")]
    NonFinite(f64),

    #[error("{0}")]
    Other(String),
}

/// A disruption score as a pure function of a vertex and a time window.
///
/// Called concurrently from scoring workers against a frozen graph, so
/// implementations must not rely on interior mutability.
pub trait DisruptionScorer: Sync {
    fn score<G: CitationGraph + ?Sized>(
        &self,
        graph: &G,
        vertex: VertexId,
        window: TimeWindow,
    ) -> Result<f64, ScoreError>;
}
