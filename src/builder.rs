//! Graph builder: ingests vertex and edge records through the registry.
//!
//! Ingestion is single-threaded. `finalize()` consumes the builder, so the
//! graph is frozen exactly once and no structural mutation is possible
//! once a `CitationIndex` exists.

use std::sync::atomic::Ordering;

use tracing::debug;

use crate::error::{CdIndexError, Result};
use crate::graph::{CitationGraph, CsrGraph};
use crate::metrics::RunMetrics;
use crate::registry::IdentifierRegistry;
use crate::temporal::Instant;

/// A work to be added as a vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexRecord {
    pub key: String,
    pub created_at: Instant,
}

impl VertexRecord {
    pub fn new(key: impl Into<String>, created_at: Instant) -> Self {
        Self {
            key: key.into(),
            created_at,
        }
    }
}

/// A reference from a citing work to a cited work, by external key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
}

impl EdgeRecord {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Outcome counts of one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub added: usize,
    pub skipped: usize,
}

pub struct GraphBuilder<'m, G: CitationGraph = CsrGraph> {
    graph: G,
    registry: IdentifierRegistry,
    metrics: &'m RunMetrics,
}

impl<'m> GraphBuilder<'m, CsrGraph> {
    pub fn new(metrics: &'m RunMetrics) -> Self {
        Self::with_graph(CsrGraph::new(), metrics)
    }

    /// Pre-size graph and registry when the population size is known.
    pub fn with_capacity(vertices: usize, edges: usize, metrics: &'m RunMetrics) -> Self {
        Self {
            graph: CsrGraph::with_capacity(vertices, edges),
            registry: IdentifierRegistry::with_capacity(vertices),
            metrics,
        }
    }
}

impl<'m, G: CitationGraph> GraphBuilder<'m, G> {
    pub fn with_graph(graph: G, metrics: &'m RunMetrics) -> Self {
        Self {
            graph,
            registry: IdentifierRegistry::new(),
            metrics,
        }
    }

    /// Register each record as a vertex. Duplicate keys are counted and skipped.
    pub fn add_vertex_batch<I>(&mut self, records: I) -> BatchOutcome
    where
        I: IntoIterator<Item = VertexRecord>,
    {
        let mut outcome = BatchOutcome::default();
        for record in records {
            match self.registry.register(&mut self.graph, &record.key, record.created_at) {
                Ok(_) => outcome.added += 1,
                Err(e) => {
                    debug!(code = e.code(), error = %e, "vertex skipped");
                    outcome.skipped += 1;
                }
            }
        }
        self.metrics.vertices_added.fetch_add(outcome.added as u64, Ordering::Relaxed);
        self.metrics.duplicate_keys.fetch_add(outcome.skipped as u64, Ordering::Relaxed);
        debug!(added = outcome.added, skipped = outcome.skipped, "vertex batch");
        outcome
    }

    /// Add each record as a directed edge. Records with an endpoint outside
    /// the registry are dropped silently.
    pub fn add_edge_batch<I>(&mut self, records: I) -> BatchOutcome
    where
        I: IntoIterator<Item = EdgeRecord>,
    {
        let mut outcome = BatchOutcome::default();
        for record in records {
            match self.add_edge(&record) {
                Ok(()) => outcome.added += 1,
                Err(_) => outcome.skipped += 1,
            }
        }
        self.metrics.edges_added.fetch_add(outcome.added as u64, Ordering::Relaxed);
        self.metrics.dangling_edges.fetch_add(outcome.skipped as u64, Ordering::Relaxed);
        debug!(added = outcome.added, dropped = outcome.skipped, "edge batch");
        outcome
    }

    /// Add one edge. Fails with `DanglingEdgeEndpoint` if either key is
    /// unregistered; no vertex is created implicitly.
    pub fn add_edge(&mut self, record: &EdgeRecord) -> Result<()> {
        let src = self.registry.resolve(&record.source);
        let dst = self.registry.resolve(&record.target);
        match (src, dst) {
            (Some(src), Some(dst)) => {
                self.graph.add_edge(src, dst);
                Ok(())
            }
            _ => Err(CdIndexError::DanglingEdgeEndpoint {
                src: record.source.clone(),
                dst: record.target.clone(),
            }),
        }
    }

    pub fn registry(&self) -> &IdentifierRegistry {
        &self.registry
    }

    /// Freeze the graph and hand over the populated model for scoring.
    pub fn finalize(mut self) -> CitationIndex<G> {
        self.graph.prepare_for_searching();
        CitationIndex {
            graph: self.graph,
            registry: self.registry,
        }
    }
}

/// Frozen graph plus its registry: the in-memory model of one run.
pub struct CitationIndex<G: CitationGraph = CsrGraph> {
    pub graph: G,
    pub registry: IdentifierRegistry,
}
