//! Граф цитирований: trait и реализация

pub mod csr;

pub use csr::CsrGraph;

use crate::temporal::Instant;

/// Dense vertex handle assigned by the graph at creation.
pub type VertexId = u32;

/// Directed citation graph ADT consumed by the scoring pipeline.
///
/// Mutation (`add_vertex`, `add_edge`) happens single-threaded during
/// ingestion. After `prepare_for_searching` the graph is frozen and only
/// read-only queries are issued, possibly from many threads at once.
pub trait CitationGraph: Send + Sync {
    // === MUTATION ===

    /// Create a vertex with the given creation instant.
    fn add_vertex(&mut self, created_at: Instant) -> VertexId;

    /// Add a reference edge: `src` cites `dst`.
    fn add_edge(&mut self, src: VertexId, dst: VertexId);

    /// Freeze the structure and build read-optimized indices.
    fn prepare_for_searching(&mut self);

    // === QUERIES ===

    fn is_prepared(&self) -> bool;

    fn vertex_count(&self) -> usize;

    fn edge_count(&self) -> usize;

    fn contains(&self, v: VertexId) -> bool {
        (v as usize) < self.vertex_count()
    }

    /// Creation instant, `None` for unknown handles.
    fn timestamp(&self, v: VertexId) -> Option<Instant>;

    /// Works cited by `v` (outgoing edges).
    fn references(&self, v: VertexId) -> &[VertexId];

    /// Works citing `v` (incoming edges).
    fn citations(&self, v: VertexId) -> &[VertexId];

    fn out_degree(&self, v: VertexId) -> usize {
        self.references(v).len()
    }

    fn in_degree(&self, v: VertexId) -> usize {
        self.citations(v).len()
    }
}
