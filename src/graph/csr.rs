//! In-memory compressed sparse row citation graph.
//!
//! Edges are buffered in an append-only list during ingestion. On
//! `prepare_for_searching()` the buffer is sorted, deduplicated and turned
//! into forward (references) and reverse (citations) adjacency arrays.
//! Analogous to the adjacency/reverse_adjacency pair kept by a mutable
//! graph engine, but built once and never updated.

use super::{CitationGraph, VertexId};
use crate::temporal::Instant;

#[derive(Debug, Default)]
pub struct CsrGraph {
    timestamps: Vec<Instant>,
    /// Edges added before preparation, `(src, dst)`.
    pending: Vec<(VertexId, VertexId)>,
    out_offsets: Vec<usize>,
    out_targets: Vec<VertexId>,
    in_offsets: Vec<usize>,
    in_sources: Vec<VertexId>,
    prepared: bool,
}

impl CsrGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, edges: usize) -> Self {
        Self {
            timestamps: Vec::with_capacity(vertices),
            pending: Vec::with_capacity(edges),
            ..Self::default()
        }
    }

    fn slice<'a>(offsets: &[usize], values: &'a [VertexId], v: VertexId) -> &'a [VertexId] {
        let idx = v as usize;
        match (offsets.get(idx), offsets.get(idx + 1)) {
            (Some(&start), Some(&end)) => &values[start..end],
            _ => &[],
        }
    }
}

impl CitationGraph for CsrGraph {
    fn add_vertex(&mut self, created_at: Instant) -> VertexId {
        assert!(!self.prepared, "graph is frozen after prepare_for_searching");
        let id = self.timestamps.len() as VertexId;
        self.timestamps.push(created_at);
        id
    }

    fn add_edge(&mut self, src: VertexId, dst: VertexId) {
        assert!(!self.prepared, "graph is frozen after prepare_for_searching");
        debug_assert!(self.contains(src) && self.contains(dst));
        self.pending.push((src, dst));
    }

    fn prepare_for_searching(&mut self) {
        if self.prepared {
            return;
        }
        let n = self.timestamps.len();

        let mut edges = std::mem::take(&mut self.pending);
        edges.sort_unstable();
        edges.dedup();

        // Forward adjacency: edges are already grouped by src.
        let mut out_offsets = vec![0usize; n + 1];
        for &(src, _) in &edges {
            out_offsets[src as usize + 1] += 1;
        }
        for i in 0..n {
            out_offsets[i + 1] += out_offsets[i];
        }
        let out_targets: Vec<VertexId> = edges.iter().map(|&(_, dst)| dst).collect();

        // Reverse adjacency via counting sort on dst. Sources stay sorted
        // because edges are visited in src order.
        let mut in_offsets = vec![0usize; n + 1];
        for &(_, dst) in &edges {
            in_offsets[dst as usize + 1] += 1;
        }
        for i in 0..n {
            in_offsets[i + 1] += in_offsets[i];
        }
        let mut cursor = in_offsets.clone();
        let mut in_sources = vec![0 as VertexId; edges.len()];
        for &(src, dst) in &edges {
            let slot = &mut cursor[dst as usize];
            in_sources[*slot] = src;
            *slot += 1;
        }

        self.out_offsets = out_offsets;
        self.out_targets = out_targets;
        self.in_offsets = in_offsets;
        self.in_sources = in_sources;
        self.prepared = true;
    }

    fn is_prepared(&self) -> bool {
        self.prepared
    }

    fn vertex_count(&self) -> usize {
        self.timestamps.len()
    }

    fn edge_count(&self) -> usize {
        if self.prepared {
            self.out_targets.len()
        } else {
            self.pending.len()
        }
    }

    fn timestamp(&self, v: VertexId) -> Option<Instant> {
        self.timestamps.get(v as usize).copied()
    }

    fn references(&self, v: VertexId) -> &[VertexId] {
        Self::slice(&self.out_offsets, &self.out_targets, v)
    }

    fn citations(&self, v: VertexId) -> &[VertexId] {
        Self::slice(&self.in_offsets, &self.in_sources, v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> CsrGraph {
        // 0 -> 1, 0 -> 2, 1 -> 3, 2 -> 3
        let mut g = CsrGraph::new();
        for t in 0..4 {
            g.add_vertex(Instant(t));
        }
        g.add_edge(0, 2);
        g.add_edge(0, 1);
        g.add_edge(1, 3);
        g.add_edge(2, 3);
        g.prepare_for_searching();
        g
    }

    #[test]
    fn test_new_graph_is_empty() {
        let g = CsrGraph::new();
        assert_eq!(g.vertex_count(), 0);
        assert_eq!(g.edge_count(), 0);
        assert!(!g.is_prepared());
        assert_eq!(g.references(0), &[] as &[VertexId]);
    }

    #[test]
    fn test_handles_are_dense() {
        let mut g = CsrGraph::new();
        assert_eq!(g.add_vertex(Instant(10)), 0);
        assert_eq!(g.add_vertex(Instant(20)), 1);
        assert_eq!(g.timestamp(1), Some(Instant(20)));
        assert_eq!(g.timestamp(2), None);
    }

    #[test]
    fn test_adjacency_after_prepare() {
        let g = diamond();
        assert_eq!(g.references(0), &[1, 2]);
        assert_eq!(g.citations(3), &[1, 2]);
        assert_eq!(g.citations(0), &[] as &[VertexId]);
        assert_eq!(g.out_degree(0), 2);
        assert_eq!(g.in_degree(3), 2);
        assert_eq!(g.out_degree(3), 0);
        assert_eq!(g.edge_count(), 4);
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let mut g = CsrGraph::new();
        g.add_vertex(Instant(0));
        g.add_vertex(Instant(1));
        g.add_edge(1, 0);
        g.add_edge(1, 0);
        assert_eq!(g.edge_count(), 2);
        g.prepare_for_searching();
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.references(1), &[0]);
    }

    #[test]
    fn test_unknown_vertex_has_no_neighbors() {
        let g = diamond();
        assert!(!g.contains(99));
        assert_eq!(g.references(99), &[] as &[VertexId]);
        assert_eq!(g.citations(99), &[] as &[VertexId]);
    }

    #[test]
    fn test_prepare_is_idempotent() {
        let mut g = diamond();
        g.prepare_for_searching();
        assert_eq!(g.edge_count(), 4);
        assert_eq!(g.references(1), &[3]);
    }

    #[test]
    #[should_panic(expected = "graph is frozen")]
    fn test_mutation_after_prepare_panics() {
        let mut g = diamond();
        g.add_vertex(Instant(5));
    }
}
