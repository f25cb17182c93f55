//! Deterministic synthetic citation population.
//!
//! Stands in for the relational source when benchmarking or smoke-testing
//! a deployment. Works are keyed `"0".."N-1"`, published on January 1st of
//! a year drawn uniformly from the configured range, and cite `11 * N`
//! randomly chosen works. Every draw is a blake3 hash of the seed, a
//! stream label and an index, so the same seed always yields the same graph.

use crate::builder::{EdgeRecord, VertexRecord};
use crate::temporal::{encode, Instant};

/// Reference edges generated per work.
pub const EDGES_PER_VERTEX: usize = 11;

#[derive(Debug, Clone)]
pub struct SyntheticPopulation {
    size: usize,
    first_year: i32,
    last_year: i32,
    seed: String,
}

impl SyntheticPopulation {
    pub fn new(size: usize, first_year: i32, last_year: i32, seed: impl Into<String>) -> Self {
        Self {
            size,
            first_year,
            last_year: last_year.max(first_year),
            seed: seed.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn edge_count(&self) -> usize {
        self.size.saturating_mul(EDGES_PER_VERTEX)
    }

    pub fn vertices(&self) -> impl Iterator<Item = VertexRecord> + '_ {
        (0..self.size).map(move |i| VertexRecord::new(i.to_string(), self.created_at(i)))
    }

    /// Self-citations and repeated pairs are possible; the graph collapses them.
    pub fn edges(&self) -> impl Iterator<Item = EdgeRecord> + '_ {
        let n = self.size as u64;
        (0..self.edge_count() as u64).map(move |i| {
            let src = self.draw(b"src", i) % n;
            let dst = self.draw(b"dst", i) % n;
            EdgeRecord::new(src.to_string(), dst.to_string())
        })
    }

    fn created_at(&self, i: usize) -> Instant {
        let span = (self.last_year - self.first_year) as u64 + 1;
        let year = self.first_year + (self.draw(b"year", i as u64) % span) as i32;
        // January 1st always exists
        encode(year, Some(1), Some(1)).unwrap_or(Instant(0))
    }

    fn draw(&self, stream: &[u8], index: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.seed.as_bytes());
        hasher.update(stream);
        hasher.update(&index.to_le_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&hasher.finalize().as_bytes()[..8]);
        u64::from_le_bytes(head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_population() {
        let a = SyntheticPopulation::new(200, 1945, 2023, "xyzzy");
        let b = SyntheticPopulation::new(200, 1945, 2023, "xyzzy");
        assert!(a.vertices().eq(b.vertices()));
        assert!(a.edges().eq(b.edges()));
    }

    #[test]
    fn test_seed_changes_population() {
        let a = SyntheticPopulation::new(200, 1945, 2023, "xyzzy");
        let b = SyntheticPopulation::new(200, 1945, 2023, "plugh");
        assert!(!a.edges().eq(b.edges()));
    }

    #[test]
    fn test_shape() {
        let pop = SyntheticPopulation::new(50, 1990, 1995, "s");
        let vertices: Vec<_> = pop.vertices().collect();
        assert_eq!(vertices.len(), 50);
        assert_eq!(vertices[0].key, "0");
        assert_eq!(vertices[49].key, "49");

        let lo = encode(1990, None, None).unwrap();
        let hi = encode(1995, None, None).unwrap();
        assert!(vertices.iter().all(|v| v.created_at >= lo && v.created_at <= hi));

        let edges: Vec<_> = pop.edges().collect();
        assert_eq!(edges.len(), 50 * EDGES_PER_VERTEX);
        assert!(edges
            .iter()
            .all(|e| e.source.parse::<usize>().unwrap() < 50 && e.target.parse::<usize>().unwrap() < 50));
    }

    #[test]
    fn test_single_year_range() {
        let pop = SyntheticPopulation::new(10, 2000, 2000, "s");
        let t = encode(2000, None, None).unwrap();
        assert!(pop.vertices().all(|v| v.created_at == t));
    }

    #[test]
    fn test_huge_size_does_not_overflow() {
        let pop = SyntheticPopulation::new(usize::MAX, 1945, 2023, "s");
        assert_eq!(pop.edge_count(), usize::MAX);
    }

    #[test]
    fn test_empty_population() {
        let pop = SyntheticPopulation::new(0, 1945, 2023, "s");
        assert_eq!(pop.vertices().count(), 0);
        assert_eq!(pop.edges().count(), 0);
    }
}
