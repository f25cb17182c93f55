//! Eligibility filter.
//!
//! A vertex can be scored only if it references at least one work and
//! its forward citation window has fully elapsed by the cutoff year.

use crate::graph::{CitationGraph, VertexId};
use crate::temporal::Horizon;

#[derive(Debug, Clone, Copy)]
pub struct EligibilityFilter {
    horizon: Horizon,
}

impl EligibilityFilter {
    pub fn new(horizon: Horizon) -> Self {
        Self { horizon }
    }

    /// `out_degree > 0 && created_at <= horizon`. Unknown vertices are ineligible.
    pub fn is_eligible<G: CitationGraph + ?Sized>(&self, graph: &G, v: VertexId) -> bool {
        match graph.timestamp(v) {
            Some(created_at) => graph.out_degree(v) > 0 && self.horizon.covers(created_at),
            None => false,
        }
    }
}
