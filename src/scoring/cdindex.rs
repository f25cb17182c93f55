//! CD index (Funk & Owen-Smith) over a frozen citation graph.
//!
//! For a focal work `f` created at `t_f`, every work `i != f` created in
//! `[t_f, t_f + window]` that cites `f` or cites one of `f`'s references
//! contributes `-2·f_i·b_i + f_i`, where `f_i` = "i cites f" and
//! `b_i` = "i cites a reference of f". The index is the mean contribution,
//! in `[-1, 1]`. With no contributing works the index is 0.

use super::{DisruptionScorer, ScoreError};
use crate::graph::{CitationGraph, VertexId};
use crate::temporal::TimeWindow;

#[derive(Debug, Clone, Copy, Default)]
pub struct CdIndex;

impl DisruptionScorer for CdIndex {
    fn score<G: CitationGraph + ?Sized>(
        &self,
        graph: &G,
        focal: VertexId,
        window: TimeWindow,
    ) -> Result<f64, ScoreError> {
        let t_focal = graph.timestamp(focal).ok_or(ScoreError::UnknownVertex(focal))?;
        let references = graph.references(focal);
        if references.is_empty() {
            return Err(ScoreError::NoReferences);
        }
        let t_end = t_focal.saturating_add(window);
        let in_window = |v: VertexId| {
            v != focal
                && graph
                    .timestamp(v)
                    .is_some_and(|t| t >= t_focal && t <= t_end)
        };

        // Works citing the focal work (sorted, unique after preparation)
        let forward: Vec<VertexId> = graph
            .citations(focal)
            .iter()
            .copied()
            .filter(|&v| in_window(v))
            .collect();

        // Works citing any predecessor of the focal work
        let mut backward: Vec<VertexId> = references
            .iter()
            .flat_map(|&r| graph.citations(r).iter().copied())
            .filter(|&v| in_window(v))
            .collect();
        backward.sort_unstable();
        backward.dedup();

        let mut both = 0usize;
        let mut sum = 0i64;
        for v in &forward {
            if backward.binary_search(v).is_ok() {
                both += 1;
                sum -= 1;
            } else {
                sum += 1;
            }
        }

        let n = forward.len() + backward.len() - both;
        if n == 0 {
            return Ok(0.0);
        }
        let score = sum as f64 / n as f64;
        if !score.is_finite() {
            return Err(ScoreError::NonFinite(score));
        }
        Ok(score)
    }
}
