//! Parallel scoring engine.
//!
//! Three-phase run over a frozen `CitationIndex`:
//! 1. Sequential: check that the work units tile the registry, then split
//!    the score-slot arena into one disjoint `&mut` slice per unit
//! 2. Parallel: each unit is scored to completion by one rayon worker
//! 3. Sequential: merge per-unit outcomes in unit order
//!
//! Workers share only the read-only graph and the atomic progress counter.
//! Each one writes exclusively into its own slice, so no locking is needed
//! and the borrow checker rules out two workers touching the same slot.

use std::sync::atomic::Ordering;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{DisruptionScorer, ScoreError};
use crate::builder::CitationIndex;
use crate::eligibility::EligibilityFilter;
use crate::error::{CdIndexError, Result};
use crate::graph::CitationGraph;
use crate::metrics::{advance_progress, RunMetrics};
use crate::partition::WorkUnit;
use crate::registry::{fill_slot, Entry, ScoreSlot};
use crate::temporal::TimeWindow;

/// Failures logged individually before summarizing.
const MAX_LOGGED_FAILURES: usize = 10;

/// A vertex whose score could not be computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedScore {
    pub key: String,
    pub reason: String,
}

impl From<FailedScore> for CdIndexError {
    fn from(f: FailedScore) -> Self {
        CdIndexError::ScoringFailure {
            key: f.key,
            reason: f.reason,
        }
    }
}

/// Totals of one scoring run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringReport {
    pub units: usize,
    pub scored: usize,
    pub ineligible: usize,
    /// In registry order.
    pub failures: Vec<FailedScore>,
}

#[derive(Debug, Default)]
struct UnitOutcome {
    scored: usize,
    ineligible: usize,
    failures: Vec<FailedScore>,
}

pub struct ScoringEngine<'a, S: DisruptionScorer> {
    scorer: &'a S,
    filter: EligibilityFilter,
    window: TimeWindow,
    threads: usize,
    progress_interval: u64,
    metrics: &'a RunMetrics,
}

impl<'a, S: DisruptionScorer> ScoringEngine<'a, S> {
    pub fn new(
        scorer: &'a S,
        filter: EligibilityFilter,
        window: TimeWindow,
        metrics: &'a RunMetrics,
    ) -> Self {
        Self {
            scorer,
            filter,
            window,
            threads: 1,
            progress_interval: 1_000_000,
            metrics,
        }
    }

    /// Worker thread count; 0 and 1 both mean sequential.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Emit a progress line every `interval` processed keys (0 disables).
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Score every eligible entry covered by `units`.
    ///
    /// `units` must tile `[0, registry.len())` in order, as produced by
    /// `BatchPlanner::plan`.
    pub fn run<G: CitationGraph>(
        &self,
        index: &mut CitationIndex<G>,
        units: &[WorkUnit],
    ) -> Result<ScoringReport> {
        let graph = &index.graph;
        let (entries, slots) = index.registry.entries_and_slots_mut();
        check_tiling(units, entries.len())?;

        // ── Phase 1: hand out disjoint slot slices ──────────────────────
        let mut jobs: Vec<(&WorkUnit, &[Entry], &mut [ScoreSlot])> = Vec::with_capacity(units.len());
        let mut rest = slots;
        for unit in units {
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(unit.len());
            jobs.push((unit, &entries[unit.range()], head));
            rest = tail;
        }

        // ── Phase 2: score units ────────────────────────────────────────
        let outcomes: Vec<UnitOutcome> = if self.threads <= 1 || jobs.len() <= 1 {
            jobs.into_iter()
                .map(|(unit, entries, slots)| self.score_unit(graph, unit, entries, slots))
                .collect()
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.threads)
                .build()
                .map_err(|e| CdIndexError::WorkerPool(format!("rayon pool: {e}")))?;

            pool.install(|| {
                jobs.into_par_iter()
                    .map(|(unit, entries, slots)| self.score_unit(graph, unit, entries, slots))
                    .collect()
            })
        };

        // ── Phase 3: merge ──────────────────────────────────────────────
        let mut report = ScoringReport {
            units: units.len(),
            ..ScoringReport::default()
        };
        for outcome in outcomes {
            report.scored += outcome.scored;
            report.ineligible += outcome.ineligible;
            report.failures.extend(outcome.failures);
        }

        for failure in report.failures.iter().take(MAX_LOGGED_FAILURES) {
            let err = CdIndexError::from(failure.clone());
            warn!(code = err.code(), error = %err, "scoring failed");
        }
        if !report.failures.is_empty() {
            warn!(failures = report.failures.len(), "some works could not be scored");
        }
        info!(
            units = report.units,
            scored = report.scored,
            ineligible = report.ineligible,
            failed = report.failures.len(),
            "CD index calculated"
        );
        Ok(report)
    }

    fn score_unit<G: CitationGraph>(
        &self,
        graph: &G,
        unit: &WorkUnit,
        entries: &[Entry],
        slots: &mut [ScoreSlot],
    ) -> UnitOutcome {
        let mut outcome = UnitOutcome::default();
        for (entry, slot) in entries.iter().zip(slots.iter_mut()) {
            if !self.filter.is_eligible(graph, entry.vertex) {
                outcome.ineligible += 1;
                continue;
            }
            let result = self
                .scorer
                .score(graph, entry.vertex, self.window)
                .and_then(|value| {
                    if value.is_finite() {
                        Ok(value)
                    } else {
                        Err(ScoreError::NonFinite(value))
                    }
                });
            match result {
                Ok(value) => {
                    fill_slot(slot, &entry.key, value);
                    outcome.scored += 1;
                }
                Err(e) => outcome.failures.push(FailedScore {
                    key: entry.key.clone(),
                    reason: e.to_string(),
                }),
            }
        }

        self.metrics.work_units.fetch_add(1, Ordering::Relaxed);
        self.metrics.scored.fetch_add(outcome.scored as u64, Ordering::Relaxed);
        self.metrics.ineligible.fetch_add(outcome.ineligible as u64, Ordering::Relaxed);
        self.metrics
            .scoring_failures
            .fetch_add(outcome.failures.len() as u64, Ordering::Relaxed);
        if let Some(done) =
            advance_progress(&self.metrics.keys_processed, unit.len() as u64, self.progress_interval)
        {
            info!(phase = "C", processed = done, "scoring progress");
        }
        debug!(unit = unit.index, scored = outcome.scored, "work unit done");
        outcome
    }
}

fn check_tiling(units: &[WorkUnit], len: usize) -> Result<()> {
    let mut expected = 0;
    for unit in units {
        if unit.start != expected || unit.end < unit.start {
            return Err(CdIndexError::InvalidConfig(format!(
                "work unit {} spans [{}, {}), expected start {}",
                unit.index, unit.start, unit.end, expected
            )));
        }
        expected = unit.end;
    }
    if expected != len {
        return Err(CdIndexError::InvalidConfig(format!(
            "work units cover {expected} of {len} registry entries"
        )));
    }
    Ok(())
}
